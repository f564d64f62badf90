#![allow(dead_code)]

use pages::{MemorySource, Site};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A file tree as a map of slash-separated relative paths to contents.
pub type Tree = BTreeMap<String, String>;

pub fn tree(files: &[(&str, &str)]) -> Tree {
  files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect()
}

pub fn source(files: &[(&str, &str)]) -> MemorySource {
  files.iter().map(|(p, c)| (*p, c.as_bytes().to_vec())).collect()
}

/// Reads every regular file under `dir` into a `Tree`.
pub fn read_tree(dir: &Path) -> Tree {
  let mut out = Tree::new();
  walk(dir, dir, &mut out);
  out
}

fn walk(root: &Path, dir: &Path, out: &mut Tree) {
  for entry in fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_dir() {
      walk(root, &path, out);
    } else {
      let rel = path.strip_prefix(root).unwrap();
      let key = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
      out.insert(key, fs::read_to_string(&path).unwrap());
    }
  }
}

/// Writes `files` under `root`, creating directories as needed.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
  for (path, contents) in files {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }
}

/// Builds `files` with `site` into a staging directory and returns what it wrote.
pub fn build_with(site: &Site, files: &[(&str, &str)]) -> pages::Result<Tree> {
  let out = TempDir::new().unwrap();
  let staging = site.build(&source(files), Path::new(""), out.path())?;
  Ok(read_tree(&staging))
}

/// Builds `files` with a default site.
pub fn build(files: &[(&str, &str)]) -> Tree {
  let root = TempDir::new().unwrap();
  let site = Site::builder(root.path()).build();
  build_with(&site, files).unwrap()
}
