use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What a directory entry is, as far as the build is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  File,
  Dir,
  /// Symlinks, devices, sockets and anything else that is neither.
  Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  pub name: String,
  pub kind: EntryKind,
}

impl Entry {
  pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
    Self {
      name: name.into(),
      kind,
    }
  }
}

/// A read-only file hierarchy the build reads its sources from.
///
/// Paths are logical and relative to the root of the source; the empty path
/// is the root itself.
pub trait Source: Send + Sync {
  /// Lists the entries of `dir`, sorted by name.
  fn read_dir(&self, dir: &Path) -> io::Result<Vec<Entry>>;

  /// Reports what `path` is without following symlinks.
  fn kind(&self, path: &Path) -> io::Result<EntryKind>;

  /// Reads the whole file at `path`.
  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// A `Source` backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
  root: PathBuf,
}

impl DirSource {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl Source for DirSource {
  fn read_dir(&self, dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(self.root.join(dir))? {
      let entry = entry?;
      let name = match entry.file_name().into_string() {
        Ok(name) => name,
        Err(name) => {
          log::warn!("Skipping non UTF-8 file name {:?} in {}", name, dir.display());
          continue;
        }
      };
      entries.push(Entry::new(name, kind_of(entry.file_type()?)));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
  }

  fn kind(&self, path: &Path) -> io::Result<EntryKind> {
    Ok(kind_of(fs::symlink_metadata(self.root.join(path))?.file_type()))
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(self.root.join(path))
  }
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
  if file_type.is_file() {
    EntryKind::File
  } else if file_type.is_dir() {
    EntryKind::Dir
  } else {
    EntryKind::Other
  }
}

/// An in-memory `Source`: a map of file paths to contents. Directories are
/// implied by the paths of the files inside them.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
  files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds (or replaces) a file.
  pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
    self.files.insert(path.into(), contents.into());
    self
  }
}

impl<P, C> FromIterator<(P, C)> for MemorySource
where
  P: Into<PathBuf>,
  C: Into<Vec<u8>>,
{
  fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
    iter
      .into_iter()
      .fold(MemorySource::new(), |source, (path, contents)| source.with_file(path, contents))
  }
}

impl Source for MemorySource {
  fn read_dir(&self, dir: &Path) -> io::Result<Vec<Entry>> {
    let mut children = BTreeMap::new();
    for path in self.files.keys() {
      let Ok(rest) = path.strip_prefix(dir) else {
        continue;
      };
      let mut components = rest.components();
      let Some(first) = components.next() else {
        continue;
      };
      let kind = if components.next().is_some() {
        EntryKind::Dir
      } else {
        EntryKind::File
      };
      children.insert(first.as_os_str().to_string_lossy().into_owned(), kind);
    }

    if children.is_empty() && self.kind(dir)? != EntryKind::Dir {
      return Err(io::Error::new(
        io::ErrorKind::NotADirectory,
        format!("{} is not a directory", dir.display()),
      ));
    }

    Ok(
      children
        .into_iter()
        .map(|(name, kind)| Entry::new(name, kind))
        .collect(),
    )
  }

  fn kind(&self, path: &Path) -> io::Result<EntryKind> {
    if path.as_os_str().is_empty() {
      return Ok(EntryKind::Dir);
    }
    if self.files.contains_key(path) {
      return Ok(EntryKind::File);
    }
    if self.files.keys().any(|file| file != path && file.starts_with(path)) {
      return Ok(EntryKind::Dir);
    }
    Err(io::Error::new(
      io::ErrorKind::NotFound,
      format!("{} does not exist", path.display()),
    ))
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    self.files.get(path).cloned().ok_or_else(|| {
      io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path.display()))
    })
  }
}
