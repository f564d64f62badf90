use std::path::PathBuf;

use crate::core::tree::ContentKind;

const INDEX: &str = "index.html";

/// Maps a template's file name to the path its page is written to, relative
/// to the directory being built.
///
/// `index.tmpl` becomes `index.html`; any other `name.tmpl` (or
/// `name.tmpl.md`) becomes `name/index.html` so the page is reachable at a
/// "pretty" URL. Names without a template extension are returned unchanged.
pub fn output_path(name: &str) -> PathBuf {
  let Some(kind) = ContentKind::of(name) else {
    return PathBuf::from(name);
  };
  let stem = &name[..name.len() - kind.extension().len()];
  if stem == "index" {
    PathBuf::from(INDEX)
  } else {
    PathBuf::from(stem).join(INDEX)
  }
}
