use std::fs;
use std::path::Path;

use crate::core::paths::output_path;
use crate::core::render::Renderer;
use crate::core::source::Source;
use crate::core::traits::{Layout, TraitSet};
use crate::core::tree::{SourceTree, display_dir, names_of};
use crate::error::{PagesError, Result};

/// Walks a source tree and writes the rendered site into a destination
/// directory.
///
/// The walk is sequential and depth-first. Any error stops it immediately;
/// whatever was written so far is left for the caller to discard.
pub struct Engine<'a> {
  source: &'a dyn Source,
  renderer: Renderer<'a>,
}

impl<'a> Engine<'a> {
  pub fn new(source: &'a dyn Source, renderer: Renderer<'a>) -> Self {
    Self { source, renderer }
  }

  /// Builds the source directory `src` into `dst`, with `inherited` as the
  /// traits of its ancestors.
  pub fn build_dir(&self, inherited: &TraitSet, dst: &Path, src: &Path) -> Result<()> {
    log::debug!("building {}", display_dir(src));

    // New traits apply only to this directory and its descendants.
    let mut traits = inherited.clone();

    let tree = SourceTree::read(self.source, src)?;
    tree.log(src);

    if !tree.traits.is_empty() {
      log::debug!("traits found in {}: {}", display_dir(src), names_of(&tree.traits).join(", "));
      for entry in &tree.traits {
        let path = src.join(&entry.name);
        let text = self.read_text(&path)?;
        traits
          .add(&entry.name, &text)
          .map_err(|source| PagesError::Template { path, source })?;
      }
      log::debug!("traits in scope for {}: {}", display_dir(src), traits.names().join(", "));
    }

    let layout = traits.layout();
    if layout == Layout::Trait {
      log::debug!("using layout in {}", display_dir(src));
    }

    for entry in &tree.templates {
      let path = src.join(&entry.name);
      let text = self.read_text(&path)?;
      let page = self.renderer.render(layout, &traits, &path, &text)?;

      let dst_path = dst.join(output_path(&entry.name));
      log::debug!("writing {} to {}", path.display(), dst_path.display());
      write_file(&dst_path, page.as_bytes())?;
    }

    for entry in &tree.assets {
      let path = src.join(&entry.name);
      let bytes = self.source.read(&path).map_err(|e| PagesError::file(&path, e))?;
      write_file(&dst.join(&entry.name), &bytes)?;
    }

    for entry in &tree.unrecognized {
      log::warn!("ignoring {}: not a regular file or directory", src.join(&entry.name).display());
    }

    for entry in &tree.sections {
      self.build_dir(&traits, &dst.join(&entry.name), &src.join(&entry.name))?;
    }

    Ok(())
  }

  fn read_text(&self, path: &Path) -> Result<String> {
    let bytes = self.source.read(path).map_err(|e| PagesError::file(path, e))?;
    String::from_utf8(bytes).map_err(|_| PagesError::Encoding {
      path: path.to_path_buf(),
    })
  }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|e| PagesError::file(parent, e))?;
  }
  fs::write(path, bytes).map_err(|e| PagesError::file(path, e))
}
