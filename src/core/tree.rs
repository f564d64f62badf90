use std::path::Path;

use crate::core::source::{Entry, EntryKind, Source};
use crate::error::{PagesError, Result};

/// Prefix marking a file as an inheritable trait.
pub const TRAIT_PREFIX: &str = "_";
/// Extension of plain content templates and traits.
pub const PLAIN_EXT: &str = ".tmpl";
/// Extension of Markdown-flavoured content templates and traits.
pub const MARKDOWN_EXT: &str = ".tmpl.md";

/// How the body of a template or trait is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
  Plain,
  Markdown,
}

impl ContentKind {
  /// Returns the content kind for a file name, or `None` if the name carries
  /// neither template extension.
  pub fn of(name: &str) -> Option<Self> {
    // `*.tmpl` style matching: the star may be empty, so `.tmpl` alone matches.
    if name.ends_with(MARKDOWN_EXT) {
      Some(ContentKind::Markdown)
    } else if name.ends_with(PLAIN_EXT) {
      Some(ContentKind::Plain)
    } else {
      None
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      ContentKind::Plain => PLAIN_EXT,
      ContentKind::Markdown => MARKDOWN_EXT,
    }
  }
}

/// The role an entry plays in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Trait,
  Template,
  Asset,
  Section,
  Unrecognized,
}

/// Classifies a single entry. The first matching rule wins.
pub fn classify(entry: &Entry) -> Role {
  let content = ContentKind::of(&entry.name).is_some();
  match entry.kind {
    EntryKind::File if content && entry.name.starts_with(TRAIT_PREFIX) => Role::Trait,
    EntryKind::File if content => Role::Template,
    EntryKind::File => Role::Asset,
    EntryKind::Dir => Role::Section,
    EntryKind::Other => Role::Unrecognized,
  }
}

/// The classified contents of one directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceTree {
  pub traits: Vec<Entry>,
  pub templates: Vec<Entry>,
  pub assets: Vec<Entry>,
  pub sections: Vec<Entry>,
  pub unrecognized: Vec<Entry>,
}

impl SourceTree {
  /// Buckets a listing by role, keeping the listing's order inside each bucket.
  pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
    let mut tree = SourceTree::default();
    for entry in entries {
      if entry.name == "." {
        continue;
      }
      let bucket = match classify(&entry) {
        Role::Trait => &mut tree.traits,
        Role::Template => &mut tree.templates,
        Role::Asset => &mut tree.assets,
        Role::Section => &mut tree.sections,
        Role::Unrecognized => &mut tree.unrecognized,
      };
      bucket.push(entry);
    }
    tree
  }

  /// Lists `dir` in `source` and classifies it.
  pub fn read(source: &dyn Source, dir: &Path) -> Result<Self> {
    let entries = source.read_dir(dir).map_err(|e| PagesError::file(dir, e))?;
    Ok(Self::from_entries(entries))
  }

  pub fn is_empty(&self) -> bool {
    self.traits.is_empty()
      && self.templates.is_empty()
      && self.assets.is_empty()
      && self.sections.is_empty()
      && self.unrecognized.is_empty()
  }

  pub(crate) fn log(&self, dir: &Path) {
    let buckets = [
      ("traits   ", &self.traits),
      ("templates", &self.templates),
      ("assets   ", &self.assets),
      ("sections ", &self.sections),
      ("unknown  ", &self.unrecognized),
    ];
    for (label, entries) in buckets {
      log::debug!("{} found in {}: {}", label, display_dir(dir), names_of(entries).join(", "));
    }
  }
}

pub(crate) fn names_of(entries: &[Entry]) -> Vec<&str> {
  entries.iter().map(|e| e.name.as_str()).collect()
}

pub(crate) fn display_dir(dir: &Path) -> std::path::Display<'_> {
  if dir.as_os_str().is_empty() {
    Path::new(".").display()
  } else {
    dir.display()
  }
}
