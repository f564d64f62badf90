use std::path::PathBuf;

use thiserror::Error;

/// A specialized `Result` type for `pages` operations.
pub type Result<T, E = PagesError> = std::result::Result<T, E>;

/// Boxed error returned by user-supplied capabilities such as a custom
/// Markdown converter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type for all `pages` operations.
#[derive(Debug, Error)]
pub enum PagesError {
  /// The published directory is already there; a build never merges into it.
  #[error("{0} already exists; please back up and/or remove it and try again")]
  OutputExists(PathBuf),

  /// The source tree has no pages directory.
  #[error("{0} directory not found; please create one and try again")]
  MissingPages(PathBuf),

  /// A filesystem operation on a known path failed.
  #[error("{path}")]
  File {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// An I/O error with no particular path, e.g. binding the dev server.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// A trait or template failed to parse or render.
  #[error("template error in {path}")]
  Template {
    path: PathBuf,
    #[source]
    source: tera::Error,
  },

  /// The Markdown converter rejected a page.
  #[error("markdown conversion failed for {path}")]
  Markdown {
    path: PathBuf,
    #[source]
    source: BoxError,
  },

  /// A trait, template or converted page is not valid UTF-8.
  #[error("{path} is not valid UTF-8")]
  Encoding { path: PathBuf },

  /// An error from the file watcher, only available with the `devel` feature.
  #[cfg(feature = "devel")]
  #[error("File watcher error: {0}")]
  Watcher(#[from] notify::Error),

  /// The blocking pool gave up on a rebuild.
  #[cfg(feature = "devel")]
  #[error("rebuild was cancelled: {0}")]
  Blocking(String),
}

impl PagesError {
  pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    PagesError::File {
      path: path.into(),
      source,
    }
  }
}

/// Formats an error together with its whole `source()` chain on one line.
///
/// Tera in particular reports the useful detail ("Variable `x` not found")
/// several levels down, so plain `Display` is rarely enough for a user.
pub fn report(err: &dyn std::error::Error) -> String {
  let mut out = err.to_string();
  let mut source = err.source();
  while let Some(cause) = source {
    out.push_str(": ");
    out.push_str(&cause.to_string());
    source = cause.source();
  }
  out
}
