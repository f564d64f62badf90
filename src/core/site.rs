use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tera::{Context, Function};

use crate::core::build::Engine;
use crate::core::markdown::{CommonMark, Markdown};
use crate::core::render::Renderer;
use crate::core::source::{DirSource, EntryKind, Source};
use crate::core::traits::{Functions, TraitSet};
use crate::error::{PagesError, Result};

/// Prefix of the hidden staging directories builds are written into.
const STAGING_PREFIX: &str = ".pages-";

/// A site: where its sources live, where it is published, and the
/// functions, data and Markdown converter its pages render with.
///
/// Created with [`Site::builder`]. Building never writes into the published
/// directory directly; a complete build is renamed into place.
pub struct Site {
  root: PathBuf,
  pages_dir: String,
  public_dir: String,
  functions: Functions,
  context: Context,
  markdown: Arc<dyn Markdown>,
}

impl Site {
  /// Creates a new `SiteBuilder` for the project rooted at `root`.
  ///
  /// Sources are read from `<root>/pages` and published to `<root>/public`
  /// unless configured otherwise.
  pub fn builder(root: impl Into<PathBuf>) -> SiteBuilder {
    SiteBuilder::new(root.into())
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// The directory on disk pages are read from.
  pub fn pages_path(&self) -> PathBuf {
    self.root.join(&self.pages_dir)
  }

  /// The directory on disk a successful build is published to.
  pub fn public_path(&self) -> PathBuf {
    self.root.join(&self.public_dir)
  }

  /// Builds the site from disk and publishes it.
  pub fn run(&self) -> Result<PathBuf> {
    self.run_with(&DirSource::new(&self.root))
  }

  /// Builds the site from `source` and publishes it to the public directory.
  ///
  /// Fails without building if the public directory already exists. On a
  /// failed build the staging directory is left behind for inspection and
  /// the public directory is not touched.
  pub fn run_with(&self, source: &dyn Source) -> Result<PathBuf> {
    let public = self.public_path();
    if public.try_exists().map_err(|e| PagesError::file(&public, e))? {
      return Err(PagesError::OutputExists(public));
    }

    let pages = Path::new(&self.pages_dir);
    match source.kind(pages) {
      Ok(EntryKind::Dir) => {}
      Ok(_) => return Err(PagesError::MissingPages(self.pages_path())),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(PagesError::MissingPages(self.pages_path()));
      }
      Err(e) => return Err(PagesError::file(pages, e)),
    }

    let staging = self.build(source, pages, &self.root)?;
    fs::rename(&staging, &public).map_err(|e| PagesError::file(&staging, e))?;
    log::info!("published {}", public.display());
    Ok(public)
  }

  /// Builds the directory `src_dir` of `source` into a new staging directory
  /// under `staging_parent` and returns its path.
  pub fn build(&self, source: &dyn Source, src_dir: &Path, staging_parent: &Path) -> Result<PathBuf> {
    let staging = tempfile::Builder::new()
      .prefix(STAGING_PREFIX)
      .tempdir_in(staging_parent)
      .map_err(|e| PagesError::file(staging_parent, e))?
      .keep();

    let renderer = Renderer::new(&self.context, self.markdown.as_ref());
    let engine = Engine::new(source, renderer);
    let root_traits = TraitSet::new(&self.functions);

    match engine.build_dir(&root_traits, &staging, src_dir) {
      Ok(()) => Ok(staging),
      Err(e) => {
        log::error!("build failed; partial output left in {}", staging.display());
        Err(e)
      }
    }
  }

  /// Removes the published site, then builds and publishes it again.
  pub fn rebuild(&self) -> Result<PathBuf> {
    let public = self.public_path();
    match fs::remove_dir_all(&public) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(PagesError::file(&public, e)),
    }
    self.run()
  }
}

/// A builder for creating a configured `Site`.
pub struct SiteBuilder {
  root: PathBuf,
  pages_dir: String,
  public_dir: String,
  functions: Functions,
  context: Context,
  markdown: Arc<dyn Markdown>,
}

impl SiteBuilder {
  pub(crate) fn new(root: PathBuf) -> Self {
    Self {
      root,
      pages_dir: "pages".to_string(),
      public_dir: "public".to_string(),
      functions: Functions::new(),
      context: Context::new(),
      markdown: Arc::new(CommonMark),
    }
  }

  /// Sets the name of the source directory under the root. Defaults to `pages`.
  pub fn pages_dir(mut self, name: &str) -> Self {
    self.pages_dir = name.to_string();
    self
  }

  /// Sets the name of the published directory under the root. Defaults to `public`.
  pub fn public_dir(mut self, name: &str) -> Self {
    self.public_dir = name.to_string();
    self
  }

  /// Registers a function callable from every trait and template.
  pub fn function<F: Function + 'static>(mut self, name: &str, function: F) -> Self {
    self.functions.insert(name.to_string(), Arc::new(function));
    self
  }

  /// Sets the value templates see as `data`.
  pub fn data<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
    self.context.insert("data", value);
    self
  }

  /// Adds a top-level variable that will be available to all templates.
  ///
  /// This can be called multiple times to add multiple globals.
  pub fn add_global<S: Into<String>, T: Serialize + ?Sized>(mut self, key: S, value: &T) -> Self {
    self.context.insert(key, value);
    self
  }

  /// Replaces the Markdown converter used for `.tmpl.md` pages.
  pub fn markdown<M: Markdown + 'static>(mut self, markdown: M) -> Self {
    self.markdown = Arc::new(markdown);
    self
  }

  /// Consumes the builder to construct the final `Site`.
  pub fn build(self) -> Site {
    Site {
      root: self.root,
      pages_dir: self.pages_dir,
      public_dir: self.public_dir,
      functions: self.functions,
      context: self.context,
      markdown: self.markdown,
    }
  }
}
