use std::path::Path;

use tera::{Context, Tera};

use crate::core::markdown::Markdown;
use crate::core::traits::{CONTENT, LAYOUT, Layout, PASSTHROUGH_LAYOUT, TraitSet};
use crate::core::tree::ContentKind;
use crate::error::{PagesError, Result};

/// Renders one page at a time against a directory's traits and layout.
pub struct Renderer<'a> {
  pub(crate) context: &'a Context,
  pub(crate) markdown: &'a dyn Markdown,
}

impl<'a> Renderer<'a> {
  pub fn new(context: &'a Context, markdown: &'a dyn Markdown) -> Self {
    Self { context, markdown }
  }

  /// Renders the template at `path` (a logical source path, used for its
  /// extension and for error reporting) with `source` as its body.
  ///
  /// Markdown pages go through two passes: the body is first rendered on its
  /// own so trait includes and data are expanded, the result is converted to
  /// HTML, and only that HTML becomes the `content` the layout sees.
  pub fn render(&self, layout: Layout, traits: &TraitSet, path: &Path, source: &str) -> Result<String> {
    let template_error = |source: tera::Error| PagesError::Template {
      path: path.to_path_buf(),
      source,
    };

    let mut tera = traits.engine();
    tera.add_raw_template(CONTENT, source).map_err(template_error)?;

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if ContentKind::of(name) == Some(ContentKind::Markdown) {
      log::debug!("converting markdown in {} to html", path.display());
      let intermediate = tera.render(CONTENT, self.context).map_err(template_error)?;
      let html = self
        .markdown
        .convert(intermediate.as_bytes())
        .map_err(|source| PagesError::Markdown {
          path: path.to_path_buf(),
          source,
        })?;
      let html = String::from_utf8(html).map_err(|_| PagesError::Encoding {
        path: path.to_path_buf(),
      })?;
      tera.add_raw_template(CONTENT, &html).map_err(template_error)?;
    }

    render_layout(&mut tera, layout, self.context).map_err(template_error)
  }
}

fn render_layout(tera: &mut Tera, layout: Layout, context: &Context) -> tera::Result<String> {
  match layout {
    Layout::Trait => tera.render(LAYOUT, context),
    Layout::Passthrough => {
      tera.add_raw_template(LAYOUT, PASSTHROUGH_LAYOUT)?;
      tera.render(LAYOUT, context)
    }
  }
}
