use std::collections::HashMap;
use std::sync::Arc;

use tera::{Function, Tera, Value};

/// Name of the trait that wraps every page of a directory.
pub const LAYOUT: &str = "_layout.tmpl";
/// Name under which a page body is registered while it renders.
pub const CONTENT: &str = "content";
/// Layout used when no `_layout.tmpl` is in scope: the page body, verbatim.
pub(crate) const PASSTHROUGH_LAYOUT: &str = "{% include \"content\" %}";

/// User functions callable from every trait and template, by name.
pub type Functions = HashMap<String, Arc<dyn Function>>;

/// The trait templates visible to one directory.
///
/// Cloning is how scoping works: a directory clones its parent's set before
/// adding its own traits, so they reach its descendants but never its parent
/// or siblings.
#[derive(Debug, Clone)]
pub struct TraitSet {
  tera: Tera,
}

impl TraitSet {
  /// An empty set with the given functions registered.
  pub fn new(functions: &Functions) -> Self {
    let mut tera = Tera::default();
    // Values interpolated into any trait or page are HTML-escaped; `| safe`
    // opts out.
    tera.autoescape_on(vec![".tmpl", ".tmpl.md", CONTENT]);
    for (name, function) in functions {
      tera.register_function(name, SharedFunction(Arc::clone(function)));
    }
    Self { tera }
  }

  /// Parses `source` as the trait `name`, replacing any trait of the same name.
  pub fn add(&mut self, name: &str, source: &str) -> tera::Result<()> {
    self.tera.add_raw_template(name, source)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.tera.get_template_names().any(|n| n == name)
  }

  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.tera.get_template_names().collect();
    names.sort_unstable();
    names
  }

  /// Picks the layout for a directory whose traits are all in this set.
  pub fn layout(&self) -> Layout {
    if self.contains(LAYOUT) {
      Layout::Trait
    } else {
      Layout::Passthrough
    }
  }

  /// A private copy of the underlying engine for rendering one page.
  pub(crate) fn engine(&self) -> Tera {
    self.tera.clone()
  }
}

/// The layout in effect for a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// The `_layout.tmpl` trait, defined here or by an ancestor.
  Trait,
  /// No layout trait in scope; pages render as their bare content.
  Passthrough,
}

// Lets one registered function be shared by every cloned engine.
struct SharedFunction(Arc<dyn Function>);

impl Function for SharedFunction {
  fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
    self.0.call(args)
  }

  fn is_safe(&self) -> bool {
    self.0.is_safe()
  }
}
