//! # pages
//!
//! A static site builder. Pages are Tera templates laid out in a directory
//! tree; the tree is rendered into a fresh `public` directory that is only
//! published once the whole build succeeds.
//!
//! ## Source layout
//!
//! - `name.tmpl` renders to `name/index.html` (`index.tmpl` to `index.html`).
//! - `name.tmpl.md` is rendered, converted from Markdown, then laid out.
//! - `_name.tmpl` / `_name.tmpl.md` are **traits**: fragments included with
//!   `{% include "_name.tmpl" %}` by pages in the same directory and every
//!   directory below it. A deeper trait with the same name shadows it.
//! - `_layout.tmpl` wraps every page in scope; it places the page with
//!   `{% include "content" %}`.
//! - Anything else is copied as-is.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use pages::Site;
//!
//! fn main() -> pages::Result<()> {
//!   let site = Site::builder(".")
//!     .data(&serde_json::json!({ "title": "My Site" }))
//!     .build();
//!   // Reads ./pages, writes ./public.
//!   site.run()?;
//!   Ok(())
//! }
//! ```
//!
//! With the default `devel` feature, [`actix::dev::serve`] runs a
//! development server that rebuilds on every request and reloads the browser
//! whenever a source file changes.

#[cfg(feature = "devel")]
pub mod actix;
pub mod core;
pub mod error;

pub use crate::core::markdown::{CommonMark, Markdown};
pub use crate::core::site::{Site, SiteBuilder};
pub use crate::core::source::{DirSource, MemorySource, Source};
pub use crate::error::{BoxError, PagesError, Result};
