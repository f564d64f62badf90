use std::collections::HashMap;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::error::BoxError;

/// Converts a Markdown page body to HTML.
///
/// Implemented by [`CommonMark`] and by any closure of the matching shape,
/// which is how a site plugs in its own converter.
pub trait Markdown: Send + Sync {
  fn convert(&self, source: &[u8]) -> Result<Vec<u8>, BoxError>;
}

impl<F> Markdown for F
where
  F: Fn(&[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
  fn convert(&self, source: &[u8]) -> Result<Vec<u8>, BoxError> {
    self(source)
  }
}

/// The default converter: CommonMark with the GitHub extensions, raw HTML
/// passed through, and an `id` on every heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl Markdown for CommonMark {
  fn convert(&self, source: &[u8]) -> Result<Vec<u8>, BoxError> {
    let source = std::str::from_utf8(source)?;
    Ok(to_html(source).into_bytes())
  }
}

fn options() -> Options {
  Options::ENABLE_TABLES
    | Options::ENABLE_FOOTNOTES
    | Options::ENABLE_STRIKETHROUGH
    | Options::ENABLE_TASKLISTS
    | Options::ENABLE_HEADING_ATTRIBUTES
    | Options::ENABLE_GFM
}

/// Renders Markdown to HTML, giving headings without an explicit `{#id}`
/// a slug of their text.
pub fn to_html(source: &str) -> String {
  let mut events: Vec<Event<'_>> = Parser::new_ext(source, options()).collect();
  let mut seen: HashMap<String, usize> = HashMap::new();

  for i in 0..events.len() {
    let Event::Start(Tag::Heading { id: None, .. }) = &events[i] else {
      continue;
    };
    let slug = unique(slugify(&heading_text(&events[i + 1..])), &mut seen);
    if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
      *id = Some(CowStr::from(slug));
    }
  }

  let mut out = String::with_capacity(source.len() * 3 / 2);
  html::push_html(&mut out, events.into_iter());
  out
}

fn heading_text(events: &[Event<'_>]) -> String {
  let mut text = String::new();
  for event in events {
    match event {
      Event::End(TagEnd::Heading(_)) => break,
      Event::Text(s) | Event::Code(s) => text.push_str(s),
      _ => {}
    }
  }
  text
}

/// Lower-cases letters and digits, turns whitespace and dashes into `-`,
/// and drops everything else.
pub(crate) fn slugify(text: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  for c in text.trim().chars() {
    if c.is_alphanumeric() || c == '_' {
      slug.extend(c.to_lowercase());
    } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
      slug.push('-');
    }
  }
  if slug.is_empty() {
    slug.push_str("heading");
  }
  slug
}

fn unique(slug: String, seen: &mut HashMap<String, usize>) -> String {
  match seen.get_mut(&slug) {
    None => {
      seen.insert(slug.clone(), 0);
      slug
    }
    Some(count) => {
      *count += 1;
      format!("{}-{}", slug, count)
    }
  }
}
