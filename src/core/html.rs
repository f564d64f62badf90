//! A small HTML tokenizer, just precise enough to find real tags.
//!
//! Every token carries the exact bytes it was read from, so concatenating
//! the raw slices of all tokens reproduces the input. Comments, quoted
//! attribute values and the bodies of raw-text elements such as `<script>`
//! are single tokens, which keeps a `</body>` inside them from counting.

/// Markup written into every HTML page served by the dev server.
pub const RELOAD_SNIPPET: &[u8] = br#"<iframe src="/_reloader" style="display: none"></iframe>"#;

/// Elements whose contents are text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &[
  "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes", "noscript",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
  Text,
  /// `<name ...>`, with the name as written.
  StartTag(&'a [u8]),
  /// `</name ...>`, with the name as written.
  EndTag(&'a [u8]),
  Comment,
  /// `<!DOCTYPE ...>`, `<?...>` and other `<!` declarations.
  Declaration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
  pub kind: TokenKind<'a>,
  pub raw: &'a [u8],
}

impl Token<'_> {
  /// Whether this is the end tag `</name>`, ignoring ASCII case.
  pub fn is_end_tag(&self, name: &str) -> bool {
    matches!(self.kind, TokenKind::EndTag(n) if n.eq_ignore_ascii_case(name.as_bytes()))
  }
}

/// Iterator over the tokens of an HTML document.
pub struct Tokenizer<'a> {
  input: &'a [u8],
  pos: usize,
  // Set after a raw-text start tag; the next token runs to its end tag.
  raw_text_end: Option<&'a [u8]>,
}

impl<'a> Tokenizer<'a> {
  pub fn new(input: &'a [u8]) -> Self {
    Self {
      input,
      pos: 0,
      raw_text_end: None,
    }
  }

  fn rest(&self) -> &'a [u8] {
    &self.input[self.pos..]
  }

  fn take(&mut self, len: usize, kind: TokenKind<'a>) -> Token<'a> {
    let raw = &self.input[self.pos..self.pos + len];
    self.pos += len;
    Token { kind, raw }
  }

  // Length of the markup starting at the current `<`, if it is markup.
  fn markup(&self) -> Option<(usize, TokenKind<'a>)> {
    let rest = self.rest();
    if rest.starts_with(b"<!--") {
      // `<!-->` and `<!--->` are complete, empty comments.
      let len = if rest[4..].starts_with(b">") {
        5
      } else if rest[4..].starts_with(b"->") {
        6
      } else {
        find(&rest[4..], b"-->").map_or(rest.len(), |i| i + 4 + 3)
      };
      return Some((len, TokenKind::Comment));
    }
    match rest.get(1) {
      Some(b'!') | Some(b'?') => {
        let len = find(rest, b">").map_or(rest.len(), |i| i + 1);
        Some((len, TokenKind::Declaration))
      }
      Some(b'/') if rest.get(2).is_some_and(u8::is_ascii_alphabetic) => {
        let name = tag_name(&rest[2..]);
        let len = tag_end(rest, 2 + name.len())?;
        Some((len, TokenKind::EndTag(name)))
      }
      Some(c) if c.is_ascii_alphabetic() => {
        let name = tag_name(&rest[1..]);
        let len = tag_end(rest, 1 + name.len())?;
        Some((len, TokenKind::StartTag(name)))
      }
      _ => None,
    }
  }

  fn raw_text(&mut self, element: &'a [u8]) -> Option<Token<'a>> {
    let rest = self.rest();
    let mut at = 0;
    let len = loop {
      let Some(i) = find(&rest[at..], b"</") else {
        break rest.len();
      };
      let start = at + i;
      let after = &rest[start + 2..];
      let closes = after.len() >= element.len()
        && after[..element.len()].eq_ignore_ascii_case(element)
        && after
          .get(element.len())
          .is_none_or(|c| c.is_ascii_whitespace() || *c == b'/' || *c == b'>');
      if closes {
        break start;
      }
      at = start + 2;
    };
    (len > 0).then(|| self.take(len, TokenKind::Text))
  }
}

impl<'a> Iterator for Tokenizer<'a> {
  type Item = Token<'a>;

  fn next(&mut self) -> Option<Token<'a>> {
    if let Some(element) = self.raw_text_end.take() {
      if let Some(token) = self.raw_text(element) {
        return Some(token);
      }
    }

    let rest = self.rest();
    if rest.is_empty() {
      return None;
    }

    if rest[0] == b'<' {
      if let Some((len, kind)) = self.markup() {
        let token = self.take(len, kind);
        if let TokenKind::StartTag(name) = kind {
          let self_closing = token.raw.ends_with(b"/>");
          if !self_closing && RAW_TEXT_ELEMENTS.iter().any(|e| name.eq_ignore_ascii_case(e.as_bytes())) {
            self.raw_text_end = Some(name);
          }
        }
        return Some(token);
      }
    }

    // Text runs up to the next `<` that opens markup.
    let mut len = 1;
    while len < rest.len() {
      if rest[len] == b'<' {
        let save = self.pos;
        self.pos += len;
        let opens = self.markup().is_some();
        self.pos = save;
        if opens {
          break;
        }
      }
      len += 1;
    }
    Some(self.take(len, TokenKind::Text))
  }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack.windows(needle.len()).position(|window| window == needle)
}

fn tag_name(input: &[u8]) -> &[u8] {
  let len = input
    .iter()
    .position(|c| c.is_ascii_whitespace() || *c == b'/' || *c == b'>')
    .unwrap_or(input.len());
  &input[..len]
}

// Where a tag scan is inside its attribute list.
#[derive(Clone, Copy)]
enum Attr {
  BeforeName,
  Name,
  AfterName,
  BeforeValue,
  Quoted(u8),
  Unquoted,
}

// Finds the `>` closing a tag whose attributes start at `from`. Quotes only
// delimit a value right after `=`; elsewhere they are ordinary characters.
// `None` if the tag is never closed.
fn tag_end(input: &[u8], from: usize) -> Option<usize> {
  let mut state = Attr::BeforeName;
  for (i, &c) in input.iter().enumerate().skip(from) {
    state = match (state, c) {
      (Attr::Quoted(q), c) if c == q => Attr::BeforeName,
      (Attr::Quoted(q), _) => Attr::Quoted(q),
      (_, b'>') => return Some(i + 1),
      (Attr::Unquoted, c) if c.is_ascii_whitespace() => Attr::BeforeName,
      (Attr::Unquoted, _) => Attr::Unquoted,
      (Attr::BeforeValue, b'"' | b'\'') => Attr::Quoted(c),
      (Attr::BeforeValue, c) if c.is_ascii_whitespace() => Attr::BeforeValue,
      (Attr::BeforeValue, _) => Attr::Unquoted,
      (Attr::Name | Attr::AfterName, b'=') => Attr::BeforeValue,
      (Attr::Name | Attr::AfterName, c) if c.is_ascii_whitespace() => Attr::AfterName,
      (_, b'/') => Attr::BeforeName,
      (Attr::Name | Attr::AfterName, _) => Attr::Name,
      (Attr::BeforeName, c) if c.is_ascii_whitespace() => Attr::BeforeName,
      (Attr::BeforeName, _) => Attr::Name,
    };
  }
  None
}

/// Re-emits `html` unchanged except for `snippet`, which is written right
/// before the first `</body>` end tag, or appended if there is none.
pub fn inject(html: &[u8], snippet: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(html.len() + snippet.len());
  let mut injected = false;
  for token in Tokenizer::new(html) {
    if !injected && token.is_end_tag("body") {
      out.extend_from_slice(snippet);
      injected = true;
    }
    out.extend_from_slice(token.raw);
  }
  if !injected {
    out.extend_from_slice(snippet);
  }
  out
}
