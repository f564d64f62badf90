use crate::core::html::{RELOAD_SNIPPET, inject};
use crate::error::{PagesError, report};
use actix_web::{
  Error, HttpResponse,
  body::{self, BoxBody, MessageBody},
  dev::ServiceResponse,
  http::{
    StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE, ContentType, HeaderMap},
  },
};

/// Buffers an HTML response and writes the reload snippet into it.
///
/// Anything that is not `text/html` passes through untouched. The status is
/// kept; `Content-Length` is dropped since the body grows.
pub(crate) async fn inject_reload<B>(res: ServiceResponse<B>) -> Result<ServiceResponse<BoxBody>, Error>
where
  B: MessageBody + 'static,
{
  if !is_html(res.headers()) {
    return Ok(res.map_into_boxed_body());
  }

  let (req, res) = res.into_parts();
  let (mut head, body) = res.into_parts();

  let bytes = body::to_bytes(body).await.map_err(|err| {
    let err: Box<dyn std::error::Error> = err.into();
    log::error!("Failed to buffer response body: {}", err);
    actix_web::error::ErrorInternalServerError("Failed to buffer response body")
  })?;

  head.headers_mut().remove(CONTENT_LENGTH);
  let res = head.set_body(BoxBody::new(inject(&bytes, RELOAD_SNIPPET)));
  Ok(ServiceResponse::new(req, res))
}

fn is_html(headers: &HeaderMap) -> bool {
  headers
    .get(CONTENT_TYPE)
    .and_then(|val| val.to_str().ok())
    .is_some_and(|val| val.starts_with("text/html"))
}

/// An HTML page reporting `err`, with a body tag so the reload snippet has
/// somewhere to go and the browser recovers once the error is fixed.
pub fn error_page(status: StatusCode, err: &PagesError) -> HttpResponse {
  HttpResponse::build(status)
    .content_type(ContentType::html())
    .body(format!("<body><pre>{}</pre></body>", escape(&report(err))))
}

pub(crate) fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      _ => out.push(c),
    }
  }
  out
}
