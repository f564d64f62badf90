use crate::core::site::Site;
use actix_files::NamedFile;
use actix_web::{
  HttpRequest, HttpResponse,
  http::header::{ContentType, LOCATION},
  web,
};
use percent_encoding::percent_decode_str;
use std::io;
use std::path::PathBuf;

/// Serves a file from the site's published directory.
///
/// Directories serve their `index.html` and are redirected to a trailing
/// slash first, so relative links inside pretty URLs resolve.
pub async fn serve_published(req: HttpRequest, site: web::Data<Site>) -> actix_web::Result<HttpResponse> {
  let Some(relative) = published_path(req.path()) else {
    return Ok(not_found());
  };

  let mut path = site.public_path().join(relative);
  if path.is_dir() {
    if !req.path().ends_with('/') {
      let location = format!("{}/", req.path());
      return Ok(HttpResponse::MovedPermanently().insert_header((LOCATION, location)).finish());
    }
    path.push("index.html");
  }

  match NamedFile::open_async(&path).await {
    // Every request rebuilds, so caching headers would only get in the way.
    Ok(file) => Ok(file.use_etag(false).use_last_modified(false).into_response(&req)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(not_found()),
    Err(e) => Err(e.into()),
  }
}

// HTML, so a page that does not exist yet still reloads once it does.
fn not_found() -> HttpResponse {
  HttpResponse::NotFound()
    .content_type(ContentType::html())
    .body("<body><pre>404 page not found</pre></body>")
}

/// Turns a URL path into a path relative to the published directory.
///
/// Returns `None` for paths that try to climb out of it.
fn published_path(url_path: &str) -> Option<PathBuf> {
  let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
  let mut path = PathBuf::new();
  for segment in decoded.split('/') {
    match segment {
      "" | "." => {}
      ".." => return None,
      s if s.contains('\\') || s.contains('\0') => return None,
      s => path.push(s),
    }
  }
  Some(path)
}
