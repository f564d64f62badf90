//! The development server: rebuild on every request, reload on every change.

mod files;
mod inject;
mod middleware;
mod sse;

pub use files::serve_published;
pub use inject::error_page;
pub use middleware::{LiveReload, LiveReloadMiddleware};

use crate::core::reload::ChangeFeed;
use crate::core::site::Site;
use crate::error::Result;
use actix_web::{App, HttpResponse, HttpServer, http::header::ContentType, web};
use std::sync::Arc;

/// Endpoint streaming change events to the reload script.
pub const UPDATES_PATH: &str = "/_updates";
/// Endpoint serving the page that runs the reload script.
pub const RELOADER_PATH: &str = "/_reloader";

const RELOADER_HTML: &str = include_str!("reloader.html");

fn reloader_document() -> HttpResponse {
  HttpResponse::Ok()
    .content_type(ContentType::html())
    .body(RELOADER_HTML)
}

/// Serves `site` at `addr` until the server is stopped.
///
/// Every request rebuilds the whole site from its pages directory before it
/// is answered, and browsers showing one of its pages reload whenever a file
/// under that directory changes.
pub async fn serve(addr: &str, site: Site) -> Result<()> {
  let site = Arc::new(site);
  let feed = Arc::new(ChangeFeed::watch(&site.pages_path())?);
  let reload = LiveReload::new(Arc::clone(&site), feed);

  log::info!("🚀 Serving {} at http://{}", site.root().display(), addr);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::from(Arc::clone(&site)))
      .wrap(reload.clone())
      .default_service(web::to(serve_published))
  })
  .bind(addr)?
  .run()
  .await?;

  Ok(())
}
