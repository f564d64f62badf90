#![cfg(feature = "devel")]

mod common;

use std::future::poll_fn;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use pages::{BoxError, Site};
use pages::actix::dev::{LiveReload, serve_published};
use pages::core::reload::ChangeFeed;
use tempfile::TempDir;
use tokio::time::timeout;

use crate::common::write_files;

const SNIPPET: &str = "<iframe src=\"/_reloader\" style=\"display: none\"></iframe>";

type Response = actix_web::dev::ServiceResponse;

// Helper to wrap a site in the dev-mode app
async fn init_app(
  site: Site,
) -> (
  impl actix_web::dev::Service<actix_http::Request, Response = Response, Error = actix_web::Error> + use<>,
  Arc<ChangeFeed>,
) {
  let site = Arc::new(site);
  let feed = Arc::new(ChangeFeed::new());

  let server = test::init_service(
    App::new()
      .app_data(web::Data::from(Arc::clone(&site)))
      .wrap(LiveReload::new(site, Arc::clone(&feed)))
      .default_service(web::to(serve_published)),
  )
  .await;

  (server, feed)
}

// Helper to create a dev-mode app over a fresh project directory
async fn setup_dev_server(
  files: &[(&str, &str)],
) -> (
  impl actix_web::dev::Service<actix_http::Request, Response = Response, Error = actix_web::Error> + use<>,
  Arc<ChangeFeed>,
  TempDir,
) {
  let temp_dir = TempDir::new().unwrap();
  write_files(temp_dir.path(), files);
  let (server, feed) = init_app(Site::builder(temp_dir.path()).build()).await;
  (server, feed, temp_dir)
}

// Counts rebuilds in flight; each one takes a while.
#[derive(Default)]
struct BuildMeter {
  active: AtomicUsize,
  peak: AtomicUsize,
}

fn slow_site(root: &Path, meter: Arc<BuildMeter>) -> Site {
  Site::builder(root)
    .markdown(move |source: &[u8]| -> Result<Vec<u8>, BoxError> {
      let now = meter.active.fetch_add(1, Ordering::SeqCst) + 1;
      meter.peak.fetch_max(now, Ordering::SeqCst);
      std::thread::sleep(Duration::from_millis(300));
      meter.active.fetch_sub(1, Ordering::SeqCst);
      Ok(source.to_vec())
    })
    .build()
}

async fn get(
  server: &impl actix_web::dev::Service<actix_http::Request, Response = Response, Error = actix_web::Error>,
  uri: &str,
) -> (StatusCode, String) {
  let resp = test::call_service(server, test::TestRequest::get().uri(uri).to_request()).await;
  let status = resp.status();
  let body = test::read_body(resp).await;
  (status, String::from_utf8(body.to_vec()).unwrap())
}

#[actix_rt::test]
async fn test_pages_get_the_reload_snippet() {
  let (server, _feed, _dir) = setup_dev_server(&[("pages/index.tmpl", "<html><body>Hello</body></html>")]).await;

  let (status, body) = get(&server, "/").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, format!("<html><body>Hello{SNIPPET}</body></html>"));
}

#[actix_rt::test]
async fn test_snippet_is_appended_without_body_tag() {
  let (server, _feed, _dir) = setup_dev_server(&[("pages/about.tmpl", "<p>about</p>")]).await;

  let (status, body) = get(&server, "/about/").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, format!("<p>about</p>{SNIPPET}"));
}

#[actix_rt::test]
async fn test_assets_pass_through_untouched() {
  let css = "body { content: \"</body>\"; }";
  let (server, _feed, _dir) = setup_dev_server(&[("pages/style.css", css)]).await;

  let resp = test::call_service(&server, test::TestRequest::get().uri("/style.css").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(
    resp.headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap()
      .starts_with("text/css")
  );
  assert_eq!(test::read_body(resp).await, css.as_bytes());
}

#[actix_rt::test]
async fn test_directories_redirect_to_trailing_slash() {
  let (server, _feed, _dir) = setup_dev_server(&[("pages/docs.tmpl", "docs")]).await;

  let resp = test::call_service(&server, test::TestRequest::get().uri("/docs").to_request()).await;
  assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
  assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/docs/");
}

#[actix_rt::test]
async fn test_missing_pages_are_reloadable() {
  let (server, _feed, _dir) = setup_dev_server(&[("pages/index.tmpl", "home")]).await;

  let (status, body) = get(&server, "/nope/").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body.contains("404 page not found"));
  assert!(body.contains(SNIPPET));
}

#[actix_rt::test]
async fn test_every_request_rebuilds() {
  let (server, _feed, dir) = setup_dev_server(&[
    ("pages/index.tmpl", "v1"),
    ("public/stale.html", "left over"),
  ])
  .await;

  assert_eq!(get(&server, "/").await.1, format!("v1{SNIPPET}"));
  assert_eq!(get(&server, "/stale.html").await.0, StatusCode::NOT_FOUND);

  std::fs::write(dir.path().join("pages/index.tmpl"), "v2").unwrap();
  assert_eq!(get(&server, "/").await.1, format!("v2{SNIPPET}"));
}

#[actix_rt::test]
async fn test_build_errors_are_shown_and_recovered() {
  let (server, _feed, dir) = setup_dev_server(&[("pages/index.tmpl", "{{ missing }}")]).await;

  let (status, body) = get(&server, "/").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  let expected = PathBuf::from("pages").join("index.tmpl");
  assert!(body.starts_with(&format!("<body><pre>template error in {}", expected.display())));
  assert!(body.ends_with(&format!("{SNIPPET}</body>")));
  assert!(!dir.path().join("public").exists());

  std::fs::write(dir.path().join("pages/index.tmpl"), "fixed").unwrap();
  let (status, body) = get(&server, "/").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, format!("fixed{SNIPPET}"));
}

#[actix_rt::test]
async fn test_reloader_document() {
  let (server, _feed, dir) = setup_dev_server(&[]).await;

  let (status, body) = get(&server, "/_reloader").await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.contains("new EventSource('/_updates')"));
  assert!(body.contains("window.top.location.reload()"));
  assert!(!body.contains("<iframe"));
  // Served without building anything.
  assert!(!dir.path().join("public").exists());
}

#[actix_rt::test]
async fn test_updates_stream_delivers_changes() {
  let (server, feed, _dir) = setup_dev_server(&[]).await;

  let resp = test::call_service(&server, test::TestRequest::get().uri("/_updates").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/event-stream");
  assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-cache");
  assert_eq!(feed.listener_count(), 1);

  assert_eq!(feed.announce(vec![PathBuf::from("pages/index.tmpl")]), 1);

  let mut body = resp.into_body();
  let frame = timeout(Duration::from_secs(5), poll_fn(|cx| Pin::new(&mut body).poll_next(cx)))
    .await
    .expect("timed out waiting for a change event")
    .expect("stream ended")
    .unwrap();
  assert_eq!(frame.as_ref(), b"data: {}\n\n");

  // Hanging up drops the subscription.
  drop(body);
  assert_eq!(feed.listener_count(), 0);
}

#[actix_rt::test]
async fn test_concurrent_requests_see_complete_builds() {
  let (server, _feed, _dir) = setup_dev_server(&[
    ("pages/_layout.tmpl", "<body>{% include \"content\" %}</body>"),
    ("pages/a.tmpl", "a"),
    ("pages/b.tmpl", "b"),
  ])
  .await;

  let ((status_a, body_a), (status_b, body_b)) = futures_util::join!(get(&server, "/a/"), get(&server, "/b/"));
  assert_eq!(status_a, StatusCode::OK);
  assert_eq!(status_b, StatusCode::OK);
  assert_eq!(body_a, format!("<body>a{SNIPPET}</body>"));
  assert_eq!(body_b, format!("<body>b{SNIPPET}</body>"));
}

#[actix_rt::test]
async fn test_dropped_request_keeps_the_build_lock() {
  let temp_dir = TempDir::new().unwrap();
  write_files(temp_dir.path(), &[("pages/index.tmpl.md", "slow")]);
  let meter = Arc::new(BuildMeter::default());
  let (server, _feed) = init_app(slow_site(temp_dir.path(), Arc::clone(&meter))).await;

  // The client gives up while its rebuild is still running.
  let abandoned = timeout(
    Duration::from_millis(50),
    test::call_service(&server, test::TestRequest::get().uri("/").to_request()),
  )
  .await;
  assert!(abandoned.is_err());

  let (status, body) = get(&server, "/").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, format!("slow{SNIPPET}"));
  assert_eq!(meter.peak.load(Ordering::SeqCst), 1);
}

#[actix_rt::test]
async fn test_slow_rebuilds_never_overlap() {
  let temp_dir = TempDir::new().unwrap();
  write_files(
    temp_dir.path(),
    &[("pages/a.tmpl.md", "a"), ("pages/b.tmpl.md", "b")],
  );
  let meter = Arc::new(BuildMeter::default());
  let (server, _feed) = init_app(slow_site(temp_dir.path(), Arc::clone(&meter))).await;

  let (dropped, a, b) = futures_util::join!(
    timeout(Duration::from_millis(50), get(&server, "/a/")),
    get(&server, "/a/"),
    get(&server, "/b/"),
  );
  assert!(dropped.is_err());
  assert_eq!(a, (StatusCode::OK, format!("a{SNIPPET}")));
  assert_eq!(b, (StatusCode::OK, format!("b{SNIPPET}")));
  assert_eq!(meter.peak.load(Ordering::SeqCst), 1);
  assert_eq!(meter.active.load(Ordering::SeqCst), 0);
}
