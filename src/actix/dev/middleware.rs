use crate::actix::dev::{RELOADER_PATH, UPDATES_PATH, inject, reloader_document, sse};
use crate::core::reload::ChangeFeed;
use crate::core::site::Site;
use crate::error::{PagesError, report};
use actix_web::{
  Error,
  body::{BoxBody, MessageBody},
  dev::{Service, ServiceRequest, ServiceResponse, Transform},
  http::StatusCode,
  web,
};
use futures_util::future::{self, LocalBoxFuture};
use std::{rc::Rc, sync::Arc, task::Poll};
use tokio::sync::Mutex;

/// Middleware that rebuilds the site before every request and reloads
/// connected browsers when its sources change.
///
/// - `/_updates` streams change events to the reload script.
/// - `/_reloader` serves the reload script's page.
/// - Any other request rebuilds the site, then goes to the wrapped service;
///   HTML responses get the reload snippet injected.
///
/// Rebuild-and-serve runs under one lock shared by every worker, so no
/// response is ever read from a half-built site.
#[derive(Clone)]
pub struct LiveReload {
  state: Arc<State>,
}

struct State {
  site: Arc<Site>,
  feed: Arc<ChangeFeed>,
  build_lock: Arc<Mutex<()>>,
}

impl LiveReload {
  pub fn new(site: Arc<Site>, feed: Arc<ChangeFeed>) -> Self {
    Self {
      state: Arc::new(State {
        site,
        feed,
        build_lock: Arc::new(Mutex::new(())),
      }),
    }
  }
}

impl<S, B> Transform<S, ServiceRequest> for LiveReload
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  B: MessageBody + 'static,
{
  type Response = ServiceResponse<BoxBody>;
  type Error = Error;
  type Transform = LiveReloadMiddleware<S>;
  type InitError = ();
  type Future = future::Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    future::ok(LiveReloadMiddleware {
      // Wrap the service in an Rc so it can be shared and owned by futures
      service: Rc::new(service),
      state: Arc::clone(&self.state),
    })
  }
}

pub struct LiveReloadMiddleware<S> {
  service: Rc<S>,
  state: Arc<State>,
}

impl<S, B> Service<ServiceRequest> for LiveReloadMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  B: MessageBody + 'static,
{
  type Response = ServiceResponse<BoxBody>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  fn poll_ready(&self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
    self.service.poll_ready(cx)
  }

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let service = self.service.clone();
    let state = Arc::clone(&self.state);

    Box::pin(async move {
      let path = req.path().to_owned();
      match path.as_str() {
        UPDATES_PATH => return Ok(req.into_response(sse::change_stream(&state.feed))),
        RELOADER_PATH => return Ok(req.into_response(reloader_document())),
        _ => {}
      }

      let guard = Arc::clone(&state.build_lock).lock_owned().await;

      // The rebuild owns the guard, so dropping this request cannot release
      // it early. It comes back to be held until the body is buffered.
      let site = Arc::clone(&state.site);
      let (_guard, built) = match web::block(move || (guard, site.rebuild())).await {
        Ok((guard, result)) => (Some(guard), result),
        Err(e) => (None, Err(PagesError::Blocking(e.to_string()))),
      };

      let res = match built {
        Ok(_) => service.call(req).await?.map_into_boxed_body(),
        Err(e) => {
          log::error!("Build failed: {}", report(&e));
          req.into_response(inject::error_page(StatusCode::INTERNAL_SERVER_ERROR, &e))
        }
      };

      inject::inject_reload(res).await
    })
  }
}
