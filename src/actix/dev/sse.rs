use crate::core::reload::ChangeFeed;
use actix_web::{HttpResponse, http::header};
use bytes::Bytes;
use tokio::sync::broadcast::error::RecvError;

/// One server-sent event; the page only cares that something changed.
const FRAME: &[u8] = b"data: {}\n\n";

/// Opens a long-lived `text/event-stream` response that writes one frame per
/// change reported by `feed`.
///
/// The subscription lives inside the body stream. When the client goes
/// away, actix drops the stream and with it the subscription.
pub(crate) fn change_stream(feed: &ChangeFeed) -> HttpResponse {
  log::info!("New change-stream connection");

  let mut updates = feed.subscribe();
  let frames = async_stream::stream! {
    loop {
      match updates.recv().await {
        Ok(msg) => log::debug!("Sending change event for {:?}", msg.paths),
        // Missed some changes; one reload covers all of them.
        Err(RecvError::Lagged(skipped)) => log::debug!("Change stream lagged by {}", skipped),
        Err(RecvError::Closed) => break,
      }
      yield Ok::<_, actix_web::Error>(Bytes::from_static(FRAME));
    }
  };

  HttpResponse::Ok()
    .content_type("text/event-stream")
    .insert_header((header::CACHE_CONTROL, "no-cache"))
    .streaming(frames)
}
