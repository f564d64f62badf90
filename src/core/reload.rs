use crate::error::{PagesError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// A message sent from the change feed to every connected listener.
#[derive(Debug, Clone)]
pub struct ReloadMessage {
  /// The paths the filesystem reported as changed.
  pub paths: Vec<PathBuf>,
}

/// Fans filesystem changes out to any number of listeners.
///
/// Delivery is lossy: a change that happens while nobody is subscribed is
/// dropped, not queued for the next subscriber.
#[derive(Debug)]
pub struct ChangeFeed {
  // We only store the sender. Receivers are created on demand.
  broadcaster: broadcast::Sender<ReloadMessage>,
  // The watcher is held in the struct to keep it alive. When the feed is
  // dropped, the watcher is dropped and stops watching.
  _watcher: Option<RecommendedWatcher>,
}

impl ChangeFeed {
  /// A feed with no watcher; changes only arrive through [`ChangeFeed::announce`].
  pub fn new() -> Self {
    let (broadcaster, _rx) = broadcast::channel(16);
    Self {
      broadcaster,
      _watcher: None,
    }
  }

  /// Creates a feed that watches `path` recursively.
  pub fn watch(path: &Path) -> Result<Self> {
    let mut feed = Self::new();
    let broadcaster = feed.broadcaster.clone();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
      let event = match res {
        Ok(event) => event,
        Err(e) => {
          log::error!("File watch error: {:?}", e);
          return;
        }
      };

      if !(event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove()) {
        return;
      }

      log::info!("📝 Change detected: {:?}", event.paths);
      // No listeners is fine; the change is simply not reported.
      let _ = broadcaster.send(ReloadMessage { paths: event.paths });
    })?;

    watcher
      .watch(path, RecursiveMode::Recursive)
      .map_err(PagesError::Watcher)?;
    log::debug!("Watching {} for changes", path.display());

    feed._watcher = Some(watcher);
    Ok(feed)
  }

  /// Reports a change to everyone currently subscribed.
  ///
  /// Returns how many listeners it reached.
  pub fn announce(&self, paths: Vec<PathBuf>) -> usize {
    self.broadcaster.send(ReloadMessage { paths }).unwrap_or(0)
  }

  pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
    self.broadcaster.subscribe()
  }

  /// How many listeners are subscribed right now.
  pub fn listener_count(&self) -> usize {
    self.broadcaster.receiver_count()
  }
}

impl Default for ChangeFeed {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::time::Duration;
  use tokio::time::timeout;

  #[test]
  fn announcements_without_listeners_are_dropped() {
    let feed = ChangeFeed::new();
    assert_eq!(feed.announce(vec![PathBuf::from("a.tmpl")]), 0);

    // A late subscriber does not see the earlier change.
    let mut rx = feed.subscribe();
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn dropping_a_receiver_unsubscribes() {
    let feed = ChangeFeed::new();
    let rx = feed.subscribe();
    assert_eq!(feed.listener_count(), 1);
    drop(rx);
    assert_eq!(feed.listener_count(), 0);
  }

  #[tokio::test]
  async fn watcher_reports_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let feed = ChangeFeed::watch(dir.path()).unwrap();
    let mut rx = feed.subscribe();

    // Give the watcher a moment to start.
    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::write(dir.path().join("index.tmpl"), "changed").unwrap();

    let msg = timeout(Duration::from_secs(2), rx.recv())
      .await
      .expect("Timeout waiting for change")
      .unwrap();
    assert!(!msg.paths.is_empty());
  }
}
