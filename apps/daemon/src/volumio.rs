//! Volumio REST client: polls the player state and sends player commands.
//!
//! Runs on its own tokio runtime; the sync [`PlayerControl`] calls spawn
//! fire-and-forget requests onto it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use cyfi_config::VolumioConfig;
use cyfi_core::{PlaybackState, PlayerControl, StateCallback, StateFeed};
use tokio::runtime::Runtime;
use tokio::sync::watch;

#[derive(Default)]
struct Shared {
    subscribers: Mutex<Vec<StateCallback>>,
    latest: Mutex<Option<PlaybackState>>,
}

impl Shared {
    /// Store `state` and fan it out if it differs from the previous snapshot.
    /// Returns `true` when subscribers were notified.
    fn publish(&self, state: PlaybackState) -> bool {
        {
            let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
            if latest.as_ref() == Some(&state) {
                return false;
            }
            *latest = Some(state.clone());
        }
        let subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        for (index, subscriber) in subscribers.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| subscriber(&state))).is_err() {
                log::error!("Volumio: State subscriber #{} panicked", index);
            }
        }
        true
    }
}

pub struct VolumioClient {
    base_url: String,
    http: reqwest::Client,
    shared: Arc<Shared>,
    runtime: Mutex<Option<Runtime>>,
    stop_tx: watch::Sender<bool>,
}

impl VolumioClient {
    pub fn new(config: &VolumioConfig) -> anyhow::Result<Arc<Self>> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cyfi-volumio")
            .enable_all()
            .build()
            .context("Failed to create Volumio runtime")?;
        let (stop_tx, _) = watch::channel(false);

        Ok(Arc::new(Self {
            base_url: config.base_url(),
            http,
            shared: Arc::new(Shared::default()),
            runtime: Mutex::new(Some(runtime)),
            stop_tx,
        }))
    }

    /// Start polling `/api/v1/getState` every `interval`.
    pub fn start_polling(&self, interval: Duration) {
        let interval = poll_period(interval);
        let url = format!("{}/api/v1/getState", self.base_url);
        let http = self.http.clone();
        let shared = self.shared.clone();
        let mut stop_rx = self.stop_tx.subscribe();

        self.spawn(async move {
            log::info!("Volumio: Polling {} every {:?}", url, interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut reachable = true;
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                match fetch_state(&http, &url).await {
                    Ok(state) => {
                        if !reachable {
                            log::info!("Volumio: Reachable again");
                            reachable = true;
                        }
                        shared.publish(state);
                    }
                    Err(e) if reachable => {
                        log::warn!("Volumio: State poll failed: {:#}", e);
                        reachable = false;
                    }
                    Err(e) => log::debug!("Volumio: State poll failed: {:#}", e),
                }
            }
            log::info!("Volumio: Polling stopped");
        });
    }

    /// Stop polling and shut the runtime down.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown_timeout(Duration::from_secs(1));
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(runtime) => {
                runtime.spawn(task);
            }
            None => log::warn!("Volumio: Client stopped, request dropped"),
        }
    }

    fn send_command(&self, query: &'static [(&'static str, &'static str)]) {
        let url = format!("{}/api/v1/commands/", self.base_url);
        let http = self.http.clone();
        self.spawn(async move {
            let result = http
                .get(&url)
                .query(query)
                .send()
                .await
                .and_then(|r| r.error_for_status());
            match result {
                Ok(_) => log::debug!("Volumio: Sent {:?}", query),
                Err(e) => log::warn!("Volumio: Command {:?} failed: {}", query, e),
            }
        });
    }
}

/// `tokio::time::interval` panics on a zero period.
fn poll_period(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(1))
}

async fn fetch_state(http: &reqwest::Client, url: &str) -> anyhow::Result<PlaybackState> {
    let state = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<PlaybackState>()
        .await
        .context("Unexpected getState payload")?;
    Ok(state)
}

impl StateFeed for VolumioClient {
    fn subscribe(&self, callback: StateCallback) {
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

impl PlayerControl for VolumioClient {
    fn toggle_play_pause(&self) {
        self.send_command(&[("cmd", "toggle")]);
    }

    fn toggle_repeat(&self) {
        self.send_command(&[("cmd", "repeat")]);
    }

    fn volume_up(&self) {
        self.send_command(&[("cmd", "volume"), ("volume", "plus")]);
    }

    fn volume_down(&self) {
        self.send_command(&[("cmd", "volume"), ("volume", "minus")]);
    }

    fn current_state(&self) -> Option<PlaybackState> {
        self.shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyfi_core::PlayStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_skips_duplicates() {
        let shared = Shared::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        shared
            .subscribers
            .lock()
            .unwrap()
            .push(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        assert!(shared.publish(PlaybackState::with_status(PlayStatus::Stop)));
        assert!(!shared.publish(PlaybackState::with_status(PlayStatus::Stop)));
        assert!(shared.publish(PlaybackState::with_status(PlayStatus::Play)));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let shared = Shared::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        {
            let mut subscribers = shared.subscribers.lock().unwrap();
            subscribers.push(Box::new(|_| panic!("subscriber bug")));
            subscribers.push(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        shared.publish(PlaybackState::with_status(PlayStatus::Pause));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_poll_interval_keeps_polling() {
        assert_eq!(poll_period(Duration::ZERO), Duration::from_millis(1));
        assert_eq!(poll_period(Duration::from_millis(500)), Duration::from_millis(500));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let ticks = runtime.block_on(async {
            let mut ticker = tokio::time::interval(poll_period(Duration::ZERO));
            for _ in 0..3 {
                ticker.tick().await;
            }
            3
        });
        assert_eq!(ticks, 3);
    }

    #[test]
    fn test_client_without_server() {
        let config = VolumioConfig {
            host: "127.0.0.1".to_string(),
            port: 9,
            ..VolumioConfig::default()
        };
        let client = VolumioClient::new(&config).unwrap();
        assert_eq!(client.current_state(), None);
        client.toggle_play_pause();
        client.stop();
        // Requests after stop are dropped.
        client.volume_up();
    }
}
