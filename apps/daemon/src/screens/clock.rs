//! Clock screen - the idle/root mode. Redraws once per second while active.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use cyfi_config::ClockConfig;
use cyfi_core::{FrameSink, Screen};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
struct ClockFace {
    format: String,
    show_date: bool,
}

impl ClockFace {
    fn lines<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<String>
    where
        Tz::Offset: std::fmt::Display,
    {
        let time = now.format(&self.format).to_string();
        if self.show_date {
            vec![time, now.format("%Y-%m-%d").to_string()]
        } else {
            vec![time]
        }
    }
}

struct Ticker {
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

pub struct ClockScreen {
    face: ClockFace,
    display: Arc<dyn FrameSink>,
    ticker: Mutex<Option<Ticker>>,
}

impl ClockScreen {
    pub fn new(config: &ClockConfig, display: Arc<dyn FrameSink>) -> Self {
        Self {
            face: ClockFace {
                format: config.format.clone(),
                show_date: config.show_date,
            },
            display,
            ticker: Mutex::new(None),
        }
    }
}

impl Screen for ClockScreen {
    fn start_mode(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() {
            return;
        }
        self.display.show_text(&self.face.lines(&Local::now()));

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let face = self.face.clone();
        let display = self.display.clone();
        let spawned = thread::Builder::new()
            .name("cyfi-clock".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(TICK) {
                    Err(RecvTimeoutError::Timeout) => display.show_text(&face.lines(&Local::now())),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });
        match spawned {
            Ok(thread) => *ticker = Some(Ticker { stop_tx, thread }),
            Err(e) => log::error!("Clock: Could not start ticker: {}", e),
        }
    }

    fn stop_mode(&self) {
        let ticker = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Ticker { stop_tx, thread }) = ticker {
            let _ = stop_tx.send(());
            if thread.join().is_err() {
                log::error!("Clock: Ticker thread panicked");
            }
        }
    }
}
