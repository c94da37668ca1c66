//! Terminal input thread and application event channel.
//!
//! [`EventHandler`] runs crossterm's blocking `poll` on an OS thread and forwards key
//! presses and ticks into the same channel the fetch tasks report into, so the main loop
//! owns all state and handles everything in arrival order.

use crate::model::{Job, Run};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    /// Fixed-interval refresh from the poller.
    AutoRefresh,
    JobsLoaded {
        generation: u64,
        jobs: Vec<Job>,
    },
    /// Last run per job id; `None` for jobs that never ran or whose fetch failed.
    LastRunsLoaded {
        generation: u64,
        last_runs: HashMap<String, Option<Run>>,
    },
    RefreshFailed {
        generation: u64,
        error: String,
    },
    RunsLoaded {
        job_id: String,
        runs: Vec<Run>,
    },
    Error(String),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let thread = std::thread::spawn(move || {
            while !shutdown_flag.load(Ordering::Relaxed) {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(CrosstermEvent::Key(key)) = event::read() {
                        if event_tx.send(AppEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                } else if event_tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            tx,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop();
    }
}
