// Progress sampling for running jobs

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use log::warn;

use super::job::HashOutcome;
use super::stream::ProgressSource;

/// Default period between progress samples
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle callbacks for a presentation layer.
///
/// `on_progress` is called from the sampler thread, the other two from the
/// worker. `on_finished` is always the last call for a job.
pub trait JobObserver: Send + Sync {
    /// The stream is open; `total_bytes` is its length
    fn on_started(&self, _total_bytes: u64) {}

    /// Percentage of the stream consumed so far, in [0, 100]
    fn on_progress(&self, _percent: f64) {}

    /// Terminal outcome of the job
    fn on_finished(&self, _outcome: &HashOutcome) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl JobObserver for NoopObserver {}

/// Periodically publishes the read percentage of a stream.
///
/// Samples never go backwards within one run. Once `stop` returns, no more
/// `on_progress` calls will be made.
pub struct ProgressSampler {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ProgressSampler {
    pub fn start(
        source: Arc<dyn ProgressSource>,
        interval: Duration,
        observer: Arc<dyn JobObserver>,
    ) -> Self {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let spawned = std::thread::Builder::new()
            .name("hash-progress".to_string())
            .spawn(move || {
                let mut last = 0.0_f64;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let percent = source.progress().percent().max(last);
                            last = percent;
                            observer.on_progress(percent);
                        }
                        // Stop message or sender dropped
                        _ => break,
                    }
                }
            });

        let thread = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Progress sampler could not start, continuing without progress: {}", e);
                None
            }
        };

        Self {
            stop_tx: Some(stop_tx),
            thread,
        }
    }

    /// Stop sampling and wait for the sampler thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("Progress sampler thread panicked");
            }
        }
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
