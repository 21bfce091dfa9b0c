// Hashing job orchestration
// Validates a request, runs the digest on a blocking worker, samples
// progress alongside it and turns the result into a single outcome

use std::fmt;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Serialize, Serializer};
use tokio::task::JoinHandle;

use super::error::HashUtilityError;
use super::hex;
use super::progress::{JobObserver, ProgressSampler, PROGRESS_INTERVAL};
use super::request::{HashRequest, JobRequest};
use super::stream::{CancellableReader, ProgressSource};

type FileReader = CancellableReader<File>;

/// Terminal result of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HashOutcome {
    /// Digest computed, nothing to compare against
    Success {
        #[serde(serialize_with = "as_hex")]
        digest: Vec<u8>,
    },
    Match {
        #[serde(serialize_with = "as_hex")]
        digest: Vec<u8>,
    },
    Mismatch {
        #[serde(serialize_with = "as_hex")]
        digest: Vec<u8>,
        #[serde(serialize_with = "as_hex")]
        expected: Vec<u8>,
    },
    Canceled,
    ValidationFailed {
        messages: Vec<String>,
    },
    RuntimeError {
        message: String,
    },
}

fn as_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

impl HashOutcome {
    /// The computed digest, when the file was fully hashed
    pub fn digest(&self) -> Option<&[u8]> {
        match self {
            HashOutcome::Success { digest }
            | HashOutcome::Match { digest }
            | HashOutcome::Mismatch { digest, .. } => Some(digest),
            _ => None,
        }
    }

    /// True for outcomes that indicate a problem the user should see
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            HashOutcome::Mismatch { .. }
                | HashOutcome::ValidationFailed { .. }
                | HashOutcome::RuntimeError { .. }
        )
    }
}

impl fmt::Display for HashOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashOutcome::Success { digest } => write!(f, "{}", hex::encode(digest)),
            HashOutcome::Match { digest } => {
                writeln!(f, "{}", hex::encode(digest))?;
                write!(f, "EQUAL: The computed hash and the Compare To values match.")
            }
            HashOutcome::Mismatch { digest, .. } => {
                writeln!(f, "{}", hex::encode(digest))?;
                write!(f, "NOT EQUAL: The computed hash and the Compare To values do NOT match.")
            }
            HashOutcome::Canceled => write!(f, "Canceled."),
            HashOutcome::ValidationFailed { messages } => write!(f, "{}", messages.join("\n")),
            HashOutcome::RuntimeError { message } => write!(f, "{}", message),
        }
    }
}

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Validating,
    Running,
    Finalizing,
    Terminal,
}

#[derive(Debug)]
struct JobState {
    phase: JobPhase,
    cancel_requested: bool,
}

/// State shared between the handle, its cancel handles and the worker
struct JobShared {
    state: Mutex<JobState>,
    stream: Mutex<Option<Arc<FileReader>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(JobState {
                phase: JobPhase::Idle,
                cancel_requested: false,
            }),
            stream: Mutex::new(None),
        }
    }

    fn phase(&self) -> JobPhase {
        lock(&self.state).phase
    }

    fn set_phase(&self, phase: JobPhase) {
        let mut state = lock(&self.state);
        debug!("Job phase {:?} -> {:?}", state.phase, phase);
        state.phase = phase;
    }

    /// Leave `Running`, reporting whether a cancel arrived while running
    fn finish_running(&self) -> bool {
        let mut state = lock(&self.state);
        debug!("Job phase {:?} -> {:?}", state.phase, JobPhase::Finalizing);
        state.phase = JobPhase::Finalizing;
        state.cancel_requested
    }

    fn request_cancel(&self) -> bool {
        {
            let mut state = lock(&self.state);
            if state.phase != JobPhase::Running || state.cancel_requested {
                return false;
            }
            state.cancel_requested = true;
        }

        info!("Cancel requested, forcing the stream to its end");
        if let Some(reader) = lock(&self.stream).as_ref() {
            abort_reader(reader);
        }
        true
    }

    fn attach(&self, reader: Arc<FileReader>) {
        let mut slot = lock(&self.stream);
        // A cancel that arrived before the stream existed still applies.
        if lock(&self.state).cancel_requested {
            abort_reader(&reader);
        }
        *slot = Some(reader);
    }

    fn release(&self) -> Option<Arc<FileReader>> {
        lock(&self.stream).take()
    }

    fn stream_open(&self) -> bool {
        lock(&self.stream).is_some()
    }
}

fn abort_reader(reader: &FileReader) {
    if let Err(e) = reader.abort() {
        warn!("Failed to move stream to its end: {}", e);
    }
}

/// Cloneable handle that can cancel a job from any task or thread
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<JobShared>,
}

impl CancelHandle {
    /// Request cancellation.
    ///
    /// Returns true only for the first request made while the job is
    /// running. Once the job is finalizing or done, this is a no-op.
    pub fn cancel(&self) -> bool {
        self.shared.request_cancel()
    }

    pub fn phase(&self) -> JobPhase {
        self.shared.phase()
    }

    pub fn stream_open(&self) -> bool {
        self.shared.stream_open()
    }
}

enum Completion {
    Ready(HashOutcome),
    Pending(JoinHandle<HashOutcome>),
}

/// Handle to one job; the only way to cancel it or collect its outcome
pub struct JobHandle {
    shared: Arc<JobShared>,
    completion: Completion,
}

impl JobHandle {
    pub fn cancel(&self) -> bool {
        self.shared.request_cancel()
    }

    pub fn canceller(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.shared.phase()
    }

    /// Whether the job still holds its file stream
    pub fn stream_open(&self) -> bool {
        self.shared.stream_open()
    }

    /// Wait for the terminal outcome without blocking the runtime
    pub async fn wait(self) -> HashOutcome {
        match self.completion {
            Completion::Ready(outcome) => outcome,
            Completion::Pending(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Hash worker did not complete: {}", e);
                    self.shared.set_phase(JobPhase::Terminal);
                    HashOutcome::RuntimeError {
                        message: format!("The hash worker did not complete: {}", e),
                    }
                }
            },
        }
    }
}

/// Clears the engine's busy flag when the job ends, however it ends
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs at most one hashing job at a time
pub struct HashEngine {
    busy: Arc<AtomicBool>,
    interval: Duration,
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HashEngine {
    pub fn new() -> Self {
        Self::with_interval(PROGRESS_INTERVAL)
    }

    /// Create an engine with a custom progress sampling period
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            interval,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validate a request and start hashing on a blocking worker.
    ///
    /// Must be called from within a Tokio runtime. Invalid requests come
    /// back as an already finished handle carrying `ValidationFailed`.
    pub fn start(
        &self,
        request: JobRequest,
        observer: Arc<dyn JobObserver>,
    ) -> Result<JobHandle, HashUtilityError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| HashUtilityError::NoRuntime)?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(HashUtilityError::JobInProgress);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let shared = Arc::new(JobShared::new());
        shared.set_phase(JobPhase::Validating);

        let request = match request.validate() {
            Ok(request) => request,
            Err(messages) => {
                let outcome = HashOutcome::ValidationFailed { messages };
                shared.set_phase(JobPhase::Terminal);
                drop(guard);
                observer.on_finished(&outcome);
                return Ok(JobHandle {
                    shared,
                    completion: Completion::Ready(outcome),
                });
            }
        };

        info!(
            "Hashing {} with {}",
            request.path.display(),
            request.algorithm.name()
        );
        shared.set_phase(JobPhase::Running);

        let worker_shared = Arc::clone(&shared);
        let interval = self.interval;
        let task = runtime.spawn_blocking(move || {
            let outcome = run_job(&request, &worker_shared, interval, &observer);
            drop(guard);
            outcome
        });

        Ok(JobHandle {
            shared,
            completion: Completion::Pending(task),
        })
    }
}

fn run_job(
    request: &HashRequest,
    shared: &JobShared,
    interval: Duration,
    observer: &Arc<dyn JobObserver>,
) -> HashOutcome {
    let outcome = hash_file(request, shared, interval, observer);
    shared.set_phase(JobPhase::Terminal);
    observer.on_finished(&outcome);
    outcome
}

fn hash_file(
    request: &HashRequest,
    shared: &JobShared,
    interval: Duration,
    observer: &Arc<dyn JobObserver>,
) -> HashOutcome {
    let path = &request.path;
    let reader = match File::open(path).and_then(CancellableReader::new) {
        Ok(reader) => Arc::new(reader),
        Err(e) => {
            if shared.finish_running() {
                return HashOutcome::Canceled;
            }
            // Validation saw the file, so losing it now is a runtime failure.
            let err = HashUtilityError::from_io_error(e, "reading", Some(path.clone()));
            error!("{}", err.summary());
            return HashOutcome::RuntimeError {
                message: err.summary(),
            };
        }
    };

    shared.attach(Arc::clone(&reader));
    observer.on_started(reader.length());

    let source: Arc<dyn ProgressSource> = reader.clone();
    let sampler = ProgressSampler::start(source, interval, Arc::clone(observer));

    let algorithm = Arc::clone(&request.algorithm);
    let computed = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut stream: &FileReader = &reader;
        algorithm.compute(&mut stream)
    }));

    sampler.stop();
    let canceled = shared.finish_running();

    // Last references to the stream; the file closes here on every path.
    drop(shared.release());
    drop(reader);

    if canceled {
        info!("Hashing of {} canceled", path.display());
        return HashOutcome::Canceled;
    }

    match computed {
        Ok(Ok(digest)) => compare(digest, request.expected.as_deref()),
        Ok(Err(e)) => {
            let err = HashUtilityError::HashComputationFailed {
                path: path.clone(),
                algorithm: algorithm.name().to_string(),
                reason: e.to_string(),
            };
            error!("{}", err.summary());
            HashOutcome::RuntimeError {
                message: err.summary(),
            }
        }
        Err(panic_err) => {
            let message = extract_panic_info(panic_err);
            error!("Panic while hashing {}: {}", path.display(), message);
            HashOutcome::RuntimeError { message }
        }
    }
}

fn compare(digest: Vec<u8>, expected: Option<&[u8]>) -> HashOutcome {
    match expected {
        None => HashOutcome::Success { digest },
        Some(expected) if digest.as_slice() == expected => HashOutcome::Match { digest },
        Some(expected) => HashOutcome::Mismatch {
            digest,
            expected: expected.to_vec(),
        },
    }
}

/// Extract panic info from panic value
fn extract_panic_info(panic_err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_err.downcast_ref::<&str>() {
        format!("Panic with message: {}", s)
    } else if let Some(s) = panic_err.downcast_ref::<String>() {
        format!("Panic with message: {}", s)
    } else {
        "Unknown panic occurred".to_string()
    }
}
