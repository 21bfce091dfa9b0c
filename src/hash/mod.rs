// Hash Core Library
// Streaming file digests with progress, cancellation and comparison

pub mod algorithm;
pub mod compare;
pub mod error;
pub mod hex;
pub mod job;
pub mod progress;
pub mod request;
pub mod stream;

// Re-export commonly used types for convenience
pub use algorithm::{AlgorithmInfo, DigestAlgorithm, HashRegistry, Hasher, StreamingAlgorithm};
pub use compare::{CompareResolver, CompareToken, HexSource, NoSource};
pub use error::{HashUtilityError, HexFormatError};
pub use job::{CancelHandle, HashEngine, HashOutcome, JobHandle, JobPhase};
pub use progress::{JobObserver, NoopObserver, ProgressSampler, PROGRESS_INTERVAL};
pub use request::{AlgorithmChoice, HashRequest, JobRequest};
pub use stream::{CancellableReader, ProgressSource, StreamProgress};
