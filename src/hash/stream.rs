// Cancellable stream wrapper
// Lets a progress observer and an abort request share a stream with the
// thread that is digesting it

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Position and length of a stream at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamProgress {
    pub position: u64,
    pub length: u64,
}

impl StreamProgress {
    /// Percentage read in [0, 100]. An empty or unknown length reports 0.
    pub fn percent(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        (100.0 * self.position as f64 / self.length as f64).clamp(0.0, 100.0)
    }
}

/// Something whose read progress can be sampled from another thread
pub trait ProgressSource: Send + Sync {
    fn progress(&self) -> StreamProgress;
}

/// Seekable byte source with serialized access and a one-shot abort.
///
/// All reads and seeks go through one lock so an abort can never land in
/// the middle of a read. `position` and `length` never take the lock.
///
/// Aborting does not interrupt a digest in progress. It moves the source to
/// its end so the next read reports end-of-stream; whatever digest the
/// reader's consumer produces afterwards covers a truncated stream and must
/// be discarded.
pub struct CancellableReader<R> {
    inner: Mutex<R>,
    length: u64,
    position: AtomicU64,
    aborted: AtomicBool,
}

impl<R: Read + Seek> CancellableReader<R> {
    /// Wrap a source, measuring its length from the current position
    pub fn new(mut inner: R) -> io::Result<Self> {
        let start = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;

        Ok(Self {
            inner: Mutex::new(inner),
            length: end,
            position: AtomicU64::new(start),
            aborted: AtomicBool::new(false),
        })
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Acquire)
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Force the source to end-of-stream.
    ///
    /// Never waits for a read in progress. If the reader is busy, the seek
    /// happens on its next read instead. Returns `Ok(false)` when the reader
    /// was already aborted.
    pub fn abort(&self) -> io::Result<bool> {
        if self.aborted.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }

        match self.inner.try_lock() {
            Ok(mut inner) => self.seek_to_end(&mut inner)?,
            Err(TryLockError::WouldBlock) => {}
            Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
        }
        Ok(true)
    }

    fn seek_to_end(&self, inner: &mut R) -> io::Result<()> {
        let end = inner.seek(SeekFrom::End(0))?;
        self.position.store(end, Ordering::Release);
        Ok(())
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, R>> {
        self.inner.lock().map_err(|_| poisoned())
    }

    fn read_locked(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock()?;
        if self.is_aborted() {
            if self.position() < self.length {
                self.seek_to_end(&mut inner)?;
            }
            return Ok(0);
        }

        let bytes_read = inner.read(buf)?;
        self.position.fetch_add(bytes_read as u64, Ordering::AcqRel);
        Ok(bytes_read)
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "stream lock poisoned")
}

impl<R: Read + Seek> Read for &CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_locked(buf)
    }
}

impl<R: Read + Seek> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_locked(buf)
    }
}

impl<R: Read + Seek + Send> ProgressSource for CancellableReader<R> {
    fn progress(&self) -> StreamProgress {
        StreamProgress {
            position: self.position(),
            length: self.length,
        }
    }
}
