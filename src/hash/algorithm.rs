// Hash algorithm registry
// Maps algorithm names to streaming digest implementations

use std::io::{self, Read};
use std::sync::Arc;

use blake2::{Blake2b512, Blake2s256};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use super::error::HashUtilityError;

/// Default read buffer for streaming computation (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Trait for incremental hash implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the result
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the output size in bytes
    fn output_size(&self) -> usize;
}

/// A digest primitive that can be plugged into a hashing job.
///
/// Implementations only need a fixed output size and a way to digest a
/// whole byte stream. `compute` is free to block until the stream reports
/// end-of-file; there is no way to interrupt it other than ending the stream.
pub trait DigestAlgorithm: Send + Sync {
    /// Display name, e.g. "SHA-256"
    fn name(&self) -> &str;

    /// Size of the digest in bits
    fn output_bits(&self) -> usize;

    /// Digest everything the reader yields until end-of-stream
    fn compute(&self, reader: &mut dyn Read) -> io::Result<Vec<u8>>;
}

/// Any RustCrypto `Digest` implementation
pub struct DigestWrapper<D>(D);

impl<D: Digest + Send> Hasher for DigestWrapper<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        <D as Digest>::output_size()
    }
}

// BLAKE3 wrapper
pub struct Blake3Wrapper(blake3::Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        blake3::OUT_LEN // 256 bits
    }
}

/// Information about a hash algorithm
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlgorithmInfo {
    pub name: String,
    pub output_bits: usize,
    pub post_quantum: bool,
}

/// A registry algorithm: a name plus a factory for fresh hasher instances
#[derive(Clone)]
pub struct StreamingAlgorithm {
    name: &'static str,
    output_bits: usize,
    factory: fn() -> Box<dyn Hasher>,
    buffer_size: usize,
}

impl StreamingAlgorithm {
    fn new(name: &'static str, factory: fn() -> Box<dyn Hasher>) -> Self {
        // Probe once so the advertised size always comes from a real instance.
        let output_bits = factory().output_size() * 8;
        Self {
            name,
            output_bits,
            factory,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Use a custom read buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }
}

impl std::fmt::Debug for StreamingAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingAlgorithm")
            .field("name", &self.name)
            .field("output_bits", &self.output_bits)
            .finish()
    }
}

impl DigestAlgorithm for StreamingAlgorithm {
    fn name(&self) -> &str {
        self.name
    }

    fn output_bits(&self) -> usize {
        self.output_bits
    }

    fn compute(&self, reader: &mut dyn Read) -> io::Result<Vec<u8>> {
        let mut hasher = (self.factory)();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }
}

fn new_md5() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Md5::new()))
}
fn new_sha1() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha1::new()))
}
fn new_sha224() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha224::new()))
}
fn new_sha256() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha256::new()))
}
fn new_sha384() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha384::new()))
}
fn new_sha512() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha512::new()))
}
fn new_sha3_224() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha3_224::new()))
}
fn new_sha3_256() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha3_256::new()))
}
fn new_sha3_384() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha3_384::new()))
}
fn new_sha3_512() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Sha3_512::new()))
}
fn new_blake2b512() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Blake2b512::new()))
}
fn new_blake2s256() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(Blake2s256::new()))
}
fn new_blake3() -> Box<dyn Hasher> {
    Box::new(Blake3Wrapper(blake3::Hasher::new()))
}

/// Canonical names and factories, in display order
const ALGORITHMS: &[(&str, fn() -> Box<dyn Hasher>)] = &[
    ("MD5", new_md5),
    ("SHA1", new_sha1),
    ("SHA-224", new_sha224),
    ("SHA-256", new_sha256),
    ("SHA-384", new_sha384),
    ("SHA-512", new_sha512),
    ("SHA3-224", new_sha3_224),
    ("SHA3-256", new_sha3_256),
    ("SHA3-384", new_sha3_384),
    ("SHA3-512", new_sha3_512),
    ("BLAKE2b-512", new_blake2b512),
    ("BLAKE2s-256", new_blake2s256),
    ("BLAKE3", new_blake3),
];

/// Registry for hash algorithms
pub struct HashRegistry;

impl HashRegistry {
    /// Get a hasher instance for the specified algorithm
    pub fn get_hasher(algorithm: &str) -> Result<Box<dyn Hasher>, HashUtilityError> {
        let (_, factory) = Self::lookup(algorithm)?;
        Ok(factory())
    }

    /// Resolve an algorithm name to a pluggable digest algorithm
    pub fn get_algorithm(algorithm: &str) -> Result<Arc<dyn DigestAlgorithm>, HashUtilityError> {
        Ok(Arc::new(Self::get_streaming(algorithm)?))
    }

    /// Resolve an algorithm name to the concrete streaming implementation
    pub fn get_streaming(algorithm: &str) -> Result<StreamingAlgorithm, HashUtilityError> {
        let (name, factory) = Self::lookup(algorithm)?;
        Ok(StreamingAlgorithm::new(name, factory))
    }

    fn lookup(algorithm: &str) -> Result<(&'static str, fn() -> Box<dyn Hasher>), HashUtilityError> {
        let canonical = match algorithm.trim().to_lowercase().as_str() {
            "md5" => "MD5",
            "sha1" | "sha-1" => "SHA1",
            "sha224" | "sha-224" => "SHA-224",
            "sha256" | "sha-256" => "SHA-256",
            "sha384" | "sha-384" => "SHA-384",
            "sha512" | "sha-512" => "SHA-512",
            "sha3-224" | "sha3_224" => "SHA3-224",
            "sha3-256" | "sha3_256" => "SHA3-256",
            "sha3-384" | "sha3_384" => "SHA3-384",
            "sha3-512" | "sha3_512" => "SHA3-512",
            "blake2b" | "blake2b-512" | "blake2b512" => "BLAKE2b-512",
            "blake2s" | "blake2s-256" | "blake2s256" => "BLAKE2s-256",
            "blake3" => "BLAKE3",
            _ => {
                return Err(HashUtilityError::UnsupportedAlgorithm {
                    algorithm: algorithm.to_string(),
                })
            }
        };

        ALGORITHMS
            .iter()
            .find(|(name, _)| *name == canonical)
            .copied()
            .ok_or_else(|| HashUtilityError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            })
    }

    /// List all available hash algorithms
    pub fn list_algorithms() -> Vec<AlgorithmInfo> {
        ALGORITHMS
            .iter()
            .map(|(name, factory)| AlgorithmInfo {
                name: name.to_string(),
                output_bits: factory().output_size() * 8,
                post_quantum: Self::is_post_quantum(name),
            })
            .collect()
    }

    /// Check if an algorithm is post-quantum resistant
    pub fn is_post_quantum(algorithm: &str) -> bool {
        // SHA-3 family algorithms are considered post-quantum resistant
        algorithm.to_lowercase().starts_with("sha3-")
    }
}
