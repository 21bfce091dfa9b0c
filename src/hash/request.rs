// Job inputs and their validation

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::algorithm::{DigestAlgorithm, HashRegistry};
use super::hex;

/// Which digest algorithm a job should use
#[derive(Clone)]
pub enum AlgorithmChoice {
    /// A name resolved through `HashRegistry`
    Named(String),
    /// A caller-supplied implementation
    Custom(Arc<dyn DigestAlgorithm>),
}

impl From<&str> for AlgorithmChoice {
    fn from(name: &str) -> Self {
        AlgorithmChoice::Named(name.to_string())
    }
}

impl From<String> for AlgorithmChoice {
    fn from(name: String) -> Self {
        AlgorithmChoice::Named(name)
    }
}

impl From<Arc<dyn DigestAlgorithm>> for AlgorithmChoice {
    fn from(algorithm: Arc<dyn DigestAlgorithm>) -> Self {
        AlgorithmChoice::Custom(algorithm)
    }
}

/// Unvalidated job input, as collected from the user
#[derive(Clone)]
pub struct JobRequest {
    pub path: PathBuf,
    pub algorithm: AlgorithmChoice,
    /// Already-resolved hex digest, or empty to skip the comparison
    pub compare_to: String,
}

/// Validated job input
#[derive(Clone)]
pub struct HashRequest {
    pub path: PathBuf,
    pub algorithm: Arc<dyn DigestAlgorithm>,
    pub expected: Option<Vec<u8>>,
}

const BITS_PER_BYTE: usize = 8;

impl JobRequest {
    pub fn new(path: impl Into<PathBuf>, algorithm: impl Into<AlgorithmChoice>) -> Self {
        Self {
            path: path.into(),
            algorithm: algorithm.into(),
            compare_to: String::new(),
        }
    }

    pub fn compare_to(mut self, value: impl Into<String>) -> Self {
        self.compare_to = value.into();
        self
    }

    /// Check every input and report all problems together
    pub fn validate(&self) -> Result<HashRequest, Vec<String>> {
        let mut messages = Vec::new();

        let path = trim_path(&self.path);
        if !is_readable_file(&path) {
            messages.push("The specified file does not exist.".to_string());
        }

        let algorithm = match &self.algorithm {
            AlgorithmChoice::Named(name) if name.trim().is_empty() => {
                messages.push("An algorithm must be selected.".to_string());
                None
            }
            AlgorithmChoice::Named(name) => match HashRegistry::get_algorithm(name) {
                Ok(algorithm) => Some(algorithm),
                Err(e) => {
                    messages.push(format!("Unable to use the selected algorithm: {}", e.summary()));
                    None
                }
            },
            AlgorithmChoice::Custom(algorithm) => Some(Arc::clone(algorithm)),
        };

        let mut expected = None;
        if !self.compare_to.is_empty() {
            match hex::decode(&self.compare_to, true) {
                Ok(bytes) => {
                    let compare_bits = bytes.len() * BITS_PER_BYTE;
                    if let Some(algorithm) = &algorithm {
                        if algorithm.output_bits() != compare_bits {
                            messages.push(
                                "The Compare To hash value is not the required length for the selected algorithm."
                                    .to_string(),
                            );
                            messages.push(format!("Compare To length: {} bits", compare_bits));
                            messages.push(format!("Required length: {} bits", algorithm.output_bits()));
                        }
                    }
                    expected = Some(bytes);
                }
                Err(e) => {
                    messages.push(
                        "Unable to parse the Compare To hash value as a sequence of hexadecimal digit pairs."
                            .to_string(),
                    );
                    messages.push(e.to_string());
                }
            }
        }

        match algorithm {
            Some(algorithm) if messages.is_empty() => Ok(HashRequest {
                path,
                algorithm,
                expected,
            }),
            _ => Err(messages),
        }
    }
}

/// Drop whitespace picked up from pasted or saved paths
fn trim_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => PathBuf::from(text.trim()),
        None => path.to_path_buf(),
    }
}

fn is_readable_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|f| f.metadata())
        .map(|m| m.is_file())
        .unwrap_or(false)
}
