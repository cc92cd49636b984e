//! Streaming file fingerprints.
//!
//! # Overview
//!
//! [`Hasher`] computes a 256-bit content digest of a file by streaming it
//! through the selected algorithm in fixed-size chunks, so large files never
//! need to be resident in memory. The result is identical to hashing the full
//! content in one pass.
//!
//! Two algorithms are available: BLAKE3 (default, fastest) and SHA-256.
//!
//! # Example
//!
//! ```no_run
//! use uniquify::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let fingerprint = hasher.fingerprint(Path::new("photo.jpg")).unwrap();
//! println!("{}", hash_to_hex(&fingerprint));
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::HashError;

/// A 256-bit content fingerprint.
pub type Fingerprint = [u8; 32];

/// Read buffer size for streaming (64 KiB).
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm used for fingerprints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl std::fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Incremental digest state for one file.
enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl DigestState {
    fn new(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            FingerprintAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Fingerprint {
        match self {
            Self::Blake3(h) => *h.finalize().as_bytes(),
            Self::Sha256(h) => h.finalize().into(),
        }
    }
}

/// File fingerprinter.
///
/// Cheap to share across worker threads (`&Hasher` is all a worker needs).
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    algorithm: FingerprintAlgorithm,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a BLAKE3 hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn with_algorithm(algorithm: FingerprintAlgorithm) -> Self {
        Self {
            algorithm,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag. Hashing stops between chunks once it is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Algorithm used by this hasher.
    #[must_use]
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fingerprint the full content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or
    /// an `Interrupted` I/O error if shutdown was requested mid-file.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.fingerprint_reader(path, file)
    }

    /// Fingerprint everything readable from `reader`.
    ///
    /// `path` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] on read failure.
    pub fn fingerprint_reader<R: Read>(
        &self,
        path: &Path,
        mut reader: R,
    ) -> Result<Fingerprint, HashError> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::from_io(
                    path,
                    std::io::Error::new(ErrorKind::Interrupted, "Shutdown"),
                ));
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }

        Ok(state.finalize())
    }

    /// Fingerprint an in-memory buffer.
    #[must_use]
    pub fn fingerprint_bytes(&self, data: &[u8]) -> Fingerprint {
        let mut state = DigestState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }
}

/// Format a fingerprint as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Fingerprint) -> String {
    use std::fmt::Write;
    hash.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Parse a 64-character hexadecimal string into a fingerprint.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Fingerprint> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}
