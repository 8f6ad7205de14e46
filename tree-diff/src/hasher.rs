//! Streaming content fingerprints

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TreeDiffError;

/// Fixed read size used when streaming file content into a hasher
pub const BLOCK_SIZE: usize = 4096;

/// Hash algorithms supported for content fingerprints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 hash
    #[default]
    Sha256,
    /// Blake3 hash (faster)
    Blake3,
}

impl HashAlgorithm {
    /// Tag written in front of the hex digest
    pub fn tag(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TreeDiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(TreeDiffError::option_error(format!(
                "unknown hash algorithm '{}'",
                other
            ))),
        }
    }
}

/// Compute an algorithm-tagged fingerprint (`"sha256:<hex>"`) of everything
/// `reader` yields.
///
/// Content is consumed in [`BLOCK_SIZE`] chunks, so memory use does not depend
/// on the file size. Read errors are returned as-is.
pub fn fingerprint<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> std::io::Result<String> {
    let mut buffer = [0u8; BLOCK_SIZE];

    let digest = match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let bytes_read = read_block(&mut reader, &mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            format!("{:x}", hasher.finalize())
        }
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let bytes_read = read_block(&mut reader, &mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            hasher.finalize().to_hex().to_string()
        }
    };

    Ok(format!("{}:{}", algorithm.tag(), digest))
}

/// `read` that retries on EINTR
fn read_block<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buffer) {
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
