//! Content hash - the MD5 digest the service uses for deduplication.

use md5::{Digest, Md5};
use std::fmt;
use std::io::{self, Read};

use crate::{Error, Result};

/// Read buffer size for streaming digests.
const CHUNK_SIZE: usize = 64 * 1024;

/// MD5 digest of some content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 16],
}

impl ContentHash {
    /// Create a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        ContentHash { bytes }
    }

    /// Parse a hash from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() != 32 {
            return Err(Error::Validation(format!(
                "expected 32 hex chars for content hash, got {}",
                hex.len()
            )));
        }

        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex, &mut bytes)
            .map_err(|e| Error::Validation(format!("invalid content hash: {}", e)))?;
        Ok(ContentHash { bytes })
    }

    /// Compute the hash of in-memory content.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(content);
        ContentHash::from_digest(hasher)
    }

    /// Compute the hash by streaming content from a reader.
    ///
    /// Returns the hash along with the number of bytes read.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<(Self, u64)> {
        let mut hasher = Md5::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut size = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
            size += n as u64;
        }

        Ok((ContentHash::from_digest(hasher), size))
    }

    fn from_digest(hasher: Md5) -> Self {
        let result = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&result);
        ContentHash { bytes }
    }

    /// Get the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl std::str::FromStr for ContentHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ContentHash::from_hex(s)
    }
}
