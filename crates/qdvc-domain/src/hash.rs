use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Name of the hash algorithm, as recorded in pointer files and cache paths.
pub const HASH_ALGORITHM: &str = "md5";
/// Length of a hex-encoded MD5 digest.
pub const HASH_HEX_LEN: usize = 32;

const READ_BUFFER: usize = 32 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("content hash must be {expected} hex characters, found {found}")]
    Length { expected: usize, found: usize },
    #[error("content hash contains non-hex character {0:?}")]
    NotHex(char),
}

/// Lowercase hex MD5 digest identifying a blob in the cache and on the remote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parses a hex digest, normalizing it to lowercase.
    pub fn parse(text: &str) -> Result<Self, HashError> {
        if text.len() != HASH_HEX_LEN {
            return Err(HashError::Length {
                expected: HASH_HEX_LEN,
                found: text.len(),
            });
        }
        if let Some(bad) = text.chars().find(|ch| !ch.is_ascii_hexdigit()) {
            return Err(HashError::NotHex(bad));
        }
        Ok(Self(text.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character shard prefix.
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }

    /// Remainder after the shard prefix.
    pub fn remainder(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

/// Streams `reader` through MD5 and returns the digest with the byte count.
pub fn compute_md5(mut reader: impl Read) -> io::Result<(ContentHash, u64)> {
    let mut hasher = Md5::new();
    let mut buf = vec![0_u8; READ_BUFFER];
    let mut total: u64 = 0;
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
        total += read as u64;
    }
    Ok((ContentHash(hex::encode(hasher.finalize())), total))
}
