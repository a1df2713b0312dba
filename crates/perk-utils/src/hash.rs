use std::{fmt::Write as _, fs::File, io::Read as _, path::Path};

use sha2::Digest as _;

use crate::error::{HashError, HashResult};

/// Incremental digest computation over one of the supported algorithms.
///
/// Downloads feed chunks into a `Digester` as they stream to disk, so
/// memory use stays bounded by the read buffer regardless of archive size.
#[derive(Debug)]
pub enum Digester {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl Digester {
    /// Creates a digester for the named algorithm.
    ///
    /// Recognized names are `blake3`, `sha256` and `sha-256`
    /// (case-insensitive). Unknown names fail closed with
    /// [`HashError::UnknownAlgorithm`] rather than defaulting.
    pub fn new(algorithm: &str) -> HashResult<Self> {
        match algorithm.to_ascii_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3(Box::new(blake3::Hasher::new()))),
            "sha256" | "sha-256" => Ok(Self::Sha256(sha2::Sha256::new())),
            _ => Err(HashError::UnknownAlgorithm {
                name: algorithm.to_string(),
            }),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(data);
            }
            Self::Sha256(hasher) => hasher.update(data),
        }
    }

    /// Consumes the digester and returns the hex-encoded digest.
    pub fn finalize(self) -> String {
        match self {
            Self::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
            Self::Sha256(hasher) => {
                let digest = hasher.finalize();
                digest.iter().fold(
                    String::with_capacity(digest.len() * 2),
                    |mut out, byte| {
                        let _ = write!(out, "{byte:02x}");
                        out
                    },
                )
            }
        }
    }
}

/// Calculates the checksum of a file with the named algorithm.
///
/// The file is read in fixed-size chunks; the result is a hex-encoded
/// lowercase digest string.
pub fn hash_file<P: AsRef<Path>>(algorithm: &str, file_path: P) -> HashResult<String> {
    let file_path = file_path.as_ref();
    let read_err = |err: std::io::Error| HashError::ReadFailed {
        path: file_path.to_path_buf(),
        source: err,
    };

    let mut digester = Digester::new(algorithm)?;
    let mut file = File::open(file_path).map_err(read_err)?;
    let mut buffer = [0u8; 8192];

    loop {
        let n = file.read(&mut buffer).map_err(read_err)?;
        if n == 0 {
            break;
        }
        digester.update(&buffer[..n]);
    }

    Ok(digester.finalize())
}

/// Verifies the checksum of a file against an expected value.
///
/// The comparison is case-insensitive.
pub fn verify_file<P: AsRef<Path>>(
    algorithm: &str,
    file_path: P,
    expected: &str,
) -> HashResult<bool> {
    let actual = hash_file(algorithm, file_path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}
