// Hash Algorithms and DigestInfo
// Names, ASN.1 DigestInfo prefixes and streaming digests for signatures

use std::fmt;
use std::str::FromStr;

use sha2::digest::{Digest, DynDigest};

use crate::error::{Result, RsaError};
use crate::util::source::{ByteSource, SourceConfig};

/// Hash algorithms usable in PKCS#1 v1.5 signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// DER-encoded DigestInfo prefix for each algorithm, in detection order.
/// The digest itself follows the prefix.
static DIGEST_INFO: [(HashAlgorithm, &[u8]); 6] = [
    (
        HashAlgorithm::Md5,
        &[
            0x30, 0x20, 0x30, 0x0c, 0x06, 0x08, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05,
            0x05, 0x00, 0x04, 0x10,
        ],
    ),
    (
        HashAlgorithm::Sha1,
        &[
            0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04,
            0x14,
        ],
    ),
    (
        HashAlgorithm::Sha224,
        &[
            0x30, 0x2d, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x04, 0x05, 0x00, 0x04, 0x1c,
        ],
    ),
    (
        HashAlgorithm::Sha256,
        &[
            0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x01, 0x05, 0x00, 0x04, 0x20,
        ],
    ),
    (
        HashAlgorithm::Sha384,
        &[
            0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x02, 0x05, 0x00, 0x04, 0x30,
        ],
    ),
    (
        HashAlgorithm::Sha512,
        &[
            0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x03, 0x05, 0x00, 0x04, 0x40,
        ],
    ),
];

impl HashAlgorithm {
    /// Every supported algorithm, in the order signatures are scanned
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// ASN.1 DigestInfo prefix placed before the digest in a signature block
    pub fn digest_info(self) -> &'static [u8] {
        DIGEST_INFO
            .iter()
            .find(|(alg, _)| *alg == self)
            .map(|(_, prefix)| *prefix)
            .unwrap_or_default()
    }

    /// Digest length in bytes
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Fresh streaming hasher for this algorithm
    pub fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            HashAlgorithm::Md5 => Box::new(md5::Md5::new()),
            HashAlgorithm::Sha1 => Box::new(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => Box::new(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => Box::new(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Box::new(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Box::new(sha2::Sha512::new()),
        }
    }

    /// First algorithm whose DigestInfo prefix occurs anywhere in `clear_block`
    pub(crate) fn detect(clear_block: &[u8]) -> Option<HashAlgorithm> {
        DIGEST_INFO
            .iter()
            .find(|(_, prefix)| contains(clear_block, prefix))
            .map(|(alg, _)| *alg)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = RsaError;

    fn from_str(name: &str) -> Result<Self> {
        HashAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.name() == name)
            .ok_or_else(|| RsaError::InvalidArgument(format!("Invalid hash method: {}", name)))
    }
}

/// Digest of a message with the default chunk size
pub fn compute_hash<'a>(message: impl Into<ByteSource<'a>>, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    compute_hash_with(message, algorithm, &SourceConfig::default())
}

/// Digest of a message, reading readers in `config.chunk_size` chunks
pub fn compute_hash_with<'a>(
    message: impl Into<ByteSource<'a>>,
    algorithm: HashAlgorithm,
    config: &SourceConfig,
) -> Result<Vec<u8>> {
    let mut hasher = algorithm.hasher();
    message
        .into()
        .for_each_chunk(config, |chunk| hasher.update(chunk))?;
    Ok(hasher.finalize().into_vec())
}
