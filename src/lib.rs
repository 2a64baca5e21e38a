//! RSA key generation, encryption and signatures with PKCS#1 v1.5 padding.
//!
//! Private-key operations use the Chinese Remainder Theorem behind a fresh
//! random blinding factor on every call. Hashes for signatures come from the
//! RustCrypto `md-5`, `sha1` and `sha2` crates.
//!
//! ```no_run
//! use rsa_lite::{decrypt, encrypt, new_keypair, sign, verify, HashAlgorithm};
//!
//! let (public_key, private_key) = new_keypair(1024)?;
//!
//! let ciphertext = encrypt(b"hello", &public_key)?;
//! assert_eq!(decrypt(&ciphertext, &private_key)?, b"hello");
//!
//! let signature = sign(b"hello", &private_key, HashAlgorithm::Sha256)?;
//! assert_eq!(verify(b"hello", &signature, &public_key)?, HashAlgorithm::Sha256);
//! # Ok::<(), rsa_lite::RsaError>(())
//! ```
//!
//! Every operation is synchronous and takes keys by shared reference.
//! Randomized operations have `_with_rng` variants accepting any
//! `RngCore + CryptoRng`; the plain variants use `rand::thread_rng()`.

pub mod error;
pub mod rsa;
pub mod util;

pub use error::{Result, RsaError};
pub use rsa::{
    compute_hash, compute_hash_with, decrypt, decrypt_with_rng, encrypt, encrypt_with_rng,
    find_signature_hash, new_keypair, new_keypair_with, sign, sign_hash, sign_hash_with_rng,
    sign_with_rng, verify, HashAlgorithm, KeyGenOptions, PrivateKey, PublicKey, RsaPrivateKey,
    RsaPublicKey,
};
pub use util::{ByteSource, SourceConfig};
