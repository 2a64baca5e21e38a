// RSA Encryption Implementation
// Implements RSA encryption with PKCS#1 v1.5 padding

use rand::{CryptoRng, RngCore};

use super::bigint::{bytes_to_int, int_to_bytes};
use super::engine::encrypt_int;
use super::keygen::RsaPublicKey;
use super::padding::pad_for_encryption;
use crate::error::Result;

/// Encrypt `message` with PKCS#1 v1.5 using thread-local randomness.
///
/// The message may be at most `block_size() - 11` bytes long. The
/// ciphertext is exactly `block_size()` bytes.
pub fn encrypt(message: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    encrypt_with_rng(&mut rand::thread_rng(), message, public_key)
}

pub fn encrypt_with_rng<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    message: &[u8],
    public_key: &RsaPublicKey,
) -> Result<Vec<u8>> {
    let key_length = public_key.block_size();
    let padded = pad_for_encryption(rng, message, key_length)?;

    let payload = bytes_to_int(&padded);
    let encrypted = encrypt_int(&payload, &public_key.e, &public_key.n)?;

    int_to_bytes(&encrypted, Some(key_length))
}

impl RsaPublicKey {
    /// Encrypt a message using this public key
    /// Returns ciphertext as bytes
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(plaintext, self)
    }
}
