// RSA Decryption Implementation
// Implements PKCS#1 v1.5 decryption over the blinded CRT private transform

use rand::{CryptoRng, RngCore};
use tracing::trace;

use super::bigint::{bytes_to_int, int_to_bytes};
use super::engine::blinded_decrypt;
use super::keygen::RsaPrivateKey;
use super::padding::unpad_decryption;
use crate::error::Result;

/// Decrypt a PKCS#1 v1.5 ciphertext using thread-local randomness for blinding.
///
/// Any failure is reported as `RsaError::Decryption`, whether the key is wrong,
/// the ciphertext is corrupted, or the padding is malformed.
pub fn decrypt(ciphertext: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    decrypt_with_rng(&mut rand::thread_rng(), ciphertext, private_key)
}

pub fn decrypt_with_rng<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    ciphertext: &[u8],
    private_key: &RsaPrivateKey,
) -> Result<Vec<u8>> {
    let block_size = private_key.block_size();
    let encrypted = bytes_to_int(ciphertext);
    let decrypted = blinded_decrypt(rng, &encrypted, private_key)?;

    // The transform reduces mod n, so the result always fits the block
    let cleartext = int_to_bytes(&decrypted, Some(block_size))?;

    let message = unpad_decryption(&cleartext);
    if message.is_err() {
        trace!("pkcs1 decryption failed");
    }
    message
}

impl RsaPrivateKey {
    /// Decrypt a ciphertext using this private key
    /// Returns plaintext as bytes
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        decrypt(ciphertext, self)
    }
}
