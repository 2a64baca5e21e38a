// RSA Signatures
// PKCS#1 v1.5 signing and verification with DigestInfo hash detection

use rand::{CryptoRng, RngCore};
use tracing::trace;

use super::bigint::{bytes_to_int, int_to_bytes};
use super::engine::{blinded_encrypt, decrypt_int};
use super::hash::{compute_hash, HashAlgorithm};
use super::keygen::{RsaPrivateKey, RsaPublicKey};
use super::padding::pad_for_signing;
use crate::error::{Result, RsaError};
use crate::util::source::ByteSource;

/// Sign a precomputed digest with the private key.
///
/// `hash_value` should be the output of `hash_method`; it is placed after
/// the algorithm's DigestInfo prefix as given. Fails with `Overflow` when the
/// key is too small to hold prefix and digest.
pub fn sign_hash(
    hash_value: &[u8],
    private_key: &RsaPrivateKey,
    hash_method: HashAlgorithm,
) -> Result<Vec<u8>> {
    sign_hash_with_rng(&mut rand::thread_rng(), hash_value, private_key, hash_method)
}

pub fn sign_hash_with_rng<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    hash_value: &[u8],
    private_key: &RsaPrivateKey,
    hash_method: HashAlgorithm,
) -> Result<Vec<u8>> {
    let prefix = hash_method.digest_info();
    let mut cleartext = Vec::with_capacity(prefix.len() + hash_value.len());
    cleartext.extend_from_slice(prefix);
    cleartext.extend_from_slice(hash_value);

    let key_length = private_key.block_size();
    let padded = pad_for_signing(&cleartext, key_length)?;

    let payload = bytes_to_int(&padded);
    let encrypted = blinded_encrypt(rng, &payload, private_key)?;

    int_to_bytes(&encrypted, Some(key_length))
}

/// Hash `message` with `hash_method`, then sign the digest.
/// This is a detached signature: the message itself is not altered.
pub fn sign<'a>(
    message: impl Into<ByteSource<'a>>,
    private_key: &RsaPrivateKey,
    hash_method: HashAlgorithm,
) -> Result<Vec<u8>> {
    sign_with_rng(&mut rand::thread_rng(), message, private_key, hash_method)
}

pub fn sign_with_rng<'a, R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    message: impl Into<ByteSource<'a>>,
    private_key: &RsaPrivateKey,
    hash_method: HashAlgorithm,
) -> Result<Vec<u8>> {
    let msg_hash = compute_hash(message, hash_method)?;
    sign_hash_with_rng(rng, &msg_hash, private_key, hash_method)
}

/// Undo the public-key transform and return the padded clear block
fn recover_clear_block(signature: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    let key_length = public_key.block_size();
    let encrypted = bytes_to_int(signature);
    let decrypted = decrypt_int(&encrypted, &public_key.e, &public_key.n);
    int_to_bytes(&decrypted, Some(key_length)).map_err(|_| RsaError::Verification)
}

/// Hash algorithm claimed by a clear signature block.
///
/// Matches the DigestInfo prefix anywhere in the block rather than at its
/// expected offset; `verify` still rebuilds and compares the full block.
fn find_method_hash(clear_block: &[u8]) -> Result<HashAlgorithm> {
    HashAlgorithm::detect(clear_block).ok_or_else(|| {
        trace!("no known DigestInfo in signature block");
        RsaError::Verification
    })
}

/// Check that `signature` matches `message` under `public_key`.
///
/// The hash method is detected from the signature and returned on success.
/// Any mismatch is reported as `RsaError::Verification`.
pub fn verify<'a>(
    message: impl Into<ByteSource<'a>>,
    signature: &[u8],
    public_key: &RsaPublicKey,
) -> Result<HashAlgorithm> {
    let key_length = public_key.block_size();
    let clear_block = recover_clear_block(signature, public_key)?;

    let method = find_method_hash(&clear_block)?;
    let message_hash = compute_hash(message, method)?;

    // Reconstruct the expected padded hash
    let prefix = method.digest_info();
    let mut cleartext = Vec::with_capacity(prefix.len() + message_hash.len());
    cleartext.extend_from_slice(prefix);
    cleartext.extend_from_slice(&message_hash);
    let expected = pad_for_signing(&cleartext, key_length).map_err(|_| RsaError::Verification)?;

    if expected != clear_block {
        trace!("signature block does not match message");
        return Err(RsaError::Verification);
    }

    Ok(method)
}

/// Hash method a signature claims to use, without checking any message.
/// Use `verify` to also check the message.
pub fn find_signature_hash(signature: &[u8], public_key: &RsaPublicKey) -> Result<HashAlgorithm> {
    let clear_block = recover_clear_block(signature, public_key)?;
    find_method_hash(&clear_block)
}

impl RsaPrivateKey {
    /// Sign a message using this private key
    pub fn sign<'a>(
        &self,
        message: impl Into<ByteSource<'a>>,
        hash_method: HashAlgorithm,
    ) -> Result<Vec<u8>> {
        sign(message, self, hash_method)
    }
}

impl RsaPublicKey {
    /// Verify a signature made by the matching private key
    pub fn verify<'a>(
        &self,
        message: impl Into<ByteSource<'a>>,
        signature: &[u8],
    ) -> Result<HashAlgorithm> {
        verify(message, signature, self)
    }
}
