// RSA Core Transforms
// Raw modular exponentiation and the blinded CRT private-key operation

use rand::{CryptoRng, RngCore};
use tracing::trace;

use super::bigint::{
    are_relatively_prime, bit_size, from_u64, mod_inverse, mod_pow, random_in_range, RsaBigInt,
};
use super::keygen::RsaPrivateKey;
use crate::error::{Result, RsaError};

/// Upper bound on blinding factor draws. A draw only fails when it shares
/// a factor with n, which for real keys means it hit p or q.
pub const MAX_BLINDING_ATTEMPTS: u32 = 1_000;

/// Encrypt an integer with exponent `e` modulo `n`: message^e mod n.
/// Requires message < n.
pub fn encrypt_int(message: &RsaBigInt, e: &RsaBigInt, n: &RsaBigInt) -> Result<RsaBigInt> {
    if message >= n {
        return Err(RsaError::Overflow(format!(
            "message of {} bits does not fit a {}-bit modulus",
            bit_size(message),
            bit_size(n)
        )));
    }
    Ok(mod_pow(message, e, n))
}

/// Raw exponentiation cyphertext^d mod n, without blinding or CRT.
/// Used for public-key signature checks.
pub fn decrypt_int(cyphertext: &RsaBigInt, d: &RsaBigInt, n: &RsaBigInt) -> RsaBigInt {
    mod_pow(cyphertext, d, n)
}

/// Decrypt using Chinese Remainder Theorem (CRT)
/// This is faster than regular decryption because we work with smaller numbers
fn private_transform(c: &RsaBigInt, key: &RsaPrivateKey) -> RsaBigInt {
    // m1 = c^exp1 mod p
    let m1 = mod_pow(c, &key.exp1, &key.p);

    // m2 = c^exp2 mod q
    let m2 = mod_pow(c, &key.exp2, &key.q);

    // h = (m1 - m2) * coef mod p
    let m2_mod_p = &m2 % &key.p;
    let diff = if m1 >= m2_mod_p {
        m1 - m2_mod_p
    } else {
        m1 + &key.p - m2_mod_p
    };
    let h = (diff * &key.coef) % &key.p;

    // m = m2 + q * h, always below p * q
    m2 + &key.q * h
}

/// Draw r with 1 < r < n and gcd(r, n) = 1, returning r and r^-1 mod n
fn blinding_factor<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    n: &RsaBigInt,
) -> Result<(RsaBigInt, RsaBigInt)> {
    let two = from_u64(2);
    for attempt in 1..=MAX_BLINDING_ATTEMPTS {
        let r = random_in_range(rng, &two, n);
        if are_relatively_prime(&r, n) {
            let r_inv = mod_inverse(&r, n)?;
            return Ok((r, r_inv));
        }
        trace!(attempt, "blinding factor shares a factor with n, redrawing");
    }
    Err(RsaError::Internal("blinding factor search exceeded its attempt limit"))
}

/// Apply the private exponent to `value` behind a fresh random blinding factor
fn blinded_private_op<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    value: &RsaBigInt,
    key: &RsaPrivateKey,
) -> Result<RsaBigInt> {
    let n = &key.n;
    let (r, r_inv) = blinding_factor(rng, n)?;

    let blinded = (value * mod_pow(&r, &key.e, n)) % n;
    let transformed = private_transform(&blinded, key);

    Ok((transformed * r_inv) % n)
}

/// Decrypt `cyphertext` with the private key, blinded against timing attacks.
/// Same result as `decrypt_int(cyphertext, d, n)`.
pub fn blinded_decrypt<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    cyphertext: &RsaBigInt,
    key: &RsaPrivateKey,
) -> Result<RsaBigInt> {
    blinded_private_op(rng, cyphertext, key)
}

/// Apply the private exponent for signing, blinded the same way as decryption
pub fn blinded_encrypt<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    message: &RsaBigInt,
    key: &RsaPrivateKey,
) -> Result<RsaBigInt> {
    blinded_private_op(rng, message, key)
}

impl RsaPrivateKey {
    /// Blinded private-key decryption of a raw integer using thread-local randomness
    pub fn blinded_decrypt(&self, cyphertext: &RsaBigInt) -> Result<RsaBigInt> {
        blinded_decrypt(&mut rand::thread_rng(), cyphertext, self)
    }

    /// Blinded private-key "encryption" (signing) of a raw integer
    pub fn blinded_encrypt(&self, message: &RsaBigInt) -> Result<RsaBigInt> {
        blinded_encrypt(&mut rand::thread_rng(), message, self)
    }
}
