// RSA Big Integer Operations
// Wrapper around num-bigint for RSA-specific operations

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand::{CryptoRng, RngCore};

use crate::error::{Result, RsaError};

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// Create a big integer from bytes (big-endian)
pub fn bytes_to_int(bytes: &[u8]) -> RsaBigInt {
    RsaBigInt::from_bytes_be(bytes)
}

/// Convert a big integer to big-endian bytes.
///
/// Without a fill size the shortest encoding is returned (`[0x00]` for zero).
/// With `Some(fill)` the result is left-padded with zero bytes to exactly
/// `fill` bytes, failing with `Overflow` when the value needs more room.
pub fn int_to_bytes(n: &RsaBigInt, fill_size: Option<usize>) -> Result<Vec<u8>> {
    let raw = n.to_bytes_be();
    let Some(fill) = fill_size else {
        return Ok(raw);
    };

    let needed = if n.is_zero() { 0 } else { raw.len() };
    if needed > fill {
        return Err(RsaError::Overflow(format!(
            "integer needs {} bytes, but the fill size is {}",
            needed, fill
        )));
    }

    let mut out = vec![0u8; fill];
    out[fill - needed..].copy_from_slice(&raw[raw.len() - needed..]);
    Ok(out)
}

/// Number of bits needed to represent `n`, 0 for zero
pub fn bit_size(n: &RsaBigInt) -> u64 {
    n.bits()
}

/// Number of bytes needed to hold `n`, rounded up; zero still takes one byte
pub fn byte_size(n: &RsaBigInt) -> usize {
    if n.is_zero() {
        return 1;
    }
    bit_size(n).div_ceil(8) as usize
}

/// Modular exponentiation: base^exp mod modulus
/// Uses square-and-multiply algorithm
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> RsaBigInt {
    if modulus.is_one() {
        return RsaBigInt::zero();
    }

    let mut result = RsaBigInt::one();
    let mut base = base % modulus;
    let mut exp = exp.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }

    result
}

/// Extended Euclidean Algorithm
/// Returns (gcd, x, y) such that a*x + b*y = gcd, with x reduced mod b and y mod a.
pub fn extended_gcd(a: &RsaBigInt, b: &RsaBigInt) -> (RsaBigInt, RsaBigInt, RsaBigInt) {
    let (orig_a, orig_b) = (
        BigInt::from_biguint(Sign::Plus, a.clone()),
        BigInt::from_biguint(Sign::Plus, b.clone()),
    );
    let (mut a, mut b) = (orig_a.clone(), orig_b.clone());
    let (mut x, mut last_x) = (BigInt::zero(), BigInt::one());
    let (mut y, mut last_y) = (BigInt::one(), BigInt::zero());

    while !b.is_zero() {
        let (q, r) = a.div_rem(&b);
        a = std::mem::replace(&mut b, r);
        let next_x = &last_x - &q * &x;
        last_x = std::mem::replace(&mut x, next_x);
        let next_y = &last_y - &q * &y;
        last_y = std::mem::replace(&mut y, next_y);
    }

    if last_x.is_negative() {
        last_x += &orig_b;
    }
    if last_y.is_negative() {
        last_y += &orig_a;
    }

    (
        a.magnitude().clone(),
        last_x.magnitude().clone(),
        last_y.magnitude().clone(),
    )
}

/// Compute modular inverse: a^(-1) mod m
/// Fails with `NotRelativePrime` when gcd(a, m) != 1
pub fn mod_inverse(a: &RsaBigInt, m: &RsaBigInt) -> Result<RsaBigInt> {
    let (divider, inv, _) = extended_gcd(a, m);

    if !divider.is_one() {
        return Err(RsaError::NotRelativePrime {
            a: a.clone(),
            b: m.clone(),
            d: divider,
        });
    }

    Ok(inv % m)
}

/// Greatest common divisor
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    a.gcd(b)
}

/// Least common multiple
pub fn lcm(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    if a.is_zero() || b.is_zero() {
        return RsaBigInt::zero();
    }
    (a * b) / gcd(a, b)
}

/// True if a and b share no divisor other than 1
pub fn are_relatively_prime(a: &RsaBigInt, b: &RsaBigInt) -> bool {
    gcd(a, b).is_one()
}

/// Chinese Remainder Theorem.
/// Finds x such that x = residues[i] (mod moduli[i]) for each i.
pub fn crt(residues: &[RsaBigInt], moduli: &[RsaBigInt]) -> Result<RsaBigInt> {
    if residues.len() != moduli.len() || moduli.is_empty() {
        return Err(RsaError::InvalidArgument(format!(
            "crt needs matching non-empty inputs, got {} residues and {} moduli",
            residues.len(),
            moduli.len()
        )));
    }
    if moduli.iter().any(Zero::is_zero) {
        return Err(RsaError::InvalidArgument("crt modulus must be non-zero".to_string()));
    }

    let m: RsaBigInt = moduli.iter().product();
    let mut x = RsaBigInt::zero();

    for (a_i, m_i) in residues.iter().zip(moduli) {
        let big_m_i = &m / m_i;
        let inv = mod_inverse(&big_m_i, m_i)?;
        x = (x + a_i * &big_m_i * inv) % &m;
    }

    Ok(x)
}

/// Random integer with exactly `bits` bits, top and bottom bit forced on
pub fn random_odd_int<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, bits: u64) -> RsaBigInt {
    let value = rng.gen_biguint(bits);
    value | (RsaBigInt::one() << (bits - 1)) | RsaBigInt::one()
}

/// Uniform random integer in [low, high)
pub fn random_in_range<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    low: &RsaBigInt,
    high: &RsaBigInt,
) -> RsaBigInt {
    rng.gen_biguint_range(low, high)
}
