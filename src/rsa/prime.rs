// Prime Generation
// Miller-Rabin primality testing and random prime search

use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use tracing::{debug, trace};

use super::bigint::{bit_size, from_u64, mod_pow, random_in_range, random_odd_int, RsaBigInt};
use crate::error::{Result, RsaError};

/// Upper bound on candidates drawn by `get_prime`.
/// At 4096 bits roughly one odd candidate in 1400 is prime.
pub const MAX_PRIME_ATTEMPTS: u32 = 1_000_000;

/// Minimum Miller-Rabin rounds for an error probability of 2^-100,
/// per NIST FIPS 186-4 Appendix C Table C.3. Small sizes get 10.
pub fn rounds(bit_size: u64) -> u32 {
    if bit_size >= 1536 {
        3
    } else if bit_size >= 1024 {
        4
    } else if bit_size >= 512 {
        7
    } else {
        10
    }
}

/// Miller-Rabin primality test using fresh thread-local randomness
pub fn miller_rabin(n: &RsaBigInt, k: u32) -> bool {
    miller_rabin_with_rng(&mut rand::thread_rng(), n, k)
}

/// Miller-Rabin primality test.
///
/// A `false` answer is always correct. A `true` answer is wrong with
/// probability at most 4^-k.
pub fn miller_rabin_with_rng<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    n: &RsaBigInt,
    k: u32,
) -> bool {
    let two = from_u64(2);
    if n < &two {
        return false;
    }
    // No witness exists in [2, n-2]
    if n <= &from_u64(3) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // Write n-1 as d * 2^r with d odd
    let n_minus_one = n - 1u8;
    let mut d = n_minus_one.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    // Upper bound is exclusive, so this draws from [2, n-2]
    let upper = n - 1u8;

    for _ in 0..k {
        let a = random_in_range(rng, &two, &upper);
        let mut x = mod_pow(&a, &d, n);

        if x.is_one() || x == n_minus_one {
            continue;
        }

        let mut passed = false;
        for _ in 1..r {
            x = mod_pow(&x, &two, n);
            if x.is_one() {
                return false;
            }
            if x == n_minus_one {
                passed = true;
                break;
            }
        }

        if !passed {
            return false;
        }
    }

    true
}

/// Returns true if `n` is (probably) prime
pub fn is_prime(n: &RsaBigInt) -> bool {
    is_prime_with_rng(&mut rand::thread_rng(), n)
}

pub fn is_prime_with_rng<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, n: &RsaBigInt) -> bool {
    if n < &from_u64(10) {
        return [2u8, 3, 5, 7].iter().any(|&p| n == &RsaBigInt::from(p));
    }
    if n.is_even() {
        return false;
    }

    let k = rounds(bit_size(n));
    miller_rabin_with_rng(rng, n, k + 1)
}

/// Generate a random prime with exactly `bits` bits
pub fn get_prime(bits: u64) -> Result<RsaBigInt> {
    get_prime_with_rng(&mut rand::thread_rng(), bits)
}

pub fn get_prime_with_rng<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
) -> Result<RsaBigInt> {
    if bits <= 3 {
        return Err(RsaError::InvalidArgument(format!(
            "prime size must be more than 3 bits, got {}",
            bits
        )));
    }

    for attempt in 1..=MAX_PRIME_ATTEMPTS {
        let candidate = random_odd_int(rng, bits);
        if is_prime_with_rng(rng, &candidate) {
            debug!(bits, attempts = attempt, "found prime");
            return Ok(candidate);
        }
        trace!(bits, attempt, "prime candidate rejected");
    }

    Err(RsaError::Internal("prime search exceeded its attempt limit"))
}
