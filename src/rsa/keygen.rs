// RSA Key Generation
// Implements RSA key pair generation (public and private keys)

use std::fmt;

use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use tracing::{debug, trace, warn};

use super::bigint::{bit_size, from_u64, gcd, lcm, mod_inverse, RsaBigInt};
use super::prime::get_prime_with_rng;
use crate::error::{Result, RsaError};

/// Default public exponent (F4)
pub const DEFAULT_EXPONENT: u64 = 65537;

/// Upper bound on prime pairs drawn by `new_keypair`
pub const MAX_PAIR_ATTEMPTS: u32 = 10_000;

/// Smallest modulus `new_keypair` accepts
pub const MIN_KEY_BITS: u64 = 16;

/// RSA Public Key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RsaPublicKey {
    pub(crate) n: RsaBigInt, // Modulus
    pub(crate) e: RsaBigInt, // Public exponent
}

/// RSA Private Key
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    pub(crate) n: RsaBigInt, // Modulus (same as public)
    pub(crate) e: RsaBigInt, // Public exponent (needed for blinding)
    pub(crate) d: RsaBigInt, // Private exponent
    pub(crate) p: RsaBigInt, // First prime factor
    pub(crate) q: RsaBigInt, // Second prime factor
    // Pre-computed values for faster decryption
    pub(crate) exp1: RsaBigInt, // d mod (p-1)
    pub(crate) exp2: RsaBigInt, // d mod (q-1)
    pub(crate) coef: RsaBigInt, // q^(-1) mod p
}

/// Key generation settings
#[derive(Clone, Debug)]
pub struct KeyGenOptions {
    pub public_exponent: u64,
    /// Regenerate primes until n has exactly the requested number of bits
    pub exact_size: bool,
    /// Draw new primes instead of failing when e shares a factor with phi(n)
    pub retry_on_not_relative_prime: bool,
}

impl Default for KeyGenOptions {
    fn default() -> Self {
        Self {
            public_exponent: DEFAULT_EXPONENT,
            exact_size: true,
            retry_on_not_relative_prime: true,
        }
    }
}

impl KeyGenOptions {
    pub fn with_public_exponent(mut self, e: u64) -> Self {
        self.public_exponent = e;
        self
    }

    pub fn with_exact_size(mut self, exact: bool) -> Self {
        self.exact_size = exact;
        self
    }

    pub fn with_retry_on_not_relative_prime(mut self, retry: bool) -> Self {
        self.retry_on_not_relative_prime = retry;
        self
    }
}

impl RsaPublicKey {
    /// Build a public key from its components. `e` must be odd with 1 < e < n.
    pub fn new(n: RsaBigInt, e: RsaBigInt) -> Result<Self> {
        if !is_valid_exponent(&e) || e >= n {
            return Err(RsaError::InvalidArgument(
                "public exponent must be odd and satisfy 1 < e < n".to_string(),
            ));
        }
        Ok(Self { n, e })
    }

    pub fn n(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn e(&self) -> &RsaBigInt {
        &self.e
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        bit_size(&self.n)
    }

    /// Size in bytes of every ciphertext and signature made with this key
    pub fn block_size(&self) -> usize {
        super::bigint::byte_size(&self.n)
    }
}

impl fmt::Display for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey(n=0x{}, e={})",
            hex::encode(self.n.to_bytes_be()),
            self.e
        )
    }
}

impl RsaPrivateKey {
    /// Build a private key from all eight components.
    /// The CRT values must agree with d, p and q.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n: RsaBigInt,
        e: RsaBigInt,
        d: RsaBigInt,
        p: RsaBigInt,
        q: RsaBigInt,
        exp1: RsaBigInt,
        exp2: RsaBigInt,
        coef: RsaBigInt,
    ) -> Result<Self> {
        check_factors(&n, &e, &d, &p, &q)?;
        if exp1 != &d % (&p - 1u8) || exp2 != &d % (&q - 1u8) {
            return Err(RsaError::InvalidArgument(
                "CRT exponents do not match d".to_string(),
            ));
        }
        if !((&coef * &q) % &p).is_one() {
            return Err(RsaError::InvalidArgument(
                "CRT coefficient is not the inverse of q mod p".to_string(),
            ));
        }
        Ok(Self {
            n,
            e,
            d,
            p,
            q,
            exp1,
            exp2,
            coef,
        })
    }

    /// Build a private key from n, e, d, p, q, computing the CRT parameters
    pub fn from_components(
        n: RsaBigInt,
        e: RsaBigInt,
        d: RsaBigInt,
        p: RsaBigInt,
        q: RsaBigInt,
    ) -> Result<Self> {
        check_factors(&n, &e, &d, &p, &q)?;
        let (exp1, exp2, coef) = crt_params(&d, &p, &q)?;
        Self::new(n, e, d, p, q, exp1, exp2, coef)
    }

    pub fn n(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn e(&self) -> &RsaBigInt {
        &self.e
    }

    pub fn d(&self) -> &RsaBigInt {
        &self.d
    }

    pub fn p(&self) -> &RsaBigInt {
        &self.p
    }

    pub fn q(&self) -> &RsaBigInt {
        &self.q
    }

    pub fn exp1(&self) -> &RsaBigInt {
        &self.exp1
    }

    pub fn exp2(&self) -> &RsaBigInt {
        &self.exp2
    }

    pub fn coef(&self) -> &RsaBigInt {
        &self.coef
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        bit_size(&self.n)
    }

    pub fn block_size(&self) -> usize {
        super::bigint::byte_size(&self.n)
    }

    /// The public half of this key
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }
}

// Only public material is printed
impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("bits", &self.bit_length())
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

fn is_valid_exponent(e: &RsaBigInt) -> bool {
    e > &RsaBigInt::one() && e.is_odd()
}

/// n = p*q with distinct factors above 1, a valid e below n, and
/// e*d = 1 (mod lcm(p-1, q-1))
fn check_factors(
    n: &RsaBigInt,
    e: &RsaBigInt,
    d: &RsaBigInt,
    p: &RsaBigInt,
    q: &RsaBigInt,
) -> Result<()> {
    let two = from_u64(2);
    if p < &two || q < &two || p == q || &(p * q) != n {
        return Err(RsaError::InvalidArgument(
            "private key primes do not match the modulus".to_string(),
        ));
    }
    if !is_valid_exponent(e) || e >= n {
        return Err(RsaError::InvalidArgument(
            "public exponent must be odd and satisfy 1 < e < n".to_string(),
        ));
    }
    let l = lcm(&(p - 1u8), &(q - 1u8));
    if !((e * d) % l).is_one() {
        return Err(RsaError::InvalidArgument(
            "private exponent is not the inverse of e".to_string(),
        ));
    }
    Ok(())
}

/// exp1 = d mod (p-1), exp2 = d mod (q-1), coef = q^(-1) mod p
fn crt_params(
    d: &RsaBigInt,
    p: &RsaBigInt,
    q: &RsaBigInt,
) -> Result<(RsaBigInt, RsaBigInt, RsaBigInt)> {
    let exp1 = d % (p - 1u8);
    let exp2 = d % (q - 1u8);
    let coef = mod_inverse(q, p)?;
    Ok((exp1, exp2, coef))
}

/// Draw p and q so that p != q and, if requested, p*q has exactly `total_bits` bits.
/// Returns them with p > q.
fn find_p_q<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    total_bits: u64,
    exact_size: bool,
) -> Result<(RsaBigInt, RsaBigInt)> {
    // One extra bit on p makes an n of the full size much more likely
    let pbits = total_bits.div_ceil(2) + 1;
    let qbits = total_bits - pbits;

    let mut p = get_prime_with_rng(rng, pbits)?;
    let mut q = get_prime_with_rng(rng, qbits)?;

    // Alternate which prime is redrawn so neither stays stuck
    let mut change_p = false;
    for attempt in 1..=MAX_PAIR_ATTEMPTS {
        let acceptable = p != q && (!exact_size || bit_size(&(&p * &q)) == total_bits);
        if acceptable {
            debug!(pbits, qbits, attempts = attempt, "found prime pair");
            return Ok(if p > q { (p, q) } else { (q, p) });
        }

        trace!(attempt, change_p, "prime pair rejected");
        if change_p {
            p = get_prime_with_rng(rng, pbits)?;
        } else {
            q = get_prime_with_rng(rng, qbits)?;
        }
        change_p = !change_p;
    }

    Err(RsaError::Internal("prime pair search exceeded its attempt limit"))
}

/// Compute d and the CRT values for the primes, failing if e and phi(n) share a factor
fn build_keys(
    p: RsaBigInt,
    q: RsaBigInt,
    e: &RsaBigInt,
) -> Result<(RsaPublicKey, RsaPrivateKey)> {
    let n = &p * &q;
    let phi = (&p - 1u8) * (&q - 1u8);

    let divider = gcd(e, &phi);
    if !divider.is_one() {
        return Err(RsaError::NotRelativePrime {
            a: e.clone(),
            b: phi,
            d: divider,
        });
    }

    let d = mod_inverse(e, &phi)?;
    let (exp1, exp2, coef) = crt_params(&d, &p, &q)?;

    let public_key = RsaPublicKey {
        n: n.clone(),
        e: e.clone(),
    };
    let private_key = RsaPrivateKey {
        n,
        e: e.clone(),
        d,
        p,
        q,
        exp1,
        exp2,
        coef,
    };

    Ok((public_key, private_key))
}

/// Generate RSA key pair with specified bit length and default options
pub fn new_keypair(total_bits: u64) -> Result<(RsaPublicKey, RsaPrivateKey)> {
    new_keypair_with(&mut rand::thread_rng(), total_bits, &KeyGenOptions::default())
}

/// Generate RSA key pair
/// total_bits: Size of the modulus in bits
///
/// Fails with `NotRelativePrime` when the exponent shares a factor with
/// phi(n) and `retry_on_not_relative_prime` is off.
pub fn new_keypair_with<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    total_bits: u64,
    options: &KeyGenOptions,
) -> Result<(RsaPublicKey, RsaPrivateKey)> {
    if total_bits < MIN_KEY_BITS {
        return Err(RsaError::InvalidArgument(format!(
            "key size must be at least {} bits, got {}",
            MIN_KEY_BITS, total_bits
        )));
    }

    let e = from_u64(options.public_exponent);
    if !is_valid_exponent(&e) {
        return Err(RsaError::InvalidArgument(format!(
            "public exponent must be odd and greater than 1, got {}",
            options.public_exponent
        )));
    }
    // p*q never has fewer than total_bits - 1 bits, so this keeps e < n
    if bit_size(&e) + 2 > total_bits {
        return Err(RsaError::InvalidArgument(format!(
            "public exponent {} is too large for a {}-bit modulus",
            options.public_exponent, total_bits
        )));
    }

    debug!(total_bits, e = options.public_exponent, "generating key pair");

    for attempt in 1..=MAX_PAIR_ATTEMPTS {
        let (p, q) = find_p_q(rng, total_bits, options.exact_size)?;
        match build_keys(p, q, &e) {
            Ok(keys) => {
                debug!(total_bits, bits = keys.0.bit_length(), "key pair generated");
                return Ok(keys);
            }
            Err(RsaError::NotRelativePrime { .. }) if options.retry_on_not_relative_prime => {
                warn!(attempt, "public exponent not coprime with phi(n), drawing new primes");
            }
            Err(err) => return Err(err),
        }
    }

    Err(RsaError::Internal("key generation exceeded its attempt limit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn check_key_properties(public_key: &RsaPublicKey, private_key: &RsaPrivateKey, bits: u64) {
        let key = private_key;
        assert_ne!(key.p, key.q);
        assert!(key.p > key.q);
        assert_eq!(key.n, &key.p * &key.q);
        assert_eq!(public_key.n, key.n);
        assert_eq!(public_key.e, key.e);
        assert_eq!(key.bit_length(), bits);

        // e * d ≡ 1 (mod lcm(p-1, q-1))
        let l = lcm(&(&key.p - 1u8), &(&key.q - 1u8));
        assert_eq!((&key.e * &key.d) % &l, from_u64(1));

        assert_eq!(key.exp1, &key.d % (&key.p - 1u8));
        assert_eq!(key.exp2, &key.d % (&key.q - 1u8));
        assert_eq!((&key.coef * &key.q) % &key.p, from_u64(1));
    }

    #[test]
    fn test_key_generation() {
        let mut rng = StdRng::seed_from_u64(256);
        for bits in [256u64, 512] {
            let (public_key, private_key) =
                new_keypair_with(&mut rng, bits, &KeyGenOptions::default()).unwrap();
            check_key_properties(&public_key, &private_key, bits);
        }
    }

    #[test]
    fn test_key_generation_1024() {
        let (public_key, private_key) = new_keypair(1024).unwrap();
        check_key_properties(&public_key, &private_key, 1024);
        assert_eq!(public_key.block_size(), 128);
    }

    #[test]
    fn test_odd_key_sizes() {
        let mut rng = StdRng::seed_from_u64(17);
        for bits in [63u64, 129, 255] {
            let (public_key, private_key) =
                new_keypair_with(&mut rng, bits, &KeyGenOptions::default()).unwrap();
            check_key_properties(&public_key, &private_key, bits);
        }
    }

    #[test]
    fn test_inexact_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let options = KeyGenOptions::default().with_exact_size(false);
        let (public_key, _) = new_keypair_with(&mut rng, 128, &options).unwrap();
        let bits = public_key.bit_length();
        assert!(bits == 127 || bits == 128);
    }

    #[test]
    fn test_custom_exponent() {
        let mut rng = StdRng::seed_from_u64(5);
        let options = KeyGenOptions::default().with_public_exponent(3);
        let (public_key, private_key) = new_keypair_with(&mut rng, 256, &options).unwrap();
        assert_eq!(public_key.e, from_u64(3));
        check_key_properties(&public_key, &private_key, 256);
    }

    #[test]
    fn test_exponent_conflict_surfaces_without_retry() {
        // With e = 3, phi(n) is divisible by 3 whenever p or q is 1 mod 3,
        // so across a handful of draws the conflict must show up
        let mut rng = StdRng::seed_from_u64(11);
        let options = KeyGenOptions::default()
            .with_public_exponent(3)
            .with_retry_on_not_relative_prime(false);
        let saw_conflict = (0..40).any(|_| {
            matches!(
                new_keypair_with(&mut rng, 64, &options),
                Err(RsaError::NotRelativePrime { .. })
            )
        });
        assert!(saw_conflict);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(new_keypair(8), Err(RsaError::InvalidArgument(_))));
        let mut rng = StdRng::seed_from_u64(0);
        for e in [0u64, 1, 4, 65536] {
            let options = KeyGenOptions::default().with_public_exponent(e);
            assert!(matches!(
                new_keypair_with(&mut rng, 128, &options),
                Err(RsaError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_from_components_matches_generated() {
        let mut rng = StdRng::seed_from_u64(99);
        let (_, key) = new_keypair_with(&mut rng, 256, &KeyGenOptions::default()).unwrap();
        let rebuilt = RsaPrivateKey::from_components(
            key.n.clone(),
            key.e.clone(),
            key.d.clone(),
            key.p.clone(),
            key.q.clone(),
        )
        .unwrap();
        assert_eq!(rebuilt, key);
    }

    #[test]
    fn test_component_validation() {
        let n = from_u64(3233); // 61 * 53
        assert!(RsaPublicKey::new(n.clone(), from_u64(17)).is_ok());
        assert!(RsaPublicKey::new(n.clone(), from_u64(16)).is_err());
        assert!(RsaPublicKey::new(n.clone(), from_u64(1)).is_err());
        assert!(RsaPublicKey::new(n.clone(), from_u64(3235)).is_err());

        let key = RsaPrivateKey::from_components(
            n.clone(),
            from_u64(17),
            from_u64(413),
            from_u64(61),
            from_u64(53),
        )
        .unwrap();
        assert_eq!(key.exp1, from_u64(53));
        assert_eq!(key.exp2, from_u64(49));
        assert_eq!(key.coef, from_u64(38));

        assert!(RsaPrivateKey::from_components(
            n,
            from_u64(17),
            from_u64(413),
            from_u64(59),
            from_u64(53),
        )
        .is_err());
    }

    #[test]
    fn test_private_debug_hides_secrets() {
        let mut rng = StdRng::seed_from_u64(8);
        let (_, key) = new_keypair_with(&mut rng, 128, &KeyGenOptions::default()).unwrap();
        let text = format!("{:?}", key);
        assert!(!text.contains(&key.d.to_string()));
        assert!(!text.contains(&key.p.to_string()));
        assert!(text.contains("bits: 128"));
    }

    #[test]
    fn test_public_display() {
        let key = RsaPublicKey::new(from_u64(3233), from_u64(17)).unwrap();
        assert_eq!(key.to_string(), "PublicKey(n=0x0ca1, e=17)");
    }

    #[test]
    fn test_exponent_must_fit_modulus() {
        let mut rng = StdRng::seed_from_u64(16);
        for bits in [16u64, 17, 18] {
            assert!(matches!(
                new_keypair_with(&mut rng, bits, &KeyGenOptions::default()),
                Err(RsaError::InvalidArgument(_))
            ));
        }

        // Smallest sizes that still hold e = 65537, exact or not
        for exact in [true, false] {
            let options = KeyGenOptions::default().with_exact_size(exact);
            for _ in 0..10 {
                let (public_key, private_key) = new_keypair_with(&mut rng, 19, &options).unwrap();
                assert!(public_key.e < public_key.n);
                assert!(RsaPublicKey::new(public_key.n.clone(), public_key.e.clone()).is_ok());
                assert_eq!(private_key.public_key(), public_key);
            }
        }

        let options = KeyGenOptions::default().with_public_exponent(3);
        let (public_key, _) = new_keypair_with(&mut rng, MIN_KEY_BITS, &options).unwrap();
        assert_eq!(public_key.bit_length(), MIN_KEY_BITS);
    }

    #[test]
    fn test_from_components_rejects_bad_factors() {
        let cases = [
            // (n, e, d, p, q)
            (0u64, 3u64, 1u64, 0u64, 5u64),
            (0, 3, 1, 5, 0),
            (53, 3, 1, 1, 53),
            (3233, 17, 413, 53, 61 * 53),
            (3721, 17, 413, 61, 61),
            (3233, 17, 414, 61, 53),
            (3233, 3233, 413, 61, 53),
        ];
        for (n, e, d, p, q) in cases {
            let result = RsaPrivateKey::from_components(
                from_u64(n),
                from_u64(e),
                from_u64(d),
                from_u64(p),
                from_u64(q),
            );
            assert!(
                matches!(result, Err(RsaError::InvalidArgument(_))),
                "accepted n={} e={} d={} p={} q={}",
                n,
                e,
                d,
                p,
                q
            );
        }
    }

    #[test]
    fn test_new_checks_crt_values() {
        let mut rng = StdRng::seed_from_u64(41);
        let (_, key) = new_keypair_with(&mut rng, 256, &KeyGenOptions::default()).unwrap();
        let rebuild = |exp1: RsaBigInt, exp2: RsaBigInt, coef: RsaBigInt| {
            RsaPrivateKey::new(
                key.n.clone(),
                key.e.clone(),
                key.d.clone(),
                key.p.clone(),
                key.q.clone(),
                exp1,
                exp2,
                coef,
            )
        };

        assert_eq!(
            rebuild(key.exp1.clone(), key.exp2.clone(), key.coef.clone()).unwrap(),
            key
        );
        for result in [
            rebuild(&key.exp1 + 2u8, key.exp2.clone(), key.coef.clone()),
            rebuild(key.exp1.clone(), &key.exp2 + 2u8, key.coef.clone()),
            rebuild(key.exp1.clone(), key.exp2.clone(), &key.coef + 1u8),
        ] {
            assert!(matches!(result, Err(RsaError::InvalidArgument(_))));
        }

        let wrong_d = RsaPrivateKey::new(
            key.n.clone(),
            key.e.clone(),
            &key.d + 2u8,
            key.p.clone(),
            key.q.clone(),
            key.exp1.clone(),
            key.exp2.clone(),
            key.coef.clone(),
        );
        assert!(matches!(wrong_d, Err(RsaError::InvalidArgument(_))));
    }
}
