// RSA Error Types
// Every failure surfaced by the crate

use num_bigint::BigUint;
use thiserror::Error;

/// Errors returned by key generation, padding and the RSA transforms
#[derive(Debug, Error)]
pub enum RsaError {
    /// A modular inverse was requested for operands sharing a divisor.
    /// The operands stay out of the message so key material never reaches a log line.
    #[error("operands are not relatively prime (common divisor of {} bits)", .d.bits())]
    NotRelativePrime { a: BigUint, b: BigUint, d: BigUint },

    /// Message, padding or integer does not fit the fixed block length
    #[error("overflow: {0}")]
    Overflow(String),

    /// Deliberately carries no detail: wrong key, corrupted ciphertext and
    /// malformed padding must be indistinguishable
    #[error("Decryption failed")]
    Decryption,

    /// Same collapsing of detail as `Decryption`
    #[error("Verification failed")]
    Verification,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A probabilistic loop ran past its iteration cap
    #[error("internal failure: {0}")]
    Internal(&'static str),

    #[error("failed to read message: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for RSA operations
pub type Result<T> = std::result::Result<T, RsaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_relative_prime_hides_operands() {
        let err = RsaError::NotRelativePrime {
            a: BigUint::from(123456789u64),
            b: BigUint::from(987654321u64),
            d: BigUint::from(9u8),
        };
        let text = err.to_string();
        assert!(!text.contains("123456789"));
        assert!(!text.contains("987654321"));
        assert!(text.contains("4 bits"));
    }

    #[test]
    fn test_failures_have_no_detail() {
        assert_eq!(RsaError::Decryption.to_string(), "Decryption failed");
        assert_eq!(RsaError::Verification.to_string(), "Verification failed");
    }
}
