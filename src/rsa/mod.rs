// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod bigint;
pub mod engine;
pub mod decrypt;
pub mod encrypt;
pub mod hash;
pub mod keygen;
pub mod padding;
pub mod prime;
pub mod sign;

pub use decrypt::{decrypt, decrypt_with_rng};
pub use encrypt::{encrypt, encrypt_with_rng};
pub use hash::{compute_hash, compute_hash_with, HashAlgorithm};
pub use keygen::{new_keypair, new_keypair_with, KeyGenOptions, RsaPrivateKey, RsaPublicKey};
pub use sign::{
    find_signature_hash, sign, sign_hash, sign_hash_with_rng, sign_with_rng, verify,
};

pub type PublicKey = RsaPublicKey;
pub type PrivateKey = RsaPrivateKey;
