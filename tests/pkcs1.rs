// Public API tests: key pairs, encryption and signatures end to end

use std::io::Cursor;
use std::thread;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rsa_lite::{
    compute_hash, decrypt, encrypt, new_keypair, new_keypair_with, sign, sign_hash, verify,
    HashAlgorithm, KeyGenOptions, PrivateKey, PublicKey, RsaError,
};

fn seeded_keys(seed: u64, bits: u64) -> Result<(PublicKey, PrivateKey)> {
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(new_keypair_with(&mut rng, bits, &KeyGenOptions::default())?)
}

#[test]
fn test_hello_with_256_bit_key() -> Result<()> {
    let (public_key, private_key) = seeded_keys(2024, 256)?;
    assert_eq!(public_key.bit_length(), 256);

    let ciphertext = encrypt(b"hello", &public_key)?;
    assert_eq!(ciphertext.len(), 32);
    assert_eq!(decrypt(&ciphertext, &private_key)?, b"hello");

    // Two encryptions of the same message differ but both decrypt
    let again = encrypt(b"hello", &public_key)?;
    assert_ne!(ciphertext, again);
    assert_eq!(decrypt(&again, &private_key)?, b"hello");
    Ok(())
}

#[test]
fn test_message_size_limit() -> Result<()> {
    let (public_key, private_key) = seeded_keys(7, 256)?;
    let largest = [0x42u8; 21];
    let ciphertext = encrypt(&largest, &public_key)?;
    assert_eq!(decrypt(&ciphertext, &private_key)?, largest);

    let err = encrypt(&[0x42u8; 22], &public_key).unwrap_err();
    assert!(matches!(err, RsaError::Overflow(_)));
    assert!(err.to_string().contains("only space for 21"));
    Ok(())
}

#[test]
fn test_keypair_1024() -> Result<()> {
    let (public_key, private_key) = new_keypair(1024)?;
    assert_eq!(public_key.bit_length(), 1024);
    assert_eq!(private_key.public_key(), public_key);
    assert_eq!(private_key.p() * private_key.q(), *public_key.n());
    assert_eq!(*public_key.e(), num_bigint::BigUint::from(65537u32));

    let message = vec![0xA5u8; 117];
    let ciphertext = public_key.encrypt(&message)?;
    assert_eq!(ciphertext.len(), 128);
    assert_eq!(private_key.decrypt(&ciphertext)?, message);
    Ok(())
}

#[test]
fn test_sign_and_verify() -> Result<()> {
    let (public_key, private_key) = seeded_keys(42, 512)?;
    let message = b"Sign me, please";

    let signature = sign(message, &private_key, HashAlgorithm::Sha256)?;
    assert_eq!(signature.len(), 64);
    assert_eq!(verify(message, &signature, &public_key)?, HashAlgorithm::Sha256);

    let digest = compute_hash(message, HashAlgorithm::Sha256)?;
    assert_eq!(sign_hash(&digest, &private_key, HashAlgorithm::Sha256)?, signature);

    let mut stream = Cursor::new(message.to_vec());
    assert_eq!(public_key.verify(&mut stream, &signature)?, HashAlgorithm::Sha256);

    assert!(matches!(
        verify(b"Sign me, please!", &signature, &public_key),
        Err(RsaError::Verification)
    ));
    Ok(())
}

#[test]
fn test_hash_names() -> Result<()> {
    let method: HashAlgorithm = "SHA-256".parse()?;
    assert_eq!(method, HashAlgorithm::Sha256);
    assert_eq!(HashAlgorithm::Sha1.to_string(), "SHA-1");

    let err = "SHA-3".parse::<HashAlgorithm>().unwrap_err();
    assert!(matches!(err, RsaError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "invalid argument: Invalid hash method: SHA-3");
    Ok(())
}

#[test]
fn test_wrong_key_fails_generically() -> Result<()> {
    let (public_key, _) = seeded_keys(1, 512)?;
    let (_, other_private) = seeded_keys(2, 512)?;

    let ciphertext = encrypt(b"for someone else", &public_key)?;
    match decrypt(&ciphertext, &other_private) {
        // A wrong key can still land on a block with a separator by chance
        Ok(plaintext) => assert_ne!(plaintext, b"for someone else"),
        Err(err) => assert!(matches!(err, RsaError::Decryption)),
    }
    Ok(())
}

#[test]
fn test_keys_shared_across_threads() -> Result<()> {
    let (public_key, private_key) = seeded_keys(99, 512)?;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let public_key = &public_key;
                let private_key = &private_key;
                scope.spawn(move || -> rsa_lite::Result<()> {
                    let message = vec![i; 16 + i as usize];
                    for _ in 0..5 {
                        let ciphertext = encrypt(&message, public_key)?;
                        assert_eq!(decrypt(&ciphertext, private_key)?, message);
                        let signature = sign(&message, private_key, HashAlgorithm::Sha1)?;
                        assert_eq!(verify(&message, &signature, public_key)?, HashAlgorithm::Sha1);
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker panicked")?;
        }
        Ok(())
    })
}
