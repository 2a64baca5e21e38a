// PKCS#1 v1.5 Padding
// Implements RSA PKCS#1 v1.5 padding for encryption and signatures

use rand::{CryptoRng, RngCore};

use crate::error::{Result, RsaError};

/// Fixed overhead of a PKCS#1 v1.5 block:
/// 0x00 || type (1 byte) || at least 8 padding bytes || 0x00
pub const PKCS1_OVERHEAD: usize = 11;

/// Upper bound on refills of the random padding string. Each round keeps
/// every nonzero byte drawn, so running out needs a broken RNG.
pub const MAX_PADDING_ROUNDS: u32 = 1_000;

fn check_length(message: &[u8], target_len: usize) -> Result<()> {
    let max_len = target_len.saturating_sub(PKCS1_OVERHEAD);
    if target_len < PKCS1_OVERHEAD || message.len() > max_len {
        return Err(RsaError::Overflow(format!(
            "{} bytes needed for message, but there is only space for {}",
            message.len(),
            max_len
        )));
    }
    Ok(())
}

/// Fill `padding` with random nonzero bytes
fn fill_nonzero<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, padding: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    // Draw a few extra bytes per round so a handful of zeros rarely costs another round
    let mut scratch = vec![0u8; padding.len() + 5];

    for _ in 0..MAX_PADDING_ROUNDS {
        if filled == padding.len() {
            return Ok(());
        }
        let needed = padding.len() - filled;
        let chunk = &mut scratch[..needed + 5];
        rng.fill_bytes(chunk);

        for &byte in chunk.iter().filter(|&&b| b != 0).take(needed) {
            padding[filled] = byte;
            filled += 1;
        }
    }

    if filled == padding.len() {
        Ok(())
    } else {
        Err(RsaError::Internal("random padding could not be filled with nonzero bytes"))
    }
}

/// PKCS#1 v1.5 Padding for encryption
/// Format: 0x00 || 0x02 || PS || 0x00 || message
/// PS = random non-zero bytes filling the block to `target_len`
pub fn pad_for_encryption<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    message: &[u8],
    target_len: usize,
) -> Result<Vec<u8>> {
    check_length(message, target_len)?;

    let ps_len = target_len - message.len() - 3;

    let mut block = vec![0u8; target_len];
    block[1] = 0x02;
    fill_nonzero(rng, &mut block[2..2 + ps_len])?;
    // block[2 + ps_len] stays 0x00 as the separator
    block[3 + ps_len..].copy_from_slice(message);

    Ok(block)
}

/// PKCS#1 v1.5 Signature padding
/// Format: 0x00 || 0x01 || PS (0xFF) || 0x00 || message
pub fn pad_for_signing(message: &[u8], target_len: usize) -> Result<Vec<u8>> {
    check_length(message, target_len)?;

    let ps_len = target_len - message.len() - 3;

    let mut block = Vec::with_capacity(target_len);
    block.push(0x00);
    block.push(0x01);
    block.extend(std::iter::repeat(0xFF).take(ps_len));
    block.push(0x00);
    block.extend_from_slice(message);

    Ok(block)
}

/// Remove PKCS#1 v1.5 encryption padding.
///
/// The message is everything after the first 0x00 at or after index 2.
/// Every failure is the same `Decryption` error.
pub fn unpad_decryption(block: &[u8]) -> Result<Vec<u8>> {
    let separator = block
        .iter()
        .skip(2)
        .position(|&b| b == 0x00)
        .ok_or(RsaError::Decryption)?;

    Ok(block[separator + 3..].to_vec())
}
