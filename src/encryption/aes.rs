//! AES primitives for the PDF security handlers.
//!
//! Streams and strings use AES in CBC mode with PKCS#7 padding and a random
//! IV prepended to the ciphertext (PDF Spec: Section 7.6.2). The AES-256
//! handler additionally needs unpadded CBC with a zero IV for /OE and /UE,
//! and single-block ECB for /Perms.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes256};
use cbc::Encryptor;

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes256CbcEnc = Encryptor<Aes256>;

/// Encrypt `data` with AES-CBC and PKCS#7 padding.
///
/// The key length selects AES-128 (16 bytes) or AES-256 (32 bytes).
pub fn cbc_encrypt(key: &[u8], iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    // PKCS#7: always pad, a full block when already aligned
    let mut buf = data.to_vec();
    let padding_len = 16 - (data.len() % 16);
    buf.resize(data.len() + padding_len, padding_len as u8);
    let len = buf.len();

    match key.len() {
        16 => {
            let cipher = Aes128CbcEnc::new_from_slices(key, iv).map_err(|_| "Invalid AES-128 key")?;
            cipher
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(|_| "Encryption failed")?;
        },
        32 => {
            let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| "Invalid AES-256 key")?;
            cipher
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(|_| "Encryption failed")?;
        },
        _ => return Err("AES key must be 16 or 32 bytes"),
    }
    Ok(buf)
}

/// AES-256-CBC without padding and with a zero IV.
///
/// `data` must be a multiple of 16 bytes.
pub fn cbc256_encrypt_unpadded(key: &[u8], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    if data.len() % 16 != 0 {
        return Err("Unpadded AES input must be block aligned");
    }
    let cipher =
        Aes256CbcEnc::new_from_slices(key, &[0u8; 16]).map_err(|_| "Invalid AES-256 key")?;
    let mut buf = data.to_vec();
    let len = buf.len();
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| "Encryption failed")?;
    Ok(buf)
}

/// Encrypt a single block with AES-256 in ECB mode.
pub fn ecb256_encrypt_block(key: &[u8], block: &[u8; 16]) -> Result<[u8; 16], &'static str> {
    let cipher = Aes256::new_from_slice(key).map_err(|_| "Invalid AES-256 key")?;
    let mut out = aes::Block::clone_from_slice(block);
    cipher.encrypt_block(&mut out);
    let mut result = [0u8; 16];
    result.copy_from_slice(&out);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::block_padding::Pkcs7;
    use aes::cipher::{BlockDecryptMut, KeyIvInit};

    type Aes128CbcDec = cbc::Decryptor<Aes128>;

    #[test]
    fn test_cbc_encrypt_pads_to_block() {
        let out = cbc_encrypt(&[7u8; 16], &[1u8; 16], b"hello").unwrap();
        assert_eq!(out.len(), 16);

        let out = cbc_encrypt(&[7u8; 32], &[1u8; 16], &[0u8; 16]).unwrap();
        assert_eq!(out.len(), 32); // full padding block
    }

    #[test]
    fn test_cbc_roundtrip_aes128() {
        let key = [3u8; 16];
        let iv = [9u8; 16];
        let ciphertext = cbc_encrypt(&key, &iv, b"Hello, AES encrypted world!").unwrap();

        let mut buf = ciphertext.clone();
        let plaintext = Aes128CbcDec::new_from_slices(&key, &iv)
            .unwrap()
            .decrypt_padded_mut::<Pkcs7>(&mut buf)
            .unwrap();
        assert_eq!(plaintext, b"Hello, AES encrypted world!");
    }

    #[test]
    fn test_rejects_bad_key_length() {
        assert!(cbc_encrypt(&[0u8; 5], &[0u8; 16], b"x").is_err());
    }

    #[test]
    fn test_unpadded_requires_alignment() {
        assert!(cbc256_encrypt_unpadded(&[0u8; 32], &[0u8; 15]).is_err());
        assert_eq!(cbc256_encrypt_unpadded(&[0u8; 32], &[0u8; 32]).unwrap().len(), 32);
    }

    #[test]
    fn test_ecb_block_changes_input() {
        let block = [0u8; 16];
        let out = ecb256_encrypt_block(&[1u8; 32], &block).unwrap();
        assert_ne!(out, block);
    }
}
