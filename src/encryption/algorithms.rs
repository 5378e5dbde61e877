//! Key derivation for the standard security handler.
//!
//! PDF Spec: Section 7.6.3 - Standard Security Handler (R2-R4)
//! Adobe Supplement to ISO 32000, Extension Level 3 - AES-256 (R5)

use super::aes;
use super::rc4::rc4_crypt;
use md5::{Digest, Md5};
use sha2::Sha256;

/// Padding string used in PDF encryption (32 bytes).
///
/// PDF Spec: Algorithm 2, step 1
const PADDING: &[u8; 32] = b"\x28\xBF\x4E\x5E\x4E\x75\x8A\x41\
                              \x64\x00\x4E\x56\xFF\xFA\x01\x08\
                              \x2E\x2E\x00\xB6\xD0\x68\x3E\x80\
                              \x2F\x0C\xA9\xFE\x64\x53\x69\x7A";

/// Pad or truncate a password to 32 bytes using the standard padding.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let pass_len = password.len().min(32);
    padded[..pass_len].copy_from_slice(&password[..pass_len]);
    padded[pass_len..].copy_from_slice(&PADDING[..(32 - pass_len)]);
    padded
}

/// Compute the file encryption key from the user password (Algorithm 2).
///
/// Only used for R2-R4; R5 keys are random.
pub fn compute_encryption_key(
    password: &[u8],
    owner_key: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let key_length = key_length.min(16);
    let mut hasher = Md5::new();
    hasher.update(pad_password(password));
    hasher.update(owner_key);
    hasher.update(permissions.to_le_bytes());
    hasher.update(file_id);
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash = hasher.finalize().to_vec();

    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_length]).to_vec();
        }
    }

    hash.truncate(key_length);
    hash
}

/// Compute the /O value for R2-R4 (Algorithm 3).
///
/// An empty owner password falls back to the user password.
pub fn compute_owner_password_hash(
    owner_password: &[u8],
    user_password: &[u8],
    revision: u32,
    key_length: usize,
) -> Vec<u8> {
    let password = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };

    let mut hash = Md5::digest(pad_password(password)).to_vec();
    let rc4_key_len = if revision >= 3 { key_length.min(16) } else { 5 };
    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..rc4_key_len]).to_vec();
        }
    }
    let rc4_key = &hash[..rc4_key_len];

    let mut result = rc4_crypt(rc4_key, &pad_password(user_password));
    if revision >= 3 {
        for i in 1..=19u8 {
            let round_key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
            result = rc4_crypt(&round_key, &result);
        }
    }
    result
}

/// Compute the /U value for R2-R4 (Algorithms 4 and 5).
pub fn compute_user_password_hash(encryption_key: &[u8], file_id: &[u8], revision: u32) -> Vec<u8> {
    if revision < 3 {
        return rc4_crypt(encryption_key, PADDING);
    }

    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let mut hash = hasher.finalize().to_vec();

    for i in 0..20u8 {
        let round_key: Vec<u8> = encryption_key.iter().map(|b| b ^ i).collect();
        hash = rc4_crypt(&round_key, &hash);
    }

    // 16 arbitrary bytes complete the 32-byte entry
    hash.extend_from_slice(&[0u8; 16]);
    hash
}

/// /U and /UE entries for the AES-256 (R5) handler.
pub struct UserEntries {
    /// 48-byte /U: hash, validation salt, key salt
    pub u: Vec<u8>,
    /// 32-byte /UE: the file key wrapped with the user key
    pub ue: Vec<u8>,
}

/// /O and /OE entries for the AES-256 (R5) handler.
pub struct OwnerEntries {
    /// 48-byte /O: hash, validation salt, key salt
    pub o: Vec<u8>,
    /// 32-byte /OE: the file key wrapped with the owner key
    pub oe: Vec<u8>,
}

/// Compute /U and /UE for R5.
pub fn compute_r5_user_entries(
    user_password: &[u8],
    file_key: &[u8],
) -> Result<UserEntries, &'static str> {
    let password = truncate_password_utf8(user_password);
    let validation_salt = generate_random_bytes(8);
    let key_salt = generate_random_bytes(8);

    let mut u = sha256(&[&password, &validation_salt]);
    u.extend_from_slice(&validation_salt);
    u.extend_from_slice(&key_salt);

    let intermediate = sha256(&[&password, &key_salt]);
    let ue = aes::cbc256_encrypt_unpadded(&intermediate, file_key)?;

    Ok(UserEntries { u, ue })
}

/// Compute /O and /OE for R5. Both hashes cover the full 48-byte /U.
pub fn compute_r5_owner_entries(
    owner_password: &[u8],
    u: &[u8],
    file_key: &[u8],
) -> Result<OwnerEntries, &'static str> {
    let password = truncate_password_utf8(owner_password);
    let validation_salt = generate_random_bytes(8);
    let key_salt = generate_random_bytes(8);

    let mut o = sha256(&[&password, &validation_salt, u]);
    o.extend_from_slice(&validation_salt);
    o.extend_from_slice(&key_salt);

    let intermediate = sha256(&[&password, &key_salt, u]);
    let oe = aes::cbc256_encrypt_unpadded(&intermediate, file_key)?;

    Ok(OwnerEntries { o, oe })
}

/// Compute the 16-byte /Perms entry for R5.
pub fn compute_perms(
    permissions: i32,
    encrypt_metadata: bool,
    file_key: &[u8],
) -> Result<Vec<u8>, &'static str> {
    let mut block = [0u8; 16];
    block[..4].copy_from_slice(&permissions.to_le_bytes());
    block[4..8].copy_from_slice(&[0xFF; 4]);
    block[8] = if encrypt_metadata { b'T' } else { b'F' };
    block[9..12].copy_from_slice(b"adb");
    block[12..].copy_from_slice(&generate_random_bytes(4));
    Ok(aes::ecb256_encrypt_block(file_key, &block)?.to_vec())
}

fn sha256(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// Generate random bytes using UUID v4 and timestamp mixing.
pub fn generate_random_bytes(len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(len);

    while result.len() < len {
        let mut hasher = Md5::new();
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        hasher.update(now.as_nanos().to_le_bytes());

        let hash = hasher.finalize();
        let remaining = len - result.len();
        result.extend_from_slice(&hash[..remaining.min(16)]);
    }

    result
}

/// Truncate password to 127 bytes on a UTF-8 boundary (R5 requirement).
fn truncate_password_utf8(password: &[u8]) -> Vec<u8> {
    let mut result = password.to_vec();
    if result.len() > 127 {
        let mut end = 127;
        while end > 0 && (result[end] & 0xC0) == 0x80 {
            end -= 1;
        }
        result.truncate(end);
    }
    result
}
