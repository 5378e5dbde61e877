//! Encryption handler for writing encrypted PDFs.
//!
//! This module provides the EncryptionWriteHandler which encrypts PDF objects
//! (strings and streams) as they pass through the content pipeline.

use super::aes;
use super::rc4;
use super::{Algorithm, ObjectEncryptor};
use crate::error::{Error, Result};
use md5::{Digest, Md5};

/// Handler for encrypting PDF objects during write operations.
#[derive(Debug, Clone)]
pub struct EncryptionWriteHandler {
    /// The file encryption key
    encryption_key: Vec<u8>,
    /// The encryption algorithm in use
    algorithm: Algorithm,
}

impl EncryptionWriteHandler {
    /// Create a handler from an already computed file encryption key.
    pub fn from_key(encryption_key: Vec<u8>, algorithm: Algorithm) -> Self {
        Self {
            encryption_key,
            algorithm,
        }
    }

    /// Derive the object-specific encryption key.
    ///
    /// PDF Spec: Algorithm 1 - Encryption key derivation for individual objects.
    /// AES-256 uses the file key directly.
    fn derive_object_key(&self, obj_num: u32, gen_num: u16) -> Vec<u8> {
        if self.algorithm == Algorithm::Aes256 {
            return self.encryption_key.clone();
        }

        let mut hasher = Md5::new();
        hasher.update(&self.encryption_key);
        // Object number: 3 low-order bytes, little-endian
        hasher.update(&obj_num.to_le_bytes()[..3]);
        hasher.update(gen_num.to_le_bytes());
        if self.algorithm.is_aes() {
            hasher.update(b"sAlT");
        }
        let hash = hasher.finalize();

        let key_length = (self.encryption_key.len() + 5).min(16);
        hash[..key_length].to_vec()
    }

    /// Encrypt data using the specified object key.
    fn encrypt_with_key(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        match self.algorithm {
            Algorithm::None => Ok(data.to_vec()),
            Algorithm::Rc4_40 | Algorithm::Rc4_128 => Ok(rc4::rc4_crypt(key, data)),
            Algorithm::Aes128 | Algorithm::Aes256 => {
                let iv = Self::generate_iv();
                let ciphertext =
                    aes::cbc_encrypt(key, &iv, data).map_err(|e| Error::Encryption(e.to_string()))?;
                let mut result = Vec::with_capacity(16 + ciphertext.len());
                result.extend_from_slice(&iv);
                result.extend(ciphertext);
                Ok(result)
            },
        }
    }

    /// Generate a random 16-byte IV for AES encryption.
    fn generate_iv() -> [u8; 16] {
        let bytes = super::algorithms::generate_random_bytes(16);
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&bytes);
        iv
    }

    /// Get the encryption algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[cfg(test)]
    pub(crate) fn object_key(&self, obj_num: u32, gen_num: u16) -> Vec<u8> {
        self.derive_object_key(obj_num, gen_num)
    }
}

impl ObjectEncryptor for EncryptionWriteHandler {
    fn encrypt_stream(&self, data: &[u8], obj_num: u32, gen_num: u16) -> Result<Vec<u8>> {
        let key = self.derive_object_key(obj_num, gen_num);
        self.encrypt_with_key(&key, data)
    }

    fn encrypt_string(&self, data: &[u8], obj_num: u32, gen_num: u16) -> Result<Vec<u8>> {
        let key = self.derive_object_key(obj_num, gen_num);
        self.encrypt_with_key(&key, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::aes::cipher::block_padding::Pkcs7;
    use ::aes::cipher::{BlockDecryptMut, KeyIvInit};

    #[test]
    fn test_object_key_derivation_rc4() {
        let handler = EncryptionWriteHandler::from_key(vec![1, 2, 3, 4, 5], Algorithm::Rc4_40);

        let key1 = handler.object_key(1, 0);
        let key2 = handler.object_key(2, 0);
        let key3 = handler.object_key(1, 1);

        assert_ne!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.len(), 10);
    }

    #[test]
    fn test_object_key_derivation_aes256_uses_file_key() {
        let key = vec![0u8; 32];
        let handler = EncryptionWriteHandler::from_key(key.clone(), Algorithm::Aes256);
        assert_eq!(handler.object_key(1, 0), key);
    }

    #[test]
    fn test_same_plaintext_differs_per_object() {
        let handler = EncryptionWriteHandler::from_key(vec![7u8; 16], Algorithm::Rc4_128);
        let a = handler.encrypt_stream(b"identical", 4, 0).unwrap();
        let b = handler.encrypt_stream(b"identical", 5, 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rc4_roundtrip() {
        let handler = EncryptionWriteHandler::from_key(vec![1, 2, 3, 4, 5], Algorithm::Rc4_40);
        let ciphertext = handler.encrypt_string(b"Hello, encrypted world!", 1, 0).unwrap();
        let decrypted = rc4::rc4_crypt(&handler.object_key(1, 0), &ciphertext);
        assert_eq!(decrypted, b"Hello, encrypted world!");
    }

    #[test]
    fn test_aes128_prepends_iv() {
        let handler = EncryptionWriteHandler::from_key(vec![0u8; 16], Algorithm::Aes128);
        let ciphertext = handler.encrypt_stream(b"Hello, AES encrypted world!", 1, 0).unwrap();
        assert_eq!(ciphertext.len(), 16 + 32);

        let (iv, body) = ciphertext.split_at(16);
        let mut buf = body.to_vec();
        let plaintext = cbc::Decryptor::<::aes::Aes128>::new_from_slices(&handler.object_key(1, 0), iv)
            .unwrap()
            .decrypt_padded_mut::<Pkcs7>(&mut buf)
            .unwrap();
        assert_eq!(plaintext, b"Hello, AES encrypted world!");
    }
}
