//! PDF encryption support for writing.
//!
//! This module implements the standard security handler (ISO 32000-1:2008,
//! Section 7.6) on the write side:
//!
//! - RC4 encryption (40-bit and 128-bit) for PDF 1.3-1.5
//! - AES-128 (CBC, `/AESV2`) for PDF 1.6-1.7
//! - AES-256 (CBC, `/AESV3`, revision 5) for PDF 1.7 extension level 3
//!
//! The content pipeline only sees the [`ObjectEncryptor`] trait: given an
//! object's `(id, generation)` pair it encrypts stream bodies and strings.
//! [`EncryptDictBuilder`] produces the `/Encrypt` dictionary and the
//! matching [`EncryptionWriteHandler`].

use crate::config::PdfVersion;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};
use serde::{Deserialize, Serialize};

mod aes;
mod algorithms;
mod rc4;
mod write_handler;

pub use write_handler::EncryptionWriteHandler;

/// Per-object encryption used by the content pipeline.
///
/// Implementations must derive their key from `(obj_num, gen_num)` so that
/// identical plaintext in two objects yields different ciphertext.
pub trait ObjectEncryptor: Send + Sync {
    /// Encrypt a stream body.
    fn encrypt_stream(&self, data: &[u8], obj_num: u32, gen_num: u16) -> Result<Vec<u8>>;

    /// Encrypt a string value of the object's dictionary.
    fn encrypt_string(&self, data: &[u8], obj_num: u32, gen_num: u16) -> Result<Vec<u8>>;
}

/// Encryption algorithm used in the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// No encryption
    None,
    /// RC4 with 40-bit key (V=1, R=2)
    Rc4_40,
    /// RC4 with 128-bit key (V=2, R=3)
    Rc4_128,
    /// AES with 128-bit key in CBC mode (V=4, R=4)
    Aes128,
    /// AES with 256-bit key in CBC mode (V=5, R=5)
    Aes256,
}

impl Algorithm {
    /// Get the key length in bytes for this algorithm.
    pub fn key_length(&self) -> usize {
        match self {
            Algorithm::None => 0,
            Algorithm::Rc4_40 => 5,
            Algorithm::Rc4_128 => 16,
            Algorithm::Aes128 => 16,
            Algorithm::Aes256 => 32,
        }
    }

    /// Check if this is an AES algorithm.
    pub fn is_aes(&self) -> bool {
        matches!(self, Algorithm::Aes128 | Algorithm::Aes256)
    }

    /// The (V, R) version/revision pair of the encryption dictionary.
    pub fn version_revision(&self) -> (u32, u32) {
        match self {
            Algorithm::None => (0, 0),
            Algorithm::Rc4_40 => (1, 2),
            Algorithm::Rc4_128 => (2, 3),
            Algorithm::Aes128 => (4, 4),
            Algorithm::Aes256 => (5, 5),
        }
    }

    /// Strongest algorithm a reader of `version` is guaranteed to support.
    pub fn default_for(version: PdfVersion) -> Self {
        match version {
            PdfVersion::V1_3 => Algorithm::Rc4_40,
            PdfVersion::V1_4 | PdfVersion::V1_5 => Algorithm::Rc4_128,
            PdfVersion::V1_6 | PdfVersion::V1_7 => Algorithm::Aes128,
            PdfVersion::V1_7Ext3 => Algorithm::Aes256,
        }
    }
}

bitflags::bitflags! {
    /// User access permissions (P entry).
    ///
    /// PDF Spec: Table 22 - User access permissions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Permissions: u32 {
        /// Print the document (bit 3)
        const PRINT = 1 << 2;
        /// Modify the contents (bit 4)
        const MODIFY = 1 << 3;
        /// Copy or extract text and graphics (bit 5)
        const COPY = 1 << 4;
        /// Add or modify annotations (bit 6)
        const ANNOTATE = 1 << 5;
        /// Fill in form fields (bit 9)
        const FILL_FORMS = 1 << 8;
        /// Extract content for accessibility (bit 10)
        const ACCESSIBILITY = 1 << 9;
        /// Assemble the document (bit 11)
        const ASSEMBLE = 1 << 10;
        /// High-quality printing (bit 12)
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

impl Permissions {
    /// View-only access; accessibility extraction stays allowed.
    pub fn read_only() -> Self {
        Permissions::ACCESSIBILITY
    }

    /// Convert to the signed 32-bit P value.
    ///
    /// Reserved bits 7-8 and 13-32 are set, bits 1-2 are clear.
    pub fn to_p_value(self) -> i32 {
        (0xFFFF_F0C0u32 | self.bits()) as i32
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::all()
    }
}

/// Configuration for encrypting a generated document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Password required to open the document (may be empty).
    pub user_password: String,
    /// Password for full access. Empty falls back to the user password.
    pub owner_password: String,
    /// Algorithm; `None` picks [`Algorithm::default_for`] the document version.
    pub algorithm: Option<Algorithm>,
    /// Permissions granted with the user password.
    pub permissions: Permissions,
}

impl EncryptionConfig {
    /// Create a new encryption config with the given passwords.
    pub fn new(user_password: impl Into<String>, owner_password: impl Into<String>) -> Self {
        Self {
            user_password: user_password.into(),
            owner_password: owner_password.into(),
            ..Default::default()
        }
    }

    /// Set the encryption algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Set the permissions.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Computed `/Encrypt` dictionary.
#[derive(Debug, Clone)]
pub struct EncryptDict {
    /// Algorithm the entries were computed for
    pub algorithm: Algorithm,
    /// Owner password hash (O)
    pub owner_password: Vec<u8>,
    /// User password hash (U)
    pub user_password: Vec<u8>,
    /// Wrapped file key for the owner (OE, AES-256 only)
    pub owner_encryption: Option<Vec<u8>>,
    /// Wrapped file key for the user (UE, AES-256 only)
    pub user_encryption: Option<Vec<u8>>,
    /// Encrypted permissions (Perms, AES-256 only)
    pub perms: Option<Vec<u8>>,
    /// User permissions (P)
    pub permissions: i32,
    /// Whether metadata streams are encrypted
    pub encrypt_metadata: bool,
}

impl EncryptDict {
    /// Build the dictionary object for the `/Encrypt` trailer entry.
    pub fn to_object(&self) -> Object {
        Object::Dictionary(self.to_dict())
    }

    /// Entries of the encryption dictionary.
    pub fn to_dict(&self) -> Dictionary {
        let (v, r) = self.algorithm.version_revision();
        let mut dict = Dictionary::new();
        dict.insert("Filter".into(), Object::name("Standard"));
        dict.insert("V".into(), Object::from(v));
        dict.insert("R".into(), Object::from(r));
        dict.insert("Length".into(), Object::from(self.algorithm.key_length() * 8));

        if self.algorithm.is_aes() {
            let (cfm, length) = if self.algorithm == Algorithm::Aes256 {
                ("AESV3", 32)
            } else {
                ("AESV2", 16)
            };
            let std_cf = Object::dict(vec![
                ("AuthEvent", Object::name("DocOpen")),
                ("CFM", Object::name(cfm)),
                ("Length", Object::from(length)),
            ]);
            dict.insert("CF".into(), Object::dict(vec![("StdCF", std_cf)]));
            dict.insert("StmF".into(), Object::name("StdCF"));
            dict.insert("StrF".into(), Object::name("StdCF"));
        }

        dict.insert("O".into(), Object::bytes(self.owner_password.clone()));
        dict.insert("U".into(), Object::bytes(self.user_password.clone()));
        if let Some(oe) = &self.owner_encryption {
            dict.insert("OE".into(), Object::bytes(oe.clone()));
        }
        if let Some(ue) = &self.user_encryption {
            dict.insert("UE".into(), Object::bytes(ue.clone()));
        }
        if let Some(perms) = &self.perms {
            dict.insert("Perms".into(), Object::bytes(perms.clone()));
        }
        dict.insert("P".into(), Object::from(self.permissions));
        if !self.encrypt_metadata && r >= 4 {
            dict.insert("EncryptMetadata".into(), Object::Boolean(false));
        }
        dict
    }
}

/// Builder computing the `/Encrypt` entries and the file key.
pub struct EncryptDictBuilder {
    algorithm: Algorithm,
    user_password: Vec<u8>,
    owner_password: Vec<u8>,
    permissions: i32,
    encrypt_metadata: bool,
}

impl EncryptDictBuilder {
    /// Start building for `algorithm`.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            user_password: Vec::new(),
            owner_password: Vec::new(),
            permissions: Permissions::all().to_p_value(),
            encrypt_metadata: true,
        }
    }

    /// Build from a user-facing configuration.
    ///
    /// R2-R4 passwords must be representable in Latin-1; R5 uses UTF-8.
    pub fn from_config(config: &EncryptionConfig, version: PdfVersion) -> Result<Self> {
        let algorithm = config
            .algorithm
            .unwrap_or_else(|| Algorithm::default_for(version));
        if algorithm == Algorithm::None {
            return Err(Error::InvalidConfig("encryption algorithm must not be None".into()));
        }
        let encode = |password: &str| -> Result<Vec<u8>> {
            if algorithm == Algorithm::Aes256 {
                return Ok(password.as_bytes().to_vec());
            }
            password
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        Error::Encryption(format!("password character {c:?} is not Latin-1"))
                    })
                })
                .collect()
        };
        Ok(Self::new(algorithm)
            .user_password(encode(&config.user_password)?)
            .owner_password(encode(&config.owner_password)?)
            .permissions(config.permissions.to_p_value()))
    }

    /// Set the user password bytes.
    pub fn user_password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.user_password = password.into();
        self
    }

    /// Set the owner password bytes.
    pub fn owner_password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.owner_password = password.into();
        self
    }

    /// Set the raw P value.
    pub fn permissions(mut self, permissions: i32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Whether metadata streams should be encrypted.
    pub fn encrypt_metadata(mut self, encrypt: bool) -> Self {
        self.encrypt_metadata = encrypt;
        self
    }

    /// Compute the dictionary and the write handler for `file_id` (first /ID element).
    pub fn build(self, file_id: &[u8]) -> Result<(EncryptDict, EncryptionWriteHandler)> {
        let (_, revision) = self.algorithm.version_revision();
        let key_length = self.algorithm.key_length();
        let crypto_err = |e: &'static str| Error::Encryption(e.to_string());

        if self.algorithm == Algorithm::Aes256 {
            let file_key = algorithms::generate_random_bytes(32);
            let user = algorithms::compute_r5_user_entries(&self.user_password, &file_key)
                .map_err(crypto_err)?;
            let owner_password = if self.owner_password.is_empty() {
                &self.user_password
            } else {
                &self.owner_password
            };
            let owner = algorithms::compute_r5_owner_entries(owner_password, &user.u, &file_key)
                .map_err(crypto_err)?;
            let perms =
                algorithms::compute_perms(self.permissions, self.encrypt_metadata, &file_key)
                    .map_err(crypto_err)?;

            let dict = EncryptDict {
                algorithm: self.algorithm,
                owner_password: owner.o,
                user_password: user.u,
                owner_encryption: Some(owner.oe),
                user_encryption: Some(user.ue),
                perms: Some(perms),
                permissions: self.permissions,
                encrypt_metadata: self.encrypt_metadata,
            };
            return Ok((dict, EncryptionWriteHandler::from_key(file_key, self.algorithm)));
        }

        let o = algorithms::compute_owner_password_hash(
            &self.owner_password,
            &self.user_password,
            revision,
            key_length,
        );
        let key = algorithms::compute_encryption_key(
            &self.user_password,
            &o,
            self.permissions,
            file_id,
            revision,
            key_length,
            self.encrypt_metadata,
        );
        let u = algorithms::compute_user_password_hash(&key, file_id, revision);

        let dict = EncryptDict {
            algorithm: self.algorithm,
            owner_password: o,
            user_password: u,
            owner_encryption: None,
            user_encryption: None,
            perms: None,
            permissions: self.permissions,
            encrypt_metadata: self.encrypt_metadata,
        };
        Ok((dict, EncryptionWriteHandler::from_key(key, self.algorithm)))
    }
}

/// Generate the two 16-byte elements of the trailer `/ID` array.
///
/// Both elements are equal for a newly created file.
pub fn generate_file_id() -> (Vec<u8>, Vec<u8>) {
    let id = algorithms::generate_random_bytes(16);
    (id.clone(), id)
}
