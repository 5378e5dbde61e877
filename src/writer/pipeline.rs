//! Content pipeline: compress, then encrypt.
//!
//! A pure transform over a stream body. The configuration is captured per
//! object when it is allocated, so later changes to document-wide settings
//! never affect objects that already exist.

use crate::encryption::ObjectEncryptor;
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Per-object pipeline settings.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    /// Apply FlateDecode compression
    pub compress: bool,
    /// Cipher applied after compression
    pub encryptor: Option<Arc<dyn ObjectEncryptor>>,
}

impl PipelineConfig {
    /// A pass-through configuration.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Same configuration with compression switched on or off.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("compress", &self.compress)
            .field("encrypted", &self.encryptor.is_some())
            .finish()
    }
}

/// Compress data using Flate/Deflate compression.
///
/// Returns compressed bytes suitable for the FlateDecode filter.
pub fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Run `data` through the pipeline of `object`.
///
/// Failures of either stage are reported as [`Error::PipelineFailure`].
pub fn transform(data: Vec<u8>, object: ObjectRef, config: &PipelineConfig) -> Result<Vec<u8>> {
    let original = data.len();
    let data = if config.compress {
        compress_data(&data).map_err(|e| Error::PipelineFailure {
            object,
            reason: format!("deflate: {}", e),
        })?
    } else {
        data
    };

    let data = match &config.encryptor {
        Some(encryptor) => encryptor
            .encrypt_stream(&data, object.id, object.gen)
            .map_err(|e| Error::PipelineFailure {
                object,
                reason: e.to_string(),
            })?,
        None => data,
    };

    log::trace!("pipeline {}: {} -> {} bytes", object, original, data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::{Algorithm, EncryptionWriteHandler};
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    struct FailingEncryptor;

    impl ObjectEncryptor for FailingEncryptor {
        fn encrypt_stream(&self, _: &[u8], _: u32, _: u16) -> Result<Vec<u8>> {
            Err(Error::Encryption("cipher unavailable".into()))
        }

        fn encrypt_string(&self, _: &[u8], _: u32, _: u16) -> Result<Vec<u8>> {
            Err(Error::Encryption("cipher unavailable".into()))
        }
    }

    #[test]
    fn test_passthrough() {
        let out = transform(b"hello".to_vec(), ObjectRef::new(1, 0), &PipelineConfig::plain()).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_compress_roundtrip() {
        let data = b"BT /F1 12 Tf (repeat repeat repeat repeat) Tj ET".repeat(20);
        let config = PipelineConfig::plain().with_compress(true);
        let out = transform(data.clone(), ObjectRef::new(1, 0), &config).unwrap();
        assert!(out.len() < data.len());

        let mut decoded = Vec::new();
        ZlibDecoder::new(&out[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_encrypt_depends_on_object() {
        let handler = EncryptionWriteHandler::from_key(vec![9u8; 16], Algorithm::Rc4_128);
        let config = PipelineConfig {
            compress: false,
            encryptor: Some(Arc::new(handler)),
        };
        let a = transform(b"same".to_vec(), ObjectRef::new(4, 0), &config).unwrap();
        let b = transform(b"same".to_vec(), ObjectRef::new(5, 0), &config).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, b"same");
    }

    #[test]
    fn test_encryption_failure_is_pipeline_failure() {
        let config = PipelineConfig {
            compress: true,
            encryptor: Some(Arc::new(FailingEncryptor)),
        };
        let err = transform(b"x".to_vec(), ObjectRef::new(7, 0), &config).unwrap_err();
        match err {
            Error::PipelineFailure { object, reason } => {
                assert_eq!(object, ObjectRef::new(7, 0));
                assert!(reason.contains("cipher unavailable"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_hides_cipher() {
        let text = format!("{:?}", PipelineConfig::plain().with_compress(true));
        assert!(text.contains("compress: true"));
        assert!(text.contains("encrypted: false"));
    }
}
