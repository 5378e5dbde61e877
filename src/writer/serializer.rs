//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to
//! PDF specification ISO 32000-1:2008, Section 7.3.

use crate::encryption::ObjectEncryptor;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};

/// Encryption context for the strings of one indirect object.
#[derive(Clone, Copy)]
pub struct StringCrypt<'a> {
    /// Cipher applied to string values
    pub encryptor: &'a dyn ObjectEncryptor,
    /// Object whose key is used
    pub object: ObjectRef,
}

/// Serializer for PDF objects.
///
/// Dictionaries are written one entry per line in insertion order:
///
/// ```text
/// <<
/// /Type /Page
/// /Parent 2 0 R
/// >>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// Create a new object serializer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        // Without a cipher no step can fail
        let _ = self.write_object(&mut buf, obj, None);
        buf
    }

    /// Serialize an object to a string (for debugging and tests).
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        String::from_utf8_lossy(&self.serialize(obj)).to_string()
    }

    /// Serialize a complete indirect object block.
    ///
    /// Format: `{id} {gen} obj\n{dict}\n[stream\n{data}\nendstream\n]endobj\n`.
    /// `stream` must already have passed through the content pipeline; when
    /// `crypt` is set, string values of the dictionary are encrypted here.
    pub fn serialize_indirect(
        &self,
        object: ObjectRef,
        dict: &Dictionary,
        stream: Option<&[u8]>,
        crypt: Option<StringCrypt<'_>>,
    ) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(64 + stream.map_or(0, <[u8]>::len));
        buf.extend_from_slice(format!("{} {} obj\n", object.id, object.gen).as_bytes());
        self.write_dictionary(&mut buf, dict, crypt)?;
        buf.push(b'\n');
        if let Some(data) = stream {
            buf.extend_from_slice(b"stream\n");
            buf.extend_from_slice(data);
            buf.extend_from_slice(b"\nendstream\n");
        }
        buf.extend_from_slice(b"endobj\n");
        Ok(buf)
    }

    /// Write an object to a buffer.
    pub fn write_object(
        &self,
        out: &mut Vec<u8>,
        obj: &Object,
        crypt: Option<StringCrypt<'_>>,
    ) -> Result<()> {
        match obj {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(b) => out.extend_from_slice(if *b { &b"true"[..] } else { &b"false"[..] }),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => write_real(out, *r),
            Object::String(s) => match crypt {
                Some(c) => {
                    let encrypted = c
                        .encryptor
                        .encrypt_string(s, c.object.id, c.object.gen)
                        .map_err(|e| Error::PipelineFailure {
                            object: c.object,
                            reason: e.to_string(),
                        })?;
                    write_string(out, &encrypted);
                },
                None => write_string(out, s),
            },
            Object::Name(n) => write_name(out, n),
            Object::Array(arr) => {
                out.push(b'[');
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    self.write_object(out, item, crypt)?;
                }
                out.push(b']');
            },
            Object::Dictionary(dict) => self.write_dictionary(out, dict, crypt)?,
            Object::Reference(r) => out.extend_from_slice(r.to_string().as_bytes()),
        }
        Ok(())
    }

    /// Write a PDF dictionary.
    fn write_dictionary(
        &self,
        out: &mut Vec<u8>,
        dict: &Dictionary,
        crypt: Option<StringCrypt<'_>>,
    ) -> Result<()> {
        out.extend_from_slice(b"<<");
        for (key, value) in dict {
            out.push(b'\n');
            write_name(out, key);
            out.push(b' ');
            self.write_object(out, value, crypt)?;
        }
        out.extend_from_slice(b"\n>>");
        Ok(())
    }
}

/// Write a real number with at most 5 decimals and no trailing zeros.
fn write_real(out: &mut Vec<u8>, value: f64) {
    if !value.is_finite() {
        out.push(b'0');
        return;
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        out.extend_from_slice((value as i64).to_string().as_bytes());
        return;
    }
    let formatted = format!("{:.5}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        out.push(b'0');
    } else {
        out.extend_from_slice(trimmed.as_bytes());
    }
}

/// Write a PDF string.
///
/// Uses literal string syntax `(...)` with proper escaping,
/// or hex string syntax `<...>` for binary data.
fn write_string(out: &mut Vec<u8>, data: &[u8]) {
    let is_printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if is_printable {
        out.push(b'(');
        for &byte in data {
            match byte {
                b'(' => out.extend_from_slice(b"\\("),
                b')' => out.extend_from_slice(b"\\)"),
                b'\\' => out.extend_from_slice(b"\\\\"),
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                b'\t' => out.extend_from_slice(b"\\t"),
                _ => out.push(byte),
            }
        }
        out.push(b')');
    } else {
        out.push(b'<');
        for byte in data {
            out.extend_from_slice(format!("{:02X}", byte).as_bytes());
        }
        out.push(b'>');
    }
}

/// Write a PDF name.
///
/// Names start with `/` and escape delimiters, whitespace and
/// non-ASCII bytes as `#xx`.
fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for byte in name.bytes() {
        match byte {
            b'!'
            | b'"'
            | b'$'
            | b'&'
            | b'\''
            | b'*'..=b'.'
            | b'0'..=b'9'
            | b';'
            | b'='
            | b'?'
            | b'@'
            | b'A'..=b'Z'
            | b'^'..=b'z'
            | b'|'
            | b'~' => out.push(byte),
            _ => out.extend_from_slice(format!("#{:02X}", byte).as_bytes()),
        }
    }
}
