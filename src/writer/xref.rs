//! Cross-reference section and trailer.
//!
//! PDF Spec: Section 7.5.4 (cross-reference table), 7.5.5 (trailer) and
//! 7.5.8 (cross-reference streams).

use super::pipeline::compress_data;
use super::serializer::ObjectSerializer;
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use byteorder::{BigEndian, WriteBytesExt};

/// Pointers written into the trailer.
#[derive(Debug, Clone)]
pub struct TrailerInfo {
    /// Document catalog
    pub root: ObjectRef,
    /// Document information dictionary
    pub info: Option<ObjectRef>,
    /// Encryption dictionary
    pub encrypt: Option<ObjectRef>,
    /// File identifier pair
    pub id: Option<(Vec<u8>, Vec<u8>)>,
}

impl TrailerInfo {
    /// Trailer pointing at `root` only.
    pub fn new(root: ObjectRef) -> Self {
        Self {
            root,
            info: None,
            encrypt: None,
            id: None,
        }
    }

    /// Trailer keys shared by both xref flavours.
    fn entries(&self, size: usize) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Size".into(), Object::from(size));
        dict.insert("Root".into(), Object::Reference(self.root));
        if let Some(info) = self.info {
            dict.insert("Info".into(), Object::Reference(info));
        }
        if let Some(encrypt) = self.encrypt {
            dict.insert("Encrypt".into(), Object::Reference(encrypt));
        }
        if let Some((first, second)) = &self.id {
            dict.insert(
                "ID".into(),
                Object::Array(vec![Object::bytes(first.clone()), Object::bytes(second.clone())]),
            );
        }
        dict
    }
}

/// Classic cross-reference table plus trailer.
///
/// `offsets[i]` is the offset of object `i + 1`; `start` is the byte
/// offset at which the `xref` keyword is written.
pub fn classic_section(offsets: &[u64], trailer: &TrailerInfo, start: u64) -> Vec<u8> {
    let size = offsets.len() + 1;
    let mut out = Vec::with_capacity(32 + size * 20);
    out.extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
    // Object 0 is always free
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }

    out.extend_from_slice(b"trailer\n");
    out.extend_from_slice(&ObjectSerializer::new().serialize(&Object::Dictionary(trailer.entries(size))));
    out.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", start).as_bytes());
    out
}

/// Minimal number of bytes needed to store `value`.
fn byte_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Binary body of a cross-reference stream with `/W [1 width 2]`.
fn stream_rows(offsets: &[u64], width: usize) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity((offsets.len() + 1) * (3 + width));
    body.write_u8(0)?;
    body.write_uint::<BigEndian>(0, width)?;
    body.write_u16::<BigEndian>(0xFFFF)?;
    for &offset in offsets {
        body.write_u8(1)?;
        body.write_uint::<BigEndian>(offset, width)?;
        body.write_u16::<BigEndian>(0)?;
    }
    Ok(body)
}

/// Cross-reference stream object plus `startxref`.
///
/// The stream becomes object `offsets.len() + 1`, written at `start`; its
/// own entry is part of the index. The body is compressed when `compress`
/// is set and never encrypted.
pub fn stream_section(
    offsets: &[u64],
    trailer: &TrailerInfo,
    start: u64,
    compress: bool,
) -> Result<Vec<u8>> {
    let mut all = offsets.to_vec();
    all.push(start);
    let size = all.len() + 1;
    let id = all.len() as u32;

    let width = byte_width(all.iter().copied().max().unwrap_or(0));
    let mut body = stream_rows(&all, width)?;

    let mut dict = Dictionary::new();
    dict.insert("Type".into(), Object::name("XRef"));
    dict.extend(trailer.entries(size));
    dict.insert(
        "W".into(),
        Object::Array(vec![Object::from(1), Object::from(width), Object::from(2)]),
    );
    dict.insert("Index".into(), Object::Array(vec![Object::from(0), Object::from(size)]));
    if compress {
        body = compress_data(&body)?;
        dict.insert("Filter".into(), Object::name("FlateDecode"));
    }
    dict.insert("Length".into(), Object::from(body.len()));

    let mut out =
        ObjectSerializer::new().serialize_indirect(ObjectRef::new(id, 0), &dict, Some(&body), None)?;
    out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", start).as_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_table_layout() {
        let trailer = TrailerInfo::new(ObjectRef::new(1, 0));
        let out = classic_section(&[15, 64], &trailer, 120);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(
            "xref\n0 3\n0000000000 65535 f \n0000000015 00000 n \n0000000064 00000 n \ntrailer\n"
        ));
        assert!(text.contains("/Size 3"));
        assert!(text.contains("/Root 1 0 R"));
        assert!(text.ends_with("startxref\n120\n%%EOF\n"));
    }

    #[test]
    fn test_trailer_optional_entries() {
        let trailer = TrailerInfo {
            root: ObjectRef::new(1, 0),
            info: Some(ObjectRef::new(4, 0)),
            encrypt: Some(ObjectRef::new(5, 0)),
            id: Some((vec![0xAB; 16], vec![0xAB; 16])),
        };
        let text = String::from_utf8(classic_section(&[15], &trailer, 99)).unwrap();
        assert!(text.contains("/Info 4 0 R"));
        assert!(text.contains("/Encrypt 5 0 R"));
        assert!(text.contains(&format!("/ID [<{0}> <{0}>]", "AB".repeat(16))));
    }

    #[test]
    fn test_byte_width() {
        assert_eq!(byte_width(0), 1);
        assert_eq!(byte_width(255), 1);
        assert_eq!(byte_width(256), 2);
        assert_eq!(byte_width(70_000), 3);
    }

    #[test]
    fn test_stream_rows() {
        let body = stream_rows(&[15, 300], 2).unwrap();
        assert_eq!(
            body,
            vec![0, 0, 0, 0xFF, 0xFF, 1, 0, 15, 0, 0, 1, 0x01, 0x2C, 0, 0]
        );
    }

    #[test]
    fn test_uncompressed_stream_section() {
        let trailer = TrailerInfo::new(ObjectRef::new(1, 0));
        let out = stream_section(&[15, 80], &trailer, 200, false).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("3 0 obj\n"));
        assert!(text.contains("/Type /XRef"));
        assert!(text.contains("/Size 4"));
        assert!(text.contains("/W [1 1 2]"));
        assert!(text.contains("/Index [0 4]"));
        assert!(text.contains("/Length 16"));
        assert!(!text.contains("/Filter"));
        assert!(text.ends_with("startxref\n200\n%%EOF\n"));
    }
}
