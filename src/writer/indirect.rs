//! Indirect objects and their lifecycle.

use super::pipeline::PipelineConfig;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use bytes::Bytes;
use futures::channel::oneshot;

/// Lifecycle of an indirect object.
///
/// `Open` accepts writes and attribute changes. `Finalizing` means the
/// content pipeline was requested and the serialized block waits for its
/// turn. `Flushed` is terminal: the block is in the sink at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    /// Accepting writes
    Open,
    /// Pipeline requested, not yet written
    Finalizing,
    /// Written to the sink
    Flushed,
}

impl ObjectState {
    /// Lower-case name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectState::Open => "open",
            ObjectState::Finalizing => "finalizing",
            ObjectState::Flushed => "flushed",
        }
    }
}

/// One node of the object graph, owned by the writer's object table.
pub(crate) struct IndirectObject {
    pub(crate) reference: ObjectRef,
    pub(crate) dict: Dictionary,
    /// Buffered stream chunks; `None` for objects without a stream body
    pub(crate) content: Option<Vec<Bytes>>,
    pub(crate) uncompressed_length: usize,
    pub(crate) pipeline: PipelineConfig,
    pub(crate) state: ObjectState,
    /// Written at document end instead of in id order
    pub(crate) reserved: bool,
    /// Pipeline failure; the object can never be flushed
    pub(crate) failure: Option<String>,
    pub(crate) waiters: Vec<oneshot::Sender<Result<()>>>,
}

impl IndirectObject {
    pub(crate) fn new(
        reference: ObjectRef,
        dict: Dictionary,
        with_stream: bool,
        mut pipeline: PipelineConfig,
        reserved: bool,
    ) -> Self {
        // An existing filter means the caller already encoded the data
        if dict.contains_key("Filter") {
            pipeline.compress = false;
        }
        Self {
            reference,
            dict,
            content: with_stream.then(Vec::new),
            uncompressed_length: 0,
            pipeline,
            state: ObjectState::Open,
            reserved,
            failure: None,
            waiters: Vec::new(),
        }
    }

    /// Fail with `InvalidState` unless the object is open.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state == ObjectState::Open {
            Ok(())
        } else {
            Err(Error::InvalidState {
                object: self.reference,
                state: self.state.as_str(),
            })
        }
    }

    /// Mutate the attributes of an open object.
    ///
    /// A filter set by the caller means the caller encodes the data, so
    /// compression is switched off for this object.
    pub(crate) fn update(&mut self, f: impl FnOnce(&mut Dictionary)) -> Result<()> {
        self.ensure_open()?;
        let before = self.dict.get("Filter").cloned();
        f(&mut self.dict);
        if self.pipeline.compress && self.dict.get("Filter") != before.as_ref() {
            self.pipeline.compress = false;
        }
        Ok(())
    }

    /// Pipeline to run at finalize time.
    pub(crate) fn stream_pipeline(&self) -> PipelineConfig {
        let mut pipeline = self.pipeline.clone();
        pipeline.compress &= !has_foreign_filter(&self.dict);
        pipeline
    }

    /// Append a chunk to the stream body.
    pub(crate) fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.uncompressed_length += chunk.len();

        let length = self
            .dict
            .entry("Length".to_string())
            .or_insert(Object::Integer(0));
        if let Object::Integer(n) = length {
            *n += chunk.len() as i64;
        }
        if self.pipeline.compress {
            self.mark_filter();
        }

        self.content
            .get_or_insert_with(Vec::new)
            .push(Bytes::copy_from_slice(chunk));
        Ok(())
    }

    /// Concatenate the buffered chunks, leaving the buffer empty.
    pub(crate) fn take_content(&mut self) -> Option<Vec<u8>> {
        let chunks = self.content.take()?;
        let mut data = Vec::with_capacity(self.uncompressed_length);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }
        Some(data)
    }

    pub(crate) fn mark_filter(&mut self) {
        self.dict
            .insert("Filter".to_string(), Object::name("FlateDecode"));
    }

    /// Release buffers once the block is in the sink.
    pub(crate) fn mark_flushed(&mut self) {
        self.state = ObjectState::Flushed;
        self.dict = Dictionary::new();
        self.content = None;
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }
    }
}

/// Whether `dict` carries a filter other than the FlateDecode compression adds.
fn has_foreign_filter(dict: &Dictionary) -> bool {
    dict.get("Filter")
        .is_some_and(|filter| *filter != Object::name("FlateDecode"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(compress: bool) -> IndirectObject {
        IndirectObject::new(
            ObjectRef::new(1, 0),
            Dictionary::new(),
            false,
            PipelineConfig::plain().with_compress(compress),
            false,
        )
    }

    #[test]
    fn test_write_updates_length_and_filter() {
        let mut obj = open(true);
        obj.write(b"abc").unwrap();
        obj.write(b"de").unwrap();
        assert_eq!(obj.uncompressed_length, 5);
        assert_eq!(obj.dict.get("Length"), Some(&Object::Integer(5)));
        assert_eq!(obj.dict.get("Filter"), Some(&Object::name("FlateDecode")));
        assert_eq!(obj.take_content().unwrap(), b"abcde");
    }

    #[test]
    fn test_existing_filter_disables_compression() {
        let mut dict = Dictionary::new();
        dict.insert("Filter".into(), Object::name("DCTDecode"));
        let obj = IndirectObject::new(
            ObjectRef::new(3, 0),
            dict,
            true,
            PipelineConfig::plain().with_compress(true),
            false,
        );
        assert!(!obj.pipeline.compress);
        assert_eq!(obj.content.as_ref().map(Vec::len), Some(0));
    }

    #[test]
    fn test_filter_set_after_allocation_disables_compression() {
        let mut obj = open(true);
        obj.write(b"abc").unwrap();
        obj.update(|dict| {
            dict.insert("Filter".into(), Object::name("DCTDecode"));
        })
        .unwrap();
        assert!(!obj.pipeline.compress);
        assert!(!obj.stream_pipeline().compress);
        assert_eq!(obj.dict.get("Filter"), Some(&Object::name("DCTDecode")));

        // Writes after the change keep the caller's filter
        obj.write(b"de").unwrap();
        assert_eq!(obj.dict.get("Filter"), Some(&Object::name("DCTDecode")));
    }

    #[test]
    fn test_unrelated_update_keeps_compression() {
        let mut obj = open(true);
        obj.write(b"abc").unwrap();
        obj.update(|dict| {
            dict.insert("Type".into(), Object::name("XObject"));
        })
        .unwrap();
        assert!(obj.stream_pipeline().compress);
    }

    #[test]
    fn test_write_rejected_unless_open() {
        let mut obj = open(false);
        obj.state = ObjectState::Finalizing;
        let err = obj.write(b"x").unwrap_err();
        assert!(matches!(err, Error::InvalidState { state: "finalizing", .. }));
    }

    #[test]
    fn test_no_content_without_writes() {
        let mut obj = open(false);
        assert!(obj.take_content().is_none());
        assert!(!obj.dict.contains_key("Length"));
    }
}
