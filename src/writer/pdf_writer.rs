//! Incremental PDF object writer.
//!
//! Objects are allocated with increasing ids, filled, and finalized. A
//! finalized object runs its content pipeline and is serialized right away,
//! but the bytes only reach the sink once every lower-id ordinary object is
//! in the sink as well. Blocks waiting for their turn sit in an admission
//! queue keyed by id; a cursor names the next id to flush.
//!
//! ```text
//! allocate ──> OPEN ──finalize──> FINALIZING ──turn──> FLUSHED
//!                │                    │
//!              write            pipeline, serialize,
//!                               queue by id
//! ```
//!
//! Reserved objects (catalog, page tree, structure tree root) are skipped by
//! the cursor and written by [`PdfWriter::end`], after all ordinary objects.

use super::indirect::{IndirectObject, ObjectState};
use super::pipeline::{self, PipelineConfig};
use super::serializer::{ObjectSerializer, StringCrypt};
use super::xref::{self, TrailerInfo};
use crate::config::PdfVersion;
use crate::encryption::ObjectEncryptor;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use futures::channel::oneshot;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

/// Settings of the core writer.
#[derive(Clone, Default)]
pub struct WriterSettings {
    /// Header version; selects the cross-reference flavour
    pub version: PdfVersion,
    /// Compress stream bodies of newly allocated objects
    pub compress: bool,
    /// Cipher for streams and strings of newly allocated objects
    pub encryptor: Option<Arc<dyn ObjectEncryptor>>,
}

impl WriterSettings {
    /// Settings for `version`, uncompressed and unencrypted.
    pub fn new(version: PdfVersion) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Encrypt objects with `encryptor`.
    pub fn with_encryptor(mut self, encryptor: Arc<dyn ObjectEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }
}

impl fmt::Debug for WriterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSettings")
            .field("version", &self.version)
            .field("compress", &self.compress)
            .field("encrypted", &self.encryptor.is_some())
            .finish()
    }
}

/// Completion of a [`PdfWriter::finalize`] call.
///
/// Resolves once the object is in the sink. The flush itself does not
/// depend on the future being polled; dropping it only discards the
/// notification.
#[must_use = "the future reports sink and pipeline errors"]
pub struct FlushFuture {
    inner: FlushInner,
}

enum FlushInner {
    Done(Option<Result<()>>),
    Pending(oneshot::Receiver<Result<()>>),
}

impl FlushFuture {
    fn done() -> Self {
        Self {
            inner: FlushInner::Done(Some(Ok(()))),
        }
    }

    /// Whether the object was already flushed when the future was created.
    pub fn is_flushed(&self) -> bool {
        matches!(self.inner, FlushInner::Done(_))
    }
}

impl Future for FlushFuture {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            FlushInner::Done(result) => Poll::Ready(result.take().unwrap_or(Ok(()))),
            FlushInner::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(_)) => {
                    Poll::Ready(Err(Error::WriterFailed("writer dropped before flush".into())))
                },
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

struct WriterState<W> {
    sink: Option<W>,
    settings: WriterSettings,
    /// Object table; object `id` lives at index `id - 1`
    objects: Vec<IndirectObject>,
    /// Offset of each object, indexed like `objects`
    offsets: Vec<Option<u64>>,
    /// Bytes written so far
    offset: u64,
    /// Serialized ordinary objects waiting for their turn
    ready: BTreeMap<u32, Vec<u8>>,
    /// Serialized reserved objects, written at end
    deferred: BTreeMap<u32, Vec<u8>>,
    /// Lowest id whose turn has not come yet
    next_flush: u32,
    sealed: bool,
    failed: Option<String>,
}

impl<W: Write> WriterState<W> {
    fn check_usable(&self) -> Result<()> {
        if let Some(reason) = &self.failed {
            return Err(Error::WriterFailed(reason.clone()));
        }
        if self.sealed {
            return Err(Error::DocumentSealed);
        }
        Ok(())
    }

    fn object_mut(&mut self, r: ObjectRef) -> Result<&mut IndirectObject> {
        let index = (r.id as usize).checked_sub(1).ok_or(Error::UnknownObject(r))?;
        match self.objects.get_mut(index) {
            Some(obj) if obj.reference.gen == r.gen => Ok(obj),
            _ => Err(Error::UnknownObject(r)),
        }
    }

    fn allocate(
        &mut self,
        dict: Dictionary,
        with_stream: bool,
        pipeline: PipelineConfig,
        reserved: bool,
    ) -> Result<ObjectRef> {
        self.check_usable()?;
        let reference = ObjectRef::new(self.objects.len() as u32 + 1, 0);
        self.objects
            .push(IndirectObject::new(reference, dict, with_stream, pipeline, reserved));
        self.offsets.push(None);
        Ok(reference)
    }

    /// Write `bytes` to the sink at the current offset.
    fn emit(&mut self, id: u32, bytes: &[u8]) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::DocumentSealed)?;
        if let Err(e) = sink.write_all(bytes) {
            self.fail(e.to_string());
            return Err(Error::Io(e));
        }
        self.offsets[id as usize - 1] = Some(self.offset);
        log::trace!("flushed object {} at offset {} ({} bytes)", id, self.offset, bytes.len());
        self.offset += bytes.len() as u64;
        if let Some(obj) = self.objects.get_mut(id as usize - 1) {
            obj.mark_flushed();
        }
        Ok(())
    }

    /// Flush the queued prefix of ordinary objects.
    fn drain(&mut self) -> Result<()> {
        while let Some(obj) = self.objects.get(self.next_flush as usize - 1) {
            let id = self.next_flush;
            if obj.reserved {
                self.next_flush += 1;
                continue;
            }
            let Some(bytes) = self.ready.remove(&id) else {
                break;
            };
            self.emit(id, &bytes)?;
            self.next_flush += 1;
        }
        Ok(())
    }

    /// Poison the writer and wake every waiter with the reason.
    fn fail(&mut self, reason: String) {
        log::debug!("writer failed: {}", reason);
        for obj in &mut self.objects {
            for waiter in obj.waiters.drain(..) {
                let _ = waiter.send(Err(Error::WriterFailed(reason.clone())));
            }
        }
        self.ready.clear();
        self.deferred.clear();
        self.failed = Some(reason);
    }

    fn waiter(&mut self, r: ObjectRef) -> Result<FlushFuture> {
        let (tx, rx) = oneshot::channel();
        self.object_mut(r)?.waiters.push(tx);
        Ok(FlushFuture {
            inner: FlushInner::Pending(rx),
        })
    }
}

/// Incremental writer of indirect objects.
///
/// Cloning yields another handle to the same document, so collaborators on
/// other threads can fill and finalize their objects.
pub struct PdfWriter<W> {
    state: Arc<Mutex<WriterState<W>>>,
}

impl<W> Clone for PdfWriter<W> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<W: Write> PdfWriter<W> {
    /// Create a writer and emit the file header.
    pub fn new(mut sink: W, settings: WriterSettings) -> Result<Self> {
        let mut header = format!("%PDF-{}\n", settings.version.header_version()).into_bytes();
        // Binary marker (recommended for binary content)
        header.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        sink.write_all(&header)?;
        log::debug!("started PDF {} document ({:?})", settings.version, settings);

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                sink: Some(sink),
                settings,
                objects: Vec::new(),
                offsets: Vec::new(),
                offset: header.len() as u64,
                ready: BTreeMap::new(),
                deferred: BTreeMap::new(),
                next_flush: 1,
                sealed: false,
                failed: None,
            })),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, WriterState<W>>> {
        self.state
            .lock()
            .map_err(|_| Error::WriterFailed("writer lock poisoned".into()))
    }

    /// PDF version of the document.
    pub fn version(&self) -> Result<PdfVersion> {
        Ok(self.lock()?.settings.version)
    }

    /// Pipeline a newly allocated object would get.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let state = self.lock()?;
        Ok(PipelineConfig {
            compress: state.settings.compress,
            encryptor: state.settings.encryptor.clone(),
        })
    }

    /// Switch compression for objects allocated from now on.
    pub fn set_compress(&self, compress: bool) -> Result<()> {
        self.lock()?.settings.compress = compress;
        Ok(())
    }

    /// Allocate an object with the document's current pipeline.
    pub fn allocate(&self, dict: Dictionary) -> Result<ObjectRef> {
        let pipeline = self.pipeline_config()?;
        self.lock()?.allocate(dict, false, pipeline, false)
    }

    /// Allocate an object that always carries a stream body.
    pub fn allocate_stream(&self, dict: Dictionary) -> Result<ObjectRef> {
        let pipeline = self.pipeline_config()?;
        self.lock()?.allocate(dict, true, pipeline, false)
    }

    /// Allocate an object with an explicit pipeline.
    pub fn allocate_with(&self, dict: Dictionary, pipeline: PipelineConfig) -> Result<ObjectRef> {
        self.lock()?.allocate(dict, false, pipeline, false)
    }

    /// Allocate an object written at [`end`](Self::end) instead of in id order.
    ///
    /// Used for long-lived objects whose id is needed early, so that
    /// flushing never waits on them.
    pub fn reserve(&self, dict: Dictionary) -> Result<ObjectRef> {
        let pipeline = self.pipeline_config()?;
        let r = self.lock()?.allocate(dict, false, pipeline, true)?;
        log::debug!("reserved object {}", r);
        Ok(r)
    }

    /// Append bytes to an object's stream body.
    pub fn write(&self, r: ObjectRef, data: impl AsRef<[u8]>) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(reason) = &state.failed {
            return Err(Error::WriterFailed(reason.clone()));
        }
        state.object_mut(r)?.write(data.as_ref())
    }

    /// Set an attribute of an open object.
    pub fn set(&self, r: ObjectRef, key: &str, value: impl Into<Object>) -> Result<()> {
        let value = value.into();
        self.update(r, |dict| {
            dict.insert(key.to_string(), value);
        })
    }

    /// Mutate the attributes of an open object.
    pub fn update(&self, r: ObjectRef, f: impl FnOnce(&mut Dictionary)) -> Result<()> {
        let mut state = self.lock()?;
        state.object_mut(r)?.update(f)
    }

    /// Lifecycle state of an object.
    pub fn state(&self, r: ObjectRef) -> Result<ObjectState> {
        Ok(self.lock()?.object_mut(r)?.state)
    }

    /// Offset of a flushed object.
    pub fn offset_of(&self, r: ObjectRef) -> Result<Option<u64>> {
        let mut state = self.lock()?;
        state.object_mut(r)?;
        Ok(state.offsets[r.id as usize - 1])
    }

    /// Bytes written to the sink so far.
    pub fn bytes_written(&self) -> Result<u64> {
        Ok(self.lock()?.offset)
    }

    /// Number of allocated objects.
    pub fn object_count(&self) -> Result<usize> {
        Ok(self.lock()?.objects.len())
    }

    /// Whether the trailer was written.
    pub fn is_sealed(&self) -> Result<bool> {
        Ok(self.lock()?.sealed)
    }

    /// Append `data`, then finalize.
    pub fn finalize_with(&self, r: ObjectRef, data: impl AsRef<[u8]>) -> Result<FlushFuture> {
        {
            let mut state = self.lock()?;
            let obj = state.object_mut(r)?;
            if obj.state == ObjectState::Open {
                obj.write(data.as_ref())?;
            }
        }
        self.finalize(r)
    }

    /// Finalize an object.
    ///
    /// The pipeline runs and the block is queued before this returns; the
    /// future resolves once the block is in the sink. Finalizing again is
    /// not an error: a flushed object yields a completed future, a queued
    /// one another waiter.
    pub fn finalize(&self, r: ObjectRef) -> Result<FlushFuture> {
        let (dict, content, pipeline) = {
            let mut state = self.lock()?;
            if let Some(reason) = &state.failed {
                return Err(Error::WriterFailed(reason.clone()));
            }
            let obj = state.object_mut(r)?;
            match obj.state {
                ObjectState::Flushed => return Ok(FlushFuture::done()),
                ObjectState::Finalizing => {
                    if let Some(reason) = &obj.failure {
                        return Err(Error::PipelineFailure {
                            object: r,
                            reason: reason.clone(),
                        });
                    }
                    return state.waiter(r);
                },
                ObjectState::Open => {},
            }
            obj.state = ObjectState::Finalizing;
            let pipeline = obj.stream_pipeline();
            let content = obj.take_content();
            let dict = std::mem::take(&mut obj.dict);
            (dict, content, pipeline)
        };

        // The object is FINALIZING, so nobody else touches its attributes
        // while the pipeline runs outside the lock.
        let block = Self::build_block(r, dict, content, &pipeline);

        let mut state = self.lock()?;
        let block = match block {
            Ok(block) => block,
            Err(e) => {
                let reason = match &e {
                    Error::PipelineFailure { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                let obj = state.object_mut(r)?;
                obj.failure = Some(reason.clone());
                for waiter in obj.waiters.drain(..) {
                    let _ = waiter.send(Err(Error::PipelineFailure {
                        object: r,
                        reason: reason.clone(),
                    }));
                }
                return Err(e);
            },
        };
        if let Some(reason) = &state.failed {
            return Err(Error::WriterFailed(reason.clone()));
        }

        let reserved = state.object_mut(r)?.reserved;
        if reserved {
            state.deferred.insert(r.id, block);
        } else {
            state.ready.insert(r.id, block);
            state.drain()?;
        }

        if state.object_mut(r)?.state == ObjectState::Flushed {
            Ok(FlushFuture::done())
        } else {
            state.waiter(r)
        }
    }

    /// Run the pipeline and serialize the complete block.
    fn build_block(
        r: ObjectRef,
        mut dict: Dictionary,
        content: Option<Vec<u8>>,
        pipeline: &PipelineConfig,
    ) -> Result<Vec<u8>> {
        let stream = match content {
            Some(data) => {
                if pipeline.compress {
                    dict.insert("Filter".to_string(), Object::name("FlateDecode"));
                }
                let data = pipeline::transform(data, r, pipeline)?;
                dict.insert("Length".to_string(), Object::from(data.len()));
                Some(data)
            },
            None => None,
        };

        let crypt = pipeline.encryptor.as_deref().map(|encryptor| StringCrypt {
            encryptor,
            object: r,
        });
        ObjectSerializer::new().serialize_indirect(r, &dict, stream.as_deref(), crypt)
    }

    /// Write reserved objects, the cross-reference section and the trailer.
    ///
    /// Fails with [`Error::UnflushedObjects`] while any object was never
    /// finalized; nothing is written in that case. Seals the writer and
    /// returns the sink.
    pub fn end(&self, trailer: TrailerInfo) -> Result<W> {
        let mut state = self.lock()?;
        state.check_usable()?;

        let unflushed: Vec<u32> = state
            .objects
            .iter()
            .filter(|obj| match obj.state {
                ObjectState::Open => true,
                ObjectState::Finalizing => {
                    !(state.ready.contains_key(&obj.reference.id)
                        || state.deferred.contains_key(&obj.reference.id))
                },
                ObjectState::Flushed => false,
            })
            .map(|obj| obj.reference.id)
            .collect();
        if !unflushed.is_empty() {
            return Err(Error::UnflushedObjects(unflushed));
        }

        state.drain()?;
        let deferred = std::mem::take(&mut state.deferred);
        for (id, bytes) in deferred {
            state.emit(id, &bytes)?;
        }

        let offsets: Vec<u64> = state.offsets.iter().map(|o| o.unwrap_or(0)).collect();
        let start = state.offset;
        let section = if state.settings.version.uses_xref_stream() {
            xref::stream_section(&offsets, &trailer, start, state.settings.compress)?
        } else {
            xref::classic_section(&offsets, &trailer, start)
        };
        let sink = state.sink.as_mut().ok_or(Error::DocumentSealed)?;
        if let Err(e) = sink.write_all(&section).and_then(|_| sink.flush()) {
            state.fail(e.to_string());
            return Err(Error::Io(e));
        }
        state.offset += section.len() as u64;
        state.sealed = true;
        log::debug!(
            "sealed document: {} objects, {} bytes",
            state.objects.len(),
            state.offset
        );

        state.sink.take().ok_or(Error::DocumentSealed)
    }
}
