//! Incremental writing of PDF indirect objects.
//!
//! Objects are allocated up front, filled while open, and finalized in any
//! order. Serialized blocks reach the sink strictly in id order; the
//! cross-reference section and trailer close the file.
//!
//! ## Architecture
//!
//! ```text
//! allocate / reserve
//!     ↓
//! [IndirectObject] (open: dictionary + stream chunks)
//!     ↓ finalize
//! [pipeline] (flate, then encryption)
//!     ↓
//! [ObjectSerializer] (object block bytes)
//!     ↓ admission in id order
//! sink ── end ──> [xref] (table or stream) + trailer
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pdf_weave::writer::{PdfWriter, TrailerInfo, WriterSettings};
//!
//! let writer = PdfWriter::new(Vec::new(), WriterSettings::default())?;
//! let catalog = writer.reserve(Dictionary::new())?;
//! let stream = writer.allocate_stream(Dictionary::new())?;
//! writer.write(stream, b"BT ET")?;
//! let _ = writer.finalize(stream)?;
//! writer.set(catalog, "Type", Object::name("Catalog"))?;
//! let _ = writer.finalize(catalog)?;
//! let bytes = writer.end(TrailerInfo::new(catalog))?;
//! ```

mod indirect;
mod pdf_writer;
mod pipeline;
mod serializer;
mod xmp_metadata;
mod xref;

pub use indirect::ObjectState;
pub use pdf_writer::{FlushFuture, PdfWriter, WriterSettings};
pub use pipeline::{compress_data, transform, PipelineConfig};
pub use serializer::{ObjectSerializer, StringCrypt};
pub use xmp_metadata::XmpWriter;
pub use xref::TrailerInfo;
