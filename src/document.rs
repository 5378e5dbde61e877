//! PDF document assembly on top of the incremental writer.
//!
//! [`PdfDocument`] owns the long-lived objects of a file (catalog, page
//! tree, structure tree root) and hands out pages, structure elements and
//! marked-content identifiers to drawing layers. Content streams, pages and
//! finished structure elements are flushed while the document is still
//! being built; only the reserved objects wait for [`PdfDocument::end`].
//!
//! # Example
//!
//! ```ignore
//! use pdf_weave::{DocumentConfig, PageSize, PdfDocument, StructOptions, StructType};
//!
//! let config = DocumentConfig::new().with_tagged(true).with_title("Report");
//! let mut doc = PdfDocument::new(Vec::new(), config)?;
//! doc.add_page(PageSize::A4)?;
//! let p = doc.begin_structure(None, StructType::P, StructOptions::default())?;
//! doc.mark_content(p, |content| content.write(b"BT /F1 12 Tf (Hello) Tj ET\n"))?;
//! let _ = doc.end_structure(p)?;
//! let bytes = doc.end()?;
//! ```

use crate::config::{DocumentConfig, DocumentInfo, PageSize, PdfSubset, PdfVersion};
use crate::encryption::{generate_file_id, EncryptDictBuilder};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::structure::{StructOptions, StructType, StructureTree};
use crate::writer::{
    FlushFuture, ObjectSerializer, PdfWriter, PipelineConfig, TrailerInfo, WriterSettings,
    XmpWriter,
};
use chrono::Utc;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Output condition of the sRGB profile used for PDF/A output intents.
const SRGB_CONDITION: &str = "sRGB IEC61966-2.1";

fn dict(entries: Vec<(&str, Object)>) -> Dictionary {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn not_tagged() -> Error {
    Error::InvalidConfig("document is not tagged".into())
}

/// The page currently being drawn.
struct OpenPage {
    index: usize,
    page: ObjectRef,
    content: ObjectRef,
    /// Resource category (`Font`, `XObject`, ...) to named resources
    resources: Dictionary,
    /// A `BDC`/`BMC` sequence is open
    marked: bool,
}

/// Content stream of the open page, as seen by a drawing callback.
pub struct PageContent<'a, W> {
    writer: &'a PdfWriter<W>,
    content: ObjectRef,
    page: usize,
}

impl<W: Write> PageContent<'_, W> {
    /// Append content stream operators.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        self.writer.write(self.content, data)
    }

    /// Index of the page being drawn.
    pub fn page_index(&self) -> usize {
        self.page
    }
}

/// A PDF document being written to `W`.
pub struct PdfDocument<W> {
    writer: PdfWriter<W>,
    config: DocumentConfig,
    catalog: ObjectRef,
    pages_root: ObjectRef,
    encrypt: Option<ObjectRef>,
    file_id: (Vec<u8>, Vec<u8>),
    /// Page objects by page index, including the open page
    pages: Vec<ObjectRef>,
    current: Option<OpenPage>,
    structure: Option<StructureTree>,
}

impl PdfDocument<BufWriter<File>> {
    /// Create a document written to the file at `path`.
    pub fn create(path: impl AsRef<Path>, config: DocumentConfig) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), config)
    }
}

impl<W: Write> PdfDocument<W> {
    /// Start a document: header, encryption dictionary and the reserved
    /// catalog, page tree and structure objects.
    pub fn new(sink: W, config: DocumentConfig) -> Result<Self> {
        let mut config = config.resolve()?;
        config.info.creation_date.get_or_insert_with(Utc::now);
        if config.info.producer.is_none() {
            config.info.producer = Some(format!("{} {}", crate::NAME, crate::VERSION));
        }

        let file_id = generate_file_id();
        let mut settings = WriterSettings::new(config.version).with_compress(config.compress);
        let encrypt_dict = match &config.encryption {
            Some(encryption) => {
                let (encrypt_dict, handler) =
                    EncryptDictBuilder::from_config(encryption, config.version)?.build(&file_id.0)?;
                log::debug!("encrypting with {:?}", encrypt_dict.algorithm);
                settings = settings.with_encryptor(Arc::new(handler));
                Some(encrypt_dict)
            },
            None => None,
        };

        let writer = PdfWriter::new(sink, settings)?;

        // The encryption dictionary is never encrypted itself
        let encrypt = match encrypt_dict {
            Some(encrypt_dict) => {
                let r = writer.allocate_with(encrypt_dict.to_dict(), PipelineConfig::plain())?;
                let _ = writer.finalize(r)?;
                Some(r)
            },
            None => None,
        };

        let catalog = writer.reserve(dict(vec![("Type", Object::name("Catalog"))]))?;
        let pages_root = writer.reserve(dict(vec![("Type", Object::name("Pages"))]))?;
        writer.set(catalog, "Pages", pages_root)?;

        let structure = if config.tagged {
            let root = writer.reserve(Dictionary::new())?;
            let document = writer.reserve(Dictionary::new())?;
            Some(StructureTree::new(root, document))
        } else {
            None
        };

        Ok(Self {
            writer,
            config,
            catalog,
            pages_root,
            encrypt,
            file_id,
            pages: Vec::new(),
            current: None,
            structure,
        })
    }

    /// Underlying object writer, for collaborators embedding their own
    /// objects (fonts, images, annotations).
    pub fn writer(&self) -> &PdfWriter<W> {
        &self.writer
    }

    /// Effective configuration, after subset adjustments.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// PDF version written to the header.
    pub fn version(&self) -> PdfVersion {
        self.config.version
    }

    /// Document catalog.
    pub fn catalog(&self) -> ObjectRef {
        self.catalog
    }

    /// Whether a structure tree is written.
    pub fn is_tagged(&self) -> bool {
        self.structure.is_some()
    }

    /// Close the open page (if any) and start a new one.
    ///
    /// Returns the index of the new page.
    pub fn add_page(&mut self, size: PageSize) -> Result<usize> {
        self.close_page()?;

        let index = self.pages.len();
        let mut page_dict = dict(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(self.pages_root)),
            ("MediaBox", Object::rect(0.0, 0.0, size.width, size.height)),
        ]);
        if let Some(structure) = self.structure.as_mut() {
            let key = structure.register_page(index);
            page_dict.insert("StructParents".into(), Object::from(key));
            page_dict.insert("Tabs".into(), Object::name("S"));
        }
        let page = self.writer.allocate(page_dict)?;
        let content = self.writer.allocate_stream(Dictionary::new())?;
        self.writer.set(page, "Contents", content)?;

        self.pages.push(page);
        self.current = Some(OpenPage {
            index,
            page,
            content,
            resources: Dictionary::new(),
            marked: false,
        });
        Ok(index)
    }

    fn close_page(&mut self) -> Result<()> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };
        if page.marked {
            log::warn!("page {} closed inside a marked-content sequence", page.index);
            self.writer.write(page.content, b"EMC\n")?;
        }
        self.writer
            .set(page.page, "Resources", Object::Dictionary(page.resources))?;
        let _ = self.writer.finalize(page.page)?;
        let _ = self.writer.finalize(page.content)?;
        log::trace!("closed page {}", page.index);
        Ok(())
    }

    fn open_page(&mut self) -> Result<&mut OpenPage> {
        self.current.as_mut().ok_or(Error::NoCurrentPage)
    }

    /// Append operators to the open page's content stream.
    pub fn write_content(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        let content = self.open_page()?.content;
        self.writer.write(content, data)
    }

    /// Register a named resource (e.g. `Font`, `F1`) on the open page.
    pub fn set_page_resource(
        &mut self,
        category: &str,
        name: &str,
        value: impl Into<Object>,
    ) -> Result<()> {
        let value = value.into();
        let page = self.open_page()?;
        let entry = page
            .resources
            .entry(category.to_string())
            .or_insert_with(|| Object::Dictionary(Dictionary::new()));
        match entry {
            Object::Dictionary(named) => {
                named.insert(name.to_string(), value);
            },
            other => {
                *other = Object::Dictionary(dict(vec![(name, value)]));
            },
        }
        Ok(())
    }

    /// Page object of page `index`.
    pub fn page_ref(&self, index: usize) -> Result<ObjectRef> {
        self.pages.get(index).copied().ok_or(Error::UnknownPage(index))
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page < self.pages.len() {
            Ok(())
        } else {
            Err(Error::UnknownPage(page))
        }
    }

    /// The document element every other element descends from.
    pub fn structure_root(&self) -> Result<ObjectRef> {
        self.structure
            .as_ref()
            .map(StructureTree::document)
            .ok_or_else(not_tagged)
    }

    /// Start a structure element as the last kid of `parent` (the document
    /// element when `None`).
    pub fn begin_structure(
        &mut self,
        parent: Option<ObjectRef>,
        role: impl Into<StructType>,
        options: StructOptions,
    ) -> Result<ObjectRef> {
        let structure = self.structure.as_mut().ok_or_else(not_tagged)?;
        let parent = parent.unwrap_or_else(|| structure.document());
        // Check the parent before allocating, so a refused call leaves no
        // unfinished object behind
        if structure.is_ended(parent)? {
            return Err(Error::InvalidState {
                object: parent,
                state: "ended",
            });
        }
        let element = self.writer.allocate(Dictionary::new())?;
        structure.add_element(element, parent, role.into(), options)?;
        Ok(element)
    }

    /// Open a marked-content sequence on the current page owned by
    /// `element`; returns its MCID.
    pub fn begin_marked_content(&mut self, element: ObjectRef) -> Result<u32> {
        let structure = self.structure.as_mut().ok_or_else(not_tagged)?;
        let page = self.current.as_mut().ok_or(Error::NoCurrentPage)?;
        if page.marked {
            return Err(Error::NestedMarkedContent);
        }
        let tag = ObjectSerializer::new()
            .serialize_to_string(&Object::name(structure.node(element)?.role.as_name()));
        let mcid = structure.assign_marked_content(element, page.index)?;
        self.writer
            .write(page.content, format!("{} <</MCID {}>> BDC\n", tag, mcid))?;
        page.marked = true;
        Ok(mcid)
    }

    /// Close the open marked-content sequence.
    pub fn end_marked_content(&mut self) -> Result<()> {
        let page = self.open_page()?;
        if !page.marked {
            log::warn!("no marked-content sequence open on page {}", page.index);
            return Ok(());
        }
        page.marked = false;
        let content = page.content;
        self.writer.write(content, b"EMC\n")
    }

    fn draw<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&mut PageContent<'_, W>) -> Result<()>,
    {
        let page = self.current.as_ref().ok_or(Error::NoCurrentPage)?;
        let mut content = PageContent {
            writer: &self.writer,
            content: page.content,
            page: page.index,
        };
        draw(&mut content)
    }

    /// Draw content attributed to `element`.
    ///
    /// The operators written by `draw` are wrapped in a `BDC`/`EMC` pair
    /// with the next MCID of the page, which is returned.
    pub fn mark_content<F>(&mut self, element: ObjectRef, draw: F) -> Result<u32>
    where
        F: FnOnce(&mut PageContent<'_, W>) -> Result<()>,
    {
        let mcid = self.begin_marked_content(element)?;
        let drawn = self.draw(draw);
        self.end_marked_content()?;
        drawn.map(|_| mcid)
    }

    /// Draw content that is not part of the logical structure (headers,
    /// footers, decorations).
    pub fn mark_artifact<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&mut PageContent<'_, W>) -> Result<()>,
    {
        let page = self.open_page()?;
        if page.marked {
            return Err(Error::NestedMarkedContent);
        }
        page.marked = true;
        let content = page.content;
        self.writer.write(content, b"/Artifact BMC\n")?;
        let drawn = self.draw(draw);
        self.end_marked_content()?;
        drawn
    }

    /// Attribute marked content whose MCID the drawing layer chose itself.
    pub fn claim(&mut self, element: ObjectRef, page: usize, mcid: u32) -> Result<()> {
        self.check_page(page)?;
        self.structure
            .as_mut()
            .ok_or_else(not_tagged)?
            .add_marked_content(element, page, mcid)
    }

    /// Attribute a whole object on `page` (annotation, form XObject) to `element`.
    ///
    /// `object` must still be open: it receives the `/StructParent` key
    /// that leads back to `element` through the parent tree.
    pub fn add_object(&mut self, element: ObjectRef, page: usize, object: ObjectRef) -> Result<u32> {
        self.check_page(page)?;
        let structure = self.structure.as_mut().ok_or_else(not_tagged)?;
        structure.check_open(element)?;
        let key = structure.parent_tree().next_key();
        self.writer.set(object, "StructParent", key)?;
        structure.add_object(element, page, object)
    }

    /// Close `element` and finalize its dictionary.
    ///
    /// Kids still open are unaffected; their ids are already fixed.
    pub fn end_structure(&mut self, element: ObjectRef) -> Result<FlushFuture> {
        let structure = self.structure.as_mut().ok_or_else(not_tagged)?;
        finish_element(&self.writer, structure, &self.pages, element)
    }

    /// Close the last page and the structure tree, write the document-level
    /// objects and the trailer, and return the sink.
    pub fn end(mut self) -> Result<W> {
        self.close_page()?;
        let tagged = self.write_structure()?;
        let metadata = self.write_metadata()?;
        let output_intent = self.write_output_intent()?;

        let info = self.writer.allocate(info_dict(&self.config.info))?;
        let _ = self.writer.finalize(info)?;

        let kids: Vec<Object> = self.pages.iter().copied().map(Object::Reference).collect();
        let count = kids.len();
        self.writer.update(self.pages_root, |d| {
            d.insert("Kids".into(), Object::Array(kids));
            d.insert("Count".into(), Object::from(count));
        })?;
        let _ = self.writer.finalize(self.pages_root)?;

        let mut entries = Dictionary::new();
        if let Some(root) = tagged {
            entries.insert("MarkInfo".into(), Object::dict(vec![("Marked", Object::Boolean(true))]));
            entries.insert("StructTreeRoot".into(), Object::Reference(root));
        }
        if let Some(lang) = &self.config.lang {
            entries.insert("Lang".into(), Object::text(lang));
        }
        if self.config.display_title {
            entries.insert(
                "ViewerPreferences".into(),
                Object::dict(vec![("DisplayDocTitle", Object::Boolean(true))]),
            );
        }
        if let Some(metadata) = metadata {
            entries.insert("Metadata".into(), Object::Reference(metadata));
        }
        if let Some(intent) = output_intent {
            entries.insert("OutputIntents".into(), Object::Array(vec![intent]));
        }
        if self.config.version == PdfVersion::V1_7Ext3 {
            let adbe = Object::dict(vec![
                ("BaseVersion", Object::name("1.7")),
                ("ExtensionLevel", Object::from(3)),
            ]);
            entries.insert("Extensions".into(), Object::dict(vec![("ADBE", adbe)]));
        }
        self.writer.update(self.catalog, |d| d.extend(entries))?;
        let _ = self.writer.finalize(self.catalog)?;

        let trailer = TrailerInfo {
            root: self.catalog,
            info: Some(info),
            encrypt: self.encrypt,
            id: Some(self.file_id.clone()),
        };
        self.writer.end(trailer)
    }

    /// End open elements children-first, then write the parent tree and the
    /// structure tree root. Returns the root, if tagged.
    fn write_structure(&mut self) -> Result<Option<ObjectRef>> {
        let Some(structure) = self.structure.as_mut() else {
            return Ok(None);
        };
        let open = structure.open_elements();
        if open.len() > 1 {
            log::debug!("ending {} open structure elements", open.len());
        }
        for element in open {
            let _ = finish_element(&self.writer, structure, &self.pages, element)?;
        }

        let parent_tree = self.writer.allocate(structure.parent_tree().to_dict()?)?;
        let _ = self.writer.finalize(parent_tree)?;

        let root = structure.root();
        let root_dict = structure.root_dict(parent_tree);
        self.writer.update(root, |d| d.extend(root_dict))?;
        let _ = self.writer.finalize(root)?;
        Ok(Some(root))
    }

    /// XMP metadata stream for documents claiming a subset.
    fn write_metadata(&mut self) -> Result<Option<ObjectRef>> {
        let Some(subset) = self.config.subset else {
            return Ok(None);
        };
        let mut xmp = XmpWriter::from_info(&self.config.info).subset(subset);
        if let Some(lang) = &self.config.lang {
            xmp = xmp.language(lang.clone());
        }
        // Metadata stays readable by tools that do not decode streams
        let pipeline = self.writer.pipeline_config()?.with_compress(false);
        let metadata = self.writer.allocate_with(
            dict(vec![("Type", Object::name("Metadata")), ("Subtype", Object::name("XML"))]),
            pipeline,
        )?;
        let _ = self.writer.finalize_with(metadata, xmp.build_bytes())?;
        Ok(Some(metadata))
    }

    /// ICC profile stream and the PDF/A output intent dictionary.
    fn write_output_intent(&mut self) -> Result<Option<Object>> {
        if !matches!(self.config.subset, Some(PdfSubset::PdfA { .. })) {
            return Ok(None);
        }
        let profile = self
            .config
            .icc_profile
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("PDF/A requires an ICC profile".into()))?;
        let icc = self.writer.allocate_stream(dict(vec![("N", Object::from(3))]))?;
        let _ = self.writer.finalize_with(icc, profile)?;

        Ok(Some(Object::dict(vec![
            ("Type", Object::name("OutputIntent")),
            ("S", Object::name("GTS_PDFA1")),
            ("OutputConditionIdentifier", Object::text(SRGB_CONDITION)),
            ("Info", Object::text(SRGB_CONDITION)),
            ("DestOutputProfile", Object::Reference(icc)),
        ])))
    }
}

/// Build `element`'s dictionary and finalize it.
fn finish_element<W: Write>(
    writer: &PdfWriter<W>,
    structure: &mut StructureTree,
    pages: &[ObjectRef],
    element: ObjectRef,
) -> Result<FlushFuture> {
    let entries = structure.end_element(element, pages)?;
    writer.update(element, |d| d.extend(entries))?;
    writer.finalize(element)
}

fn info_dict(info: &DocumentInfo) -> Dictionary {
    let mut dict = Dictionary::new();
    for (key, value) in [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Subject", &info.subject),
        ("Keywords", &info.keywords),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
    ] {
        if let Some(value) = value {
            dict.insert(key.into(), Object::text(value));
        }
    }
    if let Some(date) = info.creation_date {
        dict.insert("CreationDate".into(), Object::date(date));
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    fn uncompressed() -> DocumentConfig {
        DocumentConfig::new().with_compress(false)
    }

    #[test]
    fn test_minimal_document() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed()).unwrap();
        assert_eq!(doc.add_page(PageSize::LETTER).unwrap(), 0);
        doc.write_content(b"0 0 m 10 10 l S\n").unwrap();
        let out = text(&doc.end().unwrap());

        assert!(out.starts_with("%PDF-1.3\n"));
        assert!(out.contains("/Type /Catalog"));
        assert!(out.contains("/Type /Pages"));
        assert!(out.contains("/Count 1"));
        assert!(out.contains("/MediaBox [0 0 612 792]"));
        assert!(out.contains("0 0 m 10 10 l S\n"));
        assert!(out.contains("/Producer (pdf_weave "));
        assert!(out.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_drawing_requires_page() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed()).unwrap();
        assert!(matches!(doc.write_content(b"q Q"), Err(Error::NoCurrentPage)));
        assert!(matches!(doc.page_ref(0), Err(Error::UnknownPage(0))));
    }

    #[test]
    fn test_page_resources() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed()).unwrap();
        doc.add_page(PageSize::A4).unwrap();
        let font = doc
            .writer()
            .allocate(dict(vec![("Type", Object::name("Font"))]))
            .unwrap();
        let _ = doc.writer().finalize(font).unwrap();
        doc.set_page_resource("Font", "F1", font).unwrap();
        let out = text(&doc.end().unwrap());
        assert!(out.contains(&format!("/Resources <<\n/Font <<\n/F1 {}", font)));
    }

    #[test]
    fn test_structure_calls_need_tagging() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed()).unwrap();
        assert!(matches!(doc.structure_root(), Err(Error::InvalidConfig(_))));
        assert!(doc
            .begin_structure(None, StructType::P, StructOptions::default())
            .is_err());
    }

    #[test]
    fn test_mark_content_wraps_operators() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed().with_tagged(true)).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        let h1 = doc
            .begin_structure(None, StructType::H1, StructOptions::default())
            .unwrap();
        let first = doc.mark_content(h1, |c| c.write(b"(Title) Tj\n")).unwrap();
        let second = doc.mark_content(h1, |c| c.write(b"(More) Tj\n")).unwrap();
        assert_eq!((first, second), (0, 1));
        doc.mark_artifact(|c| c.write(b"(Footer) Tj\n")).unwrap();

        let out = text(&doc.end().unwrap());
        assert!(out.contains("/H1 <</MCID 0>> BDC\n(Title) Tj\nEMC\n/H1 <</MCID 1>> BDC\n"));
        assert!(out.contains("/Artifact BMC\n(Footer) Tj\nEMC\n"));
        assert!(out.contains("/StructParents 0"));
        assert!(out.contains("/Tabs /S"));
        assert!(out.contains("/MarkInfo <<\n/Marked true\n>>"));
        assert!(out.contains("/K [0 1]"));
    }

    #[test]
    fn test_nested_marked_content() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed().with_tagged(true)).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        let p = doc.begin_structure(None, StructType::P, StructOptions::default()).unwrap();
        doc.begin_marked_content(p).unwrap();
        assert!(matches!(doc.begin_marked_content(p), Err(Error::NestedMarkedContent)));
        assert!(matches!(
            doc.mark_artifact(|_| Ok(())),
            Err(Error::NestedMarkedContent)
        ));
        // Left open on purpose: closing the page ends the sequence
        assert!(text(&doc.end().unwrap()).contains("BDC\nEMC\n"));
    }

    #[test]
    fn test_claim_checks_page() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed().with_tagged(true)).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        let p = doc.begin_structure(None, StructType::P, StructOptions::default()).unwrap();
        assert!(matches!(doc.claim(p, 3, 0), Err(Error::UnknownPage(3))));
        doc.claim(p, 0, 0).unwrap();
        assert!(matches!(
            doc.claim(p, 0, 0),
            Err(Error::DuplicateMarkedContent { page: 0, mcid: 0 })
        ));
    }

    #[test]
    fn test_begin_under_ended_parent() {
        let mut doc = PdfDocument::new(Vec::new(), uncompressed().with_tagged(true)).unwrap();
        let sect = doc
            .begin_structure(None, StructType::Sect, StructOptions::default())
            .unwrap();
        let _ = doc.end_structure(sect).unwrap();
        let count = doc.writer().object_count().unwrap();
        assert!(matches!(
            doc.begin_structure(Some(sect), StructType::P, StructOptions::default()),
            Err(Error::InvalidState { state: "ended", .. })
        ));
        assert_eq!(doc.writer().object_count().unwrap(), count);
        assert!(doc.end().is_ok());
    }

    #[test]
    fn test_catalog_entries() {
        let config = uncompressed()
            .with_version(PdfVersion::V1_7Ext3)
            .with_lang("de-DE")
            .with_display_title(true);
        let mut doc = PdfDocument::new(Vec::new(), config).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        let out = text(&doc.end().unwrap());
        assert!(out.contains("/Lang (de-DE)"));
        assert!(out.contains("/DisplayDocTitle true"));
        assert!(out.contains("/ADBE <<\n/BaseVersion /1.7\n/ExtensionLevel 3\n>>"));
        assert!(out.contains("/Type /XRef"));
    }
}
