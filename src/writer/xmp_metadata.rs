//! XMP metadata writing for PDF documents.
//!
//! Generates XMP (Extensible Metadata Platform) packets for the catalog's
//! `/Metadata` stream. PDF/A and PDF/UA identify themselves here through
//! the `pdfaid` and `pdfuaid` schemas. See ISO 32000-1:2008, Section 14.3.2.

use crate::config::{DocumentInfo, PdfSubset};
use chrono::{DateTime, Utc};

/// XMP namespace URIs
const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
const NS_PDF: &str = "http://ns.adobe.com/pdf/1.3/";
const NS_PDFAID: &str = "http://www.aiim.org/pdfa/ns/id/";
const NS_PDFUAID: &str = "http://www.aiim.org/pdfua/ns/id/";

/// XMP metadata writer/builder.
#[derive(Debug, Clone, Default)]
pub struct XmpWriter {
    title: Option<String>,
    creators: Vec<String>,
    description: Option<String>,
    language: Option<String>,
    creator_tool: Option<String>,
    create_date: Option<DateTime<Utc>>,
    modify_date: Option<DateTime<Utc>>,
    producer: Option<String>,
    keywords: Option<String>,
    pdfa: Option<(u8, &'static str)>,
    pdfua_part: Option<u8>,
}

impl XmpWriter {
    /// Create an empty XMP writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the entries of the information dictionary.
    pub fn from_info(info: &DocumentInfo) -> Self {
        let mut writer = Self::new();
        writer.title = info.title.clone();
        writer.creators = info.author.iter().cloned().collect();
        writer.description = info.subject.clone();
        writer.keywords = info.keywords.clone();
        writer.creator_tool = info.creator.clone();
        writer.producer = info.producer.clone();
        writer.create_date = info.creation_date;
        writer.modify_date = info.creation_date;
        writer
    }

    /// Set the document title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a creator/author.
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creators.push(creator.into());
        self
    }

    /// Set the document language.
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.language = Some(lang.into());
        self
    }

    /// Set the producer.
    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    /// Set creation and modification date.
    pub fn dates(mut self, at: DateTime<Utc>) -> Self {
        self.create_date = Some(at);
        self.modify_date = Some(at);
        self
    }

    /// Declare conformance to `subset`.
    pub fn subset(mut self, subset: PdfSubset) -> Self {
        match subset {
            PdfSubset::PdfA { part, conformance } => self.pdfa = Some((part, conformance.as_str())),
            PdfSubset::PdfUa => self.pdfua_part = Some(1),
        }
        self
    }

    /// Build the XMP packet as bytes.
    pub fn build_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }

    /// Convert metadata to XMP XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();

        xml.push_str("<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
        xml.push_str(&format!("<x:xmpmeta xmlns:x=\"{}\">\n", NS_X));
        xml.push_str(&format!("  <rdf:RDF xmlns:rdf=\"{}\">\n", NS_RDF));

        xml.push_str("    <rdf:Description rdf:about=\"\"\n");
        xml.push_str(&format!("        xmlns:dc=\"{}\"\n", NS_DC));
        xml.push_str(&format!("        xmlns:xmp=\"{}\"\n", NS_XMP));
        xml.push_str(&format!("        xmlns:pdf=\"{}\">\n", NS_PDF));
        xml.push_str("      <dc:format>application/pdf</dc:format>\n");

        if let Some(title) = &self.title {
            xml.push_str("      <dc:title>\n");
            xml.push_str("        <rdf:Alt>\n");
            xml.push_str(&format!(
                "          <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n",
                escape_xml(title)
            ));
            xml.push_str("        </rdf:Alt>\n");
            xml.push_str("      </dc:title>\n");
        }

        if !self.creators.is_empty() {
            xml.push_str("      <dc:creator>\n");
            xml.push_str("        <rdf:Seq>\n");
            for creator in &self.creators {
                xml.push_str(&format!("          <rdf:li>{}</rdf:li>\n", escape_xml(creator)));
            }
            xml.push_str("        </rdf:Seq>\n");
            xml.push_str("      </dc:creator>\n");
        }

        if let Some(desc) = &self.description {
            xml.push_str("      <dc:description>\n");
            xml.push_str("        <rdf:Alt>\n");
            xml.push_str(&format!(
                "          <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n",
                escape_xml(desc)
            ));
            xml.push_str("        </rdf:Alt>\n");
            xml.push_str("      </dc:description>\n");
        }

        if let Some(language) = &self.language {
            xml.push_str("      <dc:language>\n");
            xml.push_str("        <rdf:Bag>\n");
            xml.push_str(&format!("          <rdf:li>{}</rdf:li>\n", escape_xml(language)));
            xml.push_str("        </rdf:Bag>\n");
            xml.push_str("      </dc:language>\n");
        }

        if let Some(tool) = &self.creator_tool {
            xml.push_str(&format!(
                "      <xmp:CreatorTool>{}</xmp:CreatorTool>\n",
                escape_xml(tool)
            ));
        }
        if let Some(date) = self.create_date {
            xml.push_str(&format!("      <xmp:CreateDate>{}</xmp:CreateDate>\n", iso_timestamp(date)));
        }
        if let Some(date) = self.modify_date {
            xml.push_str(&format!("      <xmp:ModifyDate>{}</xmp:ModifyDate>\n", iso_timestamp(date)));
        }

        if let Some(producer) = &self.producer {
            xml.push_str(&format!("      <pdf:Producer>{}</pdf:Producer>\n", escape_xml(producer)));
        }
        if let Some(keywords) = &self.keywords {
            xml.push_str(&format!("      <pdf:Keywords>{}</pdf:Keywords>\n", escape_xml(keywords)));
        }
        xml.push_str("    </rdf:Description>\n");

        if let Some((part, conformance)) = self.pdfa {
            xml.push_str(&format!(
                "    <rdf:Description rdf:about=\"\" xmlns:pdfaid=\"{}\">\n",
                NS_PDFAID
            ));
            xml.push_str(&format!("      <pdfaid:part>{}</pdfaid:part>\n", part));
            xml.push_str(&format!(
                "      <pdfaid:conformance>{}</pdfaid:conformance>\n",
                conformance
            ));
            xml.push_str("    </rdf:Description>\n");
        }

        if let Some(part) = self.pdfua_part {
            xml.push_str(&format!(
                "    <rdf:Description rdf:about=\"\" xmlns:pdfuaid=\"{}\">\n",
                NS_PDFUAID
            ));
            xml.push_str(&format!("      <pdfuaid:part>{}</pdfuaid:part>\n", part));
            xml.push_str("    </rdf:Description>\n");
        }

        xml.push_str("  </rdf:RDF>\n");
        xml.push_str("</x:xmpmeta>\n");

        // Padding for in-place editing
        for _ in 0..20 {
            xml.push_str("                                                  \n");
        }
        xml.push_str("<?xpacket end=\"w\"?>");

        xml
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Timestamp in ISO 8601 format.
fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
