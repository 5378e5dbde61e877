//! Configuration for PDF generation.
//!
//! A [`DocumentConfig`] is passed to each document at construction. It
//! carries everything the writer needs (version, compression, encryption,
//! conformance subset, output ICC profile), so no state is shared between
//! documents.

use crate::encryption::EncryptionConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PDF version written in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PdfVersion {
    /// PDF 1.3
    V1_3,
    /// PDF 1.4
    V1_4,
    /// PDF 1.5, first version with cross-reference streams
    V1_5,
    /// PDF 1.6
    V1_6,
    /// PDF 1.7
    V1_7,
    /// PDF 1.7 with Adobe extension level 3 (AES-256)
    V1_7Ext3,
}

impl PdfVersion {
    /// Version string used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
            PdfVersion::V1_7Ext3 => "1.7ext3",
        }
    }

    /// Version written after `%PDF-`. Extension levels are declared in the catalog.
    pub fn header_version(&self) -> &'static str {
        match self {
            PdfVersion::V1_7Ext3 => "1.7",
            other => other.as_str(),
        }
    }

    /// Whether the cross-reference section is written as a stream.
    pub fn uses_xref_stream(&self) -> bool {
        *self >= PdfVersion::V1_5
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        PdfVersion::V1_3
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PdfVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1.3" => Ok(PdfVersion::V1_3),
            "1.4" => Ok(PdfVersion::V1_4),
            "1.5" => Ok(PdfVersion::V1_5),
            "1.6" => Ok(PdfVersion::V1_6),
            "1.7" => Ok(PdfVersion::V1_7),
            "1.7ext3" => Ok(PdfVersion::V1_7Ext3),
            other => Err(Error::InvalidConfig(format!("unsupported PDF version '{}'", other))),
        }
    }
}

impl TryFrom<String> for PdfVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PdfVersion> for String {
    fn from(version: PdfVersion) -> Self {
        version.as_str().to_string()
    }
}

/// PDF/A conformance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conformance {
    /// Level A (accessible)
    A,
    /// Level B (basic)
    B,
    /// Level U (Unicode)
    U,
}

impl Conformance {
    /// Letter written to `pdfaid:conformance`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Conformance::A => "A",
            Conformance::B => "B",
            Conformance::U => "U",
        }
    }
}

/// Standard subset the document must conform to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PdfSubset {
    /// PDF/A part 1-3
    PdfA {
        /// Part number
        part: u8,
        /// Conformance level
        conformance: Conformance,
    },
    /// PDF/UA-1
    PdfUa,
}

impl PdfSubset {
    /// Whether this is a PDF/A subset.
    pub fn is_pdfa(&self) -> bool {
        matches!(self, PdfSubset::PdfA { .. })
    }

    /// Version the subset requires, if it pins one.
    pub fn required_version(&self) -> Option<PdfVersion> {
        match self {
            PdfSubset::PdfA { part: 1, .. } => Some(PdfVersion::V1_4),
            PdfSubset::PdfA { .. } => Some(PdfVersion::V1_7),
            PdfSubset::PdfUa => None,
        }
    }
}

impl fmt::Display for PdfSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfSubset::PdfA { part, conformance } => {
                write!(f, "PDF/A-{}{}", part, conformance.as_str().to_ascii_lowercase())
            },
            PdfSubset::PdfUa => f.write_str("PDF/UA"),
        }
    }
}

impl FromStr for PdfSubset {
    type Err = Error;

    /// Parse `PDF/A-1b`, `PDF/A-2`, `PDF/A-3a`, `PDF/UA`.
    ///
    /// A missing conformance letter means level B.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidConfig(format!("unknown subset '{}'", s));
        let upper = s.trim().to_ascii_uppercase();

        if upper == "PDF/UA" || upper == "PDF/UA-1" {
            return Ok(PdfSubset::PdfUa);
        }

        let rest = upper.strip_prefix("PDF/A-").ok_or_else(invalid)?;
        let mut chars = rest.chars();
        let part = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .filter(|p| (1..=3).contains(p))
            .ok_or_else(invalid)? as u8;
        let conformance = match chars.next() {
            None | Some('B') => Conformance::B,
            Some('A') => Conformance::A,
            Some('U') if part > 1 => Conformance::U,
            Some(_) => return Err(invalid()),
        };
        if chars.next().is_some() {
            return Err(invalid());
        }
        Ok(PdfSubset::PdfA { part, conformance })
    }
}

impl TryFrom<String> for PdfSubset {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PdfSubset> for String {
    fn from(subset: PdfSubset) -> Self {
        subset.to_string()
    }
}

/// Entries of the document information dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Application that created the original content
    pub creator: Option<String>,
    /// Application that produced the PDF
    pub producer: Option<String>,
    /// Creation date; defaults to the time the document is created
    pub creation_date: Option<DateTime<Utc>>,
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Width in points
    pub width: f64,
    /// Height in points
    pub height: f64,
}

impl PageSize {
    /// US Letter (8.5" x 11").
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    /// A4 (210mm x 297mm).
    pub const A4: PageSize = PageSize::new(595.28, 841.89);

    /// Custom size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::LETTER
    }
}

/// Configuration of one generated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Header version; also selects the xref flavour and default cipher
    pub version: PdfVersion,
    /// Compress stream bodies with FlateDecode
    pub compress: bool,
    /// Emit a logical structure tree
    pub tagged: bool,
    /// Ask viewers to show the title instead of the file name
    pub display_title: bool,
    /// Natural language of the document (e.g. `en-US`)
    pub lang: Option<String>,
    /// Conformance subset
    pub subset: Option<PdfSubset>,
    /// Information dictionary entries
    pub info: DocumentInfo,
    /// Encryption settings
    pub encryption: Option<EncryptionConfig>,
    /// Output intent ICC profile (RGB), required for PDF/A
    #[serde(skip)]
    pub icc_profile: Option<Vec<u8>>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            version: PdfVersion::default(),
            compress: true,
            tagged: false,
            display_title: false,
            lang: None,
            subset: None,
            info: DocumentInfo::default(),
            encryption: None,
            icc_profile: None,
        }
    }

    /// Load a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the PDF version.
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable the structure tree.
    pub fn with_tagged(mut self, tagged: bool) -> Self {
        self.tagged = tagged;
        self
    }

    /// Show the document title in the viewer's title bar.
    pub fn with_display_title(mut self, display: bool) -> Self {
        self.display_title = display;
        self
    }

    /// Set the document language.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Set the conformance subset.
    pub fn with_subset(mut self, subset: PdfSubset) -> Self {
        self.subset = Some(subset);
        self
    }

    /// Set the information dictionary entries.
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.info.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.info.author = Some(author.into());
        self
    }

    /// Encrypt the document.
    pub fn with_encryption(mut self, encryption: EncryptionConfig) -> Self {
        self.encryption = Some(encryption);
        self
    }

    /// Provide the output intent ICC profile.
    pub fn with_icc_profile(mut self, profile: impl Into<Vec<u8>>) -> Self {
        self.icc_profile = Some(profile.into());
        self
    }

    /// Reject incoherent combinations.
    pub fn validate(&self) -> Result<()> {
        if let Some(subset) = self.subset.filter(PdfSubset::is_pdfa) {
            if self.encryption.is_some() {
                return Err(Error::InvalidConfig(format!("{} forbids encryption", subset)));
            }
            if self.icc_profile.as_ref().map_or(true, Vec::is_empty) {
                return Err(Error::InvalidConfig(format!(
                    "{} requires an output intent ICC profile",
                    subset
                )));
            }
        }
        if let Some(lang) = &self.lang {
            if lang.trim().is_empty() {
                return Err(Error::InvalidConfig("language tag is empty".into()));
            }
        }
        Ok(())
    }

    /// Validate and apply the adjustments required by the subset.
    pub fn resolve(mut self) -> Result<Self> {
        self.validate()?;
        match self.subset {
            Some(subset @ PdfSubset::PdfA { conformance, .. }) => {
                if let Some(required) = subset.required_version() {
                    if self.version != required {
                        log::warn!("{} requires PDF {}, overriding {}", subset, required, self.version);
                        self.version = required;
                    }
                }
                if conformance == Conformance::A && !self.tagged {
                    log::warn!("{} requires a structure tree, enabling tagging", subset);
                    self.tagged = true;
                }
            },
            Some(PdfSubset::PdfUa) => {
                if !self.tagged || !self.display_title {
                    log::warn!("PDF/UA requires tagging and DisplayDocTitle, enabling both");
                }
                self.tagged = true;
                self.display_title = true;
                if self.info.title.is_none() {
                    log::warn!("PDF/UA documents should carry a title");
                }
            },
            None => {},
        }
        Ok(self)
    }
}
