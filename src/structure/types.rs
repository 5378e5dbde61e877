//! Types for PDF logical structure trees.
//!
//! Implements structure element types according to ISO 32000-1:2008 Section 14.7.2.

use crate::object::ObjectRef;
use std::fmt;

/// Standard structure types (ISO 32000-1 §14.8.4).
///
/// Custom types are written as-is; readers map them through the RoleMap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StructType {
    // Document-level structure types
    /// Document root
    Document,
    /// Part (major division)
    Part,
    /// Article
    Art,
    /// Section
    Sect,
    /// Division
    Div,
    /// Block quotation
    BlockQuote,
    /// Caption of a table or figure
    Caption,
    /// Table of contents
    TOC,
    /// Table of contents item
    TOCI,
    /// Index
    Index,
    /// Grouping without semantic meaning
    NonStruct,

    // Paragraph-level structure types
    /// Paragraph
    P,
    /// Heading (unnumbered)
    H,
    /// Heading level 1
    H1,
    /// Heading level 2
    H2,
    /// Heading level 3
    H3,
    /// Heading level 4
    H4,
    /// Heading level 5
    H5,
    /// Heading level 6
    H6,

    // List structure types
    /// List
    L,
    /// List item
    LI,
    /// Label (list item marker)
    Lbl,
    /// List body (list item content)
    LBody,

    // Table structure types
    /// Table
    Table,
    /// Table row
    TR,
    /// Table header cell
    TH,
    /// Table data cell
    TD,
    /// Table header group
    THead,
    /// Table body group
    TBody,
    /// Table footer group
    TFoot,

    // Inline structure types
    /// Span (inline generic)
    Span,
    /// Quote
    Quote,
    /// Note
    Note,
    /// Reference
    Reference,
    /// Bibliographic entry
    BibEntry,
    /// Code
    Code,
    /// Link
    Link,
    /// Annotation
    Annot,

    // Illustration structure types
    /// Figure
    Figure,
    /// Formula
    Formula,
    /// Form (input field)
    Form,

    /// Custom structure type not defined in the PDF specification
    Custom(String),
}

impl StructType {
    /// Name written to the `/S` entry and used as marked-content tag.
    pub fn as_name(&self) -> &str {
        match self {
            Self::Document => "Document",
            Self::Part => "Part",
            Self::Art => "Art",
            Self::Sect => "Sect",
            Self::Div => "Div",
            Self::BlockQuote => "BlockQuote",
            Self::Caption => "Caption",
            Self::TOC => "TOC",
            Self::TOCI => "TOCI",
            Self::Index => "Index",
            Self::NonStruct => "NonStruct",
            Self::P => "P",
            Self::H => "H",
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
            Self::H4 => "H4",
            Self::H5 => "H5",
            Self::H6 => "H6",
            Self::L => "L",
            Self::LI => "LI",
            Self::Lbl => "Lbl",
            Self::LBody => "LBody",
            Self::Table => "Table",
            Self::TR => "TR",
            Self::TH => "TH",
            Self::TD => "TD",
            Self::THead => "THead",
            Self::TBody => "TBody",
            Self::TFoot => "TFoot",
            Self::Span => "Span",
            Self::Quote => "Quote",
            Self::Note => "Note",
            Self::Reference => "Reference",
            Self::BibEntry => "BibEntry",
            Self::Code => "Code",
            Self::Link => "Link",
            Self::Annot => "Annot",
            Self::Figure => "Figure",
            Self::Formula => "Formula",
            Self::Form => "Form",
            Self::Custom(name) => name,
        }
    }

    /// Parse structure type from a name (e.g., "P" -> StructType::P)
    pub fn from_name(s: &str) -> Self {
        match s {
            "Document" => Self::Document,
            "Part" => Self::Part,
            "Art" => Self::Art,
            "Sect" => Self::Sect,
            "Div" => Self::Div,
            "BlockQuote" => Self::BlockQuote,
            "Caption" => Self::Caption,
            "TOC" => Self::TOC,
            "TOCI" => Self::TOCI,
            "Index" => Self::Index,
            "NonStruct" => Self::NonStruct,
            "P" => Self::P,
            "H" => Self::H,
            "H1" => Self::H1,
            "H2" => Self::H2,
            "H3" => Self::H3,
            "H4" => Self::H4,
            "H5" => Self::H5,
            "H6" => Self::H6,
            "L" => Self::L,
            "LI" => Self::LI,
            "Lbl" => Self::Lbl,
            "LBody" => Self::LBody,
            "Table" => Self::Table,
            "TR" => Self::TR,
            "TH" => Self::TH,
            "TD" => Self::TD,
            "THead" => Self::THead,
            "TBody" => Self::TBody,
            "TFoot" => Self::TFoot,
            "Span" => Self::Span,
            "Quote" => Self::Quote,
            "Note" => Self::Note,
            "Reference" => Self::Reference,
            "BibEntry" => Self::BibEntry,
            "Code" => Self::Code,
            "Link" => Self::Link,
            "Annot" => Self::Annot,
            "Figure" => Self::Figure,
            "Formula" => Self::Formula,
            "Form" => Self::Form,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Check if this is a heading type (H, H1-H6)
    pub fn is_heading(&self) -> bool {
        matches!(self, Self::H | Self::H1 | Self::H2 | Self::H3 | Self::H4 | Self::H5 | Self::H6)
    }

    /// Check if this is a grouping element that never holds content directly
    pub fn is_grouping(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Part
                | Self::Art
                | Self::Sect
                | Self::Div
                | Self::BlockQuote
                | Self::TOC
                | Self::Index
                | Self::NonStruct
                | Self::L
                | Self::Table
                | Self::THead
                | Self::TBody
                | Self::TFoot
                | Self::TR
        )
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name())
    }
}

impl From<&str> for StructType {
    fn from(s: &str) -> Self {
        Self::from_name(s)
    }
}

/// Optional entries of a structure element dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructOptions {
    /// Alternate description (`/Alt`), e.g. for figures and links
    pub alt: Option<String>,
    /// Replacement text (`/ActualText`)
    pub actual_text: Option<String>,
    /// Language of the element's content (`/Lang`)
    pub lang: Option<String>,
    /// Title of the element (`/T`)
    pub title: Option<String>,
    /// Expansion of an abbreviation (`/E`)
    pub expanded: Option<String>,
}

impl StructOptions {
    /// Set the alternate description.
    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    /// Set the replacement text.
    pub fn with_actual_text(mut self, text: impl Into<String>) -> Self {
        self.actual_text = Some(text.into());
        self
    }

    /// Set the language.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the abbreviation expansion.
    pub fn with_expanded(mut self, expanded: impl Into<String>) -> Self {
        self.expanded = Some(expanded.into());
        self
    }
}

/// Child of a structure element, in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKid {
    /// Nested structure element
    Element(ObjectRef),
    /// Marked-content sequence on a page
    MarkedContent {
        /// Page index
        page: usize,
        /// Marked Content ID
        mcid: u32,
    },
    /// Whole object (annotation or XObject) on a page
    Object {
        /// Page index
        page: usize,
        /// Referenced object
        object: ObjectRef,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_type_parsing() {
        assert_eq!(StructType::from_name("P"), StructType::P);
        assert_eq!(StructType::from_name("H1"), StructType::H1);
        assert_eq!(StructType::from("Document"), StructType::Document);

        match StructType::from_name("CustomType") {
            StructType::Custom(s) => assert_eq!(s, "CustomType"),
            _ => panic!("Expected Custom type"),
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for name in ["Document", "Sect", "TOCI", "LBody", "TH", "Link", "Formula", "Custom"] {
            assert_eq!(StructType::from_name(name).as_name(), name);
        }
        assert_eq!(StructType::H3.to_string(), "H3");
    }

    #[test]
    fn test_is_heading() {
        assert!(StructType::H1.is_heading());
        assert!(StructType::H.is_heading());
        assert!(!StructType::P.is_heading());
        assert!(!StructType::Document.is_heading());
    }

    #[test]
    fn test_is_grouping() {
        assert!(StructType::Document.is_grouping());
        assert!(StructType::Table.is_grouping());
        assert!(!StructType::P.is_grouping());
        assert!(!StructType::Link.is_grouping());
    }

    #[test]
    fn test_options_builder() {
        let options = StructOptions::default().with_alt("Logo").with_lang("fr-FR");
        assert_eq!(options.alt.as_deref(), Some("Logo"));
        assert_eq!(options.lang.as_deref(), Some("fr-FR"));
        assert!(options.title.is_none());
    }
}
