//! Integration tests for tagged PDF output.
//!
//! Tests the logical structure tree written by the document layer:
//! - Element dictionaries (/S, /P, /Pg, /K) and reading order
//! - Parent tree entries for marked content
//! - Marked-content references across pages and object references
//! - Duplicate and missing marked-content identifiers

use pdf_weave::structure::{StructKid, StructureTree};
use pdf_weave::{
    DocumentConfig, Error, ObjectRef, PageSize, PdfDocument, StructOptions, StructType,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tagged() -> PdfDocument<Vec<u8>> {
    init_logging();
    let config = DocumentConfig::new().with_compress(false).with_tagged(true);
    PdfDocument::new(Vec::new(), config).unwrap()
}

fn finish(doc: PdfDocument<Vec<u8>>) -> String {
    String::from_utf8_lossy(&doc.end().unwrap()).into_owned()
}

fn p() -> StructType {
    StructType::P
}

mod element_tests {
    use super::*;

    #[test]
    fn test_document_with_one_paragraph() {
        let mut doc = tagged();
        let root = doc.structure_root().unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        let para = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        let mcid = doc
            .mark_content(para, |c| c.write(b"BT (Hello) Tj ET\n"))
            .unwrap();
        assert_eq!(mcid, 0);

        let _ = doc.end_structure(para).unwrap();
        let _ = doc.end_structure(root).unwrap();
        let page = doc.page_ref(0).unwrap();
        let out = finish(doc);

        assert!(out.contains(&format!(
            "{} obj\n<<\n/Type /StructElem\n/S /Document\n/P 3 0 R\n/K [{}]\n>>",
            root.to_string().trim_end_matches(" R"),
            para
        )));
        assert!(out.contains(&format!("/S /P\n/P {}\n/Pg {}\n/K [0]\n>>", root, page)));
        assert!(out.contains(&format!("/Nums [0 [{}]]", para)));
        assert!(out.contains("/Type /StructTreeRoot\n/K [4 0 R]\n"));
        assert!(out.contains("/ParentTreeNextKey 1"));
    }

    #[test]
    fn test_kids_keep_call_order() {
        let mut doc = tagged();
        let sect = doc
            .begin_structure(None, StructType::Sect, StructOptions::default())
            .unwrap();
        let kids: Vec<ObjectRef> = [StructType::H1, p(), StructType::Figure, p()]
            .into_iter()
            .map(|role| doc.begin_structure(Some(sect), role, StructOptions::default()).unwrap())
            .collect();
        let out = finish(doc);

        let expected = kids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        assert!(out.contains(&format!("/S /Sect\n/P 4 0 R\n/K [{}]", expected)));
    }

    #[test]
    fn test_open_elements_end_children_first() {
        let mut doc = tagged();
        doc.add_page(PageSize::A4).unwrap();
        let table = doc
            .begin_structure(None, StructType::Table, StructOptions::default())
            .unwrap();
        let row = doc
            .begin_structure(Some(table), StructType::TR, StructOptions::default())
            .unwrap();
        let cell = doc
            .begin_structure(Some(row), StructType::TD, StructOptions::default())
            .unwrap();
        doc.mark_content(cell, |c| c.write(b"(42) Tj\n")).unwrap();

        // Nothing ended explicitly
        let out = finish(doc);
        assert!(out.contains(&format!("/S /TD\n/P {}\n", row)));
        assert!(out.contains(&format!("/S /TR\n/P {}\n", table)));
        assert!(out.contains(&format!("/K [{}]", cell)));
        assert!(out.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_element_options() {
        let mut doc = tagged();
        let options = StructOptions::default()
            .with_alt("Company logo")
            .with_lang("en-GB")
            .with_title("Logo");
        let figure = doc.begin_structure(None, StructType::Figure, options).unwrap();
        let abbr = doc
            .begin_structure(
                None,
                StructType::Span,
                StructOptions::default().with_expanded("Portable Document Format"),
            )
            .unwrap();
        let _ = doc.end_structure(figure).unwrap();
        let _ = doc.end_structure(abbr).unwrap();
        let out = finish(doc);

        assert!(out.contains("/Alt (Company logo)\n/Lang (en-GB)\n/T (Logo)"));
        assert!(out.contains("/E (Portable Document Format)"));
    }

    #[test]
    fn test_custom_role_used_as_tag() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let note = doc
            .begin_structure(None, "Sidebar", StructOptions::default())
            .unwrap();
        doc.mark_content(note, |c| c.write(b"(aside) Tj\n")).unwrap();
        let out = finish(doc);
        assert!(out.contains("/Sidebar <</MCID 0>> BDC\n(aside) Tj\nEMC\n"));
        assert!(out.contains("/S /Sidebar"));
    }

    #[test]
    fn test_ended_element_rejects_content() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let para = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        let _ = doc.end_structure(para).unwrap();
        assert!(matches!(
            doc.mark_content(para, |_| Ok(())),
            Err(Error::InvalidState { state: "ended", .. })
        ));
        assert!(matches!(
            doc.end_structure(para),
            Err(Error::InvalidState { state: "ended", .. })
        ));
    }

    #[test]
    fn test_non_element_handle() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let page = doc.page_ref(0).unwrap();
        assert!(matches!(
            doc.mark_content(page, |_| Ok(())),
            Err(Error::NotAStructureElement(_))
        ));
    }
}

mod marked_content_tests {
    use super::*;

    #[test]
    fn test_content_on_other_pages_uses_mcr() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let para = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        doc.mark_content(para, |c| c.write(b"(first half) Tj\n")).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        doc.mark_content(para, |c| c.write(b"(second half) Tj\n")).unwrap();

        let first = doc.page_ref(0).unwrap();
        let second = doc.page_ref(1).unwrap();
        let out = finish(doc);

        assert!(out.contains(&format!(
            "/Pg {}\n/K [0 <<\n/Type /MCR\n/Pg {}\n/MCID 0\n>>]",
            first, second
        )));
        assert!(out.contains(&format!("/Nums [0 [{p}] 1 [{p}]]", p = para)));
        assert!(out.contains("/StructParents 1"));
        assert!(out.contains("/ParentTreeNextKey 2"));
    }

    #[test]
    fn test_mcids_are_per_page() {
        let mut doc = tagged();
        let a = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        let b = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        assert_eq!(doc.mark_content(a, |_| Ok(())).unwrap(), 0);
        assert_eq!(doc.mark_content(b, |_| Ok(())).unwrap(), 1);
        doc.add_page(PageSize::LETTER).unwrap();
        assert_eq!(doc.mark_content(b, |_| Ok(())).unwrap(), 0);

        let out = finish(doc);
        assert!(out.contains(&format!("/Nums [0 [{} {}] 1 [{}]]", a, b, b)));
    }

    #[test]
    fn test_duplicate_claim_rejected() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let first = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        let second = doc.begin_structure(None, p(), StructOptions::default()).unwrap();

        doc.claim(first, 0, 3).unwrap();
        match doc.claim(second, 0, 3) {
            Err(Error::DuplicateMarkedContent { page, mcid }) => assert_eq!((page, mcid), (0, 3)),
            other => panic!("expected DuplicateMarkedContent, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_mcid_fails_end() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let para = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        doc.claim(para, 0, 1).unwrap();
        assert!(matches!(
            doc.end(),
            Err(Error::MissingMarkedContent { page: 0, mcid: 0 })
        ));
    }

    #[test]
    fn test_claimed_ids_skip_assignment() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let para = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        doc.claim(para, 0, 0).unwrap();
        assert_eq!(doc.mark_content(para, |_| Ok(())).unwrap(), 1);
    }

    #[test]
    fn test_annotation_as_object_reference() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let link = doc
            .begin_structure(None, StructType::Link, StructOptions::default().with_alt("Home page"))
            .unwrap();
        let annot = doc.writer().allocate(Default::default()).unwrap();
        assert!(matches!(doc.add_object(link, 5, annot), Err(Error::UnknownPage(5))));
        // Page 0 holds key 0, so the annotation gets the next one
        assert_eq!(doc.add_object(link, 0, annot).unwrap(), 1);
        let _ = doc.writer().finalize(annot).unwrap();

        let page = doc.page_ref(0).unwrap();
        let out = finish(doc);
        assert!(out.contains(&format!(
            "/K [<<\n/Type /OBJR\n/Pg {}\n/Obj {}\n>>]",
            page, annot
        )));
        assert!(out.contains(&format!("{} obj\n<<\n/StructParent 1\n>>", annot.id)));
        assert!(out.contains(&format!("/Nums [1 {}]", link)));
        assert!(out.contains("/ParentTreeNextKey 2"));
    }

    #[test]
    fn test_annotation_keys_follow_pages() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let link = doc
            .begin_structure(None, StructType::Link, StructOptions::default())
            .unwrap();
        doc.mark_content(link, |c| c.write(b"(Home) Tj\n")).unwrap();
        let annot = doc.writer().allocate(Default::default()).unwrap();
        assert_eq!(doc.add_object(link, 0, annot).unwrap(), 1);
        let _ = doc.writer().finalize(annot).unwrap();
        doc.add_page(PageSize::LETTER).unwrap();
        doc.mark_content(link, |c| c.write(b"(continued) Tj\n")).unwrap();

        let out = finish(doc);
        // The second page's key comes after the annotation's
        assert!(out.contains("/StructParents 2"));
        assert!(out.contains(&format!("/Nums [0 [{l}] 1 {l} 2 [{l}]]", l = link)));
        assert!(out.contains("/ParentTreeNextKey 3"));
    }

    #[test]
    fn test_annotation_must_be_open() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let link = doc
            .begin_structure(None, StructType::Link, StructOptions::default())
            .unwrap();
        let annot = doc.writer().allocate(Default::default()).unwrap();
        let _ = doc.writer().finalize(annot).unwrap();
        assert!(matches!(
            doc.add_object(link, 0, annot),
            Err(Error::InvalidState { state: "finalizing", .. })
        ));
    }

    #[test]
    fn test_claim_of_huge_mcid_fails_at_end() {
        let mut doc = tagged();
        doc.add_page(PageSize::LETTER).unwrap();
        let para = doc.begin_structure(None, p(), StructOptions::default()).unwrap();
        doc.claim(para, 0, u32::MAX).unwrap();
        assert!(matches!(
            doc.end(),
            Err(Error::MissingMarkedContent { page: 0, mcid: 0 })
        ));
    }
}

mod tree_tests {
    use super::*;

    #[test]
    fn test_post_order_of_open_elements() {
        let r = |id| ObjectRef::new(id, 0);
        let mut tree = StructureTree::new(r(1), r(2));
        tree.add_element(r(3), r(2), StructType::Sect, StructOptions::default())
            .unwrap();
        tree.add_element(r(4), r(3), p(), StructOptions::default()).unwrap();
        tree.add_element(r(5), r(2), p(), StructOptions::default()).unwrap();
        tree.end_element(r(5), &[]).unwrap();

        assert_eq!(tree.open_elements(), vec![r(4), r(3), r(2)]);
        assert_eq!(
            tree.node(r(2)).unwrap().kids,
            vec![StructKid::Element(r(3)), StructKid::Element(r(5))]
        );
    }
}
