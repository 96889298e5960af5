use pdf_objects::pdf::parser::Parser;
use pdf_objects::{
    parse_object, CryptEngine, CryptMethod, Obj, PdfError, PdfResult, Serializer, XRefTable,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Dictionary nested `depth` levels deep, alternating with arrays, with a
/// mix of scalar leaves at every level.
fn nested_graph(depth: usize) -> PdfResult<Obj> {
    let root = Obj::new_dict(None, 4);
    let mut current = root.clone();
    for level in 0..depth {
        current.dict_put_int("Level", level as i64)?;
        current.dict_put_real("Scale", 0.5 + level as f32)?;
        current.dict_put_string("Label", format!("level ({level})\n").as_bytes())?;
        current.dict_put_name("Kind", if level % 2 == 0 { "Even" } else { "Odd Level" })?;
        current.dict_put_bool("Leaf", level + 1 == depth)?;

        let kids = current.dict_put_array("Kids", 2)?;
        kids.array_push(&Obj::null())?;
        kids.array_push(&Obj::new_hex_string(&[0, 0xFF, level as u8]))?;
        let child = kids.array_push_dict(4)?;
        current = child;
    }
    Ok(root)
}

#[rstest]
#[case(1, false)]
#[case(5, true)]
#[case(20, false)]
#[case(20, true)]
fn test_nested_graph_round_trip(#[case] depth: usize, #[case] tight: bool) -> PdfResult<()> {
    let graph = nested_graph(depth)?;
    let bytes = graph.to_pdf_bytes(tight)?;
    let parsed = parse_object(&bytes)?;
    assert!(parsed.compare(&graph).is_equal());
    assert_eq!(parsed.to_pdf_bytes(tight)?, bytes);
    Ok(())
}

#[test_log::test]
fn test_reference_format() -> PdfResult<()> {
    let doc = XRefTable::new();
    let r = doc.new_indirect(12, 0)?;
    assert_eq!(r.to_pdf_bytes(true)?, b"12 0 R".to_vec());
    assert_eq!(r.to_pdf_bytes(false)?, b"12 0 R".to_vec());

    let parsed = Parser::new(b"12 0 R").with_document(doc.doc_ref()).parse_object()?;
    assert!(parsed.is_indirect());
    assert_eq!((parsed.to_num(), parsed.to_gen()), (12, 0));
    Ok(())
}

#[test_log::test]
fn test_name_and_string_escapes() -> PdfResult<()> {
    let arr = Obj::new_array(None, 3);
    arr.array_push_name("A B#C")?;
    arr.array_push_string(b"(nested) back\\slash\r\n\x01")?;
    arr.array_push(&Obj::new_hex_string(b"\x00\x10"))?;

    let bytes = arr.to_pdf_bytes(true)?;
    let parsed = parse_object(&bytes)?;
    assert_eq!(parsed.array_get_name(0).as_str(), "A B#C");
    assert_eq!(parsed.array_get_string(1), b"(nested) back\\slash\r\n\x01".to_vec());
    assert!(parsed.array_get(2)?.is_hex_string());
    assert_eq!(parsed, arr);
    Ok(())
}

#[rstest]
#[case(CryptMethod::Rc4, 5)]
#[case(CryptMethod::AesV2, 16)]
#[case(CryptMethod::AesV3, 32)]
fn test_encrypted_round_trip(#[case] method: CryptMethod, #[case] key_len: usize) -> PdfResult<()> {
    let engine = CryptEngine::new(method, &vec![0x2A; key_len])?;
    let info = Obj::new_dict(None, 2);
    info.dict_put_string("Title", b"Quarterly report")?;
    info.dict_put_int("Pages", 3)?;

    let mut out = Vec::new();
    Serializer::new()
        .crypt(&engine, 8, 0)
        .print_indirect_object(&mut out, 8, 0, &info, None)?;

    let body = Parser::new(&out).parse_indirect_object()?;
    assert_eq!((body.num, body.gen), (8, 0));
    let encrypted = body.obj.dict_get_string("Title");
    assert_ne!(encrypted, b"Quarterly report".to_vec());
    assert_eq!(engine.decrypt_bytes(&encrypted, 8, 0)?, b"Quarterly report".to_vec());
    assert_eq!(body.obj.dict_get_int("Pages"), 3);
    Ok(())
}

#[test_log::test]
fn test_document_round_trip() -> PdfResult<()> {
    let doc = XRefTable::new();
    let pages = Obj::new_dict(Some(&doc.doc_ref()), 3);
    pages.dict_put_name("Type", "Pages")?;
    pages.dict_put_array("Kids", 0)?;
    pages.dict_put_int("Count", 0)?;
    let pages_ref = doc.add_object(pages.clone())?;

    let page = Obj::new_dict(Some(&doc.doc_ref()), 2);
    page.dict_put_name("Type", "Page")?;
    page.dict_put("Parent", &pages_ref)?;
    page.dict_put_drop("MediaBox", Obj::new_rect(None, pdf_objects::Rect::new(0.0, 0.0, 612.0, 792.0)))?;
    let page_ref = doc.add_object(page)?;

    pages.dict_get("Kids")?.array_push(&page_ref)?;
    pages.dict_put_int("Count", 1)?;
    assert_eq!(doc.altered(), vec![1]);

    let mut out = Vec::new();
    doc.write_objects(&mut out, &Serializer::new(), false)?;

    let copy = XRefTable::new();
    assert_eq!(copy.load(&out)?, 2);
    let reloaded = copy.get(2).ok_or(PdfError::ObjectNumberOutOfRange(2))?;
    let parent = reloaded.dict_get("Parent")?;
    assert_eq!(parent.dict_get_int("Count"), 1);
    assert_eq!(reloaded.dict_get_rect("MediaBox").width(), 612.0);
    assert_eq!(parent.dict_getp("Kids/0").to_num(), 2);
    Ok(())
}
