use pdfcarve_core::ObjectParams;

#[test]
fn test_get_int() {
    let params = ObjectParams::new(b"<< /Length 1234 /K -1 /Columns\r\n 80 >>");
    assert_eq!(params.get_int("/Length", 0, false), 1234);
    assert_eq!(params.get_int("/K", 0, false), -1);
    assert_eq!(params.get_int("/Columns", 0, false), 80);
    assert_eq!(params.find_int("/Rows", false), None);
    assert_eq!(params.get_int("/Rows", 7, false), 7);
}

#[test]
fn test_get_int_first_occurrence_wins() {
    let params = ObjectParams::new(b"<< /Length 5 /Length 9 >>");
    assert_eq!(params.get_int("/Length", 0, false), 5);
}

#[test]
fn test_get_int_skips_unsuitable_occurrences() {
    // A key glued to a name is not a match for an int; the next one is.
    let params = ObjectParams::new(b"<< /Length/Foo /Length 12 >>");
    assert_eq!(params.get_int("/Length", 0, false), 12);
}

#[test]
fn test_get_int_bool() {
    let params = ObjectParams::new(b"<< /BlackIs1 true /ImageMask FALSE /Decode [1 0] >>");
    assert_eq!(params.find_int("/BlackIs1", true), Some(1));
    assert_eq!(params.find_int("/ImageMask", true), Some(0));
    assert_eq!(params.find_int("/BlackIs1", false), None);
    assert!(params.get_bool("/BlackIs1", false));
    assert!(!params.get_bool("/ImageMask", true));
    assert!(params.get_bool("/Missing", true));
}

#[test]
fn test_get_int_indirect_reference_reads_object_number() {
    let params = ObjectParams::new(b"<< /Length 12 0 R >>");
    assert_eq!(params.get_int("/Length", 0, false), 12);
}

#[test]
fn test_get_string_name_and_array() {
    let params = ObjectParams::new(
        b"<< /Subtype /Image /Filter [ /ASCII85Decode /FlateDecode ] /ColorSpace/DeviceGray >>",
    );
    assert_eq!(params.get_string("/Subtype", b"", 64), b"/Image");
    assert_eq!(params.get_string("/Filter", b"", 64), b" /ASCII85Decode /FlateDecode ");
    assert_eq!(params.get_string("/ColorSpace", b"", 64), b"/DeviceGray");
    assert_eq!(params.get_string("/Missing", b"/None", 64), b"/None");
}

#[test]
fn test_get_string_truncates_to_capacity() {
    let params = ObjectParams::new(b"<< /Filter /FlateDecode >>");
    assert_eq!(params.get_string("/Filter", b"", 4), b"/Fla");
}

#[test]
fn test_get_string_unterminated_array() {
    let params = ObjectParams::new(b"<< /Filter [/AHx /LZW");
    assert_eq!(params.get_string("/Filter", b"", 64), b"/AHx /LZW");
}

#[test]
fn test_key_at_end_of_text() {
    let params = ObjectParams::new(b"<< /Length");
    assert_eq!(params.find_int("/Length", false), None);
    assert_eq!(params.find_string("/Length", 64), None);
}
