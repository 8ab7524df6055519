//! Tests for the grammar parser

use crate::{ArrayValue, FieldValue, PointError, Precision, parse_point, parse_points};

// =============================================================================
// Basic Parsing
// =============================================================================

#[test]
fn test_parse_simple_point() {
    let pt = parse_point(
        b"cpu,host=server01,region=uswest usage=0.64 1465839830100400200",
        0,
        Precision::Nanosecond,
    )
    .unwrap();

    assert_eq!(pt.name(), "cpu");
    assert_eq!(pt.tags().len(), 2);
    assert_eq!(pt.tags()[0].key, "host");
    assert_eq!(pt.tags()[0].value, "server01");
    assert_eq!(pt.tags()[1].key, "region");
    assert_eq!(pt.tags()[1].value, "uswest");
    assert_eq!(pt.time(), 1465839830100400200);

    let fields = pt.fields().unwrap();
    assert_eq!(fields["usage"], FieldValue::Float(0.64));
}

#[test]
fn test_parse_mixed_fields() {
    let pt = parse_point(
        b"m1 f_s=\"some-string\",f_b=F,f_f=1.0,f_i=2i,f_a=[1i,2i],f_u=32u 123",
        0,
        Precision::Nanosecond,
    )
    .unwrap();

    let fields = pt.fields().unwrap();
    assert_eq!(fields["f_s"], FieldValue::String("some-string".to_string()));
    assert_eq!(fields["f_b"], FieldValue::Boolean(false));
    assert_eq!(fields["f_f"], FieldValue::Float(1.0));
    assert_eq!(fields["f_i"], FieldValue::Integer(2));
    assert_eq!(fields["f_a"], FieldValue::Array(ArrayValue::Integer(vec![1, 2])));
    assert_eq!(fields["f_u"], FieldValue::Unsigned(32));
    assert_eq!(pt.time(), 123);
}

#[test]
fn test_parse_binary_field() {
    let pt = parse_point(b"m1 f_d=\"MTIzCg==\"b 123", 0, Precision::Nanosecond).unwrap();
    let fields = pt.fields().unwrap();
    assert_eq!(fields["f_d"], FieldValue::Binary(b"123\n".to_vec()));
    assert_eq!(pt.time(), 123);
}

#[test]
fn test_parse_binary_fields_at_every_position() {
    let pt = parse_point(
        b"m1 f_d_1st=\"MTIzCg==\"b,f_s=\"some-string\",f_d_middle=\"MTIzCg==\"b,f_b=F,f_f=1.0,f_i=2i,f_a=[1i,2i],f_u=32u,f_d_last=\"MTIzCg==\"b 123",
        0,
        Precision::Nanosecond,
    )
    .unwrap();

    let fields = pt.fields().unwrap();
    assert_eq!(fields["f_d_1st"], FieldValue::Binary(b"123\n".to_vec()));
    assert_eq!(fields["f_d_middle"], FieldValue::Binary(b"123\n".to_vec()));
    assert_eq!(fields["f_d_last"], FieldValue::Binary(b"123\n".to_vec()));
    assert_eq!(fields["f_s"], FieldValue::String("some-string".to_string()));
    assert_eq!(fields["f_b"], FieldValue::Boolean(false));
    assert_eq!(fields["f_f"], FieldValue::Float(1.0));
    assert_eq!(fields["f_i"], FieldValue::Integer(2));
    assert_eq!(fields["f_u"], FieldValue::Unsigned(32));
}

#[test]
fn test_parse_binary_array_with_trailing_comma() {
    let pt = parse_point(
        b"m1 f_d_arr=[\"MTIzCg==\"b,\"MTIzCg==\"b, ] 123",
        0,
        Precision::Nanosecond,
    )
    .unwrap();

    let fields = pt.fields().unwrap();
    assert_eq!(
        fields["f_d_arr"],
        FieldValue::Array(ArrayValue::Binary(vec![b"123\n".to_vec(), b"123\n".to_vec()]))
    );
}

#[test]
fn test_parse_no_fields_succeeds() {
    let pt = parse_point(b"m,k=v", 42, Precision::Nanosecond).unwrap();
    assert_eq!(pt.name(), "m");
    assert_eq!(pt.field_count(), 0);
    assert_eq!(pt.time(), 42);
    assert!(pt.fields().unwrap().is_empty());
}

// =============================================================================
// Tags
// =============================================================================

#[test]
fn test_tags_sorted_into_canonical_order() {
    let pt = parse_point(b"m,b=2,a=1,c=3 f=1i", 0, Precision::Nanosecond).unwrap();
    let keys: Vec<&str> = pt.tags().iter().map(|t| t.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn test_duplicate_tag_key_rejected() {
    let err = parse_point(b"m,a=1,a=2 f=1i", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(err, PointError::DuplicateTag { ref key } if key == "a"));
    assert!(err.is_syntax());
}

#[test]
fn test_missing_tag_value_rejected() {
    let err = parse_point(b"m,k= f=1i", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(err, PointError::Syntax { .. }));
}

#[test]
fn test_missing_tag_equals_rejected() {
    let err = parse_point(b"m,kv f=1i", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.to_string().contains("missing '=' in tag"));
}

#[test]
fn test_unescaped_equals_in_tag_value_rejected() {
    let err = parse_point(b"m,k=a=b f=1i", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn test_escaped_measurement_and_tags() {
    let pt = parse_point(
        b"my\\ meas,tag\\ key=va\\=lue f=1i 5",
        0,
        Precision::Nanosecond,
    )
    .unwrap();
    assert_eq!(pt.name(), "my meas");
    assert_eq!(pt.tags()[0].key, "tag key");
    assert_eq!(pt.tags()[0].value, "va=lue");
}

// =============================================================================
// Fields
// =============================================================================

#[test]
fn test_duplicate_field_key_rejected() {
    let err = parse_point(b"m f=1i,f=2i", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(err, PointError::DuplicateField { ref key } if key == "f"));
}

#[test]
fn test_string_field_keeps_delimiters() {
    let pt = parse_point(b"m f=\"a,b = c\" 1", 0, Precision::Nanosecond).unwrap();
    let fields = pt.fields().unwrap();
    assert_eq!(fields["f"], FieldValue::String("a,b = c".to_string()));
}

#[test]
fn test_invalid_suffix_after_quoted_value_rejected_at_parse() {
    // Only 'b' may follow a closing quote; anything else is a syntax
    // error, not a silent fallback to a string field
    let err = parse_point(
        b"m1 f_d=\"MTIzCg==\"x,f_s=\"some-string\",f_b=F,f_f=1.0,f_i=2i,f_a=[1i,2i],f_u=32u 123",
        0,
        Precision::Nanosecond,
    )
    .unwrap_err();
    assert!(matches!(err, PointError::Syntax { offset: 17, .. }));
}

#[test]
fn test_invalid_base64_parses_but_fails_decode() {
    let pt = parse_point(
        b"m1 f_d=\"invalid-base-64-string\"b,f_s=\"some-string\",f_b=F,f_f=1.0,f_i=2i,f_a=[1i,2i],f_u=32u 123",
        0,
        Precision::Nanosecond,
    )
    .unwrap();

    let err = pt.fields().unwrap_err();
    assert!(matches!(err, PointError::FieldDecode { ref key, .. } if key == "f_d"));
}

#[test]
fn test_empty_binary_parses_but_fails_decode() {
    let pt = parse_point(
        b"m1 f_d=\"\"b,f_s=\"some-string\" 123",
        0,
        Precision::Nanosecond,
    )
    .unwrap();

    let err = pt.fields().unwrap_err();
    assert!(matches!(err, PointError::FieldDecode { ref key, .. } if key == "f_d"));
}

#[test]
fn test_invalid_bare_value_rejected() {
    let err = parse_point(b"m f=abc", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.is_syntax());
    assert!(err.to_string().contains("invalid number"));
}

#[test]
fn test_negative_unsigned_rejected() {
    let err = parse_point(b"m f=-1u", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.to_string().contains("invalid unsigned integer"));
}

#[test]
fn test_malformed_float_rejected() {
    let err = parse_point(b"m f=1.2.3", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn test_integer_overflow_deferred_to_decode() {
    // Shape is valid at parse time; the range check happens at decode
    let pt = parse_point(b"m f=9223372036854775808i", 0, Precision::Nanosecond).unwrap();
    let err = pt.fields().unwrap_err();
    assert!(matches!(err, PointError::FieldDecode { ref key, .. } if key == "f"));
}

#[test]
fn test_missing_field_value_rejected() {
    let err = parse_point(b"m f=", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(err, PointError::Syntax { offset: 4, .. }));
}

#[test]
fn test_missing_field_equals_rejected() {
    let err = parse_point(b"m f", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.to_string().contains("missing '=' in field"));
}

#[test]
fn test_unterminated_string_rejected() {
    let err = parse_point(b"m f=\"abc 1", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(err, PointError::Syntax { offset: 4, .. }));
    assert!(err.to_string().contains("unterminated string"));
}

#[test]
fn test_unbalanced_brackets_rejected() {
    let err = parse_point(b"m f=[1i,2i 1", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.to_string().contains("unbalanced brackets"));
}

// =============================================================================
// Timestamps
// =============================================================================

#[test]
fn test_default_timestamp_when_absent() {
    let pt = parse_point(b"m f=1i", 987, Precision::Nanosecond).unwrap();
    assert_eq!(pt.time(), 987);
}

#[test]
fn test_explicit_timestamp() {
    let pt = parse_point(b"m f=1i 1465839830100400200", 0, Precision::Nanosecond).unwrap();
    assert_eq!(pt.time(), 1465839830100400200);
}

#[test]
fn test_negative_timestamp() {
    let pt = parse_point(b"m f=1i -5", 0, Precision::Nanosecond).unwrap();
    assert_eq!(pt.time(), -5);
}

#[test]
fn test_precision_scales_to_nanoseconds() {
    let pt = parse_point(b"m f=1i 1465839830100", 0, Precision::Millisecond).unwrap();
    assert_eq!(pt.time(), 1465839830100 * 1_000_000);

    let pt = parse_point(b"m f=1i 1465839830", 0, Precision::Second).unwrap();
    assert_eq!(pt.time(), 1465839830 * 1_000_000_000);
}

#[test]
fn test_invalid_timestamp_rejected() {
    let err = parse_point(b"m f=1i abc", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(
        err,
        PointError::InvalidTimestamp { offset: 7, ref token } if token == "abc"
    ));
}

#[test]
fn test_timestamp_overflow_on_scaling_rejected() {
    let err = parse_point(b"m f=1i 9223372036854775807", 0, Precision::Second).unwrap_err();
    assert!(matches!(err, PointError::InvalidTimestamp { .. }));
}

#[test]
fn test_precision_parse() {
    assert_eq!(Precision::parse("n"), Some(Precision::Nanosecond));
    assert_eq!(Precision::parse("ns"), Some(Precision::Nanosecond));
    assert_eq!(Precision::parse("u"), Some(Precision::Microsecond));
    assert_eq!(Precision::parse("ms"), Some(Precision::Millisecond));
    assert_eq!(Precision::parse("s"), Some(Precision::Second));
    assert_eq!(Precision::parse("h"), None);
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn test_parse_points_batch() {
    let pts = parse_points(
        b"m1 f=1i 1\n\nm2 f=2i 2\n   \nm3 f=3i 3\n",
        0,
        Precision::Nanosecond,
    )
    .unwrap();
    assert_eq!(pts.len(), 3);
    assert_eq!(pts[0].name(), "m1");
    assert_eq!(pts[1].name(), "m2");
    assert_eq!(pts[2].name(), "m3");
}

#[test]
fn test_parse_points_crlf() {
    let pts = parse_points(b"m f=1i 1\r\nm2 f=2i 2\r\n", 0, Precision::Nanosecond).unwrap();
    assert_eq!(pts.len(), 2);
    assert_eq!(pts[1].time(), 2);
}

#[test]
fn test_parse_points_newline_inside_quoted_string() {
    let pts = parse_points(b"m f=\"a\nb\" 7\nm2 g=1i 8", 0, Precision::Nanosecond).unwrap();
    assert_eq!(pts.len(), 2);
    let fields = pts[0].fields().unwrap();
    assert_eq!(fields["f"], FieldValue::String("a\nb".to_string()));
}

#[test]
fn test_parse_points_error_reports_absolute_offset() {
    let err = parse_points(b"m f=1i 1\nm f=^ 2", 0, Precision::Nanosecond).unwrap_err();
    assert!(matches!(err, PointError::Syntax { offset: 13, .. }));
}

#[test]
fn test_parse_points_empty_input() {
    let pts = parse_points(b"", 0, Precision::Nanosecond).unwrap();
    assert!(pts.is_empty());
}

#[test]
fn test_parse_point_rejects_trailing_content() {
    let err = parse_point(b"m f=1i 1\nextra", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn test_parse_empty_point_rejected() {
    assert!(parse_point(b"", 0, Precision::Nanosecond).is_err());
    assert!(parse_point(b"\n", 0, Precision::Nanosecond).is_err());
}

#[test]
fn test_missing_measurement_rejected() {
    let err = parse_point(b",k=v f=1i", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.to_string().contains("missing measurement name"));
}

#[test]
fn test_invalid_utf8_rejected() {
    let err = parse_point(b"m f=\"\xff\xfe\" 1", 0, Precision::Nanosecond).unwrap_err();
    assert!(err.is_syntax());
}
