use std::io::Cursor;

use flightgroup::common::config::CodecConfig;
use flightgroup::common::exception::CodecError;
use flightgroup::network::{Codec, ContentType, Header};
use serde::{Deserialize, Serialize};

use crate::{assert_err, assert_ok};
use crate::common::logger::init_test_logger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SumArgs {
    numbers: Vec<i64>,
    label: String,
}

#[test]
fn test_request_reply_sequence_for_every_content_type() {
    init_test_logger();
    let config = CodecConfig::default();

    for content_type in ContentType::ALL {
        let mut writer = content_type.new_codec(Cursor::new(Vec::new()), &config);
        assert_eq!(writer.content_type(), content_type);

        let args = SumArgs {
            numbers: vec![1, 2, 3],
            label: "first".to_string(),
        };
        assert_ok!(writer.write(&Header::new("Arith.Sum", 1), &args));
        assert_ok!(writer.write(
            &Header::new("Arith.Divide", 2).with_error("divide by zero"),
            &()
        ));
        assert_ok!(writer.write(&Header::new("Arith.Sum", 3), &42i64));

        let mut stream = writer.into_inner();
        stream.set_position(0);
        let mut reader = content_type.new_codec(stream, &config);

        let header = assert_ok!(reader.read_header(), "first header via {}", content_type);
        assert_eq!(header, Header::new("Arith.Sum", 1));
        assert_eq!(assert_ok!(reader.read_body::<SumArgs>()), args);

        let header = assert_ok!(reader.read_header());
        assert!(header.is_error());
        assert_eq!(header.seq, 2);
        assert_ok!(reader.skip_body());

        let header = assert_ok!(reader.read_header());
        assert_eq!(header.seq, 3);
        assert_eq!(assert_ok!(reader.read_body::<i64>()), 42);

        assert!(matches!(reader.read_header(), Err(CodecError::Closed)));
    }
}

#[test]
fn test_body_larger_than_limit_is_rejected() {
    let config = CodecConfig::default().with_max_frame_size(64);

    for content_type in ContentType::ALL {
        let mut writer = content_type.new_codec(Cursor::new(Vec::new()), &config);
        let body = "x".repeat(256);
        let err = assert_err!(
            writer.write(&Header::new("Echo.Say", 1), &body),
            "{} accepted an oversize body",
            content_type
        );
        assert!(matches!(err, CodecError::FrameTooLarge { limit: 64, .. }));
    }
}

#[test]
fn test_reader_limit_applies_to_incoming_frames() {
    let generous = CodecConfig::default();
    let strict = CodecConfig::default().with_max_frame_size(16);

    let mut writer = ContentType::Json.new_codec(Cursor::new(Vec::new()), &generous);
    assert_ok!(writer.write(&Header::new("Echo.Say", 1), &"hello"));

    let mut stream = writer.into_inner();
    stream.set_position(0);
    let mut reader = ContentType::Json.new_codec(stream, &strict);
    assert!(matches!(
        reader.read_header(),
        Err(CodecError::FrameTooLarge { limit: 16, .. })
    ));
}

#[test]
fn test_mismatched_content_types_fail_to_decode() {
    let config = CodecConfig::default();

    let mut writer = ContentType::Bincode.new_codec(Cursor::new(Vec::new()), &config);
    assert_ok!(writer.write(&Header::new("Arith.Sum", 9), &7u32));

    let mut stream = writer.into_inner();
    stream.set_position(0);
    let mut reader = ContentType::Json.new_codec(stream, &config);
    assert!(matches!(reader.read_header(), Err(CodecError::Decode(_))));
}

#[test]
fn test_codec_selected_from_config() {
    let config = CodecConfig::from_toml_str(
        r#"
        content_type = "application/json"
        max_frame_size = 1024
        "#,
    )
    .unwrap();

    let codec = config
        .content_type
        .new_codec(Cursor::new(Vec::new()), &config);
    assert_eq!(codec.content_type(), ContentType::Json);
    assert!(codec.get_ref().get_ref().is_empty());
}

#[test]
fn test_stream_ending_after_header_is_io_error() {
    let config = CodecConfig::default();

    for content_type in ContentType::ALL {
        let mut writer = content_type.new_codec(Cursor::new(Vec::new()), &config);
        assert_ok!(writer.write(&Header::new("Arith.Sum", 1), &5u32));

        // Keep only the header frame.
        let mut bytes = writer.into_inner().into_inner();
        let header_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        bytes.truncate(4 + header_len);

        let mut reader = content_type.new_codec(Cursor::new(bytes.clone()), &config);
        assert_ok!(reader.read_header());
        let err = assert_err!(reader.read_body::<u32>(), "body via {}", content_type);
        assert!(matches!(err, CodecError::Io(_)));

        let mut reader = content_type.new_codec(Cursor::new(bytes), &config);
        assert_ok!(reader.read_header());
        assert!(matches!(assert_err!(reader.skip_body()), CodecError::Io(_)));
    }
}

#[test]
fn test_stream_ending_inside_length_prefix_is_io_error() {
    let config = CodecConfig::default();

    for content_type in ContentType::ALL {
        let mut reader = content_type.new_codec(Cursor::new(vec![0u8, 0]), &config);
        let err = assert_err!(reader.read_header(), "header via {}", content_type);
        assert!(matches!(err, CodecError::Io(_)));
    }
}
