use groundlink::protocol::*;
use groundlink::TransmitIntent;

#[test]
fn test_parse_splits_signature_function_and_payload() {
    let frame = parse("FOSSASAT-19S12.4V");

    assert_eq!(frame.signature, "FOSSASAT-1");
    assert_eq!(frame.function_id, "9");
    assert_eq!(frame.payload, "S12.4V");
    assert_eq!(frame.function(), Some(FunctionId::PowerInfo));
}

#[test]
fn test_parse_without_marker_keeps_whole_remainder_as_function_id() {
    let frame = parse("SIGNATURE13");

    assert_eq!(frame.signature, "SIGNATURE1");
    assert_eq!(frame.function_id, "3");
    assert_eq!(frame.payload, "");

    // Junk after the id without a marker stays in the id and fails lookup
    let frame = parse("SIGNATURE13xyz");
    assert_eq!(frame.function_id, "3xyz");
    assert_eq!(frame.payload, "");
    assert_eq!(frame.function(), None);
}

#[test]
fn test_parse_two_digit_function_id() {
    let frame = parse("FOSSASAT-110S125.0");

    assert_eq!(frame.function_id, "10");
    assert_eq!(frame.payload, "S125.0");
    assert_eq!(frame.function(), Some(FunctionId::TransceiverSettings));
}

#[test]
fn test_marker_inside_signature_is_not_a_split_point() {
    // 'S' appears in the signature; only the remainder is searched
    let frame = parse("SSSSSSSSSS4");

    assert_eq!(frame.signature, "SSSSSSSSSS");
    assert_eq!(frame.function_id, "4");
    assert_eq!(frame.payload, "");
}

#[test]
fn test_payload_starts_at_first_marker() {
    let frame = parse("FOSSASAT-19SAS2");

    assert_eq!(frame.function_id, "9");
    assert_eq!(frame.payload, "SAS2");
}

#[test]
fn test_empty_function_id_when_marker_follows_signature() {
    let frame = parse("FOSSASAT-1S3.3V");

    assert_eq!(frame.function_id, "");
    assert_eq!(frame.payload, "S3.3V");
    assert_eq!(frame.function(), None);
}

#[test]
fn test_parse_is_total_for_frames_of_signature_length_and_longer() {
    let bodies = ["", "1", "10", "S", "9S", "123456789", "S S S", "\u{0}\u{1}", "ÄÖÜ", "10S€"];

    for prefix_len in 10..16 {
        let prefix: String = "ABCDEFGHIJKLMNOP".chars().take(prefix_len).collect();
        for body in bodies {
            let raw = format!("{}{}", prefix, body);
            let frame = parse(&raw);

            let expected_signature: String = raw.chars().take(SIGNATURE_LEN).collect();
            assert_eq!(frame.signature, expected_signature, "raw {:?}", raw);
            assert_eq!(
                format!("{}{}{}", frame.signature, frame.function_id, frame.payload),
                raw,
                "fields must cover the whole frame"
            );
            assert!(frame.payload.is_empty() || frame.payload.starts_with(DEFAULT_PAYLOAD_MARKER));
        }
    }
}

#[test]
fn test_parse_multibyte_signature_counts_characters() {
    let raw = "ÄÖÜßéèêëïî6";
    let frame = parse(raw);

    assert_eq!(frame.signature, "ÄÖÜßéèêëïî");
    assert_eq!(frame.signature.chars().count(), SIGNATURE_LEN);
    assert_eq!(frame.function_id, "6");
    assert_eq!(frame.function(), Some(FunctionId::Pong));
}

#[test]
fn test_parse_short_frame_degrades_gracefully() {
    let frame = parse("FOSSA");
    assert_eq!(frame.signature, "FOSSA");
    assert_eq!(frame.function_id, "");
    assert_eq!(frame.payload, "");

    let frame = parse("");
    assert_eq!(frame.signature, "");
    assert_eq!(frame.function(), None);
}

#[test]
fn test_parse_with_custom_marker() {
    let frame = parse_with_marker("FOSSASAT-19#12.4V", '#');

    assert_eq!(frame.function_id, "9");
    assert_eq!(frame.payload, "#12.4V");
}

#[test]
fn test_function_id_tags_are_unique_and_round_trip() {
    let all = [
        FunctionId::StartedSignal,
        FunctionId::StoppedSignal,
        FunctionId::TransmittedOnline,
        FunctionId::DeploymentSuccess,
        FunctionId::Ping,
        FunctionId::Pong,
        FunctionId::StopTransmitting,
        FunctionId::StartTransmitting,
        FunctionId::PowerInfo,
        FunctionId::TransceiverSettings,
    ];

    for function in all {
        assert_eq!(FunctionId::from_tag(function.tag()), Some(function));
    }
    assert_eq!(FunctionId::from_tag("11"), None);
    assert_eq!(FunctionId::from_tag("01"), None);
}

#[test]
fn test_encode_outbound_frames() {
    let ping = encode_outbound("FOSSASAT-1", TransmitIntent::Ping).unwrap();
    let stop = encode_outbound("FOSSASAT-1", TransmitIntent::StopTransmitting).unwrap();
    let start = encode_outbound("FOSSASAT-1", TransmitIntent::StartTransmitting).unwrap();

    assert_eq!(ping.as_str(), "FOSSASAT-15");
    assert_eq!(stop.as_str(), "FOSSASAT-17");
    assert_eq!(start.as_str(), "FOSSASAT-18");

    // Uplink frames parse back to uplink-only ids
    assert!(parse(&ping).function().unwrap().is_uplink());
}

#[test]
fn test_encode_outbound_rejects_oversized_signature() {
    let signature = "X".repeat(MAX_FRAME_SIZE);
    let result = encode_outbound(&signature, TransmitIntent::Ping);
    assert_eq!(result.unwrap_err(), ProtocolError::MessageTooLarge);
}
