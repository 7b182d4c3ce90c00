use campus_api::{AnswerPayload, FrameParser, LatLng, StreamFrame};
use pretty_assertions::assert_eq;

#[test]
fn sse_framing_parses_reasoning_answer_and_done() {
    let payload = concat!(
        "data: {\"type\":\"reasoning\",\"content\":\"Locating the library\"}\n\n",
        "data: [DONE]\n\n",
        "data: {\"type\":\"answer\",\"content\":\"Head north for 200m.\"}\n\n",
        "data: {\"type\":\"done\"}\n\n"
    );

    let frames = FrameParser::parse_frames(payload);
    assert_eq!(
        frames,
        vec![
            StreamFrame::Reasoning {
                step: "Locating the library".to_string(),
            },
            StreamFrame::Answer {
                payload: AnswerPayload::text("Head north for 200m."),
            },
            StreamFrame::Done,
        ]
    );
}

#[test]
fn sse_parser_drops_malformed_and_keeps_unknown() {
    let payload = concat!(
        "data: {\"type\":\"heartbeat\",\"seq\":3}\n\n",
        "data: {broken-json\n\n",
        "data: {\"no_type\":true}\n\n",
        "data: {\"type\":\"reasoning\",\"content\":\"still going\"}\n\n"
    );

    let frames = FrameParser::parse_frames(payload);
    assert_eq!(frames.len(), 2);
    assert!(matches!(
        &frames[0],
        StreamFrame::Unknown { frame_type, .. } if frame_type == "heartbeat"
    ));
    assert_eq!(
        frames[1],
        StreamFrame::Reasoning {
            step: "still going".to_string(),
        }
    );
}

#[test]
fn sse_parser_reassembles_records_split_at_every_byte() {
    let payload = concat!(
        "data: {\"type\":\"reasoning\",\"content\":\"Step 1\"}\n\n",
        "data: {\"type\":\"reasoning\",\"content\":\"Step 2 \u{2192} caf\u{e9}\"}\n\n",
        "data: {\"type\":\"error\",\"content\":\"Route engine offline\"}\n\n"
    );
    let expected = FrameParser::parse_frames(payload);

    let mut parser = FrameParser::default();
    let mut frames = Vec::new();
    for byte in payload.as_bytes() {
        frames.extend(parser.feed(std::slice::from_ref(byte)));
    }

    assert_eq!(frames, expected);
    assert_eq!(frames.len(), 3);
    assert!(parser.is_empty_buffer());
}

#[test]
fn sse_parser_holds_partial_record_until_boundary() {
    let mut parser = FrameParser::default();
    assert!(parser
        .feed(b"data: {\"type\":\"reasoning\",\"content\":\"half")
        .is_empty());
    assert!(!parser.is_empty_buffer());

    let frames = parser.feed(b" done\"}\n\n");
    assert_eq!(
        frames,
        vec![StreamFrame::Reasoning {
            step: "half done".to_string(),
        }]
    );
}

#[test]
fn sse_parser_accepts_crlf_records() {
    let payload = "data: {\"type\":\"answer\",\"content\":\"ok\"}\r\n\r\n";
    let frames = FrameParser::parse_frames(payload);
    assert_eq!(
        frames,
        vec![StreamFrame::Answer {
            payload: AnswerPayload::text("ok"),
        }]
    );
}

#[test]
fn error_frame_without_text_gets_placeholder_message() {
    let frames = FrameParser::parse_frames("data: {\"type\":\"error\"}\n\n");
    assert_eq!(
        frames,
        vec![StreamFrame::Error {
            message: "unknown error".to_string(),
        }]
    );
}

#[test]
fn structured_answer_content_is_normalized() {
    let payload = concat!(
        "data: {\"type\":\"answer\",\"content\":{\"final_answer\":\"Take the east gate.\",",
        "\"distance_estimate\":\"420m\",",
        "\"route_coords\":[{\"lat\":8.5569,\"lng\":39.2911},{\"lat\":8.5575,\"lng\":39.2920}]},",
        "\"sources\":[\"campus_map.pdf\"]}\n\n"
    );

    let frames = FrameParser::parse_frames(payload);
    assert_eq!(
        frames,
        vec![StreamFrame::Answer {
            payload: AnswerPayload {
                answer: "Take the east gate.".to_string(),
                distance_estimate: Some("420m".to_string()),
                route_coords: vec![LatLng::new(8.5569, 39.2911), LatLng::new(8.5575, 39.2920)],
                sources: vec!["campus_map.pdf".to_string()],
            },
        }]
    );
}
