use filament::http::buffer::ReadBuffer;
use filament::http::request::{Method, ParseStage, RequestHead};

#[test]
fn test_request_method_from_bytes() {
    assert_eq!(Method::from_bytes(b"GET"), Some(Method::GET));
    assert_eq!(Method::from_bytes(b"CONNECT"), Some(Method::CONNECT));
    assert_eq!(Method::from_bytes(b"INVALID"), None);
    assert_eq!(Method::from_bytes(b"get"), None); // Case-sensitive
    assert_eq!(Method::from_bytes(b""), None);
}

#[test]
fn test_request_method_equality() {
    assert_eq!(Method::GET, Method::GET);
    assert_ne!(Method::GET, Method::POST);
}

#[test]
fn test_parse_stages_only_move_forward() {
    assert!(ParseStage::RequestLine < ParseStage::Headers);
    assert!(ParseStage::Headers < ParseStage::Content);
}

#[test]
fn test_empty_head_defaults() {
    let buf = ReadBuffer::new();
    let head = RequestHead::default();

    assert_eq!(head.method, None);
    assert_eq!(head.url(&buf), None);
    assert_eq!(head.host(&buf), None);
    assert_eq!(head.content_length(), 0);
    assert!(!head.keep_alive);
}

#[test]
fn test_empty_url_span_reads_as_root() {
    let mut buf = ReadBuffer::new();
    buf.push(b"GET http://example.com HTTP/1.1");
    let head = RequestHead {
        url: Some(buf.span(31, 31)),
        ..RequestHead::default()
    };

    assert_eq!(head.url(&buf), Some(&b"/"[..]));
}
