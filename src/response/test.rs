use std::time::{Duration, UNIX_EPOCH};

use super::ResponseWriter;
use crate::status::StatusCode;

fn at(secs: u64) -> std::time::SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_status_line() {
    for (code, line) in [
        (200, "HTTP/1.0 200 OK\r\n"),
        (201, "HTTP/1.0 201 Created\r\n"),
        (404, "HTTP/1.0 404 Not Found\r\n"),
        (301, "HTTP/1.0 301 Moved Permanently\r\n"),
    ] {
        let mut writer = ResponseWriter::default();
        writer.set_status(code).unwrap();
        let marshaled = writer.response.marshal();
        assert!(marshaled.starts_with(line.as_bytes()), "{code}");
    }
}

#[test]
fn test_set_status_rejects_unregistered() {
    let mut writer = ResponseWriter::default();
    assert!(writer.set_status(418).is_err());
    assert!(writer.set_status(0).is_err());
    assert_eq!(writer.status(), StatusCode::OK);

    writer.set_status(204).unwrap();
    assert_eq!(writer.status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_default_response() {
    let writer = ResponseWriter::default();
    let marshaled = writer.response.marshal();
    let text = String::from_utf8(marshaled).unwrap();

    assert!(text.starts_with("HTTP/1.0 200 OK\r\nDate: "));
    assert!(text.ends_with("Content-Type: application/octet-stream\r\n\r\n"));
    // no body, no Content-Length
    assert!(!text.contains("Content-Length"));
}

#[test]
fn test_canonical_header_order() {
    let mut writer = ResponseWriter::default();

    writer.set_date_header(at(784111777));
    writer.set_no_cache(true);
    writer.set_location("http://example.com/new").unwrap();
    writer.add_server_header("MyServer/1.2.3").unwrap();
    writer.add_server_header_comment("(Unix)").unwrap();
    writer.add_server_header_comment("(Experimental)").unwrap();
    writer.set_challenge("Basic", "Restricted").unwrap();
    writer.add_allow_header("GET");
    writer.add_allow_header("HEAD");
    writer.set_content_type_header("text", "html").unwrap();
    writer
        .add_content_type_header_parameter("charset", "utf-8")
        .unwrap();
    writer.set_expires_header(at(1703462400));
    writer.set_last_modified_header(at(1704207845)).unwrap();
    writer.set_header("X-Foo", "bar").unwrap();
    writer.set_header("X-Baz", "qux").unwrap();
    writer.set_body(&b"hello"[..]);

    let expected = "HTTP/1.0 200 OK\r\n\
                    Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
                    Pragma: no-cache\r\n\
                    Location: http://example.com/new\r\n\
                    Server: MyServer/1.2.3 (Unix) (Experimental)\r\n\
                    WWW-Authenticate: Basic realm=\"Restricted\"\r\n\
                    Allow: GET, HEAD\r\n\
                    Content-Length: 5\r\n\
                    Content-Type: text/html;charset=utf-8\r\n\
                    Expires: Mon, 25 Dec 2023 00:00:00 GMT\r\n\
                    Last-Modified: Tue, 02 Jan 2024 15:04:05 GMT\r\n\
                    X-Baz: qux\r\n\
                    X-Foo: bar\r\n\
                    \r\n\
                    hello";

    assert_eq!(
        String::from_utf8(writer.response.marshal()).unwrap(),
        expected
    );
}

#[test]
fn test_content_length_tracks_body() {
    let mut writer = ResponseWriter::default();
    writer.set_date_header(at(0));

    writer.set_body(&b"abc"[..]);
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert_eq!(text.matches("Content-Length: 3").count(), 1);
    assert!(text.ends_with("\r\n\r\nabc"));

    // an empty body drops the header again
    writer.set_body(Vec::new());
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(!text.contains("Content-Length"));
}

#[test]
fn test_redirect() {
    let mut writer = ResponseWriter::default();
    writer.redirect("http://example.com/new").unwrap();

    assert_eq!(writer.status(), StatusCode::MOVED_PERMANENTLY);
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Location: http://example.com/new\r\n"));
    assert!(text.ends_with("Resource moved to http://example.com/new"));

    let mut writer = ResponseWriter::default();
    writer.redirect_temporary("http://example.com/tmp").unwrap();
    assert_eq!(writer.status(), StatusCode::MOVED_TEMPORARILY);

    let mut writer = ResponseWriter::default();
    assert!(writer.redirect("not a uri").is_err());
}

#[test]
fn test_unauthorized() {
    let mut writer = ResponseWriter::default();
    writer.unauthorized("Basic", "WallyWorld").unwrap();

    assert_eq!(writer.status(), StatusCode::UNAUTHORIZED);
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("WWW-Authenticate: Basic realm=\"WallyWorld\"\r\n"));
}

#[test]
fn test_challenge_parameters() {
    let mut writer = ResponseWriter::default();
    writer.set_challenge("Digest", "api").unwrap();
    writer.add_challenge_parameter("nonce", "abc123").unwrap();
    writer.add_challenge_parameter("qop", "auth").unwrap();

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(
        text.contains("WWW-Authenticate: Digest realm=\"api\",nonce=\"abc123\",qop=\"auth\"\r\n")
    );

    // already quoted realms are kept as-is
    let mut writer = ResponseWriter::default();
    writer.set_challenge("Basic", "\"Admin Area\"").unwrap();
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("WWW-Authenticate: Basic realm=\"Admin Area\"\r\n"));

    assert!(writer.set_challenge("Ba sic", "realm").is_err());
}

#[test]
fn test_pragma_header() {
    let mut writer = ResponseWriter::default();
    writer.set_date_header(at(0));
    writer.set_no_cache(true);
    writer.add_pragma_header("ttl", "30").unwrap();

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Pragma: no-cache ttl=30\r\n"));

    writer.set_no_cache(false);
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Pragma: ttl=30\r\n"));

    assert!(writer.add_pragma_header("bad name", "x").is_err());
    assert!(writer.add_pragma_header("name", "not a word").is_err());
}

#[test]
fn test_server_header_validation() {
    let mut writer = ResponseWriter::default();
    assert!(writer.add_server_header("name/1.0/extra").is_err());
    assert!(writer.add_server_header_comment("no parens").is_err());
    assert!(writer.add_server_header("go").is_ok());
}

#[test]
fn test_content_type_parameters() {
    let mut writer = ResponseWriter::default();
    writer.set_content_type_header("text", "plain").unwrap();
    writer
        .add_content_type_header_parameter("charset", "us-ascii")
        .unwrap();
    writer
        .add_content_type_header_parameter("note", "two words")
        .unwrap();

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Content-Type: text/plain;charset=us-ascii;note=\"two words\"\r\n"));

    assert!(writer
        .add_content_type_header_parameter("bad", "ctl\x01")
        .is_err());
    assert!(writer.set_content_type_header("te xt", "plain").is_err());
}

#[test]
fn test_content_encoding_known_only() {
    let mut writer = ResponseWriter::default();
    writer.set_content_encoding("gzip").unwrap();
    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Content-Encoding: gzip\r\n"));

    assert!(writer.set_content_encoding("br").is_err());
    assert!(writer.set_content_encoding("GZIP").is_err());
}

#[test]
fn test_set_header_reserved() {
    let mut writer = ResponseWriter::default();

    for name in [
        "Date",
        "Pragma",
        "Location",
        "Server",
        "WWW-Authenticate",
        "Allow",
        "Content-Encoding",
        "Content-Length",
        "Content-Type",
        "Expires",
        "Last-Modified",
    ] {
        assert!(writer.set_header(name, "x").is_err(), "{name}");
    }

    writer.set_header("X-Custom", "ok").unwrap();
    assert!(writer.set_header("Bad Name", "x").is_err());
    assert!(writer.set_header("X-Bin", "a\x02b").is_err());
}

#[test]
fn test_challenge_params_render_without_scheme() {
    // parameters added before any scheme/realm still render, leading
    // comma included
    let mut writer = ResponseWriter::default();
    writer.add_challenge_parameter("nonce", "abc").unwrap();

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("WWW-Authenticate: ,nonce=\"abc\"\r\n"), "{text}");
}

#[test]
fn test_content_type_params_render_without_media_type() {
    let mut writer = ResponseWriter::default();
    writer.response.headers.content_type.type_.clear();
    writer.response.headers.content_type.subtype.clear();
    writer
        .add_content_type_header_parameter("charset", "utf-8")
        .unwrap();

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Content-Type: ;charset=utf-8\r\n"), "{text}");
}

#[test]
fn test_allow_accepts_extension_tokens() {
    // add_allow_header performs no validation against the method set
    let mut writer = ResponseWriter::default();
    writer.add_allow_header("GET");
    writer.add_allow_header("FOO");

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Allow: GET, FOO\r\n"));
}

#[test]
fn test_pragma_options_sorted() {
    let mut writer = ResponseWriter::default();
    writer.add_pragma_header("ttl", "60").unwrap();
    writer.add_pragma_header("mode", "fast").unwrap();

    let text = String::from_utf8(writer.response.marshal()).unwrap();
    assert!(text.contains("Pragma: mode=fast ttl=60\r\n"));
}

#[test]
fn test_error_response_shape() {
    use crate::error::Error;
    use super::Response;

    let response = Response::from_error(&Error::client("bad things"));
    let text = String::from_utf8(response.marshal()).unwrap();

    assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    assert!(text.ends_with("[Client error]: bad things"));

    let response = Response::from_error(&Error::server("worse things"));
    let text = String::from_utf8(response.marshal()).unwrap();

    assert!(text.starts_with("HTTP/1.0 500 Internal Server Error\r\n"));
    assert!(text.ends_with("[Server error]: worse things"));
}

#[test]
fn test_last_modified_rejects_future() {
    let mut writer = ResponseWriter::default();
    let future = std::time::SystemTime::now() + Duration::from_secs(3600);
    assert!(writer.set_last_modified_header(future).is_err());
    assert!(writer.set_last_modified_header(at(784111777)).is_ok());
}
