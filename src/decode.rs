use crate::{RawResponse, Response, ResponseBody};

/// Normalizes a transport response, parsing the body as JSON when it can.
pub(crate) fn decode_response(raw: RawResponse) -> Response {
    Response {
        status_code: raw.status_code,
        status_message: raw.status_message,
        headers: raw.headers,
        body: decode_body(&raw.body),
    }
}

/// Empty stays empty, JSON is parsed, anything else is kept as text.
pub(crate) fn decode_body(bytes: &[u8]) -> ResponseBody {
    if bytes.is_empty() {
        return ResponseBody::Empty;
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => ResponseBody::Json(value),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!("could not parse response body as JSON: {}", _err);

            ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_body, decode_response};
    use crate::{RawResponse, ResponseBody};

    #[test]
    fn empty_body_is_empty() {
        assert_eq!(decode_body(b""), ResponseBody::Empty);
    }

    #[test]
    fn json_body_is_parsed() {
        assert_eq!(
            decode_body(br#"{"value":[{"name":"site"}],"nextLink":null}"#),
            ResponseBody::Json(json!({"value": [{"name": "site"}], "nextLink": null}))
        );
    }

    #[test]
    fn scalar_json_is_still_json() {
        assert_eq!(decode_body(b"42"), ResponseBody::Json(json!(42)));
    }

    #[test]
    fn invalid_json_falls_back_to_text() {
        assert_eq!(
            decode_body(b"Service Unavailable"),
            ResponseBody::Text("Service Unavailable".to_owned())
        );
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(
            decode_body(&[0x66, 0x6f, 0xff]),
            ResponseBody::Text("fo\u{fffd}".to_owned())
        );
    }

    #[test]
    fn response_keeps_status_and_headers() {
        let response = decode_response(RawResponse {
            status_code: 503,
            status_message: "Service Unavailable".to_owned(),
            headers: [("retry-after".to_owned(), "10".to_owned())].into(),
            body: Vec::new(),
        });
        assert_eq!(response.status_code, 503);
        assert_eq!(response.status_message, "Service Unavailable");
        assert_eq!(response.header("Retry-After"), Some("10"));
        assert_eq!(response.body, ResponseBody::Empty);
    }
}
