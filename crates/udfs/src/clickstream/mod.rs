//! Decoding of GZIP-compressed clickstream payloads into known record shapes.
//!
//! # Payload format
//!
//! ```text
//! base64(gzip(utf8(json array)))
//! ```
//!
//! Every operation shares one inflate step ([`inflate_gzip_base64`]) and then
//! parses the text as an array of the requested [`RecordShape`] and
//! serialises it back. The round trip is a narrowing transform: fields the
//! record model does not know are dropped.

pub mod records;

pub use records::{AttributeRecord, EventRecord, UserAttribute, UserRecord};

use std::io::Read;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::UdfError;
use flate2::read::MultiGzDecoder;
use serde::{de::DeserializeOwned, Serialize};

/// Target shape of each element of the decompressed JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// Fixed scalar event fields; see [`EventRecord`].
    Event,
    /// Free-form attribute map; see [`AttributeRecord`].
    Attribute,
    /// User-attribute map of `{value, set_timestamp}`; see [`UserRecord`].
    User,
}

/// Inflate `input` and re-encode it as an array of `shape` records.
///
/// A `None` input returns `None`.
///
/// # Errors
///
/// Returns [`UdfError::MalformedCompressedData`] for invalid Base64, an
/// invalid GZIP stream, or JSON that does not fit `shape`.
pub fn decode(input: Option<&str>, shape: RecordShape) -> Result<Option<String>, UdfError> {
    let Some(input) = input else {
        return Ok(None);
    };

    let text = inflate_gzip_base64(input)?;
    let json = match shape {
        RecordShape::Event => reencode::<EventRecord>(&text),
        RecordShape::Attribute => reencode::<AttributeRecord>(&text),
        RecordShape::User => reencode::<UserRecord>(&text),
    }?;
    Ok(Some(json))
}

/// Decode an array of [`EventRecord`]s, keeping only the modeled fields.
pub fn decompress_event_fields(input: Option<&str>) -> Result<Option<String>, UdfError> {
    decode(input, RecordShape::Event)
}

/// Decode an array of [`AttributeRecord`]s.
pub fn decompress_attribute_fields(input: Option<&str>) -> Result<Option<String>, UdfError> {
    decode(input, RecordShape::Attribute)
}

/// Decode an array of [`UserRecord`]s.
pub fn decompress_user_fields(input: Option<&str>) -> Result<Option<String>, UdfError> {
    decode(input, RecordShape::User)
}

/// Base64-decode `input` and GZIP-decompress it into text.
///
/// Decompressed lines are concatenated without separators, so line breaks in
/// the payload do not survive. A line ends at `\n`, `\r\n`, or a lone `\r`;
/// upstream producers rely on all three being dropped.
///
/// # Errors
///
/// Returns [`UdfError::MalformedCompressedData`] for invalid Base64, a bad
/// GZIP stream, or text that is not UTF-8.
pub fn inflate_gzip_base64(input: &str) -> Result<String, UdfError> {
    let bytes = STANDARD
        .decode(input)
        .map_err(|e| malformed(format!("invalid Base64: {e}")))?;

    let mut text = String::with_capacity(bytes.len().saturating_mul(4));
    MultiGzDecoder::new(bytes.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| malformed(format!("invalid gzip stream: {e}")))?;
    text.retain(|c| !matches!(c, '\r' | '\n'));
    Ok(text)
}

/// Parse `text` as a JSON array of `R` and serialise it again.
///
/// `null` (top-level or as an element) is carried through as `null`.
fn reencode<R>(text: &str) -> Result<String, UdfError>
where
    R: DeserializeOwned + Serialize,
{
    let records: Option<Vec<Option<R>>> = serde_json::from_str(text)
        .map_err(|e| malformed(format!("payload does not match record shape: {e}")))?;
    serde_json::to_string(&records).map_err(|e| UdfError::Internal(e.to_string()))
}

fn malformed(message: impl Into<String>) -> UdfError {
    UdfError::MalformedCompressedData(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use serde_json::{json, Value};
    use std::io::Write;

    fn wrap(text: &str) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        STANDARD.encode(encoder.finish().unwrap())
    }

    fn parse(out: Option<String>) -> Value {
        serde_json::from_str(&out.unwrap()).unwrap()
    }

    #[test]
    fn null_passes_through_every_shape() {
        for shape in [RecordShape::Event, RecordShape::Attribute, RecordShape::User] {
            assert_eq!(decode(None, shape), Ok(None));
        }
    }

    #[test]
    fn inflate_joins_lines_without_separator() {
        let text = inflate_gzip_base64(&wrap("[\n{\"a\":\n1}\r\n]\n")).unwrap();
        assert_eq!(text, "[{\"a\":1}]");
    }

    #[test]
    fn inflate_treats_lone_carriage_return_as_line_break() {
        let input = wrap("[{\"a\":\"x\ry\"},\r{\"b\":\"z\"}]\r");
        let text = inflate_gzip_base64(&input).unwrap();
        assert_eq!(text, "[{\"a\":\"xy\"},{\"b\":\"z\"}]");

        let out = decompress_attribute_fields(Some(input.as_str())).unwrap().unwrap();
        assert_eq!(out, "[{\"a\":\"xy\"},{\"b\":\"z\"}]");
    }

    #[test]
    fn inflate_reads_concatenated_members() {
        let mut bytes = Vec::new();
        for part in ["[{\"a\":", "1}]"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part.as_bytes()).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        let text = inflate_gzip_base64(&STANDARD.encode(bytes)).unwrap();
        assert_eq!(text, "[{\"a\":1}]");
    }

    #[test]
    fn event_fields_drop_unmodeled_keys() {
        let input = wrap(r#"[{"event_id":"e1","unused_field":"x"}]"#);
        let out = parse(decompress_event_fields(Some(input.as_str())).unwrap());
        let record = &out[0];
        assert_eq!(record["event_id"], "e1");
        assert!(record.get("unused_field").is_none());
    }

    #[test]
    fn event_fields_fill_missing_values() {
        let input = wrap(r#"[{"event_id":"e1","timestamp":1700000000000,"screen_width":1080}]"#);
        let out = parse(decompress_event_fields(Some(input.as_str())).unwrap());
        let record = out[0].as_object().unwrap();
        assert_eq!(record.len(), 16);
        assert_eq!(record["timestamp"], 1_700_000_000_000i64);
        assert_eq!(record["screen_width"], 1080);
        assert_eq!(record["screen_height"], 0);
        assert_eq!(record["platform"], Value::Null);
    }

    #[test]
    fn event_fields_preserve_array_order() {
        let input = wrap(r#"[{"event_id":"e1"},{"event_id":"e2"},{"event_id":"e3"}]"#);
        let out = parse(decompress_event_fields(Some(input.as_str())).unwrap());
        let ids: Vec<&str> = out
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["event_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["e1", "e2", "e3"]);
    }

    #[test]
    fn attribute_fields_pass_through() {
        let input = wrap(r#"[{"a":1,"b":"x"}]"#);
        let out = decompress_attribute_fields(Some(input.as_str())).unwrap().unwrap();
        assert_eq!(out, r#"[{"a":1,"b":"x"}]"#);
    }

    #[test]
    fn attribute_fields_keep_nested_values_and_key_order() {
        let input = wrap(r#"[{"z":[1,2],"a":{"n":null}},{"m":true}]"#);
        let out = decompress_attribute_fields(Some(input.as_str())).unwrap().unwrap();
        assert_eq!(out, r#"[{"z":[1,2],"a":{"n":null}},{"m":true}]"#);
    }

    #[test]
    fn user_fields_normalise_value_shape() {
        let input = wrap(
            r#"[{"_user_id":{"value":"u1","set_timestamp":1700000000000,"extra":1},"_name":{"value":"n"}}]"#,
        );
        let out = parse(decompress_user_fields(Some(input.as_str())).unwrap());
        assert_eq!(
            out,
            json!([{
                "_user_id": {"value": "u1", "set_timestamp": 1_700_000_000_000i64},
                "_name": {"value": "n", "set_timestamp": 0}
            }])
        );
    }

    #[test]
    fn event_fields_accept_numbers_as_strings() {
        let input = wrap(r#"[{"event_id":7,"screen_height":"1920","timestamp":"1700000000000"}]"#);
        let out = parse(decompress_event_fields(Some(input.as_str())).unwrap());
        assert_eq!(out[0]["event_id"], "7");
        assert_eq!(out[0]["screen_height"], 1920);
        assert_eq!(out[0]["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn null_elements_are_preserved() {
        let input = wrap(r#"[null,{"a":1}]"#);
        let out = decompress_attribute_fields(Some(input.as_str())).unwrap().unwrap();
        assert_eq!(out, r#"[null,{"a":1}]"#);
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let input = wrap(r#"{"not":"an array"}"#);
        let err = decompress_event_fields(Some(input.as_str())).unwrap_err();
        assert!(matches!(err, UdfError::MalformedCompressedData(_)));

        let input = wrap(r#"[{"user":{"_user_id":{"value":"u1"}}}]"#);
        let err = decompress_user_fields(Some(input.as_str())).unwrap_err();
        assert!(matches!(err, UdfError::MalformedCompressedData(_)));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let input = wrap("[{");
        let err = decompress_attribute_fields(Some(input.as_str())).unwrap_err();
        assert!(matches!(err, UdfError::MalformedCompressedData(_)));
    }

    #[test]
    fn not_gzip_is_malformed() {
        let input = STANDARD.encode(b"plain text, no gzip header");
        let err = decompress_event_fields(Some(input.as_str())).unwrap_err();
        assert!(matches!(err, UdfError::MalformedCompressedData(_)));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let err = decompress_event_fields(Some("@@@")).unwrap_err();
        assert!(matches!(err, UdfError::MalformedCompressedData(_)));
    }
}
