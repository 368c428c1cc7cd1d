//! Request payloads and body codecs.

use bytes::Bytes;

use crate::{Error, Params, Result};

/// Content type for request and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// XML content type (`application/xml`).
    Xml,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The body attached to a request.
///
/// Structured JSON payloads stay as a [`serde_json::Value`] until the
/// transport serializes them, so filters and tests can inspect them.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes with an optional content type.
    Bytes {
        /// Body bytes.
        data: Bytes,
        /// Declared content type.
        content_type: Option<String>,
    },
    /// UTF-8 text.
    Text(String),
    /// Structured JSON document.
    Json(serde_json::Value),
    /// Serialized XML document.
    Xml(String),
}

impl Payload {
    /// Binary payload without a declared content type.
    #[must_use]
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            data: data.into(),
            content_type: None,
        }
    }

    /// Binary payload with a declared content type.
    #[must_use]
    pub fn bytes_with_type(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            content_type: Some(content_type.into()),
        }
    }

    /// Serialize any value into a structured JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Content type implied by the payload variant.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Bytes { content_type, .. } => content_type.as_deref(),
            Self::Text(_) => Some("text/plain; charset=utf-8"),
            Self::Json(_) => Some(ContentType::Json.as_str()),
            Self::Xml(_) => Some(ContentType::Xml.as_str()),
        }
    }

    /// The structured JSON document, if this is a JSON payload.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Bytes as they will be sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON payload fails to serialize.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Self::Bytes { data, .. } => Ok(data.clone()),
            Self::Text(text) | Self::Xml(text) => Ok(Bytes::from(text.clone())),
            Self::Json(value) => to_json(value),
        }
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use cirrus_core::to_json;
///
/// let bytes = to_json(&serde_json::json!({"name": "web"})).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"web"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes with path-aware error messages.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the path of the field that failed
/// (e.g. `servers[0].addresses`).
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::parse(e.path().to_string(), e.inner().to_string()))
}

/// Encode form parameters as `application/x-www-form-urlencoded` bytes.
///
/// Repeated names are emitted once per value, in insertion order.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn to_form(params: &Params) -> Result<Bytes> {
    let pairs: Vec<(&str, &str)> = params.iter().collect();
    serde_urlencoded::to_string(pairs)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Decode an `application/x-www-form-urlencoded` body into ordered params.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body is not valid form encoding.
pub fn from_form(bytes: &[u8]) -> Result<Params> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(bytes).map_err(|e| Error::parse("", e.to_string()))?;
    Ok(pairs.into_iter().collect())
}

/// Serialize a value to an XML document with the given root element.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the value has no XML representation.
#[cfg(feature = "xml")]
pub fn to_xml<T: serde::Serialize>(root: &str, value: &T) -> Result<String> {
    let mut out = String::new();
    let serializer = quick_xml::se::Serializer::with_root(&mut out, Some(root))
        .map_err(|e| Error::serialization(e.to_string()))?;
    value
        .serialize(serializer)
        .map_err(|e| Error::serialization(e.to_string()))?;
    Ok(out)
}

/// Deserialize an XML document using a pull parser.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the document does not match `T`.
#[cfg(feature = "xml")]
pub fn from_xml<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::parse("", e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| Error::parse("", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(ContentType::Xml.as_str(), "application/xml");
        assert_eq!(
            ContentType::FormUrlEncoded.to_string(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn json_payload_keeps_structure() {
        let payload = Payload::json(&serde_json::json!({"b": 1, "a": 2})).expect("json");
        assert_eq!(payload.content_type(), Some("application/json"));
        assert_eq!(
            payload.to_bytes().expect("bytes").as_ref(),
            br#"{"b":1,"a":2}"#
        );
    }

    #[test]
    fn bytes_payload_reports_declared_type() {
        let payload = Payload::bytes_with_type("abc", "image/png");
        assert_eq!(payload.content_type(), Some("image/png"));
        assert_eq!(Payload::bytes("abc").content_type(), None);
    }

    #[test]
    fn form_encoding_keeps_repeated_names() {
        let params: Params = [("Name", "a b"), ("Name", "c&d"), ("Action", "Tag")]
            .into_iter()
            .collect();
        let bytes = to_form(&params).expect("form");
        assert_eq!(bytes.as_ref(), b"Name=a+b&Name=c%26d&Action=Tag");

        let decoded = from_form(&bytes).expect("decode");
        assert_eq!(decoded, params);
    }

    #[test]
    fn from_json_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Flavor {
            #[allow(dead_code)]
            ram: u32,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Server {
            #[allow(dead_code)]
            flavor: Flavor,
        }

        let err = from_json::<Server>(br#"{"flavor":{"ram":"lots"}}"#).expect_err("type mismatch");
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
        assert!(err.to_string().contains("flavor.ram"), "{err}");
    }

    #[cfg(feature = "xml")]
    #[test]
    fn xml_round_trip_through_pull_parser() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Zone {
            name: String,
            ttl: u32,
        }

        let xml = to_xml(
            "Zone",
            &Zone {
                name: "example.com.".to_string(),
                ttl: 300,
            },
        )
        .expect("xml");
        assert_eq!(xml, "<Zone><name>example.com.</name><ttl>300</ttl></Zone>");

        let zone: Zone = from_xml(xml.as_bytes()).expect("parse");
        assert_eq!(zone.ttl, 300);
    }
}
