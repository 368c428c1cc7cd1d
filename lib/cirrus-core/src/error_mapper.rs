//! Mapping failed responses to classified errors.
//!
//! The [`ErrorMapper`] is the one place where a non-2xx [`Response`] becomes
//! an [`Error`]. It classifies by status, lets a vendor [`ErrorDecoder`]
//! refine the message and code, and applies vendor-code overrides, so that
//! retry and fallback policies can decide on [`ErrorKind`] alone.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Error, ErrorKind, FallbackPolicy, FallbackValue, HttpError, Request, Response, Result};

/// Vendor detail extracted from an error body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorError {
    /// Machine readable code, e.g. `InvalidGroup.NotFound` or `itemNotFound`.
    pub code: Option<String>,
    /// Human readable message.
    pub message: Option<String>,
}

/// Extracts vendor error detail from a failed response body.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use cirrus_core::{ErrorDecoder, VendorError};
///
/// #[derive(Debug)]
/// struct PlainTextDecoder;
///
/// impl ErrorDecoder for PlainTextDecoder {
///     fn decode(&self, _status: u16, body: &Bytes) -> Option<VendorError> {
///         let message = std::str::from_utf8(body).ok()?.trim();
///         (!message.is_empty()).then(|| VendorError {
///             code: None,
///             message: Some(message.to_string()),
///         })
///     }
/// }
/// ```
pub trait ErrorDecoder: Send + Sync + fmt::Debug {
    /// Decode the body of a non-2xx response.
    ///
    /// Returns `None` when the body carries nothing recognizable.
    fn decode(&self, status: u16, body: &Bytes) -> Option<VendorError>;
}

/// Decoder that never finds vendor detail.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorDecoder;

impl ErrorDecoder for DefaultErrorDecoder {
    fn decode(&self, _status: u16, _body: &Bytes) -> Option<VendorError> {
        None
    }
}

/// Reads the vendor code and message from JSON pointers.
///
/// ```
/// use bytes::Bytes;
/// use cirrus_core::{ErrorDecoder, JsonErrorDecoder};
///
/// let decoder = JsonErrorDecoder::new("/itemNotFound/code", "/itemNotFound/message");
/// let body = Bytes::from_static(br#"{"itemNotFound":{"code":404,"message":"Server not found"}}"#);
/// let vendor = decoder.decode(404, &body).unwrap();
///
/// assert_eq!(vendor.code.as_deref(), Some("404"));
/// assert_eq!(vendor.message.as_deref(), Some("Server not found"));
/// ```
#[derive(Debug, Clone)]
pub struct JsonErrorDecoder {
    code_pointer: String,
    message_pointer: String,
}

impl JsonErrorDecoder {
    /// Decoder reading the code and message at the given JSON pointers.
    #[must_use]
    pub fn new(code_pointer: impl Into<String>, message_pointer: impl Into<String>) -> Self {
        Self {
            code_pointer: code_pointer.into(),
            message_pointer: message_pointer.into(),
        }
    }
}

impl Default for JsonErrorDecoder {
    /// `{"error": {"code": ..., "message": ...}}`.
    fn default() -> Self {
        Self::new("/error/code", "/error/message")
    }
}

impl ErrorDecoder for JsonErrorDecoder {
    fn decode(&self, _status: u16, body: &Bytes) -> Option<VendorError> {
        let document: serde_json::Value = serde_json::from_slice(body).ok()?;
        let text = |pointer: &str| {
            document.pointer(pointer).and_then(|value| match value {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };
        let vendor = VendorError {
            code: text(&self.code_pointer),
            message: text(&self.message_pointer),
        };
        (vendor.code.is_some() || vendor.message.is_some()).then_some(vendor)
    }
}

/// Reads `<Code>` and `<Message>` from an XML error document.
///
/// Both the flat shape (`<Error><Code>..`) and the query-API envelope
/// (`<Response><Errors><Error><Code>..`) are understood.
#[cfg(feature = "xml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlErrorDecoder;

#[cfg(feature = "xml")]
mod xml {
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    pub(super) struct ErrorDocument {
        #[serde(rename = "Code")]
        pub(super) code: Option<String>,
        #[serde(rename = "Message")]
        pub(super) message: Option<String>,
        #[serde(rename = "Errors")]
        pub(super) errors: Option<Errors>,
    }

    #[derive(Debug, Default, Deserialize)]
    pub(super) struct Errors {
        #[serde(rename = "Error", default)]
        pub(super) error: Vec<ErrorEntry>,
    }

    #[derive(Debug, Default, Deserialize)]
    pub(super) struct ErrorEntry {
        #[serde(rename = "Code")]
        pub(super) code: Option<String>,
        #[serde(rename = "Message")]
        pub(super) message: Option<String>,
    }
}

#[cfg(feature = "xml")]
impl ErrorDecoder for XmlErrorDecoder {
    fn decode(&self, _status: u16, body: &Bytes) -> Option<VendorError> {
        let document: xml::ErrorDocument = crate::from_xml(body).ok()?;
        let nested = document
            .errors
            .and_then(|errors| errors.error.into_iter().next());
        let vendor = match nested {
            Some(entry) => VendorError {
                code: entry.code,
                message: entry.message,
            },
            None => VendorError {
                code: document.code,
                message: document.message,
            },
        };
        (vendor.code.is_some() || vendor.message.is_some()).then_some(vendor)
    }
}

/// Turns failed responses into classified [`Error`]s.
#[derive(Debug, Clone)]
pub struct ErrorMapper {
    decoder: Arc<dyn ErrorDecoder>,
    vendor_kinds: Vec<(String, ErrorKind)>,
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self {
            decoder: Arc::new(DefaultErrorDecoder),
            vendor_kinds: Vec::new(),
        }
    }
}

impl ErrorMapper {
    /// Mapper that classifies by status only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `decoder` to extract vendor codes and messages.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl ErrorDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Classify errors carrying vendor `code` as `kind`, whatever the status.
    #[must_use]
    pub fn vendor_code(mut self, code: impl Into<String>, kind: ErrorKind) -> Self {
        self.vendor_kinds.push((code.into(), kind));
        self
    }

    /// Build the classified error for a non-2xx response.
    ///
    /// The response body is kept on the error and then released.
    #[must_use]
    pub fn map_error(
        &self,
        request: &Request,
        response: Response,
        fallback: &FallbackPolicy,
    ) -> Error {
        let (status, message, body) = {
            let message = response.message().to_string();
            let (status, _headers, body) = response.into_parts();
            (status, message, body)
        };

        let vendor = self.decoder.decode(status, &body).unwrap_or_default();
        let message = vendor
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or(message);
        let mut error = HttpError::new(status, message)
            .with_request(request.method(), request.url().to_string());
        if let Some(code) = vendor.code {
            if let Some((_, kind)) = self.vendor_kinds.iter().find(|(known, _)| *known == code) {
                error = error.with_kind(*kind);
            }
            error = error.with_vendor_code(code);
        }
        if !body.is_empty() {
            error = error.with_body(body);
        }

        fallback.reclassify(error).into()
    }

    /// Map a failed response and apply the fallback in one step.
    ///
    /// # Errors
    ///
    /// Returns the classified error unless `fallback` turns it into a value.
    pub fn map_response<T: FallbackValue>(
        &self,
        request: &Request,
        response: Response,
        fallback: &FallbackPolicy,
    ) -> Result<T> {
        fallback.recover(self.map_error(request, response, fallback))
    }
}
