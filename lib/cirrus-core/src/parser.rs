//! Response parsers: typed strategies turning a 2xx response into a value.
//!
//! Parsers only see successful responses. Failed responses go through the
//! [`ErrorMapper`](crate::ErrorMapper) and the method's fallback policy
//! instead. Parsers never swallow errors.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{DateFormat, Error, Response, Result, parse_date};

/// Turns a successful response into a typed result.
pub trait ResponseParser: Send + Sync + fmt::Debug {
    /// The parsed result type.
    type Output;

    /// Parse a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the body does not match the expected
    /// shape.
    fn parse(&self, response: Response) -> Result<Self::Output>;

    /// Post-process the parsed value.
    fn map<F, U>(self, f: F) -> MapParser<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U + Send + Sync,
    {
        MapParser { inner: self, f }
    }
}

/// Deserializes the whole body as JSON.
///
/// An empty body is read as JSON `null`, so `Option<T>` results become
/// `None` for `204 No Content`.
pub struct ParseJson<T>(PhantomData<fn() -> T>);

impl<T> ParseJson<T> {
    /// Parser for `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ParseJson<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ParseJson<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ParseJson<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParseJson<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> ResponseParser for ParseJson<T> {
    type Output = T;

    fn parse(&self, response: Response) -> Result<T> {
        let body = response.body();
        if body.iter().all(u8::is_ascii_whitespace) {
            return crate::from_json(b"null");
        }
        crate::from_json(body)
    }
}

/// Deserializes one top-level field of a JSON object, e.g. `server` in
/// `{"server": {...}}`. A missing field is read as `null`.
pub struct ParseJsonField<T> {
    field: String,
    _output: PhantomData<fn() -> T>,
}

impl<T> ParseJsonField<T> {
    /// Parser for the top-level `field` of a JSON object.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            _output: PhantomData,
        }
    }
}

impl<T> Clone for ParseJsonField<T> {
    fn clone(&self) -> Self {
        Self::new(self.field.clone())
    }
}

impl<T> fmt::Debug for ParseJsonField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseJsonField")
            .field("field", &self.field)
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> ResponseParser for ParseJsonField<T> {
    type Output = T;

    fn parse(&self, response: Response) -> Result<T> {
        let mut document: serde_json::Map<String, Value> = ParseJson::new().parse(response)?;
        let value = document.remove(&self.field).unwrap_or(Value::Null);
        serde_path_to_error::deserialize(value).map_err(|e| {
            let path = e.path().to_string();
            let path = if path == "." {
                self.field.clone()
            } else {
                format!("{}.{path}", self.field)
            };
            Error::parse(path, e.inner().to_string())
        })
    }
}

/// Deserializes the body as XML.
#[cfg(feature = "xml")]
pub struct ParseXml<T>(PhantomData<fn() -> T>);

#[cfg(feature = "xml")]
impl<T> ParseXml<T> {
    /// Parser for `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

#[cfg(feature = "xml")]
impl<T> Default for ParseXml<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "xml")]
impl<T> fmt::Debug for ParseXml<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParseXml<{}>", std::any::type_name::<T>())
    }
}

#[cfg(feature = "xml")]
impl<T: DeserializeOwned> ResponseParser for ParseXml<T> {
    type Output = T;

    fn parse(&self, response: Response) -> Result<T> {
        response.xml()
    }
}

/// The body as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnString;

impl ResponseParser for ReturnString {
    type Output = String;

    fn parse(&self, response: Response) -> Result<String> {
        response.text()
    }
}

/// `true` for any 2xx. Pair with [`FallbackPolicy::ReturnFalse`] for
/// existence checks.
///
/// [`FallbackPolicy::ReturnFalse`]: crate::FallbackPolicy::ReturnFalse
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnTrueIf2xx;

impl ResponseParser for ReturnTrueIf2xx {
    type Output = bool;

    fn parse(&self, response: Response) -> Result<bool> {
        Ok(response.is_success())
    }
}

/// Discards the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleasePayload;

impl ResponseParser for ReleasePayload {
    type Output = ();

    fn parse(&self, _response: Response) -> Result<()> {
        Ok(())
    }
}

/// The value of a required response header, e.g. `ETag` or `Location`.
#[derive(Debug, Clone)]
pub struct ParseHeader {
    name: String,
}

impl ParseHeader {
    /// Parser for the header `name`, matched case-insensitively.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ResponseParser for ParseHeader {
    type Output = String;

    fn parse(&self, response: Response) -> Result<String> {
        response
            .header(&self.name)
            .map(str::to_string)
            .ok_or_else(|| Error::parse(self.name.clone(), "header missing from response"))
    }
}

/// A required date header in a declared format, e.g. `Last-Modified`.
#[derive(Debug, Clone)]
pub struct ParseDateHeader {
    name: String,
    format: DateFormat,
}

impl ParseDateHeader {
    /// Parser for the header `name` in `format`.
    #[must_use]
    pub fn new(name: impl Into<String>, format: DateFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }
}

impl ResponseParser for ParseDateHeader {
    type Output = DateTime<Utc>;

    fn parse(&self, response: Response) -> Result<DateTime<Utc>> {
        let raw = ParseHeader::new(self.name.clone()).parse(response)?;
        parse_date(&raw, self.format)
    }
}

/// Parser returned by [`ResponseParser::map`].
pub struct MapParser<P, F> {
    inner: P,
    f: F,
}

impl<P: fmt::Debug, F> fmt::Debug for MapParser<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MapParser").field(&self.inner).finish()
    }
}

impl<P, F, U> ResponseParser for MapParser<P, F>
where
    P: ResponseParser,
    F: Fn(P::Output) -> U + Send + Sync,
{
    type Output = U;

    fn parse(&self, response: Response) -> Result<U> {
        self.inner.parse(response).map(&self.f)
    }
}
