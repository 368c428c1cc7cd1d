//! URI and header templates with `{name}` placeholders.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{Error, Result};

/// Characters escaped when a value is substituted as one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'[')
    .add(b']');

/// How substituted values are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Percent-encode each value as a single path segment, so `/` in a value
    /// cannot introduce a new segment.
    PathSegment,
    /// Insert values verbatim (header templates).
    Verbatim,
}

/// A template such as `/servers/{serverId}/action` or `Bearer {token}`.
///
/// # Example
///
/// ```
/// use cirrus_core::{Encoding, UriTemplate};
///
/// let template = UriTemplate::new("/containers/{container}/{name}");
/// let path = template
///     .expand(
///         |name| match name {
///             "container" => Some("photos".to_string()),
///             "name" => Some("2024/beach.jpg".to_string()),
///             _ => None,
///         },
///         Encoding::PathSegment,
///     )
///     .unwrap();
///
/// assert_eq!(path, "/containers/photos/2024%2Fbeach.jpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriTemplate(String);

impl UriTemplate {
    /// Template from `template`. Placeholders are resolved when expanded.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder names in order of first appearance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unclosed or empty placeholder.
    pub fn placeholders(&self) -> Result<Vec<&str>> {
        let mut names = Vec::new();
        for segment in self.segments() {
            if let Segment::Placeholder(name) = segment? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Substitute every placeholder through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a placeholder has no value or the
    /// template is malformed.
    pub fn expand<F>(&self, lookup: F, encoding: Encoding) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.0.len());
        for segment in self.segments() {
            match segment? {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup(name).ok_or_else(|| {
                        Error::configuration(format!(
                            "template `{}` has no value for `{{{name}}}`",
                            self.0
                        ))
                    })?;
                    match encoding {
                        Encoding::PathSegment => {
                            out.extend(utf8_percent_encode(&value, PATH_SEGMENT));
                        }
                        Encoding::Verbatim => out.push_str(&value),
                    }
                }
            }
        }
        Ok(out)
    }

    fn segments(&self) -> Segments<'_> {
        Segments {
            template: &self.0,
            rest: &self.0,
        }
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UriTemplate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UriTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

struct Segments<'a> {
    template: &'a str,
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<Segment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(open) = self.rest.find('{') else {
            let literal = self.rest;
            self.rest = "";
            return Some(Ok(Segment::Literal(literal)));
        };
        if open > 0 {
            let (literal, rest) = self.rest.split_at(open);
            self.rest = rest;
            return Some(Ok(Segment::Literal(literal)));
        }

        let template = self.template;
        let malformed =
            |what: &str| Error::configuration(format!("template `{template}` has {what}"));
        let Some(close) = self.rest.find('}') else {
            self.rest = "";
            return Some(Err(malformed("an unclosed placeholder")));
        };
        let name = self.rest.get(1..close).unwrap_or_default().trim();
        self.rest = self.rest.get(close + 1..).unwrap_or_default();
        if name.is_empty() {
            return Some(Err(malformed("an empty placeholder")));
        }
        Some(Ok(Segment::Placeholder(name)))
    }
}
