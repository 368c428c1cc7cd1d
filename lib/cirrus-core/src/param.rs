//! Parameter declarations of a method.
//!
//! A declaration says where the request factory places an argument. Path
//! parameters feed the URI template; query, header and form parameters are
//! written directly; payload parameters are collected into the named-map
//! handed to binders; binder parameters are only read by their binder.

use std::fmt;

/// Where an argument is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// URI template placeholder of the same name.
    Path,
    /// Query parameter with the given wire name.
    Query(String),
    /// Header with the given name.
    Header(String),
    /// Form parameter with the given wire name.
    Form(String),
    /// Collected into the named-parameter map for binders.
    Payload,
    /// Consumed by a binder only.
    Binder,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query(name) => write!(f, "query `{name}`"),
            Self::Header(name) => write!(f, "header `{name}`"),
            Self::Form(name) => write!(f, "form `{name}`"),
            Self::Payload => write!(f, "payload"),
            Self::Binder => write!(f, "binder"),
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSpec {
    name: String,
    location: ParamLocation,
}

impl ParamSpec {
    /// Path parameter filling `{name}`.
    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path)
    }

    /// Query parameter sent under the argument name.
    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        let name = name.into();
        let location = ParamLocation::Query(name.clone());
        Self::new(name, location)
    }

    /// Query parameter sent under `wire_name`.
    #[must_use]
    pub fn query_as(name: impl Into<String>, wire_name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query(wire_name.into()))
    }

    /// Header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, header: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Header(header.into()))
    }

    /// Form parameter sent under `wire_name`.
    #[must_use]
    pub fn form(name: impl Into<String>, wire_name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Form(wire_name.into()))
    }

    /// Named payload parameter.
    #[must_use]
    pub fn payload(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Payload)
    }

    /// Argument read only by a binder.
    #[must_use]
    pub fn binder(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Binder)
    }

    fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the argument goes.
    #[must_use]
    pub const fn location(&self) -> &ParamLocation {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_location_display() {
        assert_eq!(ParamLocation::Path.to_string(), "path");
        assert_eq!(ParamLocation::Query("limit".into()).to_string(), "query `limit`");
        assert_eq!(ParamLocation::Header("ETag".into()).to_string(), "header `ETag`");
        assert_eq!(ParamLocation::Form("Action".into()).to_string(), "form `Action`");
        assert_eq!(ParamLocation::Payload.to_string(), "payload");
        assert_eq!(ParamLocation::Binder.to_string(), "binder");
    }

    #[test]
    fn query_uses_argument_name_by_default() {
        let param = ParamSpec::query("marker");
        assert_eq!(param.name(), "marker");
        assert_eq!(param.location(), &ParamLocation::Query("marker".into()));

        let renamed = ParamSpec::query_as("pageSize", "limit");
        assert_eq!(renamed.name(), "pageSize");
        assert_eq!(renamed.location(), &ParamLocation::Query("limit".into()));
    }
}
