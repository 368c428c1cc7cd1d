//! Method registry: the statically built table of an API's methods.

use std::collections::BTreeMap;
use std::sync::Arc;

use cirrus_core::{Error, MethodSpec, Result};

/// Methods of one API, by name.
///
/// A provider module fills the registry once at start-up from plain
/// functions returning [`MethodSpec`]s.
///
/// # Example
///
/// ```
/// use cirrus::MethodRegistry;
/// use cirrus_core::{Method, MethodSpec};
///
/// let registry = MethodRegistry::new()
///     .with(MethodSpec::builder("listContainers", Method::Get, "/").build()?)?;
///
/// assert!(registry.get("listContainers").is_ok());
/// assert!(registry.get("deleteContainer").is_err());
/// # Ok::<(), cirrus_core::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, Arc<MethodSpec>>,
}

impl MethodRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a method of the same name exists.
    pub fn register(&mut self, spec: MethodSpec) -> Result<Arc<MethodSpec>> {
        if self.methods.contains_key(spec.name()) {
            return Err(Error::configuration(format!(
                "method `{}` is registered twice",
                spec.name()
            )));
        }
        let spec = Arc::new(spec);
        self.methods
            .insert(spec.name().to_string(), Arc::clone(&spec));
        Ok(spec)
    }

    /// Add `spec`, builder style.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a method of the same name exists.
    pub fn with(mut self, spec: MethodSpec) -> Result<Self> {
        self.register(spec)?;
        Ok(self)
    }

    /// The method called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown names.
    pub fn get(&self, name: &str) -> Result<Arc<MethodSpec>> {
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| Error::configuration(format!("unknown method `{name}`")))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use cirrus_core::{ErrorKind, Method};

    use super::*;

    fn spec(name: &str) -> MethodSpec {
        MethodSpec::builder(name, Method::Get, "/").build().expect("spec")
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = MethodRegistry::new();
        registry.register(spec("listContainers")).expect("first");

        let err = registry.register(spec("listContainers")).expect_err("duplicate");

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let registry = MethodRegistry::new()
            .with(spec("putObject"))
            .and_then(|r| r.with(spec("getObject")))
            .expect("registry");

        assert_eq!(registry.names().collect::<Vec<_>>(), ["getObject", "putObject"]);
    }
}
