//! Static description of one API method.
//!
//! A provider module builds one [`MethodSpec`] per operation at start-up
//! and shares it across calls. Everything here is immutable after
//! [`MethodSpecBuilder::build`] validated it.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    Binder, Error, FallbackPolicy, FilterChain, Method, ParamLocation, ParamSpec, RequestFilter,
    Result, RetryPolicy, UriTemplate,
};

/// What a binder receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinderSource {
    /// The named argument, as one object.
    Arg(String),
    /// Every payload parameter, collected into one map.
    PayloadParams,
}

/// A binder applied to one source.
#[derive(Debug, Clone)]
pub struct BinderAssignment {
    binder: Arc<dyn Binder>,
    source: BinderSource,
}

impl BinderAssignment {
    /// Run `binder` over the input named by `source`.
    #[must_use]
    pub fn new(binder: Arc<dyn Binder>, source: BinderSource) -> Self {
        Self { binder, source }
    }

    /// The binder.
    #[must_use]
    pub fn binder(&self) -> &dyn Binder {
        self.binder.as_ref()
    }

    /// Where the binder's input comes from.
    #[must_use]
    pub const fn source(&self) -> &BinderSource {
        &self.source
    }
}

/// Declarative metadata of one API method.
///
/// # Example
///
/// ```
/// use cirrus_core::{BindParamsToJsonPayload, FallbackPolicy, Method, MethodSpec, ParamSpec};
///
/// let spec = MethodSpec::builder("createImage", Method::Post, "/servers/{serverId}/action")
///     .param(ParamSpec::path("serverId"))
///     .param(ParamSpec::payload("name"))
///     .bind_payload(BindParamsToJsonPayload::wrapped("createImage"))
///     .build()
///     .unwrap();
///
/// assert_eq!(spec.name(), "createImage");
/// assert_eq!(spec.fallback(), &FallbackPolicy::Propagate);
/// ```
#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: String,
    method: Method,
    path: UriTemplate,
    headers: Vec<(String, UriTemplate)>,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    params: Vec<ParamSpec>,
    binders: Vec<BinderAssignment>,
    filters: FilterChain,
    fallback: FallbackPolicy,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl MethodSpec {
    /// Start describing `name`, sent as `method` to `path`.
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        method: Method,
        path: impl Into<UriTemplate>,
    ) -> MethodSpecBuilder {
        MethodSpecBuilder {
            spec: Self {
                name: name.into(),
                method,
                path: path.into(),
                headers: Vec::new(),
                query: Vec::new(),
                form: Vec::new(),
                params: Vec::new(),
                binders: Vec::new(),
                filters: FilterChain::new(),
                fallback: FallbackPolicy::Propagate,
                timeout: None,
                retry: None,
            },
        }
    }

    /// Method identifier, used for registry lookup and logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP verb.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template, relative to the endpoint.
    #[must_use]
    pub const fn path(&self) -> &UriTemplate {
        &self.path
    }

    /// Static headers; values may hold `{arg}` placeholders.
    #[must_use]
    pub fn headers(&self) -> &[(String, UriTemplate)] {
        &self.headers
    }

    /// Static query parameters.
    #[must_use]
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// Static form parameters.
    #[must_use]
    pub fn form_params(&self) -> &[(String, String)] {
        &self.form
    }

    /// Declared parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Binders, in the order they run.
    #[must_use]
    pub fn binders(&self) -> &[BinderAssignment] {
        &self.binders
    }

    /// Filters attached to every request of this method.
    #[must_use]
    pub const fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// What to return instead of failing.
    #[must_use]
    pub const fn fallback(&self) -> &FallbackPolicy {
        &self.fallback
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Retry policy overriding the client default.
    #[must_use]
    pub const fn retry(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }
}

/// Builder for [`MethodSpec`].
#[derive(Debug, Clone)]
pub struct MethodSpecBuilder {
    spec: MethodSpec,
}

impl MethodSpecBuilder {
    /// Add a static header. `{arg}` placeholders in the value are resolved
    /// from the arguments.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<UriTemplate>) -> Self {
        self.spec.headers.push((name.into(), value.into()));
        self
    }

    /// Add a static query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.query.push((name.into(), value.into()));
        self
    }

    /// Add a static form parameter, e.g. `Action=RunInstances`.
    #[must_use]
    pub fn form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.form.push((name.into(), value.into()));
        self
    }

    /// Declare a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.spec.params.push(param);
        self
    }

    /// Bind the argument `name` with `binder`. Declares `name` as a binder
    /// parameter if it was not declared yet.
    #[must_use]
    pub fn bind_arg(mut self, name: impl Into<String>, binder: impl Binder + 'static) -> Self {
        let name = name.into();
        if !self.spec.params.iter().any(|p| p.name() == name) {
            self.spec.params.push(ParamSpec::binder(name.clone()));
        }
        self.spec
            .binders
            .push(BinderAssignment::new(Arc::new(binder), BinderSource::Arg(name)));
        self
    }

    /// Bind the collected payload parameters with `binder`.
    #[must_use]
    pub fn bind_payload(mut self, binder: impl Binder + 'static) -> Self {
        self.spec.binders.push(BinderAssignment::new(
            Arc::new(binder),
            BinderSource::PayloadParams,
        ));
        self
    }

    /// Attach a request filter.
    #[must_use]
    pub fn filter(mut self, filter: impl RequestFilter + 'static) -> Self {
        self.spec.filters = self.spec.filters.with(filter);
        self
    }

    /// Attach a shared filter.
    #[must_use]
    pub fn shared_filter(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        self.spec.filters.push(filter);
        self
    }

    /// Turn selected failures into default values.
    #[must_use]
    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.spec.fallback = fallback;
        self
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = Some(timeout);
        self
    }

    /// Override the client's retry policy for this method.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.spec.retry = Some(retry);
        self
    }

    /// Validate and finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the path template is malformed,
    /// a parameter is declared twice, a path parameter has no placeholder, or
    /// a placeholder has no path parameter.
    pub fn build(self) -> Result<MethodSpec> {
        validate(&self.spec)?;
        Ok(self.spec)
    }
}

fn validate(spec: &MethodSpec) -> Result<()> {
    let fail = |detail: String| Error::configuration(format!("method `{}`: {detail}", spec.name));

    for (index, param) in spec.params.iter().enumerate() {
        if spec.params.iter().take(index).any(|p| p.name() == param.name()) {
            return Err(fail(format!("parameter `{}` declared twice", param.name())));
        }
    }

    let placeholders = spec.path.placeholders()?;
    for param in &spec.params {
        if *param.location() == ParamLocation::Path && !placeholders.contains(&param.name()) {
            return Err(fail(format!(
                "path parameter `{}` has no placeholder in `{}`",
                param.name(),
                spec.path
            )));
        }
    }
    for placeholder in &placeholders {
        let declared = spec
            .params
            .iter()
            .any(|p| p.name() == *placeholder && *p.location() == ParamLocation::Path);
        if !declared {
            return Err(fail(format!(
                "placeholder `{{{placeholder}}}` is not a declared path parameter"
            )));
        }
    }
    for (_, value) in &spec.headers {
        value.placeholders()?;
    }
    Ok(())
}
