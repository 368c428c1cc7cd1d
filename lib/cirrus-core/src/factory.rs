//! Turning a method description plus runtime arguments into a request.

use serde_json::{Map, Value};
use tracing::trace;
use url::Url;

use crate::args::scalar_to_string;
use crate::{
    Args, BinderSource, Binding, Encoding, Error, FilterChain, MethodSpec, ParamLocation, Params,
    Request, Result,
};

/// Builds requests for one endpoint.
///
/// Steps, in order:
///
/// 1. expand the path template (values percent-encoded as one segment each)
///    and join it onto the endpoint;
/// 2. apply static headers (with `{arg}` placeholders), query and form params;
/// 3. place query, header and form arguments (null omitted, arrays repeated);
/// 4. run binders in declaration order;
/// 5. attach client filters, then method filters. They run at send time.
///
/// Any unresolved placeholder is an [`Error::Configuration`].
///
/// # Example
///
/// ```
/// use cirrus_core::{Args, Method, MethodSpec, ParamSpec, RequestFactory};
///
/// let spec = MethodSpec::builder("getObject", Method::Get, "/{container}/{name}")
///     .param(ParamSpec::path("container"))
///     .param(ParamSpec::path("name"))
///     .build()
///     .unwrap();
///
/// let factory = RequestFactory::new("https://storage.example.com/v1/AUTH_acct".parse().unwrap());
/// let request = factory
///     .create(&spec, &Args::new().with("container", "photos").with("name", "a b.jpg"))
///     .unwrap();
///
/// assert_eq!(
///     request.url().as_str(),
///     "https://storage.example.com/v1/AUTH_acct/photos/a%20b.jpg"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RequestFactory {
    endpoint: Url,
    default_headers: Params,
    filters: FilterChain,
}

impl RequestFactory {
    /// Factory for requests relative to `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            default_headers: Params::headers(),
            filters: FilterChain::new(),
        }
    }

    /// Headers added to every request before the method's own.
    #[must_use]
    pub fn with_default_headers(mut self, headers: Params) -> Self {
        self.default_headers = headers;
        self
    }

    /// Filters attached to every request before the method's own.
    #[must_use]
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// The endpoint paths are resolved against.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the request for one call of `spec`.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] for unresolved placeholders or a binder
    ///   naming a missing argument;
    /// - whatever a binder reports, e.g. [`Error::IllegalState`].
    pub fn create(&self, spec: &MethodSpec, args: &Args) -> Result<Request> {
        let lookup = |name: &str| {
            args.get(name)
                .and_then(|value| scalar_to_string(name, value).ok().flatten())
        };

        let path = spec.path().expand(lookup, Encoding::PathSegment)?;
        let (path, template_query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path.clone(), None),
        };
        let url = join(&self.endpoint, &path);

        let mut builder = Request::builder().method(spec.method()).endpoint(url);
        for (name, value) in self.default_headers.iter() {
            builder = builder.add_header(name, value);
        }
        for (name, value) in spec.headers() {
            let value = value.expand(lookup, Encoding::Verbatim)?;
            builder = builder.replace_header(name.clone(), value);
        }
        if let Some(query) = template_query {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                builder = builder.query_param(name, value);
            }
        }
        for (name, value) in spec.query_params() {
            builder = builder.query_param(name.clone(), value.clone());
        }
        for (name, value) in spec.form_params() {
            builder = builder.form_param(name.clone(), value.clone());
        }

        let mut payload_params = Map::new();
        for param in spec.params() {
            let Some(value) = args.get(param.name()) else {
                continue;
            };
            match param.location() {
                ParamLocation::Query(wire) => {
                    for value in scalars(param.name(), value)? {
                        builder = builder.query_param(wire.clone(), value);
                    }
                }
                ParamLocation::Header(header) => {
                    for value in scalars(param.name(), value)? {
                        builder = builder.add_header(header.clone(), value);
                    }
                }
                ParamLocation::Form(wire) => {
                    for value in scalars(param.name(), value)? {
                        builder = builder.form_param(wire.clone(), value);
                    }
                }
                ParamLocation::Payload => {
                    payload_params.insert(param.name().to_string(), value.clone());
                }
                ParamLocation::Path | ParamLocation::Binder => {}
            }
        }

        let mut request = builder.build()?;
        for assignment in spec.binders() {
            let binding = match assignment.source() {
                BinderSource::Arg(name) => Binding::Object(args.get(name).ok_or_else(|| {
                    Error::configuration(format!(
                        "method `{}`: binder needs argument `{name}`, which was not supplied",
                        spec.name()
                    ))
                })?),
                BinderSource::PayloadParams => Binding::Params(&payload_params),
            };
            request = assignment.binder().bind(request, binding)?;
        }

        let request = request
            .to_builder()
            .filters(&self.filters)
            .filters(spec.filters())
            .build()?;
        trace!(method = spec.name(), url = %request.url(), "request created");
        Ok(request)
    }
}

/// Scalar strings of a value; arrays yield one string per non-null item.
fn scalars(name: &str, value: &Value) -> Result<Vec<String>> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if let Some(item) = scalar_to_string(name, item)? {
            out.push(item);
        }
    }
    Ok(out)
}

fn join(endpoint: &Url, path: &str) -> Url {
    let mut url = endpoint.clone();
    let base = endpoint.path().trim_end_matches('/');
    let joined = match path {
        "" => endpoint.path().to_string(),
        p if p.starts_with('/') => format!("{base}{p}"),
        p => format!("{base}/{p}"),
    };
    url.set_path(&joined);
    url
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::{
        BindParamsToJsonPayload, BindToIndexedFormParams, BindToJsonPayload, ErrorKind, FnFilter,
        Method, ParamSpec,
    };

    fn factory() -> RequestFactory {
        RequestFactory::new(Url::parse("https://compute.example.com/v2/tenant/").expect("url"))
    }

    #[test]
    fn resolves_path_and_encodes_segments() {
        let spec = MethodSpec::builder("getServer", Method::Get, "/servers/{serverId}")
            .param(ParamSpec::path("serverId"))
            .build()
            .expect("spec");

        let request = factory()
            .create(&spec, &Args::new().with("serverId", "a/b c"))
            .expect("request");
        let url = request.url();
        check!(url.as_str() == "https://compute.example.com/v2/tenant/servers/a%2Fb%20c");
        check!(request.method() == Method::Get);
    }

    #[test]
    fn missing_path_argument_is_configuration_error() {
        let spec = MethodSpec::builder("getServer", Method::Get, "/servers/{serverId}")
            .param(ParamSpec::path("serverId"))
            .build()
            .expect("spec");

        for args in [Args::new(), Args::new().with("serverId", Value::Null)] {
            let err = factory().create(&spec, &args).expect_err("unresolved");
            check!(err.kind() == ErrorKind::Configuration);
        }
    }

    #[test]
    fn static_and_templated_headers() {
        let spec = MethodSpec::builder("listRecords", Method::Get, "/zones/{zone}/records")
            .param(ParamSpec::path("zone"))
            .header("Accept", "application/json")
            .header("X-Zone", "{zone}")
            .build()
            .expect("spec");

        let request = RequestFactory::new(Url::parse("https://dns.example.com").expect("url"))
            .with_default_headers([("User-Agent", "cirrus")].into_iter().collect())
            .create(&spec, &Args::new().with("zone", "example.com."))
            .expect("request");

        check!(request.header("x-zone") == Some("example.com."));
        check!(request.header("accept") == Some("application/json"));
        check!(request.header("user-agent") == Some("cirrus"));
        let url = request.url();
        check!(url.as_str() == "https://dns.example.com/zones/example.com./records");
    }

    #[test]
    fn unresolved_header_placeholder_is_configuration_error() {
        let spec = MethodSpec::builder("head", Method::Head, "/")
            .header("X-Auth-Project-Id", "{project}")
            .build()
            .expect("spec");
        let err = factory().create(&spec, &Args::new()).expect_err("unresolved");
        check!(err.kind() == ErrorKind::Configuration);
    }

    #[test]
    fn query_header_and_form_arguments() {
        let spec = MethodSpec::builder("describe", Method::Post, "/")
            .form("Action", "DescribeInstances")
            .query("Version", "2016-11-15")
            .param(ParamSpec::form("ids", "InstanceId"))
            .param(ParamSpec::query_as("pageSize", "MaxResults"))
            .param(ParamSpec::query("marker"))
            .param(ParamSpec::header("token", "X-Session-Token"))
            .build()
            .expect("spec");

        let args = Args::new()
            .with("ids", json!(["i-1", "i-2"]))
            .with("pageSize", 50)
            .with("marker", Value::Null)
            .with("token", "tok");
        let request = factory().create(&spec, &args).expect("request");

        let url = request.url();
        check!(url.query() == Some("Version=2016-11-15&MaxResults=50"));
        check!(request.header("X-Session-Token") == Some("tok"));
        let form: Vec<_> = request.form_params().iter().collect();
        check!(form == vec![("Action", "DescribeInstances"), ("InstanceId", "i-1"), ("InstanceId", "i-2")]);
    }

    #[test]
    fn template_query_string_becomes_query_params() {
        let spec = MethodSpec::builder("listContainer", Method::Get, "/{container}?restype=container&comp=list")
            .param(ParamSpec::path("container"))
            .build()
            .expect("spec");
        let request = factory()
            .create(&spec, &Args::new().with("container", "logs"))
            .expect("request");
        check!(request.endpoint().path() == "/v2/tenant/logs");
        check!(request.query_params().get("comp") == Some("list"));
    }

    #[test]
    fn binders_run_in_declaration_order() {
        let spec = MethodSpec::builder("createTags", Method::Post, "/")
            .form("Action", "CreateTags")
            .bind_arg("resources", BindToIndexedFormParams::new("ResourceId"))
            .bind_arg("tags", BindToIndexedFormParams::with_suffixes("Tag", "Key", "Value"))
            .build()
            .expect("spec");

        let args = Args::new()
            .with("resources", json!(["i-1"]))
            .with("tags", json!({"Name": "web"}));
        let request = factory().create(&spec, &args).expect("request");

        let keys: Vec<_> = request.form_params().iter().map(|(k, _)| k).collect();
        check!(keys == vec!["Action", "ResourceId.1", "Tag.1.Key", "Tag.1.Value"]);
    }

    #[test]
    fn payload_params_collected_for_binder() {
        let spec = MethodSpec::builder("createImage", Method::Post, "/servers/{serverId}/action")
            .param(ParamSpec::path("serverId"))
            .param(ParamSpec::payload("name"))
            .param(ParamSpec::payload("metadata"))
            .bind_payload(BindParamsToJsonPayload::wrapped("createImage"))
            .build()
            .expect("spec");

        let args = Args::new()
            .with("serverId", "srv-1")
            .with("name", "nightly")
            .with("metadata", json!({"os": "linux"}));
        let request = factory().create(&spec, &args).expect("request");

        let expected = json!({"createImage": {"name": "nightly", "metadata": {"os": "linux"}}});
        let_assert!(Some(payload) = request.payload());
        check!(payload.as_json() == Some(&expected));
    }

    #[test]
    fn binder_source_missing_is_configuration_error() {
        let spec = MethodSpec::builder("createServer", Method::Post, "/servers")
            .bind_arg("server", BindToJsonPayload::wrapped("server"))
            .build()
            .expect("spec");

        let err = factory().create(&spec, &Args::new()).expect_err("missing");
        check!(err.kind() == ErrorKind::Configuration);

        let err = factory()
            .create(&spec, &Args::new().with("server", Value::Null))
            .expect_err("null");
        check!(err.kind() == ErrorKind::IllegalState);
    }

    #[test]
    fn filters_attached_not_run() {
        let spec = MethodSpec::builder("list", Method::Get, "/servers")
            .filter(FnFilter::new("method", |_request: Request| {
                Err(Error::configuration("must not run at build time"))
            }))
            .build()
            .expect("spec");

        let request = factory()
            .with_filters(FilterChain::new().with(FnFilter::new("client", Ok)))
            .create(&spec, &Args::new())
            .expect("filters do not run here");
        check!(request.filters().len() == 2);
    }
}
