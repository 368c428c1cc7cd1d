//! End-to-end tests of the invocation pipeline against in-memory services.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use assert2::{check, let_assert};
use chrono::{TimeZone, Utc};
use cirrus::filters::{Authenticator, DATE_HEADER, SigningFilter, TOKEN_HEADER, TokenAuthFilter};
use cirrus::{ApiClient, ApiConfig, CacheLoader, CreateOrFetch, LoadingCache, MethodRegistry};
use cirrus_core::{
    Args, Backoff, BindChecksumsToJsonPayload, BindParamsToJsonPayload, BindToIndexedFormParams,
    BoxFuture, Credentials, Error, ErrorKind, ErrorMapper, FallbackPolicy, FallbackValue,
    FixedClock, HttpClient, JsonErrorDecoder, Method, MethodSpec, ParamSpec, Params, ParseJson,
    Request, Response, Result, RetryPolicy, ReturnTrueIf2xx, StaticCredentials,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Server {
    id: String,
    name: String,
}

impl FallbackValue for Server {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Group {
    name: String,
}

impl FallbackValue for Group {}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn json_response(status: u16, body: &serde_json::Value) -> Result<Response> {
    let mut headers = Params::headers();
    headers.set("Content-Type", "application/json");
    Ok(Response::new(status, headers, body.to_string()))
}

fn status(status: u16) -> Result<Response> {
    Ok(Response::status_only(status))
}

/// Answers with a fixed script of outcomes and records what it was sent.
#[derive(Debug, Default)]
struct Scripted {
    script: Mutex<VecDeque<Result<Response>>>,
    sent: Mutex<Vec<Request>>,
}

impl Scripted {
    fn new(outcomes: impl IntoIterator<Item = Result<Response>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn silent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn sent(&self) -> Vec<Request> {
        lock(&self.sent).clone()
    }
}

impl HttpClient for Scripted {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        lock(&self.sent).push(request);
        let outcome = lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Err(Error::illegal_state("script exhausted")));
        async move { outcome }
    }
}

/// Never answers within a test's patience.
#[derive(Debug)]
struct Stalled;

impl HttpClient for Stalled {
    fn execute(&self, _request: Request) -> impl Future<Output = Result<Response>> + Send {
        async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            status(200)
        }
    }
}

fn servers_api() -> MethodRegistry {
    MethodRegistry::new()
        .with(
            MethodSpec::builder("listServers", Method::Get, "/servers")
                .header("Accept", "application/json")
                .fallback(FallbackPolicy::empty_on_not_found())
                .build()
                .expect("listServers"),
        )
        .and_then(|r| {
            r.with(
                MethodSpec::builder("getServer", Method::Get, "/servers/{id}")
                    .param(ParamSpec::path("id"))
                    .fallback(FallbackPolicy::null_on_not_found())
                    .build()
                    .expect("getServer"),
            )
        })
        .and_then(|r| {
            r.with(
                MethodSpec::builder("rebootServer", Method::Post, "/servers/{id}/action")
                    .param(ParamSpec::path("id"))
                    .retry(RetryPolicy::never())
                    .fallback(FallbackPolicy::empty_on_not_found())
                    .build()
                    .expect("rebootServer"),
            )
        })
        .expect("registry")
}

fn api<C: HttpClient>(client: C) -> ApiClient<C> {
    ApiClient::new(client, "https://compute.example.com/v2")
        .expect("endpoint")
        .with_registry(servers_api())
}

fn servers_body() -> serde_json::Value {
    json!([
        {"id": "71", "name": "web-1"},
        {"id": "72", "name": "web-2"},
    ])
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_success() {
    let client = Scripted::new([status(503), status(503), json_response(200, &servers_body())]);

    let servers: Vec<Server> = api(Arc::clone(&client))
        .invoke("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect("servers");

    check!(servers.len() == 2);
    check!(client.sent().len() == 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_the_last_error() {
    let client = Scripted::new((0..5).map(|_| status(503)));

    let err = api(Arc::clone(&client))
        .invoke::<ParseJson<Vec<Server>>>("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect_err("still unavailable");

    check!(err.kind() == ErrorKind::TransientService);
    check!(err.status() == Some(503));
    check!(client.sent().len() == 5);
}

#[tokio::test]
async fn not_found_falls_back_to_an_empty_collection() {
    let client = Scripted::new([status(404)]);

    let servers: Vec<Server> = api(Arc::clone(&client))
        .invoke("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect("fallback");

    check!(servers.is_empty());
    check!(client.sent().len() == 1);
}

#[tokio::test]
async fn not_found_falls_back_to_none() {
    let client = Scripted::new([status(404)]);

    let server: Option<Server> = api(client)
        .invoke("getServer", &Args::new().with("id", "99"), &ParseJson::new())
        .await
        .expect("fallback");

    check!(server.is_none());
}

#[tokio::test]
async fn fallback_does_not_cover_other_statuses() {
    let client = Scripted::new([status(500)]);

    let err = api(Arc::clone(&client))
        .invoke::<ParseJson<Vec<Server>>>(
            "rebootServer",
            &Args::new().with("id", "71"),
            &ParseJson::new(),
        )
        .await
        .expect_err("server error");

    check!(err.status() == Some(500));
    check!(client.sent().len() == 1);
    let_assert!(Some(http) = err.as_http());
    check!(http.url() == Some("https://compute.example.com/v2/servers/71/action"));
}

#[tokio::test]
async fn arguments_are_resolved_into_the_request() {
    let client = Scripted::new([json_response(200, &json!({"id": "71", "name": "web-1"}))]);

    let server: Option<Server> = api(Arc::clone(&client))
        .invoke("getServer", &Args::new().with("id", "71"), &ParseJson::new())
        .await
        .expect("server");

    check!(server.map(|s| s.name).as_deref() == Some("web-1"));
    let sent = client.sent();
    let_assert!([request] = sent.as_slice());
    check!(request.method() == Method::Get);
    check!(request.url().as_str() == "https://compute.example.com/v2/servers/71");
}

#[tokio::test]
async fn unknown_methods_are_rejected_before_sending() {
    let client = Scripted::silent();

    let err = api(Arc::clone(&client))
        .invoke::<ParseJson<serde_json::Value>>("resizeServer", &Args::new(), &ParseJson::new())
        .await
        .expect_err("unknown method");

    check!(err.kind() == ErrorKind::Configuration);
    check!(client.sent().is_empty());
}

#[tokio::test]
async fn missing_path_arguments_are_not_retried() {
    let client = Scripted::silent();

    let err = api(Arc::clone(&client))
        .invoke::<ParseJson<Option<Server>>>("getServer", &Args::new(), &ParseJson::new())
        .await
        .expect_err("missing id");

    check!(err.kind() == ErrorKind::Configuration);
    check!(client.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn method_timeout_bounds_each_attempt() {
    let registry = MethodRegistry::new()
        .with(
            MethodSpec::builder("listServers", Method::Get, "/servers")
                .timeout(Duration::from_millis(100))
                .retry(RetryPolicy::never())
                .build()
                .expect("spec"),
        )
        .expect("registry");
    let api = ApiClient::new(Stalled, "https://compute.example.com/v2")
        .expect("endpoint")
        .with_registry(registry);

    let started = tokio::time::Instant::now();
    let err = api
        .invoke::<ParseJson<Vec<Server>>>("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect_err("timed out");

    check!(err.is_timeout());
    check!(started.elapsed() >= Duration::from_millis(100));
    check!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn vendor_codes_reclassify_errors() {
    let throttled = json!({"error": {"code": "RequestLimitExceeded", "message": "Request limit exceeded."}});
    let client = Scripted::new([
        json_response(400, &throttled),
        json_response(200, &servers_body()),
    ]);
    let mapper = ErrorMapper::new()
        .with_decoder(JsonErrorDecoder::default())
        .vendor_code("RequestLimitExceeded", ErrorKind::TransientService);

    let servers: Vec<Server> = api(Arc::clone(&client))
        .with_error_mapper(mapper)
        .invoke("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect("servers");

    check!(servers.len() == 2);
    check!(client.sent().len() == 2);
}

#[tokio::test]
async fn vendor_not_found_takes_the_not_found_fallback() {
    let missing = json!({"error": {"code": "InvalidServer.NotFound", "message": "no such server"}});
    let client = Scripted::new([json_response(400, &missing)]);
    let mapper = ErrorMapper::new()
        .with_decoder(JsonErrorDecoder::default())
        .vendor_code("InvalidServer.NotFound", ErrorKind::ResourceNotFound);

    let server: Option<Server> = api(client)
        .with_error_mapper(mapper)
        .invoke("getServer", &Args::new().with("id", "99"), &ParseJson::new())
        .await
        .expect("fallback");

    check!(server.is_none());
}

#[tokio::test]
async fn error_message_and_body_come_from_the_vendor_document() {
    let denied = json!({"error": {"code": "UnauthorizedOperation", "message": "You are not authorized"}});
    let client = Scripted::new([json_response(403, &denied)]);

    let err = api(client)
        .with_error_mapper(ErrorMapper::new().with_decoder(JsonErrorDecoder::default()))
        .invoke::<ParseJson<Vec<Server>>>("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect_err("denied");

    check!(err.kind() == ErrorKind::Authentication);
    let_assert!(Some(http) = err.as_http());
    check!(http.message() == "You are not authorized");
    check!(http.vendor_code() == Some("UnauthorizedOperation"));
    check!(err.body().is_some());
}

#[derive(Debug)]
struct CountingAuthenticator {
    calls: Arc<AtomicU32>,
}

impl Authenticator for CountingAuthenticator {
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{}-token-{n}", credentials.identity()))
        })
    }
}

fn token_filter(calls: &Arc<AtomicU32>) -> TokenAuthFilter<CountingAuthenticator> {
    TokenAuthFilter::new(
        Arc::new(StaticCredentials::new("demo", "secret")),
        CountingAuthenticator {
            calls: Arc::clone(calls),
        },
        Duration::from_secs(3600),
    )
}

#[tokio::test(start_paused = true)]
async fn authentication_failure_refreshes_the_token() {
    let calls = Arc::new(AtomicU32::new(0));
    let client = Scripted::new([status(401), json_response(200, &servers_body())]);
    let config = ApiConfig::default().with_retry(
        RetryPolicy::builder()
            .retry_on(ErrorKind::Authentication)
            .backoff(Backoff::none())
            .build(),
    );

    let servers: Vec<Server> = api(Arc::clone(&client))
        .with_config(config)
        .with_filter(token_filter(&calls))
        .invoke("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect("servers");

    check!(servers.len() == 2);
    check!(calls.load(Ordering::SeqCst) == 2);
    let tokens: Vec<_> = client
        .sent()
        .iter()
        .map(|r| r.header(TOKEN_HEADER).map(str::to_string))
        .collect();
    check!(tokens == [Some("demo-token-1".to_string()), Some("demo-token-2".to_string())]);
}

#[tokio::test]
async fn authentication_failure_is_final_by_default() {
    let calls = Arc::new(AtomicU32::new(0));
    let client = Scripted::new([status(401)]);

    let err = api(Arc::clone(&client))
        .with_filter(token_filter(&calls))
        .invoke::<ParseJson<Vec<Server>>>("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect_err("unauthorized");

    check!(err.kind() == ErrorKind::Authentication);
    check!(client.sent().len() == 1);
    check!(calls.load(Ordering::SeqCst) == 1);
}

#[tokio::test]
async fn rejected_token_is_not_reused_by_the_next_call() {
    let calls = Arc::new(AtomicU32::new(0));
    let client = Scripted::new([status(401), status(401), json_response(200, &servers_body())]);
    let api = api(Arc::clone(&client)).with_filter(token_filter(&calls));

    for _ in 0..2 {
        let err = api
            .invoke::<ParseJson<Vec<Server>>>("listServers", &Args::new(), &ParseJson::new())
            .await
            .expect_err("unauthorized");
        check!(err.kind() == ErrorKind::Authentication);
    }
    let servers: Vec<Server> = api
        .invoke("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect("servers");

    check!(servers.len() == 2);
    check!(calls.load(Ordering::SeqCst) == 3);
    let tokens: Vec<_> = client
        .sent()
        .iter()
        .map(|r| r.header(TOKEN_HEADER).map(str::to_string))
        .collect();
    check!(
        tokens
            == [
                Some("demo-token-1".to_string()),
                Some("demo-token-2".to_string()),
                Some("demo-token-3".to_string()),
            ]
    );
}

#[tokio::test(start_paused = true)]
async fn every_attempt_is_signed() {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).single().expect("date"),
    ));
    let signer = SigningFilter::builder()
        .credentials(StaticCredentials::new("demo", "secret"))
        .clock(clock)
        .build()
        .expect("signer");
    let client = Scripted::new([status(503), json_response(200, &servers_body())]);

    let _: Vec<Server> = api(Arc::clone(&client))
        .with_filter(signer)
        .invoke("listServers", &Args::new(), &ParseJson::new())
        .await
        .expect("servers");

    let sent = client.sent();
    check!(sent.len() == 2);
    for request in &sent {
        check!(request.header(DATE_HEADER) == Some("Sun, 06 Nov 1994 08:49:37 GMT"));
        let_assert!(Some(authorization) = request.header("Authorization"));
        check!(authorization.starts_with("CIRRUS demo:"));
    }
    check!(sent[0].header("Authorization") == sent[1].header("Authorization"));
}

#[tokio::test]
async fn checksums_are_bound_into_a_json_payload() {
    let registry = MethodRegistry::new()
        .with(
            MethodSpec::builder("verifyChecksums", Method::Post, "/containers/{container}/checksums")
                .param(ParamSpec::path("container"))
                .bind_arg("checksums", BindChecksumsToJsonPayload)
                .build()
                .expect("spec"),
        )
        .expect("registry");
    let client = Scripted::new([status(204)]);
    let api = ApiClient::new(Arc::clone(&client), "https://storage.example.com/v1")
        .expect("endpoint")
        .with_registry(registry);

    let args = Args::new()
        .with("container", "photos")
        .with("checksums", json!({"abc123": "valA", "1234": "valB"}));
    let ok = api
        .invoke("verifyChecksums", &args, &ReturnTrueIf2xx)
        .await
        .expect("accepted");

    check!(ok);
    let sent = client.sent();
    let_assert!([request] = sent.as_slice());
    check!(request.content_type() == Some("application/json"));
    let_assert!(Ok(Some(body)) = request.body_bytes());
    check!(body.as_ref() == br#"{"checksums":{"abc123":"valA","1234":"valB"}}"#);
}

#[tokio::test]
async fn indexed_form_params_are_bound() {
    let registry = MethodRegistry::new()
        .with(
            MethodSpec::builder("describeSecurityGroups", Method::Post, "/")
                .form("Action", "DescribeSecurityGroups")
                .bind_arg("names", BindToIndexedFormParams::new("GroupName"))
                .fallback(FallbackPolicy::empty_on_not_found())
                .build()
                .expect("spec"),
        )
        .expect("registry");
    let client = Scripted::new([json_response(200, &json!([]))]);
    let api = ApiClient::new(Arc::clone(&client), "https://ec2.example.com/")
        .expect("endpoint")
        .with_registry(registry);

    let groups: Vec<Group> = api
        .invoke(
            "describeSecurityGroups",
            &Args::new().with("names", json!(["web", "db", "web"])),
            &ParseJson::new(),
        )
        .await
        .expect("groups");

    check!(groups.is_empty());
    let sent = client.sent();
    let_assert!([request] = sent.as_slice());
    let form: Vec<_> = request.form_params().iter().collect();
    check!(
        form == [
            ("Action", "DescribeSecurityGroups"),
            ("GroupName.1", "web"),
            ("GroupName.2", "db"),
        ]
    );
}

/// Security-group service. `racing_creates` is how many creates find the
/// group already made by another client and answer with a conflict.
#[derive(Debug, Default)]
struct GroupService {
    groups: Mutex<BTreeMap<String, Group>>,
    creates: AtomicU32,
    racing_creates: AtomicU32,
    requests: AtomicU32,
}

impl GroupService {
    fn handle(&self, request: &Request) -> Result<Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let path = request.url().path().to_string();
        match (request.method(), path.strip_prefix("/groups")) {
            (Method::Get, Some(name)) => {
                let name = name.trim_start_matches('/');
                match lock(&self.groups).get(name) {
                    Some(group) => json_response(200, &json!(group)),
                    None => json_response(
                        404,
                        &json!({"error": {"code": "InvalidGroup.NotFound", "message": "no such group"}}),
                    ),
                }
            }
            (Method::Post, Some("")) => {
                let body = request.body_bytes()?.unwrap_or_default();
                let document: serde_json::Value = serde_json::from_slice(&body)?;
                let group: Group = serde_json::from_value(document["group"].clone())?;
                if self
                    .racing_creates
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    lock(&self.groups).insert(group.name.clone(), group);
                    return json_response(
                        409,
                        &json!({"error": {"code": "InvalidGroup.Duplicate", "message": "group exists"}}),
                    );
                }
                self.creates.fetch_add(1, Ordering::SeqCst);
                lock(&self.groups).insert(group.name.clone(), group.clone());
                json_response(200, &json!(group))
            }
            _ => status(400),
        }
    }
}

impl HttpClient for GroupService {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.handle(&request)
        }
    }
}

fn groups_api(service: &Arc<GroupService>) -> ApiClient<Arc<GroupService>> {
    let registry = MethodRegistry::new()
        .with(
            MethodSpec::builder("getGroup", Method::Get, "/groups/{name}")
                .param(ParamSpec::path("name"))
                .fallback(FallbackPolicy::null_on_not_found())
                .build()
                .expect("getGroup"),
        )
        .and_then(|r| {
            r.with(
                MethodSpec::builder("createGroup", Method::Post, "/groups")
                    .param(ParamSpec::payload("name"))
                    .bind_payload(BindParamsToJsonPayload::wrapped("group"))
                    .build()
                    .expect("createGroup"),
            )
        })
        .expect("registry");
    let errors = ErrorMapper::new()
        .with_decoder(JsonErrorDecoder::default())
        .vendor_code("InvalidGroup.Duplicate", ErrorKind::TransientService);
    ApiClient::new(Arc::clone(service), "https://network.example.com/")
        .expect("endpoint")
        .with_registry(registry)
        .with_error_mapper(errors)
}

fn group_cache(
    service: &Arc<GroupService>,
) -> LoadingCache<String, Group, impl CacheLoader<String, Group>> {
    let api = Arc::new(groups_api(service));
    let fetch_api = Arc::clone(&api);
    LoadingCache::new(CreateOrFetch::new(
        move |name: String| {
            let api = Arc::clone(&fetch_api);
            async move {
                let args = Args::new().with("name", name);
                api.invoke("getGroup", &args, &ParseJson::<Option<Group>>::new())
                    .await
            }
        },
        move |name: String| {
            let api = Arc::clone(&api);
            async move {
                let args = Args::new().with("name", name);
                api.invoke("createGroup", &args, &ParseJson::<Group>::new())
                    .await
            }
        },
    ))
}

#[tokio::test(start_paused = true)]
async fn missing_group_is_created_once_for_concurrent_callers() {
    let service = Arc::new(GroupService::default());
    let groups = group_cache(&service);

    let key = "my-group".to_string();
    let (first, second) = tokio::join!(groups.get(&key), groups.get(&key));

    let_assert!(Ok(first) = first);
    let_assert!(Ok(second) = second);
    check!(first.name == "my-group");
    check!(first == second);
    check!(service.creates.load(Ordering::SeqCst) == 1);
    check!(groups.get_if_present(&key).is_some());
}

#[tokio::test(start_paused = true)]
async fn create_conflict_is_resolved_by_fetching_again() {
    let service = Arc::new(GroupService {
        racing_creates: AtomicU32::new(1),
        ..GroupService::default()
    });
    let groups = group_cache(&service);

    let_assert!(Ok(group) = groups.get(&"my-group".to_string()).await);

    check!(group.name == "my-group");
    check!(service.creates.load(Ordering::SeqCst) == 0);
    // fetch (404), create (409), fetch (200)
    check!(service.requests.load(Ordering::SeqCst) == 3);
}
