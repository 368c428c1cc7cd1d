//! Blob store API example
//!
//! Shows how a provider module wires the cirrus pipeline: one function per
//! method returning a [`MethodSpec`], a factory assembling the registry,
//! signing and error decoding, and a thin typed facade over [`ApiClient`].

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use std::collections::BTreeMap;
use std::time::Duration;

use cirrus::middleware::LoggingLayer;
use cirrus::prelude::*;
use cirrus::{ApiConfig, MethodRegistry};
use cirrus_core::{JsonErrorDecoder, StaticCredentials};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Data Types
// ============================================================================

/// A container of objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub count: u64,
    pub bytes: u64,
}

/// An object listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub bytes: u64,
    pub content_type: String,
}

// ============================================================================
// Method declarations
// ============================================================================

fn list_containers() -> Result<MethodSpec> {
    MethodSpec::builder("listContainers", Method::Get, "/")
        .header("Accept", "application/json")
        .query("format", "json")
        .fallback(FallbackPolicy::empty_on_not_found())
        .build()
}

fn create_container() -> Result<MethodSpec> {
    MethodSpec::builder("createContainer", Method::Put, "/{container}")
        .param(ParamSpec::path("container"))
        .build()
}

fn container_exists() -> Result<MethodSpec> {
    MethodSpec::builder("containerExists", Method::Head, "/{container}")
        .param(ParamSpec::path("container"))
        .fallback(FallbackPolicy::false_on_not_found())
        .build()
}

fn list_objects() -> Result<MethodSpec> {
    MethodSpec::builder("listObjects", Method::Get, "/{container}")
        .header("Accept", "application/json")
        .query("format", "json")
        .param(ParamSpec::path("container"))
        .param(ParamSpec::query("prefix"))
        .param(ParamSpec::query("limit"))
        .fallback(FallbackPolicy::empty_on_not_found())
        .build()
}

fn put_document() -> Result<MethodSpec> {
    MethodSpec::builder("putDocument", Method::Put, "/{container}/{name}")
        .param(ParamSpec::path("container"))
        .param(ParamSpec::path("name"))
        .bind_arg("metadata", BindMapToHeadersWithPrefix::new("X-Object-Meta-"))
        .bind_arg("document", BindToJsonPayload::new())
        .build()
}

fn get_document() -> Result<MethodSpec> {
    MethodSpec::builder("getDocument", Method::Get, "/{container}/{name}")
        .param(ParamSpec::path("container"))
        .param(ParamSpec::path("name"))
        .fallback(FallbackPolicy::null_on_not_found())
        .timeout(Duration::from_secs(10))
        .build()
}

fn delete_object() -> Result<MethodSpec> {
    MethodSpec::builder("deleteObject", Method::Delete, "/{container}/{name}")
        .param(ParamSpec::path("container"))
        .param(ParamSpec::path("name"))
        .fallback(FallbackPolicy::null_on_not_found())
        .build()
}

fn registry() -> Result<MethodRegistry> {
    [
        list_containers(),
        create_container(),
        container_exists(),
        list_objects(),
        put_document(),
        get_document(),
        delete_object(),
    ]
    .into_iter()
    .try_fold(MethodRegistry::new(), |registry, spec| registry.with(spec?))
}

// ============================================================================
// Provider assembly
// ============================================================================

/// Typed client for the blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    api: ApiClient<HyperClient>,
}

/// Assemble a blob store client for `endpoint`, signing with `identity`
/// and `secret`.
pub fn blobstore(endpoint: &str, identity: &str, secret: &str) -> Result<BlobStore> {
    let transport = HyperClient::builder()
        .user_agent("blobstore-demo/0.1")
        .layer(LoggingLayer::new().with_decoder(JsonErrorDecoder::default()))
        .build();
    let signer = SigningFilter::builder()
        .credentials(StaticCredentials::new(identity, secret))
        .build()?;
    let errors = ErrorMapper::new()
        .with_decoder(JsonErrorDecoder::default())
        .vendor_code("SlowDown", ErrorKind::TransientService);

    let api = ApiClient::new(transport, endpoint)?
        .with_registry(registry()?)
        .with_config(ApiConfig::default().with_default_header("X-Blob-Api-Version", "1"))
        .with_error_mapper(errors)
        .with_filter(signer);
    Ok(BlobStore { api })
}

impl BlobStore {
    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        self.api
            .invoke("listContainers", &Args::new(), &ParseJson::new())
            .await
    }

    pub async fn create_container(&self, container: &str) -> Result<()> {
        self.api
            .invoke(
                "createContainer",
                &Args::new().with("container", container),
                &ReleasePayload,
            )
            .await
    }

    pub async fn container_exists(&self, container: &str) -> Result<bool> {
        self.api
            .invoke(
                "containerExists",
                &Args::new().with("container", container),
                &ReturnTrueIf2xx,
            )
            .await
    }

    pub async fn list_objects(
        &self,
        container: &str,
        prefix: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<ObjectInfo>> {
        let args = Args::new()
            .with("container", container)
            .with("prefix", prefix)
            .with("limit", limit);
        self.api.invoke("listObjects", &args, &ParseJson::new()).await
    }

    /// Store `document` as JSON, returning its `ETag`.
    pub async fn put_document<T: Serialize>(
        &self,
        container: &str,
        name: &str,
        document: &T,
        metadata: &BTreeMap<String, String>,
    ) -> Result<String> {
        let args = Args::new()
            .with("container", container)
            .with("name", name)
            .serialize("document", document)?
            .serialize("metadata", metadata)?;
        self.api
            .invoke("putDocument", &args, &ParseHeader::new("ETag"))
            .await
    }

    pub async fn get_document<T>(&self, container: &str, name: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let args = Args::new().with("container", container).with("name", name);
        self.api.invoke("getDocument", &args, &ParseJson::new()).await
    }

    /// Delete an object. Deleting a missing object succeeds.
    pub async fn delete_object(&self, container: &str, name: &str) -> Result<()> {
        let args = Args::new().with("container", container).with("name", name);
        self.api.invoke("deleteObject", &args, &ReleasePayload).await
    }
}

// ============================================================================
// Main: Demonstrate usage
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = std::env::var("BLOBSTORE_ENDPOINT")
        .unwrap_or_else(|_| "https://storage.example.com/v1/AUTH_demo".to_string());
    let store = blobstore(&endpoint, "demo", "demo-secret")?;

    tracing::info!(%endpoint, "blob store client ready");
    println!("Registered methods:");
    for name in store.api.registry().names() {
        println!("  {name}");
    }

    if std::env::var_os("BLOBSTORE_LIVE").is_some() {
        for container in store.list_containers().await? {
            println!("{}: {} objects", container.name, container.count);
        }
    }

    Ok(())
}

// ============================================================================
// Tests using wiremock
// ============================================================================
