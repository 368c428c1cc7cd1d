//! Prelude module for convenient imports.
//!
//! Re-exports what a provider module needs to declare and call methods:
//!
//! ```
//! use cirrus::prelude::*;
//! ```

pub use cirrus_core::prelude::*;
pub use cirrus_core::{
    BindChecksumsToJsonPayload, BindMapToHeadersWithPrefix, BindParamsToForm,
    BindParamsToJsonPayload, BindToIndexedFormParams, BindToJsonPayload, ErrorMapper,
    ParseHeader, ParseJson, ParseJsonField, ReleasePayload, ReturnString, ReturnTrueIf2xx,
};

pub use crate::filters::{SigningFilter, TokenAuthFilter, VirtualHostFilter};
pub use crate::{ApiClient, ApiConfig, HyperClient, LoadingCache, MethodRegistry, RetryExt};
pub use serde::{Deserialize, Serialize};
