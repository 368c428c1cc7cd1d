//! Concrete request filters.
//!
//! - [`SigningFilter`] - HMAC-SHA256 signature over a canonical request string
//! - [`TokenAuthFilter`] - cached session token from an [`Authenticator`]
//! - [`VirtualHostFilter`] - bucket name moved from the path into the host
//!
//! Filters run on every attempt, right before the transport, in the order
//! they were attached: client-wide filters first, then the method's own.

mod signing;
mod token;
mod virtual_host;

pub use signing::{AUTH_SCHEME, DATE_HEADER, SigningFilter, SigningFilterBuilder, canonical_string};
pub use token::{Authenticator, TOKEN_HEADER, TokenAuthFilter};
pub use virtual_host::VirtualHostFilter;
