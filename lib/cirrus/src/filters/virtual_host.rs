//! Virtual-host style bucket addressing.

use cirrus_core::{BoxFuture, Request, RequestFilter, Result};

/// Moves the first path segment into the host name.
///
/// `https://storage.example.com/photos/a.jpg` becomes
/// `https://photos.storage.example.com/a.jpg`. Segments that are not valid
/// DNS labels (uppercase, underscores, leading or trailing `-`) are left in
/// the path, as are requests to an IP address.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualHostFilter;

impl VirtualHostFilter {
    /// The filter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Rewrite `request`'s endpoint if its first segment is DNS-safe.
    ///
    /// # Errors
    ///
    /// Returns an error only if the rewritten request cannot be rebuilt.
    pub fn rewrite(request: Request) -> Result<Request> {
        let endpoint = request.endpoint();
        let Some(url::Host::Domain(host)) = endpoint.host() else {
            return Ok(request);
        };
        let path = endpoint.path().trim_start_matches('/');
        let (bucket, rest) = path.split_once('/').unwrap_or((path, ""));
        if !is_dns_label(bucket) {
            return Ok(request);
        }

        let mut url = endpoint.clone();
        if url.set_host(Some(&format!("{bucket}.{host}"))).is_err() {
            return Ok(request);
        }
        url.set_path(&format!("/{rest}"));

        tracing::trace!(%url, "virtual host rewrite");
        request.to_builder().endpoint(url).build()
    }
}

impl RequestFilter for VirtualHostFilter {
    fn filter<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Request>> {
        Box::pin(async move { Self::rewrite(request) })
    }
}

fn is_dns_label(segment: &str) -> bool {
    (3..=63).contains(&segment.len())
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !segment.starts_with('-')
        && !segment.ends_with('-')
}
