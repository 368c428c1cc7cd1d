//! Fallback policies: turning selected failures into default values.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{Error, ErrorKind, HttpError, Result};

/// What to do when a call fails with an HTTP error.
///
/// The default-producing variants list the statuses they apply to. A vendor
/// error classified as [`ErrorKind::ResourceNotFound`] under another status
/// (for example a `400` carrying `InvalidGroup.NotFound`) counts as a `404`.
///
/// # Example
///
/// ```
/// use cirrus_core::{ErrorKind, FallbackPolicy};
///
/// // `GET /servers/{id}` returns `None` when the server is gone.
/// let get_server = FallbackPolicy::null_on_not_found();
///
/// // Some vendors answer 409 while a resource is still being deleted.
/// let delete = FallbackPolicy::MapStatusCodeToException(vec![(409, ErrorKind::TransientService)]);
/// # let _ = (get_server, delete);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Surface every error.
    #[default]
    Propagate,
    /// Return the result type's null value (`None`, `()`).
    ReturnNull(Vec<u16>),
    /// Return an empty collection.
    ReturnEmptyCollection(Vec<u16>),
    /// Return `false`.
    ReturnFalse(Vec<u16>),
    /// Reclassify errors for the listed statuses, then surface them.
    MapStatusCodeToException(Vec<(u16, ErrorKind)>),
}

impl FallbackPolicy {
    /// [`FallbackPolicy::ReturnNull`] for `404`.
    #[must_use]
    pub fn null_on_not_found() -> Self {
        Self::ReturnNull(vec![404])
    }

    /// [`FallbackPolicy::ReturnEmptyCollection`] for `404`.
    #[must_use]
    pub fn empty_on_not_found() -> Self {
        Self::ReturnEmptyCollection(vec![404])
    }

    /// [`FallbackPolicy::ReturnFalse`] for `404`.
    #[must_use]
    pub fn false_on_not_found() -> Self {
        Self::ReturnFalse(vec![404])
    }

    /// Apply [`FallbackPolicy::MapStatusCodeToException`] to a freshly mapped
    /// error. Other variants leave it unchanged.
    #[must_use]
    pub fn reclassify(&self, error: HttpError) -> HttpError {
        match self {
            Self::MapStatusCodeToException(mapping) => {
                match mapping.iter().find(|(status, _)| *status == error.status()) {
                    Some((_, kind)) => error.with_kind(*kind),
                    None => error,
                }
            }
            _ => error,
        }
    }

    /// Turn a final error into a default value when this policy covers it.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged when the policy does not cover it, or
    /// [`Error::Configuration`] when the policy covers it but `T` has no such
    /// default.
    pub fn recover<T: FallbackValue>(&self, error: Error) -> Result<T> {
        let (statuses, value, name) = match self {
            Self::Propagate | Self::MapStatusCodeToException(_) => return Err(error),
            Self::ReturnNull(statuses) => (statuses, T::null(), "ReturnNull"),
            Self::ReturnEmptyCollection(statuses) => {
                (statuses, T::empty_collection(), "ReturnEmptyCollection")
            }
            Self::ReturnFalse(statuses) => (statuses, T::falsy(), "ReturnFalse"),
        };

        let Some(http) = error.as_http() else {
            return Err(error);
        };
        let covered = statuses.contains(&http.status())
            || (http.kind() == ErrorKind::ResourceNotFound && statuses.contains(&404));
        if !covered {
            return Err(error);
        }

        tracing::debug!(status = http.status(), policy = name, "fallback applied");
        value.ok_or_else(|| {
            Error::configuration(format!(
                "fallback {name} does not apply to result type {}",
                std::any::type_name::<T>()
            ))
        })
    }
}

/// Default values a result type can stand in with.
///
/// Domain types opt in with an empty impl; they then work with
/// [`FallbackPolicy::Propagate`] and `MapStatusCodeToException`, and a
/// default-producing policy on them is reported as a configuration error.
///
/// ```
/// use cirrus_core::FallbackValue;
///
/// struct Server;
/// impl FallbackValue for Server {}
///
/// assert!(Server::null().is_none());
/// assert_eq!(<Option<Server>>::null().map(|s| s.is_none()), Some(true));
/// ```
pub trait FallbackValue: Sized {
    /// Value for [`FallbackPolicy::ReturnNull`].
    fn null() -> Option<Self> {
        None
    }

    /// Value for [`FallbackPolicy::ReturnEmptyCollection`].
    fn empty_collection() -> Option<Self> {
        None
    }

    /// Value for [`FallbackPolicy::ReturnFalse`].
    fn falsy() -> Option<Self> {
        None
    }
}

impl<T> FallbackValue for Option<T> {
    fn null() -> Option<Self> {
        Some(None)
    }
}

impl FallbackValue for () {
    fn null() -> Option<Self> {
        Some(())
    }
}

impl FallbackValue for bool {
    fn falsy() -> Option<Self> {
        Some(false)
    }
}

impl FallbackValue for serde_json::Value {
    fn null() -> Option<Self> {
        Some(Self::Null)
    }
}

macro_rules! empty_collection {
    ($($ty:ident < $($param:ident),+ >),+ $(,)?) => {
        $(
            impl<$($param),+> FallbackValue for $ty<$($param),+> {
                fn empty_collection() -> Option<Self> {
                    Some(Self::new())
                }
            }
        )+
    };
}

empty_collection!(Vec<T>, HashMap<K, V>, BTreeMap<K, V>, HashSet<T>, BTreeSet<T>);

impl FallbackValue for String {}
impl FallbackValue for Bytes {}
impl FallbackValue for DateTime<Utc> {}
