//! Ordered multimap used for headers, query parameters and form parameters.

/// An ordered list of `(name, value)` pairs that allows repeated names.
///
/// Insertion order is preserved. Name matching is either exact (query and
/// form parameters) or ASCII case-insensitive (headers), chosen at
/// construction.
///
/// # Example
///
/// ```
/// use cirrus_core::Params;
///
/// let mut headers = Params::headers();
/// headers.append("X-Meta-Color", "blue");
/// headers.append("x-meta-color", "green");
///
/// assert_eq!(headers.get("X-META-COLOR"), Some("blue"));
/// assert_eq!(headers.get_all("x-meta-color").count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
    case_insensitive: bool,
}

impl Params {
    /// Empty multimap with exact name matching.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive: false,
        }
    }

    /// Empty multimap with case-insensitive name matching, for HTTP headers.
    #[must_use]
    pub const fn headers() -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive: true,
        }
    }

    fn matches(&self, candidate: &str, name: &str) -> bool {
        if self.case_insensitive {
            candidate.eq_ignore_ascii_case(name)
        } else {
            candidate == name
        }
    }

    /// Appends a pair, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replaces every value of `name` with a single value.
    ///
    /// The new pair takes the position of the first replaced entry, or is
    /// appended when the name was absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let position = self
            .entries
            .iter()
            .position(|(candidate, _)| self.matches(candidate, &name));
        self.remove(&name);
        match position {
            Some(index) if index <= self.entries.len() => {
                self.entries.insert(index, (name, value));
            }
            _ => self.entries.push((name, value)),
        }
    }

    /// Removes every value of `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        let case_insensitive = self.case_insensitive;
        self.entries.retain(|(candidate, _)| {
            if case_insensitive {
                !candidate.eq_ignore_ascii_case(name)
            } else {
                candidate != name
            }
        });
        before - self.entries.len()
    }

    /// First value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| self.matches(candidate, name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(candidate, _)| self.matches(candidate, name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if at least one value exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if names are matched case-insensitively.
    #[must_use]
    pub const fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Consume into the underlying pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.append(name, value);
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
