//! Domain newtype for type safety
//!
//! Wraps domain strings to prevent accidentally passing email addresses
//! or other strings where domains are expected. Throttling and delivery
//! accounting both key off the recipient's mailbox provider, so the only
//! sanctioned way to get from an address to a domain is [`Domain::from_email`].

use std::{
    fmt::{self, Display},
    ops::Deref,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// Domain used for addresses that carry no `@` at all.
///
/// Such addresses still get queued (the store may hold historical data the
/// admission path has no business rejecting), they just share one throttle
/// window.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// A domain name string wrapper for type safety
///
/// This newtype prevents accidentally passing email addresses or other
/// strings where domain names are expected. The `#[repr(transparent)]`
/// attribute ensures this is a zero-cost abstraction at runtime.
///
/// # Examples
///
/// ```
/// use mailcast_common::Domain;
///
/// let domain = Domain::from_email("reader@Example.COM");
/// assert_eq!(domain.as_str(), "example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Domain(Arc<str>);

impl Domain {
    /// Create a new `Domain` from any type that can be converted to `Arc<str>`
    #[must_use]
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    /// Extract the domain from an email address.
    ///
    /// The text after the last `@` is ASCII-lowercased. Addresses without
    /// an `@` (or with nothing after it) map to [`UNKNOWN_DOMAIN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mailcast_common::Domain;
    ///
    /// assert_eq!(Domain::from_email("a@gmail.com").as_str(), "gmail.com");
    /// assert_eq!(Domain::from_email("not-an-address").as_str(), "unknown");
    /// ```
    #[must_use]
    pub fn from_email(email: &str) -> Self {
        match email.rsplit_once('@') {
            Some((_, domain)) if !domain.is_empty() => {
                Self(Arc::from(domain.to_ascii_lowercase()))
            }
            _ => Self(Arc::from(UNKNOWN_DOMAIN)),
        }
    }

    /// Get the domain as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the domain into the inner `Arc<str>`
    #[must_use]
    pub fn into_inner(self) -> Arc<str> {
        self.0
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Domain {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for Domain {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for Domain {
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

impl From<Domain> for Arc<str> {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_creation() {
        let domain = Domain::new("example.com");
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn test_from_email_lowercases() {
        let domain = Domain::from_email("Reader@GMAIL.Com");
        assert_eq!(domain.as_str(), "gmail.com");
    }

    #[test]
    fn test_from_email_takes_last_at() {
        // Quoted local parts can legally contain '@'
        let domain = Domain::from_email("\"odd@local\"@example.org");
        assert_eq!(domain.as_str(), "example.org");
    }

    #[test]
    fn test_from_email_missing_at() {
        assert_eq!(Domain::from_email("no-at-sign").as_str(), UNKNOWN_DOMAIN);
        assert_eq!(Domain::from_email("trailing@").as_str(), UNKNOWN_DOMAIN);
        assert_eq!(Domain::from_email("").as_str(), UNKNOWN_DOMAIN);
    }

    #[test]
    fn test_domain_display() {
        let domain = Domain::new("display.example.com");
        assert_eq!(format!("{domain}"), "display.example.com");
    }

    #[test]
    fn test_domain_equality_and_hash() {
        use std::collections::HashMap;

        let domain1 = Domain::from_email("a@example.com");
        let domain2 = Domain::new("example.com");
        assert_eq!(domain1, domain2);

        let mut map = HashMap::new();
        map.insert(domain1, 42);
        assert_eq!(map.get(&domain2), Some(&42));
    }

    #[test]
    fn test_domain_deref() {
        let domain = Domain::new("deref.example.com");
        assert_eq!(domain.len(), "deref.example.com".len());
        assert!(!domain.is_empty());
    }

    #[test]
    fn test_domain_serde() {
        let domain = Domain::new("serde.example.com");
        let serialized = serde_json::to_string(&domain).unwrap();
        assert_eq!(serialized, "\"serde.example.com\"");

        let deserialized: Domain = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, domain);
    }
}
