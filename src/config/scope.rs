//! # Request Scope
//!
//! Per-operation key/value storage for transient setting overrides.
//!
//! A scope lives for exactly one logical operation (an inbound request, one
//! scheduler attempt, ...). It is owned by the caller and passed explicitly to
//! every resolution call, so overrides never leak across operations.

use std::collections::HashMap;
use url::Url;

/// Value stored in a request scope
///
/// Scopes are loosely typed: a key may hold any variant and each resolver
/// tier only accepts the variant it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopedValue {
    Text(String),
    Integer(i64),
    Uri(Url),
}

impl ScopedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&Url> {
        match self {
            Self::Uri(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_uri(self) -> Option<Url> {
        match self {
            Self::Uri(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for ScopedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ScopedValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ScopedValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Url> for ScopedValue {
    fn from(value: Url) -> Self {
        Self::Uri(value)
    }
}

/// Scoped key/value store contract
///
/// Implementations bound to a hosting framework's request context only need
/// to guarantee that values written in one operation are invisible to others.
/// Lookups return owned values so contexts guarded by a lock or a `RefCell`
/// can implement the trait.
pub trait RequestScope {
    /// Look up a value
    fn get(&self, key: &str) -> Option<ScopedValue>;

    /// Store a value, replacing any previous one
    fn set(&mut self, key: &str, value: ScopedValue);

    /// Remove a value if present
    fn remove(&mut self, key: &str);
}

/// In-memory scope for a single logical operation
///
/// # Examples
///
/// ```rust
/// use revalee_client::config::{OperationScope, RequestScope, ScopedValue};
///
/// let mut scope = OperationScope::new();
/// scope.set("RevaleeRequestTimeout", ScopedValue::Integer(5_000));
/// let timeout = scope.get("RevaleeRequestTimeout");
/// assert_eq!(timeout.and_then(|value| value.as_integer()), Some(5_000));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperationScope {
    items: HashMap<String, ScopedValue>,
}

impl OperationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every override held by this scope
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl RequestScope for OperationScope {
    fn get(&self, key: &str) -> Option<ScopedValue> {
        self.items.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: ScopedValue) {
        self.items.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.items.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut scope = OperationScope::new();
        assert!(scope.is_empty());

        scope.set("key", ScopedValue::from("value"));
        assert_eq!(
            scope.get("key").and_then(ScopedValue::into_text).as_deref(),
            Some("value")
        );
        assert_eq!(scope.len(), 1);

        scope.set("key", ScopedValue::from(42));
        assert_eq!(scope.get("key").and_then(|value| value.as_integer()), Some(42));
        assert_eq!(scope.get("key").and_then(ScopedValue::into_text), None);

        scope.remove("key");
        assert!(scope.get("key").is_none());

        // Removing a missing key is a no-op
        scope.remove("key");
        assert!(scope.is_empty());
    }

    #[test]
    fn test_scopes_are_isolated() {
        let mut first = OperationScope::new();
        let second = OperationScope::new();

        first.set("key", ScopedValue::from("only-in-first"));
        assert!(second.get("key").is_none());
    }

    /// Scope backed by interior mutability, the way a hosting framework's
    /// request context stores its items
    #[derive(Default)]
    struct SharedContextScope {
        items: parking_lot::Mutex<HashMap<String, ScopedValue>>,
    }

    impl RequestScope for SharedContextScope {
        fn get(&self, key: &str) -> Option<ScopedValue> {
            self.items.lock().get(key).cloned()
        }

        fn set(&mut self, key: &str, value: ScopedValue) {
            self.items.lock().insert(key.to_string(), value);
        }

        fn remove(&mut self, key: &str) {
            self.items.lock().remove(key);
        }
    }

    #[test]
    fn test_lock_guarded_context_implements_scope() {
        let mut scope = SharedContextScope::default();
        let uri = Url::parse("https://callbacks.example.com/").unwrap();

        scope.set("uri", ScopedValue::from(uri.clone()));
        assert_eq!(scope.get("uri").and_then(ScopedValue::into_uri), Some(uri));

        scope.remove("uri");
        assert!(scope.get("uri").is_none());
    }
}
