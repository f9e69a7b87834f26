//! Shared pipeline state
//!
//! The `Context` struct is the mapping threaded through every stage of a run.
//! Stages read what earlier stages produced and return their own output as a
//! delta, which is merged additively: a key, once set, is never overwritten.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A typed name for an entry in a [`Context`]
///
/// Keys are declared once as constants and used for both reads and writes,
/// so a stage cannot store one type under a key and read back another.
///
/// # Example
///
/// ```
/// use agent_core::{Context, StateKey};
///
/// const SYMBOL: StateKey<String> = StateKey::new("symbol");
///
/// let mut ctx = Context::new();
/// ctx.set(SYMBOL, &"ACME".to_string()).unwrap();
/// assert_eq!(ctx.require(SYMBOL).unwrap(), "ACME");
/// ```
pub struct StateKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StateKey<T> {
    /// Declare a key
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key's name in the underlying mapping
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateKey").field(&self.name).finish()
    }
}

/// State passed between stages during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Key-value storage for state data
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Typed Operations ===========

    /// Store a typed value under `key`
    ///
    /// Serializes the value to JSON before storing.
    pub fn set<T: Serialize>(&mut self, key: StateKey<T>, value: &T) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!(
                "Failed to serialize state value '{}': {e}",
                key.name()
            ))
        })?;
        self.data.insert(key.name().to_string(), json_value);
        Ok(())
    }

    /// Builder form of [`Context::set`]
    pub fn with<T: Serialize>(mut self, key: StateKey<T>, value: &T) -> crate::Result<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Read a typed value, `None` if the key is absent
    pub fn read<T: for<'de> Deserialize<'de>>(&self, key: StateKey<T>) -> crate::Result<Option<T>> {
        match self.data.get(key.name()) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize state value '{}': {e}",
                        key.name()
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Read a typed value that an earlier stage must have produced
    pub fn require<T: for<'de> Deserialize<'de>>(&self, key: StateKey<T>) -> crate::Result<T> {
        self.read(key)?
            .ok_or_else(|| crate::Error::MissingState(key.name().to_string()))
    }

    // =========== Untyped Operations ===========

    /// Insert a raw JSON value
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a raw JSON value
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Names of every key currently set, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.data.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge a stage's output into this state
    ///
    /// Every key in `delta` must be new. On conflict nothing is merged and
    /// `Error::StateConflict` names the first offending key.
    pub fn merge(&mut self, delta: Context) -> crate::Result<()> {
        let mut conflicts: Vec<&String> = delta
            .data
            .keys()
            .filter(|k| self.data.contains_key(k.as_str()))
            .collect();
        conflicts.sort_unstable();
        if let Some(key) = conflicts.first() {
            return Err(crate::Error::StateConflict((*key).clone()));
        }

        self.data.extend(delta.data);
        Ok(())
    }

    /// Consume the context, returning the raw mapping
    pub fn into_inner(self) -> HashMap<String, serde_json::Value> {
        self.data
    }
}
