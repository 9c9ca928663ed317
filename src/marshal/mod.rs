// src/marshal/mod.rs

//! The marshalling capability consumed by the compiler.
//!
//! Marshalling backends form an ordered registry: `(predicate, codec)` pairs
//! tried in registration order, first match wins. The on-disk codec
//! implementations used at pipeline runtime are external collaborators; the
//! [`Dispatcher`] here models the dispatch contract the generated code
//! relies on, so that backend selection is an explicit capability lookup
//! rather than runtime type inspection.

use serde_json::Value;
use tracing::debug;

use crate::errors::{NbdagError, Result};

/// Default storage location the generated program points the marshalling
/// shim at when the pipeline config does not override it.
pub const DEFAULT_DATA_DIR: &str = "/marshal";

/// A marshalling backend: a named codec plus the predicate deciding which
/// values it handles.
pub trait Backend {
    /// Stable backend name, usable in diagnostics and generated output.
    fn name(&self) -> &str;

    /// Whether this backend can serialize `value`.
    fn can_handle(&self, value: &Value) -> bool;

    /// Serialize a value to bytes.
    fn save(&self, value: &Value) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes.
    fn load(&self, bytes: &[u8]) -> Result<Value>;
}

/// Ordered backend registry.
///
/// Backends are tried in registration order; the first whose predicate
/// accepts the value wins.
pub struct Dispatcher {
    backends: Vec<Box<dyn Backend>>,
}

impl Dispatcher {
    /// An empty registry.
    pub fn new() -> Self {
        Self { backends: Vec::new() }
    }

    /// Register a backend. Registration order is dispatch order.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        debug!(backend = backend.name(), "registering marshalling backend");
        self.backends.push(backend);
    }

    /// Names of all registered backends, in registration order.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// First registered backend that can handle `value`.
    pub fn backend_for(&self, value: &Value) -> Result<&dyn Backend> {
        self.backends
            .iter()
            .map(|b| b.as_ref())
            .find(|b| b.can_handle(value))
            .ok_or_else(|| {
                NbdagError::Marshal(format!(
                    "no registered backend can handle value: {value}"
                ))
            })
    }

    /// Look a backend up by name.
    pub fn backend_by_name(&self, name: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .map(|b| b.as_ref())
            .find(|b| b.name() == name)
    }

    /// Serialize through the first matching backend.
    pub fn save(&self, value: &Value) -> Result<Vec<u8>> {
        self.backend_for(value)?.save(value)
    }
}

impl Default for Dispatcher {
    /// The standard registry: structured values go through the JSON codec,
    /// anything else falls through to the raw-bytes backend.
    fn default() -> Self {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(JsonBackend));
        dispatcher.register(Box::new(BytesBackend));
        dispatcher
    }
}

/// Structured values, stored as canonical JSON.
pub struct JsonBackend;

impl Backend for JsonBackend {
    fn name(&self) -> &str {
        "json"
    }

    fn can_handle(&self, value: &Value) -> bool {
        !matches!(value, Value::String(s) if s.starts_with("base64:"))
    }

    fn save(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn load(&self, bytes: &[u8]) -> Result<Value> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Opaque byte payloads, carried as `base64:`-prefixed strings.
pub struct BytesBackend;

impl Backend for BytesBackend {
    fn name(&self) -> &str {
        "bytes"
    }

    fn can_handle(&self, _value: &Value) -> bool {
        true
    }

    fn save(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Ok(other.to_string().into_bytes()),
        }
    }

    fn load(&self, bytes: &[u8]) -> Result<Value> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok(Value::String(text))
    }
}
