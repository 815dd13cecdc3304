//! Stable unique keys for component instances
//!
//! Element ids derived from an instance key stay stable for the component's
//! lifetime and never collide between two instances, even when components
//! are built in a loop from the same call site.
//!
//! ```
//! use unfold_cn::InstanceKey;
//!
//! let key = InstanceKey::explicit("faq");
//! assert_eq!(key.derive("trigger", "shipping"), "faq-trigger-shipping");
//! ```

use std::fmt;
use std::sync::OnceLock;

use uuid::Uuid;

/// Unique key for one component instance
///
/// Key format: `{prefix}:{file}:{line}:{col}:{uuid}`
/// - prefix: component type ("accordion", "collapsible")
/// - file:line:col: where the builder was created
/// - uuid: unique per instance
///
/// Generated lazily on first access and cached.
pub struct InstanceKey {
    key: OnceLock<String>,
    prefix: &'static str,
    file: &'static str,
    line: u32,
    column: u32,
}

impl InstanceKey {
    /// Key from the caller's location plus a fresh UUID
    #[track_caller]
    pub fn new(prefix: &'static str) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            key: OnceLock::new(),
            prefix,
            file: loc.file(),
            line: loc.line(),
            column: loc.column(),
        }
    }

    /// Use a caller-provided key (for deterministic ids)
    pub fn explicit(key: impl Into<String>) -> Self {
        let instance = Self {
            key: OnceLock::new(),
            prefix: "",
            file: "",
            line: 0,
            column: 0,
        };
        let _ = instance.key.set(key.into());
        instance
    }

    pub fn get(&self) -> &str {
        self.key.get_or_init(|| {
            format!(
                "{}:{}:{}:{}:{}",
                self.prefix,
                self.file,
                self.line,
                self.column,
                Uuid::new_v4().as_simple()
            )
        })
    }

    /// Id for one part of one item, e.g. its trigger or content
    pub fn derive(&self, part: &str, item: &str) -> String {
        format!("{}-{}-{}", self.get(), part, item)
    }

    /// Source location the key was created at
    pub fn location(&self) -> (&'static str, u32, u32) {
        (self.file, self.line, self.column)
    }
}

impl Clone for InstanceKey {
    fn clone(&self) -> Self {
        // Clones share the generated key
        Self::explicit(self.get())
    }
}

impl PartialEq for InstanceKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for InstanceKey {}

impl fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceKey({})", self.get())
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}
