//! Unfold Core
//!
//! Behavioral primitives for disclosure widgets (accordions and friends).
//! Nothing in this crate renders; it owns state and answers questions.
//!
//! - [`SelectionController`]: which items are open, single or multiple,
//!   controlled or uncontrolled
//! - [`ItemRegistry`]: ordered arena of mounted items
//! - [`FocusNavigator`]: roving-focus keyboard navigation over the registry
//!
//! Timing-driven primitives (height transitions, lazy mounting) live in
//! `unfold_animation`.

pub mod error;
pub mod focus;
pub mod id;
pub mod input;
pub mod registry;
pub mod selection;

pub use error::{ConfigError, Result};
pub use focus::{FocusNavigator, KeyOutcome, NavIntent, NavigatorConfig, Orientation};
pub use id::ItemId;
pub use input::{Key, KeyState, KeyboardEvent, Modifiers};
pub use registry::{ItemEntry, ItemRegistry};
pub use selection::{
    ItemCallback, SelectionConfig, SelectionController, SelectionMode, SelectionValue,
    ValueCallback, ValueChange,
};
