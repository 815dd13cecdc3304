//! # Unfold Component Library (unfold_cn)
//!
//! Disclosure components composed from the `unfold_core` and
//! `unfold_animation` primitives.
//!
//! - **Primitives**: `unfold_core` owns selection, registration and focus
//! - **Timing**: `unfold_animation` owns the scheduler, height transitions
//!   and lazy mounting
//! - **Components**: `unfold_cn` wires them together per widget
//!
//! ## Components
//!
//! - **Accordion** - stacked sections, single or multiple open
//! - **Collapsible** - one expandable section
//!
//! ## Example
//!
//! ```
//! use unfold_cn::prelude::*;
//!
//! let scheduler = TaskScheduler::new();
//! let mut faq = cn::accordion()
//!     .multi_open()
//!     .build(scheduler.handle())
//!     .unwrap();
//! faq.mount_item("a", ItemOptions::new(), || 40.0);
//! faq.mount_item("b", ItemOptions::new(), || 40.0);
//!
//! faq.open_all();
//! assert_eq!(faq.value().len(), 2);
//! ```

pub mod components;
pub mod key;

pub use components::*;
pub use key::InstanceKey;

/// Convenience module for accessing components with `cn::` prefix
pub mod cn {
    pub use crate::components::accordion::accordion;
    pub use crate::components::collapsible::collapsible;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cn;
    pub use crate::components::accordion::{
        Accordion, AccordionBuilder, AccordionMode, AccordionOptions, ItemOptions, ItemSnapshot,
    };
    pub use crate::components::collapsible::{Collapsible, CollapsibleBuilder};
    // Re-export commonly needed primitive types
    pub use unfold_animation::{Easing, Height, HeightStyle, TaskScheduler, TransitionPhase};
    pub use unfold_core::{ItemId, Key, KeyOutcome, KeyboardEvent, SelectionValue};
}
