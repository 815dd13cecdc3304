//! Unfold Animation
//!
//! Timing-driven primitives for disclosure widgets.
//!
//! # Features
//!
//! - **Task Scheduler**: one-shot timeouts and animation frames over a
//!   virtual clock, driven by the host or by tests
//! - **Height Transitions**: open/close animation to and from intrinsic
//!   height, synchronized to measured content size
//! - **Lazy Mounting**: mount-on-first-open and unmount-after-close policy
//! - **Easing**: CSS timing functions, renderable and sampleable

pub mod easing;
pub mod height;
pub mod lazy;
pub mod scheduler;
pub mod serde_ms;

pub use easing::Easing;
pub use height::{
    ContentMeasure, CssTransition, Height, HeightStyle, HeightTransition, PhaseCallback,
    TransitionConfig, TransitionPhase,
};
pub use lazy::{LazyMount, LazyMountConfig};
pub use scheduler::{SchedulerHandle, TaskCallback, TaskId, TaskKind, TaskScheduler};
