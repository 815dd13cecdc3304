//! Unfold components

pub mod accordion;
pub mod collapsible;

pub use accordion::{
    accordion, Accordion, AccordionBuilder, AccordionMode, AccordionOptions, ItemOptions,
    ItemSnapshot, OpenChangeCallback,
};
pub use collapsible::{collapsible, Collapsible, CollapsibleBuilder};
