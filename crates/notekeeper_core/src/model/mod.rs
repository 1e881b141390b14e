//! Domain model for notes, their checklist tasks and categories.
//!
//! # Responsibility
//! - Define the records exchanged with repository callers.
//! - Own field validation so repositories can reject input before touching
//!   the store.
//!
//! # Invariants
//! - Ids are store-generated integers and never reused.
//! - A note references its category by name, not by id.

pub mod category;
pub mod note;
pub mod task;
pub mod validation;
