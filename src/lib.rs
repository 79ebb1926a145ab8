//! Structural cloning of Boon runtime values.
//!
//! [`shallow_clone`] copies one level and shares everything below it.
//! [`deep_clone`] duplicates the whole reachable graph, dispatching on
//! [`ValueKind`] and threading a [`Memo`] through the traversal so cycles
//! terminate and shared references stay shared in the copy.

// Composites hash by identity, not by their interior-mutable contents
#![allow(clippy::mutable_key_type)]

pub mod clone;
pub mod compare;
pub mod kind;
pub mod memo;
pub mod pattern;
pub mod value;

pub use clone::{CloneError, CloneResult, deep_clone, deep_clone_with, shallow_clone};
pub use compare::structurally_eq;
pub use kind::{ValueKind, classify};
pub use memo::{Memo, MemoStats};
pub use pattern::{Pattern, PatternError, PatternFlags, PatternMatch};
pub use value::{Function, Object, ObjectKind, ObjectRef, PropertyKey, Record, Symbol, Value};
