//! Shared domain vocabulary for the Estate CRM.
//!
//! - [`enums`]: closed sets of values stored in status/category columns
//! - [`lifecycle`]: the interaction status machine and overdue detection
//! - [`serde_helpers`]: lenient decimals and absent-vs-null patch fields

pub mod enums;
pub mod lifecycle;
pub mod serde_helpers;

pub use enums::*;
pub use lifecycle::{DEFAULT_OVERDUE_DAYS, LifecycleAction, TransitionError, is_overdue};
