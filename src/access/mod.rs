pub mod classifier;
pub mod identity;
pub mod scope;

pub use classifier::{classify, AccessClass};
pub use identity::{AccessLevel, Identity};
pub use scope::{scope_for, ScopePredicate};
