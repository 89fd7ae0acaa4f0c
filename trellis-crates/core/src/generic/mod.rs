//! Tensor indexing for families of constraints.
//!
//! A [`GenericExpr`] stands for an array of scalar instances, indexed by named dimensions
//! ([`GenericIndex`]). Fragments (slices) of an expression are extracted with
//! [`GenericExpr::create_fragment`], and the [`GenericIndexManager`] coordinates the dimensions of
//! the operands of a constraint when it is expanded or checked.
mod expression;
mod index;
mod manager;

pub(crate) use expression::Coordinates;
pub use expression::Fragment;
pub use expression::GenericExpr;
pub use index::GenericIndex;
pub use index::IndexBindings;
pub use manager::GenericIndexManager;
pub use manager::Role;
pub use manager::RoleOffsets;
