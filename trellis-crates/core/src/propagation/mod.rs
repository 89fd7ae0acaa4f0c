//! Contains the building blocks of propagation.
//!
//! An [`Arc`] narrows the domain of one target variable based on the domains of its source
//! variables. A constraint posts one arc per direction in which it can narrow (e.g. `x ∧ y = z`
//! posts a forward arc `x, y → z` and the reflex arcs `z, y → x` and `z, x → y`). The
//! [`crate::engine::ConstraintGraph`] runs arcs until no arc can narrow any domain further (a
//! fixpoint), or until a domain becomes empty.
//!
//! Arcs read domains through [`ReadDomains`] and narrow them through the [`PropagationContext`];
//! they are triggered by changes of their sources of at least a given [`ChangeType`].
mod arc;
mod context;
mod domains;

pub use arc::Arc;
pub use arc::ArcId;
pub use arc::ArcStrength;
pub use arc::ChangeType;
pub use arc::DomainDelta;
pub use context::PropagationContext;
pub use domains::ReadDomains;
