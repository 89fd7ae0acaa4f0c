//! The constraint families which can be posted to a [`crate::engine::ConstraintStore`].
//!
//! A [`Constraint`] is a description from which the store derives the [`Arc`]s that enforce it,
//! together with a check of whether the constraint is already decided by the current domains.
//! Each family is an operator enum with a shared arc implementation, rather than a type per
//! operator.
mod arithmetic;
mod boolean;
mod generic_boolean;

use std::fmt::Debug;

pub use arithmetic::*;
pub use boolean::*;
pub use generic_boolean::*;

use crate::basic_types::GenericIndexError;
use crate::containers::StorageKey;
use crate::propagation::Arc;
use crate::propagation::ReadDomains;

/// Whether a constraint is decided by the domains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Truth {
    /// Every assignment within the domains satisfies the constraint.
    True,
    /// No assignment within the domains satisfies the constraint.
    False,
    #[default]
    Undetermined,
}

impl Truth {
    pub fn is_determined(self) -> bool {
        self != Truth::Undetermined
    }
}

/// Identifies a constraint posted to a [`crate::engine::ConstraintStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId {
    id: u32,
}

impl StorageKey for ConstraintId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        ConstraintId { id: index as u32 }
    }
}

pub trait Constraint: Debug {
    fn name(&self) -> &str;

    /// Creates the arcs which enforce the constraint; called once when the constraint is posted.
    fn arcs(&self) -> Result<Vec<Box<dyn Arc>>, GenericIndexError>;

    /// Decides the constraint from the domains, if possible.
    fn truth(&self, domains: &dyn ReadDomains) -> Truth;
}
