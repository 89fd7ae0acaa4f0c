use std::fmt::Debug;

use enum_map::Enum;

use super::PropagationContext;
use crate::basic_types::PropagationStatus;
use crate::containers::StorageKey;
use crate::engine::VariableId;

/// The granularity of a domain change.
///
/// The variants are ordered by severity: a variable which became fixed ([`ChangeType::Value`])
/// also had a bound change ([`ChangeType::Range`]), which in turn is a change of the domain
/// ([`ChangeType::Domain`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enum)]
pub enum ChangeType {
    /// A value strictly between the bounds was removed.
    Domain,
    /// A bound moved.
    Range,
    /// The domain became a single value.
    Value,
}

/// Whether an arc reasons over the bounds of its operands only, or over their full domains
/// (including holes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ArcStrength {
    #[default]
    Bounds,
    Full,
}

/// Identifies an arc in the [`crate::engine::ConstraintGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcId {
    id: u32,
}

impl StorageKey for ArcId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        ArcId { id: index as u32 }
    }
}

/// What happened to the domain of a variable since the arcs depending on it last ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainDelta {
    /// The lower bound before the first change.
    pub old_min: i64,
    /// The upper bound before the first change.
    pub old_max: i64,
    /// Values which were removed from between the bounds, in the order they were removed. Values
    /// cut off by a bound change are not listed; they are implied by the old and the new bounds.
    pub removed: Vec<i64>,
}

/// A directed narrowing rule: it reads the domains of its sources and narrows the domain of its
/// target.
///
/// Arcs are pure: all of their state lives in the domains. They are owned by the
/// [`crate::engine::ConstraintGraph`], which runs an arc whenever one of its sources changes with at
/// least the severity of [`Arc::trigger`].
pub trait Arc: Debug {
    fn name(&self) -> &str;

    /// The variables whose changes can lead to narrowing of the target.
    fn sources(&self) -> &[VariableId];

    fn target(&self) -> VariableId;

    fn strength(&self) -> ArcStrength;

    /// The least severe change of a source which should trigger this arc.
    fn trigger(&self) -> ChangeType {
        match self.strength() {
            ArcStrength::Bounds => ChangeType::Range,
            ArcStrength::Full => ChangeType::Domain,
        }
    }

    /// Whether [`Arc::propagate`] wants to receive the delta of the source which triggered it.
    fn uses_delta(&self) -> bool {
        false
    }

    /// Narrows the target domain.
    ///
    /// `delta` is only provided to arcs which [use deltas](Arc::uses_delta), and only when the
    /// arc runs because of a change of one of its sources; otherwise the arc has to reason over the
    /// full domains.
    fn propagate(
        &self,
        context: &mut PropagationContext<'_>,
        delta: Option<&DomainDelta>,
    ) -> PropagationStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_types_are_ordered_by_severity() {
        assert!(ChangeType::Domain < ChangeType::Range);
        assert!(ChangeType::Range < ChangeType::Value);
    }
}
