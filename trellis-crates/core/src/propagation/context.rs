use super::ReadDomains;
use crate::basic_types::PropagationStatus;
use crate::choice_point::ChoicePointStack;
use crate::engine::ChangeQueue;
use crate::engine::DomainEvent;
use crate::engine::Domains;
use crate::engine::VariableId;

/// [`PropagationContext`] is passed to arcs during propagation.
///
/// It can be queried for the current domains (see [`ReadDomains`]) and used to narrow them. Every
/// narrowing is recorded so that the arcs depending on the changed variable run later in the pass.
#[derive(Debug)]
pub struct PropagationContext<'a> {
    stack: &'a mut ChoicePointStack,
    domains: &'a Domains,
    changes: &'a mut ChangeQueue,
    num_narrowings: u64,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(
        stack: &'a mut ChoicePointStack,
        domains: &'a Domains,
        changes: &'a mut ChangeQueue,
    ) -> Self {
        PropagationContext {
            stack,
            domains,
            changes,
            num_narrowings: 0,
        }
    }

    /// The number of narrowings made through this context.
    pub(crate) fn num_narrowings(&self) -> u64 {
        self.num_narrowings
    }

    pub fn set_lower_bound(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self.domains.set_lower_bound(self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    pub fn set_upper_bound(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self.domains.set_upper_bound(self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    pub fn remove_value(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self.domains.remove_value(self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    pub fn assign(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self.domains.assign(self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    /// Narrows the domain of `variable` to `[min, max]`.
    pub fn set_bounds(&mut self, variable: VariableId, min: i64, max: i64) -> PropagationStatus {
        self.set_lower_bound(variable, min)?;
        self.set_upper_bound(variable, max)
    }

    fn record(&mut self, event: Option<DomainEvent>) {
        if let Some(event) = event {
            self.num_narrowings += 1;
            self.changes.record(event);
        }
    }
}

impl ReadDomains for PropagationContext<'_> {
    fn lower_bound(&self, variable: VariableId) -> i64 {
        self.domains.lower_bound(self.stack, variable)
    }

    fn upper_bound(&self, variable: VariableId) -> i64 {
        self.domains.upper_bound(self.stack, variable)
    }

    fn holes(&self, variable: VariableId) -> &[i64] {
        self.domains.holes(self.stack, variable)
    }
}
