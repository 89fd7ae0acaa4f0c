use log::trace;

use super::VariableId;
use crate::basic_types::EmptyDomain;
use crate::basic_types::VariableSolution;
use crate::choice_point::ArrayId;
use crate::choice_point::ChoicePointStack;
use crate::choice_point::DataMap;
use crate::choice_point::EntryHandle;
use crate::choice_point::NumArraySet;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::propagation::ChangeType;
use crate::propagation::ReadDomains;
use crate::trellis_assert_extreme;
use crate::trellis_assert_moderate;

const MIN: usize = 0;
const MAX: usize = 1;

/// A single change to a domain, as reported by the mutators of [`Domains`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DomainEvent {
    pub(crate) variable: VariableId,
    pub(crate) change: ChangeType,
    pub(crate) old_min: i64,
    pub(crate) old_max: i64,
    /// The interior value which was removed, for [`ChangeType::Domain`] events.
    pub(crate) removed: Option<i64>,
}

type DomainResult = Result<Option<DomainEvent>, EmptyDomain>;

/// The domains of all variables, stored in choice-point entries.
///
/// The bounds of variable `i` are row `i` of a two-column [`NumArraySet`] array; the values removed
/// from between the bounds live in a [`DataMap`] keyed by variable, as a sorted list which only
/// holds values strictly between the bounds.
#[derive(Debug)]
pub(crate) struct Domains {
    bounds: EntryHandle<NumArraySet<i64>>,
    bounds_array: ArrayId,
    holes: EntryHandle<DataMap<VariableId, Vec<i64>>>,
    names: KeyedVec<VariableId, String>,
    initial_bounds: KeyedVec<VariableId, (i64, i64)>,
}

impl Domains {
    pub(crate) fn new(stack: &mut ChoicePointStack) -> Self {
        let bounds = stack.register(NumArraySet::new());
        let bounds_array = stack.entry_mut(&bounds).create_array(2);
        let holes = stack.register(DataMap::new());

        Domains {
            bounds,
            bounds_array,
            holes,
            names: KeyedVec::default(),
            initial_bounds: KeyedVec::default(),
        }
    }

    /// Adds a variable with domain `[min, max]`; only sound while the stack is at the root.
    pub(crate) fn add_variable(
        &mut self,
        stack: &mut ChoicePointStack,
        name: String,
        min: i64,
        max: i64,
    ) -> VariableId {
        trellis_assert_moderate!(stack.depth() == 0);
        trellis_assert_moderate!(min <= max);

        let row = stack
            .entry_mut(&self.bounds)
            .append_row(self.bounds_array, &[min, max]);
        let variable = self.names.push(name);
        let _ = self.initial_bounds.push((min, max));
        trellis_assert_moderate!(row == variable.index());

        variable
    }

    pub(crate) fn num_variables(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn variables(&self) -> impl Iterator<Item = VariableId> {
        self.names.keys()
    }

    pub(crate) fn name(&self, variable: VariableId) -> &str {
        &self.names[variable]
    }

    pub(crate) fn view<'a>(&'a self, stack: &'a ChoicePointStack) -> DomainView<'a> {
        DomainView {
            domains: self,
            stack,
        }
    }

    pub(crate) fn lower_bound(&self, stack: &ChoicePointStack, variable: VariableId) -> i64 {
        stack
            .entry(&self.bounds)
            .get(self.bounds_array, variable.index(), MIN)
    }

    pub(crate) fn upper_bound(&self, stack: &ChoicePointStack, variable: VariableId) -> i64 {
        stack
            .entry(&self.bounds)
            .get(self.bounds_array, variable.index(), MAX)
    }

    pub(crate) fn holes<'a>(&self, stack: &'a ChoicePointStack, variable: VariableId) -> &'a [i64] {
        stack
            .entry(&self.holes)
            .get(&variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn capture(&self, stack: &ChoicePointStack, variable: VariableId) -> VariableSolution {
        VariableSolution {
            name: self.name(variable).to_owned(),
            min: self.lower_bound(stack, variable),
            max: self.upper_bound(stack, variable),
            holes: self.holes(stack, variable).to_vec(),
        }
    }

    pub(crate) fn set_lower_bound(
        &self,
        stack: &mut ChoicePointStack,
        variable: VariableId,
        value: i64,
    ) -> DomainResult {
        let (min, max) = self.bounds_of(stack, variable);
        if value <= min {
            return Ok(None);
        }
        if value > max {
            return Err(EmptyDomain(variable));
        }

        // The upper bound is never a hole, so this stops at `max` at the latest.
        let holes = self.holes(stack, variable);
        let mut new_min = value;
        while holes.binary_search(&new_min).is_ok() {
            new_min += 1;
        }
        let remaining = holes
            .iter()
            .copied()
            .filter(|&hole| hole > new_min)
            .collect::<Vec<_>>();
        let holes_changed = remaining.len() != holes.len();

        if holes_changed {
            self.update_holes(stack, variable, remaining);
        }
        stack
            .entry_mut(&self.bounds)
            .set(self.bounds_array, variable.index(), MIN, new_min);

        let change = if new_min == max {
            ChangeType::Value
        } else {
            ChangeType::Range
        };
        Ok(Some(self.event(variable, change, min, max, None)))
    }

    pub(crate) fn set_upper_bound(
        &self,
        stack: &mut ChoicePointStack,
        variable: VariableId,
        value: i64,
    ) -> DomainResult {
        let (min, max) = self.bounds_of(stack, variable);
        if value >= max {
            return Ok(None);
        }
        if value < min {
            return Err(EmptyDomain(variable));
        }

        let holes = self.holes(stack, variable);
        let mut new_max = value;
        while holes.binary_search(&new_max).is_ok() {
            new_max -= 1;
        }
        let remaining = holes
            .iter()
            .copied()
            .filter(|&hole| hole < new_max)
            .collect::<Vec<_>>();
        let holes_changed = remaining.len() != holes.len();

        if holes_changed {
            self.update_holes(stack, variable, remaining);
        }
        stack
            .entry_mut(&self.bounds)
            .set(self.bounds_array, variable.index(), MAX, new_max);

        let change = if new_max == min {
            ChangeType::Value
        } else {
            ChangeType::Range
        };
        Ok(Some(self.event(variable, change, min, max, None)))
    }

    pub(crate) fn remove_value(
        &self,
        stack: &mut ChoicePointStack,
        variable: VariableId,
        value: i64,
    ) -> DomainResult {
        let (min, max) = self.bounds_of(stack, variable);
        if value < min || value > max {
            return Ok(None);
        }
        if min == max {
            return Err(EmptyDomain(variable));
        }
        if value == min {
            return self.set_lower_bound(stack, variable, value + 1);
        }
        if value == max {
            return self.set_upper_bound(stack, variable, value - 1);
        }

        let holes = self.holes(stack, variable);
        let Err(position) = holes.binary_search(&value) else {
            return Ok(None);
        };
        let mut updated = holes.to_vec();
        updated.insert(position, value);
        self.update_holes(stack, variable, updated);

        Ok(Some(self.event(
            variable,
            ChangeType::Domain,
            min,
            max,
            Some(value),
        )))
    }

    pub(crate) fn assign(
        &self,
        stack: &mut ChoicePointStack,
        variable: VariableId,
        value: i64,
    ) -> DomainResult {
        if !self.view(stack).contains(variable, value) {
            return Err(EmptyDomain(variable));
        }

        let (min, max) = self.bounds_of(stack, variable);
        if min == max {
            return Ok(None);
        }

        self.update_holes(stack, variable, vec![]);
        let bounds = stack.entry_mut(&self.bounds);
        bounds.set(self.bounds_array, variable.index(), MIN, value);
        bounds.set(self.bounds_array, variable.index(), MAX, value);

        Ok(Some(self.event(variable, ChangeType::Value, min, max, None)))
    }

    /// Replaces the domain of `variable` by the captured domain, which may be wider than the current
    /// one.
    pub(crate) fn overwrite(
        &self,
        stack: &mut ChoicePointStack,
        variable: VariableId,
        domain: &VariableSolution,
    ) -> Option<DomainEvent> {
        let (min, max) = self.bounds_of(stack, variable);
        if min == domain.min && max == domain.max && self.holes(stack, variable) == domain.holes {
            return None;
        }
        trace!("Overwriting the domain of {variable} with {domain}");

        self.update_holes(stack, variable, domain.holes.clone());
        let bounds = stack.entry_mut(&self.bounds);
        bounds.set(self.bounds_array, variable.index(), MIN, domain.min);
        bounds.set(self.bounds_array, variable.index(), MAX, domain.max);

        let change = if domain.is_fixed() {
            ChangeType::Value
        } else {
            ChangeType::Range
        };
        Some(self.event(variable, change, min, max, None))
    }

    /// Resets every domain to the bounds it was declared with; only sound at the root.
    pub(crate) fn restore_initial(&self, stack: &mut ChoicePointStack) {
        trellis_assert_moderate!(stack.depth() == 0);

        for variable in self.variables() {
            let (min, max) = self.initial_bounds[variable];
            self.update_holes(stack, variable, vec![]);
            let bounds = stack.entry_mut(&self.bounds);
            bounds.set(self.bounds_array, variable.index(), MIN, min);
            bounds.set(self.bounds_array, variable.index(), MAX, max);
        }
    }

    fn bounds_of(&self, stack: &ChoicePointStack, variable: VariableId) -> (i64, i64) {
        (
            self.lower_bound(stack, variable),
            self.upper_bound(stack, variable),
        )
    }

    fn update_holes(&self, stack: &mut ChoicePointStack, variable: VariableId, holes: Vec<i64>) {
        trellis_assert_extreme!(holes.windows(2).all(|pair| pair[0] < pair[1]));
        let map = stack.entry_mut(&self.holes);
        if holes.is_empty() {
            let _ = map.remove(&variable);
        } else {
            let _ = map.insert(variable, holes);
        }
    }

    fn event(
        &self,
        variable: VariableId,
        change: ChangeType,
        old_min: i64,
        old_max: i64,
        removed: Option<i64>,
    ) -> DomainEvent {
        DomainEvent {
            variable,
            change,
            old_min,
            old_max,
            removed,
        }
    }
}

/// A read-only view on the domains as they are on the choice-point stack right now.
#[derive(Clone, Copy, Debug)]
pub struct DomainView<'a> {
    domains: &'a Domains,
    stack: &'a ChoicePointStack,
}

impl<'a> DomainView<'a> {
    pub fn num_variables(&self) -> usize {
        self.domains.num_variables()
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> {
        self.domains.variables()
    }

    pub fn name(&self, variable: VariableId) -> &'a str {
        self.domains.name(variable)
    }
}

impl ReadDomains for DomainView<'_> {
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
