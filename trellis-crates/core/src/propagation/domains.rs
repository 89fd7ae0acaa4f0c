use crate::engine::VariableId;

/// Read access to the current domains of the variables.
///
/// Implemented by [`crate::engine::DomainView`] (outside of propagation) and by
/// [`super::PropagationContext`] (inside an arc).
pub trait ReadDomains {
    fn lower_bound(&self, variable: VariableId) -> i64;

    fn upper_bound(&self, variable: VariableId) -> i64;

    /// The values strictly between the bounds which are not part of the domain, sorted.
    fn holes(&self, variable: VariableId) -> &[i64];

    fn contains(&self, variable: VariableId, value: i64) -> bool {
        self.lower_bound(variable) <= value
            && value <= self.upper_bound(variable)
            && self.holes(variable).binary_search(&value).is_err()
    }

    fn is_fixed(&self, variable: VariableId) -> bool {
        self.lower_bound(variable) == self.upper_bound(variable)
    }

    fn fixed_value(&self, variable: VariableId) -> Option<i64> {
        self.is_fixed(variable)
            .then(|| self.lower_bound(variable))
    }

    /// The truth value of a `{0, 1}` variable, if it is fixed.
    fn bool_value(&self, variable: VariableId) -> Option<bool> {
        self.fixed_value(variable).map(|value| value != 0)
    }

    /// The number of values in the domain, saturating at [`u64::MAX`].
    fn size(&self, variable: VariableId) -> u64 {
        let width =
            i128::from(self.upper_bound(variable)) - i128::from(self.lower_bound(variable)) + 1;
        let size = width - self.holes(variable).len() as i128;
        u64::try_from(size).unwrap_or(u64::MAX)
    }

    /// The value at position `n` when the domain is listed in increasing order, found by skipping
    /// holes rather than enumerating the domain.
    fn nth_value(&self, variable: VariableId, n: u64) -> Option<i64> {
        let mut candidate = i128::from(self.lower_bound(variable)) + i128::from(n);
        for &hole in self.holes(variable) {
            if i128::from(hole) <= candidate {
                candidate += 1;
            } else {
                break;
            }
        }
        i64::try_from(candidate)
            .ok()
            .filter(|&value| value <= self.upper_bound(variable))
    }
}
