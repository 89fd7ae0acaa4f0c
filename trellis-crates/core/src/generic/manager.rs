use enum_map::Enum;
use enum_map::EnumMap;

use super::Coordinates;
use super::GenericIndex;
use super::IndexBindings;

/// The operand positions of a (at most) ternary constraint `Z = X op Y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum)]
pub enum Role {
    X,
    Y,
    Z,
}

/// For one coordinate of a [`GenericIndexManager`], the offset into the elements of each role's
/// expression. A role without dimensions always has offset 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleOffsets {
    offsets: EnumMap<Role, usize>,
}

impl RoleOffsets {
    pub fn offset(&self, role: Role) -> usize {
        self.offsets[role]
    }
}

/// Coordinates the dimensions of up to three operands, each of which may span its own (possibly
/// overlapping) set of [`GenericIndex`]es.
///
/// The manager iterates over the union of all dimensions. An index with a value in the provided
/// [`IndexBindings`] is restricted to that value; unbound indices are iterated over all of their
/// coordinates.
#[derive(Clone, Debug, Default)]
pub struct GenericIndexManager {
    roles: EnumMap<Role, Vec<GenericIndex>>,
    strides: EnumMap<Role, Vec<usize>>,
    dimensions: Vec<GenericIndex>,
}

impl GenericIndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the dimensions of `role`, in the order in which its expression stores them.
    pub fn with_role(mut self, role: Role, indices: &[GenericIndex]) -> Self {
        self.set_role(role, indices);
        self
    }

    pub fn set_role(&mut self, role: Role, indices: &[GenericIndex]) {
        let mut strides = vec![1; indices.len()];
        for dimension in (0..indices.len().saturating_sub(1)).rev() {
            strides[dimension] = strides[dimension + 1] * indices[dimension + 1].size();
        }

        self.roles[role] = indices.to_vec();
        self.strides[role] = strides;

        self.dimensions = vec![];
        for index in self.roles.values().flatten() {
            if !self.dimensions.contains(index) {
                self.dimensions.push(index.clone());
            }
        }
    }

    /// The union of the dimensions of all roles, in order of first appearance.
    pub fn dimensions(&self) -> &[GenericIndex] {
        &self.dimensions
    }

    pub fn role(&self, role: Role) -> &[GenericIndex] {
        &self.roles[role]
    }

    /// Whether any role spans a dimension.
    pub fn is_generic(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Whether `role` is fixed to a single element by `bindings`, i.e. none of its dimensions has
    /// to be iterated.
    pub fn is_restricted(&self, role: Role, bindings: &IndexBindings) -> bool {
        self.roles[role].iter().all(|index| bindings.is_bound(index))
    }

    /// The number of coordinates which are visited under `bindings`.
    pub fn num_coordinates(&self, bindings: &IndexBindings) -> usize {
        self.dimensions
            .iter()
            .filter(|index| !bindings.is_bound(index))
            .map(GenericIndex::size)
            .product()
    }

    /// Whether `predicate` holds for at least one coordinate; stops at the first one for which it
    /// does.
    pub fn any(&self, bindings: &IndexBindings, predicate: impl FnMut(RoleOffsets) -> bool) -> bool {
        self.coordinates(bindings).any(predicate)
    }

    /// Whether `predicate` holds for every coordinate; stops at the first one for which it does not.
    pub fn all(&self, bindings: &IndexBindings, predicate: impl FnMut(RoleOffsets) -> bool) -> bool {
        self.coordinates(bindings).all(predicate)
    }

    pub fn for_each(&self, bindings: &IndexBindings, action: impl FnMut(RoleOffsets)) {
        self.coordinates(bindings).for_each(action)
    }

    fn coordinates<'a>(
        &'a self,
        bindings: &'a IndexBindings,
    ) -> impl Iterator<Item = RoleOffsets> + 'a {
        let free = self
            .dimensions
            .iter()
            .filter(|index| !bindings.is_bound(index))
            .cloned()
            .collect::<Vec<_>>();
        let sizes = free.iter().map(GenericIndex::size).collect();

        Coordinates::new(sizes).map(move |coordinate| {
            let value_of = |index: &GenericIndex| {
                bindings.value(index).unwrap_or_else(|| {
                    let position = free
                        .iter()
                        .position(|candidate| candidate == index)
                        .unwrap_or_default();
                    coordinate[position]
                })
            };

            let mut offsets = EnumMap::default();
            for (role, indices) in self.roles.iter() {
                offsets[role] = indices
                    .iter()
                    .zip(&self.strides[role])
                    .map(|(index, stride)| value_of(index) * stride)
                    .sum();
            }
            RoleOffsets { offsets }
        })
    }
}
