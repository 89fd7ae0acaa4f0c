use super::GenericIndex;
use super::IndexBindings;
use crate::basic_types::GenericIndexError;
use crate::containers::HashSet;

/// Enumerates every coordinate of a shape in row-major order (the last dimension varies fastest).
///
/// An empty shape has exactly one (empty) coordinate; a shape with a dimension of size 0 has none.
#[derive(Clone, Debug)]
pub(crate) struct Coordinates {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Coordinates {
    pub(crate) fn new(sizes: Vec<usize>) -> Self {
        let next = sizes.iter().all(|&size| size > 0).then(|| vec![0; sizes.len()]);
        Coordinates { sizes, next }
    }
}

impl Iterator for Coordinates {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        let mut successor = current.clone();
        for dimension in (0..successor.len()).rev() {
            successor[dimension] += 1;
            if successor[dimension] < self.sizes[dimension] {
                self.next = Some(successor);
                break;
            }
            successor[dimension] = 0;
        }

        Some(current)
    }
}

/// The result of [`GenericExpr::create_fragment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment<T> {
    /// Every dimension was bound; this is the element at that coordinate.
    Scalar(T),
    /// The expression over the dimensions which were left unbound.
    Generic(GenericExpr<T>),
}

impl<T> Fragment<T> {
    pub fn scalar(self) -> Option<T> {
        match self {
            Fragment::Scalar(value) => Some(value),
            Fragment::Generic(_) => None,
        }
    }
}

/// An array of elements indexed by one or more [`GenericIndex`] dimensions, which lets a single
/// declaration stand for a whole family of scalar instances.
///
/// The elements are stored row-major: the element at coordinate `c` lives at offset
/// `Σ c[d] × stride[d]`, where `stride[d]` is the product of the sizes of the dimensions after `d`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericExpr<T> {
    indices: Vec<GenericIndex>,
    strides: Vec<usize>,
    elements: Vec<T>,
}

impl<T> GenericExpr<T> {
    pub fn new(indices: Vec<GenericIndex>, elements: Vec<T>) -> Result<Self, GenericIndexError> {
        let mut seen: HashSet<&GenericIndex> = HashSet::default();
        if let Some(duplicate) = indices.iter().find(|index| !seen.insert(*index)) {
            return Err(GenericIndexError::DuplicateIndex(duplicate.name().to_owned()));
        }

        let expected = indices.iter().map(GenericIndex::size).product::<usize>();
        if elements.len() != expected {
            return Err(GenericIndexError::ShapeMismatch {
                expected,
                actual: elements.len(),
            });
        }

        let mut strides = vec![1; indices.len()];
        for dimension in (0..indices.len().saturating_sub(1)).rev() {
            strides[dimension] = strides[dimension + 1] * indices[dimension + 1].size();
        }

        Ok(GenericExpr {
            indices,
            strides,
            elements,
        })
    }

    /// Builds the expression by evaluating `element` at every coordinate in row-major order.
    pub fn from_fn(
        indices: Vec<GenericIndex>,
        mut element: impl FnMut(&[usize]) -> T,
    ) -> Result<Self, GenericIndexError> {
        let elements = Coordinates::new(indices.iter().map(GenericIndex::size).collect())
            .map(|coordinate| element(&coordinate))
            .collect();
        GenericExpr::new(indices, elements)
    }

    pub fn indices(&self) -> &[GenericIndex] {
        &self.indices
    }

    pub fn spans(&self, index: &GenericIndex) -> bool {
        self.indices.contains(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// The flat offset of a fully specified coordinate.
    pub fn offset(&self, coordinate: &[usize]) -> Result<usize, GenericIndexError> {
        if coordinate.len() != self.indices.len() {
            return Err(GenericIndexError::ShapeMismatch {
                expected: self.indices.len(),
                actual: coordinate.len(),
            });
        }

        let mut offset = 0;
        for ((index, stride), &value) in self.indices.iter().zip(&self.strides).zip(coordinate) {
            index.check(value)?;
            offset += value * stride;
        }
        Ok(offset)
    }

    pub fn get(&self, coordinate: &[usize]) -> Result<&T, GenericIndexError> {
        let offset = self.offset(coordinate)?;
        Ok(&self.elements[offset])
    }

    pub fn map<U>(&self, transform: impl FnMut(&T) -> U) -> GenericExpr<U> {
        GenericExpr {
            indices: self.indices.clone(),
            strides: self.strides.clone(),
            elements: self.elements.iter().map(transform).collect(),
        }
    }
}

impl<T: Clone> GenericExpr<T> {
    /// Extracts the part of the expression where each given index has the given value.
    ///
    /// If every dimension of the expression is bound, the element at that coordinate is returned;
    /// otherwise the result is an expression over the remaining dimensions, in their original
    /// relative order.
    pub fn create_fragment(
        &self,
        bound: &[(GenericIndex, usize)],
    ) -> Result<Fragment<T>, GenericIndexError> {
        let mut fixed = vec![None; self.indices.len()];
        for (index, value) in bound {
            let dimension = self
                .indices
                .iter()
                .position(|candidate| candidate == index)
                .ok_or_else(|| GenericIndexError::UnknownIndex(index.name().to_owned()))?;
            index.check(*value)?;
            if fixed[dimension].replace(*value).is_some() {
                return Err(GenericIndexError::DuplicateIndex(index.name().to_owned()));
            }
        }

        let base = fixed
            .iter()
            .zip(&self.strides)
            .filter_map(|(value, stride)| value.map(|value| value * stride))
            .sum::<usize>();
        let free = (0..self.indices.len())
            .filter(|&dimension| fixed[dimension].is_none())
            .collect::<Vec<_>>();

        if free.is_empty() {
            return Ok(Fragment::Scalar(self.elements[base].clone()));
        }

        let sizes = free
            .iter()
            .map(|&dimension| self.indices[dimension].size())
            .collect();
        let elements = Coordinates::new(sizes)
            .map(|coordinate| {
                let offset = free
                    .iter()
                    .zip(&coordinate)
                    .map(|(&dimension, value)| value * self.strides[dimension])
                    .sum::<usize>();
                self.elements[base + offset].clone()
            })
            .collect();
        let indices = free
            .iter()
            .map(|&dimension| self.indices[dimension].clone())
            .collect();

        Ok(Fragment::Generic(GenericExpr::new(indices, elements)?))
    }

    /// Like [`GenericExpr::create_fragment`], binding each of `indices` to its current value in
    /// `bindings`; every index in `indices` must be bound.
    pub fn create_fragment_from_bindings(
        &self,
        indices: &[GenericIndex],
        bindings: &IndexBindings,
    ) -> Result<Fragment<T>, GenericIndexError> {
        let bound = indices
            .iter()
            .map(|index| {
                bindings
                    .value(index)
                    .map(|value| (index.clone(), value))
                    .ok_or_else(|| GenericIndexError::UnboundIndex(index.name().to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.create_fragment(&bound)
    }

    /// Binds every dimension of this expression which has a value in `bindings`, leaving the others
    /// free.
    pub fn restrict(&self, bindings: &IndexBindings) -> Result<Fragment<T>, GenericIndexError> {
        let bound = self
            .indices
            .iter()
            .filter_map(|index| bindings.value(index).map(|value| (index.clone(), value)))
            .collect::<Vec<_>>();

        self.create_fragment(&bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (GenericIndex, GenericIndex, GenericExpr<u32>) {
        let i = GenericIndex::new("i", 4);
        let j = GenericIndex::new("j", 2);
        let expression = GenericExpr::new(vec![i.clone(), j.clone()], (0..8).collect()).unwrap();
        (i, j, expression)
    }

    #[test]
    fn full_coordinate_yields_the_element_at_its_row_major_offset() {
        let (i, j, expression) = grid();

        let fragment = expression.create_fragment(&[(i, 2), (j, 1)]).unwrap();

        assert_eq!(Fragment::Scalar(5), fragment);
    }

    #[test]
    fn order_of_bound_indices_does_not_matter() {
        let (i, j, expression) = grid();

        let fragment = expression.create_fragment(&[(j, 1), (i, 3)]).unwrap();

        assert_eq!(Some(7), fragment.scalar());
        assert_eq!(Ok(7), expression.offset(&[3, 1]));
    }

    #[test]
    fn partial_coordinate_keeps_the_free_dimensions() {
        let (i, j, expression) = grid();

        let Fragment::Generic(column) = expression.create_fragment(&[(j.clone(), 1)]).unwrap()
        else {
            panic!("expected a generic fragment");
        };
        assert_eq!(&[i.clone()], column.indices());
        assert_eq!(&[1, 3, 5, 7], column.elements());

        let Fragment::Generic(row) = expression.create_fragment(&[(i, 1)]).unwrap() else {
            panic!("expected a generic fragment");
        };
        assert_eq!(&[j], row.indices());
        assert_eq!(&[2, 3], row.elements());
    }

    #[test]
    fn relative_order_of_free_dimensions_is_preserved() {
        let a = GenericIndex::new("a", 2);
        let b = GenericIndex::new("b", 3);
        let c = GenericIndex::new("c", 2);
        let expression = GenericExpr::from_fn(vec![a.clone(), b.clone(), c.clone()], |coordinate| {
            100 * coordinate[0] + 10 * coordinate[1] + coordinate[2]
        })
        .unwrap();

        let Fragment::Generic(fragment) = expression.create_fragment(&[(b, 2)]).unwrap() else {
            panic!("expected a generic fragment");
        };

        assert_eq!(&[a, c], fragment.indices());
        assert_eq!(&[20, 21, 120, 121], fragment.elements());
    }

    #[test]
    fn malformed_requests_are_errors() {
        let (i, j, expression) = grid();
        let k = GenericIndex::new("k", 2);

        assert_eq!(
            Err(GenericIndexError::UnknownIndex("k".to_owned())),
            expression.create_fragment(&[(k, 0)])
        );
        assert!(matches!(
            expression.create_fragment(&[(i.clone(), 4)]),
            Err(GenericIndexError::CoordinateOutOfRange { .. })
        ));
        assert_eq!(
            Err(GenericIndexError::DuplicateIndex("i".to_owned())),
            expression.create_fragment(&[(i.clone(), 0), (i.clone(), 1)])
        );

        let bindings = IndexBindings::new().with(&i, 1).unwrap();
        assert_eq!(
            Err(GenericIndexError::UnboundIndex("j".to_owned())),
            expression.create_fragment_from_bindings(&[i, j], &bindings)
        );
    }

    #[test]
    fn fragment_from_bindings_reads_current_values() {
        let (i, j, expression) = grid();
        let bindings = IndexBindings::new()
            .with(&i, 2)
            .and_then(|bindings| bindings.with(&j, 1))
            .unwrap();

        assert_eq!(
            Ok(Fragment::Scalar(5)),
            expression.create_fragment_from_bindings(&[i, j], &bindings)
        );
    }

    #[test]
    fn shape_must_match_the_dimensions() {
        let i = GenericIndex::new("i", 3);

        assert_eq!(
            Err(GenericIndexError::ShapeMismatch {
                expected: 3,
                actual: 2
            }),
            GenericExpr::new(vec![i], vec![1, 2])
        );
    }

    #[test]
    fn coordinates_are_enumerated_row_major() {
        assert_eq!(
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1], vec![2, 0], vec![2, 1]],
            Coordinates::new(vec![3, 2]).collect::<Vec<_>>()
        );
        assert_eq!(vec![Vec::<usize>::new()], Coordinates::new(vec![]).collect::<Vec<_>>());
        assert_eq!(0, Coordinates::new(vec![2, 0]).count());
    }
}
