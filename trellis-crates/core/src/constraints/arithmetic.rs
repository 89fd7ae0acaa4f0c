use super::Constraint;
use super::Truth;
use crate::basic_types::EmptyDomain;
use crate::basic_types::GenericIndexError;
use crate::basic_types::PropagationStatus;
use crate::engine::VariableId;
use crate::propagation::Arc;
use crate::propagation::ArcStrength;
use crate::propagation::ChangeType;
use crate::propagation::DomainDelta;
use crate::propagation::PropagationContext;
use crate::propagation::ReadDomains;

/// The relations of the arithmetic family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    /// `x + y = z`
    Sum,
    /// `x + c <= y`
    LessOrEqual,
    /// `x = y + c`
    Equal,
    /// `x != y + c`
    NotEqual,
}

/// A linear relation between two or three integer variables.
#[derive(Clone, Debug)]
pub struct ArithmeticConstraint {
    name: String,
    operator: ArithmeticOperator,
    x: VariableId,
    y: VariableId,
    /// Only used by [`ArithmeticOperator::Sum`].
    z: Option<VariableId>,
    constant: i64,
}

impl ArithmeticConstraint {
    pub fn sum(x: VariableId, y: VariableId, z: VariableId) -> Self {
        ArithmeticConstraint {
            name: format!("{x} + {y} = {z}"),
            operator: ArithmeticOperator::Sum,
            x,
            y,
            z: Some(z),
            constant: 0,
        }
    }

    pub fn less_or_equal(x: VariableId, constant: i64, y: VariableId) -> Self {
        ArithmeticConstraint {
            name: format!("{x} + {constant} <= {y}"),
            operator: ArithmeticOperator::LessOrEqual,
            x,
            y,
            z: None,
            constant,
        }
    }

    pub fn equal(x: VariableId, y: VariableId, constant: i64) -> Self {
        ArithmeticConstraint {
            name: format!("{x} = {y} + {constant}"),
            operator: ArithmeticOperator::Equal,
            x,
            y,
            z: None,
            constant,
        }
    }

    pub fn not_equal(x: VariableId, y: VariableId, constant: i64) -> Self {
        ArithmeticConstraint {
            name: format!("{x} != {y} + {constant}"),
            operator: ArithmeticOperator::NotEqual,
            x,
            y,
            z: None,
            constant,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn operator(&self) -> ArithmeticOperator {
        self.operator
    }

    fn arc(&self, kind: ArcKind, target: VariableId, sources: Vec<VariableId>) -> Box<dyn Arc> {
        Box::new(ArithmeticArc {
            name: format!("{} -> {target}", self.name),
            kind,
            target,
            sources,
            constant: self.constant,
        })
    }
}

impl Constraint for ArithmeticConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn arcs(&self) -> Result<Vec<Box<dyn Arc>>, GenericIndexError> {
        let (x, y) = (self.x, self.y);
        let arcs = match (self.operator, self.z) {
            (ArithmeticOperator::Sum, Some(z)) => vec![
                self.arc(ArcKind::SumResult, z, vec![x, y]),
                self.arc(ArcKind::SumTerm, x, vec![z, y]),
                self.arc(ArcKind::SumTerm, y, vec![z, x]),
            ],
            (ArithmeticOperator::Sum, None) => vec![],
            (ArithmeticOperator::LessOrEqual, _) => vec![
                self.arc(ArcKind::AtLeast, y, vec![x]),
                self.arc(ArcKind::AtMost, x, vec![y]),
            ],
            (ArithmeticOperator::Equal, _) => vec![
                self.arc(ArcKind::Shifted { offset: 1 }, x, vec![y]),
                self.arc(ArcKind::Shifted { offset: -1 }, y, vec![x]),
            ],
            (ArithmeticOperator::NotEqual, _) => vec![
                self.arc(ArcKind::Differs { offset: 1 }, x, vec![y]),
                self.arc(ArcKind::Differs { offset: -1 }, y, vec![x]),
            ],
        };
        Ok(arcs)
    }

    fn truth(&self, domains: &dyn ReadDomains) -> Truth {
        let (x, y, c) = (self.x, self.y, i128::from(self.constant));
        let (x_min, x_max) = bounds(domains, x);
        let (y_min, y_max) = bounds(domains, y);

        match self.operator {
            ArithmeticOperator::Sum => {
                let Some(z) = self.z else {
                    return Truth::Undetermined;
                };
                let (z_min, z_max) = bounds(domains, z);
                if x_min + y_min > z_max || x_max + y_max < z_min {
                    Truth::False
                } else if x_min == x_max && y_min == y_max && z_min == z_max {
                    Truth::True
                } else {
                    Truth::Undetermined
                }
            }
            ArithmeticOperator::LessOrEqual => {
                if x_max + c <= y_min {
                    Truth::True
                } else if x_min + c > y_max {
                    Truth::False
                } else {
                    Truth::Undetermined
                }
            }
            ArithmeticOperator::Equal => {
                if x_min > y_max + c || x_max < y_min + c {
                    Truth::False
                } else if x_min == x_max && y_min == y_max {
                    Truth::True
                } else {
                    Truth::Undetermined
                }
            }
            ArithmeticOperator::NotEqual => {
                if x_min > y_max + c || x_max < y_min + c {
                    Truth::True
                } else if x_min == x_max && y_min == y_max {
                    Truth::False
                } else {
                    Truth::Undetermined
                }
            }
        }
    }
}

/// The bounds of `variable`, widened so that sums of a few of them cannot overflow.
fn bounds(domains: &(impl ReadDomains + ?Sized), variable: VariableId) -> (i128, i128) {
    (
        i128::from(domains.lower_bound(variable)),
        i128::from(domains.upper_bound(variable)),
    )
}

/// Narrows `target` to `[min, max]`. A bound beyond the range of `i64` either does not restrict
/// the domain or empties it.
fn narrow_to(
    context: &mut PropagationContext<'_>,
    target: VariableId,
    min: i128,
    max: i128,
) -> PropagationStatus {
    if min > i128::from(i64::MAX) || max < i128::from(i64::MIN) {
        return Err(EmptyDomain(target).into());
    }
    context.set_bounds(target, saturate(min), saturate(max))
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// The narrowing rule of an [`ArithmeticArc`]; `c` is the constant of the constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArcKind {
    /// `target = sources[0] + sources[1]`
    SumResult,
    /// `target = sources[0] - sources[1]`
    SumTerm,
    /// `target >= sources[0] + c`
    AtLeast,
    /// `target <= sources[0] - c`
    AtMost,
    /// `target = sources[0] + offset * c`, on the full domains.
    Shifted { offset: i64 },
    /// `target != sources[0] + offset * c`, once the source is fixed.
    Differs { offset: i64 },
}

#[derive(Debug)]
struct ArithmeticArc {
    name: String,
    kind: ArcKind,
    target: VariableId,
    sources: Vec<VariableId>,
    constant: i64,
}

impl ArithmeticArc {
    /// Makes the target equal to the source shifted by `shift`. Only holes are visited: those
    /// which appeared since the last run if a delta is given, otherwise all of them.
    fn propagate_shifted(
        &self,
        context: &mut PropagationContext<'_>,
        delta: Option<&DomainDelta>,
        shift: i128,
    ) -> PropagationStatus {
        let source = self.sources[0];
        let (min, max) = bounds(context, source);
        narrow_to(context, self.target, min + shift, max + shift)?;

        let removed = match delta {
            Some(delta) => delta
                .removed
                .iter()
                .copied()
                .filter(|&value| !context.contains(source, value))
                .collect::<Vec<_>>(),
            None => context.holes(source).to_vec(),
        };
        for value in removed {
            if let Ok(shifted) = i64::try_from(i128::from(value) + shift) {
                context.remove_value(self.target, shifted)?;
            }
        }
        Ok(())
    }
}

impl Arc for ArithmeticArc {
    fn name(&self) -> &str {
        &self.name
    }

    fn sources(&self) -> &[VariableId] {
        &self.sources
    }

    fn target(&self) -> VariableId {
        self.target
    }

    fn strength(&self) -> ArcStrength {
        match self.kind {
            ArcKind::Shifted { .. } | ArcKind::Differs { .. } => ArcStrength::Full,
            _ => ArcStrength::Bounds,
        }
    }

    fn trigger(&self) -> ChangeType {
        match self.kind {
            ArcKind::Differs { .. } => ChangeType::Value,
            ArcKind::Shifted { .. } => ChangeType::Domain,
            _ => ChangeType::Range,
        }
    }

    fn uses_delta(&self) -> bool {
        matches!(self.kind, ArcKind::Shifted { .. })
    }

    fn propagate(
        &self,
        context: &mut PropagationContext<'_>,
        delta: Option<&DomainDelta>,
    ) -> PropagationStatus {
        let first = self.sources[0];
        let c = i128::from(self.constant);

        match self.kind {
            ArcKind::SumResult => {
                let (first_min, first_max) = bounds(context, first);
                let (second_min, second_max) = bounds(context, self.sources[1]);
                narrow_to(context, self.target, first_min + second_min, first_max + second_max)
            }
            ArcKind::SumTerm => {
                let (first_min, first_max) = bounds(context, first);
                let (second_min, second_max) = bounds(context, self.sources[1]);
                narrow_to(context, self.target, first_min - second_max, first_max - second_min)
            }
            ArcKind::AtLeast => {
                let (min, _) = bounds(context, first);
                narrow_to(context, self.target, min + c, i128::MAX)
            }
            ArcKind::AtMost => {
                let (_, max) = bounds(context, first);
                narrow_to(context, self.target, i128::MIN, max - c)
            }
            ArcKind::Shifted { offset } => {
                self.propagate_shifted(context, delta, i128::from(offset) * c)
            }
            ArcKind::Differs { offset } => {
                let Some(value) = context.fixed_value(first) else {
                    return Ok(());
                };
                match i64::try_from(i128::from(value) + i128::from(offset) * c) {
                    Ok(excluded) => context.remove_value(self.target, excluded),
                    Err(_) => Ok(()),
                }
            }
        }
    }
}
