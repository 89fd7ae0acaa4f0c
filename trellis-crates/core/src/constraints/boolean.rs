use std::fmt::Display;
use std::fmt::Formatter;

use enum_map::EnumMap;

use super::Constraint;
use super::Truth;
use crate::basic_types::GenericIndexError;
use crate::basic_types::PropagationStatus;
use crate::engine::VariableId;
use crate::generic::Role;
use crate::propagation::Arc;
use crate::propagation::ArcStrength;
use crate::propagation::DomainDelta;
use crate::propagation::PropagationContext;
use crate::propagation::ReadDomains;

/// The operators of the boolean family `Z = X op Y`; [`BooleanOperator::Not`] is the unary
/// `Z = ¬X` and ignores `Y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BooleanOperator {
    And,
    Or,
    Xor,
    Implies,
    Eq,
    Not,
}

impl BooleanOperator {
    /// Whether `z = x op y` holds for fixed operands.
    pub fn holds(self, x: bool, y: bool, z: bool) -> bool {
        let result = match self {
            BooleanOperator::And => x && y,
            BooleanOperator::Or => x || y,
            BooleanOperator::Xor => x != y,
            BooleanOperator::Implies => !x || y,
            BooleanOperator::Eq => x == y,
            BooleanOperator::Not => !x,
        };
        z == result
    }

    /// Whether every completion of the partially known operands (`None` is unknown) violates the
    /// constraint.
    pub fn violated(self, x: Option<bool>, y: Option<bool>, z: Option<bool>) -> bool {
        match self {
            BooleanOperator::And => {
                (z == Some(true) && (x == Some(false) || y == Some(false)))
                    || (z == Some(false) && x == Some(true) && y == Some(true))
            }
            BooleanOperator::Or => {
                (z == Some(false) && (x == Some(true) || y == Some(true)))
                    || (z == Some(true) && x == Some(false) && y == Some(false))
            }
            BooleanOperator::Implies => {
                (z == Some(false) && (x == Some(false) || y == Some(true)))
                    || (z == Some(true) && x == Some(true) && y == Some(false))
            }
            BooleanOperator::Xor => match (x, y, z) {
                (Some(x), Some(y), Some(z)) => z != (x != y),
                _ => false,
            },
            BooleanOperator::Eq => match (x, y, z) {
                (Some(x), Some(y), Some(z)) => z != (x == y),
                _ => false,
            },
            BooleanOperator::Not => match (x, z) {
                (Some(x), Some(z)) => z == x,
                _ => false,
            },
        }
    }

    /// Whether every completion of the partially known operands satisfies the constraint.
    pub fn entailed(self, x: Option<bool>, y: Option<bool>, z: Option<bool>) -> bool {
        completions(x)
            .iter()
            .all(|&x| completions(y).iter().all(|&y| {
                completions(z).iter().all(|&z| self.holds(x, y, z))
            }))
    }

    /// The operand positions the operator reads.
    pub fn roles(self) -> &'static [Role] {
        match self {
            BooleanOperator::Not => &[Role::X, Role::Z],
            _ => &[Role::X, Role::Y, Role::Z],
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BooleanOperator::And => "and",
            BooleanOperator::Or => "or",
            BooleanOperator::Xor => "xor",
            BooleanOperator::Implies => "implies",
            BooleanOperator::Eq => "eq",
            BooleanOperator::Not => "not",
        }
    }
}

fn completions(value: Option<bool>) -> Vec<bool> {
    value.map_or_else(|| vec![false, true], |value| vec![value])
}

/// An operand of a boolean constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoolTerm {
    Constant(bool),
    /// A variable with domain `{0, 1}`.
    Variable(VariableId),
}

impl BoolTerm {
    pub fn value(self, domains: &dyn ReadDomains) -> Option<bool> {
        match self {
            BoolTerm::Constant(value) => Some(value),
            BoolTerm::Variable(variable) => domains.bool_value(variable),
        }
    }

    pub fn variable(self) -> Option<VariableId> {
        match self {
            BoolTerm::Constant(_) => None,
            BoolTerm::Variable(variable) => Some(variable),
        }
    }
}

impl From<bool> for BoolTerm {
    fn from(value: bool) -> Self {
        BoolTerm::Constant(value)
    }
}

impl From<VariableId> for BoolTerm {
    fn from(variable: VariableId) -> Self {
        BoolTerm::Variable(variable)
    }
}

impl Display for BoolTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BoolTerm::Constant(value) => write!(f, "{value}"),
            BoolTerm::Variable(variable) => write!(f, "{variable}"),
        }
    }
}

/// The values of the operands under the domains; a role which is not read by the operator is
/// left unknown.
pub(crate) fn operand_values(
    operator: BooleanOperator,
    terms: &EnumMap<Role, BoolTerm>,
    domains: &dyn ReadDomains,
) -> EnumMap<Role, Option<bool>> {
    let mut values = EnumMap::default();
    for &role in operator.roles() {
        values[role] = terms[role].value(domains);
    }
    values
}

pub(crate) fn truth_of(
    operator: BooleanOperator,
    terms: &EnumMap<Role, BoolTerm>,
    domains: &dyn ReadDomains,
) -> Truth {
    let values = operand_values(operator, terms, domains);
    if operator.violated(values[Role::X], values[Role::Y], values[Role::Z]) {
        Truth::False
    } else if operator.entailed(values[Role::X], values[Role::Y], values[Role::Z]) {
        Truth::True
    } else {
        Truth::Undetermined
    }
}

/// Creates an arc towards every variable operand: the forward arc `X, Y → Z` and the reflex arcs
/// `Z, Y → X` and `Z, X → Y`.
pub(crate) fn boolean_arcs(
    name: &str,
    operator: BooleanOperator,
    terms: EnumMap<Role, BoolTerm>,
) -> Vec<Box<dyn Arc>> {
    let mut arcs: Vec<Box<dyn Arc>> = vec![];
    for &target in operator.roles().iter().rev() {
        let Some(target_variable) = terms[target].variable() else {
            continue;
        };
        let sources = operator
            .roles()
            .iter()
            .filter(|&&role| role != target)
            .filter_map(|&role| terms[role].variable())
            .collect();

        arcs.push(Box::new(BooleanArc {
            name: format!("{name} -> {target:?}"),
            operator,
            terms,
            target,
            target_variable,
            sources,
        }));
    }
    arcs
}

/// Removes every value of the target operand for which the constraint is violated regardless of
/// the unknown operands.
#[derive(Debug)]
struct BooleanArc {
    name: String,
    operator: BooleanOperator,
    terms: EnumMap<Role, BoolTerm>,
    target: Role,
    target_variable: VariableId,
    sources: Vec<VariableId>,
}

impl Arc for BooleanArc {
    fn name(&self) -> &str {
        &self.name
    }

    fn sources(&self) -> &[VariableId] {
        &self.sources
    }

    fn target(&self) -> VariableId {
        self.target_variable
    }

    fn strength(&self) -> ArcStrength {
        ArcStrength::Bounds
    }

    fn propagate(
        &self,
        context: &mut PropagationContext<'_>,
        _: Option<&DomainDelta>,
    ) -> PropagationStatus {
        for candidate in [false, true] {
            if !context.contains(self.target_variable, i64::from(candidate)) {
                continue;
            }

            let mut values = operand_values(self.operator, &self.terms, &*context);
            values[self.target] = Some(candidate);
            if self
                .operator
                .violated(values[Role::X], values[Role::Y], values[Role::Z])
            {
                context.remove_value(self.target_variable, i64::from(candidate))?;
            }
        }
        Ok(())
    }
}

/// `Z = X op Y` over scalar operands.
#[derive(Clone, Debug)]
pub struct BooleanConstraint {
    name: String,
    operator: BooleanOperator,
    terms: EnumMap<Role, BoolTerm>,
}

impl BooleanConstraint {
    pub fn new(
        operator: BooleanOperator,
        x: impl Into<BoolTerm>,
        y: impl Into<BoolTerm>,
        z: impl Into<BoolTerm>,
    ) -> Self {
        let terms: EnumMap<Role, BoolTerm> = EnumMap::from_array([x.into(), y.into(), z.into()]);
        let name = match operator {
            BooleanOperator::Not => format!("{} = not {}", terms[Role::Z], terms[Role::X]),
            _ => format!(
                "{} = {} {} {}",
                terms[Role::Z],
                terms[Role::X],
                operator.symbol(),
                terms[Role::Y]
            ),
        };

        BooleanConstraint {
            name,
            operator,
            terms,
        }
    }

    /// `Z = ¬X`.
    pub fn not(x: impl Into<BoolTerm>, z: impl Into<BoolTerm>) -> Self {
        BooleanConstraint::new(BooleanOperator::Not, x, false, z)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn operator(&self) -> BooleanOperator {
        self.operator
    }

    pub fn term(&self, role: Role) -> BoolTerm {
        self.terms[role]
    }
}

impl Constraint for BooleanConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn arcs(&self) -> Result<Vec<Box<dyn Arc>>, GenericIndexError> {
        Ok(boolean_arcs(&self.name, self.operator, self.terms))
    }

    fn truth(&self, domains: &dyn ReadDomains) -> Truth {
        truth_of(self.operator, &self.terms, domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ConstraintStore;

    const OPERATORS: [BooleanOperator; 6] = [
        BooleanOperator::And,
        BooleanOperator::Or,
        BooleanOperator::Xor,
        BooleanOperator::Implies,
        BooleanOperator::Eq,
        BooleanOperator::Not,
    ];
    const TRI_STATE: [Option<bool>; 3] = [None, Some(false), Some(true)];

    #[test]
    fn violated_means_every_completion_violates() {
        for operator in OPERATORS {
            for x in TRI_STATE {
                for y in TRI_STATE {
                    for z in TRI_STATE {
                        let all_violate = completions(x).iter().all(|&x| {
                            completions(y).iter().all(|&y| {
                                completions(z).iter().all(|&z| !operator.holds(x, y, z))
                            })
                        });
                        assert_eq!(
                            all_violate,
                            operator.violated(x, y, z),
                            "{operator:?} with x={x:?} y={y:?} z={z:?}"
                        );
                    }
                }
            }
        }
    }

    fn and_store() -> (ConstraintStore, VariableId, VariableId, VariableId) {
        let mut store = ConstraintStore::default();
        let x = store.add_boolean("x").unwrap();
        let y = store.add_boolean("y").unwrap();
        let z = store.add_boolean("z").unwrap();
        let _ = store
            .add_constraint(BooleanConstraint::new(BooleanOperator::And, x, y, z), false)
            .unwrap();
        store.propagate().unwrap();
        (store, x, y, z)
    }

    #[test]
    fn and_with_a_false_operand_is_false() {
        let (mut store, x, y, z) = and_store();

        store.assign(x, 0).unwrap();
        store.propagate().unwrap();

        assert_eq!(Some(0), store.value(z));
        assert!(!store.is_fixed(y));
    }

    #[test]
    fn and_with_true_operands_is_true() {
        let (mut store, x, y, z) = and_store();

        store.assign(x, 1).unwrap();
        store.assign(y, 1).unwrap();
        store.propagate().unwrap();

        assert_eq!(Some(1), store.value(z));
    }

    #[test]
    fn true_and_forces_both_operands() {
        let (mut store, x, y, z) = and_store();

        store.assign(z, 1).unwrap();
        store.propagate().unwrap();

        assert_eq!(Some(1), store.value(x));
        assert_eq!(Some(1), store.value(y));
    }

    #[test]
    fn false_and_with_a_true_operand_forces_the_other() {
        let (mut store, x, y, z) = and_store();

        store.assign(z, 0).unwrap();
        store.assign(y, 1).unwrap();
        store.propagate().unwrap();

        assert_eq!(Some(0), store.value(x));
    }

    #[test]
    fn constants_take_part_in_propagation() {
        let mut store = ConstraintStore::default();
        let x = store.add_boolean("x").unwrap();
        let z = store.add_boolean("z").unwrap();
        let _ = store
            .add_constraint(BooleanConstraint::new(BooleanOperator::Or, x, true, z), false)
            .unwrap();

        store.propagate().unwrap();

        assert_eq!(Some(1), store.value(z));
        assert!(!store.is_fixed(x));
    }

    #[test]
    fn not_is_propagated_in_both_directions() {
        let mut store = ConstraintStore::default();
        let x = store.add_boolean("x").unwrap();
        let z = store.add_boolean("z").unwrap();
        let _ = store
            .add_constraint(BooleanConstraint::not(x, z), false)
            .unwrap();

        store.push();
        store.assign(z, 0).unwrap();
        store.propagate().unwrap();
        assert_eq!(Some(1), store.value(x));
        store.pop().unwrap();

        store.assign(x, 0).unwrap();
        store.propagate().unwrap();
        assert_eq!(Some(1), store.value(z));
    }

    #[test]
    fn conflicting_assignment_fails() {
        let (mut store, x, _, z) = and_store();

        store.push();
        store.assign(z, 1).unwrap();
        store.assign(x, 0).unwrap();

        assert!(store.propagate().is_err());
    }

    #[test]
    fn truth_is_entailment() {
        let (mut store, x, y, z) = and_store();
        let constraint = BooleanConstraint::new(BooleanOperator::And, x, y, z);
        assert_eq!(Truth::Undetermined, constraint.truth(&store.domains()));

        store.assign(x, 0).unwrap();
        store.propagate().unwrap();

        // z is false and x is false, so any y satisfies the conjunction.
        assert_eq!(Truth::True, constraint.truth(&store.domains()));
    }

    #[test]
    fn xor_implies_and_eq_propagate_once_decided() {
        let mut store = ConstraintStore::default();
        let x = store.add_boolean("x").unwrap();
        let y = store.add_boolean("y").unwrap();
        let xor = store.add_boolean("xor").unwrap();
        let implies = store.add_boolean("implies").unwrap();
        let eq = store.add_boolean("eq").unwrap();
        for (operator, z) in [
            (BooleanOperator::Xor, xor),
            (BooleanOperator::Implies, implies),
            (BooleanOperator::Eq, eq),
        ] {
            let _ = store
                .add_constraint(BooleanConstraint::new(operator, x, y, z), false)
                .unwrap();
        }

        store.assign(x, 1).unwrap();
        store.assign(y, 0).unwrap();
        store.propagate().unwrap();

        assert_eq!(Some(1), store.value(xor));
        assert_eq!(Some(0), store.value(implies));
        assert_eq!(Some(0), store.value(eq));
    }
}
