use enum_map::EnumMap;

use super::boolean::boolean_arcs;
use super::boolean::operand_values;
use super::BoolTerm;
use super::BooleanOperator;
use super::Constraint;
use super::Truth;
use crate::basic_types::GenericIndexError;
use crate::engine::VariableId;
use crate::generic::GenericExpr;
use crate::generic::GenericIndex;
use crate::generic::GenericIndexManager;
use crate::generic::IndexBindings;
use crate::generic::Role;
use crate::generic::RoleOffsets;
use crate::propagation::Arc;
use crate::propagation::ReadDomains;

/// An operand of a generic boolean constraint: the same term at every coordinate, or one term per
/// coordinate of its dimensions.
#[derive(Clone, Debug)]
pub enum GenericOperand {
    Scalar(BoolTerm),
    Generic(GenericExpr<BoolTerm>),
}

impl GenericOperand {
    fn term_at(&self, offset: usize) -> BoolTerm {
        match self {
            GenericOperand::Scalar(term) => *term,
            GenericOperand::Generic(expression) => expression.elements()[offset],
        }
    }

    fn indices(&self) -> &[GenericIndex] {
        match self {
            GenericOperand::Scalar(_) => &[],
            GenericOperand::Generic(expression) => expression.indices(),
        }
    }
}

impl From<BoolTerm> for GenericOperand {
    fn from(term: BoolTerm) -> Self {
        GenericOperand::Scalar(term)
    }
}

impl From<bool> for GenericOperand {
    fn from(value: bool) -> Self {
        GenericOperand::Scalar(BoolTerm::Constant(value))
    }
}

impl From<VariableId> for GenericOperand {
    fn from(variable: VariableId) -> Self {
        GenericOperand::Scalar(BoolTerm::Variable(variable))
    }
}

impl From<GenericExpr<BoolTerm>> for GenericOperand {
    fn from(expression: GenericExpr<BoolTerm>) -> Self {
        GenericOperand::Generic(expression)
    }
}

/// A family of boolean constraints `Z[c] = X[c] op Y[c]`, one for every coordinate `c` of the union
/// of the dimensions of the operands.
///
/// Indices bound in the [`IndexBindings`] of the constraint are fixed to their value, so that only
/// a slice of the family is posted.
#[derive(Clone, Debug)]
pub struct GenericBooleanConstraint {
    name: String,
    operator: BooleanOperator,
    operands: EnumMap<Role, GenericOperand>,
    manager: GenericIndexManager,
    bindings: IndexBindings,
}

impl GenericBooleanConstraint {
    pub fn new(
        operator: BooleanOperator,
        x: impl Into<GenericOperand>,
        y: impl Into<GenericOperand>,
        z: impl Into<GenericOperand>,
    ) -> Self {
        let operands: EnumMap<Role, GenericOperand> =
            EnumMap::from_array([x.into(), y.into(), z.into()]);
        let mut manager = GenericIndexManager::new();
        for (role, operand) in operands.iter() {
            manager.set_role(role, operand.indices());
        }

        GenericBooleanConstraint {
            name: format!("generic {operator:?}").to_lowercase(),
            operator,
            operands,
            manager,
            bindings: IndexBindings::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restricts the family to the coordinates at which the bound indices have their value.
    pub fn with_bindings(mut self, bindings: IndexBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn manager(&self) -> &GenericIndexManager {
        &self.manager
    }

    /// The number of scalar constraints in the family.
    pub fn num_instances(&self) -> usize {
        self.manager.num_coordinates(&self.bindings)
    }

    /// Whether some instance of the family is violated by the domains.
    pub fn violated_if_any(&self, domains: &dyn ReadDomains) -> bool {
        self.manager
            .any(&self.bindings, |offsets| self.instance_violated(offsets, domains))
    }

    /// Whether every instance of the family is violated by the domains.
    pub fn violated_if_all(&self, domains: &dyn ReadDomains) -> bool {
        self.manager
            .all(&self.bindings, |offsets| self.instance_violated(offsets, domains))
    }

    /// Whether every instance of the family is satisfied by the domains.
    pub fn entailed(&self, domains: &dyn ReadDomains) -> bool {
        self.manager.all(&self.bindings, |offsets| {
            let values = operand_values(self.operator, &self.terms_at(offsets), domains);
            self.operator
                .entailed(values[Role::X], values[Role::Y], values[Role::Z])
        })
    }

    fn instance_violated(&self, offsets: RoleOffsets, domains: &dyn ReadDomains) -> bool {
        let values = operand_values(self.operator, &self.terms_at(offsets), domains);
        self.operator
            .violated(values[Role::X], values[Role::Y], values[Role::Z])
    }

    fn terms_at(&self, offsets: RoleOffsets) -> EnumMap<Role, BoolTerm> {
        EnumMap::from_fn(|role| self.operands[role].term_at(offsets.offset(role)))
    }
}

impl Constraint for GenericBooleanConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn arcs(&self) -> Result<Vec<Box<dyn Arc>>, GenericIndexError> {
        if let Some(index) = self
            .bindings
            .indices()
            .find(|index| !self.manager.dimensions().contains(index))
        {
            return Err(GenericIndexError::UnknownIndex(index.name().to_owned()));
        }

        let mut arcs = vec![];
        let mut instance = 0;
        self.manager.for_each(&self.bindings, |offsets| {
            let name = format!("{}[{instance}]", self.name);
            arcs.extend(boolean_arcs(&name, self.operator, self.terms_at(offsets)));
            instance += 1;
        });
        Ok(arcs)
    }

    fn truth(&self, domains: &dyn ReadDomains) -> Truth {
        if self.violated_if_any(domains) {
            Truth::False
        } else if self.entailed(domains) {
            Truth::True
        } else {
            Truth::Undetermined
        }
    }
}
