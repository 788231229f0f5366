//! Model snapshot types consumed by the diagnostics engine.
//!
//! The engine never owns the "real" process model: it works on a read-only
//! snapshot of variables, constraints and their symbolic residual
//! expressions. Expressions are `RustedSciThe` symbolic trees, so variable
//! participation is recovered syntactically and Jacobians can be produced
//! by symbolic differentiation at any point.

use RustedSciThe::symbolic::symbolic_engine::Expr;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// error types of the diagnostics engine
///
/// Only malformed input aborts an analysis call. Everything the
/// diagnostics *discover* (singular structure, near-parallel rows,
/// potential domain violations) is report content, never an error.
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("expression error in constraint '{constraint}': {message}")]
    ExpressionError { constraint: String, message: String },
    #[error("model error: {0}")]
    ModelError(String),
}

/// A scalar decision variable of the model snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagVariable {
    pub name: String,
    pub value: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// fixed variables are parameters for the structural analysis
    pub fixed: bool,
    /// position on an ordered index set (e.g. a time axis), if any
    pub index: Option<i64>,
}

impl DiagVariable {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            lower_bound: None,
            upper_bound: None,
            fixed: false,
            index: None,
        }
    }
    pub fn fixed(name: &str, value: f64) -> Self {
        let mut v = Self::new(name, value);
        v.fixed = true;
        v
    }
    pub fn set_bounds(&mut self, lower: Option<f64>, upper: Option<f64>) {
        self.lower_bound = lower;
        self.upper_bound = upper;
    }
    pub fn set_index(&mut self, index: i64) {
        self.index = Some(index);
    }
}

/// An equality constraint `residual(x) = 0` of the model snapshot.
#[derive(Debug, Clone)]
pub struct DiagConstraint {
    pub name: String,
    pub expression: Expr,
    /// inactive constraints are skipped by every analysis
    pub active: bool,
    pub index: Option<i64>,
}

impl DiagConstraint {
    pub fn new(name: &str, expression: Expr) -> Self {
        Self {
            name: name.to_string(),
            expression,
            active: true,
            index: None,
        }
    }
    /// Identifiers syntactically present in the residual expression.
    pub fn variables_in_expression(&self) -> Vec<String> {
        let mut vars = self.expression.all_arguments_are_variables();
        vars.sort();
        vars.dedup();
        vars
    }
    pub fn set_index(&mut self, index: i64) {
        self.index = Some(index);
    }
}

/// Read-only view of a model snapshot: exactly what the engine consumes,
/// nothing else. Any modeling front end exposing these two collections
/// can be diagnosed.
#[enum_dispatch]
pub trait ModelView {
    fn variables(&self) -> &Vec<DiagVariable>;
    fn constraints(&self) -> &Vec<DiagConstraint>;
}

/// Concrete model kinds the crate ships; front ends may also implement
/// [`ModelView`] directly on their own types.
#[derive(Debug, Clone)]
#[enum_dispatch(ModelView)]
pub enum ModelKind {
    Full(EquationSystem),
    Restricted(RestrictedModel),
}

/// Flat arena-style equation system: variables and constraints in
/// declaration order, all relations downstream expressed as index pairs.
#[derive(Debug, Clone)]
pub struct EquationSystem {
    pub variables: Vec<DiagVariable>,
    pub constraints: Vec<DiagConstraint>,
}

impl EquationSystem {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn add_variable(&mut self, variable: DiagVariable) {
        self.variables.push(variable);
    }

    pub fn add_constraint(&mut self, constraint: DiagConstraint) {
        self.constraints.push(constraint);
    }

    /// Shortcut: declare a free variable with a starting value.
    pub fn add_free_variable(&mut self, name: &str, value: f64) {
        self.add_variable(DiagVariable::new(name, value));
    }

    /// Shortcut: parse a residual expression and add it as an active
    /// equality constraint.
    pub fn add_equation(&mut self, name: &str, residual: &str) {
        let expression = Expr::parse_expression(residual);
        self.add_constraint(DiagConstraint::new(name, expression));
    }

    pub fn set_variable_value(&mut self, name: &str, value: f64) -> Result<(), DiagError> {
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(v) => {
                v.value = value;
                Ok(())
            }
            None => Err(DiagError::ModelError(format!(
                "no variable named '{}'",
                name
            ))),
        }
    }

    pub fn set_fixed(&mut self, name: &str, fixed: bool) -> Result<(), DiagError> {
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(v) => {
                v.fixed = fixed;
                Ok(())
            }
            None => Err(DiagError::ModelError(format!(
                "no variable named '{}'",
                name
            ))),
        }
    }

    pub fn set_active(&mut self, name: &str, active: bool) -> Result<(), DiagError> {
        match self.constraints.iter_mut().find(|c| c.name == name) {
            Some(c) => {
                c.active = active;
                Ok(())
            }
            None => Err(DiagError::ModelError(format!(
                "no constraint named '{}'",
                name
            ))),
        }
    }

    pub fn variable_position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// free variables minus active constraints
    pub fn degrees_of_freedom(&self) -> i64 {
        let free = self.variables.iter().filter(|v| !v.fixed).count() as i64;
        let active = self.constraints.iter().filter(|c| c.active).count() as i64;
        free - active
    }

    /// Restrict the model to one position of its index set: keep the
    /// constraints tagged with `index`, keep their owned variables free,
    /// and turn every referenced-but-foreign variable into a temporarily
    /// fixed boundary input, so the restriction is square for analysis.
    pub fn extract_at_index(&self, index: i64) -> Result<RestrictedModel, DiagError> {
        let mut system = EquationSystem::new();
        let mut boundary_variables = Vec::new();

        for v in &self.variables {
            if v.index == Some(index) {
                system.add_variable(v.clone());
            }
        }
        for c in &self.constraints {
            if c.active && c.index == Some(index) {
                for name in c.variables_in_expression() {
                    if system.variable_position(&name).is_some() {
                        continue;
                    }
                    match self.variables.iter().find(|v| v.name == name) {
                        Some(v) => {
                            let mut boundary = v.clone();
                            boundary.fixed = true;
                            system.add_variable(boundary);
                            boundary_variables.push(name);
                        }
                        None => {
                            return Err(DiagError::ExpressionError {
                                constraint: c.name.clone(),
                                message: format!(
                                    "references unknown identifier '{}'",
                                    name
                                ),
                            });
                        }
                    }
                }
                system.add_constraint(c.clone());
            }
        }
        boundary_variables.sort();
        boundary_variables.dedup();
        Ok(RestrictedModel {
            system,
            index,
            boundary_variables,
        })
    }
}

impl ModelView for EquationSystem {
    fn variables(&self) -> &Vec<DiagVariable> {
        &self.variables
    }
    fn constraints(&self) -> &Vec<DiagConstraint> {
        &self.constraints
    }
}

/// One index position of a larger model, with its boundary inputs fixed.
#[derive(Debug, Clone)]
pub struct RestrictedModel {
    pub system: EquationSystem,
    pub index: i64,
    /// variables referenced by the local constraints but owned elsewhere
    pub boundary_variables: Vec<String>,
}

impl ModelView for RestrictedModel {
    fn variables(&self) -> &Vec<DiagVariable> {
        &self.system.variables
    }
    fn constraints(&self) -> &Vec<DiagConstraint> {
        &self.system.constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_of_freedom() {
        let mut model = EquationSystem::new();
        model.add_free_variable("x", 1.0);
        model.add_free_variable("y", 2.0);
        model.add_variable(DiagVariable::fixed("p", 0.5));
        model.add_equation("c1", "x + y - 1");
        assert_eq!(model.degrees_of_freedom(), 1);
        model.set_active("c1", false).unwrap();
        assert_eq!(model.degrees_of_freedom(), 2);
    }

    #[test]
    fn test_bounds_and_model_kind_dispatch() {
        let mut model = EquationSystem::new();
        let mut x = DiagVariable::new("x", 0.5);
        x.set_bounds(Some(0.0), Some(1.0));
        model.add_variable(x);
        model.add_equation("c1", "x - 0.5");
        let kind = ModelKind::from(model);
        // the trait methods dispatch through the enum
        assert_eq!(kind.variables()[0].lower_bound, Some(0.0));
        assert_eq!(kind.constraints().len(), 1);
    }

    #[test]
    fn test_variables_in_expression() {
        let c = DiagConstraint::new("c", Expr::parse_expression("x*y + ln( x ) - 2"));
        assert_eq!(c.variables_in_expression(), vec!["x", "y"]);
    }

    #[test]
    fn test_extract_at_index() {
        let mut model = EquationSystem::new();
        for k in 0..3i64 {
            let mut h = DiagVariable::new(&format!("h{}", k), 300.0 + k as f64);
            h.set_index(k);
            model.add_variable(h);
        }
        // backward difference couples each index to the previous one
        for k in 1..3i64 {
            let mut c = DiagConstraint::new(
                &format!("bal{}", k),
                Expr::parse_expression(&format!("h{} - h{} - 1", k, k - 1)),
            );
            c.set_index(k);
            model.add_constraint(c);
        }
        let sub = model.extract_at_index(2).unwrap();
        assert_eq!(sub.boundary_variables, vec!["h1".to_string()]);
        assert_eq!(sub.system.constraints.len(), 1);
        // boundary variable is fixed, local one stays free
        let h1 = &sub.system.variables[sub.system.variable_position("h1").unwrap()];
        assert!(h1.fixed);
        let h2 = &sub.system.variables[sub.system.variable_position("h2").unwrap()];
        assert!(!h2.fixed);
        assert_eq!(sub.system.degrees_of_freedom(), 0);
    }

    #[test]
    fn test_extract_at_index_unknown_identifier() {
        let mut model = EquationSystem::new();
        let mut c = DiagConstraint::new("bad", Expr::parse_expression("ghost - 1"));
        c.set_index(0);
        model.add_constraint(c);
        assert!(model.extract_at_index(0).is_err());
    }
}
