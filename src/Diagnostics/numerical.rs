//! Numerical (value-dependent) diagnostics over a Jacobian snapshot.
//!
//! A model can be structurally sound and still be singular at the current
//! point: two symbolically distinct constraints may be numerically
//! near-collinear, a sub-block may be rank deficient, an expression may sit
//! on the edge of its domain. These checks are independent of the
//! structural analysis and everything they find is report content, never
//! an error.

use super::incidence::IncidenceGraph;
use super::model::{DiagError, ModelView};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::info;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse numeric Jacobian at the current variable values, indexed by
/// (constraint, variable) over the incidence graph's numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JacobianSnapshot {
    pub constraint_names: Vec<String>,
    pub variable_names: Vec<String>,
    /// (row, column, value) triplets sorted by (row, column)
    pub entries: Vec<(usize, usize, f64)>,
}

impl JacobianSnapshot {
    /// Evaluate the Jacobian symbolically: differentiate each constraint
    /// residual with respect to each incident variable and evaluate the
    /// derivative at the snapshot's current values.
    pub fn evaluate(model: &impl ModelView, graph: &IncidenceGraph) -> Result<Self, DiagError> {
        let values = value_map(model);
        let mut entries = Vec::new();
        let mut position = 0usize;
        for c in model.constraints() {
            if !c.active {
                continue;
            }
            let row = position;
            position += 1;
            for &col in &graph.con_adjacency[row] {
                let derivative = c
                    .expression
                    .clone()
                    .diff(graph.variable_names[col].as_str());
                let value = evaluate_at(&derivative, &values, &c.name)?;
                entries.push((row, col, value));
            }
        }
        info!(
            "Jacobian evaluated: {} nonzero entries over {} rows",
            entries.len(),
            graph.n_constraints()
        );
        Ok(Self {
            constraint_names: graph.constraint_names.clone(),
            variable_names: graph.variable_names.clone(),
            entries,
        })
    }

    /// Wrap a caller-supplied sparse Jacobian (spec'd external evaluator).
    pub fn from_triplets(
        constraint_names: Vec<String>,
        variable_names: Vec<String>,
        mut entries: Vec<(usize, usize, f64)>,
    ) -> Self {
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        Self {
            constraint_names,
            variable_names,
            entries,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.constraint_names.len()
    }

    pub fn n_cols(&self) -> usize {
        self.variable_names.len()
    }

    pub fn row(&self, i: usize) -> Vec<(usize, f64)> {
        self.entries
            .iter()
            .filter(|(r, _, _)| *r == i)
            .map(|&(_, c, v)| (c, v))
            .collect()
    }

    pub fn column(&self, j: usize) -> Vec<(usize, f64)> {
        self.entries
            .iter()
            .filter(|(_, c, _)| *c == j)
            .map(|&(r, _, v)| (r, v))
            .collect()
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.n_rows(), self.n_cols());
        for &(r, c, v) in &self.entries {
            m[(r, c)] = v;
        }
        m
    }
}

fn value_map(model: &impl ModelView) -> HashMap<String, f64> {
    model
        .variables()
        .iter()
        .map(|v| (v.name.clone(), v.value))
        .collect()
}

/// Evaluate an expression at the snapshot values via lambdify.
fn evaluate_at(
    expression: &Expr,
    values: &HashMap<String, f64>,
    constraint: &str,
) -> Result<f64, DiagError> {
    let mut vars = expression.all_arguments_are_variables();
    vars.sort();
    vars.dedup();
    let mut point = Vec::with_capacity(vars.len());
    for name in &vars {
        match values.get(name) {
            Some(&v) => point.push(v),
            None => {
                return Err(DiagError::ExpressionError {
                    constraint: constraint.to_string(),
                    message: format!("references unknown identifier '{}'", name),
                });
            }
        }
    }
    let f = expression
        .clone()
        .lambdify_owned(vars.iter().map(|s| s.as_str()).collect());
    Ok(f(point))
}

/// A pair of rows (or columns) whose coefficient vectors are near-collinear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearParallelPair {
    pub first: String,
    pub second: String,
    pub similarity: f64,
}

/// Cosine similarity over the union of nonzero coordinates; pairs with no
/// shared coordinate are skipped, exact scalar multiples give 1.0.
fn cosine(a: &[(usize, f64)], b: &[(usize, f64)]) -> Option<f64> {
    let map_a: HashMap<usize, f64> = a.iter().cloned().collect();
    let mut dot = 0.0;
    let mut shared = false;
    for &(k, vb) in b {
        if let Some(&va) = map_a.get(&k) {
            dot += va * vb;
            shared = true;
        }
    }
    if !shared {
        return None;
    }
    let norm_a: f64 = a.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / (norm_a * norm_b)).abs())
}

/// Constraint rows whose coefficient vectors exceed the similarity
/// threshold, in (row, row) order.
pub fn near_parallel_constraints(
    jacobian: &JacobianSnapshot,
    threshold: f64,
) -> Vec<NearParallelPair> {
    let rows: Vec<Vec<(usize, f64)>> = (0..jacobian.n_rows()).map(|i| jacobian.row(i)).collect();
    let mut pairs = Vec::new();
    for i in 0..rows.len() {
        for k in (i + 1)..rows.len() {
            if let Some(similarity) = cosine(&rows[i], &rows[k]) {
                if similarity > threshold {
                    pairs.push(NearParallelPair {
                        first: jacobian.constraint_names[i].clone(),
                        second: jacobian.constraint_names[k].clone(),
                        similarity,
                    });
                }
            }
        }
    }
    pairs
}

/// Variable columns whose coefficient vectors exceed the similarity
/// threshold, symptom of two variables the model cannot tell apart.
pub fn near_parallel_variables(
    jacobian: &JacobianSnapshot,
    threshold: f64,
) -> Vec<NearParallelPair> {
    let cols: Vec<Vec<(usize, f64)>> = (0..jacobian.n_cols()).map(|j| jacobian.column(j)).collect();
    let mut pairs = Vec::new();
    for i in 0..cols.len() {
        for k in (i + 1)..cols.len() {
            if let Some(similarity) = cosine(&cols[i], &cols[k]) {
                if similarity > threshold {
                    pairs.push(NearParallelPair {
                        first: jacobian.variable_names[i].clone(),
                        second: jacobian.variable_names[k].clone(),
                        similarity,
                    });
                }
            }
        }
    }
    pairs
}

/// Singular-value based conditioning summary of the assembled Jacobian.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditioningReport {
    pub smallest_singular_value: f64,
    pub largest_singular_value: f64,
    pub condition_number: f64,
    /// smallest singular value below the configured tolerance
    pub singular: bool,
}

/// `None` for an empty Jacobian.
pub fn conditioning(jacobian: &JacobianSnapshot, tolerance: f64) -> Option<ConditioningReport> {
    if jacobian.n_rows() == 0 || jacobian.n_cols() == 0 {
        return None;
    }
    let svd = jacobian.to_dense().svd(false, false);
    let sv = svd.singular_values;
    let largest = sv[0];
    let smallest = sv[sv.len() - 1];
    let condition_number = if smallest > 0.0 {
        largest / smallest
    } else {
        f64::INFINITY
    };
    Some(ConditioningReport {
        smallest_singular_value: smallest,
        largest_singular_value: largest,
        condition_number,
        singular: smallest < tolerance,
    })
}

/// A restricted-domain operation whose operand currently sits at or near an
/// excluded value. Surfaced as a warning, never raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationWarning {
    pub constraint: String,
    pub operation: String,
    pub operand_value: f64,
}

/// Static scan for potential evaluation errors: division by a near-zero
/// denominator, logarithm of a nonpositive argument, fractional power of a
/// nonpositive base, all judged at the current variable values.
pub fn scan_evaluation_errors(
    model: &impl ModelView,
    tolerance: f64,
) -> Result<Vec<EvaluationWarning>, DiagError> {
    let values = value_map(model);
    let mut warnings = Vec::new();
    for c in model.constraints() {
        if !c.active {
            continue;
        }
        walk(&c.expression, &values, tolerance, &c.name, &mut warnings)?;
    }
    Ok(warnings)
}

fn walk(
    expression: &Expr,
    values: &HashMap<String, f64>,
    tolerance: f64,
    constraint: &str,
    warnings: &mut Vec<EvaluationWarning>,
) -> Result<(), DiagError> {
    match expression {
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
            walk(a, values, tolerance, constraint, warnings)?;
            walk(b, values, tolerance, constraint, warnings)?;
        }
        Expr::Div(a, b) => {
            walk(a, values, tolerance, constraint, warnings)?;
            walk(b, values, tolerance, constraint, warnings)?;
            let denominator = evaluate_at(b, values, constraint)?;
            if denominator.abs() <= tolerance {
                warnings.push(EvaluationWarning {
                    constraint: constraint.to_string(),
                    operation: format!("division by ({})", b),
                    operand_value: denominator,
                });
            }
        }
        Expr::Ln(a) => {
            walk(a, values, tolerance, constraint, warnings)?;
            let argument = evaluate_at(a, values, constraint)?;
            if argument <= tolerance {
                warnings.push(EvaluationWarning {
                    constraint: constraint.to_string(),
                    operation: format!("log of ({})", a),
                    operand_value: argument,
                });
            }
        }
        Expr::Pow(base, exponent) => {
            walk(base, values, tolerance, constraint, warnings)?;
            walk(exponent, values, tolerance, constraint, warnings)?;
            if let Expr::Const(p) = exponent.as_ref() {
                if p.fract() != 0.0 {
                    // fractional power (e.g. square root) of a nonpositive base
                    let b = evaluate_at(base, values, constraint)?;
                    if b <= tolerance {
                        warnings.push(EvaluationWarning {
                            constraint: constraint.to_string(),
                            operation: format!("power {} of ({})", p, base),
                            operand_value: b,
                        });
                    }
                } else if *p < 0.0 {
                    // negative integer power is a division in disguise
                    let b = evaluate_at(base, values, constraint)?;
                    if b.abs() <= tolerance {
                        warnings.push(EvaluationWarning {
                            constraint: constraint.to_string(),
                            operation: format!("power {} of ({})", p, base),
                            operand_value: b,
                        });
                    }
                }
            }
        }
        Expr::Exp(a) => {
            walk(a, values, tolerance, constraint, warnings)?;
        }
        _ => {}
    }
    Ok(())
}
