//! Bipartite variable-constraint incidence graph.
//!
//! Built fresh from a model snapshot on every analysis call; node numbering
//! follows declaration order so repeated runs give identical downstream
//! results.

use super::model::{DiagError, ModelView};
use log::{info, warn};
use std::collections::{HashMap, HashSet};

/// A node of the incidence graph, addressed by name for ad hoc inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    Constraint(String),
    Variable(String),
}

#[derive(Debug, Clone)]
pub struct IncidenceGraph {
    /// active constraints, declaration order
    pub constraint_names: Vec<String>,
    /// participating variables, declaration order
    pub variable_names: Vec<String>,
    /// constraint index -> ascending variable indices
    pub con_adjacency: Vec<Vec<usize>>,
    /// variable index -> ascending constraint indices
    pub var_adjacency: Vec<Vec<usize>>,
}

impl IncidenceGraph {
    /// Enumerate active constraints and the variables syntactically present
    /// in their residuals. With `include_fixed = false` fixed variables are
    /// not nodes; a constraint over fixed variables only stays in the graph
    /// with zero degree, which is a diagnostic signal in itself.
    ///
    /// A reference to an identifier that is not a model variable aborts
    /// with [`DiagError::ExpressionError`]; constraints are never silently
    /// dropped.
    pub fn build(model: &impl ModelView, include_fixed: bool) -> Result<Self, DiagError> {
        let mut variable_names = Vec::new();
        let mut var_index: HashMap<String, usize> = HashMap::new();
        let mut fixed_names: HashSet<String> = HashSet::new();
        for v in model.variables() {
            if v.fixed && !include_fixed {
                fixed_names.insert(v.name.clone());
                continue;
            }
            var_index.insert(v.name.clone(), variable_names.len());
            variable_names.push(v.name.clone());
        }

        let mut constraint_names = Vec::new();
        let mut con_adjacency = Vec::new();
        for c in model.constraints() {
            if !c.active {
                continue;
            }
            let mut adjacent = Vec::new();
            for name in c.variables_in_expression() {
                match var_index.get(&name) {
                    Some(&j) => adjacent.push(j),
                    None => {
                        if fixed_names.contains(&name) {
                            continue;
                        }
                        return Err(DiagError::ExpressionError {
                            constraint: c.name.clone(),
                            message: format!("references unknown identifier '{}'", name),
                        });
                    }
                }
            }
            adjacent.sort();
            adjacent.dedup();
            if adjacent.is_empty() {
                warn!(
                    "constraint '{}' has zero free-variable degree",
                    c.name
                );
            }
            constraint_names.push(c.name.clone());
            con_adjacency.push(adjacent);
        }

        let mut var_adjacency = vec![Vec::new(); variable_names.len()];
        for (i, adjacent) in con_adjacency.iter().enumerate() {
            for &j in adjacent {
                var_adjacency[j].push(i);
            }
        }
        info!(
            "incidence graph built: {} constraints, {} variables, {} edges",
            constraint_names.len(),
            variable_names.len(),
            con_adjacency.iter().map(|a| a.len()).sum::<usize>()
        );
        Ok(Self {
            constraint_names,
            variable_names,
            con_adjacency,
            var_adjacency,
        })
    }

    pub fn n_constraints(&self) -> usize {
        self.constraint_names.len()
    }

    pub fn n_variables(&self) -> usize {
        self.variable_names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.con_adjacency.iter().map(|a| a.len()).sum()
    }

    pub fn constraint_position(&self, name: &str) -> Option<usize> {
        self.constraint_names.iter().position(|n| n == name)
    }

    pub fn variable_position(&self, name: &str) -> Option<usize> {
        self.variable_names.iter().position(|n| n == name)
    }

    /// Neighbors of a node, in graph order.
    pub fn adjacent(&self, node: &GraphNode) -> Result<Vec<String>, DiagError> {
        match node {
            GraphNode::Constraint(name) => match self.constraint_position(name) {
                Some(i) => Ok(self.con_adjacency[i]
                    .iter()
                    .map(|&j| self.variable_names[j].clone())
                    .collect()),
                None => Err(DiagError::ModelError(format!(
                    "no active constraint named '{}' in the graph",
                    name
                ))),
            },
            GraphNode::Variable(name) => match self.variable_position(name) {
                Some(j) => Ok(self.var_adjacency[j]
                    .iter()
                    .map(|&i| self.constraint_names[i].clone())
                    .collect()),
                None => Err(DiagError::ModelError(format!(
                    "no variable named '{}' in the graph",
                    name
                ))),
            },
        }
    }
}
