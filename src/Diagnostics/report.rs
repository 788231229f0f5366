//! Queryable diagnostic reports and their table rendering.
//!
//! Read-only views over the analysis results: nothing here re-derives a
//! classification, the generators upstream already ordered every set
//! deterministically.

use super::dulmage_mendelsohn::{DMBlock, DMPartition};
use super::numerical::{ConditioningReport, EvaluationWarning, NearParallelPair};
use prettytable::{Table, row};
use serde::{Deserialize, Serialize};

/// Outcome of the structural (symbolic) analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralReport {
    pub n_free_variables: usize,
    pub n_active_constraints: usize,
    /// free variables minus active constraints
    pub degrees_of_freedom: i64,
    pub matching_size: usize,
    pub partition: DMPartition,
}

impl StructuralReport {
    pub fn underconstrained_set(&self) -> &Vec<DMBlock> {
        &self.partition.underconstrained_blocks
    }

    pub fn overconstrained_set(&self) -> &Vec<DMBlock> {
        &self.partition.overconstrained_blocks
    }

    pub fn structurally_singular(&self) -> bool {
        self.partition.structurally_singular()
    }

    /// terse one-line count summary
    pub fn summary(&self) -> String {
        format!(
            "{} variables / {} constraints, DOF = {}, matching = {}, over-constrained: {} constraints in {} blocks, under-constrained: {} variables in {} blocks",
            self.n_free_variables,
            self.n_active_constraints,
            self.degrees_of_freedom,
            self.matching_size,
            self.partition.overconstrained_constraints.len(),
            self.partition.overconstrained_blocks.len(),
            self.partition.underconstrained_variables.len(),
            self.partition.underconstrained_blocks.len()
        )
    }

    pub fn print_summary(&self) {
        println!("{}", self.summary());
        if self.partition.degenerate {
            println!("degenerate model: no constraints or no variables to analyze");
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn print_underconstrained(&self) {
        print_blocks(
            "under-constrained blocks",
            &self.partition.underconstrained_blocks,
        );
    }

    pub fn print_overconstrained(&self) {
        print_blocks(
            "over-constrained blocks",
            &self.partition.overconstrained_blocks,
        );
    }

    pub fn print_well_constrained(&self) {
        print_blocks(
            "well-constrained blocks (solve order)",
            &self.partition.well_constrained_blocks,
        );
    }
}

fn print_blocks(title: &str, blocks: &[DMBlock]) {
    if blocks.is_empty() {
        println!("{}: none", title);
        return;
    }
    let mut table = Table::new();
    table.add_row(row![title, "constraints", "variables"]);
    for (k, block) in blocks.iter().enumerate() {
        table.add_row(row![
            format!("block {}", k),
            block.constraints.join(", "),
            block.variables.join(", ")
        ]);
    }
    table.printstd();
}

/// Outcome of the numerical (value-dependent) analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericalReport {
    pub near_parallel_constraints: Vec<NearParallelPair>,
    pub near_parallel_variables: Vec<NearParallelPair>,
    pub conditioning: Option<ConditioningReport>,
    pub evaluation_warnings: Vec<EvaluationWarning>,
}

impl NumericalReport {
    pub fn near_parallel_pairs(&self) -> &Vec<NearParallelPair> {
        &self.near_parallel_constraints
    }

    pub fn numerically_suspect(&self) -> bool {
        !self.near_parallel_constraints.is_empty()
            || !self.near_parallel_variables.is_empty()
            || self.conditioning.as_ref().map(|c| c.singular).unwrap_or(false)
    }

    pub fn summary(&self) -> String {
        let sv = match &self.conditioning {
            Some(c) => format!(
                "smallest singular value {:.3e}{}",
                c.smallest_singular_value,
                if c.singular { " (singular)" } else { "" }
            ),
            None => "empty Jacobian".to_string(),
        };
        format!(
            "{} near-parallel constraint pairs, {} near-parallel variable pairs, {} potential evaluation errors, {}",
            self.near_parallel_constraints.len(),
            self.near_parallel_variables.len(),
            self.evaluation_warnings.len(),
            sv
        )
    }

    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn print_near_parallel(&self) {
        if self.near_parallel_constraints.is_empty() && self.near_parallel_variables.is_empty() {
            println!("near-parallel pairs: none");
            return;
        }
        let mut table = Table::new();
        table.add_row(row!["kind", "first", "second", "similarity"]);
        for p in &self.near_parallel_constraints {
            table.add_row(row![
                "constraints",
                p.first,
                p.second,
                format!("{:.6}", p.similarity)
            ]);
        }
        for p in &self.near_parallel_variables {
            table.add_row(row![
                "variables",
                p.first,
                p.second,
                format!("{:.6}", p.similarity)
            ]);
        }
        table.printstd();
    }

    pub fn print_evaluation_warnings(&self) {
        if self.evaluation_warnings.is_empty() {
            println!("potential evaluation errors: none");
            return;
        }
        let mut table = Table::new();
        table.add_row(row!["constraint", "operation", "operand value"]);
        for w in &self.evaluation_warnings {
            table.add_row(row![w.constraint, w.operation, format!("{:.6e}", w.operand_value)]);
        }
        table.printstd();
    }
}
