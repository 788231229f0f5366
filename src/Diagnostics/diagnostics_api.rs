//! User-level API of the diagnostics engine.
//!
//! `SystemDiagnoser` bundles the whole pipeline (incidence graph ->
//! matching -> decomposition -> report) behind the handful of calls a
//! model debugging session actually needs. Every call rebuilds from the
//! snapshot; nothing is cached across calls.

use super::dulmage_mendelsohn::decompose;
use super::incidence::{GraphNode, IncidenceGraph};
use super::matching::maximum_matching;
use super::model::{DiagError, ModelView};
use super::numerical::{
    JacobianSnapshot, conditioning, near_parallel_constraints, near_parallel_variables,
    scan_evaluation_errors,
};
use super::report::{NumericalReport, StructuralReport};
use log::info;
use serde::{Deserialize, Serialize};
use simplelog::{Config, LevelFilter, SimpleLogger};

/// How much the display methods print. This is explicit per-call
/// configuration; the engine never mutates global logger state behind the
/// caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verbosity {
    Silent,
    Summary,
    Detailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagConfig {
    /// include fixed variables as graph nodes
    pub include_fixed: bool,
    /// cosine similarity above which two rows/columns count as near-parallel
    pub parallel_threshold: f64,
    /// smallest singular value below which the Jacobian counts as singular
    pub singular_tolerance: f64,
    /// distance to an excluded operand value that triggers a warning
    pub domain_tolerance: f64,
    pub verbosity: Verbosity,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            include_fixed: false,
            parallel_threshold: 0.98,
            singular_tolerance: 1e-8,
            domain_tolerance: 1e-8,
            verbosity: Verbosity::Summary,
        }
    }
}

/// Console logger for binaries and examples. Optional; library callers
/// install whatever logger they prefer.
pub fn init_console_logging(level: LevelFilter) {
    let _ = SimpleLogger::init(level, Config::default());
}

pub struct SystemDiagnoser {
    pub config: DiagConfig,
}

impl SystemDiagnoser {
    pub fn new() -> Self {
        Self {
            config: DiagConfig::default(),
        }
    }

    pub fn with_config(config: DiagConfig) -> Self {
        Self { config }
    }

    /// Incidence graph of the snapshot under the current configuration.
    pub fn build_graph(&self, model: &impl ModelView) -> Result<IncidenceGraph, DiagError> {
        IncidenceGraph::build(model, self.config.include_fixed)
    }

    /// Degrees-of-freedom style summary plus the full Dulmage-Mendelsohn
    /// partition. Badly singular models still produce a report; only
    /// malformed input aborts.
    pub fn report_structural_issues(
        &self,
        model: &impl ModelView,
    ) -> Result<StructuralReport, DiagError> {
        let graph = self.build_graph(model)?;
        let matching = maximum_matching(&graph);
        let partition = decompose(&graph, &matching);
        let n_free_variables = graph.n_variables();
        let n_active_constraints = graph.n_constraints();
        let report = StructuralReport {
            n_free_variables,
            n_active_constraints,
            degrees_of_freedom: n_free_variables as i64 - n_active_constraints as i64,
            matching_size: matching.size(),
            partition,
        };
        info!("structural analysis: {}", report.summary());
        if self.config.verbosity >= Verbosity::Summary {
            report.print_summary();
        }
        if self.config.verbosity >= Verbosity::Detailed {
            report.print_overconstrained();
            report.print_underconstrained();
        }
        Ok(report)
    }

    /// Enumerate the minimal under-constrained blocks with their members.
    pub fn display_underconstrained_set(&self, model: &impl ModelView) -> Result<(), DiagError> {
        let silent = self.silenced();
        let report = silent.report_structural_issues(model)?;
        report.print_underconstrained();
        Ok(())
    }

    /// Enumerate the minimal over-constrained blocks with their members.
    pub fn display_overconstrained_set(&self, model: &impl ModelView) -> Result<(), DiagError> {
        let silent = self.silenced();
        let report = silent.report_structural_issues(model)?;
        report.print_overconstrained();
        Ok(())
    }

    /// Numerical diagnostics at the current point. Pass a caller-evaluated
    /// Jacobian, or `None` to evaluate one symbolically from the snapshot.
    pub fn report_numerical_issues(
        &self,
        model: &impl ModelView,
        jacobian: Option<&JacobianSnapshot>,
    ) -> Result<NumericalReport, DiagError> {
        let owned;
        let jacobian = match jacobian {
            Some(j) => j,
            None => {
                let graph = self.build_graph(model)?;
                owned = JacobianSnapshot::evaluate(model, &graph)?;
                &owned
            }
        };
        let report = NumericalReport {
            near_parallel_constraints: near_parallel_constraints(
                jacobian,
                self.config.parallel_threshold,
            ),
            near_parallel_variables: near_parallel_variables(
                jacobian,
                self.config.parallel_threshold,
            ),
            conditioning: conditioning(jacobian, self.config.singular_tolerance),
            evaluation_warnings: scan_evaluation_errors(model, self.config.domain_tolerance)?,
        };
        info!("numerical analysis: {}", report.summary());
        if self.config.verbosity >= Verbosity::Summary {
            report.print_summary();
        }
        if self.config.verbosity >= Verbosity::Detailed {
            report.print_near_parallel();
            report.print_evaluation_warnings();
        }
        Ok(report)
    }

    /// List the near-parallel constraint pairs at an explicit threshold.
    pub fn display_near_parallel_constraints(
        &self,
        model: &impl ModelView,
        jacobian: Option<&JacobianSnapshot>,
        threshold: f64,
    ) -> Result<(), DiagError> {
        let mut silent = self.silenced();
        silent.config.parallel_threshold = threshold;
        let report = silent.report_numerical_issues(model, jacobian)?;
        report.print_near_parallel();
        Ok(())
    }

    /// Neighbors of a graph node, for ad hoc inspection.
    pub fn adjacent(
        &self,
        model: &impl ModelView,
        node: &GraphNode,
    ) -> Result<Vec<String>, DiagError> {
        let graph = self.build_graph(model)?;
        graph.adjacent(node)
    }

    fn silenced(&self) -> SystemDiagnoser {
        let mut config = self.config.clone();
        config.verbosity = Verbosity::Silent;
        SystemDiagnoser { config }
    }
}
