/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Diagnostics::diagnostics_api::{DiagConfig, SystemDiagnoser, Verbosity};
    use crate::Diagnostics::incidence::IncidenceGraph;
    use crate::Diagnostics::model::EquationSystem;
    use crate::Diagnostics::numerical::{
        JacobianSnapshot, conditioning, near_parallel_constraints, near_parallel_variables,
        scan_evaluation_errors,
    };
    use approx::assert_relative_eq;

    fn quiet() -> SystemDiagnoser {
        let mut config = DiagConfig::default();
        config.verbosity = Verbosity::Silent;
        SystemDiagnoser::with_config(config)
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_scalar_multiple_rows_are_parallel() {
        // rows [1,2,3] and [2,4,6]: similarity exactly 1.0
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 2),
            names("v", 3),
            vec![
                (0, 0, 1.0),
                (0, 1, 2.0),
                (0, 2, 3.0),
                (1, 0, 2.0),
                (1, 1, 4.0),
                (1, 2, 6.0),
            ],
        );
        let pairs = near_parallel_constraints(&jacobian, 0.999);
        assert_eq!(pairs.len(), 1);
        assert_relative_eq!(pairs[0].similarity, 1.0, epsilon = 1e-12);
        let pairs = near_parallel_constraints(&jacobian, 0.0);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_orthogonal_rows_are_never_flagged() {
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 2),
            names("v", 3),
            vec![(0, 0, 1.0), (1, 1, 1.0)],
        );
        // no shared coordinate at all: skipped
        assert!(near_parallel_constraints(&jacobian, 0.0).is_empty());
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 2),
            names("v", 2),
            vec![(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, -1.0)],
        );
        assert!(near_parallel_constraints(&jacobian, 0.0).is_empty());
    }

    #[test]
    fn test_antiparallel_rows_are_flagged() {
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 2),
            names("v", 2),
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, -1.0), (1, 1, -2.0)],
        );
        let pairs = near_parallel_constraints(&jacobian, 0.99);
        assert_eq!(pairs.len(), 1);
        assert_relative_eq!(pairs[0].similarity, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_columns() {
        // two variables the constraints cannot tell apart
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 2),
            names("v", 2),
            vec![(0, 0, 1.0), (0, 1, 3.0), (1, 0, 2.0), (1, 1, 6.0)],
        );
        let pairs = near_parallel_variables(&jacobian, 0.99);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first, "v0");
        assert_eq!(pairs[0].second, "v1");
    }

    #[test]
    fn test_conditioning_identity_is_sound() {
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 3),
            names("v", 3),
            vec![(0, 0, 1.0), (1, 1, 1.0), (2, 2, 1.0)],
        );
        let report = conditioning(&jacobian, 1e-8).unwrap();
        assert!(!report.singular);
        assert_relative_eq!(report.smallest_singular_value, 1.0, epsilon = 1e-12);
        assert_relative_eq!(report.condition_number, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_conditioning_rank_deficient_matrix() {
        let jacobian = JacobianSnapshot::from_triplets(
            names("c", 2),
            names("v", 2),
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 4.0)],
        );
        let report = conditioning(&jacobian, 1e-8).unwrap();
        assert!(report.singular);
        assert!(report.smallest_singular_value < 1e-10);
    }

    #[test]
    fn test_conditioning_empty_jacobian() {
        let jacobian = JacobianSnapshot::from_triplets(Vec::new(), Vec::new(), Vec::new());
        assert!(conditioning(&jacobian, 1e-8).is_none());
    }

    #[test]
    fn test_symbolic_jacobian_evaluation() {
        let mut model = EquationSystem::new();
        model.add_free_variable("x", 2.0);
        model.add_free_variable("y", 3.0);
        model.add_equation("c1", "x^2 + y - 1");
        model.add_equation("c2", "x*y - 2");
        let graph = IncidenceGraph::build(&model, false).unwrap();
        let jacobian = JacobianSnapshot::evaluate(&model, &graph).unwrap();
        let dense = jacobian.to_dense();
        // d(c1)/dx = 2x = 4, d(c1)/dy = 1
        assert_relative_eq!(dense[(0, 0)], 4.0, epsilon = 1e-9);
        assert_relative_eq!(dense[(0, 1)], 1.0, epsilon = 1e-9);
        // d(c2)/dx = y = 3, d(c2)/dy = x = 2
        assert_relative_eq!(dense[(1, 0)], 3.0, epsilon = 1e-9);
        assert_relative_eq!(dense[(1, 1)], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_structurally_sound_but_numerically_singular() {
        // symbolically distinct constraints, numerically collinear rows:
        // the case the structural analysis cannot see
        let mut model = EquationSystem::new();
        model.add_free_variable("x", 1.0);
        model.add_free_variable("y", 1.0);
        model.add_equation("c1", "x + y - 1");
        model.add_equation("c2", "2*x + 2*y - 5");
        let diagnoser = quiet();
        let structural = diagnoser.report_structural_issues(&model).unwrap();
        assert!(!structural.structurally_singular());
        let numerical = diagnoser.report_numerical_issues(&model, None).unwrap();
        assert!(numerical.numerically_suspect());
        assert_eq!(numerical.near_parallel_pairs().len(), 1);
        assert!(numerical.conditioning.unwrap().singular);
    }

    #[test]
    fn test_evaluation_error_scan_log_and_division() {
        let mut model = EquationSystem::new();
        model.add_free_variable("x", 1.0);
        model.add_free_variable("y", 0.0);
        model.add_equation("uses_log", "ln( y ) + x");
        model.add_equation("uses_division", "1/(x - 1) + y");
        model.add_equation("harmless", "x + y");
        let warnings = scan_evaluation_errors(&model, 1e-8).unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].constraint, "uses_log");
        assert_relative_eq!(warnings[0].operand_value, 0.0, epsilon = 1e-12);
        assert_eq!(warnings[1].constraint, "uses_division");
    }

    #[test]
    fn test_evaluation_error_scan_fractional_power() {
        let mut model = EquationSystem::new();
        model.add_free_variable("x", -0.5);
        model.add_equation("uses_sqrt", "x^0.5 - 1");
        let warnings = scan_evaluation_errors(&model, 1e-8).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_relative_eq!(warnings[0].operand_value, -0.5, epsilon = 1e-12);
        // healthy point: no warning
        let mut model = EquationSystem::new();
        model.add_free_variable("x", 4.0);
        model.add_equation("uses_sqrt", "x^0.5 - 1");
        assert!(scan_evaluation_errors(&model, 1e-8).unwrap().is_empty());
    }

    #[test]
    fn test_warnings_are_data_not_errors() {
        // a badly singular, domain-violating model still yields a report
        let mut model = EquationSystem::new();
        model.add_free_variable("x", 1e-9);
        model.add_equation("c1", "ln( x )");
        model.add_equation("c2", "ln( x ) + 1");
        let diagnoser = quiet();
        let report = diagnoser.report_numerical_issues(&model, None).unwrap();
        assert_eq!(report.evaluation_warnings.len(), 2);
    }
}
