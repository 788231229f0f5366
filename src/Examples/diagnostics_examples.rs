use crate::Diagnostics::diagnostics_api::{
    DiagConfig, SystemDiagnoser, Verbosity, init_console_logging,
};
use crate::Diagnostics::incidence::GraphNode;
use crate::Diagnostics::model::EquationSystem;
use simplelog::LevelFilter;

/// Runnable diagnostics scenarios:
/// 0 - square, structurally sound reactor balance block
/// 1 - broken composition block (redundant normalization + free flow)
/// 2 - structurally sound but numerically singular pair of constraints
/// 3 - domain scan near a log/division singularity
pub fn diagnostics_examples(task: usize) {
    init_console_logging(LevelFilter::Info);
    match task {
        0 => {
            let mut model = EquationSystem::new();
            model.add_free_variable("T", 350.0);
            model.add_free_variable("q", 1.0);
            model.add_free_variable("k", 0.05);
            model.add_equation("arrhenius", "k - 0.05*T/350");
            model.add_equation("energy", "q - k*T");
            model.add_equation("duty", "T - 350");

            let diagnoser = SystemDiagnoser::new();
            let report = diagnoser.report_structural_issues(&model).unwrap();
            report.print_well_constrained();
            println!(
                "variables adjacent to 'energy': {:?}",
                diagnoser
                    .adjacent(&model, &GraphNode::Constraint("energy".to_string()))
                    .unwrap()
            );
            assert!(!report.structurally_singular());
        }
        1 => {
            // the classic broken composition block: three species
            // specifications plus a redundant sum-to-one normalization,
            // while the flow never gets a defining equation
            let mut model = EquationSystem::new();
            model.add_free_variable("xA", 0.2);
            model.add_free_variable("xB", 0.3);
            model.add_free_variable("xC", 0.5);
            model.add_free_variable("F", 10.0);
            model.add_equation("normalization", "xA + xB + xC - 1");
            model.add_equation("spec_A", "xA - 0.2");
            model.add_equation("spec_B", "xB - 0.3");
            model.add_equation("spec_C", "xC - 0.5");

            let mut config = DiagConfig::default();
            config.verbosity = Verbosity::Detailed;
            let diagnoser = SystemDiagnoser::with_config(config);
            let report = diagnoser.report_structural_issues(&model).unwrap();
            assert!(report.structurally_singular());
            diagnoser.display_overconstrained_set(&model).unwrap();
            diagnoser.display_underconstrained_set(&model).unwrap();
            println!("{}", report.to_json().unwrap());
        }
        2 => {
            // structurally fine, numerically near-parallel at this point
            let mut model = EquationSystem::new();
            model.add_free_variable("x", 1.0);
            model.add_free_variable("y", 1.0);
            model.add_equation("balance", "x + y - 1");
            model.add_equation("almost_same", "2*x + 2.0001*y - 5");

            let diagnoser = SystemDiagnoser::new();
            let structural = diagnoser.report_structural_issues(&model).unwrap();
            assert!(!structural.structurally_singular());
            diagnoser
                .display_near_parallel_constraints(&model, None, 0.99)
                .unwrap();
        }
        3 => {
            let mut model = EquationSystem::new();
            model.add_free_variable("conversion", 0.999999999);
            model.add_free_variable("ratio", 1e-9);
            model.add_equation("rate", "ln(1 - conversion) + ratio");
            model.add_equation("closure", "1/ratio - 5");

            let diagnoser = SystemDiagnoser::new();
            let report = diagnoser.report_numerical_issues(&model, None).unwrap();
            report.print_evaluation_warnings();
        }
        _ => println!("no such example"),
    }
}
