/// model snapshot types, the polymorphic model view and subsystem extraction
pub mod model;
/// bipartite variable-constraint incidence graph
pub mod incidence;
/// maximum bipartite matching (augmenting path search)
pub mod matching;
/// Dulmage-Mendelsohn classification and block decomposition
pub mod dulmage_mendelsohn;
/// value-dependent diagnostics: near-parallel rows, conditioning, domain scan
pub mod numerical;
/// queryable reports and table rendering
pub mod report;
/// user-facing facade of the whole pipeline
pub mod diagnostics_api;
mod matching_tests;
mod numerical_tests;
