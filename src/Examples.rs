/// runnable singularity-diagnostics scenarios
pub mod diagnostics_examples;
