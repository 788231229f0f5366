#[allow(non_snake_case)]
pub mod Diagnostics;
#[allow(non_snake_case)]
pub mod Examples;

use Examples::diagnostics_examples::diagnostics_examples;

pub fn main() {
    //
    let task: usize = 1;
    diagnostics_examples(task);
}
