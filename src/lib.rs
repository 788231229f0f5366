#[allow(non_snake_case)]
pub mod Diagnostics;
#[allow(non_snake_case)]
pub mod Examples;
