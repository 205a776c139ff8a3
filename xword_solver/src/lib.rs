pub mod solution;
pub mod solver;
