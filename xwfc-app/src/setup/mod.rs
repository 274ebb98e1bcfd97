pub mod execution;
pub mod solver;
