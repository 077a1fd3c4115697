use thiserror::Error;

/// Fatal solver errors.
///
/// Infeasible, unbounded, and non-convergent outcomes are *not* errors;
/// they are reported through [`crate::SolveStatus`] so batch callers can
/// inspect every result uniformly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
    #[error("Near-zero pivot element {value:e} at row {row}, column {col}")]
    IllConditioned { row: usize, col: usize, value: f64 },
    #[error("Sensitivity analysis requires a prior optimal solve")]
    NoOptimalSolution,
}
