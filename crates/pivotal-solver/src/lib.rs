mod engine;
mod error;
mod problem;
mod sensitivity;
mod solution;
mod tableau;

pub use engine::SimplexEngine;
pub use error::SolverError;
pub use problem::{Constraint, Direction, LpProblem, Relation};
pub use solution::{
    IterationSnapshot, Phase, ReducedCost, SensitivityRange, SensitivityReport, ShadowPrice,
    SolveResult, SolveStatus,
};
