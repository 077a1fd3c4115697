use std::collections::BTreeMap;

/// The outcome of a solve, as a status a batch caller can inspect.
///
/// Only ill-conditioned pivots and malformed problems are surfaced as
/// [`crate::SolverError`]; every other outcome lands here.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The iteration budget was exhausted without convergence
    Error,
}

/// Simplex phase a pivot belongs to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    One,
    Two,
}

/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Solution status
    pub status: SolveStatus,
    /// Value of every original variable, zero-filled for non-basic ones
    pub solution: BTreeMap<String, f64>,
    /// Objective value, always the dot product of the original objective
    /// coefficients with the recovered variable vector
    pub objective_value: f64,
    /// Total pivot count across both phases
    pub iterations: usize,
    /// Phase-1 pivot count; `None` when no artificial variables were needed
    pub phase1_iterations: Option<usize>,
    /// Per-pivot snapshots, consumed by report generation
    pub steps: Vec<IterationSnapshot>,
}

/// State of the tableau immediately after one pivot.
///
/// The shape of this type is a stable interface for report generation:
/// iteration index, phase, full matrix copy, basic-variable vector, and the
/// entering/leaving indices that produced it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationSnapshot {
    /// 1-based pivot index across both phases
    pub iteration: usize,
    pub phase: Phase,
    /// Column that entered the basis
    pub entering: usize,
    /// Row whose basic variable left the basis
    pub leaving: usize,
    /// Full copy of the tableau matrix, reduced-cost row included
    pub tableau: Vec<Vec<f64>>,
    /// Basic variable column per row; `None` marks an unresolved degenerate row
    pub basic_vars: Vec<Option<usize>>,
}

/// Post-optimal sensitivity analysis of a finished solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityReport {
    /// Shadow prices (dual values) for each inequality constraint
    pub shadow_prices: Vec<ShadowPrice>,
    /// Reduced costs for each variable
    pub reduced_costs: Vec<ReducedCost>,
    /// Which constraints are binding (tight) at optimum
    pub binding_constraints: Vec<String>,
    /// Range each objective coefficient may move in without changing the
    /// optimal basis
    pub objective_ranges: Vec<SensitivityRange>,
    /// Range each constraint RHS may move in while the basis stays optimal
    pub rhs_ranges: Vec<SensitivityRange>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Shadow price value
    pub value: f64,
    /// Interpretation
    pub interpretation: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRange {
    /// Variable or constraint name
    pub name: String,
    /// Current value
    pub current: f64,
    /// Lower bound of range where the optimal basis stays unchanged
    pub lower: f64,
    /// Upper bound of range where the optimal basis stays unchanged
    pub upper: f64,
}

impl SensitivityRange {
    /// Whether the current value sits inside the reported range.
    pub fn contains_current(&self) -> bool {
        self.lower <= self.current && self.current <= self.upper
    }
}
