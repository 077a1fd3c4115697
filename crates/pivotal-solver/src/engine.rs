use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::SolverError;
use crate::problem::LpProblem;
use crate::sensitivity;
use crate::solution::{IterationSnapshot, SensitivityReport, SolveResult, SolveStatus};
use crate::tableau::Tableau;

/// Hard cap on total pivots across both phases.
const MAX_ITERATIONS: usize = 10_000;
/// Pivot count at which a warning is logged, before the hard cap.
const SAFETY_ITERATION_LIMIT: usize = 9_000;
/// Tolerance for floating point comparisons
const NUMERICAL_TOLERANCE: f64 = 1e-9;
/// Smallest pivot element the elimination step will accept
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Two-phase simplex engine.
///
/// Owns one tableau at a time, rebuilt from scratch at the start of every
/// [`solve`](SimplexEngine::solve) call; nothing carries over between runs
/// except the finished tableau kept for
/// [`sensitivity_analysis`](SimplexEngine::sensitivity_analysis).
pub struct SimplexEngine {
    max_iterations: usize,
    safety_iteration_limit: usize,
    tolerance: f64,
    pivot_tolerance: f64,
    last: Option<SolveContext>,
}

/// Finished solve retained for post-optimal analysis.
struct SolveContext {
    problem: LpProblem,
    tableau: Tableau,
    status: SolveStatus,
}

enum EngineState {
    Phase1Running,
    Phase2Running,
    Terminated(SolveStatus),
}

/// What a single optimality/entering/leaving/pivot round did.
enum StepOutcome {
    Pivoted,
    Optimal,
    Unbounded,
    BudgetExhausted,
}

impl Default for SimplexEngine {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            safety_iteration_limit: SAFETY_ITERATION_LIMIT,
            tolerance: NUMERICAL_TOLERANCE,
            pivot_tolerance: PIVOT_TOLERANCE,
            last: None,
        }
    }
}

impl SimplexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_safety_iteration_limit(mut self, limit: usize) -> Self {
        self.safety_iteration_limit = limit;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_pivot_tolerance(mut self, tol: f64) -> Self {
        self.pivot_tolerance = tol;
        self
    }

    /// Solve the problem with the two-phase simplex method.
    ///
    /// Infeasible, unbounded, and non-convergent runs come back as a
    /// [`SolveStatus`] inside a structured result. `Err` is reserved for a
    /// malformed problem and for an ill-conditioned pivot, which would
    /// corrupt the tableau if the loop continued.
    pub fn solve(&mut self, problem: &LpProblem) -> Result<SolveResult, SolverError> {
        problem.validate()?;
        self.last = None;

        let mut tableau = Tableau::build(problem, self.tolerance);
        let mut steps = Vec::new();
        let mut iterations = 0usize;
        let mut phase1_iterations = tableau.has_artificial().then_some(0usize);

        let mut state = if tableau.has_artificial() {
            EngineState::Phase1Running
        } else {
            debug!("no artificial variables, skipping phase 1");
            EngineState::Phase2Running
        };

        let status = loop {
            state = match state {
                EngineState::Phase1Running => {
                    match self.step(&mut tableau, problem, &mut iterations, &mut steps)? {
                        StepOutcome::Pivoted => {
                            *phase1_iterations.get_or_insert(0) += 1;
                            EngineState::Phase1Running
                        }
                        StepOutcome::Optimal => {
                            // A nonzero artificial sum, or an artificial
                            // still basic with a nonzero value, means no
                            // feasible point exists.
                            if tableau.objective_value().abs() > self.tolerance
                                || tableau.artificial_in_basis(self.tolerance)
                            {
                                EngineState::Terminated(SolveStatus::Infeasible)
                            } else {
                                debug!(
                                    "phase 1 complete after {} iterations",
                                    phase1_iterations.unwrap_or(0)
                                );
                                tableau.setup_phase2(&problem.objective, self.tolerance);
                                EngineState::Phase2Running
                            }
                        }
                        // The artificial sum is bounded below by zero, so an
                        // unbounded phase-1 ray only ever signals an
                        // infeasible original problem.
                        StepOutcome::Unbounded => {
                            EngineState::Terminated(SolveStatus::Infeasible)
                        }
                        StepOutcome::BudgetExhausted => {
                            EngineState::Terminated(SolveStatus::Error)
                        }
                    }
                }
                EngineState::Phase2Running => {
                    match self.step(&mut tableau, problem, &mut iterations, &mut steps)? {
                        StepOutcome::Pivoted => EngineState::Phase2Running,
                        StepOutcome::Optimal => EngineState::Terminated(SolveStatus::Optimal),
                        StepOutcome::Unbounded => EngineState::Terminated(SolveStatus::Unbounded),
                        StepOutcome::BudgetExhausted => {
                            EngineState::Terminated(SolveStatus::Error)
                        }
                    }
                }
                EngineState::Terminated(status) => break status,
            };
        };

        let values = if status == SolveStatus::Optimal {
            tableau.solution_values()
        } else {
            vec![0.0; problem.num_variables()]
        };
        // The objective is always recovered from the original coefficients,
        // never from the phase objective row.
        let objective_value: f64 = problem
            .objective
            .iter()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();
        let solution: BTreeMap<String, f64> = problem
            .variables
            .iter()
            .cloned()
            .zip(values)
            .collect();

        self.last = Some(SolveContext {
            problem: problem.clone(),
            tableau,
            status,
        });

        Ok(SolveResult {
            status,
            solution,
            objective_value,
            iterations,
            phase1_iterations,
            steps,
        })
    }

    /// Post-optimal sensitivity analysis of the most recent solve.
    ///
    /// Calling this without a prior solve, or after one that did not end
    /// `Optimal`, is a contract violation.
    pub fn sensitivity_analysis(&self) -> Result<SensitivityReport, SolverError> {
        let ctx = self
            .last
            .as_ref()
            .filter(|ctx| ctx.status == SolveStatus::Optimal)
            .ok_or(SolverError::NoOptimalSolution)?;
        Ok(sensitivity::analyze(
            &ctx.tableau,
            &ctx.problem,
            self.tolerance,
        ))
    }

    /// One simplex round: optimality check, entering/leaving selection,
    /// unboundedness check, pivot, snapshot.
    fn step(
        &self,
        tableau: &mut Tableau,
        problem: &LpProblem,
        iterations: &mut usize,
        steps: &mut Vec<IterationSnapshot>,
    ) -> Result<StepOutcome, SolverError> {
        if tableau.is_optimal(problem.direction, self.tolerance) {
            return Ok(StepOutcome::Optimal);
        }
        let Some(entering) = tableau.entering_column(problem.direction, self.tolerance) else {
            return Ok(StepOutcome::Optimal);
        };
        if tableau.is_unbounded(entering, self.tolerance) {
            return Ok(StepOutcome::Unbounded);
        }
        let Some(leaving) = tableau.leaving_row(entering, self.tolerance) else {
            return Ok(StepOutcome::Unbounded);
        };
        if *iterations >= self.max_iterations {
            warn!("iteration budget of {} exhausted", self.max_iterations);
            return Ok(StepOutcome::BudgetExhausted);
        }

        tableau.pivot(leaving, entering, self.pivot_tolerance)?;
        *iterations += 1;
        if *iterations == self.safety_iteration_limit {
            warn!(
                "{} iterations without convergence, hard cap is {}",
                iterations, self.max_iterations
            );
        }
        debug!(
            "{:?} pivot {}: entering column {}, leaving row {}",
            tableau.phase, iterations, entering, leaving
        );
        steps.push(IterationSnapshot {
            iteration: *iterations,
            phase: tableau.phase,
            entering,
            leaving,
            tableau: tableau.data.clone(),
            basic_vars: tableau.basic_vars.clone(),
        });
        Ok(StepOutcome::Pivoted)
    }
}
