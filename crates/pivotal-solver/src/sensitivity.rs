//! Post-optimal sensitivity analysis.
//!
//! Everything here is a pure function of a finished optimal tableau plus the
//! original objective and RHS vectors; the tableau is never mutated.

use crate::problem::{Direction, LpProblem, Relation};
use crate::solution::{ReducedCost, SensitivityRange, SensitivityReport, ShadowPrice};
use crate::tableau::Tableau;

/// Sign of a row's slack/surplus coefficient: +1 for a slack, -1 for a
/// surplus. Multiplying the stored column by this recovers the true
/// basis-inverse column of the constraint.
fn aux_sign(relation: Relation) -> f64 {
    if relation == Relation::Ge { -1.0 } else { 1.0 }
}

pub(crate) fn analyze(tableau: &Tableau, problem: &LpProblem, tol: f64) -> SensitivityReport {
    let shadow_prices = shadow_prices(tableau, problem, tol);
    let binding_constraints = shadow_prices
        .iter()
        .filter(|sp| sp.value.abs() > tol)
        .map(|sp| sp.constraint.clone())
        .collect();

    SensitivityReport {
        reduced_costs: reduced_costs(tableau, problem),
        binding_constraints,
        objective_ranges: objective_ranges(tableau, problem, tol),
        rhs_ranges: rhs_ranges(tableau, problem, tol),
        shadow_prices,
    }
}

/// Dual value per constraint, read off the reduced-cost row at the
/// constraint's slack/surplus column. Equality rows have no such column and
/// are omitted. Rows that were flipped during normalization get their price
/// negated back into the caller's original orientation.
fn shadow_prices(tableau: &Tableau, problem: &LpProblem, tol: f64) -> Vec<ShadowPrice> {
    let mut prices = Vec::new();
    for (i, constraint) in problem.constraints.iter().enumerate() {
        let Some(col) = tableau.slack_cols[i] else {
            continue;
        };
        let mut value = -tableau.reduced_cost(col) * aux_sign(tableau.relations[i]);
        if tableau.flipped[i] {
            value = -value;
        }
        let interpretation = if value.abs() < tol {
            "Non-binding constraint".to_string()
        } else {
            format!(
                "Objective changes by {:.4} per unit increase in the right-hand side",
                value
            )
        };
        prices.push(ShadowPrice {
            constraint: constraint.name.clone(),
            value,
            interpretation,
        });
    }
    prices
}

fn reduced_costs(tableau: &Tableau, problem: &LpProblem) -> Vec<ReducedCost> {
    let values = tableau.solution_values();
    problem
        .variables
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let is_basic = tableau.is_basic(j);
            ReducedCost {
                variable: name.clone(),
                value: values[j],
                reduced_cost: if is_basic { 0.0 } else { tableau.reduced_cost(j) },
                is_basic,
            }
        })
        .collect()
}

/// Interval each objective coefficient may move in while the current basis
/// stays optimal.
///
/// For a basic variable the bounds come from ratios of non-basic reduced
/// costs to the variable's row entries; which side a ratio clamps depends on
/// the entry sign and the optimization direction. A non-basic variable is
/// bounded only on the side that would make it attractive, by exactly its
/// reduced cost.
fn objective_ranges(tableau: &Tableau, problem: &LpProblem, tol: f64) -> Vec<SensitivityRange> {
    let rhs_col = tableau.rhs_col();
    let mut ranges = Vec::new();
    for (j, name) in problem.variables.iter().enumerate() {
        let current = problem.objective[j];
        let (lower, upper) = match tableau.basic_row_of(j) {
            Some(row) => {
                let mut lo = f64::NEG_INFINITY;
                let mut hi = f64::INFINITY;
                for k in 0..rhs_col {
                    if tableau.is_basic(k) {
                        continue;
                    }
                    let entry = tableau.data[row][k];
                    if entry.abs() <= tol {
                        continue;
                    }
                    let ratio = tableau.reduced_cost(k) / entry;
                    let clamps_upper = match problem.direction {
                        Direction::Minimize => entry > 0.0,
                        Direction::Maximize => entry < 0.0,
                    };
                    if clamps_upper {
                        hi = hi.min(ratio);
                    } else {
                        lo = lo.max(ratio);
                    }
                }
                (current + lo, current + hi)
            }
            None => {
                let rc = tableau.reduced_cost(j);
                match problem.direction {
                    Direction::Maximize => (f64::NEG_INFINITY, current - rc),
                    Direction::Minimize => (current - rc, f64::INFINITY),
                }
            }
        };
        ranges.push(SensitivityRange {
            name: name.clone(),
            current,
            lower,
            upper,
        });
    }
    ranges
}

/// Interval each RHS may move in while the current basis stays feasible,
/// derived from the constraint's basis-inverse column (its slack/surplus
/// column, sign-corrected). Equality rows are omitted; flipped rows are
/// mirrored back into the original orientation.
fn rhs_ranges(tableau: &Tableau, problem: &LpProblem, tol: f64) -> Vec<SensitivityRange> {
    let mut ranges = Vec::new();
    for (i, constraint) in problem.constraints.iter().enumerate() {
        let Some(col) = tableau.slack_cols[i] else {
            continue;
        };
        let sign = aux_sign(tableau.relations[i]);
        let mut lo = f64::NEG_INFINITY;
        let mut hi = f64::INFINITY;
        for row in 0..tableau.n_constraints {
            let entry = tableau.data[row][col] * sign;
            if entry.abs() <= tol {
                continue;
            }
            let ratio = -tableau.rhs(row) / entry;
            if entry > 0.0 {
                lo = lo.max(ratio);
            } else {
                hi = hi.min(ratio);
            }
        }
        let current = constraint.rhs;
        let (lower, upper) = if tableau.flipped[i] {
            (current - hi, current - lo)
        } else {
            (current + lo, current + hi)
        };
        ranges.push(SensitivityRange {
            name: constraint.name.clone(),
            current,
            lower,
            upper,
        });
    }
    ranges
}
