use log::warn;

use crate::error::SolverError;
use crate::problem::{Direction, LpProblem, Relation};
use crate::solution::Phase;

/// Dense simplex tableau in canonical form.
///
/// Shape is `(m+1) x (total_vars+1)`: one row per constraint plus the
/// reduced-cost row (`r_j = c_j - z_j`) at the bottom, one column per
/// variable plus the RHS at the right. Columns are laid out as the original
/// variables, then one slack or surplus column per inequality row in row
/// order, then the artificial block. The artificial block exists only in
/// Phase 1; `setup_phase2` removes it physically.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    pub(crate) data: Vec<Vec<f64>>,
    /// Basic variable column per row. `None` marks a degenerate row whose
    /// artificial basic variable could not be replaced in the phase
    /// transition.
    pub(crate) basic_vars: Vec<Option<usize>>,
    pub(crate) n_vars: usize,
    pub(crate) n_constraints: usize,
    /// First column of the artificial block; after `setup_phase2` this is
    /// the RHS column index.
    pub(crate) artificial_start: usize,
    pub(crate) n_artificial: usize,
    /// Slack or surplus column of each constraint row; `None` for equality rows
    pub(crate) slack_cols: Vec<Option<usize>>,
    /// Relation of each row after normalization
    pub(crate) relations: Vec<Relation>,
    /// Rows multiplied by -1 so their RHS became non-negative
    pub(crate) flipped: Vec<bool>,
    pub(crate) phase: Phase,
}

impl Tableau {
    /// Build the initial tableau for a validated problem.
    ///
    /// Rows with a negative RHS are multiplied by -1 (reversing their
    /// relation) first, so every RHS is non-negative before the initial
    /// basis is claimed. Each `<=` row contributes a slack, each `>=` row a
    /// surplus and an artificial, each `=` row an artificial.
    pub(crate) fn build(problem: &LpProblem, tol: f64) -> Self {
        let n = problem.num_variables();
        let m = problem.num_constraints();

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(m);
        let mut rhs: Vec<f64> = Vec::with_capacity(m);
        let mut relations: Vec<Relation> = Vec::with_capacity(m);
        let mut flipped: Vec<bool> = Vec::with_capacity(m);
        for c in &problem.constraints {
            if c.rhs < 0.0 {
                rows.push(c.coefficients.iter().map(|&v| -v).collect());
                rhs.push(-c.rhs);
                relations.push(c.relation.reversed());
                flipped.push(true);
            } else {
                rows.push(c.coefficients.clone());
                rhs.push(c.rhs);
                relations.push(c.relation);
                flipped.push(false);
            }
        }

        let n_inequalities = relations.iter().filter(|&&r| r != Relation::Eq).count();
        let n_artificial = relations
            .iter()
            .filter(|&&r| matches!(r, Relation::Ge | Relation::Eq))
            .count();
        let artificial_start = n + n_inequalities;
        let total_cols = artificial_start + n_artificial + 1;

        let mut data = vec![vec![0.0; total_cols]; m + 1];
        for i in 0..m {
            data[i][..n].copy_from_slice(&rows[i]);
            data[i][total_cols - 1] = rhs[i];
        }

        let mut basic_vars = vec![None; m];
        let mut slack_cols = vec![None; m];
        let mut aux_col = n;
        let mut art_col = artificial_start;
        for i in 0..m {
            match relations[i] {
                Relation::Le => {
                    data[i][aux_col] = 1.0;
                    slack_cols[i] = Some(aux_col);
                    basic_vars[i] = Some(aux_col);
                    aux_col += 1;
                }
                Relation::Ge => {
                    data[i][aux_col] = -1.0;
                    slack_cols[i] = Some(aux_col);
                    aux_col += 1;
                    data[i][art_col] = 1.0;
                    basic_vars[i] = Some(art_col);
                    art_col += 1;
                }
                Relation::Eq => {
                    data[i][art_col] = 1.0;
                    basic_vars[i] = Some(art_col);
                    art_col += 1;
                }
            }
        }

        let mut tableau = Self {
            data,
            basic_vars,
            n_vars: n,
            n_constraints: m,
            artificial_start,
            n_artificial,
            slack_cols,
            relations,
            flipped,
            phase: if n_artificial > 0 { Phase::One } else { Phase::Two },
        };

        if n_artificial > 0 {
            // Phase-1 objective: unit cost on every artificial column, then
            // subtract each artificial-basic row so every basic column's
            // reduced cost is exactly zero.
            for j in artificial_start..artificial_start + n_artificial {
                tableau.data[m][j] = 1.0;
            }
            for i in 0..m {
                if tableau.basic_vars[i].is_some_and(|b| b >= artificial_start) {
                    for j in 0..total_cols {
                        tableau.data[m][j] -= tableau.data[i][j];
                    }
                }
            }
        } else {
            tableau.set_objective_row(&problem.objective, tol);
        }

        tableau
    }

    /// Transition to Phase 2: drop the artificial block, repair rows whose
    /// basic variable was eliminated with it, and rebuild the reduced-cost
    /// row from the original objective.
    pub(crate) fn setup_phase2(&mut self, objective: &[f64], tol: f64) {
        if self.n_artificial > 0 {
            let old_rhs = self.rhs_col();
            let artificial_start = self.artificial_start;
            for row in &mut self.data {
                let rhs = row[old_rhs];
                row.truncate(artificial_start);
                row.push(rhs);
            }
            // A basic artificial at this point is degenerate (its value is
            // zero). Best effort: adopt any surviving identity column for
            // the row; otherwise leave the row unresolved.
            for i in 0..self.n_constraints {
                if self.basic_vars[i].is_some_and(|b| b >= artificial_start) {
                    self.basic_vars[i] = self.find_identity_column(i, tol);
                    if self.basic_vars[i].is_none() {
                        warn!("row {i}: no identity column replaces its artificial basic variable");
                    }
                }
            }
            self.n_artificial = 0;
        }
        self.phase = Phase::Two;
        self.set_objective_row(objective, tol);
    }

    /// Column whose entries form an identity pattern for `row`: 1 in the row
    /// itself, 0 in every other constraint row, and not already basic.
    fn find_identity_column(&self, row: usize, tol: f64) -> Option<usize> {
        'col: for j in 0..self.artificial_start {
            if self.basic_vars.contains(&Some(j)) {
                continue;
            }
            if (self.data[row][j] - 1.0).abs() > tol {
                continue;
            }
            for i in 0..self.n_constraints {
                if i != row && self.data[i][j].abs() > tol {
                    continue 'col;
                }
            }
            return Some(j);
        }
        None
    }

    /// Rewrite the reduced-cost row from `costs` (true coefficients, never
    /// negated), then zero the reduced cost of every basic column by
    /// subtracting multiples of its row.
    fn set_objective_row(&mut self, costs: &[f64], tol: f64) {
        let m = self.n_constraints;
        let cols = self.data[0].len();
        for j in 0..cols {
            self.data[m][j] = 0.0;
        }
        self.data[m][..costs.len()].copy_from_slice(costs);
        for i in 0..m {
            if let Some(basic) = self.basic_vars[i] {
                let factor = self.data[m][basic];
                if factor.abs() > tol {
                    for j in 0..cols {
                        self.data[m][j] -= factor * self.data[i][j];
                    }
                }
            }
        }
    }

    pub(crate) fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    pub(crate) fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    pub(crate) fn reduced_cost(&self, col: usize) -> f64 {
        self.data[self.n_constraints][col]
    }

    /// Current objective value of the phase being run. The reduced-cost
    /// row's RHS cell accumulates `-z` as rows are subtracted from it.
    pub(crate) fn objective_value(&self) -> f64 {
        -self.rhs(self.n_constraints)
    }

    pub(crate) fn has_artificial(&self) -> bool {
        self.n_artificial > 0
    }

    /// True if any artificial variable is still basic with a nonzero value.
    pub(crate) fn artificial_in_basis(&self, tol: f64) -> bool {
        (0..self.n_constraints).any(|i| {
            self.basic_vars[i].is_some_and(|b| b >= self.artificial_start)
                && self.rhs(i).abs() > tol
        })
    }

    /// Columns eligible as entering candidates: Phase 1 never lets an
    /// artificial variable re-enter the basis.
    fn candidate_end(&self) -> usize {
        match self.phase {
            Phase::One => self.artificial_start,
            Phase::Two => self.rhs_col(),
        }
    }

    /// Phase 1 always minimizes the artificial sum, whatever the caller
    /// asked for; Phase 2 follows the problem direction.
    fn search_direction(&self, direction: Direction) -> Direction {
        match self.phase {
            Phase::One => Direction::Minimize,
            Phase::Two => direction,
        }
    }

    pub(crate) fn is_optimal(&self, direction: Direction, tol: f64) -> bool {
        let m = self.n_constraints;
        match self.search_direction(direction) {
            Direction::Maximize => (0..self.candidate_end()).all(|j| self.data[m][j] <= tol),
            Direction::Minimize => (0..self.candidate_end()).all(|j| self.data[m][j] >= -tol),
        }
    }

    /// Most-violating reduced cost wins; ties go to the smallest column
    /// index so degenerate problems cannot cycle.
    pub(crate) fn entering_column(&self, direction: Direction, tol: f64) -> Option<usize> {
        let m = self.n_constraints;
        let mut best: Option<(usize, f64)> = None;
        for j in 0..self.candidate_end() {
            let r = self.data[m][j];
            let improves = match self.search_direction(direction) {
                Direction::Maximize => r > tol && best.is_none_or(|(_, b)| r > b),
                Direction::Minimize => r < -tol && best.is_none_or(|(_, b)| r < b),
            };
            if improves {
                best = Some((j, r));
            }
        }
        best.map(|(j, _)| j)
    }

    /// No constraint row can bound the increase of the entering variable.
    pub(crate) fn is_unbounded(&self, col: usize, tol: f64) -> bool {
        (0..self.n_constraints).all(|i| self.data[i][col] <= tol)
    }

    /// Minimum-ratio test over rows with a strictly positive entry in the
    /// entering column; ties go to the smallest row index.
    pub(crate) fn leaving_row(&self, col: usize, tol: f64) -> Option<usize> {
        let rhs_col = self.rhs_col();
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;
        for i in 0..self.n_constraints {
            let entry = self.data[i][col];
            if entry > tol {
                let ratio = self.data[i][rhs_col] / entry;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }
        min_row
    }

    /// Pivot on `(row, col)`: scale the pivot row to a unit entry, then
    /// eliminate the column from every other row, reduced-cost row included.
    ///
    /// A pivot element below `pivot_tol` means the formulation is
    /// ill-conditioned; continuing would silently corrupt the tableau, so
    /// this is a fatal error rather than a retryable condition.
    pub(crate) fn pivot(
        &mut self,
        row: usize,
        col: usize,
        pivot_tol: f64,
    ) -> Result<(), SolverError> {
        let pivot_val = self.data[row][col];
        if pivot_val.abs() < pivot_tol {
            return Err(SolverError::IllConditioned {
                row,
                col,
                value: pivot_val,
            });
        }

        let cols = self.data[0].len();
        for j in 0..cols {
            self.data[row][j] /= pivot_val;
        }
        for i in 0..self.data.len() {
            if i == row {
                continue;
            }
            let factor = self.data[i][col];
            if factor != 0.0 {
                for j in 0..cols {
                    self.data[i][j] -= factor * self.data[row][j];
                }
            }
        }
        self.basic_vars[row] = Some(col);
        Ok(())
    }

    pub(crate) fn is_basic(&self, col: usize) -> bool {
        self.basic_vars.contains(&Some(col))
    }

    pub(crate) fn basic_row_of(&self, col: usize) -> Option<usize> {
        self.basic_vars.iter().position(|&b| b == Some(col))
    }

    /// Values of the original variables: zero unless basic, in which case
    /// the row's RHS is the value.
    pub(crate) fn solution_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.n_vars];
        let rhs_col = self.rhs_col();
        for (i, basic) in self.basic_vars.iter().enumerate() {
            if let Some(j) = *basic {
                if j < self.n_vars {
                    values[j] = self.data[i][rhs_col];
                }
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn problem(
        objective: Vec<f64>,
        direction: Direction,
        constraints: Vec<(Vec<f64>, Relation, f64)>,
    ) -> LpProblem {
        let n = objective.len();
        let mut p = LpProblem::new((1..=n).map(|i| format!("x{i}")).collect());
        p.set_objective(objective, direction);
        for (i, (coefficients, relation, rhs)) in constraints.into_iter().enumerate() {
            p.add_constraint(format!("c{}", i + 1), coefficients, relation, rhs);
        }
        p
    }

    #[test]
    fn test_build_all_le_starts_in_phase_two() {
        let p = problem(
            vec![3.0, 2.0],
            Direction::Maximize,
            vec![
                (vec![2.0, 1.0], Relation::Le, 100.0),
                (vec![1.0, 1.0], Relation::Le, 80.0),
            ],
        );
        let t = Tableau::build(&p, TOL);

        assert_eq!(t.phase, Phase::Two);
        assert_eq!(t.n_artificial, 0);
        // 2 originals + 2 slacks + RHS
        assert_eq!(t.data[0].len(), 5);
        assert_eq!(t.data.len(), 3);
        assert_eq!(t.basic_vars, vec![Some(2), Some(3)]);
        assert_eq!(t.slack_cols, vec![Some(2), Some(3)]);
        // Reduced costs start at the raw objective coefficients
        assert_eq!(t.reduced_cost(0), 3.0);
        assert_eq!(t.reduced_cost(1), 2.0);
    }

    #[test]
    fn test_build_mixed_relations_counts_auxiliaries() {
        let p = problem(
            vec![2.0, 3.0],
            Direction::Minimize,
            vec![
                (vec![2.0, 1.0], Relation::Ge, 4.0),
                (vec![1.0, 2.0], Relation::Ge, 5.0),
                (vec![1.0, 1.0], Relation::Eq, 6.0),
            ],
        );
        let t = Tableau::build(&p, TOL);

        assert_eq!(t.phase, Phase::One);
        // 2 originals + 2 surpluses, artificial block of 3, + RHS
        assert_eq!(t.artificial_start, 4);
        assert_eq!(t.n_artificial, 3);
        assert_eq!(t.data[0].len(), 8);
        // Surplus columns carry -1 in their rows
        assert_eq!(t.data[0][2], -1.0);
        assert_eq!(t.data[1][3], -1.0);
        // Equality row has no slack/surplus column
        assert_eq!(t.slack_cols, vec![Some(2), Some(3), None]);
        // All three rows start with their artificial basic
        assert_eq!(t.basic_vars, vec![Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn test_build_phase1_objective_row_is_priced_out() {
        let p = problem(
            vec![2.0, 3.0],
            Direction::Minimize,
            vec![
                (vec![2.0, 1.0], Relation::Ge, 4.0),
                (vec![1.0, 2.0], Relation::Ge, 5.0),
                (vec![1.0, 1.0], Relation::Eq, 6.0),
            ],
        );
        let t = Tableau::build(&p, TOL);

        // Every basic (artificial) column's reduced cost is exactly zero
        for i in 0..t.n_constraints {
            let basic = t.basic_vars[i].unwrap();
            assert!(t.reduced_cost(basic).abs() < TOL);
        }
        // Original columns accumulate the negated row sums
        assert!((t.reduced_cost(0) - -4.0).abs() < TOL);
        assert!((t.reduced_cost(1) - -4.0).abs() < TOL);
        // The objective cell holds -sum(b) = -15, i.e. artificial sum 15
        assert!((t.objective_value() - 15.0).abs() < TOL);
    }

    #[test]
    fn test_build_flips_negative_rhs_row() {
        // -x1 - x2 <= -2 is x1 + x2 >= 2 after normalization
        let p = problem(
            vec![1.0, 1.0],
            Direction::Maximize,
            vec![(vec![-1.0, -1.0], Relation::Le, -2.0)],
        );
        let t = Tableau::build(&p, TOL);

        assert_eq!(t.relations, vec![Relation::Ge]);
        assert_eq!(t.flipped, vec![true]);
        assert_eq!(t.phase, Phase::One);
        assert!((t.data[0][0] - 1.0).abs() < TOL);
        assert!((t.data[0][1] - 1.0).abs() < TOL);
        assert!((t.rhs(0) - 2.0).abs() < TOL);
    }

    #[test]
    fn test_entering_column_most_violating_then_smallest_index() {
        let p = problem(
            vec![3.0, 2.0],
            Direction::Maximize,
            vec![(vec![1.0, 1.0], Relation::Le, 10.0)],
        );
        let t = Tableau::build(&p, TOL);
        assert_eq!(t.entering_column(Direction::Maximize, TOL), Some(0));

        // Tied reduced costs: smallest column index wins
        let p = problem(
            vec![2.0, 2.0],
            Direction::Maximize,
            vec![(vec![1.0, 1.0], Relation::Le, 10.0)],
        );
        let t = Tableau::build(&p, TOL);
        assert_eq!(t.entering_column(Direction::Maximize, TOL), Some(0));
    }

    #[test]
    fn test_entering_column_none_at_optimum() {
        let p = problem(
            vec![-1.0, -2.0],
            Direction::Maximize,
            vec![(vec![1.0, 1.0], Relation::Le, 10.0)],
        );
        let t = Tableau::build(&p, TOL);
        assert!(t.is_optimal(Direction::Maximize, TOL));
        assert_eq!(t.entering_column(Direction::Maximize, TOL), None);
        // The same tableau is not optimal when minimizing
        assert!(!t.is_optimal(Direction::Minimize, TOL));
    }

    #[test]
    fn test_leaving_row_minimum_ratio_with_tie_on_smallest_row() {
        let p = problem(
            vec![1.0, 0.0],
            Direction::Maximize,
            vec![
                (vec![2.0, 1.0], Relation::Le, 8.0),
                (vec![1.0, 1.0], Relation::Le, 4.0),
                (vec![1.0, 0.0], Relation::Le, 10.0),
            ],
        );
        let t = Tableau::build(&p, TOL);
        // Ratios for column 0: 4, 4, 10 -> tie between rows 0 and 1
        assert_eq!(t.leaving_row(0, TOL), Some(0));
    }

    #[test]
    fn test_unbounded_column_detection() {
        let p = problem(
            vec![1.0, 1.0],
            Direction::Maximize,
            vec![(vec![1.0, -1.0], Relation::Le, 1.0)],
        );
        let t = Tableau::build(&p, TOL);
        assert!(!t.is_unbounded(0, TOL));
        assert!(t.is_unbounded(1, TOL));
        assert_eq!(t.leaving_row(1, TOL), None);
    }

    #[test]
    fn test_pivot_updates_basis_and_zeroes_column() {
        let p = problem(
            vec![3.0, 2.0],
            Direction::Maximize,
            vec![
                (vec![2.0, 1.0], Relation::Le, 100.0),
                (vec![1.0, 1.0], Relation::Le, 80.0),
            ],
        );
        let mut t = Tableau::build(&p, TOL);
        t.pivot(0, 0, 1e-10).unwrap();

        assert_eq!(t.basic_vars[0], Some(0));
        assert!((t.data[0][0] - 1.0).abs() < TOL);
        assert!(t.data[1][0].abs() < TOL);
        assert!(t.reduced_cost(0).abs() < TOL);
        assert!((t.rhs(0) - 50.0).abs() < TOL);
        assert!((t.rhs(1) - 30.0).abs() < TOL);
    }

    #[test]
    fn test_pivot_near_zero_element_is_fatal() {
        let p = problem(
            vec![1.0, 0.0],
            Direction::Maximize,
            vec![(vec![0.0, 1.0], Relation::Le, 5.0)],
        );
        let mut t = Tableau::build(&p, TOL);
        let err = t.pivot(0, 0, 1e-10).unwrap_err();
        assert!(matches!(err, SolverError::IllConditioned { row: 0, col: 0, .. }));
    }

    #[test]
    fn test_setup_phase2_drops_artificials_and_prices_out() {
        let p = problem(
            vec![2.0, 3.0],
            Direction::Minimize,
            vec![
                (vec![2.0, 1.0], Relation::Ge, 4.0),
                (vec![1.0, 2.0], Relation::Ge, 5.0),
                (vec![1.0, 1.0], Relation::Eq, 6.0),
            ],
        );
        let mut t = Tableau::build(&p, TOL);
        // Drive Phase 1 to completion by hand
        while let Some(col) = t.entering_column(Direction::Minimize, TOL) {
            let row = t.leaving_row(col, TOL).unwrap();
            t.pivot(row, col, 1e-10).unwrap();
        }
        assert!(t.objective_value().abs() < 1e-6);

        t.setup_phase2(&p.objective, TOL);
        assert_eq!(t.phase, Phase::Two);
        assert_eq!(t.n_artificial, 0);
        // 2 originals + 2 surpluses + RHS
        assert_eq!(t.data[0].len(), 5);
        // Basis survived the column removal and is all non-artificial
        for basic in &t.basic_vars {
            assert!(basic.is_some_and(|b| b < 4));
        }
        // Reduced costs of basic columns are zero under the real objective
        for i in 0..t.n_constraints {
            let basic = t.basic_vars[i].unwrap();
            assert!(t.reduced_cost(basic).abs() < 1e-9);
        }
    }

    #[test]
    fn test_solution_values_reads_basic_rows_only() {
        let p = problem(
            vec![3.0, 2.0],
            Direction::Maximize,
            vec![
                (vec![2.0, 1.0], Relation::Le, 100.0),
                (vec![1.0, 1.0], Relation::Le, 80.0),
            ],
        );
        let mut t = Tableau::build(&p, TOL);
        assert_eq!(t.solution_values(), vec![0.0, 0.0]);
        t.pivot(0, 0, 1e-10).unwrap();
        let values = t.solution_values();
        assert!((values[0] - 50.0).abs() < TOL);
        assert_eq!(values[1], 0.0);
    }
}
