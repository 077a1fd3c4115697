use crate::error::SolverError;

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Variable names, in column order
    pub variables: Vec<String>,
    /// Objective function coefficients, one per variable
    pub objective: Vec<f64>,
    /// Optimization direction
    pub direction: Direction,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics and reports)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Relation between the left-hand side and the RHS
    pub relation: Relation,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Relation {
    /// The relation after multiplying a row by -1. Equalities are unaffected.
    pub(crate) fn reversed(self) -> Self {
        match self {
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Eq => Relation::Eq,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: vec![0.0; n],
            direction: Direction::Minimize,
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, direction: Direction) {
        self.objective = coefficients;
        self.direction = direction;
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            relation,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check the dimensional invariants before any tableau is built.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.variables.len();
        if n == 0 {
            return Err(SolverError::InvalidProblem("no variables".to_string()));
        }
        if self.objective.len() != n {
            return Err(SolverError::InvalidProblem(format!(
                "objective has {} coefficients for {} variables",
                self.objective.len(),
                n
            )));
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint '{}' has {} coefficients for {} variables",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
        }
        Ok(())
    }
}
