#[cfg(test)]
extern crate quickcheck;

pub mod formula;
pub mod solver;

#[cfg(test)]
mod brute_force;

pub use formula::{Clause, Formula, Literal, Model, Variable};
pub use solver::Solver;

#[derive(PartialEq, Clone, Debug)]
pub enum SatResult {
    Satisfiable(Model),
    Unsatisfiable,
}

impl SatResult {
    pub fn is_satisfiable(&self) -> bool {
        match self {
            SatResult::Satisfiable(_) => true,
            SatResult::Unsatisfiable => false,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SatResult::Satisfiable(model) => Some(model),
            SatResult::Unsatisfiable => None,
        }
    }
}
