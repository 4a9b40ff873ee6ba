use crate::formula::{Formula, Model};
use crate::SatResult;

/// Simple brute-force solver implementation for use as ground truth in tests
pub(crate) fn solve_brute_force(f: &Formula) -> SatResult {
    let variables = f.variables();
    assert!(variables.len() <= 20); // just for safety; this is a very bad solver!

    for assignment in 0..(1u32 << variables.len()) {
        let mut model = Model::new();
        for (bit, variable) in variables.iter().enumerate() {
            model.set(*variable, assignment & (1 << bit) != 0);
        }

        if f.eval(&model) == Some(true) {
            return SatResult::Satisfiable(model);
        }
    }

    SatResult::Unsatisfiable
}

#[cfg(test)]
mod tests {
    use crate::formula::{n, p, Clause};

    use super::*;

    #[test]
    fn solve_unit_sat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let f = Formula::new(vec![c1, c2]);

        match solve_brute_force(&f) {
            SatResult::Satisfiable(model) => assert_eq!(f.eval(&model), Some(true)),
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn solve_unit_unsat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let c3 = Clause::new(vec![n(2)]);
        let f = Formula::new(vec![c1, c2, c3]);

        assert_eq!(solve_brute_force(&f), SatResult::Unsatisfiable);
    }

    #[test]
    fn solve_conflict_sat() {
        let c1 = Clause::new(vec![p(1), p(2), p(3)]);
        let c2 = Clause::new(vec![n(1), n(2), p(3)]);
        let c3 = Clause::new(vec![n(2), n(3)]);
        let f = Formula::new(vec![c1, c2, c3]);

        assert!(solve_brute_force(&f).is_satisfiable());
    }

    #[test]
    fn empty_formula_is_sat() {
        let f = Formula::new(vec![]);
        match solve_brute_force(&f) {
            SatResult::Satisfiable(model) => assert!(model.is_empty()),
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn empty_clause_is_unsat() {
        let f = Formula::new(vec![Clause::new(vec![p(1)]), Clause::new(vec![])]);
        assert_eq!(solve_brute_force(&f), SatResult::Unsatisfiable);
    }
}
