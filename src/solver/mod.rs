mod journal;
mod occurrence;
mod state;

use self::journal::{Frame, Journal};
use self::occurrence::OccurrenceIndex;
use self::state::ClauseTable;
use crate::formula::{Formula, Literal, Model, Variable};
use crate::SatResult;
use log::trace;

#[derive(PartialEq, Clone, Debug)]
enum PropagationResult {
    Conflict,
    NoConflict,
}

/// A DPLL solver: chronological backtracking search with watched-literal
/// unit propagation and pure-literal elimination. Each decision journals
/// the clause states it mutates so backtracking restores them exactly.
pub struct Solver {
    formula: Formula,
    // sorted; drives deterministic variable selection
    variables: Vec<Variable>,
    model: Model,
    occurrence: OccurrenceIndex,
    states: ClauseTable,
    journal: Journal,
    // literals queued to try next, most recent on top
    pending: Vec<Literal>,
}

impl Solver {
    pub fn new(formula: Formula) -> Self {
        let variables = formula.variables();
        let model = Model::new();
        let occurrence = OccurrenceIndex::build(&formula);
        let states = ClauseTable::build(&formula, &model);

        // seed both polarities of the first variable; positive pops first
        let mut pending = vec![];
        if let Some(&first) = variables.first() {
            pending.push(Literal::Negative(first));
            pending.push(Literal::Positive(first));
        }

        Self {
            formula,
            variables,
            model,
            occurrence,
            states,
            journal: Journal::new(),
            pending,
        }
    }

    pub fn solve(&mut self) -> SatResult {
        // trivially sat
        if self.formula.is_empty() {
            return SatResult::Satisfiable(Model::new());
        }

        // a structurally empty clause can never be satisfied
        if self.formula.clauses().any(|clause| clause.is_empty()) {
            return SatResult::Unsatisfiable;
        }

        while let Some(literal) = self.pending.pop() {
            if self.decide(literal) == PropagationResult::Conflict {
                if !self.backtrack() {
                    return SatResult::Unsatisfiable;
                }
                continue;
            }

            // every clause satisfied; the model may still be partial
            if self.states.all_inactive() {
                self.complete_model();
                return SatResult::Satisfiable(self.model.clone());
            }

            if self.is_complete() {
                // a total model should already have deactivated every
                // clause; re-evaluate rather than trust that
                if self.formula.eval(&self.model) == Some(true) {
                    return SatResult::Satisfiable(self.model.clone());
                }
                if !self.backtrack() {
                    return SatResult::Unsatisfiable;
                }
                continue;
            }

            match self.choose_variable() {
                Some(variable) => {
                    self.pending.push(Literal::Negative(variable));
                    self.pending.push(Literal::Positive(variable));
                }
                // an incomplete model always leaves a variable to choose
                None => return SatResult::Unsatisfiable,
            }
        }

        SatResult::Unsatisfiable
    }

    /// Applies a pending literal as the principal of a new decision frame,
    /// then runs unit propagation to fixpoint and pure-literal elimination
    /// to fixpoint under it.
    fn decide(&mut self, literal: Literal) -> PropagationResult {
        trace!("decide {:?} at depth {}", literal, self.journal.depth());

        let frame = self.journal.open(literal.clone());
        self.model.assign(&literal);
        if propagate(
            &self.formula,
            &self.occurrence,
            &self.model,
            &mut self.states,
            frame,
            &literal,
        ) == PropagationResult::Conflict
        {
            return PropagationResult::Conflict;
        }

        loop {
            let unit = match self.states.find_unit() {
                Some((index, position)) => {
                    self.formula.clause(index).literal_at(position).clone()
                }
                None => break,
            };
            trace!("forced {:?} by unit propagation", unit);
            frame.record_forced(unit.clone());
            self.model.assign(&unit);
            if propagate(
                &self.formula,
                &self.occurrence,
                &self.model,
                &mut self.states,
                frame,
                &unit,
            ) == PropagationResult::Conflict
            {
                return PropagationResult::Conflict;
            }
        }

        // deactivating a pure literal's clauses may expose new pure
        // literals; it never produces units or conflicts
        while let Some(pure) =
            find_pure(&self.variables, &self.occurrence, &self.model, &self.states)
        {
            trace!("forced {:?} as pure literal", pure);
            frame.record_forced(pure.clone());
            self.model.assign(&pure);
            for &index in self.occurrence.occurrences_of(&pure) {
                if self.states.is_active(index) {
                    self.states.deactivate(index, frame);
                }
            }
        }

        PropagationResult::NoConflict
    }

    /// Unwinds the journal until the frame for the sibling of the next
    /// pending literal is on top, then undoes that frame as well, leaving
    /// the state as it was just before that decision. False when the
    /// journal or the pending stack is exhausted first: the search space
    /// is spent.
    fn backtrack(&mut self) -> bool {
        let target = match self.pending.last() {
            Some(next) => next.negated(),
            None => return false,
        };

        loop {
            let aligned = match self.journal.top_principal() {
                Some(principal) => *principal == target,
                None => return false,
            };
            if aligned {
                break;
            }
            if !self.journal.undo(&mut self.model, &mut self.states) {
                return false;
            }
        }

        trace!("backtrack to depth {}", self.journal.depth().saturating_sub(1));
        self.journal.undo(&mut self.model, &mut self.states)
    }

    fn choose_variable(&self) -> Option<Variable> {
        self.variables
            .iter()
            .find(|variable| !self.model.is_assigned(variable))
            .copied()
    }

    fn is_complete(&self) -> bool {
        self.variables
            .iter()
            .all(|variable| self.model.is_assigned(variable))
    }

    // policy: variables no clause constrains any more are assigned false
    fn complete_model(&mut self) {
        for variable in &self.variables {
            if !self.model.is_assigned(variable) {
                self.model.set(*variable, false);
            }
        }
    }
}

/// Propagates a freshly assigned literal through the clause-state table:
/// clauses containing it are deactivated (satisfied), clauses containing
/// its negation lose a watch. Stops at the first clause left with no
/// watches; the journal already holds everything done, so undo stays exact.
fn propagate(
    formula: &Formula,
    occurrence: &OccurrenceIndex,
    model: &Model,
    states: &mut ClauseTable,
    frame: &mut Frame,
    literal: &Literal,
) -> PropagationResult {
    for &index in occurrence.occurrences_of(literal) {
        if states.is_active(index) {
            states.deactivate(index, frame);
        }
    }

    let negated = literal.negated();
    for &index in occurrence.occurrences_of(&negated) {
        if !states.is_active(index) {
            continue;
        }
        states.refresh_watches(index, formula.clause(index), &negated, model, frame);
        if states.is_conflict(index) {
            return PropagationResult::Conflict;
        }
    }

    PropagationResult::NoConflict
}

/// An unassigned variable occurring with only one polarity among active
/// clauses, scanned in sorted variable order. A variable with no active
/// occurrences at all is not pure; completion handles it at the end.
fn find_pure(
    variables: &[Variable],
    occurrence: &OccurrenceIndex,
    model: &Model,
    states: &ClauseTable,
) -> Option<Literal> {
    for variable in variables {
        if model.is_assigned(variable) {
            continue;
        }

        let positive = occurrence
            .positive(variable)
            .iter()
            .any(|&index| states.is_active(index));
        let negative = occurrence
            .negative(variable)
            .iter()
            .any(|&index| states.is_active(index));

        match (positive, negative) {
            (true, false) => return Some(Literal::Positive(*variable)),
            (false, true) => return Some(Literal::Negative(*variable)),
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brute_force::solve_brute_force;
    use crate::formula::{n, p, Clause};
    use quickcheck::QuickCheck;
    use test_env_log::test;

    fn assert_invariants(solver: &Solver) {
        // active clauses never watch a false literal; inactive clauses are
        // satisfied
        for index in 0..solver.states.len() {
            let state = solver.states.state(index);
            let clause = solver.formula.clause(index);
            if state.is_active() {
                let (first, second) = state.watched_positions();
                for position in [first, second].iter().flatten() {
                    let literal = clause.literal_at(*position);
                    assert_ne!(literal.eval(&solver.model), Some(false));
                }
            } else {
                assert_eq!(clause.eval(&solver.model), Some(true));
            }
        }

        // the live frames account for exactly the assigned variables
        let mut journaled: Vec<Variable> = solver
            .journal
            .frames()
            .iter()
            .flat_map(|frame| {
                std::iter::once(*frame.principal().variable())
                    .chain(frame.forced().iter().map(|literal| *literal.variable()))
            })
            .collect();
        journaled.sort();
        let assigned: Vec<Variable> = solver.model.iter().map(|(v, _)| *v).collect();
        assert_eq!(journaled, assigned);
    }

    #[test]
    fn solve_unit_propagation_sat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let f = Formula::new(vec![c1, c2]);

        match Solver::new(f.clone()).solve() {
            SatResult::Satisfiable(model) => assert_eq!(f.eval(&model), Some(true)),
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn solve_unit_propagation_unsat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let c3 = Clause::new(vec![n(2)]);
        let f = Formula::new(vec![c1, c2, c3]);

        assert_eq!(Solver::new(f).solve(), SatResult::Unsatisfiable);
    }

    #[test]
    fn solve_contradictory_units_unsat() {
        let f = Formula::new(vec![Clause::new(vec![p(1)]), Clause::new(vec![n(1)])]);
        assert_eq!(Solver::new(f).solve(), SatResult::Unsatisfiable);
    }

    #[test]
    fn solve_conflict_then_sat() {
        let c1 = Clause::new(vec![p(1), p(2), p(3)]);
        let c2 = Clause::new(vec![n(1), n(2), p(3)]);
        let c3 = Clause::new(vec![n(2), n(3)]);
        let f = Formula::new(vec![c1, c2, c3]);

        match Solver::new(f.clone()).solve() {
            SatResult::Satisfiable(model) => assert_eq!(f.eval(&model), Some(true)),
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn solve_all_polarity_combinations_unsat() {
        let f = Formula::new(vec![
            Clause::new(vec![p(1), p(2)]),
            Clause::new(vec![p(1), n(2)]),
            Clause::new(vec![n(1), p(2)]),
            Clause::new(vec![n(1), n(2)]),
        ]);
        assert_eq!(Solver::new(f).solve(), SatResult::Unsatisfiable);
    }

    #[test]
    fn solve_forced_chain_has_deterministic_model() {
        // 1 is decided true, conflicts, flips; then units force the rest
        let f = Formula::new(vec![
            Clause::new(vec![p(1), p(2), p(3)]),
            Clause::new(vec![n(1)]),
            Clause::new(vec![n(2)]),
        ]);

        match Solver::new(f).solve() {
            SatResult::Satisfiable(model) => {
                assert_eq!(model.value(&Variable(1)), Some(false));
                assert_eq!(model.value(&Variable(2)), Some(false));
                assert_eq!(model.value(&Variable(3)), Some(true));
            }
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn solve_tautology_sat() {
        let f = Formula::new(vec![Clause::new(vec![p(1), n(1)])]);
        assert!(Solver::new(f).solve().is_satisfiable());
    }

    #[test]
    fn solve_empty_formula_sat_with_empty_model() {
        let f = Formula::new(vec![]);
        match Solver::new(f).solve() {
            SatResult::Satisfiable(model) => assert!(model.is_empty()),
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn solve_empty_clause_unsat() {
        let f = Formula::new(vec![Clause::new(vec![p(1)]), Clause::new(vec![])]);
        assert_eq!(Solver::new(f).solve(), SatResult::Unsatisfiable);
    }

    #[test]
    fn pure_literal_elimination_closes_the_search() {
        // after deciding 1, variable 2 only occurs negatively among active
        // clauses; eliminating it deactivates everything without branching
        let f = Formula::new(vec![
            Clause::new(vec![p(1), p(2)]),
            Clause::new(vec![n(2), p(3)]),
        ]);

        match Solver::new(f.clone()).solve() {
            SatResult::Satisfiable(model) => {
                assert_eq!(model.value(&Variable(1)), Some(true));
                assert_eq!(model.value(&Variable(2)), Some(false));
                assert_eq!(model.value(&Variable(3)), Some(false));
                assert_eq!(f.eval(&model), Some(true));
            }
            SatResult::Unsatisfiable => panic!("expected sat"),
        }
    }

    #[test]
    fn decide_then_undo_restores_post_init_state() {
        let f = Formula::new(vec![
            Clause::new(vec![p(1), p(2), p(3)]),
            Clause::new(vec![n(1), p(2)]),
            Clause::new(vec![n(2), n(3)]),
        ]);
        let mut solver = Solver::new(f);
        let states_before = solver.states.clone();

        let literal = solver.pending.pop().expect("pending seeded at init");
        assert_eq!(solver.decide(literal), PropagationResult::NoConflict);
        assert!(!solver.model.is_empty());

        while solver.journal.undo(&mut solver.model, &mut solver.states) {}

        assert!(solver.model.is_empty());
        assert_eq!(solver.states, states_before);
    }

    #[test]
    fn invariants_hold_through_search() {
        let f = Formula::new(vec![
            Clause::new(vec![p(1), p(2)]),
            Clause::new(vec![p(1), n(2)]),
            Clause::new(vec![n(1), p(2)]),
            Clause::new(vec![n(1), n(2)]),
            Clause::new(vec![p(3), p(4)]),
        ]);
        let mut solver = Solver::new(f);
        let mut exhausted = false;
        let mut steps = 0;

        while let Some(literal) = solver.pending.pop() {
            steps += 1;
            assert!(steps < 100, "search did not terminate");

            if solver.decide(literal) == PropagationResult::Conflict {
                // a conflicted frame is transient garbage; only check once
                // backtracking has unwound it
                if !solver.backtrack() {
                    exhausted = true;
                    break;
                }
                assert_invariants(&solver);
                continue;
            }
            assert_invariants(&solver);

            if solver.states.all_inactive() {
                break;
            }
            match solver.choose_variable() {
                Some(variable) => {
                    solver.pending.push(Literal::Negative(variable));
                    solver.pending.push(Literal::Positive(variable));
                }
                None => break,
            }
        }

        assert!(exhausted, "formula is unsatisfiable");
    }

    #[test]
    fn quickcheck_formulas() {
        fn solver_matches_brute_force(f: Formula) -> bool {
            let brute_force = solve_brute_force(&f);
            let solver = Solver::new(f.clone()).solve();
            log::trace!("result = {:?}", solver);
            match (solver, brute_force) {
                (SatResult::Satisfiable(model), SatResult::Satisfiable(_)) => {
                    // sound and total
                    f.eval(&model) == Some(true)
                        && f.variables().iter().all(|v| model.is_assigned(v))
                }
                (SatResult::Unsatisfiable, SatResult::Unsatisfiable) => true,
                _ => false,
            }
        }

        QuickCheck::new()
            .tests(1000)
            .quickcheck(solver_matches_brute_force as fn(Formula) -> bool);
    }

    #[test]
    fn quickcheck_determinism() {
        fn same_answer_same_model(f: Formula) -> bool {
            let first = Solver::new(f.clone()).solve();
            let second = Solver::new(f).solve();
            first == second
        }

        QuickCheck::new()
            .tests(200)
            .quickcheck(same_answer_same_model as fn(Formula) -> bool);
    }
}
