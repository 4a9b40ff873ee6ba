use super::journal::Frame;
use crate::formula::{Clause, Formula, Literal, Model};

/// Per-clause mutable search state: up to two watched positions (indices
/// into the clause, so the state is freely copyable for journaling) and an
/// active flag cleared once the clause is satisfied under the current
/// model.
///
/// Invariants, maintained by the search: an active clause never watches a
/// literal false under the model; an inactive clause has at least one true
/// literal; an empty watched position means no unassigned literal of the
/// required polarity was available at the last update.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct ClauseState {
    watched: (Option<usize>, Option<usize>),
    active: bool,
}

impl ClauseState {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Active with both watched positions exhausted: every literal is
    /// false under the model.
    pub(crate) fn is_conflict(&self) -> bool {
        self.active && self.watched.0.is_none() && self.watched.1.is_none()
    }

    /// Active with exactly one watched position left: that literal is
    /// forced.
    pub(crate) fn is_unit(&self) -> bool {
        self.active && (self.watched.0.is_some() ^ self.watched.1.is_some())
    }

    /// The remaining watched position of a unit clause.
    pub(crate) fn unit_position(&self) -> Option<usize> {
        if self.is_unit() {
            self.watched.0.or(self.watched.1)
        } else {
            None
        }
    }

    pub(crate) fn watched_positions(&self) -> (Option<usize>, Option<usize>) {
        self.watched
    }
}

/// The table of clause states, indexed 1:1 with the formula's clauses.
/// Every mutation goes through a decision frame first, so backtracking can
/// restore the exact prior state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct ClauseTable {
    states: Vec<ClauseState>,
}

impl ClauseTable {
    /// Builds the initial table, watching the first two value-distinct
    /// unassigned literals of each clause. Either position may be empty
    /// for clauses shorter than two distinct literals.
    pub(crate) fn build(formula: &Formula, model: &Model) -> Self {
        let states = formula
            .clauses()
            .map(|clause| {
                let first = clause.first_unassigned_position(model, None);
                let second = match first {
                    Some(position) => clause
                        .first_unassigned_position(model, Some(clause.literal_at(position))),
                    None => None,
                };
                ClauseState {
                    watched: (first, second),
                    active: true,
                }
            })
            .collect();
        Self { states }
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn state(&self, index: usize) -> &ClauseState {
        &self.states[index]
    }

    pub(crate) fn is_active(&self, index: usize) -> bool {
        self.states[index].active
    }

    pub(crate) fn is_conflict(&self, index: usize) -> bool {
        self.states[index].is_conflict()
    }

    pub(crate) fn all_inactive(&self) -> bool {
        self.states.iter().all(|state| !state.active)
    }

    /// First active unit clause in index order, as (clause index, watched
    /// position). The index-order scan pins the unit-discovery order.
    pub(crate) fn find_unit(&self) -> Option<(usize, usize)> {
        self.states
            .iter()
            .enumerate()
            .find_map(|(index, state)| state.unit_position().map(|position| (index, position)))
    }

    /// Marks the clause satisfied, journaling its prior state first.
    pub(crate) fn deactivate(&mut self, index: usize, frame: &mut Frame) {
        frame.store_prior(index, self.states[index]);
        self.states[index].active = false;
    }

    /// Re-points the watched position holding the falsified literal at the
    /// first unassigned literal value-distinct from the other watch (or
    /// leaves it empty if none remains), journaling the prior state first.
    /// The two watches always hold distinct values, so at most one matches.
    pub(crate) fn refresh_watches(
        &mut self,
        index: usize,
        clause: &Clause,
        falsified: &Literal,
        model: &Model,
        frame: &mut Frame,
    ) {
        frame.store_prior(index, self.states[index]);

        let (first, second) = self.states[index].watched;

        if let Some(position) = first {
            if clause.literal_at(position) == falsified {
                let other = second.map(|q| clause.literal_at(q));
                self.states[index].watched.0 = clause.first_unassigned_position(model, other);
                return;
            }
        }
        if let Some(position) = second {
            if clause.literal_at(position) == falsified {
                let other = first.map(|q| clause.literal_at(q));
                self.states[index].watched.1 = clause.first_unassigned_position(model, other);
            }
        }
    }

    /// Overwrites states from journaled snapshots; only the undo path
    /// calls this.
    pub(crate) fn restore(&mut self, priors: &[(usize, ClauseState)]) {
        for &(index, prior) in priors {
            self.states[index] = prior;
        }
    }
}
