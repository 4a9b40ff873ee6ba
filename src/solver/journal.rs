use super::state::{ClauseState, ClauseTable};
use crate::formula::{Literal, Model};

/// The state change a single decision and its propagation create: the
/// principal (nondeterministic) literal, the literals forced under it, and
/// a snapshot of every clause state the frame mutated. The unit of
/// backtracking.
#[derive(Debug)]
pub(crate) struct Frame {
    principal: Literal,
    forced: Vec<Literal>,
    priors: Vec<(usize, ClauseState)>,
}

impl Frame {
    pub(crate) fn new(principal: Literal) -> Self {
        Self {
            principal,
            forced: vec![],
            priors: vec![],
        }
    }

    pub(crate) fn principal(&self) -> &Literal {
        &self.principal
    }

    pub(crate) fn forced(&self) -> &[Literal] {
        &self.forced
    }

    pub(crate) fn priors(&self) -> &[(usize, ClauseState)] {
        &self.priors
    }

    /// Snapshots a clause state about to be mutated. A no-op if this frame
    /// already holds a snapshot for the clause: a frame may touch a clause
    /// during unit propagation and again during pure-literal elimination,
    /// and only the state before the first mutation is the correct restore
    /// target.
    pub(crate) fn store_prior(&mut self, index: usize, prior: ClauseState) {
        if !self.priors.iter().any(|(i, _)| *i == index) {
            self.priors.push((index, prior));
        }
    }

    pub(crate) fn record_forced(&mut self, literal: Literal) {
        self.forced.push(literal);
    }
}

/// A stack of decision frames. Popping a frame undoes its decision
/// atomically: the model and the clause-state table come back bit-identical
/// to their state immediately before the frame was opened.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    frames: Vec<Frame>,
}

impl Journal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open(&mut self, principal: Literal) -> &mut Frame {
        let index = self.frames.len();
        self.frames.push(Frame::new(principal));
        &mut self.frames[index]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn top_principal(&self) -> Option<&Literal> {
        self.frames.last().map(Frame::principal)
    }

    pub(crate) fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Pops the top frame and reverses it: erases its principal and forced
    /// assignments from the model and restores every journaled clause
    /// state. Returns false when there is nothing left to undo.
    pub(crate) fn undo(&mut self, model: &mut Model, table: &mut ClauseTable) -> bool {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return false,
        };

        model.unassign(frame.principal.variable());
        for literal in &frame.forced {
            model.unassign(literal.variable());
        }

        table.restore(&frame.priors);
        true
    }
}
