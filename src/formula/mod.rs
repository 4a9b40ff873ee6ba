pub mod dimacs;

#[cfg(test)]
use quickcheck::{Arbitrary, Gen};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Variable(pub usize);

impl Debug for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

impl Literal {
    pub fn variable(&self) -> &Variable {
        match self {
            Literal::Positive(v) => v,
            Literal::Negative(v) => v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn negated(&self) -> Self {
        match self {
            Literal::Positive(v) => Literal::Negative(*v),
            Literal::Negative(v) => Literal::Positive(*v),
        }
    }

    /// Evaluates the literal under a partial model; `None` when the
    /// variable is unassigned.
    pub fn eval(&self, model: &Model) -> Option<bool> {
        let value = model.value(self.variable())?;
        Some(if self.is_positive() { value } else { !value })
    }
}

impl Debug for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Positive(v) => write!(f, "{:?}", v),
            Literal::Negative(v) => write!(f, "!{:?}", v),
        }
    }
}

impl Display for Literal {
    // DIMACS sign convention
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Positive(v) => write!(f, "{}", v),
            Literal::Negative(v) => write!(f, "-{}", v),
        }
    }
}

#[derive(Clone)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(disjuncts: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: disjuncts.into_iter().collect(),
        }
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn literal_at(&self, position: usize) -> &Literal {
        &self.literals[position]
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Evaluates the clause under a partial model: `Some(true)` as soon as
    /// any literal is true, `Some(false)` only when every literal is
    /// defined-false, `None` otherwise. An empty clause is `Some(false)`.
    pub fn eval(&self, model: &Model) -> Option<bool> {
        let mut all_false = true;
        for literal in &self.literals {
            match literal.eval(model) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => all_false = false,
            }
        }
        if all_false {
            Some(false)
        } else {
            None
        }
    }

    /// Position of the first unassigned literal, skipping literals equal in
    /// value to `banned`. Duplicate literals collapse under the value
    /// comparison, so the two watched positions of a clause always carry
    /// distinct literals.
    pub(crate) fn first_unassigned_position(
        &self,
        model: &Model,
        banned: Option<&Literal>,
    ) -> Option<usize> {
        self.literals.iter().position(|literal| {
            !model.is_assigned(literal.variable()) && banned.map_or(true, |b| literal != b)
        })
    }
}

impl Debug for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first_literal = true;
        write!(f, "(")?;
        for l in &self.literals {
            if !first_literal {
                write!(f, " | ")?;
            }
            first_literal = false;
            write!(f, "{:?}", l)?;
        }
        write!(f, ")")
    }
}

#[derive(Clone)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl Formula {
    pub fn new(conjuncts: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: conjuncts.into_iter().collect(),
        }
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub(crate) fn clause(&self, index: usize) -> &Clause {
        &self.clauses[index]
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The variables appearing in the formula, sorted and deduplicated.
    /// Iteration order of this list is what makes the solver deterministic.
    pub fn variables(&self) -> Vec<Variable> {
        let mut variables: Vec<Variable> = self
            .clauses
            .iter()
            .flat_map(|clause| clause.literals().map(|literal| *literal.variable()))
            .collect();
        variables.sort();
        variables.dedup();
        variables
    }

    /// Evaluates the formula under a partial model: `Some(true)` when every
    /// clause is satisfied, `Some(false)` as soon as any clause is
    /// falsified, `None` otherwise.
    pub fn eval(&self, model: &Model) -> Option<bool> {
        let mut all_true = true;
        for clause in &self.clauses {
            match clause.eval(model) {
                Some(true) => {}
                Some(false) => return Some(false),
                None => all_true = false,
            }
        }
        if all_true {
            Some(true)
        } else {
            None
        }
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        let mut first_clause = true;
        for clause in &self.clauses {
            if !first_clause {
                write!(f, " & ")?;
            }
            first_clause = false;
            write!(f, "{:?}", clause)?;
        }
        Ok(())
    }
}

/// A partial assignment from variables to booleans. Entries exist exactly
/// for the variables assigned so far; iteration is sorted by variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    assignments: BTreeMap<Variable, bool>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, variable: &Variable) -> Option<bool> {
        self.assignments.get(variable).copied()
    }

    pub fn is_assigned(&self, variable: &Variable) -> bool {
        self.assignments.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &bool)> {
        self.assignments.iter()
    }

    pub(crate) fn set(&mut self, variable: Variable, value: bool) {
        self.assignments.insert(variable, value);
    }

    /// Extends the model so that `literal` evaluates true.
    pub(crate) fn assign(&mut self, literal: &Literal) {
        self.set(*literal.variable(), literal.is_positive());
    }

    pub(crate) fn unassign(&mut self, variable: &Variable) {
        self.assignments.remove(variable);
    }
}

impl Display for Model {
    // DIMACS sign convention, sorted by variable number ascending
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first_entry = true;
        for (variable, value) in &self.assignments {
            if !first_entry {
                write!(f, " ")?;
            }
            first_entry = false;
            if !value {
                write!(f, "-")?;
            }
            write!(f, "{}", variable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

#[cfg(test)]
impl Arbitrary for Formula {
    fn arbitrary<G: Gen>(g: &mut G) -> Self {
        const MAX_VARS: u32 = 15;
        const MAX_CLAUSE_FACTOR: u32 = 9;

        let num_vars = g.next_u32() % MAX_VARS + 1;
        let clause_factor = g.next_u32() % MAX_CLAUSE_FACTOR + 1;
        let num_clauses = num_vars * clause_factor;

        Formula::new((0..num_clauses).map(|_| {
            let clause_size = 3;
            Clause::new((0..clause_size).map(|_| {
                let var = Variable((g.next_u32() % num_vars) as usize + 1);
                if g.next_u32() % 2 == 0 {
                    Literal::Positive(var)
                } else {
                    Literal::Negative(var)
                }
            }))
        }))
    }
}
