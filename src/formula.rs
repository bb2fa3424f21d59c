/*!
A module to represent conjunctive normal form formula.
*/

use std::{convert::TryInto, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: usize },
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = (std::u32::MAX >> 1) as usize;
}

impl Variable {
    /// Creates a variable from its 1-based DIMACS ID.
    pub fn new(id: usize) -> Option<Self> {
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(id.try_into().ok()?)?))
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        Variable::new(index.checked_add(1)?)
    }

    pub fn id(&self) -> usize {
        self.0.get() as usize
    }

    pub fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<usize>().context(ParseIntError)?;
        Variable::new(num).context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    /// Dense index of the literal, distinct from the index of its negation.
    pub fn code(&self) -> usize {
        (self.id.index() << 1) | self.positive as usize
    }

    /// Evaluates the literal under a variable value.
    pub fn eval(&self, value: bool) -> bool {
        value == self.positive
    }

    /// Signed DIMACS form of the literal.
    pub fn to_dimacs(&self) -> i64 {
        let id = self.id.id() as i64;
        if self.positive {
            id
        } else {
            -id
        }
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = if let Some(rest) = s.strip_prefix('-') {
            (false, rest.parse()?)
        } else {
            (true, s.parse()?)
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    /// Returns true if some literal is true under `assignment`.
    pub fn satisfied_by(&self, assignment: &[bool]) -> bool {
        self.iter()
            .any(|literal| literal.eval(assignment[literal.variable().index()]))
    }

    /// Drops repeated literals, keeping the first occurrence of each.
    fn dedup(&mut self) {
        let mut kept: Vec<Literal> = Vec::with_capacity(self.literals.len());
        for &literal in &self.literals {
            if !kept.contains(&literal) {
                kept.push(literal);
            }
        }
        self.literals = kept;
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula from signed DIMACS literals, panicking on out-of-range ones.
    #[cfg(test)]
    pub(crate) fn from_dimacs(num_variables: usize, clauses: &[&[i64]]) -> Self {
        let mut cnf = Cnf::new(num_variables);
        for clause in clauses {
            let literals = clause
                .iter()
                .map(|&lit| {
                    let variable = Variable::new(lit.unsigned_abs() as usize)
                        .filter(|v| v.id() <= num_variables)
                        .expect("literal out of range");
                    Literal::new(variable, lit > 0)
                })
                .collect();
            cnf.add_clause(Clause::new(literals));
        }
        cnf
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    /// Adds a clause, removing duplicated literals.
    ///
    /// # Panics
    ///
    /// Panics when the clause mentions a variable outside the formula.
    pub fn add_clause(&mut self, mut clause: Clause) {
        assert!(clause
            .iter()
            .all(|literal| literal.variable().id() <= self.num_variables));
        clause.dedup();
        self.clauses.push(clause);
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Represents a satisfying assignment for a formula.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    assignment: Vec<bool>,
}

impl Model {
    /// Creates a new model from a formula and an assignment.
    ///
    /// # Panics
    ///
    /// Panics when the assignment length does not match the variable count.
    pub fn new(formula: Cnf, assignment: Vec<bool>) -> Self {
        assert!(assignment.len() == formula.num_variables());

        Model {
            formula,
            assignment,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }

    /// Returns the first clause of the formula the assignment falsifies.
    pub fn falsified_clause(&self) -> Option<(usize, &Clause)> {
        self.formula
            .clauses()
            .iter()
            .enumerate()
            .find(|(_, clause)| !clause.satisfied_by(&self.assignment))
    }

    /// Renders the assignment as signed DIMACS literals, `1 -2 3`.
    pub fn dimacs(&self) -> DimacsAssignment<'_> {
        DimacsAssignment(&self.assignment)
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model for {}\nAssignment:", self.formula)?;
        for (variable, &val) in (1..).filter_map(Variable::new).zip(&self.assignment) {
            write!(f, "\n  {}: {}", variable, val)?;
        }

        Ok(())
    }
}

pub struct DimacsAssignment<'a>(&'a [bool]);

impl Display for DimacsAssignment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, &val) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            let id = idx + 1;
            if val {
                write!(f, "{}", id)?;
            } else {
                write!(f, "-{}", id)?;
            }
        }

        Ok(())
    }
}
