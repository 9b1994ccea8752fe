use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Comparison operator of a single-column predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=` (also accepted as `<>`)
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl Operator {
    /// Returns `true` if a cell that compares to the literal as `ordering`
    /// satisfies this operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::NotEq => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::LtEq => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::GtEq => ordering != Ordering::Less,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::LtEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::GtEq),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean combinator joining two predicates of a WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Intersection of the candidate sets.
    And,
    /// Union of the candidate sets.
    Or,
}

impl FromStr for Combinator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("and") {
            Ok(Self::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(Self::Or)
        } else {
            Err(Error::UnsupportedCombinator(s.to_string()))
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
        }
    }
}

/// A single-column comparison against a literal, e.g. `gpa > 3.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub op: Operator,
    pub value: String,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

/// A non-empty chain of predicates joined by combinators.
///
/// The chain is folded strictly left to right: `a AND b OR c` means
/// `(a AND b) OR c`, and `a OR b AND c` means `(a OR b) AND c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateChain {
    pub first: Predicate,
    pub rest: Vec<(Combinator, Predicate)>,
}

impl PredicateChain {
    /// Number of predicates in the chain.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }
}

/// The filter of a select, update or delete.
///
/// An empty clause matches every row of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    chain: Option<PredicateChain>,
}

impl WhereClause {
    /// A clause that matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// A clause made of a single predicate.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            chain: Some(PredicateChain {
                first: predicate,
                rest: Vec::new(),
            }),
        }
    }

    /// Appends `predicate` with an AND combinator.
    pub fn and(self, predicate: Predicate) -> Self {
        self.push(Combinator::And, predicate)
    }

    /// Appends `predicate` with an OR combinator.
    pub fn or(self, predicate: Predicate) -> Self {
        self.push(Combinator::Or, predicate)
    }

    /// Appends `predicate` with the given combinator. On an empty clause the
    /// combinator is dropped and `predicate` becomes the first one.
    pub fn push(mut self, combinator: Combinator, predicate: Predicate) -> Self {
        match &mut self.chain {
            Some(chain) => chain.rest.push((combinator, predicate)),
            None => return Self::new(predicate),
        }
        self
    }

    /// Builds a clause from the parallel lists handed over by a command
    /// parser: `combinators[i]` joins `predicates[i]` and `predicates[i + 1]`.
    ///
    /// # Errors
    /// Returns [Error::CombinatorMismatch] unless there is exactly one
    /// combinator less than there are predicates (or both lists are empty).
    pub fn from_parts(predicates: Vec<Predicate>, combinators: Vec<Combinator>) -> Result<Self> {
        let expected = predicates.len().saturating_sub(1);
        if combinators.len() != expected {
            return Err(Error::CombinatorMismatch {
                predicates: predicates.len(),
                combinators: combinators.len(),
            });
        }

        let mut predicates = predicates.into_iter();
        let Some(first) = predicates.next() else {
            return Ok(Self::all());
        };
        Ok(Self {
            chain: Some(PredicateChain {
                first,
                rest: combinators.into_iter().zip(predicates).collect(),
            }),
        })
    }

    /// Returns `true` if the clause matches every row.
    pub fn is_empty(&self) -> bool {
        self.chain.is_none()
    }

    pub fn chain(&self) -> Option<&PredicateChain> {
        self.chain.as_ref()
    }
}

impl From<Predicate> for WhereClause {
    fn from(predicate: Predicate) -> Self {
        Self::new(predicate)
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(chain) = &self.chain else {
            return f.write_str("<all rows>");
        };
        write!(f, "{}", chain.first)?;
        for (combinator, predicate) in &chain.rest {
            write!(f, " {combinator} {predicate}")?;
        }
        Ok(())
    }
}

/// A parsed command, see [crate::parser::Parser].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable(CreateTable),
    DropTable(DropTable),
    InsertInto(InsertInto),
    Select(Select),
    Update(Update),
    Delete(Delete),
    Undo,
    /// `HISTORY`
    History,
    /// `EXECUTE n`, re-runs the n-th remembered command.
    Execute(usize),
    /// `CLEAR HISTORY`
    ClearHistory,
}

impl Statement {
    /// Commands that read or edit the history itself and are never recorded
    /// in it.
    pub fn is_history_command(&self) -> bool {
        matches!(self, Self::History | Self::Execute(_) | Self::ClearHistory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertInto {
    pub table: String,
    /// One cell per column, in table order.
    pub values: Vec<String>,
}

/// `SELECT * FROM table [WHERE ...]`; only the wildcard projection exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    pub filter: WhereClause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub table: String,
    pub column: String,
    pub value: String,
    pub filter: WhereClause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub table: String,
    pub filter: WhereClause,
}
