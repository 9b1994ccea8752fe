use tracing::trace;

use crate::ast::{Combinator, Operator, Predicate, PredicateChain};
use crate::error::Result;
use crate::index::{KeySet, OrderedIndex};
use crate::table::Table;

/// Answers WHERE clauses from the column indexes of one table.
///
/// Results are sets of primary keys; turning them into rows is left to the
/// table.
pub struct PredicateEvaluator<'t> {
    table: &'t Table,
}

impl<'t> PredicateEvaluator<'t> {
    pub fn new(table: &'t Table) -> Self {
        Self { table }
    }

    /// Primary keys of the rows satisfying a single predicate.
    ///
    /// # Errors
    /// Returns [crate::Error::ColumnNotFound] if the predicate names a column
    /// the table does not have.
    pub fn evaluate_one(&self, predicate: &Predicate) -> Result<KeySet> {
        let index = self.table.index(&predicate.column)?;
        let keys = match predicate.op {
            Operator::Eq => index.exact(&predicate.value),
            op => index.range(op, &predicate.value),
        };
        trace!(
            table = self.table.name(),
            %predicate,
            matches = keys.len(),
            "evaluated predicate"
        );
        Ok(keys)
    }

    /// Folds a predicate chain strictly left to right: AND intersects the
    /// running result with the next predicate's keys, OR unites them. There is
    /// no precedence, so `a OR b AND c` is `(a OR b) AND c`.
    pub fn evaluate_chain(&self, chain: &PredicateChain) -> Result<KeySet> {
        let mut result = self.evaluate_one(&chain.first)?;
        for (combinator, predicate) in &chain.rest {
            let next = self.evaluate_one(predicate)?;
            match combinator {
                Combinator::And => result.retain(|key| next.contains(key)),
                Combinator::Or => result.extend(next),
            }
            trace!(%combinator, running = result.len(), "folded predicate");
        }
        Ok(result)
    }
}
