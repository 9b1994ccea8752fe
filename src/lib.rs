pub mod ast;
pub mod column;
pub mod config;
pub mod database;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod index;
pub mod parser;
pub mod row;
pub mod table;
pub mod tokenizer;
pub mod transaction;
pub mod value;

pub use ast::{Combinator, Operator, Predicate, Statement, WhereClause};
pub use column::Column;
pub use config::{EngineConfig, IndexBackend};
pub use database::{Database, ExecOutcome, QueryResult, UndoOutcome};
pub use error::{Error, Result};
pub use evaluator::PredicateEvaluator;
pub use history::QueryHistory;
pub use index::{ColumnIndex, KeySet, OrderedIndex};
pub use row::Row;
pub use table::{Schema, Table};
pub use transaction::{LogEntry, OperationKind, TransactionLog};
pub use value::Value;
