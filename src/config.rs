use serde::{Deserialize, Serialize};

/// Ordered map implementation used for every column index of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// `std::collections::BTreeMap`.
    #[default]
    BTree,
    /// Height-balanced binary search tree.
    Avl,
}

/// Engine settings. Every field has a default, so a partial document is
/// enough when loading from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Backend for the per-column indexes of newly created tables.
    pub index_backend: IndexBackend,
    /// Maximum number of mutations kept for undo. When the log is full the
    /// oldest entry is evicted. `0` disables undo.
    pub undo_depth: usize,
    /// Number of commands `HISTORY` remembers. `0` disables the history.
    pub history_depth: usize,
}

impl EngineConfig {
    pub const DEFAULT_UNDO_DEPTH: usize = 1024;
    pub const DEFAULT_HISTORY_DEPTH: usize = 25;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_backend: IndexBackend::default(),
            undo_depth: Self::DEFAULT_UNDO_DEPTH,
            history_depth: Self::DEFAULT_HISTORY_DEPTH,
        }
    }
}
