use std::collections::VecDeque;

use tracing::trace;

/// Bounded list of the commands run through [crate::Database::execute],
/// oldest first. Entries are addressed from `1`, the way `HISTORY` prints them.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl QueryHistory {
    /// A history keeping at most `capacity` commands; `0` keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Appends a command, dropping the oldest one when the history is full.
    pub fn record(&mut self, command: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity
            && let Some(dropped) = self.entries.pop_front()
        {
            trace!(command = %dropped, "history full, oldest command dropped");
        }
        self.entries.push_back(command.into());
    }

    /// The command at 1-based `position`.
    pub fn get(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_start_at_one() {
        let mut history = QueryHistory::new(4);
        history.record("SELECT * FROM a");
        history.record("SELECT * FROM b");

        assert_eq!(history.get(0), None);
        assert_eq!(history.get(1), Some("SELECT * FROM a"));
        assert_eq!(history.get(2), Some("SELECT * FROM b"));
        assert_eq!(history.get(3), None);
    }

    #[test]
    fn test_full_history_drops_oldest() {
        let mut history = QueryHistory::new(2);
        for command in ["UNDO", "DROP TABLE a", "DROP TABLE b"] {
            history.record(command);
        }

        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["DROP TABLE a", "DROP TABLE b"]);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut history = QueryHistory::new(3);
        history.record("UNDO");
        history.clear();
        assert!(history.is_empty());

        let mut disabled = QueryHistory::new(0);
        disabled.record("UNDO");
        assert_eq!(disabled.len(), 0);
    }
}
