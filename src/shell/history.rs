//! Input history for the interactive shell.
//!
//! Session-only: entries are kept in memory and dropped on exit.

/// Bounded input history with Up/Down navigation.
#[derive(Debug)]
pub struct InputHistory {
    /// Stored entries, oldest first.
    entries: Vec<String>,
    capacity: usize,
    /// Current position while navigating; `None` is the line being typed.
    position: Option<usize>,
    /// The line being typed, saved while browsing older entries.
    draft: String,
}

impl InputHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            position: None,
            draft: String::new(),
        }
    }

    /// Adds an entry. Empty lines and consecutive duplicates are skipped.
    pub fn push(&mut self, entry: &str) {
        let entry = entry.trim();
        self.reset_position();

        if entry.is_empty() || self.capacity == 0 {
            return;
        }
        if self.entries.last().map(String::as_str) == Some(entry) {
            return;
        }

        self.entries.push(entry.to_string());
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
    }

    /// Moves to the next older entry. Returns `None` at the oldest one.
    pub fn previous(&mut self, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        match self.position {
            None => {
                self.draft = current_input.to_string();
                self.position = Some(self.entries.len() - 1);
            }
            Some(pos) if pos > 0 => self.position = Some(pos - 1),
            Some(_) => return None,
        }

        self.position.map(|pos| self.entries[pos].as_str())
    }

    /// Moves to the next newer entry, ending at the saved draft.
    /// Returns `None` when already at the draft.
    pub fn next(&mut self) -> Option<&str> {
        match self.position {
            None => None,
            Some(pos) if pos + 1 < self.entries.len() => {
                self.position = Some(pos + 1);
                Some(self.entries[pos + 1].as_str())
            }
            Some(_) => {
                self.position = None;
                Some(self.draft.as_str())
            }
        }
    }

    pub fn reset_position(&mut self) {
        self.position = None;
        self.draft.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_empty_and_consecutive_duplicates() {
        let mut history = InputHistory::new(10);
        history.push("");
        history.push("   ");
        history.push("show vlan");
        history.push("show vlan ");
        history.push("pwc");
        history.push("show vlan");
        assert_eq!(history.entries(), ["show vlan", "pwc", "show vlan"]);
    }

    #[test]
    fn test_navigation_returns_to_draft() {
        let mut history = InputHistory::new(10);
        history.push("configure terminal");
        history.push("vlan 10");

        assert_eq!(history.previous("sh"), Some("vlan 10"));
        assert_eq!(history.previous("sh"), Some("configure terminal"));
        assert_eq!(history.previous("sh"), None);

        assert_eq!(history.next(), Some("vlan 10"));
        assert_eq!(history.next(), Some("sh"));
        assert_eq!(history.next(), None);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = InputHistory::new(3);
        for i in 0..5 {
            history.push(&format!("vlan {i}"));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.entries()[0], "vlan 2");
        assert_eq!(history.previous(""), Some("vlan 4"));
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = InputHistory::new(0);
        history.push("quit");
        assert!(history.is_empty());
        assert_eq!(history.previous(""), None);
    }
}
