/// Memories: collectible narrative records and the log of collected ones.
///
/// The log keeps two views that must agree:
///   - `ids`    : which memories are held (existence, uniqueness)
///   - `records`: full records in acquisition order (display)
///
/// An id is in `ids` iff exactly one record with that id is in `records`.
/// All mutation goes through `collect()` / `restore()`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl Memory {
    pub fn new(id: &str, title: &str, text: &str) -> Self {
        Memory { id: id.to_string(), title: title.to_string(), text: text.to_string() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryLog {
    ids: HashSet<String>,
    records: Vec<Memory>,
}

impl MemoryLog {
    pub fn new() -> Self {
        MemoryLog::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in acquisition order.
    pub fn records(&self) -> &[Memory] {
        &self.records
    }

    /// Ids in acquisition order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|m| m.id.as_str())
    }

    /// Add a memory. Returns false (and changes nothing) if already held.
    pub fn collect(&mut self, memory: &Memory) -> bool {
        if !self.ids.insert(memory.id.clone()) {
            return false;
        }
        self.records.push(memory.clone());
        true
    }

    /// Rebuild from saved parts.
    ///
    /// Records come first, deduplicated by id in saved order. Ids without a
    /// record are resolved through `lookup` (the world's catalog) and appended,
    /// or dropped if unknown.
    pub fn restore<F>(ids: &[String], records: &[Memory], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Memory>,
    {
        let mut log = MemoryLog::new();
        for record in records {
            log.collect(record);
        }
        for id in ids {
            if log.contains(id) {
                continue;
            }
            if let Some(memory) = lookup(id) {
                log.collect(&memory);
            }
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sticker() -> Memory {
        Memory::new("m_sticker", "sticker", "stay soft. stay sharp.")
    }

    fn assert_consistent(log: &MemoryLog) {
        assert_eq!(log.ids.len(), log.records.len());
        for r in &log.records {
            assert!(log.ids.contains(&r.id));
            assert_eq!(log.records.iter().filter(|x| x.id == r.id).count(), 1);
        }
    }

    #[test]
    fn collect_is_idempotent() {
        let mut log = MemoryLog::new();
        assert!(log.collect(&sticker()));
        assert!(!log.collect(&sticker()));
        assert_eq!(log.len(), 1);
        assert_consistent(&log);
    }

    #[test]
    fn order_is_acquisition_order() {
        let mut log = MemoryLog::new();
        log.collect(&Memory::new("b", "b", ""));
        log.collect(&Memory::new("a", "a", ""));
        let ids: Vec<&str> = log.ids().collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn restore_dedupes_and_resolves_missing_records() {
        let records = vec![sticker(), sticker(), Memory::new("m_call", "wire", "a disconnected line.")];
        let ids = vec![
            "m_call".to_string(),
            "m_open".to_string(),
            "m_ghost_of_nothing".to_string(),
        ];
        let log = MemoryLog::restore(&ids, &records, |id| {
            (id == "m_open").then(|| Memory::new("m_open", "open", "an OPEN sign for a ghost shop."))
        });
        let got: Vec<&str> = log.ids().collect();
        assert_eq!(got, vec!["m_sticker", "m_call", "m_open"]);
        assert_consistent(&log);
    }
}
