//! Translation history
//!
//! Completed batches are stored newest first as one JSON array under
//! [`HISTORY_KEY`]. Listing is best-effort: read failures look like an empty
//! history and unreadable entries are hidden. Appending never writes over data
//! it could not read, and entries it cannot parse are carried forward as-is.

use std::sync::Arc;

use serde_json::Value;

use crate::core::storage::{KeyValueStore, HISTORY_KEY};
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{ParentNodeSnapshot, TranslationItem, TranslationRecord};

/// Maximum number of batch records retained
pub const MAX_RECORDS: usize = 1000;

pub struct HistoryStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Prepend a record and evict from the tail past capacity
    ///
    /// When the stored history cannot be read the record is dropped and the
    /// store is left untouched.
    pub fn append(&self, record: TranslationRecord) {
        let mut entries = match self.load_raw() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("[History] Failed to read translation history, record not saved: {}", e);
                return;
            }
        };

        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("[History] Failed to serialize record {}: {}", record.id, e);
                return;
            }
        };
        entries.insert(0, value);
        entries.truncate(MAX_RECORDS);

        if let Err(e) = self.store.set(HISTORY_KEY, &Value::Array(entries)) {
            tracing::error!("[History] Failed to save translation history: {}", e);
            return;
        }
        tracing::debug!("[History] Stored record {}", record.id);
    }

    /// Build and store a record for one finished batch
    pub fn add_batch(&self, parent_node: ParentNodeSnapshot, translations: Vec<TranslationItem>) -> TranslationRecord {
        let record = TranslationRecord::new(parent_node, translations);
        self.append(record.clone());
        record
    }

    /// Stored entries as raw JSON, newest first
    fn load_raw(&self) -> AppResult<Vec<Value>> {
        match self.store.get(HISTORY_KEY)? {
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(AppError::Storage("Stored history is not a list".to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// Stored records, newest first. Missing or corrupt data reads as empty.
    pub fn list(&self) -> Vec<TranslationRecord> {
        let entries = match self.load_raw() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("[History] Failed to read translation history: {}", e);
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<TranslationRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("[History] Skipping unreadable record: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Case-insensitive substring search over item texts and the parent name
    pub fn search(&self, query: &str) -> Vec<TranslationRecord> {
        let needle = query.to_lowercase();
        self.list()
            .into_iter()
            .filter(|record| record_matches(record, &needle))
            .collect()
    }

    pub fn clear(&self) -> AppResult<()> {
        self.store.set(HISTORY_KEY, &Value::Array(Vec::new())).map_err(|e| {
            tracing::error!("[History] Failed to clear translation history: {}", e);
            AppError::Storage("Failed to clear history".to_string())
        })
    }
}

fn record_matches(record: &TranslationRecord, needle: &str) -> bool {
    record.parent_node.name.to_lowercase().contains(needle)
        || record.translations.iter().any(|item| {
            item.source_text.to_lowercase().contains(needle)
                || item.translated_text.to_lowercase().contains(needle)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::core::storage::MemoryStore;
    use crate::shared::types::TEXT_NODE_TYPE;
    use serde_json::json;

    /// Memory store whose next read fails once when armed
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> AppResult<Option<Value>> {
            if self.fail_next_get.swap(false, Ordering::SeqCst) {
                return Err(AppError::Storage("disk unavailable".to_string()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &Value) -> AppResult<()> {
            self.inner.set(key, value)
        }
    }

    fn parent(name: &str) -> ParentNodeSnapshot {
        ParentNodeSnapshot {
            id: "1:1".to_string(),
            name: name.to_string(),
            node_type: "FRAME".to_string(),
        }
    }

    fn item(source: &str, translated: &str) -> TranslationItem {
        TranslationItem {
            source_text: source.to_string(),
            translated_text: translated.to_string(),
            element_id: "1:2".to_string(),
            element_type: TEXT_NODE_TYPE.to_string(),
            target_language: Some("en".to_string()),
            position: None,
            style: None,
            size: None,
        }
    }

    #[test]
    fn test_capacity_keeps_newest_first() {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        for i in 0..=MAX_RECORDS {
            history.append(TranslationRecord {
                id: format!("r{}", i),
                timestamp: i as i64,
                parent_node: parent("Card"),
                translations: vec![item("a", "b")],
            });
        }

        let records = history.list();
        assert_eq!(records.len(), MAX_RECORDS);
        assert_eq!(records[0].id, format!("r{}", MAX_RECORDS));
        assert!(records.iter().all(|r| r.id != "r0"));
    }

    #[test]
    fn test_search_is_case_insensitive_over_items_and_parent() {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        history.add_batch(parent("Login Dialog"), vec![item("确认", "Confirm")]);
        history.add_batch(parent("Card"), vec![item("取消", "Cancel")]);

        assert_eq!(history.search("confirm").len(), 1);
        assert_eq!(history.search("确认").len(), 1);
        assert_eq!(history.search("login").len(), 1);
        assert_eq!(history.search("c").len(), 2);
        assert!(history.search("missing").is_empty());
    }

    #[test]
    fn test_corrupt_history_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, &json!({ "not": "a list" })).unwrap();
        let history = HistoryStore::new(store.clone());
        assert!(history.list().is_empty());

        store
            .set(HISTORY_KEY, &json!([{ "garbage": true }, serde_json::to_value(TranslationRecord::new(parent("Card"), vec![])).unwrap()]))
            .unwrap();
        assert_eq!(history.list().len(), 1);
    }

    #[test]
    fn test_clear() {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let record = history.add_batch(parent("Card"), vec![item("你好", "Hello")]);

        assert_eq!(history.list(), vec![record]);
        history.clear().unwrap();
        assert!(history.list().is_empty());
    }

    #[test]
    fn test_failed_read_does_not_overwrite_history() {
        let store = Arc::new(FlakyStore::default());
        let history = HistoryStore::new(store.clone());
        for i in 0..5 {
            history.add_batch(parent(&format!("Card {}", i)), vec![item("a", "b")]);
        }

        store.fail_next_get.store(true, Ordering::SeqCst);
        history.add_batch(parent("Lost"), vec![item("c", "d")]);
        assert_eq!(history.list().len(), 5);

        history.add_batch(parent("Kept"), vec![item("e", "f")]);
        let records = history.list();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].parent_node.name, "Kept");
    }

    #[test]
    fn test_append_carries_unreadable_entries_forward() {
        let store = Arc::new(MemoryStore::new());
        let future = json!({
            "id": "old",
            "timestamp": 1,
            "parentNode": { "id": "1:1", "name": "Card", "type": "FRAME" },
            "translations": [{
                "sourceText": "你好",
                "translatedText": "Hello",
                "elementId": "1:2",
                "elementType": "TEXT",
                "style": { "effects": [{ "type": "SHADER", "radius": 1.0 }] }
            }]
        });
        store.set(HISTORY_KEY, &json!([future.clone()])).unwrap();

        let history = HistoryStore::new(store.clone());
        assert!(history.list().is_empty());

        history.add_batch(parent("Card"), vec![item("a", "b")]);
        let stored = store.get(HISTORY_KEY).unwrap().unwrap();
        let entries = stored.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], future);
        assert_eq!(history.list().len(), 1);
    }

    #[test]
    fn test_append_leaves_non_list_history_alone() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, &json!({ "not": "a list" })).unwrap();

        HistoryStore::new(store.clone()).add_batch(parent("Card"), vec![]);
        assert_eq!(store.get(HISTORY_KEY).unwrap(), Some(json!({ "not": "a list" })));
    }
}
