use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::domain::entities::PerformanceMetrics;

const HISTORY_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub metrics: PerformanceMetrics,
}

/// Bounded in-process record of recently served queries and their metrics.
pub struct QueryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, query: &str, metrics: PerformanceMetrics) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(HistoryEntry {
            query: query.to_string(),
            metrics,
        });
        if entries.len() > HISTORY_CAPACITY {
            let excess = entries.len() - HISTORY_CAPACITY;
            entries.drain(..excess);
        }
    }

    pub fn tail(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new()
    }
}
