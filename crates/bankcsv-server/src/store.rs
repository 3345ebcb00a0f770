//! In-memory statement store
//!
//! Converted statements are kept only for the lifetime of the process.
//! When the store is full the oldest statement is evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bankcsv_core::models::StatementDialect;
use bankcsv_core::AnalysisReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// A converted statement and its analysis
#[derive(Debug, Clone, Serialize)]
pub struct StoredStatement {
    pub id: String,
    pub filename: Option<String>,
    pub bank: StatementDialect,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Ids from oldest to newest
    order: VecDeque<String>,
    statements: HashMap<String, Arc<StoredStatement>>,
}

/// Bounded statement store keyed by content id
#[derive(Debug)]
pub struct StatementStore {
    capacity: usize,
    inner: RwLock<StoreInner>,
}

impl StatementStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(StoreInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store a statement, replacing one with the same id
    ///
    /// Returns the ids evicted to make room.
    pub async fn insert(&self, statement: StoredStatement) -> Vec<String> {
        let mut inner = self.inner.write().await;
        let id = statement.id.clone();

        if inner.statements.contains_key(&id) {
            inner.order.retain(|existing| existing != &id);
        }
        inner.order.push_back(id.clone());
        inner.statements.insert(id, Arc::new(statement));

        let mut evicted = Vec::new();
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.statements.remove(&oldest);
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub async fn get(&self, id: &str) -> Option<Arc<StoredStatement>> {
        self.inner.read().await.statements.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.statements.len()
    }
}
