use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use super::reconciler::{reconcile_bytes, Reconciliation};

/// Memoizes reconciliation by upload content so repeated uploads of the same
/// bytes are only parsed once.
#[derive(Debug, Default)]
pub struct ReconcileCache {
    entries: HashMap<String, Reconciliation>,
}

impl ReconcileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&mut self, bytes: &[u8]) -> &Reconciliation {
        let key = content_key(bytes);
        if self.entries.contains_key(&key) {
            debug!("Reconcile cache hit for {}", &key[..12]);
        }
        self.entries.entry(key).or_insert_with(|| reconcile_bytes(bytes))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn content_key(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
