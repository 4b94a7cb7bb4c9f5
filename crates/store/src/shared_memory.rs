//! Typed access to shared state under the fleet's key conventions.
//!
//! | key | kind |
//! |---|---|
//! | `agent:<name>:status` | string |
//! | `agent:<name>:last_run` | RFC 3339 timestamp |
//! | `project:<id>:active_risks` | sorted set, risk id by score |
//! | `project:<id>:pending_approvals` | set of approval ids |
//! | `project:<id>:quality_gaps` | sorted set, JSON gap by severity score |
//! | `project:<id>:acceleration` | JSON object |
//! | `dedup:<hash>` | string with TTL |

use chrono::{DateTime, Utc};
use foreman_core::error::StoreError;
use foreman_core::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;

pub mod keys {
    pub fn agent_status(agent: &str) -> String {
        format!("agent:{agent}:status")
    }

    pub fn agent_last_run(agent: &str) -> String {
        format!("agent:{agent}:last_run")
    }

    pub fn active_risks(project: &str) -> String {
        format!("project:{project}:active_risks")
    }

    pub fn pending_approvals(project: &str) -> String {
        format!("project:{project}:pending_approvals")
    }

    pub fn quality_gaps(project: &str) -> String {
        format!("project:{project}:quality_gaps")
    }

    pub fn acceleration(project: &str) -> String {
        format!("project:{project}:acceleration")
    }

    pub fn dedup(hash: &str) -> String {
        format!("dedup:{hash}")
    }
}

/// Typed facade over a [`SharedStore`].
#[derive(Clone)]
pub struct SharedMemory {
    store: Arc<dyn SharedStore>,
}

impl SharedMemory {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SharedStore> {
        &self.store
    }

    // --- Agent status ---

    pub async fn set_agent_status(&self, agent: &str, status: &str) -> Result<(), StoreError> {
        self.store.set(&keys::agent_status(agent), status, None).await
    }

    pub async fn agent_status(&self, agent: &str) -> Result<Option<String>, StoreError> {
        self.store.get(&keys::agent_status(agent)).await
    }

    pub async fn set_agent_last_run(&self, agent: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.store
            .set(&keys::agent_last_run(agent), &at.to_rfc3339(), None)
            .await
    }

    pub async fn agent_last_run(&self, agent: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let key = keys::agent_last_run(agent);
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| StoreError::Corrupt {
                    key,
                    reason: e.to_string(),
                }),
        }
    }

    // --- Active risks ---

    pub async fn add_active_risk(&self, project: &str, risk_id: &str, score: f64) -> Result<(), StoreError> {
        self.store.zadd(&keys::active_risks(project), risk_id, score).await
    }

    /// Highest-scored risks first.
    pub async fn top_risks(&self, project: &str, limit: usize) -> Result<Vec<(String, f64)>, StoreError> {
        self.store.zrevrange(&keys::active_risks(project), limit).await
    }

    // --- Pending approvals ---

    pub async fn add_pending_approval(&self, project: &str, approval_id: &str) -> Result<bool, StoreError> {
        self.store.sadd(&keys::pending_approvals(project), approval_id).await
    }

    pub async fn remove_pending_approval(&self, project: &str, approval_id: &str) -> Result<bool, StoreError> {
        self.store.srem(&keys::pending_approvals(project), approval_id).await
    }

    pub async fn pending_approvals(&self, project: &str) -> Result<Vec<String>, StoreError> {
        self.store.smembers(&keys::pending_approvals(project)).await
    }

    // --- Quality gaps ---

    pub async fn add_quality_gap(
        &self,
        project: &str,
        gap: &serde_json::Value,
        score: f64,
    ) -> Result<(), StoreError> {
        let member = foreman_core::fingerprint::canonical_json(gap);
        self.store.zadd(&keys::quality_gaps(project), &member, score).await
    }

    /// Highest-scored gaps first. Members that are not valid JSON are skipped.
    pub async fn top_quality_gaps(
        &self,
        project: &str,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        let key = keys::quality_gaps(project);
        let ranked = self.store.zrevrange(&key, limit).await?;
        Ok(ranked
            .into_iter()
            .filter_map(|(member, _)| match serde_json::from_str(&member) {
                Ok(gap) => Some(gap),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unparseable quality gap");
                    None
                }
            })
            .collect())
    }

    // --- Acceleration ---

    pub async fn set_acceleration(&self, project: &str, opportunity: &serde_json::Value) -> Result<(), StoreError> {
        self.store
            .set(&keys::acceleration(project), &opportunity.to_string(), None)
            .await
    }

    pub async fn acceleration(&self, project: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let key = keys::acceleration(project);
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    key,
                    reason: e.to_string(),
                }),
        }
    }

    // --- Deduplication ---

    /// Claim `hash` for `ttl`. Returns `true` if this caller got it first.
    pub async fn claim_dedup(&self, hash: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.store.set_if_absent(&keys::dedup(hash), "1", Some(ttl)).await
    }
}
