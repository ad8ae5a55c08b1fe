//! Serializable cache snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::QueryKey;

/// Lifecycle of a single cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Success,
    Error,
}

/// State of one query as shipped to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQueryState {
    pub data: Value,
    /// Milliseconds since the Unix epoch.
    pub data_updated_at: i64,
    pub status: QueryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub query_key: QueryKey,
    pub query_hash: String,
    pub state: DehydratedQueryState,
}

/// Snapshot of every successful query, ordered by hash.
///
/// Serialized as `{"mutations": [], "queries": [...]}`, the shape the client
/// cache hydrates from. Mutations never run on the server, so that list is
/// always empty here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DehydratedState {
    #[serde(default)]
    pub mutations: Vec<Value>,
    #[serde(default)]
    pub queries: Vec<DehydratedQuery>,
}

impl DehydratedState {
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Data of the query with `hash`, if present.
    pub fn data_for(&self, hash: &str) -> Option<&Value> {
        self.queries
            .iter()
            .find(|q| q.query_hash == hash)
            .map(|q| &q.state.data)
    }
}
