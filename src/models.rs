use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One chat conversation, stored as a single document in the target
/// collection. Field names keep the casing of the original export
/// (`stime`, `last_interact`) so migrated documents match the data the
/// rest of the system already queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLog {
    #[serde(default = "empty_object")]
    pub stime: Value,
    pub messages: Vec<Message>,
    #[serde(default = "empty_object")]
    pub last_interact: Value,
    #[serde(default)]
    pub llm_deployment_name: String,
    #[serde(default)]
    pub llm_model_name: String,
    #[serde(default)]
    pub vectorstore_index: String,
    #[serde(default = "empty_object")]
    pub overall_cost: Value,
    #[serde(default)]
    pub person: String,
}

/// One turn inside a conversation. Messages are inserted verbatim: absent
/// fields stay absent, keys outside the declared shape ride along in
/// `extra`, and `token_cost` is kept opaque — the loader only guarantees it
/// is non-null after normalization, it never validates the breakdown inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_on: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_cost: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Declared shape of a per-message cost breakdown. The loader never builds
/// these from source data; `TokenCost::default()` is the value substituted
/// for a missing or null `token_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCost {
    pub cost: String,
    pub tokens: i64,
}

impl Default for TokenCost {
    fn default() -> Self {
        TokenCost {
            cost: "0.0".to_string(),
            tokens: 0,
        }
    }
}

pub(crate) fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
