use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::{Phase, Transition};

/// Request body for selecting a table.
#[derive(Debug, Deserialize)]
pub struct SelectTableRequest {
    pub schema: String,
    pub name: String,
}

/// Request body for applying a filter.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub text: String,
}

/// Outcome of a transition handler: resulting state plus at most one notice.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub phase: Phase,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl From<Transition> for TransitionResponse {
    fn from(t: Transition) -> Self {
        Self {
            phase: t.phase,
            generation: t.generation,
            notice: t.notice.map(|n| n.to_string()),
        }
    }
}

/// Render projection: everything the presentation layer needs to draw the
/// grid and decide whether to rebind the edit surface.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub phase: Phase,
    pub generation: u64,
    pub binding_key: String,
    pub table: Option<String>,
    pub filter: Option<String>,
    pub data: Option<Value>,
}

/// Error response format.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
