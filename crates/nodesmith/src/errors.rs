use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    #[error("Error executing tool: {0}")]
    ExecutionError(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
