use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::base::Provider;
use crate::models::turn::ModelTurn;

/// A mock provider that returns pre-configured turns for testing
pub struct MockProvider {
    turns: Vec<ModelTurn>,
    plan: Option<Vec<String>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of turns and a fixed plan
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns,
            plan: Some(vec!["do the thing".to_string()]),
        }
    }

    pub fn with_plan(mut self, plan: Vec<String>) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Make `generate_plan` fail, for planning-failure tests
    pub fn without_plan(mut self) -> Self {
        self.plan = None;
        self
    }

    fn next_turn(&mut self) -> ModelTurn {
        if self.turns.is_empty() {
            // Return an empty turn if no more pre-configured turns
            ModelTurn::default()
        } else {
            self.turns.remove(0)
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn generate_plan(&mut self, _request: &str) -> Result<Vec<String>> {
        self.plan
            .clone()
            .ok_or_else(|| anyhow!("mock planning failure"))
    }

    async fn send_message(&mut self, _text: &str) -> Result<ModelTurn> {
        Ok(self.next_turn())
    }

    async fn send_tool_result(
        &mut self,
        _tool_name: &str,
        _result: &str,
        _call_id: Option<&str>,
    ) -> Result<ModelTurn> {
        Ok(self.next_turn())
    }
}
