//! Retrieval aggregation over an external vector-search backend.
//!
//! The backend is consumed purely at its boundary: a query string in, ranked
//! text snippets with metadata out. Embedding computation and index
//! maintenance belong to the backend.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::time::Duration;

/// One ranked snippet returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Boundary to the vector-search backend.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>>;
}

/// HTTP client for a Chroma collection.
pub struct ChromaBackend {
    client: Client,
    host: String,
    collection: String,
}

impl ChromaBackend {
    pub fn new(host: impl Into<String>, collection: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            host: host.into(),
            collection: collection.into(),
        })
    }
}

#[async_trait]
impl VectorBackend for ChromaBackend {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>> {
        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.host.trim_end_matches('/'),
            self.collection
        );
        let payload = json!({
            "query_texts": [text],
            "n_results": k,
            "include": ["documents", "metadatas"],
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if response.status() != StatusCode::OK {
            return Err(anyhow!("Vector backend error: {}", response.status()));
        }
        let body: Value = response.json().await?;

        // results come back as one inner list per query text; we send one
        let ids = body.pointer("/ids/0").and_then(Value::as_array);
        let documents = body.pointer("/documents/0").and_then(Value::as_array);
        let metadatas = body.pointer("/metadatas/0").and_then(Value::as_array);

        let ids = ids.ok_or_else(|| anyhow!("Malformed query response: {}", body))?;
        let mut chunks = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let text = documents
                .and_then(|docs| docs.get(i))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let metadata = metadatas
                .and_then(|metas| metas.get(i))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            chunks.push(Chunk {
                id: id.as_str().unwrap_or_default().to_string(),
                text: text.to_string(),
                metadata,
            });
        }
        Ok(chunks)
    }
}

/// Expands a plan into one deduplicated context block.
pub struct Retriever {
    backend: Box<dyn VectorBackend>,
    results_per_subtask: usize,
}

impl Retriever {
    // few results per subtask to keep the aggregated context small
    pub const DEFAULT_RESULTS_PER_SUBTASK: usize = 2;

    pub fn new(backend: Box<dyn VectorBackend>) -> Self {
        Self {
            backend,
            results_per_subtask: Self::DEFAULT_RESULTS_PER_SUBTASK,
        }
    }

    pub fn with_results_per_subtask(mut self, k: usize) -> Self {
        self.results_per_subtask = k;
        self
    }

    /// Query the backend once per subtask and concatenate the formatted
    /// results, dropping structurally identical blocks after their first
    /// appearance. Subtasks that fail or return nothing contribute nothing;
    /// an empty plan yields an empty context.
    pub async fn aggregate(&self, plan: &[String]) -> String {
        let mut seen = HashSet::new();
        let mut blocks = Vec::new();

        for subtask in plan {
            let chunks = match self.backend.query(subtask, self.results_per_subtask).await {
                Ok(chunks) => chunks,
                Err(_) => continue,
            };
            let block = format_chunks(&chunks);
            if block.is_empty() {
                continue;
            }
            if seen.insert(block.clone()) {
                blocks.push(block);
            }
        }

        blocks.join("\n---\n")
    }
}

/// Render chunks the way the model sees them: source id, metadata, content.
fn format_chunks(chunks: &[Chunk]) -> String {
    let entries: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            let url = chunk
                .metadata
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or("N/A");
            let item_type = chunk
                .metadata
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("N/A");
            format!(
                "[Source: {}] (Type: {}, URL: {})\nContent: {}\n---",
                chunk.id, item_type, url, chunk.text
            )
        })
        .collect();
    entries.join("\n")
}
