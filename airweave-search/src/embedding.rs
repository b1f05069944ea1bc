//! Embedding stage: batch-embeds every expanded query with the dense
//! provider and, when a sparse encoder is wired, sparse-encodes each
//! one too for hybrid search.

use std::sync::Arc;

use airweave_core::entity::SparseVector;
use airweave_core::error::CoreError;
use airweave_core::providers::{EmbeddingProvider, SparseEncoder};

pub struct Embedded {
    pub dense: Vec<Vec<f32>>,
    pub sparse: Option<Vec<SparseVector>>,
}

pub async fn embed(
    queries: &[String],
    embedder: &Arc<dyn EmbeddingProvider>,
    sparse_encoder: Option<&Arc<dyn SparseEncoder>>,
) -> Result<Embedded, CoreError> {
    let text_vec: Vec<String> = queries.to_vec();
    let dense = embedder.embed_many(&text_vec).await?;

    let sparse = match sparse_encoder {
        None => None,
        Some(encoder) => {
            let mut out = Vec::with_capacity(queries.len());
            for query in queries {
                out.push(encoder.encode(query).await?);
            }
            Some(out)
        }
    };

    Ok(Embedded { dense, sparse })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError> {
            Ok(vec![text.len() as f32, 0.0])
        }
    }

    struct FakeSparse;

    #[async_trait]
    impl SparseEncoder for FakeSparse {
        async fn encode(&self, text: &str) -> Result<SparseVector, CoreError> {
            Ok(SparseVector { indices: vec![0], values: vec![text.len() as f32] })
        }
    }

    #[tokio::test]
    async fn embeds_every_query_densely() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FakeEmbedder);
        let queries = vec!["a".to_string(), "bb".to_string()];
        let out = embed(&queries, &embedder, None).await.unwrap();
        assert_eq!(out.dense.len(), 2);
        assert!(out.sparse.is_none());
    }

    #[tokio::test]
    async fn sparse_encodes_when_configured() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FakeEmbedder);
        let sparse_encoder: Arc<dyn SparseEncoder> = Arc::new(FakeSparse);
        let queries = vec!["abc".to_string()];
        let out = embed(&queries, &embedder, Some(&sparse_encoder)).await.unwrap();
        assert_eq!(out.sparse.unwrap()[0].values, vec![3.0]);
    }
}
