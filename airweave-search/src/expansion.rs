//! Query expansion: turns one query into up to `max_variants` additional
//! paraphrases/synonym variants, so vector search can cast a wider net
//! than a single embedding would reach.

use std::sync::Arc;

use airweave_core::error::CoreError;
use airweave_core::providers::{ChatMessage, LLMProvider};

use crate::types::{QueryExpansionStrategy, DEFAULT_MAX_EXPANSION_VARIANTS};

const EXPANSION_PROMPT: &str = "You expand a search query into alternate phrasings that would \
retrieve the same information. Reply with one alternate phrasing per line, no numbering, no \
commentary. Produce no more than";

/// Expands `query` per `strategy`, returning the original query first
/// followed by up to `max_variants` LLM-generated alternates. Falls
/// back to `[query]` unchanged when expansion is disabled, no provider
/// is wired, or the LLM call fails — expansion is a quality
/// enhancement, never a hard dependency of the pipeline.
pub async fn expand(
    query: &str,
    strategy: QueryExpansionStrategy,
    llm: Option<&Arc<dyn LLMProvider>>,
    max_variants: usize,
) -> Vec<String> {
    if strategy == QueryExpansionStrategy::NoExpansion {
        return vec![query.to_string()];
    }
    let Some(llm) = llm else {
        tracing::debug!("query expansion requested but no LLM provider configured, skipping");
        return vec![query.to_string()];
    };

    match generate_variants(query, llm.as_ref(), max_variants).await {
        Ok(mut variants) => {
            let mut queries = vec![query.to_string()];
            for variant in variants.drain(..) {
                let trimmed = variant.trim().to_string();
                if !trimmed.is_empty() && trimmed != query && !queries.contains(&trimmed) {
                    queries.push(trimmed);
                }
            }
            queries.truncate(max_variants.max(1));
            queries
        }
        Err(err) => {
            tracing::warn!(error = %err, "query expansion failed, continuing with original query");
            vec![query.to_string()]
        }
    }
}

async fn generate_variants(
    query: &str,
    llm: &dyn LLMProvider,
    max_variants: usize,
) -> Result<Vec<String>, CoreError> {
    let messages = [
        ChatMessage::system(format!("{EXPANSION_PROMPT} {max_variants} lines.")),
        ChatMessage::user(query.to_string()),
    ];
    let text = llm.complete(&messages, 256).await?;
    Ok(text.lines().map(str::to_string).collect())
}
