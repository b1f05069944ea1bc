use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;

use airweave_core::entity::Entity;

use crate::connector::BatchGenerationConfig;
use crate::error::ConnectorError;

/// Drives one entity stream per partition through a bounded-concurrency
/// worker pool, merging them into a single stream. With
/// `preserve_order`, partitions are drained one at a time (global
/// order preserved); otherwise up to `batch_size` partitions are drained
/// concurrently and interleaving across partitions is unspecified.
/// `max_queue_size` bounds the channel between workers and the
/// consumer, so a slow consumer applies backpressure to the producers.
pub fn run_batch_generation<P, F>(
    partitions: Vec<P>,
    config: BatchGenerationConfig,
    make_stream: F,
) -> BoxStream<'static, Result<Entity, ConnectorError>>
where
    P: Send + 'static,
    F: Fn(P) -> BoxStream<'static, Result<Entity, ConnectorError>> + Send + Sync + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::channel(config.max_queue_size.max(1));
    let make_stream = Arc::new(make_stream);
    let stop_on_error = config.stop_on_error;
    let concurrency = if config.preserve_order { 1 } else { config.batch_size.max(1) };
    let stop = Arc::new(AtomicBool::new(false));

    tokio::spawn(async move {
        stream::iter(partitions)
            .for_each_concurrent(concurrency, move |partition| {
                let tx = tx.clone();
                let make_stream = make_stream.clone();
                let stop = stop.clone();
                async move {
                    let mut partition_stream = make_stream(partition);
                    while let Some(item) = partition_stream.next().await {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        let is_err = item.is_err();
                        if tx.send(item).await.is_err() {
                            break;
                        }
                        if is_err && stop_on_error {
                            stop.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                }
            })
            .await;
    });

    Box::pin(ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition_stream(items: Vec<i32>) -> BoxStream<'static, Result<Entity, ConnectorError>> {
        use airweave_core::entity::{Entity, EntityKind};
        use airweave_core::ids::EntityDefinitionId;

        Box::pin(stream::iter(items.into_iter().map(|i| {
            Ok(Entity {
                entity_id: i.to_string(),
                entity_definition_id: EntityDefinitionId::new(),
                source_name: "test".into(),
                breadcrumbs: vec![],
                payload: serde_json::json!({ "n": i }),
                embeddable_text: String::new(),
                kind: EntityKind::Chunk(airweave_core::entity::ChunkData::default()),
            })
        })))
    }

    #[tokio::test]
    async fn preserve_order_drains_partitions_sequentially() {
        let partitions = vec![vec![1, 2], vec![3, 4]];
        let merged = run_batch_generation(
            partitions,
            BatchGenerationConfig { preserve_order: true, ..Default::default() },
            partition_stream,
        );

        let ids: Vec<String> = merged.map(|r| r.unwrap().entity_id).collect().await;
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    fn failing_partition_stream(_partition: &'static str) -> BoxStream<'static, Result<Entity, ConnectorError>> {
        use airweave_core::entity::{ChunkData, EntityKind};
        use airweave_core::ids::EntityDefinitionId;

        Box::pin(stream::iter(vec![
            Err(ConnectorError::Transient("boom".into())),
            Ok(Entity {
                entity_id: "never".into(),
                entity_definition_id: EntityDefinitionId::new(),
                source_name: "test".into(),
                breadcrumbs: vec![],
                payload: serde_json::json!({}),
                embeddable_text: String::new(),
                kind: EntityKind::Chunk(ChunkData::default()),
            }),
        ]))
    }

    #[tokio::test]
    async fn stop_on_error_halts_after_first_failure() {
        let merged = run_batch_generation(
            vec!["partition-a"],
            BatchGenerationConfig { preserve_order: true, stop_on_error: true, ..Default::default() },
            failing_partition_stream,
        );

        let results: Vec<_> = merged.collect().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
