use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use futures_util::stream::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use airweave_connector::connector::Connector;
use airweave_core::cursor::Cursor;
use airweave_core::entity::{Entity, EntityKind};
use airweave_core::error::CoreError;
use airweave_core::ids::{CollectionId, OrganizationId, SyncId, SyncJobId};
use airweave_core::sync::{JobCounters, JobStatus, SyncJob};
use airweave_core::usage::ActionType;
use airweave_dag::graph::NodeId;
use airweave_dag::router::DagRouter;
use airweave_metadata::store::MetadataStore;
use airweave_pubsub::{PubSub, SyncJobUpdate};
use airweave_quota::guard::QuotaGuard;
use airweave_store::store::VectorStore;
use airweave_store::types::UpsertPoint;

use crate::snapshot;

/// One sync run's fixed inputs: which connector feeds it, which DAG
/// routes its entities, and which collection/organization it writes
/// against. Built fresh per job by whatever schedules the run.
pub struct RunRequest {
    pub sync_id: SyncId,
    pub organization_id: OrganizationId,
    pub collection_id: CollectionId,
    pub connector: Arc<dyn Connector>,
    pub router: Arc<DagRouter>,
    pub source_node_id: NodeId,
    pub cursor: Cursor,
}

/// Concurrency and progress-reporting knobs.
#[derive(Debug, Clone, Copy)]
pub struct SyncEngineConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub progress_every: u64,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self { worker_count: 8, queue_capacity: 1024, progress_every: 50 }
    }
}

/// Drives one sync job end to end: reads the connector's entity stream,
/// routes each entity through the DAG to an embedded point (or skips it
/// entirely when its content hash hasn't changed since the previous
/// run), upserts changed points, and deletes points for entities the
/// connector no longer produced. Deletions are deferred until the whole
/// stream has drained successfully, so a job that fails partway through
/// never removes data for entities it simply hasn't reached yet. The
/// incremental cursor advances on the same condition: the connector's
/// observed watermarks are merged in and persisted only once the stream
/// has drained without error or cancellation, never on a partial run.
///
/// Entities are sharded across `worker_count` queues by a hash of their
/// id, so every chunk of the same entity lands on the same worker while
/// unrelated entities process concurrently.
pub struct SyncEngine {
    metadata: Arc<dyn MetadataStore>,
    store: Arc<dyn VectorStore>,
    quota: Arc<QuotaGuard>,
    pubsub: PubSub,
    config: SyncEngineConfig,
}

impl SyncEngine {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        store: Arc<dyn VectorStore>,
        quota: Arc<QuotaGuard>,
        pubsub: PubSub,
        config: SyncEngineConfig,
    ) -> Self {
        Self { metadata, store, quota, pubsub, config }
    }

    pub async fn run(
        &self,
        job_id: SyncJobId,
        request: RunRequest,
        cancel: CancellationToken,
    ) -> Result<SyncJob, CoreError> {
        let mut job = self.metadata.get_job(job_id).await?;
        job.status = JobStatus::InProgress;
        job.started_at = Some(chrono::Utc::now());
        job = self.metadata.save_job(&job).await?;
        self.publish(&job, None);

        let result = self.run_inner(&request, &mut job, &cancel).await;

        match result {
            Ok(()) => job.status = JobStatus::Completed,
            Err(err) => {
                job.status = if cancel.is_cancelled() { JobStatus::Cancelled } else { JobStatus::Failed };
                job.error = Some(err.to_string());
            }
        }
        job.completed_at = Some(chrono::Utc::now());
        job = self.metadata.save_job(&job).await?;
        self.quota.flush_org(request.organization_id).await?;
        self.publish(&job, None);
        self.pubsub.close(job.id);

        match job.status {
            JobStatus::Failed => {
                Err(CoreError::Transient(job.error.clone().unwrap_or_else(|| "sync job failed".into())))
            }
            _ => Ok(job),
        }
    }

    async fn run_inner(
        &self,
        request: &RunRequest,
        job: &mut SyncJob,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let previous = self.metadata.load_previous_snapshot(request.sync_id).await?;
        let mut new_snapshot: HashMap<String, String> = HashMap::new();

        let shard_count = self.config.worker_count.max(1);
        let mut senders = Vec::with_capacity(shard_count);
        let mut receivers = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            let (tx, rx) = mpsc::channel::<Entity>(self.config.queue_capacity.max(1));
            senders.push(tx);
            receivers.push(rx);
        }

        let produce = {
            let mut stream = request.connector.stream(request.cursor.clone());
            let senders = senders.clone();
            let cancel = cancel.clone();
            async move {
                while let Some(item) = stream.next().await {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let entity = item?;
                    let shard = shard_of(&entity.entity_id, senders.len());
                    if senders[shard].send(entity).await.is_err() {
                        break;
                    }
                }
                drop(senders);
                Ok::<(), CoreError>(())
            }
        };

        let consume = async {
            let mut outcomes = Vec::with_capacity(shard_count);
            for rx in receivers {
                outcomes.push(self.drain_shard(job.id, rx, request, &previous, cancel));
            }
            futures_util::future::try_join_all(outcomes).await
        };

        let (produced, consumed) = tokio::join!(produce, consume);
        produced?;
        let shard_results = consumed?;

        for (seen, counters) in shard_results {
            new_snapshot.extend(seen);
            job.counters.entities_processed += counters.entities_processed;
            job.counters.entities_inserted += counters.entities_inserted;
            job.counters.entities_updated += counters.entities_updated;
            job.counters.entities_skipped += counters.entities_skipped;
            job.counters.entities_failed += counters.entities_failed;
        }

        if cancel.is_cancelled() {
            return Err(CoreError::InternalInvariantViolated("sync job cancelled".into()));
        }

        let watermarks = request.connector.observed_watermarks();
        if !watermarks.is_empty() {
            let mut cursor = request.cursor.clone();
            cursor.merge(watermarks);
            self.metadata.save_cursor(&cursor).await?;
        }

        let deleted: Vec<&String> = previous.keys().filter(|id| !new_snapshot.contains_key(*id)).collect();
        for entity_id in deleted {
            let Some((chunk_count, _)) = previous.get(entity_id).and_then(|e| snapshot::decode(e)) else {
                continue;
            };
            let point_ids: Vec<String> = (0..chunk_count.max(1))
                .map(|i| airweave_core::hashing::point_id(request.collection_id, entity_id, i))
                .collect();
            self.store.delete(request.collection_id, &point_ids).await?;
            job.counters.entities_deleted += 1;
        }

        self.metadata.save_snapshot(request.sync_id, new_snapshot).await?;
        Ok(())
    }

    async fn drain_shard(
        &self,
        job_id: SyncJobId,
        mut rx: mpsc::Receiver<Entity>,
        request: &RunRequest,
        previous: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<(HashMap<String, String>, JobCounters), CoreError> {
        let mut seen = HashMap::new();
        let mut counters = JobCounters::default();

        while let Some(entity) = rx.recv().await {
            if cancel.is_cancelled() {
                break;
            }
            counters.entities_processed += 1;

            let new_hash = entity.content_hash();
            let previous_entry = previous.get(&entity.entity_id).and_then(|e| snapshot::decode(e));

            if let Some((old_count, old_hash)) = previous_entry {
                if old_hash == new_hash {
                    counters.entities_skipped += 1;
                    seen.insert(entity.entity_id.clone(), snapshot::encode(old_count, &new_hash));
                    continue;
                }
            }

            let produced = match request.router.process(request.source_node_id, entity.clone()).await {
                Ok(produced) => produced,
                Err(err) => {
                    tracing::warn!(entity_id = %entity.entity_id, error = %err, "routing failed, skipping entity");
                    counters.entities_failed += 1;
                    continue;
                }
            };

            let points: Vec<UpsertPoint> = produced
                .iter()
                .filter_map(|e| {
                    let vector = e.vector()?.to_vec();
                    Some(UpsertPoint {
                        point_id: airweave_core::hashing::point_id(
                            request.collection_id,
                            &e.entity_id,
                            e.chunk_index(),
                        ),
                        entity_id: e.entity_id.clone(),
                        vector,
                        sparse: sparse_of(e),
                        payload: e.payload.clone(),
                    })
                })
                .collect();

            if points.is_empty() {
                tracing::warn!(entity_id = %entity.entity_id, "no embedded points produced, entity dropped");
                counters.entities_failed += 1;
                continue;
            }

            self.quota.admit(request.organization_id, ActionType::Entities, 1).await?;
            self.store.upsert(request.collection_id, points).await?;

            if previous_entry.is_some() {
                counters.entities_updated += 1;
            } else {
                counters.entities_inserted += 1;
            }

            seen.insert(entity.entity_id.clone(), snapshot::encode(produced.len() as u32, &new_hash));

            if counters.entities_processed % self.config.progress_every == 0 {
                self.pubsub.publish(
                    job_id,
                    SyncJobUpdate { job_id, status: JobStatus::InProgress, counters, message: None },
                );
            }
        }

        Ok((seen, counters))
    }

    fn publish(&self, job: &SyncJob, message: Option<String>) {
        self.pubsub.publish(
            job.id,
            SyncJobUpdate { job_id: job.id, status: job.status, counters: job.counters, message },
        );
    }
}

fn sparse_of(entity: &Entity) -> Option<airweave_core::entity::SparseVector> {
    match &entity.kind {
        EntityKind::Chunk(c) => c.sparse.clone(),
        EntityKind::File(f) => f.chunk.as_ref().and_then(|c| c.sparse.clone()),
        EntityKind::CodeFile(c) => c.file.chunk.as_ref().and_then(|c| c.sparse.clone()),
        EntityKind::Polymorphic(_) => None,
    }
}

fn shard_of(entity_id: &str, shard_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    entity_id.hash(&mut hasher);
    (hasher.finish() as usize) % shard_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_connector::error::ConnectorError;
    use airweave_core::billing::{BillingPeriodStatus, BillingPlan};
    use airweave_core::entity::{ChunkData, EntityKind};
    use airweave_core::ids::{EntityDefinitionId, SourceConnectionId, SyncDagId};
    use airweave_core::organization::Organization;
    use airweave_core::sync::{JobStatus, Sync, SyncJob, SyncStatus};
    use airweave_dag::builtin::{CodeChunker, FieldChunker, FileChunker};
    use airweave_dag::graph::{DagNode, NodeKind, SyncDag};
    use airweave_dag::router::DagRouterBuilder;
    use airweave_metadata::memory::InMemoryMetadataStore;
    use airweave_store::memory::InMemoryVectorStore;
    use airweave_store::types::SearchQuery;
    use futures_util::stream::{self, BoxStream};
    use std::collections::BTreeMap;

    struct FixedConnector {
        entities: Vec<Entity>,
    }

    #[async_trait::async_trait]
    impl Connector for FixedConnector {
        fn source_kind(&self) -> &str {
            "fixed"
        }

        async fn validate(&self) -> Result<bool, ConnectorError> {
            Ok(true)
        }

        fn stream(&self, _cursor: Cursor) -> BoxStream<'static, Result<Entity, ConnectorError>> {
            let items: Vec<Result<Entity, ConnectorError>> =
                self.entities.clone().into_iter().map(Ok).collect();
            Box::pin(stream::iter(items))
        }
    }

    /// Test double modeling an incremental connector: yields a fixed item
    /// sequence (possibly ending in an error) and reports a fixed
    /// watermark, as if it had tracked the max observed value while
    /// iterating.
    struct WatermarkConnector {
        items: std::sync::Mutex<Option<Vec<Result<Entity, ConnectorError>>>>,
        watermark: BTreeMap<String, serde_json::Value>,
    }

    impl WatermarkConnector {
        fn new(items: Vec<Result<Entity, ConnectorError>>, watermark: BTreeMap<String, serde_json::Value>) -> Self {
            Self { items: std::sync::Mutex::new(Some(items)), watermark }
        }
    }

    #[async_trait::async_trait]
    impl Connector for WatermarkConnector {
        fn source_kind(&self) -> &str {
            "watermark"
        }

        async fn validate(&self) -> Result<bool, ConnectorError> {
            Ok(true)
        }

        fn stream(&self, _cursor: Cursor) -> BoxStream<'static, Result<Entity, ConnectorError>> {
            let items = self.items.lock().unwrap().take().unwrap_or_default();
            Box::pin(stream::iter(items))
        }

        fn observed_watermarks(&self) -> BTreeMap<String, serde_json::Value> {
            self.watermark.clone()
        }
    }

    fn chunk_entity(entity_id: &str, payload: serde_json::Value, vector: Vec<f32>) -> Entity {
        Entity {
            entity_id: entity_id.into(),
            entity_definition_id: EntityDefinitionId::new(),
            source_name: "fixed".into(),
            breadcrumbs: vec![],
            payload,
            embeddable_text: "hello".into(),
            kind: EntityKind::Chunk(ChunkData { chunk_index: 0, chunk_count: 1, vector: Some(vector), sparse: None }),
        }
    }

    struct Harness {
        engine: SyncEngine,
        metadata: Arc<InMemoryMetadataStore>,
        store: Arc<InMemoryVectorStore>,
        sync_id: SyncId,
        organization_id: OrganizationId,
        collection_id: CollectionId,
        source_node_id: NodeId,
        source_connection_id: SourceConnectionId,
    }

    impl Harness {
        fn request(&self, connector: Arc<dyn Connector>, router: Arc<DagRouter>) -> RunRequest {
            RunRequest {
                sync_id: self.sync_id,
                organization_id: self.organization_id,
                collection_id: self.collection_id,
                connector,
                router,
                source_node_id: self.source_node_id,
                cursor: Cursor::new(self.source_connection_id),
            }
        }

        fn router(&self) -> Arc<DagRouter> {
            let source =
                DagNode { id: self.source_node_id, name: "source".into(), kind: NodeKind::Source { connection_id: self.source_connection_id } };
            let dag = SyncDag { id: SyncDagId::new(), sync_id: self.sync_id, nodes: vec![source], edges: vec![] };
            Arc::new(
                DagRouterBuilder::new(
                    dag,
                    Arc::new(FileChunker::default()),
                    Arc::new(CodeChunker::default()),
                    Arc::new(FieldChunker::default()),
                )
                .build()
                .unwrap(),
            )
        }

        async fn new_job(&self) -> SyncJobId {
            let job = self.metadata.create_job_if_none_non_terminal(self.sync_id).await.unwrap();
            job.id
        }
    }

    async fn harness() -> Harness {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let store = Arc::new(InMemoryVectorStore::new());

        let organization_id = OrganizationId::new();
        metadata
            .insert_organization(Organization {
                id: organization_id,
                name: "acme".into(),
                plan: BillingPlan::Developer,
                is_legacy: true,
            })
            .await;
        metadata.set_billing_status(organization_id, BillingPeriodStatus::Active).await;

        let source_connection_id = SourceConnectionId::new();
        let sync_id = SyncId::new();
        metadata
            .insert_sync(Sync {
                id: sync_id,
                source_connection_id,
                dag_id: SyncDagId::new(),
                cron_schedule: None,
                next_scheduled_run: None,
                status: SyncStatus::Active,
            })
            .await;

        Harness {
            engine: SyncEngine::new(
                metadata.clone() as Arc<dyn MetadataStore>,
                store.clone() as Arc<dyn VectorStore>,
                Arc::new(QuotaGuard::new(metadata.clone() as Arc<dyn MetadataStore>)),
                PubSub::new(),
                SyncEngineConfig { worker_count: 2, queue_capacity: 16, progress_every: 1 },
            ),
            metadata,
            store,
            sync_id,
            organization_id,
            collection_id: CollectionId::new(),
            source_node_id: uuid::Uuid::new_v4(),
            source_connection_id,
        }
    }

    #[tokio::test]
    async fn new_entity_is_inserted_and_upserted() {
        let h = harness().await;
        let entity = chunk_entity("e1", serde_json::json!({"a": 1}), vec![1.0, 0.0]);
        let router = h.router();
        let job_id = h.new_job().await;

        let job = h
            .engine
            .run(job_id, h.request(Arc::new(FixedConnector { entities: vec![entity] }), router), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.counters.entities_inserted, 1);
        assert_eq!(job.counters.entities_updated, 0);
        assert_eq!(job.counters.entities_skipped, 0);

        let hits = h
            .store
            .search(h.collection_id, SearchQuery { vector: Some(vec![1.0, 0.0]), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, "e1");

        let snapshot = h.metadata.load_previous_snapshot(h.sync_id).await.unwrap();
        assert!(snapshot.contains_key("e1"));
    }

    #[tokio::test]
    async fn unchanged_entity_is_skipped_without_re_embedding() {
        let h = harness().await;
        let payload = serde_json::json!({"a": 1});
        let hash = airweave_core::hashing::content_hash(&payload);
        h.metadata
            .save_snapshot(h.sync_id, HashMap::from([("e1".to_string(), snapshot::encode(1, &hash))]))
            .await
            .unwrap();

        let entity = chunk_entity("e1", payload, vec![1.0, 0.0]);
        let router = h.router();
        let job_id = h.new_job().await;

        let job = h
            .engine
            .run(job_id, h.request(Arc::new(FixedConnector { entities: vec![entity] }), router), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.counters.entities_skipped, 1);
        assert_eq!(job.counters.entities_inserted, 0);

        let hits = h
            .store
            .search(h.collection_id, SearchQuery { vector: Some(vec![1.0, 0.0]), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert!(hits.is_empty(), "unchanged entity must never reach the store");
    }

    #[tokio::test]
    async fn changed_entity_is_counted_as_updated() {
        let h = harness().await;
        let old_hash = airweave_core::hashing::content_hash(&serde_json::json!({"a": 1}));
        h.metadata
            .save_snapshot(h.sync_id, HashMap::from([("e1".to_string(), snapshot::encode(1, &old_hash))]))
            .await
            .unwrap();

        let entity = chunk_entity("e1", serde_json::json!({"a": 2}), vec![0.0, 1.0]);
        let router = h.router();
        let job_id = h.new_job().await;

        let job = h
            .engine
            .run(job_id, h.request(Arc::new(FixedConnector { entities: vec![entity] }), router), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.counters.entities_updated, 1);
        assert_eq!(job.counters.entities_inserted, 0);
        assert_eq!(job.counters.entities_skipped, 0);
    }

    #[tokio::test]
    async fn entity_dropped_by_connector_is_deleted_after_success() {
        let h = harness().await;
        let first_job = h.new_job().await;
        let entity = chunk_entity("e1", serde_json::json!({"a": 1}), vec![1.0, 0.0]);
        let router = h.router();
        h.engine
            .run(first_job, h.request(Arc::new(FixedConnector { entities: vec![entity] }), router), CancellationToken::new())
            .await
            .unwrap();

        let second_job = h.new_job().await;
        let router = h.router();
        let job = h
            .engine
            .run(second_job, h.request(Arc::new(FixedConnector { entities: vec![] }), router), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.counters.entities_deleted, 1);
        let hits = h
            .store
            .search(h.collection_id, SearchQuery { vector: Some(vec![1.0, 0.0]), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert!(hits.is_empty());
        let snapshot = h.metadata.load_previous_snapshot(h.sync_id).await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn pre_cancelled_run_marks_job_cancelled_and_skips_deletion() {
        let h = harness().await;
        let entity = chunk_entity("e1", serde_json::json!({"a": 1}), vec![1.0, 0.0]);
        let router = h.router();
        let job_id = h.new_job().await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let job = h
            .engine
            .run(job_id, h.request(Arc::new(FixedConnector { entities: vec![entity] }), router), cancel)
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Cancelled);
        let snapshot = h.metadata.load_previous_snapshot(h.sync_id).await.unwrap();
        assert!(snapshot.is_empty(), "a cancelled run must not persist a partial snapshot");
    }

    #[tokio::test]
    async fn successful_run_commits_the_observed_cursor_watermark() {
        let h = harness().await;
        let entity = chunk_entity("e1", serde_json::json!({"a": 1}), vec![1.0, 0.0]);
        let router = h.router();
        let job_id = h.new_job().await;

        let connector = Arc::new(WatermarkConnector::new(
            vec![Ok(entity)],
            BTreeMap::from([("T".to_string(), serde_json::json!("B"))]),
        ));

        h.engine.run(job_id, h.request(connector, router), CancellationToken::new()).await.unwrap();

        let cursor = h.metadata.get_cursor(h.source_connection_id).await.unwrap();
        assert_eq!(cursor.get("T"), Some(&serde_json::json!("B")));
    }

    #[tokio::test]
    async fn failed_run_leaves_the_cursor_at_its_last_committed_value() {
        let h = harness().await;
        let mut seeded = Cursor::new(h.source_connection_id);
        seeded.set("T", serde_json::json!("C"));
        h.metadata.save_cursor(&seeded).await.unwrap();

        let router = h.router();
        let job_id = h.new_job().await;
        let connector = Arc::new(WatermarkConnector::new(
            vec![Err(ConnectorError::Transient("boom".into()))],
            BTreeMap::from([("T".to_string(), serde_json::json!("D"))]),
        ));

        let result = h.engine.run(job_id, h.request(connector, router), CancellationToken::new()).await;
        assert!(result.is_err());

        let cursor = h.metadata.get_cursor(h.source_connection_id).await.unwrap();
        assert_eq!(cursor.get("T"), Some(&serde_json::json!("C")));
    }
}
