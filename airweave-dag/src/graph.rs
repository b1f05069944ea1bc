use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use airweave_core::ids::{EntityDefinitionId, SourceConnectionId, SyncDagId, SyncId};

use crate::error::DagError;

pub type NodeId = Uuid;

/// What a node represents. A node carries exactly the identifying field
/// its kind needs: a source node the connection it reads from, an entity
/// node the entity-definition type it stands in for, a transformer node
/// the transformer that runs when an entity reaches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Source { connection_id: SourceConnectionId },
    Destination,
    Entity { entity_definition_id: EntityDefinitionId },
    Transformer { transformer_id: Uuid },
}

impl NodeKind {
    pub fn is_destination(&self) -> bool {
        matches!(self, NodeKind::Destination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DagEdge {
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
}

/// The execution graph attached to a sync: sources feed entity nodes,
/// entity nodes feed transformer nodes (or go straight to a
/// destination), transformer nodes feed more entity nodes or
/// destinations. Built once per sync and reused for every job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncDag {
    pub id: SyncDagId,
    pub sync_id: SyncId,
    pub nodes: Vec<DagNode>,
    pub edges: Vec<DagEdge>,
}

impl SyncDag {
    pub fn get_node(&self, id: NodeId) -> Option<&DagNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn outbound(&self, id: NodeId) -> impl Iterator<Item = &DagEdge> {
        self.edges.iter().filter(move |e| e.from_node_id == id)
    }

    pub fn inbound(&self, id: NodeId) -> impl Iterator<Item = &DagEdge> {
        self.edges.iter().filter(move |e| e.to_node_id == id)
    }

    /// Every entity-type node must have exactly one inbound edge (it
    /// represents one producer's output), and its outbound edges must
    /// either be empty, all destinations, or a single non-destination
    /// (fan-out to more than one transformer from the same entity type
    /// is a structural error, not a routing ambiguity the router should
    /// paper over).
    pub fn validate(&self) -> Result<(), DagError> {
        for node in &self.nodes {
            if !matches!(node.kind, NodeKind::Entity { .. }) {
                continue;
            }

            let inbound_count = self.inbound(node.id).count();
            if inbound_count != 1 {
                return Err(DagError::Invalid(format!(
                    "entity node {} ({}) has {} inbound edges, expected exactly 1",
                    node.id, node.name, inbound_count
                )));
            }

            let outbound: Vec<&DagEdge> = self.outbound(node.id).collect();
            let non_destination: Vec<&DagEdge> = outbound
                .iter()
                .filter(|e| {
                    self.get_node(e.to_node_id).map(|n| !n.kind.is_destination()).unwrap_or(true)
                })
                .copied()
                .collect();

            if non_destination.len() > 1 {
                return Err(DagError::Invalid(format!(
                    "entity node {} ({}) has {} non-destination outbound edges, expected at most 1",
                    node.id,
                    node.name,
                    non_destination.len()
                )));
            }
        }
        Ok(())
    }

    /// Route table: for every entity node, where its (single, if any)
    /// non-destination successor is. `None` means "send straight to
    /// destination" (including entity nodes whose only successors are
    /// destinations, or that have no successors at all).
    pub fn build_routes(&self) -> HashMap<(NodeId, EntityDefinitionId), Option<NodeId>> {
        let mut routes = HashMap::new();

        for node in &self.nodes {
            let NodeKind::Entity { entity_definition_id } = &node.kind else {
                continue;
            };
            let Some(producer) = self.inbound(node.id).next().map(|e| e.from_node_id) else {
                continue;
            };

            let consumer = self
                .outbound(node.id)
                .find(|e| {
                    self.get_node(e.to_node_id).map(|n| !n.kind.is_destination()).unwrap_or(false)
                })
                .map(|e| e.to_node_id);

            routes.insert((producer, *entity_definition_id), consumer);
        }

        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind) -> DagNode {
        DagNode { id: Uuid::new_v4(), name: "n".into(), kind }
    }

    #[test]
    fn rejects_entity_node_with_two_non_destination_outbound_edges() {
        let source = node(NodeKind::Source { connection_id: SourceConnectionId::new() });
        let entity = node(NodeKind::Entity { entity_definition_id: EntityDefinitionId::new() });
        let t1 = node(NodeKind::Transformer { transformer_id: Uuid::new_v4() });
        let t2 = node(NodeKind::Transformer { transformer_id: Uuid::new_v4() });

        let dag = SyncDag {
            id: SyncDagId::new(),
            sync_id: SyncId::new(),
            edges: vec![
                DagEdge { from_node_id: source.id, to_node_id: entity.id },
                DagEdge { from_node_id: entity.id, to_node_id: t1.id },
                DagEdge { from_node_id: entity.id, to_node_id: t2.id },
            ],
            nodes: vec![source, entity, t1, t2],
        };

        assert!(matches!(dag.validate(), Err(DagError::Invalid(_))));
    }

    #[test]
    fn accepts_entity_node_with_one_transformer_and_any_number_of_destinations() {
        let source = node(NodeKind::Source { connection_id: SourceConnectionId::new() });
        let entity = node(NodeKind::Entity { entity_definition_id: EntityDefinitionId::new() });
        let t1 = node(NodeKind::Transformer { transformer_id: Uuid::new_v4() });
        let dest = node(NodeKind::Destination);

        let dag = SyncDag {
            id: SyncDagId::new(),
            sync_id: SyncId::new(),
            edges: vec![
                DagEdge { from_node_id: source.id, to_node_id: entity.id },
                DagEdge { from_node_id: entity.id, to_node_id: t1.id },
                DagEdge { from_node_id: entity.id, to_node_id: dest.id },
            ],
            nodes: vec![source, entity, t1, dest],
        };

        assert!(dag.validate().is_ok());
    }

    #[test]
    fn rejects_entity_node_with_no_inbound_edges() {
        let entity = node(NodeKind::Entity { entity_definition_id: EntityDefinitionId::new() });
        let dest = node(NodeKind::Destination);

        let dag = SyncDag {
            id: SyncDagId::new(),
            sync_id: SyncId::new(),
            edges: vec![DagEdge { from_node_id: entity.id, to_node_id: dest.id }],
            nodes: vec![entity, dest],
        };

        assert!(matches!(dag.validate(), Err(DagError::Invalid(_))));
    }

    #[test]
    fn build_routes_maps_terminal_entity_node_to_none() {
        let source = node(NodeKind::Source { connection_id: SourceConnectionId::new() });
        let def_id = EntityDefinitionId::new();
        let entity = node(NodeKind::Entity { entity_definition_id: def_id });
        let dest = node(NodeKind::Destination);

        let dag = SyncDag {
            id: SyncDagId::new(),
            sync_id: SyncId::new(),
            edges: vec![
                DagEdge { from_node_id: source.id, to_node_id: entity.id },
                DagEdge { from_node_id: entity.id, to_node_id: dest.id },
            ],
            nodes: vec![source.clone(), entity, dest],
        };

        let routes = dag.build_routes();
        assert_eq!(routes.get(&(source.id, def_id)), Some(&None));
    }
}
