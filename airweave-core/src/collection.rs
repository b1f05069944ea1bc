use serde::{Deserialize, Serialize};

use crate::ids::{CollectionId, OrganizationId};

/// A named grouping of synced content, backed by one vector store
/// namespace. Source connections write into exactly one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub readable_id: String,
}
