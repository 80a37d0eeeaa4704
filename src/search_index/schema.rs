//! Index definition in the shape the search service's REST API accepts

use serde::{Deserialize, Serialize};

pub const VECTOR_ALGORITHM_NAME: &str = "hnsw-1";
pub const VECTOR_PROFILE_NAME: &str = "vector-profile-1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<IndexField>,
    pub vector_search: VectorSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

impl IndexField {
    fn simple(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            key: false,
            searchable: false,
            filterable: true,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    fn key(name: &str) -> Self {
        Self {
            key: true,
            filterable: false,
            ..Self::simple(name, "Edm.String")
        }
    }

    fn searchable(name: &str) -> Self {
        Self {
            searchable: true,
            filterable: false,
            ..Self::simple(name, "Edm.String")
        }
    }

    fn vector(name: &str, dimensions: usize, profile: &str) -> Self {
        Self {
            searchable: true,
            filterable: false,
            dimensions: Some(dimensions),
            vector_search_profile: Some(profile.to_string()),
            ..Self::simple(name, "Collection(Edm.Single)")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearch {
    pub algorithms: Vec<VectorAlgorithm>,
    pub profiles: Vec<VectorProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorAlgorithm {
    pub name: String,
    pub kind: String,
    pub hnsw_parameters: HnswParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HnswParameters {
    pub metric: String,
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
}

impl Default for HnswParameters {
    fn default() -> Self {
        Self {
            metric: "cosine".to_string(),
            m: 4,
            ef_construction: 400,
            ef_search: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorProfile {
    pub name: String,
    pub algorithm: String,
}

impl IndexDefinition {
    /// Schema for chunk records with `dimension`-sized vectors
    pub fn for_chunks(name: &str, dimension: usize) -> Self {
        let fields = vec![
            IndexField::key("id"),
            IndexField::searchable("content"),
            IndexField::vector("content_vector", dimension, VECTOR_PROFILE_NAME),
            IndexField::simple("doc_id", "Edm.String"),
            IndexField::simple("course_id", "Edm.String"),
            IndexField::simple("module_id", "Edm.String"),
            IndexField::simple("path", "Edm.String"),
            IndexField::simple("source_type", "Edm.String"),
            IndexField::simple("page_num", "Edm.Int32"),
            IndexField::simple("chunk_num", "Edm.Int32"),
            IndexField::simple("content_hash", "Edm.String"),
        ];

        Self {
            name: name.to_string(),
            fields,
            vector_search: VectorSearch {
                algorithms: vec![VectorAlgorithm {
                    name: VECTOR_ALGORITHM_NAME.to_string(),
                    kind: "hnsw".to_string(),
                    hnsw_parameters: HnswParameters::default(),
                }],
                profiles: vec![VectorProfile {
                    name: VECTOR_PROFILE_NAME.to_string(),
                    algorithm: VECTOR_ALGORITHM_NAME.to_string(),
                }],
            },
        }
    }

    pub fn field(&self, name: &str) -> Option<&IndexField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
