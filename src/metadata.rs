use crate::octree::aabb::Aabb;
use crate::octree::node::OctreeNode;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Parse a `metadata.json` file from disk.
pub fn parse_metadata(path: impl AsRef<Path>) -> Result<Metadata, ReadMetadataError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[derive(Error, Debug)]
pub enum ReadMetadataError {
    #[error("Invalid json: {0}")]
    JsonError(#[from] serde_json::error::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed cloud configuration. Immutable once loaded; everything the
/// decoders need comes from here.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: u64,
    #[serde(default)]
    pub projection: String,
    pub hierarchy: HierarchyMetadata,
    pub offset: [f64; 3],
    pub scale: [f64; 3],
    pub spacing: f64,
    pub bounding_box: BoundingBox,
    pub encoding: String,
    pub attributes: Vec<AttributeMetadata>,
}

/// Paging parameters of `hierarchy.bin`.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyMetadata {
    pub first_chunk_size: u64,
    pub step_size: u16,
    pub depth: u16,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum AttributeType {
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "undefined")]
    Undefined,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub size: u16,
    pub num_elements: u16,
    pub element_size: u16,
    pub r#type: AttributeType,
    #[serde(default)]
    pub min: Vec<f64>,
    #[serde(default)]
    pub max: Vec<f64>,
}

impl Metadata {
    /// Byte stride of one interleaved point record: the sum of all declared
    /// attribute sizes.
    pub fn point_size(&self) -> usize {
        self.attributes.iter().map(|a| a.size as usize).sum()
    }

    /// Seed node for the hierarchy decode. The root's path is the empty
    /// string and its bounds are the cloud bounding box; everything else is
    /// filled in by the first record of the first chunk.
    pub(crate) fn create_root_node(&self) -> OctreeNode {
        OctreeNode {
            name: String::new(),
            bounding_box: self.bounding_box.clone().into(),
            spacing: self.spacing,
            ..Default::default()
        }
    }
}

impl Into<Aabb> for BoundingBox {
    fn into(self) -> Aabb {
        Aabb {
            min: self.min.into(),
            max: self.max.into(),
        }
    }
}
