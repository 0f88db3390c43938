use crate::hierarchy::parse_hierarchy;
use crate::metadata::{parse_metadata, Metadata, ReadMetadataError};
use crate::octree::node::OctreeNode;
use crate::octree::{FlatOctree, NodeId};
use crate::point::PotreePoint;
use crate::resource::file::FileResource;
use crate::resource::{ResourceError, ResourceReader};
use byteorder::{ByteOrder, LittleEndian};
use glam::{U8Vec4, Vec3};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadPotreePointCloudError {
    #[error("Error loading metadata: {0}")]
    Metadata(#[from] ReadMetadataError),

    #[error("Error loading hierarchy: {0}")]
    ReadHierarchyError(#[from] ReadHierarchyError),

    #[error("Error loading resource: {0}")]
    ResourceError(#[from] ResourceError),
}

#[derive(Error, Debug)]
pub enum ReadHierarchyError {
    #[error("Hierarchy chunk at offset {offset} has byte size {size}, not a multiple of 22")]
    InvalidChunkSize { offset: u64, size: u64 },

    #[error("Hierarchy chunk at offset {offset} with byte size {size} exceeds the {buffer_len} byte buffer")]
    ChunkOutOfBounds {
        offset: u64,
        size: u64,
        buffer_len: usize,
    },

    #[error("Hierarchy recursion exceeded the maximum depth of {0}")]
    MaxDepthExceeded(u16),

    #[error("Hierarchy record {index} in the chunk at offset {offset} has no matching node")]
    UnmatchedRecord { offset: u64, index: usize },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Invalid binary data: {0}")]
    InvalidBinaryData(#[from] binrw::Error),
}

#[derive(Error, Debug)]
pub enum LoadPointsError {
    #[error("Node does not exists")]
    NodeNotFound,

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Encoding not implemented: {0}")]
    EncodingUnimplemented(String),

    #[error("Point buffer holds {got} bytes but {needed} are required")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// A Potree point cloud: parsed metadata, the fully decoded hierarchy, a
/// path-keyed node index, and a ranged reader over the point-data file.
///
/// The hierarchy is decoded once, up front; per-node point buffers are
/// decoded on demand with [`load`](Self::load) and dropped with
/// [`unload`](Self::unload).
#[derive(Debug)]
pub struct PotreePointCloud<R = FileResource> {
    metadata: Metadata,
    octree: FlatOctree<OctreeNode>,
    flat_nodes: Vec<NodeId>,
    nodes_by_name: HashMap<String, NodeId>,
    points_resource: R,
}

impl PotreePointCloud<FileResource> {
    /// Load a point cloud from a directory holding `metadata.json`,
    /// `hierarchy.bin` and `octree.bin`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, LoadPotreePointCloudError> {
        let dir = dir.as_ref();
        let metadata = parse_metadata(dir.join("metadata.json"))?;
        let hierarchy = FileResource::new(dir.join("hierarchy.bin"));
        let points = FileResource::new(dir.join("octree.bin"));

        Self::from_parts(metadata, &hierarchy, points)
    }
}

impl<R: ResourceReader> PotreePointCloud<R> {
    /// Construct over explicit resources. The hierarchy resource is read
    /// whole and decoded immediately; `points_resource` is kept for ranged
    /// reads on demand.
    pub fn from_parts(
        metadata: Metadata,
        hierarchy: &impl ResourceReader,
        points_resource: R,
    ) -> Result<Self, LoadPotreePointCloudError> {
        let buf = hierarchy.read()?;

        let mut octree = FlatOctree::new();
        let root_id = octree.root_id();
        *octree.root_mut() = metadata.create_root_node();
        octree.root_mut().id = Some(root_id);

        parse_hierarchy(
            &mut octree,
            root_id,
            &buf,
            0,
            metadata.hierarchy.first_chunk_size,
            metadata.hierarchy.depth,
        )?;

        let mut this = Self {
            metadata,
            octree,
            flat_nodes: Vec::new(),
            nodes_by_name: HashMap::new(),
            points_resource,
        };
        this.flatten();
        debug!(nodes = this.flat_nodes.len(), "decoded hierarchy");

        Ok(this)
    }

    // depth-first walk from the root, octant order within each node
    fn flatten(&mut self) {
        let mut stack = vec![self.octree.root_id()];

        while let Some(node_id) = stack.pop() {
            let node = self
                .octree
                .node(node_id)
                .expect("missing node in hierarchy, shouldn't happen");

            self.flat_nodes.push(node_id);
            self.nodes_by_name.insert(node.name.clone(), node_id);

            for child_id in node.children.iter().rev().flatten() {
                stack.push(*child_id);
            }
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn octree(&self) -> &FlatOctree<OctreeNode> {
        &self.octree
    }

    pub fn root(&self) -> &OctreeNode {
        self.octree.root()
    }

    /// All decoded nodes, in flattened traversal order.
    pub fn nodes(&self) -> impl Iterator<Item = &OctreeNode> {
        self.flat_nodes.iter().filter_map(|id| self.octree.node(*id))
    }

    /// Look up a node by its octant path, e.g. `""` for the root or `"064"`.
    pub fn find_node(&self, name: &str) -> Option<&OctreeNode> {
        self.nodes_by_name
            .get(name)
            .and_then(|id| self.octree.node(*id))
    }

    /// Decode the node's points and attach them. Loading an already-loaded
    /// node replaces its buffer wholesale.
    pub fn load(&mut self, name: &str) -> Result<&[PotreePoint], LoadPointsError> {
        let node_id = *self
            .nodes_by_name
            .get(name)
            .ok_or(LoadPointsError::NodeNotFound)?;

        if !self.metadata.encoding.contains("DEFAULT") {
            return Err(LoadPointsError::EncodingUnimplemented(
                self.metadata.encoding.clone(),
            ));
        }

        let (byte_offset, num_points) = {
            let node = self.octree.node(node_id).ok_or(LoadPointsError::NodeNotFound)?;
            (node.byte_offset, node.num_points)
        };

        let length = num_points as usize * self.metadata.point_size();
        let buffer = self.points_resource.read_range(byte_offset, length)?;

        let node = self.octree.node(node_id).ok_or(LoadPointsError::NodeNotFound)?;
        let points = parse_points_default(&self.metadata, node, &buffer)?;
        debug!(name, num_points, "loaded node points");

        let node = self
            .octree
            .node_mut(node_id)
            .ok_or(LoadPointsError::NodeNotFound)?;
        node.points = Some(points);
        node.is_loaded = true;

        Ok(node.points.as_deref().unwrap_or_default())
    }

    /// Detach the node's point buffer. Dropping the owning vector is the
    /// whole reclamation; unloading an unloaded node is a no-op.
    pub fn unload(&mut self, name: &str) -> Result<(), LoadPointsError> {
        let node_id = *self
            .nodes_by_name
            .get(name)
            .ok_or(LoadPointsError::NodeNotFound)?;
        let node = self
            .octree
            .node_mut(node_id)
            .ok_or(LoadPointsError::NodeNotFound)?;

        node.points = None;
        node.is_loaded = false;

        Ok(())
    }
}

/// Decode a node's fixed-stride interleaved records.
///
/// The attribute list is walked in declared order with an accumulating byte
/// cursor; each attribute is filled across all points before the cursor
/// advances, so the result buffer grows one field at a time. Attributes the
/// reader does not interpret only advance the cursor.
pub(crate) fn parse_points_default(
    metadata: &Metadata,
    node: &OctreeNode,
    buffer: &[u8],
) -> Result<Vec<PotreePoint>, LoadPointsError> {
    let num_points = node.num_points as usize;
    let stride = metadata.point_size();

    let needed = num_points * stride;
    if buffer.len() < needed {
        return Err(LoadPointsError::BufferTooSmall {
            needed,
            got: buffer.len(),
        });
    }

    let mut points = vec![PotreePoint::default(); num_points];
    let mut attribute_offset = 0;

    for attribute in &metadata.attributes {
        match attribute.name.as_str() {
            "POSITION_CARTESIAN" | "position" => {
                let scale = metadata.scale;
                let offset = metadata.offset;

                for (i, point) in points.iter_mut().enumerate() {
                    let pos = attribute_offset + i * stride;
                    let x = LittleEndian::read_i32(&buffer[pos..pos + 4]);
                    let y = LittleEndian::read_i32(&buffer[pos + 4..pos + 8]);
                    let z = LittleEndian::read_i32(&buffer[pos + 8..pos + 12]);

                    point.position = Vec3::new(
                        x as f32 * scale[0] as f32 + offset[0] as f32,
                        y as f32 * scale[1] as f32 + offset[1] as f32,
                        z as f32 * scale[2] as f32 + offset[2] as f32,
                    );
                }
            }
            name if name.contains("rgb") => {
                let has_alpha = name.contains("rgba");

                for (i, point) in points.iter_mut().enumerate() {
                    let pos = attribute_offset + i * stride;
                    let r = LittleEndian::read_u16(&buffer[pos..pos + 2]);
                    let g = LittleEndian::read_u16(&buffer[pos + 2..pos + 4]);
                    let b = LittleEndian::read_u16(&buffer[pos + 4..pos + 6]);
                    let a = if has_alpha {
                        LittleEndian::read_u16(&buffer[pos + 6..pos + 8])
                    } else {
                        255
                    };

                    // channels may be stored at 8 or 16 bit range; anything
                    // past one byte is 16-bit-scaled
                    point.color = U8Vec4::new(
                        (if r > 255 { r / 256 } else { r }) as u8,
                        (if g > 255 { g / 256 } else { g }) as u8,
                        (if b > 255 { b / 256 } else { b }) as u8,
                        (if a > 255 { a / 256 } else { a }) as u8,
                    );
                }
            }
            "classification" => {
                for (i, point) in points.iter_mut().enumerate() {
                    let pos = attribute_offset + i * stride;
                    point.classification = buffer[pos] as i8;
                }
            }
            _ => {}
        }

        attribute_offset += attribute.size as usize;
    }

    Ok(points)
}
