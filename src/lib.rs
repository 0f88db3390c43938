//! Reader for Potree 2.0 point cloud datasets.
//!
//! A cloud is three files: `metadata.json` (attribute layout, scale/offset,
//! bounding box, hierarchy paging), `hierarchy.bin` (a packed octree index,
//! paged into chunks) and `octree.bin` (interleaved fixed-stride point
//! records). The hierarchy is decoded eagerly into a flat octree; per-node
//! point buffers are decoded on demand via
//! [`PotreePointCloud::load`](point_cloud::PotreePointCloud::load) and
//! released with [`unload`](point_cloud::PotreePointCloud::unload).

pub mod hierarchy;
pub mod metadata;
pub mod octree;
pub mod point;
pub mod point_cloud;
pub mod prelude;
pub mod resource;

pub use metadata::{
    parse_metadata, AttributeMetadata, AttributeType, BoundingBox, HierarchyMetadata, Metadata,
    ReadMetadataError,
};
pub use point::PotreePoint;
pub use point_cloud::{
    LoadPointsError, LoadPotreePointCloudError, PotreePointCloud, ReadHierarchyError,
};
