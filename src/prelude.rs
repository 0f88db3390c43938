pub use crate::metadata::{parse_metadata, Metadata};
pub use crate::octree::node::{NodeKind, OctreeNode};
pub use crate::point::PotreePoint;
pub use crate::point_cloud::PotreePointCloud;
pub use crate::resource::file::FileResource;
pub use crate::resource::memory::MemoryResource;
pub use crate::resource::ResourceReader;

// Error types
pub use crate::metadata::ReadMetadataError;
pub use crate::point_cloud::LoadPointsError;
pub use crate::point_cloud::LoadPotreePointCloudError;
pub use crate::point_cloud::ReadHierarchyError;
pub use crate::resource::ResourceError;
