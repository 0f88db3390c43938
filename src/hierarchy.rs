use crate::octree::aabb::create_child_aabb;
use crate::octree::node::{NodeKind, OctreeNode};
use crate::octree::{FlatOctree, NodeId};
use crate::point_cloud::ReadHierarchyError;
use binrw::{binrw, BinReaderExt};
use std::io::Cursor;
use tracing::debug;

/// Size of one packed hierarchy record.
pub const BYTES_PER_NODE: usize = 22;

/// One record of `hierarchy.bin`. Each field is read at its own width; the
/// child mask in particular is a single byte and must never be folded into a
/// wider read of the neighbouring count.
#[binrw]
#[derive(Debug, Clone)]
#[br(little)]
pub struct HierarchyNodeEntry {
    pub r#type: u8,
    pub child_mask: u8,
    pub num_points: u32,
    pub byte_offset: u64,
    pub byte_size: u64,
}

/// Decode the chunk at `(offset, size)` of the hierarchy buffer onto the
/// node `root_id`, resolving nested proxy chunks recursively. Chunk nesting
/// deeper than `max_depth` is rejected.
pub(crate) fn parse_hierarchy(
    octree: &mut FlatOctree<OctreeNode>,
    root_id: NodeId,
    buf: &[u8],
    offset: u64,
    size: u64,
    max_depth: u16,
) -> Result<(), ReadHierarchyError> {
    parse_chunk(octree, root_id, buf, offset, size, max_depth, 0)
}

fn parse_chunk(
    octree: &mut FlatOctree<OctreeNode>,
    node_id: NodeId,
    buf: &[u8],
    offset: u64,
    size: u64,
    max_depth: u16,
    depth: u16,
) -> Result<(), ReadHierarchyError> {
    if depth > max_depth {
        return Err(ReadHierarchyError::MaxDepthExceeded(max_depth));
    }
    if size % BYTES_PER_NODE as u64 != 0 {
        return Err(ReadHierarchyError::InvalidChunkSize { offset, size });
    }

    let start = offset as usize;
    let end = start
        .checked_add(size as usize)
        .filter(|end| *end <= buf.len())
        .ok_or(ReadHierarchyError::ChunkOutOfBounds {
            offset,
            size,
            buffer_len: buf.len(),
        })?;

    let chunk = &buf[start..end];
    let num_nodes = chunk.len() / BYTES_PER_NODE;
    debug!(offset, size, num_nodes, depth, "parsing hierarchy chunk");

    let mut cursor = Cursor::new(chunk);

    octree.reserve(num_nodes.saturating_sub(1));

    // breadth-first worklist: the i-th record of the chunk describes the
    // i-th node discovered, starting with the node being populated
    let mut node_ids = Vec::with_capacity(num_nodes);
    node_ids.push(node_id);

    for i in 0..num_nodes {
        let header: HierarchyNodeEntry = cursor.read_le()?;

        let &current_id = node_ids
            .get(i)
            .ok_or(ReadHierarchyError::UnmatchedRecord { offset, index: i })?;
        let current = octree.node_mut(current_id).unwrap();

        current.kind = NodeKind::from_raw(header.r#type);
        current.num_points = header.num_points;
        current.byte_offset = header.byte_offset;
        current.byte_size = header.byte_size;

        if current.byte_size == 0 {
            // workaround for https://github.com/potree/potree/issues/1125
            // some inner nodes erroneously report >0 points even though have 0 points
            // however, they still report a ByteSize of 0, so based on that we now set node.NumPoints to 0
            current.num_points = 0;
        }

        if current.kind == NodeKind::Proxy {
            // the record's byte range addresses another chunk of the same
            // buffer; its first record re-populates this node in place
            parse_chunk(
                octree,
                current_id,
                buf,
                header.byte_offset,
                header.byte_size,
                max_depth,
                depth + 1,
            )?;
            continue;
        }

        // clone/copy just what the children need
        let (current_name, current_bounding_box, current_spacing, current_level) = (
            current.name.clone(),
            current.bounding_box.clone(),
            current.spacing,
            current.level,
        );

        for child_index in 0..8 {
            let child_exists = ((1 << child_index) & header.child_mask) != 0;
            if !child_exists {
                continue;
            }

            let child = OctreeNode {
                name: format!("{}{}", current_name, child_index),
                bounding_box: create_child_aabb(&current_bounding_box, child_index),
                spacing: current_spacing / 2.0,
                level: current_level + 1,
                parent: Some(current_id),
                ..Default::default()
            };

            let child_id = octree.insert(child);
            octree.node_mut(child_id).unwrap().id = Some(child_id);
            octree.node_mut(current_id).unwrap().children[child_index] = Some(child_id);

            node_ids.push(child_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octree::aabb::Aabb;
    use glam::DVec3;

    fn record(kind: u8, child_mask: u8, num_points: u32, byte_offset: u64, byte_size: u64) -> [u8; 22] {
        let mut bytes = [0u8; 22];
        bytes[0] = kind;
        bytes[1] = child_mask;
        bytes[2..6].copy_from_slice(&num_points.to_le_bytes());
        bytes[6..14].copy_from_slice(&byte_offset.to_le_bytes());
        bytes[14..22].copy_from_slice(&byte_size.to_le_bytes());
        bytes
    }

    fn octree_with_root(max: f64) -> FlatOctree<OctreeNode> {
        let mut octree = FlatOctree::new();
        let root_id = octree.root_id();
        *octree.root_mut() = OctreeNode {
            id: Some(root_id),
            bounding_box: Aabb::new(DVec3::ZERO, DVec3::splat(max)),
            spacing: 1.0,
            ..Default::default()
        };
        octree
    }

    #[test]
    fn decodes_a_root_and_one_child() {
        // first chunk: root with octant 0 set, then the child's own record
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0b0000_0001, 100, 0, 1900));
        buf.extend_from_slice(&record(1, 0, 50, 1900, 950));

        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, 44, 8).unwrap();

        assert_eq!(octree.len(), 2);

        let root = octree.root();
        assert_eq!(root.kind, NodeKind::Interior);
        assert_eq!(root.num_points, 100);
        assert_eq!(root.byte_offset, 0);
        assert_eq!(root.byte_size, 1900);

        let child_id = root.child(0).unwrap();
        let child = octree.node(child_id).unwrap();
        assert_eq!(child.name, "0");
        assert_eq!(child.level, 1);
        assert_eq!(child.kind, NodeKind::Leaf);
        assert_eq!(child.num_points, 50);
        assert_eq!(child.parent, Some(root_id));
        assert_eq!(child.bounding_box.min, DVec3::ZERO);
        assert_eq!(child.bounding_box.max, DVec3::splat(4.0));
    }

    #[test]
    fn child_names_and_bounds_follow_the_octant_code() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0xFF, 0, 0, 1));
        for _ in 0..8 {
            buf.extend_from_slice(&record(1, 0, 0, 0, 1));
        }

        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, buf.len() as u64, 8).unwrap();

        assert_eq!(octree.len(), 9);

        let root = octree.root().clone();
        for octant in 0..8 {
            let child = octree.node(root.child(octant).unwrap()).unwrap();
            assert_eq!(child.name, octant.to_string());
            assert_eq!(child.name.len(), child.level as usize);
            assert_eq!(child.spacing, root.spacing / 2.0);
            assert_eq!(
                child.bounding_box,
                create_child_aabb(&root.bounding_box, octant)
            );
        }
    }

    #[test]
    fn each_chunk_describes_exactly_size_over_22_nodes() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0b0000_0011, 10, 0, 100));
        buf.extend_from_slice(&record(1, 0, 5, 100, 50));
        buf.extend_from_slice(&record(1, 0, 5, 150, 50));

        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, buf.len() as u64, 8).unwrap();

        assert_eq!(octree.len(), buf.len() / BYTES_PER_NODE);
    }

    #[test]
    fn proxy_record_splices_in_a_nested_chunk() {
        // chunk A (44 bytes): root with octant 3, child parked as a proxy
        // whose byte range points at chunk B; chunk B re-describes the child
        // as a leaf with its own point range
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0b0000_1000, 10, 0, 190));
        buf.extend_from_slice(&record(2, 0, 0, 44, 22));
        buf.extend_from_slice(&record(1, 0, 7, 500, 133));

        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, 44, 8).unwrap();

        assert_eq!(octree.len(), 2);

        let child_id = octree.root().child(3).unwrap();
        let child = octree.node(child_id).unwrap();
        assert_eq!(child.kind, NodeKind::Leaf);
        assert_eq!(child.name, "3");
        assert_eq!(child.num_points, 7);
        assert_eq!(child.byte_offset, 500);
        assert_eq!(child.byte_size, 133);
    }

    #[test]
    fn nested_chunk_satisfies_the_record_count_itself() {
        // chunk B holds one record and contributes exactly one
        // directly-described node, the spliced proxy
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0b0000_0001, 1, 0, 19));
        buf.extend_from_slice(&record(2, 0, 0, 44, 22));
        buf.extend_from_slice(&record(1, 0b0000_0001, 3, 0, 57));
        buf.extend_from_slice(&record(1, 0, 2, 57, 38));

        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, 44, 8).unwrap();

        // 2 from the first chunk, plus the nested chunk's extra child
        assert_eq!(octree.len(), 3);
        let grandchild = octree
            .node(octree.node(octree.root().child(0).unwrap()).unwrap().child(0).unwrap())
            .unwrap();
        assert_eq!(grandchild.name, "00");
        assert_eq!(grandchild.level, 2);
    }

    #[test]
    fn chunk_size_must_be_a_multiple_of_the_record_size() {
        let buf = [0u8; 21];
        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();

        let err = parse_hierarchy(&mut octree, root_id, &buf, 0, 21, 8).unwrap_err();
        assert!(matches!(
            err,
            ReadHierarchyError::InvalidChunkSize { offset: 0, size: 21 }
        ));
    }

    #[test]
    fn chunk_past_the_buffer_is_rejected() {
        let buf = [0u8; 22];
        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();

        let err = parse_hierarchy(&mut octree, root_id, &buf, 22, 22, 8).unwrap_err();
        assert!(matches!(err, ReadHierarchyError::ChunkOutOfBounds { .. }));
    }

    #[test]
    fn proxy_recursion_is_depth_capped() {
        // a proxy whose chunk is itself, forever
        let buf = record(2, 0, 0, 0, 22);
        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();

        let err = parse_hierarchy(&mut octree, root_id, &buf, 0, 22, 8).unwrap_err();
        assert!(matches!(err, ReadHierarchyError::MaxDepthExceeded(8)));
    }

    #[test]
    fn zero_child_mask_is_a_true_leaf() {
        let buf = record(1, 0, 12, 0, 228);
        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, 22, 8).unwrap();

        assert_eq!(octree.len(), 1);
        assert_eq!(octree.root().kind, NodeKind::Leaf);
        assert!(octree.root().children.iter().all(Option::is_none));
    }

    #[test]
    fn zero_byte_size_clears_the_reported_point_count() {
        let buf = record(1, 0, 42, 0, 0);
        let mut octree = octree_with_root(8.0);
        let root_id = octree.root_id();
        parse_hierarchy(&mut octree, root_id, &buf, 0, 22, 8).unwrap();

        assert_eq!(octree.root().num_points, 0);
    }
}
