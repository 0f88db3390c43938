pub mod aabb;
pub mod node;

use slab::Slab;

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

/// Arena holding every node of a decoded octree. Parent/child relations are
/// [`NodeId`]s into this storage, never owning references.
#[derive(Clone, Debug)]
pub struct FlatOctree<T> {
    storage: Slab<T>,
    root_id: NodeId,
}

impl<T> FlatOctree<T>
where
    T: Default,
{
    pub fn new() -> Self {
        let mut storage = Slab::new();

        let root_node = T::default();
        let root_id = NodeId(storage.insert(root_node));

        Self { storage, root_id }
    }

    pub fn root(&self) -> &T {
        self.storage
            .get(self.root_id.0)
            .expect("root node not found - invariant broken")
    }

    pub(crate) fn root_mut(&mut self) -> &mut T {
        self.storage
            .get_mut(self.root_id.0)
            .expect("root node not found - invariant broken")
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn node(&self, node_id: NodeId) -> Option<&T> {
        self.storage.get(node_id.0)
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.storage.get_mut(node_id.0)
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.storage.reserve(additional);
    }

    pub(crate) fn insert(&mut self, node: T) -> NodeId {
        NodeId(self.storage.insert(node))
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl<T> Default for FlatOctree<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new()
    }
}
