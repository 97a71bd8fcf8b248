//! Name-keyed lookup table for passes and resources within one population

use crate::graph::NodeId;
use std::collections::HashMap;

/// Registry mapping human-readable names to graph nodes.
///
/// Re-using a name overwrites the previous entry (last writer wins); the
/// collision is logged because two nodes silently aliasing one name is almost
/// always a caller bug.
#[derive(Default)]
pub struct Blackboard {
    named_textures: HashMap<String, NodeId>,
    named_buffers: HashMap<String, NodeId>,
    named_passes: HashMap<String, NodeId>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_texture(&mut self, name: &str, node: NodeId) {
        if let Some(prev) = self.named_textures.insert(name.to_string(), node) {
            log::warn!("blackboard texture name `{name}` overwritten (was {prev:?}, now {node:?})");
        }
    }

    pub fn add_buffer(&mut self, name: &str, node: NodeId) {
        if let Some(prev) = self.named_buffers.insert(name.to_string(), node) {
            log::warn!("blackboard buffer name `{name}` overwritten (was {prev:?}, now {node:?})");
        }
    }

    pub fn add_pass(&mut self, name: &str, node: NodeId) {
        if let Some(prev) = self.named_passes.insert(name.to_string(), node) {
            log::warn!("blackboard pass name `{name}` overwritten (was {prev:?}, now {node:?})");
        }
    }

    pub fn texture(&self, name: &str) -> Option<NodeId> {
        self.named_textures.get(name).copied()
    }

    pub fn buffer(&self, name: &str) -> Option<NodeId> {
        self.named_buffers.get(name).copied()
    }

    pub fn pass(&self, name: &str) -> Option<NodeId> {
        self.named_passes.get(name).copied()
    }

    pub fn clear(&mut self) {
        self.named_textures.clear();
        self.named_buffers.clear();
        self.named_passes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let mut blackboard = Blackboard::new();
        blackboard.add_texture("gbuffer", NodeId(0));
        blackboard.add_pass("lighting", NodeId(1));
        assert_eq!(blackboard.texture("gbuffer"), Some(NodeId(0)));
        assert_eq!(blackboard.pass("lighting"), Some(NodeId(1)));
        assert_eq!(blackboard.buffer("gbuffer"), None);
    }

    #[test]
    fn duplicate_name_overwrites() {
        let mut blackboard = Blackboard::new();
        blackboard.add_texture("target", NodeId(0));
        blackboard.add_texture("target", NodeId(5));
        assert_eq!(blackboard.texture("target"), Some(NodeId(5)));
    }
}
