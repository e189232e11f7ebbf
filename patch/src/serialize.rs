//! Binary encoding of a patch.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! u32 version
//! u8  flags              bit 0: merges adjacent changes
//! u32 change count
//! node*                  pre-order
//!
//! node:
//!   u8    flags          bit 0: left child, bit 1: right child,
//!                        bit 2: old text, bit 3: new text
//!   point gap, old extent, new extent
//!   u32   old text size, new text size
//!   text? old text, new text
//! ```
//!
//! Subtree aggregates are not stored; they are rebuilt on load.

use crate::{
    node::{Node, NodeId},
    Patch,
};
use patchwork_text::{
    CorruptSnafu, Deserializer, Point, Result, Serializer, Text, UnsupportedVersionSnafu,
};
use smallvec::{smallvec, SmallVec};

pub const SERIALIZATION_VERSION: u32 = 1;

const MERGES_ADJACENT_CHANGES: u8 = 1;

const HAS_LEFT: u8 = 1;
const HAS_RIGHT: u8 = 1 << 1;
const HAS_OLD_TEXT: u8 = 1 << 2;
const HAS_NEW_TEXT: u8 = 1 << 3;

/// Smallest encoded node: flags, three points and two sizes.
const MIN_NODE_SIZE: usize = 1 + 3 * 8 + 2 * 4;

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Patch {
    pub fn serialize(&self, output: &mut Serializer<'_>) {
        output.append_u32(SERIALIZATION_VERSION);
        output.append_u8(if self.merges_adjacent_changes {
            MERGES_ADJACENT_CHANGES
        } else {
            0
        });
        output.append_u32(self.change_count);

        let mut stack: SmallVec<[NodeId; 32]> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            let mut flags = 0;
            if node.left.is_some() {
                flags |= HAS_LEFT;
            }
            if node.right.is_some() {
                flags |= HAS_RIGHT;
            }
            if node.old_text.is_some() {
                flags |= HAS_OLD_TEXT;
            }
            if node.new_text.is_some() {
                flags |= HAS_NEW_TEXT;
            }
            output.append_u8(flags);
            node.gap.serialize(output);
            node.old_extent.serialize(output);
            node.new_extent.serialize(output);
            output.append_u32(node.old_text_size);
            output.append_u32(node.new_text_size);
            if let Some(text) = &node.old_text {
                text.serialize(output);
            }
            if let Some(text) = &node.new_text {
                text.serialize(output);
            }

            if let Some(right) = node.right {
                stack.push(right);
            }
            if let Some(left) = node.left {
                stack.push(left);
            }
        }
    }

    /// Convenience wrapper around [`Patch::serialize`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.serialize(&mut Serializer::new(&mut bytes));
        bytes
    }

    pub fn deserialize(input: &mut Deserializer<'_>) -> Result<Patch> {
        let version = input.read_u32()?;
        if version != SERIALIZATION_VERSION {
            return UnsupportedVersionSnafu {
                found: version,
                expected: SERIALIZATION_VERSION,
            }
            .fail();
        }
        let flags = input.read_u8()?;
        let change_count = input.read_u32()?;

        let mut patch = Patch::new(flags & MERGES_ADJACENT_CHANGES != 0);
        let mut order = Vec::with_capacity((change_count as usize).min(input.remaining() / MIN_NODE_SIZE));
        // Child slots still waiting for a node; `None` is the root slot.
        let mut pending: SmallVec<[(Option<NodeId>, Side); 32]> = smallvec![(None, Side::Left)];

        for _ in 0..change_count {
            let Some((parent, side)) = pending.pop() else {
                return CorruptSnafu {
                    message: "more nodes than tree slots",
                }
                .fail();
            };

            let node_flags = input.read_u8()?;
            let gap = Point::deserialize(input)?;
            let old_extent = Point::deserialize(input)?;
            let new_extent = Point::deserialize(input)?;
            let old_text_size = input.read_u32()?;
            let new_text_size = input.read_u32()?;
            let old_text = read_text(input, node_flags & HAS_OLD_TEXT != 0, old_extent, old_text_size)?;
            let new_text = read_text(input, node_flags & HAS_NEW_TEXT != 0, new_extent, new_text_size)?;

            let id = patch.arena.alloc(Node::new(
                gap,
                old_extent,
                new_extent,
                old_text,
                new_text,
                old_text_size,
                new_text_size,
            ));
            match parent {
                None => patch.root = Some(id),
                Some(parent) => {
                    match side {
                        Side::Left => patch.arena[parent].left = Some(id),
                        Side::Right => patch.arena[parent].right = Some(id),
                    }
                    patch.arena[id].parent = Some(parent);
                },
            }

            if node_flags & HAS_RIGHT != 0 {
                pending.push((Some(id), Side::Right));
            }
            if node_flags & HAS_LEFT != 0 {
                pending.push((Some(id), Side::Left));
            }
            order.push(id);
        }

        if change_count > 0 && !pending.is_empty() {
            return CorruptSnafu {
                message: format!("{} tree slots left without a node", pending.len()),
            }
            .fail();
        }

        // Children follow their parent in pre-order.
        for &id in order.iter().rev() {
            check_subtree_text_sizes(&patch, id)?;
            patch.update(id);
        }
        patch.change_count = change_count;
        Ok(patch)
    }

    /// Convenience wrapper around [`Patch::deserialize`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Patch> {
        Patch::deserialize(&mut Deserializer::new(bytes))
    }
}

/// Fails when the text sizes under `id` do not fit the `u32` aggregates.
/// Children must already be updated.
fn check_subtree_text_sizes(patch: &Patch, id: NodeId) -> Result<()> {
    let node = &patch.arena[id];
    let mut old = Some(node.old_text_size);
    let mut new = Some(node.new_text_size);
    for child in [node.left, node.right].into_iter().flatten() {
        let child = &patch.arena[child];
        old = old.and_then(|size| size.checked_add(child.old_subtree_text_size));
        new = new.and_then(|size| size.checked_add(child.new_subtree_text_size));
    }
    if old.is_none() || new.is_none() {
        return CorruptSnafu {
            message: "text sizes overflow",
        }
        .fail();
    }
    Ok(())
}

fn read_text(
    input: &mut Deserializer<'_>,
    present: bool,
    extent: Point,
    size: u32,
) -> Result<Option<Text>> {
    if !present {
        return Ok(None);
    }
    let text = Text::deserialize(input)?;
    if text.extent() != extent || text.size() != size {
        return CorruptSnafu {
            message: format!(
                "text of extent {} and size {} stored for extent {} and size {}",
                text.extent(),
                text.size(),
                extent,
                size
            ),
        }
        .fail();
    }
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_text::DeserializeError;

    fn sample() -> Patch {
        let mut patch = Patch::new(false);
        for (row, inserted) in [(0, "one"), (1, "two\nlines"), (5, "three")] {
            let inserted = Text::from(inserted);
            patch.splice(
                Point::new(row, 0),
                Point::zero(),
                inserted.extent(),
                Some(Text::new()),
                Some(inserted),
                0,
            );
        }
        patch.splice(Point::new(8, 0), Point::new(0, 3), Point::zero(), None, None, 3);
        patch
    }

    #[test]
    fn round_trip_preserves_changes_and_flags() {
        let patch = sample();
        let bytes = patch.to_bytes();
        let restored = Patch::from_bytes(&bytes).unwrap();
        assert!(!restored.merges_adjacent_changes());
        assert_eq!(restored.get_change_count(), patch.get_change_count());
        assert_eq!(restored.get_changes(), patch.get_changes());
        assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn empty_patch_round_trips() {
        let restored = Patch::from_bytes(&Patch::default().to_bytes()).unwrap();
        assert!(restored.is_empty());
        assert!(restored.merges_adjacent_changes());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = sample().to_bytes();
        bytes[0] = 7;
        assert_eq!(
            Patch::from_bytes(&bytes).unwrap_err(),
            DeserializeError::UnsupportedVersion {
                found: 7,
                expected: SERIALIZATION_VERSION
            }
        );
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = sample().to_bytes();
        for len in [0, 3, 9] {
            assert!(
                matches!(
                    Patch::from_bytes(&bytes[..len]),
                    Err(DeserializeError::UnexpectedEof { .. })
                ),
                "length {len}"
            );
        }
        assert!(Patch::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn rejects_text_sizes_that_overflow() {
        let mut patch = Patch::new(false);
        patch.splice(Point::new(0, 0), Point::new(0, 3), Point::zero(), None, None, 3);
        patch.splice(Point::new(1, 0), Point::new(0, 3), Point::zero(), None, None, 3);
        let mut bytes = patch.to_bytes();

        // Header, then per node: flags, three points, old size, new size.
        let header = 4 + 1 + 4;
        for node in 0..2 {
            let old_size = header + node * MIN_NODE_SIZE + 1 + 3 * 8;
            bytes[old_size..old_size + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        }
        assert!(matches!(
            Patch::from_bytes(&bytes),
            Err(DeserializeError::Corrupt { .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_node_count() {
        let mut bytes = sample().to_bytes();
        // Claim one node fewer than the tree shape describes.
        bytes[5] -= 1;
        assert!(matches!(
            Patch::from_bytes(&bytes),
            Err(DeserializeError::Corrupt { .. })
        ));
    }
}
