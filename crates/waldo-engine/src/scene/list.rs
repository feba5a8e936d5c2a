use super::{DrawCmd, SortKey, Tag, ZIndex};

/// A single retained item: sort key + tag + command.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub key: SortKey,
    pub tag: Tag,
    pub cmd: DrawCmd,
}

/// Retained draw stream, kept across frames.
///
/// Items stay on the canvas until their tag is deleted, so a frame only
/// records what changed: a new marker is one `push`, a new base frame is a
/// `delete_tagged` followed by a `push`.
///
/// Performance characteristics:
/// - `push()` is O(1)
/// - paint-order iteration reuses an internal index buffer; re-sorting only
///   happens after the item set changed
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
    next_order: u32,

    sorted_indices: Vec<usize>,
    sorted_dirty: bool,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pushes a draw command under `tag` with the given z-index.
    #[inline]
    pub fn push(&mut self, z: ZIndex, tag: Tag, cmd: DrawCmd) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);

        self.items.push(DrawItem {
            key: SortKey::new(z, order),
            tag,
            cmd,
        });

        self.sorted_dirty = true;
    }

    /// Deletes every item carrying `tag` and returns how many were removed.
    pub fn delete_tagged(&mut self, tag: Tag) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.tag != tag);

        let removed = before - self.items.len();
        if removed > 0 {
            self.sorted_dirty = true;
        }
        removed
    }

    /// Iterates the items carrying `tag`, in insertion order.
    pub fn tagged(&self, tag: Tag) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(move |item| item.tag == tag)
    }

    /// Items in paint order (back-to-front).
    ///
    /// The sorted index buffer is owned by `DrawList` and reused across frames.
    pub fn iter_in_paint_order(&mut self) -> impl Iterator<Item = &DrawItem> {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }

        self.sorted_indices.iter().map(|&i| &self.items[i])
    }

    fn rebuild_sorted_indices(&mut self) {
        self.sorted_indices.clear();
        self.sorted_indices.extend(0..self.items.len());

        // Stable ordering is ensured by SortKey including insertion order.
        self.sorted_indices
            .sort_by(|&a, &b| self.items[a].key.cmp(&self.items[b].key));

        self.sorted_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::paint::Color;

    const A: Tag = Tag("a");
    const B: Tag = Tag("b");

    fn line_at(x: f32) -> DrawCmd {
        DrawCmd::Line(crate::scene::shapes::line::LineCmd::new(
            Vec2::new(x, 0.0),
            Vec2::new(x, 1.0),
            1.0,
            Color::red(),
        ))
    }

    fn xs_in_paint_order(list: &mut DrawList) -> Vec<f32> {
        list.iter_in_paint_order()
            .map(|item| match &item.cmd {
                DrawCmd::Line(l) => l.from.x,
                _ => f32::NAN,
            })
            .collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn higher_z_paints_last() {
        let mut list = DrawList::new();
        list.push(ZIndex::new(1), A, line_at(1.0));
        list.push(ZIndex::new(0), A, line_at(0.0));
        assert_eq!(xs_in_paint_order(&mut list), vec![0.0, 1.0]);
    }

    #[test]
    fn equal_z_keeps_insertion_order() {
        let mut list = DrawList::new();
        for x in [3.0, 1.0, 2.0] {
            list.push(ZIndex::new(0), A, line_at(x));
        }
        assert_eq!(xs_in_paint_order(&mut list), vec![3.0, 1.0, 2.0]);
    }

    // ── tags ──────────────────────────────────────────────────────────────

    #[test]
    fn delete_tagged_only_removes_that_tag() {
        let mut list = DrawList::new();
        list.push(ZIndex::new(0), A, line_at(0.0));
        list.push(ZIndex::new(0), B, line_at(1.0));
        list.push(ZIndex::new(0), A, line_at(2.0));

        assert_eq!(list.delete_tagged(A), 2);
        assert_eq!(list.tagged(A).count(), 0);
        assert_eq!(list.tagged(B).count(), 1);
        assert_eq!(xs_in_paint_order(&mut list), vec![1.0]);
    }

    #[test]
    fn delete_missing_tag_is_a_no_op() {
        let mut list = DrawList::new();
        list.push(ZIndex::new(0), A, line_at(0.0));
        assert_eq!(list.delete_tagged(B), 0);
        assert_eq!(list.items().len(), 1);
    }
}
