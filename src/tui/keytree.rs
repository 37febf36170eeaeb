//! Hierarchical key browser model.
//!
//! Keys are split on a delimiter into folders and a final leaf. Nodes live
//! in an arena and refer to their parent by index; the tree is rebuilt from
//! the record list whenever the records or the filter change. Expansion
//! state survives rebuilds because collapsed folders are remembered by path.

use std::collections::{HashMap, HashSet};

use crossterm::event::{KeyCode, KeyEvent};
use memtui_core::KeyRecord;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The root folder is always node 0.
const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Folder { expanded: bool, children: Vec<NodeId> },
    /// Index into [`KeyTree::records`]
    Leaf { record: usize },
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub parent: Option<NodeId>,
    /// Folder prefix for folders, full key for leaves
    pub path: String,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { expanded: true, .. })
    }
}

/// One visible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatEntry {
    pub node: NodeId,
    pub depth: usize,
}

/// Result of a key press on the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    /// Enter on a leaf
    KeySelected(KeyRecord),
    /// Cursor, expansion or selection changed
    Changed,
    Ignored,
}

/// Cursor position to restore after a rebuild.
struct Anchor {
    path: String,
    is_folder: bool,
    ancestors: Vec<String>,
}

#[derive(Debug)]
pub struct KeyTree {
    delimiter: String,
    records: Vec<KeyRecord>,
    nodes: Vec<TreeNode>,
    flat: Vec<FlatEntry>,
    filter: String,
    collapsed: HashSet<String>,
    selection: HashSet<String>,
    multi_select: bool,
    cursor: usize,
    offset: usize,
    height: usize,
}

impl KeyTree {
    pub fn new(delimiter: impl Into<String>) -> Self {
        let mut tree = Self {
            delimiter: delimiter.into(),
            records: Vec::new(),
            nodes: Vec::new(),
            flat: Vec::new(),
            filter: String::new(),
            collapsed: HashSet::new(),
            selection: HashSet::new(),
            multi_select: false,
            cursor: 0,
            offset: 0,
            height: 1,
        };
        tree.build();
        tree
    }

    /// Replace the record list (a reload). Duplicate keys keep their first
    /// record. Selected keys that no longer exist are dropped.
    pub fn set_records(&mut self, records: Vec<KeyRecord>) {
        let anchor = self.anchor();
        let mut seen = HashSet::with_capacity(records.len());
        self.records = records
            .into_iter()
            .filter(|r| seen.insert(r.key.clone()))
            .collect();
        self.selection.retain(|key| seen.contains(key));
        if self.selection.is_empty() {
            self.multi_select = false;
        }
        self.rebuild(anchor);
    }

    /// Case-sensitive substring filter on the full key. Empty shows all.
    pub fn set_filter(&mut self, pattern: &str) {
        if pattern == self.filter {
            return;
        }
        let anchor = self.anchor();
        self.filter = pattern.to_string();
        self.rebuild(anchor);
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn records(&self) -> &[KeyRecord] {
        &self.records
    }

    /// Keys matching the current filter, in record order.
    pub fn filtered_keys(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.key.contains(self.filter.as_str()))
            .map(|r| r.key.as_str())
            .collect()
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Folder { children, .. } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    /// Record behind a leaf.
    pub fn record(&self, id: NodeId) -> Option<&KeyRecord> {
        match self.nodes[id.0].kind {
            NodeKind::Leaf { record } => self.records.get(record),
            NodeKind::Folder { .. } => None,
        }
    }

    pub fn flattened(&self) -> &[FlatEntry] {
        &self.flat
    }

    pub fn visible_len(&self) -> usize {
        self.flat.len()
    }

    /// Number of leaves in the tree (after filtering).
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf { .. }))
            .count()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Rows currently in view.
    pub fn visible_rows(&self) -> &[FlatEntry] {
        let end = (self.offset + self.height).min(self.flat.len());
        &self.flat[self.offset.min(end)..end]
    }

    /// Node under the cursor.
    pub fn current(&self) -> Option<&TreeNode> {
        self.flat.get(self.cursor).map(|e| self.node(e.node))
    }

    /// Record under the cursor, if it is a leaf.
    pub fn current_record(&self) -> Option<&KeyRecord> {
        self.flat.get(self.cursor).and_then(|e| self.record(e.node))
    }

    // ── Viewport ───────────────────────────────────────────────────────────

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.scroll_to_cursor();
    }

    fn scroll_to_cursor(&mut self) {
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        let max_offset = self.flat.len().saturating_sub(self.height);
        self.offset = self.offset.min(max_offset).min(self.cursor);
    }

    fn move_to(&mut self, index: usize) {
        self.cursor = index.min(self.flat.len().saturating_sub(1));
        self.scroll_to_cursor();
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    /// Key list bindings: arrows (and `j`/`k`/`h`/`l`), paging, Enter, Space.
    pub fn handle_key(&mut self, key: KeyEvent) -> TreeEvent {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.up(),
            KeyCode::Down | KeyCode::Char('j') => self.down(),
            KeyCode::Left | KeyCode::Char('h') => self.left(),
            KeyCode::Right | KeyCode::Char('l') => self.right(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::Home => self.home(),
            KeyCode::End => self.end(),
            KeyCode::Enter => {
                if let Some(record) = self.enter() {
                    return TreeEvent::KeySelected(record);
                }
            }
            KeyCode::Char(' ') => {
                if !self.toggle_selection() {
                    return TreeEvent::Ignored;
                }
            }
            _ => return TreeEvent::Ignored,
        }
        TreeEvent::Changed
    }

    pub fn up(&mut self) {
        self.move_to(self.cursor.saturating_sub(1));
    }

    pub fn down(&mut self) {
        self.move_to(self.cursor.saturating_add(1));
    }

    pub fn page_up(&mut self) {
        self.move_to(self.cursor.saturating_sub(self.height));
    }

    pub fn page_down(&mut self) {
        self.move_to(self.cursor.saturating_add(self.height));
    }

    pub fn home(&mut self) {
        self.move_to(0);
    }

    pub fn end(&mut self) {
        self.move_to(self.flat.len().saturating_sub(1));
    }

    /// Collapse an expanded folder, otherwise jump to the parent folder.
    pub fn left(&mut self) {
        let Some(entry) = self.flat.get(self.cursor).copied() else {
            return;
        };
        let node = self.node(entry.node);
        if node.is_expanded() {
            self.set_expanded(entry.node, false);
            return;
        }
        if let Some(parent) = node.parent.filter(|p| *p != ROOT) {
            if let Some(index) = self.flat.iter().position(|e| e.node == parent) {
                self.move_to(index);
            }
        }
    }

    /// Expand a collapsed folder.
    pub fn right(&mut self) {
        let Some(entry) = self.flat.get(self.cursor).copied() else {
            return;
        };
        let node = self.node(entry.node);
        if node.is_folder() && !node.is_expanded() {
            self.set_expanded(entry.node, true);
        }
    }

    /// Leaf: returns its record. Folder: toggles expansion.
    pub fn enter(&mut self) -> Option<KeyRecord> {
        let entry = self.flat.get(self.cursor).copied()?;
        if self.node(entry.node).is_folder() {
            let expanded = self.node(entry.node).is_expanded();
            self.set_expanded(entry.node, !expanded);
            return None;
        }
        self.record(entry.node).cloned()
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
        for node in &mut self.nodes {
            if let NodeKind::Folder { expanded, .. } = &mut node.kind {
                *expanded = true;
            }
        }
        self.reflatten_keeping(self.flat.get(self.cursor).map(|e| e.node));
    }

    pub fn collapse_all(&mut self) {
        let keep = self.flat.get(self.cursor).map(|e| e.node);
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if index == ROOT.0 {
                continue;
            }
            if let NodeKind::Folder { expanded, .. } = &mut node.kind {
                *expanded = false;
                self.collapsed.insert(node.path.clone());
            }
        }
        self.reflatten_keeping(keep);
    }

    fn set_expanded(&mut self, id: NodeId, value: bool) {
        let node = &mut self.nodes[id.0];
        if let NodeKind::Folder { expanded, .. } = &mut node.kind {
            *expanded = value;
            if value {
                self.collapsed.remove(&node.path);
            } else {
                self.collapsed.insert(node.path.clone());
            }
        }
        self.reflatten_keeping(Some(id));
    }

    // ── Selection ──────────────────────────────────────────────────────────

    /// Toggle the leaf under the cursor. Folders are ignored.
    pub fn toggle_selection(&mut self) -> bool {
        let Some(key) = self.current_record().map(|r| r.key.clone()) else {
            return false;
        };
        if !self.selection.remove(&key) {
            self.selection.insert(key);
        }
        self.multi_select = !self.selection.is_empty();
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.multi_select = false;
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn multi_select(&self) -> bool {
        self.multi_select
    }

    /// Selected keys in record order, including ones hidden by the filter.
    pub fn selected_keys(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| self.selection.contains(&r.key))
            .map(|r| r.key.clone())
            .collect()
    }

    /// Drop keys from the selection, e.g. after they were deleted.
    pub fn deselect<'a>(&mut self, keys: impl IntoIterator<Item = &'a String>) {
        for key in keys {
            self.selection.remove(key);
        }
        if self.selection.is_empty() {
            self.multi_select = false;
        }
    }

    // ── Building ───────────────────────────────────────────────────────────

    fn build(&mut self) {
        self.nodes.clear();
        self.nodes.push(TreeNode {
            name: "root".to_string(),
            parent: None,
            path: String::new(),
            kind: NodeKind::Folder {
                expanded: true,
                children: Vec::new(),
            },
        });

        // folders and leaves share one namespace per parent
        let mut siblings: HashMap<(NodeId, String), NodeId> = HashMap::new();

        for (index, record) in self.records.iter().enumerate() {
            if !record.key.contains(self.filter.as_str()) {
                continue;
            }

            let parts: Vec<&str> = if self.delimiter.is_empty() {
                vec![record.key.as_str()]
            } else {
                record.key.split(self.delimiter.as_str()).collect()
            };
            let Some((leaf_name, folder_parts)) = parts.split_last() else {
                continue;
            };

            let mut parent = ROOT;
            let mut path = String::new();
            for (depth, part) in folder_parts.iter().enumerate() {
                if depth > 0 {
                    path.push_str(&self.delimiter);
                }
                path.push_str(part);
                let existing = siblings.get(&(parent, part.to_string())).copied();
                let id = match existing {
                    Some(id) if self.nodes[id.0].is_folder() => id,
                    _ => {
                        if let Some(leaf) = existing {
                            let alias = leaf_alias(part);
                            self.nodes[leaf.0].name = alias.clone();
                            siblings.insert((parent, alias), leaf);
                        }
                        let id = NodeId(self.nodes.len());
                        self.nodes.push(TreeNode {
                            name: part.to_string(),
                            parent: Some(parent),
                            path: path.clone(),
                            kind: NodeKind::Folder {
                                expanded: !self.collapsed.contains(&path),
                                children: Vec::new(),
                            },
                        });
                        push_child(&mut self.nodes, parent, id);
                        siblings.insert((parent, part.to_string()), id);
                        id
                    }
                };
                parent = id;
            }

            let mut name = leaf_name.to_string();
            if let Some(existing) = siblings.get(&(parent, name.clone())) {
                if !self.nodes[existing.0].is_folder() {
                    continue;
                }
                name = leaf_alias(leaf_name);
                if siblings.contains_key(&(parent, name.clone())) {
                    continue;
                }
            }
            let id = NodeId(self.nodes.len());
            self.nodes.push(TreeNode {
                name: name.clone(),
                parent: Some(parent),
                path: record.key.clone(),
                kind: NodeKind::Leaf { record: index },
            });
            push_child(&mut self.nodes, parent, id);
            siblings.insert((parent, name), id);
        }

        self.flatten();
    }

    fn flatten(&mut self) {
        let mut flat = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<FlatEntry> = self
            .children(ROOT)
            .iter()
            .rev()
            .map(|&node| FlatEntry { node, depth: 0 })
            .collect();

        while let Some(entry) = stack.pop() {
            flat.push(entry);
            if let NodeKind::Folder {
                expanded: true,
                children,
            } = &self.nodes[entry.node.0].kind
            {
                stack.extend(children.iter().rev().map(|&node| FlatEntry {
                    node,
                    depth: entry.depth + 1,
                }));
            }
        }
        self.flat = flat;
    }

    /// Reflatten after an expansion change; the cursor follows `keep` or its
    /// nearest visible ancestor.
    fn reflatten_keeping(&mut self, keep: Option<NodeId>) {
        self.flatten();
        let mut candidate = keep;
        while let Some(id) = candidate {
            if let Some(index) = self.flat.iter().position(|e| e.node == id) {
                self.move_to(index);
                return;
            }
            candidate = self.node(id).parent;
        }
        self.move_to(self.cursor);
    }

    fn anchor(&self) -> Option<Anchor> {
        let entry = self.flat.get(self.cursor)?;
        let node = self.node(entry.node);
        let mut ancestors = Vec::new();
        let mut parent = node.parent;
        while let Some(id) = parent.filter(|p| *p != ROOT) {
            ancestors.push(self.node(id).path.clone());
            parent = self.node(id).parent;
        }
        Some(Anchor {
            path: node.path.clone(),
            is_folder: node.is_folder(),
            ancestors,
        })
    }

    fn rebuild(&mut self, anchor: Option<Anchor>) {
        self.build();
        let index = anchor.and_then(|a| {
            self.position_of(&a.path, a.is_folder).or_else(|| {
                a.ancestors
                    .iter()
                    .find_map(|path| self.position_of(path, true))
            })
        });
        match index {
            Some(index) => self.move_to(index),
            None => self.move_to(self.cursor),
        }
    }

    fn position_of(&self, path: &str, is_folder: bool) -> Option<usize> {
        self.flat.iter().position(|e| {
            let node = self.node(e.node);
            node.path == path && node.is_folder() == is_folder
        })
    }
}

/// Name shown for a key that ends where a sibling folder of the same name
/// begins. Keys never contain spaces, so no real segment can match it.
fn leaf_alias(name: &str) -> String {
    format!("{} (key)", name)
}

fn push_child(nodes: &mut [TreeNode], parent: NodeId, child: NodeId) {
    if let NodeKind::Folder { children, .. } = &mut nodes[parent.0].kind {
        children.push(child);
    }
}
