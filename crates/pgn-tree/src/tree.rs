//! The move tree: an arena of nodes keyed by stable ids.
//!
//! Edges are ids, never references. Every structural operation validates its
//! arguments before touching anything, so a failed call leaves the tree as it
//! was. Cloning a tree yields an independent snapshot for undo/redo.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::oracle::{fen_fullmove, fen_turn, AppliedMove, Side, STANDARD_START_FEN};

/// Stable node identifier. Allocated from a counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Terminal result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
    #[serde(rename = "*")]
    Ongoing,
}

impl GameResult {
    pub fn from_pgn(text: &str) -> Option<GameResult> {
        match text {
            "1-0" => Some(GameResult::WhiteWins),
            "0-1" => Some(GameResult::BlackWins),
            "1/2-1/2" => Some(GameResult::Draw),
            "*" => Some(GameResult::Ongoing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Ongoing => "*",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTreeNode {
    pub id: NodeId,
    /// `None` only for the root.
    #[serde(rename = "move")]
    pub mv: Option<AppliedMove>,
    pub parent: Option<NodeId>,
    /// Index 0 is the main continuation at this point.
    pub children: Vec<NodeId>,
    pub san: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Position after this node's move.
    pub fen: String,
}

impl MoveTreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A root-to-leaf path, as listed by [`MoveTree::all_branches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    pub id: String,
    pub name: String,
    /// Path starting at the root.
    pub node_ids: Vec<NodeId>,
    pub is_main_line: bool,
    pub move_count: usize,
}

/// A child of some node, for "which moves were tried here" menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative<'a> {
    pub node_id: NodeId,
    pub san: &'a str,
    pub mv: Option<&'a AppliedMove>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMoveTree")]
pub struct MoveTree {
    nodes: BTreeMap<NodeId, MoveTreeNode>,
    root_id: NodeId,
    current_node_id: NodeId,
    main_line_ids: Vec<NodeId>,
    next_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<GameResult>,
}

/// Unchecked snapshot shape; becomes a [`MoveTree`] only after validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMoveTree {
    nodes: BTreeMap<NodeId, MoveTreeNode>,
    root_id: NodeId,
    current_node_id: NodeId,
    main_line_ids: Vec<NodeId>,
    next_id: u32,
    #[serde(default)]
    result: Option<GameResult>,
}

impl TryFrom<RawMoveTree> for MoveTree {
    type Error = TreeError;

    fn try_from(raw: RawMoveTree) -> Result<Self, Self::Error> {
        let invalid = TreeError::InvalidSnapshot;
        let nodes = &raw.nodes;

        let root = nodes
            .get(&raw.root_id)
            .ok_or_else(|| invalid(format!("root {} missing", raw.root_id)))?;
        if root.parent.is_some() || root.mv.is_some() {
            return Err(invalid(format!("root {} has a parent or a move", raw.root_id)));
        }
        if !nodes.contains_key(&raw.current_node_id) {
            return Err(invalid(format!("current node {} missing", raw.current_node_id)));
        }

        for (&key, node) in nodes {
            if key != node.id {
                return Err(invalid(format!("node stored under {key} claims id {}", node.id)));
            }
            if key != raw.root_id {
                let parent = node
                    .parent
                    .and_then(|p| nodes.get(&p))
                    .ok_or_else(|| invalid(format!("node {key} has no parent in the tree")))?;
                if !parent.children.contains(&key) {
                    return Err(invalid(format!("node {key} is not listed by its parent")));
                }
            }
            for child in &node.children {
                if nodes.get(child).and_then(|c| c.parent) != Some(key) {
                    return Err(invalid(format!("child {child} of {key} does not point back")));
                }
            }
        }

        // Every node reachable from the root exactly once.
        let mut seen = HashSet::new();
        let mut stack = vec![raw.root_id];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(invalid(format!("node {id} reached twice")));
            }
            stack.extend(nodes.get(&id).into_iter().flat_map(|n| n.children.iter().copied()));
        }
        if seen.len() != nodes.len() {
            return Err(invalid("nodes unreachable from the root".to_string()));
        }

        if raw.main_line_ids.first() != Some(&raw.root_id) {
            return Err(invalid("main line does not start at the root".to_string()));
        }
        for pair in raw.main_line_ids.windows(2) {
            let linked = nodes.get(&pair[1]).and_then(|n| n.parent) == Some(pair[0]);
            if !linked {
                let reason = format!("main line breaks between {} and {}", pair[0], pair[1]);
                return Err(invalid(reason));
            }
        }

        if let Some(max) = nodes.keys().next_back() {
            if raw.next_id <= max.get() {
                return Err(invalid(format!("next id {} is not above {max}", raw.next_id)));
            }
        }

        Ok(MoveTree {
            nodes: raw.nodes,
            root_id: raw.root_id,
            current_node_id: raw.current_node_id,
            main_line_ids: raw.main_line_ids,
            next_id: raw.next_id,
            result: raw.result,
        })
    }
}

impl Default for MoveTree {
    fn default() -> Self {
        MoveTree::new(STANDARD_START_FEN)
    }
}

impl MoveTree {
    /// A tree holding only the root at `initial_fen`.
    pub fn new(initial_fen: impl Into<String>) -> Self {
        let root_id = NodeId(0);
        let root = MoveTreeNode {
            id: root_id,
            mv: None,
            parent: None,
            children: Vec::new(),
            san: String::new(),
            comment: None,
            fen: initial_fen.into(),
        };

        let mut nodes = BTreeMap::new();
        nodes.insert(root_id, root);

        MoveTree {
            nodes,
            root_id,
            current_node_id: root_id,
            main_line_ids: vec![root_id],
            next_id: 1,
            result: None,
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn current_node_id(&self) -> NodeId {
        self.current_node_id
    }

    pub fn main_line_ids(&self) -> &[NodeId] {
        &self.main_line_ids
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, MoveTreeNode> {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&MoveTreeNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn root(&self) -> &MoveTreeNode {
        &self.nodes[&self.root_id]
    }

    pub fn current_node(&self) -> &MoveTreeNode {
        &self.nodes[&self.current_node_id]
    }

    pub fn initial_fen(&self) -> &str {
        &self.root().fen
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn set_result(&mut self, result: Option<GameResult>) {
        self.result = result;
    }

    fn get(&self, id: NodeId) -> Result<&MoveTreeNode, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    // ---------------------------------------------------------------------
    // Structural operations
    // ---------------------------------------------------------------------

    /// Append a move under `parent_id` and make it current.
    ///
    /// When `parent_id` is the last main-line node the new node extends the
    /// main line.
    pub fn add_move(
        &mut self,
        mv: AppliedMove,
        fen: impl Into<String>,
        parent_id: NodeId,
    ) -> Result<NodeId, TreeError> {
        if !self.nodes.contains_key(&parent_id) {
            return Err(TreeError::ParentNotFound(parent_id));
        }

        let id = self.allocate_id()?;

        let node = MoveTreeNode {
            id,
            san: mv.san.clone(),
            mv: Some(mv),
            parent: Some(parent_id),
            children: Vec::new(),
            comment: None,
            fen: fen.into(),
        };
        self.nodes.insert(id, node);
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.push(id);
        }

        if self.main_line_ids.last() == Some(&parent_id) {
            self.main_line_ids.push(id);
        }
        self.current_node_id = id;

        Ok(id)
    }

    /// Next unused id. Never hands out an id that is already in the tree.
    fn allocate_id(&mut self) -> Result<NodeId, TreeError> {
        let mut raw = self.next_id;
        while self.nodes.contains_key(&NodeId(raw)) {
            raw = raw.checked_add(1).ok_or(TreeError::IdsExhausted)?;
        }
        self.next_id = raw.checked_add(1).ok_or(TreeError::IdsExhausted)?;
        Ok(NodeId(raw))
    }

    pub fn go_to_node(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.get(id)?;
        self.current_node_id = id;
        Ok(())
    }

    /// Ids from (excluding) the root down to `id`.
    pub fn path_to_node(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = Vec::new();
        let mut cursor = self.get(id)?;
        while cursor.id != self.root_id {
            path.push(cursor.id);
            match cursor.parent {
                Some(parent) => cursor = self.get(parent)?,
                None => break,
            }
        }
        path.reverse();
        Ok(path)
    }

    /// The applied moves along [`path_to_node`](Self::path_to_node).
    pub fn moves_to_node(&self, id: NodeId) -> Result<Vec<&AppliedMove>, TreeError> {
        let path = self.path_to_node(id)?;
        Ok(path
            .iter()
            .filter_map(|id| self.nodes.get(id).and_then(|n| n.mv.as_ref()))
            .collect())
    }

    pub fn current_moves(&self) -> Vec<&AppliedMove> {
        self.moves_to_node(self.current_node_id).unwrap_or_default()
    }

    /// The main line first, then one entry per leaf off the main line, in
    /// creation order.
    pub fn all_branches(&self) -> Vec<BranchInfo> {
        let mut branches = vec![BranchInfo {
            id: "main".to_string(),
            name: "Main line".to_string(),
            node_ids: self.main_line_ids.clone(),
            is_main_line: true,
            move_count: self.main_line_ids.len().saturating_sub(1),
        }];

        let on_main_line: HashSet<NodeId> = self.main_line_ids.iter().copied().collect();
        let leaves = self
            .nodes
            .values()
            .filter(|n| n.is_leaf() && n.id != self.root_id && !on_main_line.contains(&n.id));

        for (index, leaf) in leaves.enumerate() {
            let Ok(path) = self.path_to_node(leaf.id) else {
                continue;
            };
            let mut node_ids = Vec::with_capacity(path.len() + 1);
            node_ids.push(self.root_id);
            node_ids.extend(&path);
            branches.push(BranchInfo {
                id: format!("branch_{}", index + 1),
                name: format!("Variation {}", index + 1),
                move_count: path.len(),
                node_ids,
                is_main_line: false,
            });
        }

        branches
    }

    /// Remove `id` and its whole subtree. Returns the removed ids.
    ///
    /// If the current node is removed, the deleted node's parent becomes
    /// current.
    pub fn delete_branch(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if id == self.root_id {
            return Err(TreeError::CannotDeleteRoot);
        }
        let parent_id = self.get(id)?.parent.unwrap_or(self.root_id);

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(&next) {
                stack.extend(node.children.iter().copied());
                removed.push(next);
            }
        }

        for gone in &removed {
            self.nodes.remove(gone);
        }
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|&child| child != id);
        }

        let removed_set: HashSet<NodeId> = removed.iter().copied().collect();
        self.main_line_ids.retain(|n| !removed_set.contains(n));
        if removed_set.contains(&self.current_node_id) {
            self.current_node_id = parent_id;
        }

        Ok(removed)
    }

    /// Make the path root → `id` the main line. Children order is untouched.
    pub fn promote_to_main_line(&mut self, id: NodeId) -> Result<(), TreeError> {
        let path = self.path_to_node(id)?;
        let mut main_line = Vec::with_capacity(path.len() + 1);
        main_line.push(self.root_id);
        main_line.extend(path);
        self.main_line_ids = main_line;
        Ok(())
    }

    /// Replace or clear a node's comment. Blank text clears it.
    pub fn set_comment(&mut self, id: NodeId, comment: Option<String>) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))?;
        node.comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(())
    }

    /// Append text to a node's comment, separated by a space.
    pub fn append_comment(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        match node.comment.as_mut() {
            Some(existing) if !existing.is_empty() => {
                existing.push(' ');
                existing.push_str(text);
            }
            _ => node.comment = Some(text.to_string()),
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// The child of `id` that continues the main line, else its first child.
    pub fn main_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        let next_on_main = self
            .main_line_ids
            .iter()
            .position(|&n| n == id)
            .and_then(|i| self.main_line_ids.get(i + 1))
            .filter(|next| node.children.contains(next));
        next_on_main.or_else(|| node.children.first()).copied()
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Moves available from the current node.
    pub fn alternatives(&self) -> Vec<Alternative<'_>> {
        self.current_node()
            .children
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|n| Alternative {
                node_id: n.id,
                san: &n.san,
                mv: n.mv.as_ref(),
            })
            .collect()
    }

    pub fn can_go_back(&self) -> bool {
        self.current_node().parent.is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.current_node().is_leaf()
    }

    /// Step to the parent. Returns false at the root.
    pub fn go_back(&mut self) -> bool {
        match self.current_node().parent {
            Some(parent) => {
                self.current_node_id = parent;
                true
            }
            None => false,
        }
    }

    /// Step to the main child. Returns false at a leaf.
    pub fn go_forward(&mut self) -> bool {
        match self.main_child(self.current_node_id) {
            Some(child) => {
                self.current_node_id = child;
                true
            }
            None => false,
        }
    }

    /// Child of `parent_id` whose move has the given coordinate form.
    pub fn find_child_by_uci(&self, parent_id: NodeId, uci: &str) -> Option<NodeId> {
        self.children_of(parent_id).iter().copied().find(|id| {
            self.nodes
                .get(id)
                .and_then(|n| n.mv.as_ref())
                .is_some_and(|mv| mv.uci == uci)
        })
    }

    // ---------------------------------------------------------------------
    // Move numbering
    // ---------------------------------------------------------------------

    /// Half-moves already played before the root position: 0 for the
    /// standard start, 1 when black is to move in move 1, and so on.
    ///
    /// Counted in `u64` so that any full-move number a FEN can carry fits.
    pub fn start_ply(&self) -> u64 {
        let fen = self.initial_fen();
        let offset = match fen_turn(fen) {
            Side::White => 0,
            Side::Black => 1,
        };
        (u64::from(fen_fullmove(fen)) - 1) * 2 + offset
    }

    /// Number of move-bearing nodes from the root down to `id`, inclusive.
    pub fn depth(&self, id: NodeId) -> Result<u32, TreeError> {
        let path = self.path_to_node(id)?;
        Ok(path
            .iter()
            .filter(|n| self.nodes.get(*n).is_some_and(|node| node.mv.is_some()))
            .count() as u32)
    }

    /// Move number shown before `id`'s move.
    pub fn move_number(&self, id: NodeId) -> Result<u64, TreeError> {
        let ply = self.start_ply() + u64::from(self.depth(id)?);
        Ok(ply.div_ceil(2))
    }

    /// Whether `id`'s move was made by white.
    pub fn is_white_move(&self, id: NodeId) -> Result<bool, TreeError> {
        let ply = self.start_ply() + u64::from(self.depth(id)?);
        Ok(ply % 2 == 1)
    }
}
