/// Bounded grid A*
///
/// Nodes live in a flat pool that is reused between searches. The pool is
/// both the open and the closed list: a node is open until its `closed`
/// flag is set, and parents are pool indices.
///
/// The traversability callback decides which cells may be entered and
/// supplies their `h` cost in the same call. `None` means blocked. Callers
/// that return Manhattan distance to the goal get a consistent heuristic;
/// inflated costs still find a path but lose the optimality guarantee.
///
/// Movement is 4-neighbour with unit step cost. Running out of the node
/// budget is a failure exactly like an exhausted open set: the search
/// stops once an expansion leaves the node list at `max_nodes`, even when
/// the goal was the last node added.

use crate::config::pathfinding as path_config;
use crate::error::PathError;
use crate::utility::{manhattan, GridPos2};

// ============================================================================
// PATH NODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNode {
    pub pos: GridPos2,
    pub g: u32,
    pub h: u32,
    pub f: u32,
    /// Index of the parent in the node pool
    pub parent: Option<usize>,
    pub closed: bool,
}

// ============================================================================
// PATHFINDER
// ============================================================================

pub struct Pathfinder {
    nodes: Vec<PathNode>,
    max_nodes: usize,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new(path_config::MAX_NODES)
    }
}

impl Pathfinder {
    /// Pool sized for `max_nodes`; searches with a larger budget grow it once
    pub fn new(max_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(max_nodes),
            max_nodes,
        }
    }

    /// Default node budget for this pathfinder
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Nodes touched by the last search
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Run a search and return the pool index of the goal node
    pub fn find_path<F>(
        &mut self,
        start: GridPos2,
        goal: GridPos2,
        max_nodes: usize,
        mut traversable: F,
    ) -> Result<usize, PathError>
    where
        F: FnMut(GridPos2) -> Option<u32>,
    {
        self.nodes.clear();
        if max_nodes == 0 {
            return Err(PathError::BudgetExhausted { max_nodes });
        }
        self.nodes.reserve(max_nodes);

        let h = manhattan(start, goal);
        self.nodes.push(PathNode {
            pos: start,
            g: 0,
            h,
            f: h,
            parent: None,
            closed: false,
        });

        loop {
            let Some(current) = self.lowest_open() else {
                debug_log!("A* from {} to {}: open set exhausted", start, goal);
                return Err(PathError::NoPath);
            };

            let node = self.nodes[current];
            if node.pos == goal {
                return Ok(current);
            }
            self.nodes[current].closed = true;

            for neighbor in node.pos.neighbors4() {
                if self.nodes.iter().any(|n| n.pos == neighbor) {
                    continue;
                }
                let Some(h) = traversable(neighbor) else {
                    continue;
                };
                if self.nodes.len() >= max_nodes {
                    tracing::debug!(%start, %goal, max_nodes, "A* node budget exhausted");
                    return Err(PathError::BudgetExhausted { max_nodes });
                }
                let g = node.g + 1;
                self.nodes.push(PathNode {
                    pos: neighbor,
                    g,
                    h,
                    f: g + h,
                    parent: Some(current),
                    closed: false,
                });
            }

            if self.nodes.len() >= max_nodes {
                tracing::debug!(%start, %goal, max_nodes, "A* node budget exhausted");
                return Err(PathError::BudgetExhausted { max_nodes });
            }
        }
    }

    /// First step from `start` toward `goal`, or the zero vector when no
    /// path exists (or `start == goal`)
    pub fn move_direction<F>(
        &mut self,
        start: GridPos2,
        goal: GridPos2,
        max_nodes: usize,
        traversable: F,
    ) -> GridPos2
    where
        F: FnMut(GridPos2) -> Option<u32>,
    {
        let Ok(mut index) = self.find_path(start, goal, max_nodes, traversable) else {
            return GridPos2::ZERO;
        };
        // Walk back to the node whose parent is the start
        while let Some(parent) = self.nodes[index].parent {
            if self.nodes[parent].parent.is_none() {
                break;
            }
            index = parent;
        }
        start.delta_to(self.nodes[index].pos)
    }

    pub fn is_path_available<F>(
        &mut self,
        start: GridPos2,
        goal: GridPos2,
        max_nodes: usize,
        traversable: F,
    ) -> bool
    where
        F: FnMut(GridPos2) -> Option<u32>,
    {
        self.find_path(start, goal, max_nodes, traversable).is_ok()
    }

    /// Write the path into `out`, start first and goal last, endpoints
    /// included. Returns the number of positions written. A path longer
    /// than `out` keeps its first `out.len()` steps and logs a warning.
    pub fn full_path<F>(
        &mut self,
        start: GridPos2,
        goal: GridPos2,
        max_nodes: usize,
        traversable: F,
        out: &mut [GridPos2],
    ) -> Result<usize, PathError>
    where
        F: FnMut(GridPos2) -> Option<u32>,
    {
        let terminal = self.find_path(start, goal, max_nodes, traversable)?;

        let mut length = 0usize;
        let mut cursor = Some(terminal);
        while let Some(index) = cursor {
            length += 1;
            cursor = self.nodes[index].parent;
        }

        if length > out.len() {
            tracing::warn!(length, buffer = out.len(), %start, %goal, "path buffer too small, truncating");
        }

        let mut slot = length;
        let mut cursor = Some(terminal);
        while let Some(index) = cursor {
            slot -= 1;
            if slot < out.len() {
                out[slot] = self.nodes[index].pos;
            }
            cursor = self.nodes[index].parent;
        }
        Ok(length.min(out.len()))
    }

    /// Open node with the lowest f; the first one found wins ties
    fn lowest_open(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.closed {
                continue;
            }
            match best {
                Some((_, f)) if node.f >= f => {}
                _ => best = Some((i, node.f)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Traversability over an open grid with Manhattan cost to `goal`
pub fn open_grid(goal: GridPos2) -> impl FnMut(GridPos2) -> Option<u32> {
    move |pos| Some(manhattan(pos, goal))
}
