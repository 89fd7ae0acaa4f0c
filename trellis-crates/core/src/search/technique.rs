use std::collections::VecDeque;
use std::fmt::Debug;

use log::trace;

use super::SearchNode;

/// Decides which open node of the search tree is activated next.
pub trait SearchTechnique: Debug {
    /// Adds the children of a node which branched, in the order of the alternatives.
    fn add_open_nodes(&mut self, nodes: Vec<SearchNode>);

    fn next_node(&mut self) -> Option<SearchNode>;

    fn num_open_nodes(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.num_open_nodes() == 0
    }

    fn clear(&mut self);

    /// Whether every node which was added is (or will be) visited. A technique which prunes nodes
    /// cannot prove that no (better) solution exists.
    fn is_complete(&self) -> bool {
        true
    }
}

/// Visits the first alternative of every choice first.
#[derive(Debug, Default)]
pub struct DepthFirst {
    open: Vec<SearchNode>,
}

impl DepthFirst {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchTechnique for DepthFirst {
    fn add_open_nodes(&mut self, nodes: Vec<SearchNode>) {
        self.open.extend(nodes.into_iter().rev());
    }

    fn next_node(&mut self) -> Option<SearchNode> {
        self.open.pop()
    }

    fn num_open_nodes(&self) -> usize {
        self.open.len()
    }

    fn clear(&mut self) {
        self.open.clear();
    }
}

/// Visits the nodes level by level.
#[derive(Debug, Default)]
pub struct BreadthFirst {
    open: VecDeque<SearchNode>,
}

impl BreadthFirst {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchTechnique for BreadthFirst {
    fn add_open_nodes(&mut self, nodes: Vec<SearchNode>) {
        self.open.extend(nodes);
    }

    fn next_node(&mut self) -> Option<SearchNode> {
        self.open.pop_front()
    }

    fn num_open_nodes(&self) -> usize {
        self.open.len()
    }

    fn clear(&mut self) {
        self.open.clear();
    }
}

/// Depth-first search which only visits nodes reached by taking at most `max_discrepancies`
/// non-first alternatives.
#[derive(Debug)]
pub struct LimitedDiscrepancy {
    max_discrepancies: usize,
    open: Vec<SearchNode>,
    num_pruned: usize,
}

impl LimitedDiscrepancy {
    pub fn new(max_discrepancies: usize) -> Self {
        LimitedDiscrepancy {
            max_discrepancies,
            open: vec![],
            num_pruned: 0,
        }
    }

    pub fn num_pruned(&self) -> usize {
        self.num_pruned
    }
}

impl SearchTechnique for LimitedDiscrepancy {
    fn add_open_nodes(&mut self, nodes: Vec<SearchNode>) {
        for node in nodes.into_iter().rev() {
            if node.discrepancies() <= self.max_discrepancies {
                self.open.push(node);
            } else {
                trace!("Pruning node with {} discrepancies", node.discrepancies());
                self.num_pruned += 1;
            }
        }
    }

    fn next_node(&mut self) -> Option<SearchNode> {
        self.open.pop()
    }

    fn num_open_nodes(&self) -> usize {
        self.open.len()
    }

    fn clear(&mut self) {
        self.open.clear();
        self.num_pruned = 0;
    }

    fn is_complete(&self) -> bool {
        self.num_pruned == 0
    }
}

/// Depth-first search which never expands nodes deeper than `max_depth`.
#[derive(Debug)]
pub struct DepthBounded {
    max_depth: usize,
    open: Vec<SearchNode>,
    num_pruned: usize,
}

impl DepthBounded {
    pub fn new(max_depth: usize) -> Self {
        DepthBounded {
            max_depth,
            open: vec![],
            num_pruned: 0,
        }
    }

    pub fn num_pruned(&self) -> usize {
        self.num_pruned
    }
}

impl SearchTechnique for DepthBounded {
    fn add_open_nodes(&mut self, nodes: Vec<SearchNode>) {
        for node in nodes.into_iter().rev() {
            if node.depth() <= self.max_depth {
                self.open.push(node);
            } else {
                self.num_pruned += 1;
            }
        }
    }

    fn next_node(&mut self) -> Option<SearchNode> {
        self.open.pop()
    }

    fn num_open_nodes(&self) -> usize {
        self.open.len()
    }

    fn clear(&mut self) {
        self.open.clear();
        self.num_pruned = 0;
    }

    fn is_complete(&self) -> bool {
        self.num_pruned == 0
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::search::complete;

    fn children(count: usize) -> (SearchNode, Vec<SearchNode>) {
        let root = SearchNode::root(complete());
        let trace = Rc::new(crate::search::node::Trace {
            action: complete(),
            depth: 0,
            parent: None,
        });
        let children = (0..count)
            .map(|index| SearchNode::child(&root, &trace, complete(), index))
            .collect();
        (root, children)
    }

    #[test]
    fn depth_first_takes_the_first_alternative_first() {
        let (_, nodes) = children(3);
        let first = Rc::clone(nodes[0].action());
        let mut technique = DepthFirst::new();

        technique.add_open_nodes(nodes);

        assert!(Rc::ptr_eq(&first, technique.next_node().unwrap().action()));
        assert_eq!(2, technique.num_open_nodes());
    }

    #[test]
    fn breadth_first_keeps_insertion_order() {
        let (_, nodes) = children(2);
        let second = Rc::clone(nodes[1].action());
        let mut technique = BreadthFirst::new();

        technique.add_open_nodes(nodes);
        let _ = technique.next_node();

        assert!(Rc::ptr_eq(&second, technique.next_node().unwrap().action()));
        assert!(technique.is_empty());
    }

    #[test]
    fn limited_discrepancy_prunes_late_alternatives() {
        let (_, nodes) = children(3);
        let mut technique = LimitedDiscrepancy::new(1);

        technique.add_open_nodes(nodes);

        assert_eq!(2, technique.num_open_nodes());
        assert_eq!(1, technique.num_pruned());
        assert!(!technique.is_complete());
    }

    #[test]
    fn depth_bounded_prunes_deep_nodes() {
        let (_, nodes) = children(2);
        let mut technique = DepthBounded::new(0);

        technique.add_open_nodes(nodes);

        assert!(technique.is_empty());
        assert!(!technique.is_complete());
    }
}
