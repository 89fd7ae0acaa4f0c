use std::rc::Rc;

use super::ActionRef;

/// A step on the path from the root of the search tree: the action which started a node.
#[derive(Debug)]
pub(crate) struct Trace {
    pub(crate) action: ActionRef,
    pub(crate) depth: usize,
    pub(crate) parent: Option<Rc<Trace>>,
}

/// An open node of the search tree.
///
/// A node does not store domains. It holds the action to perform when it is activated and a trace
/// of the actions which lead to it, which is shared with its siblings; activating a node which is
/// not a child of the current one replays that trace.
#[derive(Clone, Debug)]
pub struct SearchNode {
    depth: usize,
    discrepancies: usize,
    action: ActionRef,
    trace: Option<Rc<Trace>>,
}

impl SearchNode {
    pub(crate) fn root(action: ActionRef) -> Self {
        SearchNode {
            depth: 0,
            discrepancies: 0,
            action,
            trace: None,
        }
    }

    /// The `index`-th alternative of a choice made in the node described by `parent`.
    pub(crate) fn child(
        parent: &SearchNode,
        parent_trace: &Rc<Trace>,
        action: ActionRef,
        index: usize,
    ) -> Self {
        SearchNode {
            depth: parent.depth + 1,
            discrepancies: parent.discrepancies + index,
            action,
            trace: Some(Rc::clone(parent_trace)),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The number of times a non-first alternative was taken on the path to this node.
    pub fn discrepancies(&self) -> usize {
        self.discrepancies
    }

    pub fn action(&self) -> &ActionRef {
        &self.action
    }

    /// The trace of the ancestors of this node, from the root down.
    pub(crate) fn path(&self) -> Vec<Rc<Trace>> {
        let mut path = vec![];
        let mut current = self.trace.clone();
        while let Some(trace) = current {
            current = trace.parent.clone();
            path.push(trace);
        }
        path.reverse();
        path
    }
}
