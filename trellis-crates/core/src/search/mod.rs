//! Tree search over lazily created nodes.
//!
//! A search is described by a root [`SearchAction`]; performing an action may modify the domains
//! and either completes the node, continues with another action, or branches into alternatives
//! (see the combinators in this module). Which open node is activated next is decided by a
//! [`SearchTechnique`], which nodes are solutions by a [`SearchGoal`], and when to give up by a
//! [`SearchLimit`]. The [`SearchTree`] ties them together.
mod action;
mod actions;
mod goal;
mod limit;
mod node;
mod technique;
mod tree;

pub use action::fn_action;
pub use action::ActionError;
pub use action::ActionOutcome;
pub use action::ActionRef;
pub use action::ActionResult;
pub use action::FnAction;
pub use action::SearchAction;
pub use action::SearchContext;
pub use actions::*;
pub use goal::*;
pub use limit::*;
pub use node::SearchNode;
pub use technique::*;
pub use tree::SearchResult;
pub use tree::SearchStatistics;
pub use tree::SearchTree;
