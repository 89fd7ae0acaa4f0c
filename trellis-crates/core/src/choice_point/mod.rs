//! The transactional backtracking layer.
//!
//! Every mutable structure which must survive backtracking is stored in an entry (a [`DataMap`],
//! a [`NumArraySet`] or a [`ReversibleArray`]) which is registered with a [`ChoicePointStack`].
//! [`ChoicePointStack::push`] opens a frame in every registered entry and
//! [`ChoicePointStack::pop`] restores each of them to its state at the matching push.
mod data_map;
mod entry;
mod num_array_set;
mod reversible_array;
mod stack;

pub use data_map::DataMap;
pub use entry::ChoicePointEntry;
pub use entry::EntryDelta;
pub use entry::EntryId;
pub use num_array_set::ArrayId;
pub use num_array_set::NumArraySet;
pub use num_array_set::NumElement;
pub use reversible_array::ReversibleArray;
pub use stack::ChoicePointStack;
pub use stack::EntryHandle;
pub use stack::StackDelta;
pub use stack::StackEvent;
pub use stack::StackListener;
