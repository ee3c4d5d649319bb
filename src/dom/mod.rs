pub mod document;
pub mod events;
pub mod host;
pub mod markup;
pub mod page;
pub mod query;
pub mod selector;
pub mod snapshot;

pub use document::{Document, DomTree, NodeId};
pub use page::Page;
