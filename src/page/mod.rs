mod model;
mod query;

pub use model::{
    DispatchedEvent, EventKind, NodeId, PageModel, PageSnapshot, SelectOptionSnapshot,
    SnapshotNode,
};
pub use query::Selector;
