//! API action table and dispatch
//!
//! Requests to `/api/v1/{category}/{...path}` are resolved against an
//! [`ActionRegistry`] built once at startup and executed by a [`Dispatcher`].

pub mod dispatch;
pub mod query;
pub mod registry;
pub mod reply;

pub use dispatch::{ActionTimeouts, Dispatcher};
pub use query::ActionQuery;
pub use registry::{ActionClass, ActionEntry, ActionFuture, ActionRegistry, ActionRegistryBuilder};
pub use reply::ActionReply;
