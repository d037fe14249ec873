//! Dispatcher: routing-table resolution over both executors.

mod dispatch;
pub use dispatch::{dispatch_by, dispatch_create, dispatch_update};
