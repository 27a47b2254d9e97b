//! Built-in middleware and terminal stages.

pub mod method_not_found;
pub mod static_result;

pub use method_not_found::MethodNotFound;
pub use static_result::{StaticResultFactory, StaticResultMiddleware};
