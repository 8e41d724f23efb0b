//! Handler system: functions with extractor arguments, type-erased for storage.

mod response;
mod traits;

pub(crate) use response::handle_error;
pub use response::{EditMessageResponse, HandlerResponse, MessageResponse};
pub(crate) use traits::noop_handler;
pub use traits::{BoxedHandler, Handler, into_handler};
