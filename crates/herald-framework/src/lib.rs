//! # Herald Framework
//!
//! Routing and dispatch for Herald bots.
//!
//! This layer provides:
//! - [`Router`]: commands, command groups, callback routes and per-update-type
//!   handler lists
//! - [`Dispatcher`]: classifies updates and runs handlers on fault-isolated
//!   tasks, also usable as a `tower::Service`
//! - Axum-style handlers with [`FromContext`] extractors
//! - Callback tokens backed by the expiring store, rate limiting and the
//!   delete-later queue through [`BotApi`]

pub mod bot;
pub mod callback;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod keyboard;
pub mod rate_limit;
pub mod router;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use bot::{BotApi, DEFAULT_CALLBACK_DATA_TTL, DispatchSettings};
pub use callback::{CallbackToken, NOP_ROUTE, action_data_hash, route_hash};
pub use command::{CancelPredicate, Command, TextFn};
pub use context::Context;
pub use dispatcher::{CallbackResolution, Dispatched, Dispatcher};
pub use error::{
    BindError, CallbackDataError, ExceptionError, ExtractError, ExtractResult, HandlerError,
    HandlerResult, MessageError,
};
pub use extractor::{CallbackData, CommandArgs, FromContext, Sender};
pub use handler::{
    BoxedHandler, EditMessageResponse, Handler, HandlerResponse, MessageResponse, into_handler,
};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use router::{Middleware, Router};
pub use task::{TaskOutcome, spawn_isolated};
