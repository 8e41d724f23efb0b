//! # Herald
//!
//! Update dispatch and callback routing for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌─────────────────────────────────┐
//! │ UpdateSource │────▶│  Runtime   │────▶│ Dispatcher                      │
//! │ (transport)  │     │            │     │  ├─ middlewares                 │
//! └──────────────┘     └────────────┘     │  ├─ commands / builtins         │──▶ ChatClient
//!                                         │  ├─ broadcast handler lists     │──▶ TtlStore / Queue
//!                                         │  └─ callback token resolution   │
//!                                         └─────────────────────────────────┘
//! ```
//!
//! - **Core**: the update model, classification and the client and translator
//!   capabilities
//! - **Storage**: expiring key-value store and per-group queues
//! - **Framework**: router, dispatcher, extractors and callback tokens
//! - **Runtime**: configuration, logging, backend selection and shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut router = Router::new();
//!     router.on_command(Command::new("ping", ping));
//!
//!     let runtime = HeraldRuntime::builder().build(client, router).await?;
//!     runtime.run(updates).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: load `herald.toml`
//! - `yaml-config`: load `herald.yaml`
//! - `redis` *(default)*: Redis store and queue backends
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;
pub use herald_storage as storage;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldRuntime, UpdateSource};

    // Routing
    pub use herald_framework::{Command, Dispatcher, Router};

    // Handlers and extractors
    pub use herald_framework::{
        BotApi, CallbackData, CommandArgs, Context, EditMessageResponse, FromContext,
        HandlerError, HandlerResult, MessageError, MessageResponse, Sender,
    };

    // Keyboards
    pub use herald_framework::keyboard::callback_button;

    // Platform model
    pub use herald_core::{
        ChatClient, InlineKeyboardButton, InlineKeyboardMarkup, Update, UpdateType, User,
        async_trait,
    };
}
