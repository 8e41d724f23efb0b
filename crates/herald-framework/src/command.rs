//! Commands, command groups and the built-in `help`, `cancel` and `start`.

use std::sync::Arc;

use futures::future::BoxFuture;
use herald_core::i18n::keys;
use tracing::{debug, error};

use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::{BoxedHandler, Handler, HandlerResponse, into_handler};
use crate::router::Router;

/// Produces a localised string for the context's sender.
pub type TextFn = Arc<dyn Fn(&Context) -> String + Send + Sync>;

/// Decides whether a cancellable operation is in progress for the update.
pub type CancelPredicate =
    Arc<dyn Fn(Arc<Context>) -> BoxFuture<'static, Result<bool, HandlerError>> + Send + Sync>;

/// A text command.
///
/// ```rust,ignore
/// let ping = Command::new("ping", || async { "pong" })
///     .help(|ctx| ctx.t("commands.ping.help", &[]));
/// ```
#[derive(Clone)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) help: TextFn,
    pub(crate) handler: BoxedHandler,
}

impl Command {
    pub fn new<H, T>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self {
            name: name.into(),
            help: Arc::new(|_| String::new()),
            handler: into_handler(handler),
        }
    }

    /// Sets the help line shown by `/help`.
    pub fn help<F>(mut self, help: F) -> Self
    where
        F: Fn(&Context) -> String + Send + Sync + 'static,
    {
        self.help = Arc::new(help);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone)]
pub(crate) struct HelpEntry {
    pub(crate) name: String,
    pub(crate) help: TextFn,
}

/// Help-only view of a named group of commands. Entries keep insertion order.
#[derive(Clone)]
pub(crate) struct CommandGroup {
    pub(crate) name: TextFn,
    pub(crate) entries: Vec<HelpEntry>,
}

#[derive(Clone)]
pub(crate) struct Cancellable {
    pub(crate) predicate: CancelPredicate,
    pub(crate) handler: BoxedHandler,
}

/// Built-in commands. They need the router itself, so they are resolved by
/// the dispatcher rather than stored as plain handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Help,
    Cancel,
    Start,
}

impl Builtin {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Cancel => "cancel",
            Self::Start => "start",
        }
    }

    pub(crate) fn help_key(self) -> &'static str {
        match self {
            Self::Help => keys::HELP_HELP,
            Self::Cancel => keys::CANCEL_HELP,
            Self::Start => keys::START_HELP,
        }
    }

    pub(crate) async fn run(self, router: &Router, ctx: Arc<Context>) {
        match self {
            Self::Help => help(router, ctx).await,
            Self::Cancel => cancel(router, ctx).await,
            Self::Start => start(router, ctx).await,
        }
    }
}

/// Renders every group, then commands registered outside a group.
pub(crate) fn render_help(router: &Router, ctx: &Context) -> String {
    let mut sections = Vec::new();
    for group in &router.help_groups {
        sections.push(render_group(&(group.name)(ctx), &group.entries, ctx));
    }
    if !router.ungrouped.is_empty() {
        let name = ctx.t(keys::OTHER_GROUP_NAME, &[]);
        sections.push(render_group(&name, &router.ungrouped, ctx));
    }

    let commands = sections.join("\n\n");
    ctx.t(keys::HELP_MESSAGE, &[("commands", &commands)])
}

fn render_group(name: &str, entries: &[HelpEntry], ctx: &Context) -> String {
    let mut out = name.to_string();
    for entry in entries {
        let help = (entry.help)(ctx);
        if help.is_empty() {
            out.push_str(&format!("\n/{}", entry.name));
        } else {
            out.push_str(&format!("\n/{} - {help}", entry.name));
        }
    }
    out
}

async fn help(router: &Router, ctx: Arc<Context>) {
    let text = render_help(router, &ctx);
    ctx.new_reply(text).into_response(ctx).await;
}

async fn start(router: &Router, ctx: Arc<Context>) {
    if router.start_handlers.is_empty() {
        return help(router, ctx).await;
    }
    for handler in &router.start_handlers {
        handler(Arc::clone(&ctx)).await;
    }
}

async fn cancel(router: &Router, ctx: Arc<Context>) {
    let mut cancelled = 0usize;
    for (index, cancellable) in router.cancellables.iter().enumerate() {
        match (cancellable.predicate)(Arc::clone(&ctx)).await {
            Ok(true) => {
                cancelled += 1;
                (cancellable.handler)(Arc::clone(&ctx)).await;
            }
            Ok(false) => {}
            Err(e) => error!(index, error = %e, "Cancel predicate failed"),
        }
    }

    debug!(cancelled, "Handled /cancel");
    if cancelled == 0 {
        let text = ctx.t(keys::CANCEL_ALREADY_CANCELLED_ALL, &[]);
        ctx.new_reply(text).into_response(ctx).await;
    }
}
