//! Handler registry.
//!
//! A [`Router`] is built once at startup and handed to the
//! [`Dispatcher`](crate::Dispatcher). Registration takes `&mut self`, so the
//! registry cannot change while updates are being dispatched.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use herald_core::i18n::keys;
use tracing::warn;

use crate::callback::{NOP_ROUTE, route_hash};
use crate::command::{Builtin, Cancellable, Command, CommandGroup, HelpEntry, TextFn};
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::{BoxedHandler, Handler, into_handler, noop_handler};

/// Observes every update before it is routed.
pub type Middleware = Arc<dyn Fn(&Context) + Send + Sync>;

#[derive(Clone)]
pub(crate) enum CommandTarget {
    Handler(BoxedHandler),
    Builtin(Builtin),
}

/// Registry mapping update classifications to handlers.
///
/// `help`, `cancel` and `start` are pre-registered as the "Basic Commands"
/// group, and the `nop` callback route is pre-registered with a handler that
/// does nothing.
pub struct Router {
    pub(crate) commands: HashMap<String, CommandTarget>,
    pub(crate) help_groups: Vec<CommandGroup>,
    pub(crate) ungrouped: Vec<HelpEntry>,
    pub(crate) cancellables: Vec<Cancellable>,
    pub(crate) start_handlers: Vec<BoxedHandler>,
    pub(crate) middlewares: Vec<Middleware>,

    pub(crate) channel_post: Vec<BoxedHandler>,
    pub(crate) my_chat_member: Vec<BoxedHandler>,
    pub(crate) left_chat_member: Vec<BoxedHandler>,
    pub(crate) new_chat_members: Vec<BoxedHandler>,
    pub(crate) chat_migration_from: Vec<BoxedHandler>,

    /// Route hash to route.
    pub(crate) callback_routes: HashMap<String, String>,
    /// Route hash to handler.
    pub(crate) callback_handlers: HashMap<String, BoxedHandler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let mut router = Self {
            commands: HashMap::new(),
            help_groups: Vec::new(),
            ungrouped: Vec::new(),
            cancellables: Vec::new(),
            start_handlers: Vec::new(),
            middlewares: Vec::new(),
            channel_post: Vec::new(),
            my_chat_member: Vec::new(),
            left_chat_member: Vec::new(),
            new_chat_members: Vec::new(),
            chat_migration_from: Vec::new(),
            callback_routes: HashMap::new(),
            callback_handlers: HashMap::new(),
        };

        let builtins = [Builtin::Help, Builtin::Cancel, Builtin::Start];
        let entries = builtins
            .iter()
            .map(|builtin| {
                let key = builtin.help_key();
                HelpEntry {
                    name: builtin.name().to_string(),
                    help: Arc::new(move |ctx: &Context| ctx.t(key, &[])),
                }
            })
            .collect();
        router.help_groups.push(CommandGroup {
            name: Arc::new(|ctx: &Context| ctx.t(keys::BASIC_GROUP_NAME, &[])),
            entries,
        });
        for builtin in builtins {
            router
                .commands
                .insert(builtin.name().to_string(), CommandTarget::Builtin(builtin));
        }

        router.insert_callback_route(NOP_ROUTE, noop_handler());
        router
    }

    /// Registers a command outside any group. It is listed under "Other
    /// Commands" in `/help`.
    pub fn on_command(&mut self, command: Command) -> &mut Self {
        self.ungrouped.push(HelpEntry {
            name: command.name.clone(),
            help: command.help.clone(),
        });
        self.insert_command(command);
        self
    }

    /// Registers commands under a named help group. Display order is
    /// insertion order.
    pub fn on_command_group<F>(&mut self, name: F, commands: Vec<Command>) -> &mut Self
    where
        F: Fn(&Context) -> String + Send + Sync + 'static,
    {
        let name: TextFn = Arc::new(name);
        let entries = commands
            .iter()
            .map(|command| HelpEntry {
                name: command.name.clone(),
                help: command.help.clone(),
            })
            .collect();
        self.help_groups.push(CommandGroup { name, entries });

        for command in commands {
            self.insert_command(command);
        }
        self
    }

    /// Registers an operation `/cancel` can stop. `predicate` reports whether
    /// the operation is in progress; `handler` runs when it is.
    pub fn on_cancel_command<P, Fut, H, T>(&mut self, predicate: P, handler: H) -> &mut Self
    where
        P: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, HandlerError>> + Send + 'static,
        H: Handler<T>,
        T: 'static,
    {
        self.cancellables.push(Cancellable {
            predicate: Arc::new(move |ctx| predicate(ctx).boxed()),
            handler: into_handler(handler),
        });
        self
    }

    /// Adds a handler for `/start`. Without any, `/start` shows the help.
    pub fn on_start_command<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.start_handlers.push(into_handler(handler));
        self
    }

    pub fn on_channel_post<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.channel_post.push(into_handler(handler));
        self
    }

    pub fn on_my_chat_member<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.my_chat_member.push(into_handler(handler));
        self
    }

    pub fn on_left_chat_member<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.left_chat_member.push(into_handler(handler));
        self
    }

    pub fn on_new_chat_member<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.new_chat_members.push(into_handler(handler));
        self
    }

    pub fn on_chat_migration_from<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.chat_migration_from.push(into_handler(handler));
        self
    }

    /// Registers the handler for buttons whose token was issued for `route`.
    pub fn on_callback_query<H, T>(&mut self, route: &str, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.insert_callback_route(route, into_handler(handler));
        self
    }

    /// Adds a middleware. Middlewares run in registration order before every
    /// update is routed and cannot stop it.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&Context) + Send + Sync + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Names of every registered command.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Routes with a registered callback handler.
    pub fn callback_route_names(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.callback_routes.values().map(String::as_str).collect();
        routes.sort_unstable();
        routes
    }

    fn insert_command(&mut self, command: Command) {
        let previous = self
            .commands
            .insert(command.name.clone(), CommandTarget::Handler(command.handler));
        if previous.is_some() {
            warn!(command = %command.name, "Command registered twice, replacing previous handler");
        }
    }

    fn insert_callback_route(&mut self, route: &str, handler: BoxedHandler) {
        let hash = route_hash(route);
        if let Some(existing) = self.callback_routes.get(&hash)
            && existing != route
        {
            warn!(route, existing = %existing, hash = %hash, "Callback route hash collision");
        }
        self.callback_routes.insert(hash.clone(), route.to_string());
        self.callback_handlers.insert(hash, handler);
    }
}
