//! Ping Bot Demo
//!
//! Reads platform updates as JSON, one per line, from stdin and prints every
//! outgoing API call instead of talking to a real platform.
//!
//! # Usage
//!
//! ```bash
//! echo '{"update_id":1,"message":{"message_id":1,"date":0,"chat":{"id":10,"type":"private"},"from":{"id":20,"is_bot":false,"first_name":"Alice"},"text":"/ping"}}' \
//!     | cargo run --package ping-bot
//! ```
//!
//! Commands: `/ping`, `/echo <text>`, `/confirm`, plus the built-in `/help`,
//! `/start` and `/cancel`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use clap::Parser;
use herald::core::ApiResult;
use herald::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ping-bot", about = "Console demo for the Herald framework")]
struct Args {
    /// Configuration file, defaults to herald.toml in the working directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "production".
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Console transport
// ============================================================================

/// Prints API calls and fabricates plausible responses.
struct ConsoleClient {
    next_message_id: AtomicI64,
}

#[async_trait]
impl ChatClient for ConsoleClient {
    fn bot_id(&self) -> i64 {
        1
    }

    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value> {
        println!("-> {method} {params}");
        let response = match method {
            "sendMessage" => json!({
                "message_id": self.next_message_id.fetch_add(1, Ordering::Relaxed),
                "date": 0,
                "chat": { "id": params["chat_id"], "type": "private" },
                "text": params["text"],
            }),
            "getChat" => json!({ "id": params["chat_id"], "type": "channel" }),
            _ => Value::Bool(true),
        };
        Ok(response)
    }
}

/// Forwards each JSON line on stdin as an update.
fn stdin_updates() -> mpsc::Receiver<Update> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Update>(&line) {
                Ok(update) => {
                    if tx.send(update).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Skipping malformed update: {e}"),
            }
        }
    });
    rx
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Choice {
    accepted: bool,
}

async fn ping() -> &'static str {
    "pong"
}

async fn echo(ctx: Arc<Context>, CommandArgs(args): CommandArgs) -> HandlerResult<MessageResponse> {
    if args.trim().is_empty() {
        return Err(MessageError::new("Usage: /echo <text>").into());
    }
    Ok(ctx.new_reply(args))
}

async fn confirm(ctx: Arc<Context>, bot: BotApi) -> HandlerResult<MessageResponse> {
    let yes = bot.assign_callback_data("confirm", &Choice { accepted: true }).await?;
    let no = bot.assign_callback_data("confirm", &Choice { accepted: false }).await?;
    let markup = InlineKeyboardMarkup {
        inline_keyboard: vec![vec![callback_button("Yes", yes), callback_button("No", no)]],
    };
    Ok(ctx.new_message("Are you sure?").reply_markup(markup))
}

async fn on_confirm(
    ctx: Arc<Context>,
    Sender(user): Sender,
    CallbackData(choice): CallbackData<Choice>,
) -> Option<EditMessageResponse> {
    let message_id = ctx.update().callback_query.as_ref()?.message.as_ref()?.message_id;
    let verdict = if choice.accepted { "Confirmed" } else { "Declined" };
    info!(user = user.id, accepted = choice.accepted, "Confirmation answered");
    Some(ctx.new_edit_message_text(message_id, format!("{verdict} by {}", user.first_name)))
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut router = Router::new();
    router
        .on_command(Command::new("ping", ping).help(|_| "Check the bot is alive".into()))
        .on_command(Command::new("echo", echo).help(|_| "Repeat the given text".into()))
        .on_command_group(
            |_| "Demo Commands".into(),
            vec![Command::new("confirm", confirm).help(|_| "Ask for a confirmation".into())],
        )
        .on_callback_query("confirm", on_confirm)
        .use_middleware(|ctx| {
            info!(
                update_id = ctx.update().update_id,
                update_type = ?ctx.update().update_type(),
                "Update received"
            );
        });

    let mut builder = HeraldRuntime::builder();
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }

    let client = Arc::new(ConsoleClient {
        next_message_id: AtomicI64::new(100),
    });
    let runtime = builder.build(client, router).await?;
    runtime.run(stdin_updates()).await;

    Ok(())
}
