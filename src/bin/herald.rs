// src/bin/herald.rs

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use clap::Parser;
use colored::*;
use herald::constants::KIND_HIDDEN;
use herald::core::arg_parser::{ArgSpec, parse_named_args};
use herald::core::command::{Command, CommandSpec, Handler, Message};
use herald::core::dispatcher::{Context, Dispatcher, Extra};
use herald::core::formatter::Formatter;
use herald::core::loader::HandlerMap;
use herald::core::router::Router;
use herald::error::SetupError;
use herald::t;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};

/// herald: an interactive console for exercising a command set.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Prefix a line must carry to be treated as a command.
    #[arg(long, default_value = "!")]
    prefix: String,

    /// Reject argument overflow instead of silently truncating it.
    #[arg(long)]
    strict: bool,

    /// Directory of TOML command manifests to load on top of the built-ins.
    #[arg(long)]
    commands_dir: Option<PathBuf>,

    /// Wall-clock cap for a single command execution, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

// --- Host Side ---

/// The stand-in host client handed to every command through the context.
struct Console {
    started_at: Instant,
}

/// One console line, split into a command name and residual tokens.
struct ConsoleMessage {
    name: String,
    args: Vec<String>,
    author: String,
}

impl ConsoleMessage {
    fn parse(line: &str, author: &str) -> Self {
        let mut tokens = line.split_whitespace().map(str::to_string);
        Self {
            name: tokens.next().unwrap_or_default(),
            args: tokens.collect(),
            author: author.to_string(),
        }
    }
}

#[async_trait]
impl Message for ConsoleMessage {
    fn command_name(&self) -> &str {
        &self.name
    }

    fn set_command_name(&mut self, name: String) {
        self.name = name;
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    fn args_mut(&mut self) -> &mut Vec<String> {
        &mut self.args
    }

    fn author_id(&self) -> &str {
        &self.author
    }

    async fn reply(&self, content: &str) -> Result<()> {
        println!("{content}");
        Ok(())
    }
}

// --- Built-in Demo Commands ---

struct Ping {
    spec: CommandSpec,
}

impl Default for Ping {
    fn default() -> Self {
        Self {
            spec: CommandSpec::new("ping").description("Answers with Pong!"),
        }
    }
}

#[async_trait]
impl Command<Console> for Ping {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, msg: &mut dyn Message, _ctx: &Context<Console>) -> Result<()> {
        msg.reply(t!("demo.pong")).await
    }
}

struct Echo {
    spec: CommandSpec,
}

impl Default for Echo {
    fn default() -> Self {
        Self {
            spec: CommandSpec::new("echo")
                .description("Repeats whatever you said.")
                .variadic("text", Some("String[]")),
        }
    }
}

#[async_trait]
impl Command<Console> for Echo {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, msg: &mut dyn Message, _ctx: &Context<Console>) -> Result<()> {
        let bound = self.spec.bind(msg.args());
        match bound.get("text") {
            Some(text) => msg.reply(text).await,
            None => msg.reply(t!("demo.echo.empty")).await,
        }
    }
}

struct Ban {
    spec: CommandSpec,
}

impl Default for Ban {
    fn default() -> Self {
        Self {
            spec: CommandSpec::new("ban")
                .alias("b")
                .description("Pretends to ban a user.")
                .arg(ArgSpec::required("user", Some("User")))
                .arg(ArgSpec::optional("reason", Some("String")))
                .example("someone spam"),
        }
    }
}

#[async_trait]
impl Command<Console> for Ban {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Named tokens win over positional ones, so `!ban bob rude` and
    /// `!ban bob --reason=rude` land the same reason.
    async fn run(&self, msg: &mut dyn Message, _ctx: &Context<Console>) -> Result<()> {
        let named = parse_named_args(msg.args());
        let bound = self.spec.bind(msg.args());

        let user = bound.get("user").cloned().unwrap_or_default();
        let reason = named
            .get("reason")
            .map(|value| value.to_string())
            .or_else(|| bound.get("reason").cloned())
            .unwrap_or_else(|| t!("demo.ban.no_reason").to_string());

        msg.reply(&format!(t!("demo.ban.result"), user = user, reason = reason))
            .await
    }
}

// --- Admin Sub-Commands ---

struct Status {
    spec: CommandSpec,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            spec: CommandSpec::new("status").description("Reports host status."),
        }
    }
}

#[async_trait]
impl Command<Console> for Status {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, msg: &mut dyn Message, ctx: &Context<Console>) -> Result<()> {
        let secs = ctx
            .client
            .as_ref()
            .map(|console| console.started_at.elapsed().as_secs())
            .unwrap_or(0);
        msg.reply(&format!(t!("demo.status"), secs = secs)).await
    }
}

struct Sleep {
    spec: CommandSpec,
}

impl Default for Sleep {
    fn default() -> Self {
        Self {
            spec: CommandSpec::new("sleep")
                .description("Sleeps, to exercise the execution cap.")
                .arg(ArgSpec::optional("secs", Some("Number"))),
        }
    }
}

#[async_trait]
impl Command<Console> for Sleep {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, msg: &mut dyn Message, _ctx: &Context<Console>) -> Result<()> {
        let secs = self
            .spec
            .bind(msg.args())
            .get("secs")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(1);
        tokio::time::sleep(Duration::from_secs(secs)).await;
        msg.reply(&format!(t!("demo.sleep.done"), secs = secs)).await
    }
}

struct Purge {
    spec: CommandSpec,
}

impl Default for Purge {
    fn default() -> Self {
        Self {
            spec: CommandSpec::new("purge")
                .kind(KIND_HIDDEN)
                .disabled(true)
                .description("Wipes the channel. Kept offline."),
        }
    }
}

#[async_trait]
impl Command<Console> for Purge {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }
}

// --- Manifest Handlers ---

/// Backs `demos/commands/shout.toml` when `--commands-dir` points there.
struct ShoutHandler;

#[async_trait]
impl Handler<Console> for ShoutHandler {
    async fn handle(&self, msg: &mut dyn Message, _ctx: &Context<Console>) -> Result<()> {
        if msg.args().is_empty() {
            return msg.reply(t!("demo.echo.empty")).await;
        }
        let text = msg.args().join(" ").to_uppercase();
        msg.reply(&text).await
    }
}

fn demo_handlers() -> HandlerMap<Console> {
    let mut handlers: HandlerMap<Console> = HashMap::new();
    handlers.insert("demo.shout".to_string(), Arc::new(ShoutHandler));
    handlers
}

// --- Wiring ---

fn admin_router() -> Result<Router<Console>, SetupError> {
    Router::builder("admin")
        .alias("adm")
        .description("Operator toolbox.")
        .command(Status::default())
        .command(Sleep::default())
        .command(Purge::default())
        .build()
}

fn build_dispatcher(cli: &Cli, console: Arc<Console>) -> Result<Dispatcher<Console>> {
    let mut dispatcher = Dispatcher::new()
        .client(console)
        .enforce_arg_limits(cli.strict)
        .formatter(Formatter::new().nocommand(|msg, _| {
            Some(format!(t!("repl.unknown"), name = msg.command_name()))
        }));
    if let Some(secs) = cli.timeout_secs {
        dispatcher = dispatcher.timeout(Duration::from_secs(secs));
    }

    dispatcher.register_type::<Ping>()?;
    dispatcher.register_type::<Echo>()?;
    dispatcher.register_type::<Ban>()?;
    dispatcher.register_command(admin_router()?)?;

    if let Some(dir) = &cli.commands_dir {
        let count = dispatcher
            .populate_dir(dir, &demo_handlers())
            .with_context(|| format!("Failed to load command manifests from '{}'", dir.display()))?;
        log::info!("Loaded {} manifest command(s) from '{}'", count, dir.display());
    }
    Ok(dispatcher)
}

async fn run(cli: Cli) -> Result<()> {
    let console = Arc::new(Console {
        started_at: Instant::now(),
    });
    let dispatcher = build_dispatcher(&cli, console)?;
    let author = std::env::var("USER").unwrap_or_else(|_| "console".to_string());

    println!("{}", format!(t!("repl.welcome"), prefix = cli.prefix));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "help" {
            println!("{}", t!("repl.help_header").bold());
            println!("{}", dispatcher.help_statement());
            continue;
        }
        let Some(rest) = line.strip_prefix(cli.prefix.as_str()) else {
            continue;
        };

        let mut msg = ConsoleMessage::parse(rest, &author);
        dispatcher
            .process(&mut msg, Extra::new().with("channel", "console"))
            .await;
    }

    println!("{}", t!("repl.goodbye"));
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
