// src/core/dispatcher.rs

//! The dispatch pipeline. A [`Dispatcher`] owns the name table and the
//! outcome texts, and walks every incoming message through lookup, the
//! disabled gate, arity, permission and execution, replying with the
//! formatter's text at whichever rung the message falls off.

use crate::constants::KIND_COMMAND;
use crate::core::command::{Command, CommandSpec, Message};
use crate::core::formatter::Formatter;
use crate::core::loader::{self, HandlerMap};
use crate::core::registry::{Registration, Registry};
use crate::error::SetupError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Free-form payload carried alongside a message. Keys are host-defined;
/// dispatch never reads them.
#[derive(Debug, Clone, Default)]
pub struct Extra(serde_json::Map<String, serde_json::Value>);

impl Extra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a hook sees besides the message itself: the host client and
/// the caller's extra payload, passed through untouched.
pub struct Context<C> {
    pub client: Option<Arc<C>>,
    pub extra: Extra,
}

impl<C> Context<C> {
    pub fn new() -> Self {
        Self {
            client: None,
            extra: Extra::new(),
        }
    }

    pub fn with_client(client: Arc<C>) -> Self {
        Self {
            client: Some(client),
            extra: Extra::new(),
        }
    }

    pub fn extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }
}

impl<C> Default for Context<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Context<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            extra: self.extra.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Context<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("has_client", &self.client.is_some())
            .field("extra", &self.extra)
            .finish()
    }
}

/// Command dispatcher for one host client type.
pub struct Dispatcher<C> {
    registry: Registry<C>,
    formatter: Formatter<C>,
    client: Option<Arc<C>>,
    enforce_arg_limits: bool,
    run_timeout: Option<Duration>,
}

impl<C: Send + Sync> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            formatter: Formatter::new(),
            client: None,
            enforce_arg_limits: false,
            run_timeout: None,
        }
    }

    // --- CONFIGURATION ---

    /// Host client cloned into the context of every [`process`] call.
    ///
    /// [`process`]: Dispatcher::process
    pub fn client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn formatter(mut self, formatter: Formatter<C>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Strict arity: reject overflow instead of truncating it away.
    pub fn enforce_arg_limits(mut self, enforce: bool) -> Self {
        self.enforce_arg_limits = enforce;
        self
    }

    /// Wall-clock cap on a single execution. A run that overshoots is
    /// dropped and reported through the `error` formatter.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.run_timeout = Some(limit);
        self
    }

    // --- REGISTRATION ---

    pub fn register(&mut self, registration: Registration<C>) -> Result<(), SetupError> {
        self.registry.register(registration)
    }

    pub fn register_command<T>(&mut self, command: T) -> Result<(), SetupError>
    where
        T: Command<C> + 'static,
    {
        self.registry.register_command(command)
    }

    pub fn register_type<T>(&mut self) -> Result<(), SetupError>
    where
        T: Command<C> + Default + 'static,
    {
        self.registry.register_type::<T>()
    }

    pub fn unregister(&mut self, command: &Arc<dyn Command<C>>) {
        self.registry.unregister(command);
    }

    /// Alias of [`register`] kept for the population idiom: build the whole
    /// command set as one [`Registration`] batch and hand it over.
    ///
    /// [`register`]: Dispatcher::register
    pub fn populate(&mut self, registration: Registration<C>) -> Result<(), SetupError> {
        self.register(registration)
    }

    /// Builds and registers one command per manifest file in `dir`. See
    /// [`loader::populate_dir`].
    pub fn populate_dir(
        &mut self,
        dir: impl AsRef<Path>,
        handlers: &HandlerMap<C>,
    ) -> Result<usize, SetupError>
    where
        C: 'static,
    {
        loader::populate_dir(&mut self.registry, dir, handlers)
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<C> {
        &mut self.registry
    }

    // --- DISPATCH ---

    /// Dispatches one message using this dispatcher's client and the given
    /// extra payload.
    pub async fn process(&self, msg: &mut dyn Message, extra: Extra) {
        let ctx = Context {
            client: self.client.clone(),
            extra,
        };
        self.process_with(msg, ctx).await;
    }

    /// Dispatches one message with a fully caller-built context.
    ///
    /// # Logic:
    /// 1. A message with an empty command name is dropped outright.
    /// 2. Unknown names go to the `nocommand` hook, silent by default.
    /// 3. Disabled commands answer with the `disabled` text, unlogged.
    /// 4. Underflow logs a rejection and answers `minargs`. Overflow is
    ///    truncated in place, or under strict limits logged and answered
    ///    with `maxargs`.
    /// 5. A failing permission gate answers `error` without logging; a
    ///    denying one logs a rejection and answers `permission`.
    /// 6. An accepted run is logged first, then executed under the optional
    ///    timeout. Execution errors answer with the `error` text.
    ///
    /// Reply delivery failures are logged and swallowed at every rung.
    pub async fn process_with(&self, msg: &mut dyn Message, ctx: Context<C>) {
        if msg.command_name().is_empty() {
            return;
        }

        let Some(command) = self.registry.get(msg.command_name()) else {
            if let Some(text) = self.formatter.render_nocommand(&*msg, &ctx) {
                self.deliver(&*msg, &text).await;
            }
            return;
        };
        let spec = command.spec();
        log::debug!("Dispatching '{}' with args: {:?}", spec.name, msg.args());

        if spec.disabled {
            if let Some(text) = self.formatter.render_disabled(&*msg, spec, &ctx) {
                self.deliver(&*msg, &text).await;
            }
            return;
        }

        let supplied = msg.args().len();
        if supplied < spec.min_args {
            self.record(&*msg, spec, false, &ctx);
            if let Some(text) = self.formatter.render_minargs(&*msg, spec, &ctx) {
                self.deliver(&*msg, &text).await;
            }
            return;
        }
        if let Some(max) = spec.max_args {
            if supplied > max {
                if self.enforce_arg_limits {
                    self.record(&*msg, spec, false, &ctx);
                    if let Some(text) = self.formatter.render_maxargs(&*msg, spec, &ctx) {
                        self.deliver(&*msg, &text).await;
                    }
                    return;
                }
                msg.args_mut().truncate(max);
            }
        }

        match command.can_run(&*msg, &ctx).await {
            Err(error) => {
                if let Some(text) = self.formatter.render_error(&*msg, spec, &error, &ctx) {
                    self.deliver(&*msg, &text).await;
                }
                return;
            }
            Ok(false) => {
                self.record(&*msg, spec, false, &ctx);
                if let Some(text) = self.formatter.render_permission(&*msg, spec, &ctx) {
                    self.deliver(&*msg, &text).await;
                }
                return;
            }
            Ok(true) => {}
        }

        self.record(&*msg, spec, true, &ctx);

        let result = match self.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, command.run(&mut *msg, &ctx)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "Command '{}' timed out after {}ms",
                    spec.name,
                    limit.as_millis()
                )),
            },
            None => command.run(&mut *msg, &ctx).await,
        };

        if let Err(error) = result {
            if let Some(text) = self.formatter.render_error(&*msg, spec, &error, &ctx) {
                self.deliver(&*msg, &text).await;
            }
        }
    }

    // --- HELP ---

    /// One line per visible command, sorted by name. Visible means the
    /// canonical entry of an unrestricted `"command"`-kind definition.
    pub fn help_statement(&self) -> String {
        self.help_statement_with(
            |key, spec| {
                key == spec.name.to_lowercase()
                    && spec.kind == KIND_COMMAND
                    && spec.allowed_users.is_empty()
            },
            |spec| {
                format!(
                    t!("help.entry"),
                    name = spec.name,
                    description = spec.description,
                    usage = spec.usage_statement()
                )
            },
        )
    }

    /// Help aggregation under a caller-chosen filter and line renderer. The
    /// filter sees every registry key, alias entries included.
    pub fn help_statement_with<F, R>(&self, filter: F, render: R) -> String
    where
        F: Fn(&str, &CommandSpec) -> bool,
        R: Fn(&CommandSpec) -> String,
    {
        let mut lines = Vec::new();
        for (key, command) in self.registry.entries() {
            let spec = command.spec();
            if filter(&key, spec) {
                lines.push(render(spec));
            }
        }
        lines.join("\n")
    }

    // --- INTERNALS ---

    async fn deliver(&self, msg: &dyn Message, text: &str) {
        if let Err(error) = msg.reply(text).await {
            log::error!("Failed to deliver a dispatch reply: {error:#}");
        }
    }

    fn record(&self, msg: &dyn Message, spec: &CommandSpec, success: bool, ctx: &Context<C>) {
        if let Some(line) = self.formatter.render_logger(msg, spec, success, ctx) {
            if success {
                log::info!("{line}");
            } else {
                log::warn!("{line}");
            }
        }
    }
}

impl<C> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("enforce_arg_limits", &self.enforce_arg_limits)
            .field("run_timeout", &self.run_timeout)
            .finish_non_exhaustive()
    }
}

// MARK: --- UNIT TESTS ---
