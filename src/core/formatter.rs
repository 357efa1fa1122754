// src/core/formatter.rs

//! Reply texts for every dispatch outcome. Hosts swap any hook for a
//! closure of their own; a hook returning `None` suppresses that reply
//! (or, for the logger, that log line) entirely.

use crate::core::command::{CommandSpec, Message};
use crate::core::dispatcher::Context;

type LookupHook<C> = Box<dyn Fn(&dyn Message, &Context<C>) -> Option<String> + Send + Sync>;
type OutcomeHook<C> =
    Box<dyn Fn(&dyn Message, &CommandSpec, &Context<C>) -> Option<String> + Send + Sync>;
type ErrorHook<C> = Box<
    dyn Fn(&dyn Message, &CommandSpec, &anyhow::Error, &Context<C>) -> Option<String>
        + Send
        + Sync,
>;
type LoggerHook<C> =
    Box<dyn Fn(&dyn Message, &CommandSpec, bool, &Context<C>) -> Option<String> + Send + Sync>;

/// One hook per dispatch outcome. The defaults render the built-in texts;
/// `nocommand` alone defaults to silence so unknown chatter is ignored.
pub struct Formatter<C> {
    nocommand: LookupHook<C>,
    minargs: OutcomeHook<C>,
    maxargs: OutcomeHook<C>,
    permission: OutcomeHook<C>,
    disabled: OutcomeHook<C>,
    error: ErrorHook<C>,
    logger: LoggerHook<C>,
}

impl<C> Default for Formatter<C> {
    fn default() -> Self {
        Self {
            nocommand: Box::new(|_, _| None),
            minargs: Box::new(|_, spec, _| {
                Some(format!(t!("formatter.minargs"), usage = spec.usage_statement()))
            }),
            maxargs: Box::new(|_, spec, _| {
                Some(format!(t!("formatter.maxargs"), usage = spec.usage_statement()))
            }),
            permission: Box::new(|_, _, _| Some(t!("formatter.permission").to_string())),
            disabled: Box::new(|_, _, _| Some(t!("formatter.disabled").to_string())),
            error: Box::new(|_, spec, error, _| {
                Some(format!(t!("formatter.error"), name = spec.name, error = error))
            }),
            logger: Box::new(|msg, _, success, _| {
                let outcome = if success {
                    t!("formatter.logger.success")
                } else {
                    t!("formatter.logger.failure")
                };
                Some(format!(
                    t!("formatter.logger.line"),
                    user = msg.author_id(),
                    text = msg.text(),
                    outcome = outcome
                ))
            }),
        }
    }
}

impl<C> Formatter<C> {
    pub fn new() -> Self {
        Self::default()
    }

    // --- REPLACEMENT SETTERS ---

    /// Text for a name that resolved to nothing.
    pub fn nocommand<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &Context<C>) -> Option<String> + Send + Sync + 'static,
    {
        self.nocommand = Box::new(hook);
        self
    }

    /// Text for too few arguments.
    pub fn minargs<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &CommandSpec, &Context<C>) -> Option<String> + Send + Sync + 'static,
    {
        self.minargs = Box::new(hook);
        self
    }

    /// Text for too many arguments under strict limits.
    pub fn maxargs<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &CommandSpec, &Context<C>) -> Option<String> + Send + Sync + 'static,
    {
        self.maxargs = Box::new(hook);
        self
    }

    /// Text for a denied permission gate.
    pub fn permission<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &CommandSpec, &Context<C>) -> Option<String> + Send + Sync + 'static,
    {
        self.permission = Box::new(hook);
        self
    }

    /// Text for a disabled command.
    pub fn disabled<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &CommandSpec, &Context<C>) -> Option<String> + Send + Sync + 'static,
    {
        self.disabled = Box::new(hook);
        self
    }

    /// Text for a failed permission gate or execution.
    pub fn error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &CommandSpec, &anyhow::Error, &Context<C>) -> Option<String>
            + Send
            + Sync
            + 'static,
    {
        self.error = Box::new(hook);
        self
    }

    /// Line handed to the log on every accepted or rejected run.
    pub fn logger<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Message, &CommandSpec, bool, &Context<C>) -> Option<String>
            + Send
            + Sync
            + 'static,
    {
        self.logger = Box::new(hook);
        self
    }

    // --- RENDERING ---

    pub fn render_nocommand(&self, msg: &dyn Message, ctx: &Context<C>) -> Option<String> {
        (self.nocommand)(msg, ctx)
    }

    pub fn render_minargs(
        &self,
        msg: &dyn Message,
        spec: &CommandSpec,
        ctx: &Context<C>,
    ) -> Option<String> {
        (self.minargs)(msg, spec, ctx)
    }

    pub fn render_maxargs(
        &self,
        msg: &dyn Message,
        spec: &CommandSpec,
        ctx: &Context<C>,
    ) -> Option<String> {
        (self.maxargs)(msg, spec, ctx)
    }

    pub fn render_permission(
        &self,
        msg: &dyn Message,
        spec: &CommandSpec,
        ctx: &Context<C>,
    ) -> Option<String> {
        (self.permission)(msg, spec, ctx)
    }

    pub fn render_disabled(
        &self,
        msg: &dyn Message,
        spec: &CommandSpec,
        ctx: &Context<C>,
    ) -> Option<String> {
        (self.disabled)(msg, spec, ctx)
    }

    pub fn render_error(
        &self,
        msg: &dyn Message,
        spec: &CommandSpec,
        error: &anyhow::Error,
        ctx: &Context<C>,
    ) -> Option<String> {
        (self.error)(msg, spec, error, ctx)
    }

    pub fn render_logger(
        &self,
        msg: &dyn Message,
        spec: &CommandSpec,
        success: bool,
        ctx: &Context<C>,
    ) -> Option<String> {
        (self.logger)(msg, spec, success, ctx)
    }
}

impl<C> std::fmt::Debug for Formatter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter").finish_non_exhaustive()
    }
}

// MARK: --- UNIT TESTS ---
