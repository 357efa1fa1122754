// src/core/router.rs

//! Sub-command routing. A [`Router`] is itself a command whose execution
//! pops the first residual token, rewrites the message to that name and
//! re-dispatches it against its own nested registry. Routers nest freely,
//! which is what the `depth` hook counts.

use crate::core::command::{Command, CommandSpec, Message};
use crate::core::dispatcher::{Context, Dispatcher};
use crate::core::formatter::Formatter;
use crate::error::SetupError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A command that fans out to named children.
pub struct Router<C> {
    spec: CommandSpec,
    children: Dispatcher<C>,
    depth: usize,
}

impl<C: Send + Sync> Router<C> {
    pub fn builder(name: impl Into<String>) -> RouterBuilder<C> {
        RouterBuilder {
            spec: CommandSpec::new(name),
            children: Vec::new(),
        }
    }
}

#[async_trait]
impl<C: Send + Sync> Command<C> for Router<C> {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// # Logic:
    /// 1. No residual tokens: answer with the route map, never descend.
    /// 2. Otherwise pop the first token, lower-case it into the command
    ///    name, and hand the shifted message to the nested dispatcher.
    ///    Unknown names land on its `nocommand` text.
    async fn run(&self, msg: &mut dyn Message, ctx: &Context<C>) -> Result<()> {
        if msg.args().is_empty() {
            let text = format!(
                t!("router.missing_subcommand"),
                usage = self.spec.usage_statement()
            );
            return msg.reply(&text).await;
        }
        let next = msg.args_mut().remove(0).to_lowercase();
        msg.set_command_name(next);
        self.children.process_with(msg, ctx.clone()).await;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

impl<C> std::fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.spec.name)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// Collects children before the route table is frozen.
pub struct RouterBuilder<C> {
    spec: CommandSpec,
    children: Vec<Arc<dyn Command<C>>>,
}

impl<C: Send + Sync> RouterBuilder<C> {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec = self.spec.description(description);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.spec = self.spec.alias(alias);
        self
    }

    pub fn allow_user(mut self, user: impl Into<String>) -> Self {
        self.spec = self.spec.allow_user(user);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.spec = self.spec.disabled(disabled);
        self
    }

    pub fn command<T>(mut self, child: T) -> Self
    where
        T: Command<C> + 'static,
    {
        self.children.push(Arc::new(child));
        self
    }

    pub fn shared(mut self, child: Arc<dyn Command<C>>) -> Self {
        self.children.push(child);
        self
    }

    /// Freezes the route table. At least one child is required; the
    /// computed usage statement lists the children sorted by name.
    pub fn build(self) -> Result<Router<C>, SetupError> {
        if self.children.is_empty() {
            return Err(SetupError::ChildlessRouter {
                name: self.spec.name.clone(),
            });
        }

        let mut names: Vec<&str> = self
            .children
            .iter()
            .map(|child| child.spec().name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        let usage = format!("{} [{}]", self.spec.name, names.join("|"));

        let depth = 1 + self
            .children
            .iter()
            .map(|child| child.depth())
            .max()
            .unwrap_or(0);

        let mut children = Dispatcher::new().formatter(
            Formatter::new().nocommand(|_, _| Some(t!("router.unknown_subcommand").to_string())),
        );
        for child in self.children {
            children.register(crate::core::registry::Registration::shared(child))?;
        }

        // Residual tokens all belong to the children; each level enforces
        // its own arity after the descent.
        let mut spec = self.spec.usage(usage);
        spec.max_args = None;

        Ok(Router {
            spec,
            children,
            depth,
        })
    }
}

// MARK: --- UNIT TESTS ---
