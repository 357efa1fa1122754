// src/core/command.rs

//! The command model: what a command *is* (identity, argument slots,
//! derived arity) and what it *does* (the async permission and execution
//! hooks). Hosts implement [`Message`] over their own platform type; the
//! dispatcher only ever sees these traits.

use crate::constants::KIND_COMMAND;
use crate::core::arg_parser::{ArgSpec, bind_positional};
use crate::core::dispatcher::Context;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// A platform message, reduced to what dispatch needs: a command name, the
/// residual tokens, and a way to answer.
#[async_trait]
pub trait Message: Send + Sync {
    fn command_name(&self) -> &str;

    /// Routers rewrite the name while descending into sub-commands.
    fn set_command_name(&mut self, name: String);

    fn args(&self) -> &[String];

    /// Dispatch truncates overflow tokens here; routers shift consumed ones.
    fn args_mut(&mut self) -> &mut Vec<String>;

    /// Stable identifier of the sender, as the platform defines it.
    fn author_id(&self) -> &str;

    /// Raw text for log lines. The default rebuilds it from name and args.
    fn text(&self) -> String {
        let mut text = self.command_name().to_string();
        for arg in self.args() {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }

    async fn reply(&self, content: &str) -> Result<()>;
}

/// Declarative identity of a command. Arity is derived while argument slots
/// are appended; `disabled` is the one field meant to be flipped after
/// construction.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    /// Type tag; anything other than `"command"` is skipped by the default
    /// help filter.
    pub kind: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub args: Vec<ArgSpec>,
    pub examples: Vec<String>,
    /// Overrides the computed usage statement when set.
    pub usage: Option<String>,
    /// Advisory restriction consulted by the default help filter only; the
    /// default permission hook does not enforce it.
    pub allowed_users: HashSet<String>,
    pub disabled: bool,
    pub min_args: usize,
    /// `None` once a variadic tail is appended: no upper bound.
    pub max_args: Option<usize>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: KIND_COMMAND.to_string(),
            description: String::new(),
            aliases: Vec::new(),
            args: Vec::new(),
            examples: Vec::new(),
            usage: None,
            allowed_users: HashSet::new(),
            disabled: false,
            min_args: 0,
            max_args: Some(0),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self.recompute_arity();
        self
    }

    pub fn args<I>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = ArgSpec>,
    {
        self.args.extend(specs);
        self.recompute_arity();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples.extend(examples.into_iter().map(Into::into));
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn allow_user(mut self, user: impl Into<String>) -> Self {
        self.allowed_users.insert(user.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Appends an unbounded tail: one required slot labelled with the raw
    /// `type_label` (conventionally `"String[]"`), and no upper arity bound
    /// from here on. `min_args` is deliberately left alone. Call this after
    /// the regular `arg` calls.
    pub fn variadic(mut self, name: impl Into<String>, type_label: Option<&str>) -> Self {
        self.args.push(ArgSpec::new(name, type_label, true));
        self.max_args = None;
        self
    }

    fn recompute_arity(&mut self) {
        self.min_args = self.args.iter().filter(|a| a.required).count();
        if self.max_args.is_some() {
            self.max_args = Some(self.args.len());
        }
    }

    /// Canonical name first, then every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Pairs residual tokens against this command's declared slots.
    pub fn bind(&self, tokens: &[String]) -> HashMap<String, String> {
        bind_positional(tokens, &self.args)
    }

    /// The `usage` override, or `<name> <required...> [optional...]` built
    /// from the visible argument fragments.
    pub fn usage_statement(&self) -> String {
        if let Some(usage) = &self.usage {
            return usage.clone();
        }
        let mut parts = vec![self.name.clone()];
        for spec in &self.args {
            let fragment = spec.usage_fragment();
            if !fragment.is_empty() {
                parts.push(fragment);
            }
        }
        parts.join(" ")
    }

    /// Multi-line help block for this command alone.
    pub fn help_statement(&self) -> String {
        let mut lines = vec![
            format!(t!("help.header"), name = self.name),
            String::new(),
        ];
        if !self.aliases.is_empty() {
            let known = self
                .aliases
                .iter()
                .map(|a| format!("`{}`", a))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(t!("help.aliases"), aliases = known));
        }
        lines.push(format!(t!("help.usage"), usage = self.usage_statement()));
        if !self.examples.is_empty() {
            lines.push(t!("help.examples").to_string());
            for example in &self.examples {
                lines.push(format!(
                    t!("help.example_entry"),
                    name = self.name,
                    example = example
                ));
            }
        }
        if !self.description.is_empty() {
            lines.push(format!(t!("help.description"), description = self.description));
        }
        lines.push(format!(t!("help.kind"), kind = self.kind));
        lines.join("\n")
    }
}

/// A dispatchable command. `C` is the host client type threaded through
/// every hook untouched.
#[async_trait]
pub trait Command<C: Send + Sync>: Send + Sync {
    fn spec(&self) -> &CommandSpec;

    /// Permission gate, consulted after arity passes. Errors funnel to the
    /// `error` formatter without a log line.
    async fn can_run(&self, _msg: &dyn Message, _ctx: &Context<C>) -> Result<bool> {
        Ok(true)
    }

    /// Execution hook. Errors funnel to the `error` formatter.
    async fn run(&self, _msg: &mut dyn Message, _ctx: &Context<C>) -> Result<()> {
        Ok(())
    }

    /// Sub-command nesting depth; plain commands sit at zero.
    fn depth(&self) -> usize {
        0
    }
}

/// Bare execution logic, pairable with a manifest-built [`CommandSpec`]
/// during directory population.
#[async_trait]
pub trait Handler<C: Send + Sync>: Send + Sync {
    async fn handle(&self, msg: &mut dyn Message, ctx: &Context<C>) -> Result<()>;
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arg_parser::variable_args;

    fn ban_spec() -> CommandSpec {
        CommandSpec::new("ban")
            .description("Bans a user.")
            .alias("b")
            .arg(ArgSpec::required("user", Some("User")))
            .arg(ArgSpec::optional("reason", None))
            .example("someone spam")
    }

    #[test]
    fn builder_derives_arity_from_args() {
        let spec = ban_spec();
        assert_eq!(spec.min_args, 1);
        assert_eq!(spec.max_args, Some(2));
    }

    #[test]
    fn variadic_unbounds_max_and_leaves_min() {
        let spec = CommandSpec::new("echo")
            .arg(ArgSpec::optional("prefix", None))
            .variadic("text", Some("String[]"));
        assert_eq!(spec.min_args, 0);
        assert_eq!(spec.max_args, None);
        assert_eq!(spec.usage_statement(), "echo [prefix] <String[] text>");
    }

    #[test]
    fn usage_statement_renders_fragments() {
        assert_eq!(ban_spec().usage_statement(), "ban <User user> [reason]");
    }

    #[test]
    fn usage_statement_skips_hidden_slots() {
        let spec = CommandSpec::new("tag").args(variable_args(3, "words", Some("String"), true));
        assert_eq!(spec.usage_statement(), "tag <String[] words>");
        assert_eq!(spec.min_args, 1);
        assert_eq!(spec.max_args, Some(3));
    }

    #[test]
    fn usage_override_wins() {
        let spec = ban_spec().usage("ban <someone>");
        assert_eq!(spec.usage_statement(), "ban <someone>");
    }

    #[test]
    fn help_statement_lists_every_section() {
        let rendered = ban_spec().help_statement();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.first(), Some(&"Help - *ban*"));
        assert_eq!(lines.get(1), Some(&""));
        assert_eq!(lines.get(2), Some(&"Also known as: `b`"));
        assert_eq!(lines.get(3), Some(&"Usage: `ban <User user> [reason]`"));
        assert_eq!(lines.get(4), Some(&"Examples:"));
        assert_eq!(lines.get(5), Some(&" `ban someone spam`"));
        assert_eq!(lines.get(6), Some(&"Description: `Bans a user.`"));
        assert_eq!(lines.get(7), Some(&"Type: command"));
    }

    #[test]
    fn help_statement_omits_empty_sections() {
        let rendered = CommandSpec::new("ping").help_statement();
        assert_eq!(
            rendered,
            "Help - *ping*\n\nUsage: `ping`\nType: command"
        );
    }

    #[test]
    fn names_yields_canonical_then_aliases() {
        let spec = ban_spec();
        let names: Vec<&str> = spec.names().collect();
        assert_eq!(names, vec!["ban", "b"]);
    }

    #[test]
    fn bind_uses_declared_slots() {
        let bound = ban_spec().bind(&["iris".to_string(), "spamming".to_string()]);
        assert_eq!(bound.get("user").map(String::as_str), Some("iris"));
        assert_eq!(bound.get("reason").map(String::as_str), Some("spamming"));
    }
}
