// src/core/loader.rs

//! Directory-driven registration. Every file in the given directory is a
//! TOML command manifest naming the handler that implements it; the pair
//! becomes a regular registered command. One bad file fails the whole
//! pass, so a broken deployment never half-loads.

use crate::core::command::{Command, CommandSpec, Handler, Message};
use crate::core::dispatcher::Context;
use crate::core::registry::{Registration, Registry};
use crate::error::SetupError;
use crate::models::CommandManifest;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Handler implementations keyed by the name manifests refer to them by.
pub type HandlerMap<C> = HashMap<String, Arc<dyn Handler<C>>>;

/// A manifest-built command: declarative identity from the file, behavior
/// from the resolved handler.
struct ManifestCommand<C> {
    spec: CommandSpec,
    handler: Arc<dyn Handler<C>>,
}

#[async_trait]
impl<C: Send + Sync> Command<C> for ManifestCommand<C> {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, msg: &mut dyn Message, ctx: &Context<C>) -> Result<()> {
        self.handler.handle(msg, ctx).await
    }
}

/// Parses every regular file in `dir` as a manifest and registers the
/// resulting commands, in file name order. Sub-directories are skipped.
/// Returns how many commands were registered.
pub fn populate_dir<C: Send + Sync + 'static>(
    registry: &mut Registry<C>,
    dir: impl AsRef<Path>,
    handlers: &HandlerMap<C>,
) -> Result<usize, SetupError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| SetupError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SetupError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut registered = 0;
    for path in files {
        register_manifest(registry, &path, handlers)?;
        registered += 1;
    }
    log::debug!("Populated {} command(s) from '{}'", registered, dir.display());
    Ok(registered)
}

fn register_manifest<C: Send + Sync + 'static>(
    registry: &mut Registry<C>,
    path: &Path,
    handlers: &HandlerMap<C>,
) -> Result<(), SetupError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SetupError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: CommandManifest =
        toml::from_str(&raw).map_err(|source| SetupError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    let Some(handler) = handlers.get(&manifest.handler).cloned() else {
        return Err(SetupError::UnknownHandler {
            path: path.to_path_buf(),
            handler: manifest.handler,
        });
    };

    registry.register(Registration::one(ManifestCommand {
        spec: manifest.into_spec(),
        handler,
    }))
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testkit::MockMessage;

    struct ReplyHandler(&'static str);

    #[async_trait]
    impl Handler<()> for ReplyHandler {
        async fn handle(&self, msg: &mut dyn Message, _ctx: &Context<()>) -> Result<()> {
            msg.reply(self.0).await
        }
    }

    fn handlers(pairs: &[(&str, &'static str)]) -> HandlerMap<()> {
        pairs
            .iter()
            .map(|(name, reply)| {
                (
                    name.to_string(),
                    Arc::new(ReplyHandler(reply)) as Arc<dyn Handler<()>>,
                )
            })
            .collect()
    }

    const BAN_MANIFEST: &str = r#"
name = "ban"
handler = "moderation.ban"
description = "Bans a user."
aliases = ["b"]

[[args]]
name = "user"
type = "User"

[[args]]
name = "reason"
type = "String"
required = false
"#;

    const PING_MANIFEST: &str = r#"
name = "ping"
handler = "fun.ping"
"#;

    #[test]
    fn populates_every_manifest_in_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ban.toml"), BAN_MANIFEST).unwrap();
        std::fs::write(dir.path().join("ping.toml"), PING_MANIFEST).unwrap();

        let mut registry: Registry<()> = Registry::new();
        let handlers = handlers(&[("moderation.ban", "banned"), ("fun.ping", "pong")]);
        let count = populate_dir(&mut registry, dir.path(), &handlers).unwrap();

        assert_eq!(count, 2);
        assert!(registry.contains("ban"));
        assert!(registry.contains("b"));
        assert!(registry.contains("ping"));

        let ban = registry.get("ban").unwrap();
        assert_eq!(ban.spec().min_args, 1);
        assert_eq!(ban.spec().max_args, Some(2));
    }

    #[tokio::test]
    async fn a_built_command_runs_its_handler() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ping.toml"), PING_MANIFEST).unwrap();

        let mut registry: Registry<()> = Registry::new();
        let handlers = handlers(&[("fun.ping", "pong")]);
        populate_dir(&mut registry, dir.path(), &handlers).unwrap();

        let command = registry.get("ping").unwrap();
        let mut msg = MockMessage::new("ping", &[]);
        command.run(&mut msg, &Context::new()).await.unwrap();

        assert_eq!(msg.last_reply().as_deref(), Some("pong"));
    }

    #[test]
    fn an_unknown_handler_name_fails_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ping.toml"), PING_MANIFEST).unwrap();

        let mut registry: Registry<()> = Registry::new();
        let err = populate_dir(&mut registry, dir.path(), &handlers(&[])).unwrap_err();

        assert!(matches!(err, SetupError::UnknownHandler { handler, .. } if handler == "fun.ping"));
        assert!(registry.is_empty());
    }

    #[test]
    fn a_malformed_manifest_fails_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.toml"), "name = = nope").unwrap();

        let mut registry: Registry<()> = Registry::new();
        let err = populate_dir(&mut registry, dir.path(), &handlers(&[])).unwrap_err();

        assert!(matches!(err, SetupError::ManifestParse { .. }));
    }

    #[test]
    fn a_missing_directory_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry: Registry<()> = Registry::new();
        let err =
            populate_dir(&mut registry, dir.path().join("absent"), &handlers(&[])).unwrap_err();

        assert!(matches!(err, SetupError::DirectoryRead { .. }));
    }

    #[test]
    fn sub_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("ping.toml"), PING_MANIFEST).unwrap();

        let mut registry: Registry<()> = Registry::new();
        let handlers = handlers(&[("fun.ping", "pong")]);
        let count = populate_dir(&mut registry, dir.path(), &handlers).unwrap();

        assert_eq!(count, 1);
    }
}
