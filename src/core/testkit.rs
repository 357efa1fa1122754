// src/core/testkit.rs

//! Shared test doubles for the core test modules.

use crate::core::command::Message;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory message that records every reply it receives.
pub struct MockMessage {
    name: String,
    args: Vec<String>,
    author: String,
    fail_replies: bool,
    replies: Mutex<Vec<String>>,
}

impl MockMessage {
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            author: "tester".to_string(),
            fail_replies: false,
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Makes every `reply` call fail, simulating a dead channel.
    pub fn with_failing_replies(mut self) -> Self {
        self.fail_replies = true;
        self
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.replies().last().cloned()
    }
}

#[async_trait]
impl Message for MockMessage {
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
        if self.fail_replies {
            anyhow::bail!("channel closed");
        }
        self.replies.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

/// Stand-in host client for context threading tests.
pub struct TestClient {
    pub tag: String,
}

impl TestClient {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
        }
    }
}
