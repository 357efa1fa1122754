// src/core/mod.rs

pub mod arg_parser;
pub mod command;
pub mod dispatcher;
pub mod formatter;
pub mod loader;
pub mod registry;
pub mod router;

#[cfg(test)]
pub mod testkit;
