// src/constants.rs

/// Default type tag assigned to command definitions.
pub const KIND_COMMAND: &str = "command";

/// Conventional type tag for definitions excluded from help listings.
pub const KIND_HIDDEN: &str = "hidden";

/// Slot name a manifest variadic tail falls back to.
pub const DEFAULT_VARIADIC_NAME: &str = "text";

pub const DEFAULT_VARIADIC_LABEL: &str = "String[]";
