include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod constants;
pub mod core;
pub mod error;
pub mod models;
