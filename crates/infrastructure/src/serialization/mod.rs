//! JSON helpers shared by settings persistence and resource parsing.

mod json;

pub use json::*;
