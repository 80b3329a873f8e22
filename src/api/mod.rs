//! HTTP surface: the chat turn endpoint, the summarization proxy, and a
//! health probe, mounted by `router`.

pub mod endpoints;
pub mod error;
pub mod registry;
pub mod router;
pub mod types;
