// AI-assisted company research: news search, LLM description refresh and
// markdown snapshots archived to object storage.

pub mod handlers;
pub mod news;
pub mod prompts;
pub mod service;
pub mod snapshot;
