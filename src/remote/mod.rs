// ABOUTME: Remote backend access for the import console
// ABOUTME: REST client, wire models and the backend trait the orchestration code depends on

pub mod backend;
pub mod client;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::ImportBackend;
pub use client::ApiClient;
