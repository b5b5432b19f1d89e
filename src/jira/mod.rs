mod api_types;
mod cache;
pub mod cached_client;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use cached_client::CachedJiraClient;
pub use client::JiraClient;
