//! HTTP plumbing shared by the acquirer and the checklist fetcher.

mod client;

pub use client::{extract_domain, HttpClient};
