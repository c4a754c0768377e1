/// Local kubectl client
pub mod client;
pub mod models;

pub use client::KubectlClient;
