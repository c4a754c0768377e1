/// Shared helpers for subprocesses and retries
pub mod command;
pub mod retry;
