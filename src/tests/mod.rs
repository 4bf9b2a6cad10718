//! End-to-end tests for the cleanup engine and the HTTP trigger, using
//! in-memory SQLite plus mock email/billing collaborators.

mod engine;
