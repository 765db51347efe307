//! Session-level tests driving the engine through events.
//!
//! These run the full event path (handlers, operations, background fetches)
//! against the in-memory fixture service.

mod concurrency;
mod scenarios;
mod support;
