//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a store.
//!
//! # Tasks
//! - Expiry reaper: deletes expired rows at the configured GC interval

mod reaper;

pub(crate) use reaper::spawn_reaper;
