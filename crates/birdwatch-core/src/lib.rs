//! # birdwatch-core
//!
//! Job, event, and configuration interfaces shared by the queue, worker, and
//! observer crates.
//!
//! This crate carries no IO and no behavior beyond deriving a job's canonical
//! id: it is the glue that lets `birdwatch-queue`, `birdwatch-observer`, and
//! `birdwatch-worker` agree on what a job and an event look like without any
//! of them depending on each other.

mod config;
mod event;
mod job;
mod processor;
mod time;

pub use config::Config;
pub use event::{ActionKind, Event, Severity};
pub use job::{canonical_id, Job, JobStatus};
pub use processor::Processor;
pub use time::now_ms;

/// Re-export of `async_trait`, for crates implementing [`Processor`].
pub use async_trait::async_trait;
