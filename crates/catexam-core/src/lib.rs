//! catexam-core — Computerized adaptive testing engine.
//!
//! This crate defines the item model, the ability estimator, the two-phase
//! item selector, the stopping rule, and the [`session::CatSession`]
//! orchestrator that sequences them for a single exam attempt.

pub mod bank;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod grader;
pub mod model;
pub mod parser;
pub mod report;
pub mod selector;
pub mod session;
pub mod statistics;
pub mod stopping;

pub use bank::ItemBank;
pub use config::CatConfig;
pub use error::{CatError, SubmissionRejection};
pub use model::{Answer, Domain, Item, ItemKind, ItemType, Response};
pub use session::CatSession;
pub use stopping::{ExamStatus, StopReason, Termination, Verdict};
