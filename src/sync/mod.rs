// src/sync/mod.rs

//! Differential synchronization engine
//!
//! Given one generation of source records and the current target tables,
//! the engine computes what differs ([`compare`]), turns that into typed
//! actions ([`recommend`]), applies them under a conflict policy
//! ([`executor`]), recounts both sides ([`verify`]) and assembles a run
//! report ([`report`]). The [`orchestrator`] sequences all of it.

pub mod compare;
pub mod executor;
pub mod orchestrator;
pub mod recommend;
pub mod report;
pub mod verify;

pub use compare::{compare_records, Comparator, ComparisonResult, SourceIndex};
pub use executor::{ConflictPolicy, SyncCounts, SyncExecutor, SyncResult, SyncStatistics};
pub use orchestrator::{Orchestrator, Stage, SyncOptions};
pub use recommend::{generate_recommendations, SyncAction, SyncRecommendation};
pub use report::{EntityStatus, RunReport};
pub use verify::{EntityVerification, SyncStatus, VerificationReport, VerificationReporter};
