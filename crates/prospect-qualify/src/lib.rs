//! Geographic qualification of sales prospects.
//!
//! A [`qualification::RegionIndex`] resolves a prospect's location to the regions it belongs
//! to, a [`qualification::QualificationEvaluator`] applies one user's include/exclude rule to
//! that location, and a [`qualification::BatchQualifier`] drives ingested rows through the
//! evaluator before handing the whole batch to a [`qualification::ProspectRepository`].

pub mod config;
pub mod error;
pub mod qualification;
pub mod telemetry;
