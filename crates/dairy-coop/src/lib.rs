//! Scoring and deduction scheduling core for dairy cooperative back offices.
//!
//! The crate exposes two sibling workflows: [`workflows::performance`] derives
//! per-farmer performance snapshots and risk assessments from collection history,
//! and [`workflows::deductions`] manages standing deductions and the ledger they
//! feed. Both read and write through the [`gateway::DataGateway`] abstraction.

pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod telemetry;
pub mod workflows;
