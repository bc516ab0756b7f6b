//! whaling-reconcile
//!
//! Reconciliation Engine
//!
//! - Diff the stored account snapshot against a live statistics fetch
//! - Credit each eligible ship at most once, on a detected win
//! - Track ship lifecycle (addition, ineligible removal, left garage)
//! - Resource totals are recomputed from the ship entries on every run
//!
//! Deterministic, pure logic. No IO. The caller fetches, persists and emits.

mod context;
mod credit;
mod engine;
mod global;
mod win;

pub use context::PromotionContext;
pub use credit::{credit_manually, CreditError};
pub use engine::{merge_port_placeholders, LiveFetch, ReconcileOutcome, Reconciler};
pub use global::{global_statistics, GlobalStatistics};
pub use win::{detect_win, detect_win_from_zero};
