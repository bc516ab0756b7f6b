//! whaling-runtime
//!
//! Orchestration around the pure engine:
//! - `schedule`: select due accounts, dispatch bounded batches, stamp
//!   `last_scheduled` with bounded parallelism
//! - `RefreshWorker`: process one batch, strictly sequentially, isolating
//!   per-account failures
//! - account enrollment, manual refresh and manual credit
//! - the in-process serve loop (interval scheduler + channel transport)

mod enroll;
mod manual;
mod scheduler;
mod serve;
mod worker;

pub use enroll::{enroll, EnrollRequest, Enrollment};
pub use manual::{
    collect_global_statistics, credit_ship, request_refresh, CreditServiceError,
    ManualRefreshError,
};
pub use scheduler::{schedule, watermark_for, ScheduleOptions, ScheduleReport};
pub use serve::{spawn_batch_consumer, spawn_scheduler_loop, ChannelTransport};
pub use worker::{AccountOutcome, BatchReport, Clock, RefreshWorker};
