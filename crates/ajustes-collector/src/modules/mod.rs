//! 정산 데이터 수집 모듈.

pub mod date_range;
pub mod settlement_collect;

pub use date_range::pending_dates;
pub use settlement_collect::{
    DateOutcome, DateStatus, FailureReason, RunReport, SettlementBatch, SkipReason,
};
