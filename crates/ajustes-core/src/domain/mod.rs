//! 정산 데이터 도메인 모델.

mod settlement;

pub use settlement::*;
