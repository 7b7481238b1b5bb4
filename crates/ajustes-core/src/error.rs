//! 핵심 에러 타입.

use thiserror::Error;

/// 도메인 공통 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 숫자 파싱 에러 (pt-BR 형식)
    #[error("숫자 파싱 에러: {0:?}")]
    InvalidNumber(String),

    /// 날짜 파싱 에러
    #[error("날짜 파싱 에러: {0}")]
    InvalidDate(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
