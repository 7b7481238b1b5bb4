//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 설정 오류 (URL 템플릿, 파일명 패턴, 테이블 ID 등)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 파일 입출력 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 직렬화 오류
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
