//! 에러 타입 정의.

use std::fmt;

use ajustes_data::DataError;

/// Collector 에러 타입.
///
/// 실행 전체를 중단해야 하는 에러만 표현합니다. 일자별 실패는
/// [`DateStatus::Failed`](crate::DateStatus::Failed)로 기록됩니다.
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 데이터 계층 에러 (출력 디렉토리 생성 실패 등)
    Data(DataError),
    /// 입출력 에러 (대화형 메뉴)
    Io(std::io::Error),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Data(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ajustes_core::CoreError> for CollectorError {
    fn from(err: ajustes_core::CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
