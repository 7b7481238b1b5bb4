//! 정산 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - B3 정산가 페이지 조회 ([`B3AjustesFetcher`])
//! - HTML 정산 테이블 추출 ([`AjustesTableExtractor`])
//! - 일자별 CSV 결과 파일 저장소 ([`ArtifactStore`])

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

pub use provider::{
    AjustesTableExtractor, B3AjustesFetcher, ExtractError, FetchError, PageSource,
    DEFAULT_TABLE_ID, DEFAULT_URL_TEMPLATE,
};
pub use storage::{ArtifactStore, DATE_PLACEHOLDER, DEFAULT_FILE_PATTERN};
