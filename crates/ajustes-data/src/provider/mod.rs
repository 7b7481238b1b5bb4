//! 정산가 페이지 Provider.
//!
//! - [`PageSource`]: 일자별 페이지 원문 조회 추상화
//! - [`B3AjustesFetcher`]: B3 웹사이트 HTTP 구현
//! - [`AjustesTableExtractor`]: HTML에서 정산 테이블 추출

pub mod ajustes_table;
pub mod b3_ajustes;

pub use ajustes_table::{AjustesTableExtractor, ExtractError, DEFAULT_TABLE_ID};
pub use b3_ajustes::{B3AjustesFetcher, FetchError, DEFAULT_URL_TEMPLATE};

use async_trait::async_trait;
use chrono::NaiveDate;

/// 일자별 페이지 원문 조회.
///
/// 구현체는 요청을 정확히 한 번 수행하며 재시도하지 않습니다.
/// 실패는 패닉이 아닌 [`FetchError`]로 보고합니다.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// 해당 일자의 페이지 원문 조회
    async fn fetch(&self, date: NaiveDate) -> Result<String, FetchError>;
}
