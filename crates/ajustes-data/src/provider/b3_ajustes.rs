//! B3 정산가(ajustes do pregão) 페이지 조회.
//!
//! 일자를 `DD/MM/YYYY`로 포맷해 고정 URL 템플릿에 대입한 뒤 GET 요청을 한 번 보냅니다.
//!
//! ## 사용 예시
//! ```rust,ignore
//! let fetcher = B3AjustesFetcher::new(DEFAULT_URL_TEMPLATE, Duration::from_secs(30))?;
//! let html = fetcher.fetch(NaiveDate::from_ymd_opt(2023, 12, 26).unwrap()).await?;
//! ```

use std::time::Duration;

use ajustes_core::format_source_date;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use thiserror::Error;

use super::PageSource;
use crate::error::{DataError, Result};
use crate::storage::DATE_PLACEHOLDER;

/// B3 정산가 페이지 URL 템플릿 (`{data}` = DD/MM/YYYY)
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www2.bmf.com.br/pages/portal/bmfbovespa/lumis/lum-ajustes-do-pregao-ptBR.asp?dData1={data}";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 페이지 조회 실패.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP 요청 실패 ({url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP 상태 {status} ({url})")]
    Status { url: String, status: u16 },

    #[error("응답 본문 읽기 실패 ({url}): {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// B3 정산가 페이지 HTTP 조회기
pub struct B3AjustesFetcher {
    client: Client,
    url_template: String,
}

impl B3AjustesFetcher {
    /// URL 템플릿과 요청 타임아웃으로 생성
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url_template = url_template.into();
        if !url_template.contains(DATE_PLACEHOLDER) {
            return Err(DataError::ConfigError(format!(
                "URL 템플릿에 {} 자리표시자가 없습니다: {}",
                DATE_PLACEHOLDER, url_template
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            url_template,
        })
    }

    /// 해당 일자의 페이지 URL
    pub fn url(&self, date: NaiveDate) -> String {
        self.url_template
            .replace(DATE_PLACEHOLDER, &format_source_date(date))
    }

    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageSource for B3AjustesFetcher {
    async fn fetch(&self, date: NaiveDate) -> std::result::Result<String, FetchError> {
        let url = self.url(date);
        tracing::trace!(date = %date, url = %url, "페이지 요청");

        match self.fetch_text(&url).await {
            Ok(text) => {
                tracing::trace!(date = %date, bytes = text.len(), "페이지 수신");
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(date = %date, url = %url, error = %e, "페이지 조회 실패");
                Err(e)
            }
        }
    }
}
