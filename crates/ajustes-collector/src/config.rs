//! 수집기 설정 모듈.
//!
//! 설정 우선순위 (뒤쪽이 우선):
//! 1. 기본값
//! 2. TOML 설정 파일 (`--config` 또는 `AJUSTES_CONFIG`)
//! 3. 환경변수 (`AJUSTES_` 접두사, `.env` 지원)
//! 4. CLI 인자

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ajustes_core::parse_iso_date;
use ajustes_data::{
    AjustesTableExtractor, ArtifactStore, B3AjustesFetcher, DATE_PLACEHOLDER,
    DEFAULT_FILE_PATTERN, DEFAULT_TABLE_ID, DEFAULT_URL_TEMPLATE,
};
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CollectorError, Result};

/// 기본 출력 디렉토리
pub const DEFAULT_OUTPUT_DIR: &str = "./Database/AjusteDiario_raw";

/// 기본 수집 시작일: 오늘로부터 N일 전
pub const DEFAULT_LOOKBACK_DAYS: u64 = 1000;

/// 기본 HTTP 요청 타임아웃 (초)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_PREFIX: &str = "AJUSTES";

/// 로그 상세 수준.
///
/// tracing 필터와 별개로 일자별 메시지의 출력 여부를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Verbosity {
    /// 요약만 출력
    #[default]
    Silent,
    /// 일자별 처리 완료 메시지
    PerDate,
    /// 일자별 메시지 + 수집 대상 계산 진단 (주말, 기저장, 추가)
    Diagnostics,
}

impl Verbosity {
    /// 일자별 처리 완료 메시지 출력 여부
    pub fn per_date(self) -> bool {
        self >= Self::PerDate
    }

    /// 진단 메시지 출력 여부
    pub fn diagnostics(self) -> bool {
        self >= Self::Diagnostics
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::PerDate => "per-date",
            Self::Diagnostics => "diagnostics",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" | "none" | "0" => Ok(Self::Silent),
            "per-date" | "per_date" | "debug" | "1" => Ok(Self::PerDate),
            "diagnostics" | "all" | "2" => Ok(Self::Diagnostics),
            other => Err(format!(
                "Unknown verbosity: {} (silent, per-date, diagnostics)",
                other
            )),
        }
    }
}

impl TryFrom<String> for Verbosity {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Verbosity> for String {
    fn from(value: Verbosity) -> Self {
        value.as_str().to_string()
    }
}

/// 수집기 전체 설정
#[derive(Debug, Clone, Serialize)]
pub struct CollectorConfig {
    /// 수집 시작일 (포함)
    pub start_date: NaiveDate,
    /// 수집 종료일 (포함)
    pub end_date: NaiveDate,
    /// 결과 파일 디렉토리
    pub output_dir: PathBuf,
    /// 결과 파일명 패턴 (`{data}` = YYYY-MM-DD)
    pub file_pattern: String,
    /// 로그 상세 수준
    pub verbosity: Verbosity,
    /// 워커 수
    pub workers: usize,
    /// 페이지 URL 템플릿 (`{data}` = DD/MM/YYYY)
    pub url_template: String,
    /// 정산 테이블 ID
    pub table_id: String,
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

/// 설정 파일/환경변수 원본 형태
#[derive(Debug, Deserialize)]
struct RawConfig {
    start_date: Option<String>,
    end_date: Option<String>,
    output_dir: String,
    file_pattern: String,
    verbosity: Verbosity,
    workers: Option<usize>,
    url_template: String,
    table_id: String,
    request_timeout_secs: u64,
}

impl CollectorConfig {
    /// 기본값 설정 생성 (기간만 지정)
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_date,
            end_date,
            output_dir: output_dir.into(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            verbosity: Verbosity::default(),
            workers: detect_workers(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            table_id: DEFAULT_TABLE_ID.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// 기본값, 설정 파일, 환경변수에서 설정 로드.
    ///
    /// `path`가 없으면 `AJUSTES_CONFIG` 환경변수의 경로를 사용합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("AJUSTES_CONFIG").map(PathBuf::from));

        let mut builder = config::Config::builder()
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("file_pattern", DEFAULT_FILE_PATTERN)?
            .set_default("verbosity", Verbosity::default().as_str())?
            .set_default("url_template", DEFAULT_URL_TEMPLATE)?
            .set_default("table_id", DEFAULT_TABLE_ID)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?;

        if let Some(ref file_path) = file_path {
            builder = builder.add_source(config::File::from(file_path.as_path()).required(true));
        }

        let raw: RawConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        let config = Self::from_raw(raw, Local::now().date_naive())?;
        tracing::debug!(
            file = ?file_path,
            output_dir = %config.output_dir.display(),
            "설정 로드 완료"
        );
        Ok(config)
    }

    fn from_raw(raw: RawConfig, today: NaiveDate) -> Result<Self> {
        let (default_start, default_end) = default_date_range(today);

        let start_date = match raw.start_date {
            Some(s) => parse_iso_date(&s)?,
            None => default_start,
        };
        let end_date = match raw.end_date {
            Some(s) => parse_iso_date(&s)?,
            None => default_end,
        };

        let config = Self {
            start_date,
            end_date,
            output_dir: PathBuf::from(raw.output_dir),
            file_pattern: raw.file_pattern,
            verbosity: raw.verbosity,
            workers: raw.workers.unwrap_or_else(detect_workers),
            url_template: raw.url_template,
            table_id: raw.table_id,
            request_timeout_secs: raw.request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(CollectorError::Config(
                "workers는 1 이상이어야 합니다".to_string(),
            ));
        }
        if !self.file_pattern.contains(DATE_PLACEHOLDER) {
            return Err(CollectorError::Config(format!(
                "file_pattern에 {} 자리표시자가 필요합니다: {}",
                DATE_PLACEHOLDER, self.file_pattern
            )));
        }
        if !self.url_template.contains(DATE_PLACEHOLDER) {
            return Err(CollectorError::Config(format!(
                "url_template에 {} 자리표시자가 필요합니다: {}",
                DATE_PLACEHOLDER, self.url_template
            )));
        }
        if self.table_id.trim().is_empty() {
            return Err(CollectorError::Config("table_id가 비어 있습니다".to_string()));
        }
        Ok(())
    }

    /// HTTP 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 결과 파일 저장소 생성
    pub fn artifact_store(&self) -> Result<ArtifactStore> {
        Ok(ArtifactStore::new(&self.output_dir, &self.file_pattern)?)
    }

    /// 페이지 조회기 생성
    pub fn fetcher(&self) -> Result<B3AjustesFetcher> {
        Ok(B3AjustesFetcher::new(
            &self.url_template,
            self.request_timeout(),
        )?)
    }

    /// 테이블 추출기 생성
    pub fn extractor(&self) -> Result<AjustesTableExtractor> {
        Ok(AjustesTableExtractor::new(&self.table_id)?)
    }
}

/// 기본 수집 기간: (오늘 - 1000일, 어제)
pub fn default_date_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
        .unwrap_or(today);
    let end = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    (start, end)
}

/// 사용 가능한 하드웨어 병렬성 (감지 실패 시 1)
pub fn detect_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
