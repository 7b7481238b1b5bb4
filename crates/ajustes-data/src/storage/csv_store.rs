//! 일자별 CSV 결과 파일 저장소.
//!
//! 거래일 하나당 파일 하나를 `<output_dir>/<pattern>`에 기록합니다.
//! 파일 존재 여부가 해당 일자의 수집 완료를 나타내는 유일한 신호이므로
//! 임시 파일에 먼저 쓴 뒤 최종 경로로 rename합니다.

use std::fs;
use std::path::{Path, PathBuf};

use ajustes_core::{format_artifact_date, SettlementTable};
use chrono::NaiveDate;

use crate::error::{DataError, Result};

/// 파일명 패턴 및 URL 템플릿의 날짜 자리표시자
pub const DATE_PLACEHOLDER: &str = "{data}";

/// 기본 파일명 패턴
pub const DEFAULT_FILE_PATTERN: &str = "Ajustes_{data}.csv";

/// 일자별 결과 파일 저장소
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    file_pattern: String,
}

impl ArtifactStore {
    /// 출력 디렉토리와 파일명 패턴으로 생성.
    ///
    /// 패턴에는 `{data}` 자리표시자가 있어야 하며 경로 구분자를 포함할 수 없습니다.
    pub fn new(output_dir: impl Into<PathBuf>, file_pattern: impl Into<String>) -> Result<Self> {
        let file_pattern = file_pattern.into();
        if !file_pattern.contains(DATE_PLACEHOLDER) {
            return Err(DataError::ConfigError(format!(
                "파일명 패턴에 {} 자리표시자가 없습니다: {}",
                DATE_PLACEHOLDER, file_pattern
            )));
        }
        if file_pattern.contains('/') || file_pattern.contains('\\') {
            return Err(DataError::ConfigError(format!(
                "파일명 패턴에 경로 구분자를 사용할 수 없습니다: {}",
                file_pattern
            )));
        }

        Ok(Self {
            output_dir: output_dir.into(),
            file_pattern,
        })
    }

    /// 출력 디렉토리
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 파일명 패턴
    pub fn file_pattern(&self) -> &str {
        &self.file_pattern
    }

    /// 해당 일자의 파일명 (예: "Ajustes_2023-12-26.csv")
    pub fn file_name(&self, date: NaiveDate) -> String {
        self.file_pattern
            .replace(DATE_PLACEHOLDER, &format_artifact_date(date))
    }

    /// 해당 일자의 결과 파일 경로
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(self.file_name(date))
    }

    /// 결과 파일 존재 여부
    pub fn exists(&self, date: NaiveDate) -> bool {
        self.path_for(date).is_file()
    }

    /// 출력 디렉토리 생성 (이미 있으면 무시)
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// 정산 테이블 저장.
    ///
    /// 빈 테이블은 파일을 만들지 않고 `None`을 반환합니다.
    pub fn write(&self, date: NaiveDate, table: &SettlementTable) -> Result<Option<PathBuf>> {
        let SettlementTable::Rows(records) = table else {
            return Ok(None);
        };
        if records.is_empty() {
            return Ok(None);
        }

        let path = self.path_for(date);
        let tmp_path = self.output_dir.join(format!(".{}.tmp", self.file_name(date)));

        let written = (|| -> Result<()> {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
            Ok(())
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path)?;

        tracing::debug!(
            date = %date,
            path = %path.display(),
            rows = records.len(),
            "결과 파일 저장"
        );

        Ok(Some(path))
    }
}
