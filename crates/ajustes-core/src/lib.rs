//! # Ajustes Core
//!
//! B3 일일 정산가(ajustes do pregão) 수집기의 핵심 도메인 모델을 제공합니다.
//!
//! 이 크레이트는 수집 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 정산 레코드 및 정산 테이블
//! - 영업일 달력 유틸리티
//! - pt-BR 숫자 형식 파싱
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
