//! 결과 파일 저장소.

pub mod csv_store;

pub use csv_store::{ArtifactStore, DATE_PLACEHOLDER, DEFAULT_FILE_PATTERN};
