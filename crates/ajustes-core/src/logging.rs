//! tracing 로깅 초기화.
//!
//! 레벨은 수집기 crate들(`ajustes_*`)에만 적용되며 reqwest, hyper 같은
//! 외부 crate 로그는 `warn` 이상만 출력합니다. `RUST_LOG`가 있으면 그 값을 그대로 사용합니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 레벨 필터가 적용되는 crate 목록
pub const LOG_TARGETS: [&str; 3] = ["ajustes_core", "ajustes_data", "ajustes_collector"];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 색상이 포함된 여러 줄 형식
    Pretty,
    /// JSON 형식 (로그 수집용)
    Json,
    /// 한 줄 형식
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 레벨 (`info`) 또는 전체 필터 지시문 (`ajustes_data=debug,warn`)
    pub level: String,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// `EnvFilter` 지시문.
    ///
    /// 단순 레벨이면 [`LOG_TARGETS`]에만 적용하고, `=`나 `,`가 포함되면 그대로 사용합니다.
    pub fn filter_directive(&self) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            return level.to_string();
        }

        let mut directive = String::from("warn");
        for target in LOG_TARGETS {
            directive.push_str(&format!(",{}={}", target, level));
        }
        directive
    }
}

/// 로깅 시스템 초기화.
///
/// ```no_run
/// use ajustes_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directive()))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init()?,
    }

    tracing::debug!(format = ?config.format, level = %config.level, "로깅 초기화 완료");
    Ok(())
}

/// 거래일(과 워커 번호) 필드가 포함된 span 생성.
#[macro_export]
macro_rules! settlement_span {
    ($name:expr, $date:expr) => {
        tracing::info_span!($name, date = %$date)
    };
    ($name:expr, $date:expr, $worker:expr) => {
        tracing::info_span!($name, date = %$date, worker = $worker)
    };
}
