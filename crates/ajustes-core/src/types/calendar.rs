//! 영업일 달력 유틸리티.
//!
//! 주말(토/일)만 제외합니다. 공휴일은 페이지에 데이터가 없는 것으로 처리됩니다.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{CoreError, CoreResult};

/// 소스 URL에 사용되는 날짜 형식 (DD/MM/YYYY)
pub const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";

/// 결과 파일명에 사용되는 날짜 형식 (YYYY-MM-DD)
pub const ARTIFACT_DATE_FORMAT: &str = "%Y-%m-%d";

/// 주말 여부 확인 (토요일/일요일)
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 영업일 여부 확인
pub fn is_business_day(date: NaiveDate) -> bool {
    !is_weekend(date)
}

/// 소스 URL용 날짜 문자열 (예: "26/12/2023")
pub fn format_source_date(date: NaiveDate) -> String {
    date.format(SOURCE_DATE_FORMAT).to_string()
}

/// 결과 파일명용 날짜 문자열 (예: "2023-12-26")
pub fn format_artifact_date(date: NaiveDate) -> String {
    date.format(ARTIFACT_DATE_FORMAT).to_string()
}

/// 날짜 문자열 파싱 (YYYY-MM-DD)
pub fn parse_iso_date(s: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ARTIFACT_DATE_FORMAT).map_err(|e| {
        CoreError::InvalidDate(format!("{}: {} (YYYY-MM-DD 형식이어야 합니다)", s.trim(), e))
    })
}

/// `start`부터 `end`까지(양끝 포함) 오름차순 달력 일자.
///
/// `start > end`이면 아무것도 반환하지 않습니다.
pub fn calendar_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekend_detection() {
        assert!(is_weekend(ymd(2023, 12, 23))); // 토
        assert!(is_weekend(ymd(2023, 12, 24))); // 일
        assert!(!is_weekend(ymd(2023, 12, 25)));
        assert!(is_business_day(ymd(2023, 12, 26)));
    }

    #[test]
    fn test_date_formats() {
        let date = ymd(2023, 6, 5);
        assert_eq!(format_source_date(date), "05/06/2023");
        assert_eq!(format_artifact_date(date), "2023-06-05");
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date(" 2024-01-15 ").unwrap(), ymd(2024, 1, 15));
        assert!(parse_iso_date("15/01/2024").is_err());
    }

    #[test]
    fn test_calendar_days_inclusive() {
        let days: Vec<_> = calendar_days(ymd(2023, 12, 30), ymd(2024, 1, 2)).collect();
        assert_eq!(
            days,
            vec![ymd(2023, 12, 30), ymd(2023, 12, 31), ymd(2024, 1, 1), ymd(2024, 1, 2)]
        );
        assert_eq!(calendar_days(ymd(2024, 1, 2), ymd(2024, 1, 1)).count(), 0);
        assert_eq!(calendar_days(ymd(2024, 1, 2), ymd(2024, 1, 2)).count(), 1);
    }
}
