//! pt-BR 숫자 형식 파싱.
//!
//! B3 페이지는 천 단위 구분자로 `.`, 소수점으로 `,`를 사용합니다.
//! (예: `"1.234,56"` = 1234.56)

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};

/// 천 단위 구분자.
pub const BR_THOUSANDS_SEPARATOR: char = '.';

/// 소수점 구분자.
pub const BR_DECIMAL_SEPARATOR: char = ',';

/// pt-BR 형식 숫자 파싱.
///
/// 빈 셀과 `-`는 값 없음(`None`)으로 취급합니다.
///
/// - `"1.234,56"` -> `Some(1234.56)`
/// - `"-0,75"` -> `Some(-0.75)`
/// - `""` -> `None`
/// - `"abc"` -> `Err(InvalidNumber)`
pub fn parse_br_decimal(text: &str) -> CoreResult<Option<Decimal>> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Ok(None);
    }

    let unsigned = text.strip_prefix('+').unwrap_or(text);

    let normalized: String = unsigned
        .chars()
        .filter(|c| *c != BR_THOUSANDS_SEPARATOR)
        .map(|c| if c == BR_DECIMAL_SEPARATOR { '.' } else { c })
        .collect();

    let valid = normalized
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && c == '-'));
    if !valid || !normalized.chars().any(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidNumber(text.to_string()));
    }

    Decimal::from_str(&normalized)
        .map(Some)
        .map_err(|_| CoreError::InvalidNumber(text.to_string()))
}
