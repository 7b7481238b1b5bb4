//! 일일 정산 테이블.
//!
//! 한 거래일의 정산가 테이블을 표현합니다. 테이블은 완전히 비어 있거나
//! 고정된 6개 컬럼의 레코드로 구성됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 정산 테이블 컬럼 수
pub const SETTLEMENT_COLUMN_COUNT: usize = 6;

/// 정산 테이블 컬럼명 (출력 헤더 순서)
pub const SETTLEMENT_COLUMNS: [&str; SETTLEMENT_COLUMN_COUNT] = [
    "Mercadoria",
    "Vencimento",
    "AjusteAnterior",
    "AjusteAtual",
    "Variacao",
    "AjustePorContrato",
];

/// 정산 레코드 (테이블 한 행)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// 상품명 (빈 값은 직전 행의 값으로 채워짐)
    #[serde(rename = "Mercadoria")]
    pub commodity: String,
    /// 만기 코드
    #[serde(rename = "Vencimento")]
    pub expiration: String,
    /// 전일 정산가
    #[serde(rename = "AjusteAnterior")]
    pub previous_settlement: Option<Decimal>,
    /// 당일 정산가
    #[serde(rename = "AjusteAtual")]
    pub current_settlement: Option<Decimal>,
    /// 변동
    #[serde(rename = "Variacao")]
    pub variation: Option<Decimal>,
    /// 계약당 정산 금액 (R$)
    #[serde(rename = "AjustePorContrato")]
    pub settlement_per_contract: Option<Decimal>,
}

/// 한 거래일의 정산 테이블.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettlementTable {
    /// 데이터 없음 (주말, 공휴일, 페이지 없음)
    #[default]
    Empty,
    /// 정산 레코드 목록
    Rows(Vec<SettlementRecord>),
}

impl SettlementTable {
    /// 레코드 목록으로 테이블 생성.
    ///
    /// 상품명 컬럼에 LOCF(forward-fill)를 적용하며, 레코드가 없으면 `Empty`를 반환합니다.
    pub fn from_records(mut records: Vec<SettlementRecord>) -> Self {
        if records.is_empty() {
            return Self::Empty;
        }
        forward_fill_commodity(&mut records);
        Self::Rows(records)
    }

    /// 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Rows(rows) => rows.is_empty(),
        }
    }

    /// 행 수
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Rows(rows) => rows.len(),
        }
    }

    /// 레코드 슬라이스 (비어 있으면 빈 슬라이스)
    pub fn records(&self) -> &[SettlementRecord] {
        match self {
            Self::Empty => &[],
            Self::Rows(rows) => rows,
        }
    }
}

/// 상품명 LOCF.
///
/// 빈 상품명은 위쪽의 가장 최근 비어 있지 않은 값을 상속합니다.
/// 첫 비어 있지 않은 값 이전의 빈 값은 그대로 둡니다.
pub fn forward_fill_commodity(records: &mut [SettlementRecord]) {
    let mut last: Option<String> = None;
    for record in records.iter_mut() {
        if record.commodity.trim().is_empty() {
            if let Some(ref value) = last {
                record.commodity = value.clone();
            }
        } else {
            last = Some(record.commodity.clone());
        }
    }
}
