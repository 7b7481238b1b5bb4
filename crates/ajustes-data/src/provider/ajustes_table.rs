//! 정산 테이블 추출기.
//!
//! 페이지 HTML에서 `id="tblDadosAjustes"` 테이블을 찾아 [`SettlementTable`]로 변환합니다.
//!
//! ## 추출 규칙
//! - 일치하는 테이블 0개: 빈 테이블 (주말/공휴일/데이터 없음)
//! - 일치하는 테이블 1개: 6개 컬럼을 표준 이름으로 매핑, 상품명 LOCF 적용
//! - 일치하는 테이블 2개 이상: [`ExtractError::MultipleTables`]
//!
//! 숫자 셀은 pt-BR 형식(`.` 천 단위, `,` 소수점)으로 파싱합니다.
//! 숫자가 아닌 셀은 [`ExtractError::MalformedCell`]입니다.
//!
//! `colspan`은 셀 값을 병합된 컬럼마다 복사하고, `rowspan`은 아래 행의
//! 같은 컬럼에 셀 값을 이어 붙입니다.

use ajustes_core::{
    parse_br_decimal, SettlementRecord, SettlementTable, SETTLEMENT_COLUMNS,
    SETTLEMENT_COLUMN_COUNT,
};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::error::{DataError, Result};

/// B3 정산 테이블 ID
pub const DEFAULT_TABLE_ID: &str = "tblDadosAjustes";

/// 페이지 구조 가정이 깨진 경우의 추출 에러.
///
/// "데이터 없음"과 구분되며 호출자가 무시해서는 안 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("정산 테이블이 하나여야 하지만 {count}개 발견")]
    MultipleTables { count: usize },

    #[error("정산 테이블 컬럼 수 불일치: 기대 {expected}, 실제 {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("{row}번째 행 {column} 컬럼이 숫자가 아님: {text:?}")]
    MalformedCell {
        row: usize,
        column: &'static str,
        text: String,
    },
}

// HTML 표준 상한
const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

/// 정산 테이블 추출기
#[derive(Debug, Clone)]
pub struct AjustesTableExtractor {
    table_id: String,
}

impl Default for AjustesTableExtractor {
    fn default() -> Self {
        Self {
            table_id: DEFAULT_TABLE_ID.to_string(),
        }
    }
}

impl AjustesTableExtractor {
    /// 테이블 ID로 생성
    pub fn new(table_id: impl Into<String>) -> Result<Self> {
        let extractor = Self {
            table_id: table_id.into(),
        };
        extractor.table_selector()?;
        Ok(extractor)
    }

    /// 대상 테이블 ID
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    fn table_selector(&self) -> Result<Selector> {
        let css = format!("table[id=\"{}\"]", self.table_id.replace('"', "\\\""));
        Selector::parse(&css).map_err(|e| {
            DataError::ConfigError(format!("잘못된 테이블 ID {:?}: {:?}", self.table_id, e))
        })
    }

    /// 페이지 HTML에서 정산 테이블 추출
    pub fn extract(&self, html: &str) -> std::result::Result<SettlementTable, ExtractError> {
        let Ok(table_selector) = self.table_selector() else {
            return Ok(SettlementTable::Empty);
        };

        let document = Html::parse_document(html);
        let tables: Vec<ElementRef> = document.select(&table_selector).collect();

        match tables.len() {
            0 => {
                tracing::debug!(table_id = %self.table_id, "정산 테이블 없음");
                Ok(SettlementTable::Empty)
            }
            1 => parse_table(tables[0]),
            count => Err(ExtractError::MultipleTables { count }),
        }
    }
}

/// 테이블 행 하나의 셀 텍스트
struct RawRow {
    header: bool,
    cells: Vec<String>,
}

fn parse_table(table: ElementRef<'_>) -> std::result::Result<SettlementTable, ExtractError> {
    let rows = collect_rows(table);

    let header_width = rows
        .iter()
        .filter(|r| r.header)
        .last()
        .map(|r| r.cells.len());

    let data_rows: Vec<&RawRow> = rows
        .iter()
        .filter(|r| !r.header && r.cells.iter().any(|c| !c.is_empty()))
        .collect();

    let width = header_width.or_else(|| data_rows.first().map(|r| r.cells.len()));
    match width {
        Some(found) if found != SETTLEMENT_COLUMN_COUNT => {
            return Err(ExtractError::ColumnCount {
                expected: SETTLEMENT_COLUMN_COUNT,
                found,
            });
        }
        None => {
            tracing::debug!("정산 테이블에 행 없음");
            return Ok(SettlementTable::Empty);
        }
        _ => {}
    }

    let mut records = Vec::with_capacity(data_rows.len());
    for (index, row) in data_rows.into_iter().enumerate() {
        if row.cells.len() != SETTLEMENT_COLUMN_COUNT {
            return Err(ExtractError::ColumnCount {
                expected: SETTLEMENT_COLUMN_COUNT,
                found: row.cells.len(),
            });
        }
        records.push(to_record(index + 1, &row.cells)?);
    }

    Ok(SettlementTable::from_records(records))
}

fn to_record(row: usize, cells: &[String]) -> std::result::Result<SettlementRecord, ExtractError> {
    let number = |column: usize| {
        parse_br_decimal(&cells[column]).map_err(|_| ExtractError::MalformedCell {
            row,
            column: SETTLEMENT_COLUMNS[column],
            text: cells[column].clone(),
        })
    };

    Ok(SettlementRecord {
        commodity: cells[0].clone(),
        expiration: cells[1].clone(),
        previous_settlement: number(2)?,
        current_settlement: number(3)?,
        variation: number(4)?,
        settlement_per_contract: number(5)?,
    })
}

/// 위 행의 rowspan 셀이 아래 행에 남긴 값
struct RowSpan {
    text: String,
    remaining: usize,
}

/// 해당 컬럼에 이어지는 rowspan 값을 꺼냄
fn take_row_span(carry: &mut [Option<RowSpan>], column: usize) -> Option<String> {
    let slot = carry.get_mut(column)?;
    let span = slot.as_mut()?;
    let text = span.text.clone();
    span.remaining -= 1;
    if span.remaining == 0 {
        *slot = None;
    }
    Some(text)
}

fn span_attr(cell: ElementRef<'_>, name: &str, max: usize) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(1, |n| n.min(max))
}

fn collect_rows(table: ElementRef<'_>) -> Vec<RawRow> {
    // 셀렉터 리터럴은 항상 유효
    let (Ok(tr_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("th, td"))
    else {
        return Vec::new();
    };

    let mut carry: Vec<Option<RowSpan>> = Vec::new();
    let mut rows = Vec::new();

    for tr in table
        .select(&tr_selector)
        .filter(|tr| owning_table(*tr) == Some(table))
    {
        let mut all_th = true;
        let mut own_cells = 0;
        let mut cells = Vec::new();

        for cell in tr.select(&cell_selector) {
            if cell.parent().and_then(ElementRef::wrap) != Some(tr) {
                continue;
            }
            while let Some(text) = take_row_span(&mut carry, cells.len()) {
                cells.push(text);
            }
            own_cells += 1;
            if cell.value().name() != "th" {
                all_th = false;
            }

            let text = cell_text(cell);
            let rowspan = span_attr(cell, "rowspan", MAX_ROWSPAN);
            for _ in 0..span_attr(cell, "colspan", MAX_COLSPAN) {
                if rowspan > 1 {
                    let column = cells.len();
                    if carry.len() <= column {
                        carry.resize_with(column + 1, || None);
                    }
                    carry[column] = Some(RowSpan {
                        text: text.clone(),
                        remaining: rowspan - 1,
                    });
                }
                cells.push(text.clone());
            }
        }
        while let Some(text) = take_row_span(&mut carry, cells.len()) {
            cells.push(text);
        }

        if cells.is_empty() {
            continue;
        }
        rows.push(RawRow {
            header: in_thead(tr) || (all_th && own_cells > 0),
            cells,
        });
    }

    rows
}

/// 셀 텍스트 (앞뒤 공백 제거, 내부 공백 축약)
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 행이 속한 가장 가까운 table 요소
fn owning_table(tr: ElementRef<'_>) -> Option<ElementRef<'_>> {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn in_thead(tr: ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|e| e.value().name() != "table")
        .any(|e| e.value().name() == "thead")
}
