//! 통합 테스트: HTTP 페이지 조회 후 정산 테이블 추출.

use std::time::Duration;

use ajustes_core::SettlementTable;
use ajustes_data::{AjustesTableExtractor, ArtifactStore, B3AjustesFetcher, PageSource};
use chrono::NaiveDate;
use mockito::Matcher;
use rust_decimal_macros::dec;

const FIXTURE: &str = include_str!("fixtures/ajustes_2023-12-26.html");

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 서버에서 받은 페이지로 정산 테이블 추출
#[tokio::test]
async fn test_fetch_and_extract_fixture_page() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/lum-ajustes-do-pregao-ptBR.asp")
        .match_query(Matcher::UrlEncoded("dData1".into(), "26/12/2023".into()))
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(FIXTURE)
        .create_async()
        .await;

    let template = format!("{}/lum-ajustes-do-pregao-ptBR.asp?dData1={{data}}", server.url());
    let fetcher = B3AjustesFetcher::new(template, Duration::from_secs(5)).unwrap();
    let extractor = AjustesTableExtractor::default();

    let html = fetcher.fetch(ymd(2023, 12, 26)).await.expect("page should be fetched");
    let table = extractor.extract(&html).expect("single table expected");

    assert_eq!(table.len(), 5);
    let records = table.records();

    let commodities: Vec<&str> = records.iter().map(|r| r.commodity.as_str()).collect();
    assert_eq!(
        commodities,
        vec![
            "BGI - Boi gordo",
            "BGI - Boi gordo",
            "DI1 - DI de 1 dia",
            "DI1 - DI de 1 dia",
            "DOL - Dólar comercial",
        ]
    );

    assert_eq!(records[2].previous_settlement, Some(dec!(90010.8100)));
    assert_eq!(records[3].current_settlement, Some(dec!(81570.1100)));
    assert_eq!(records[4].variation, Some(dec!(-12.1230)));
    assert_eq!(records[4].settlement_per_contract, Some(dec!(-606.15)));
}

/// 공휴일 페이지에는 정산 테이블이 없음
#[tokio::test]
async fn test_holiday_page_yields_empty_table() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/ajustes")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html><body><p>Não há dados para a data consultada.</p></body></html>")
        .create_async()
        .await;

    let template = format!("{}/ajustes?dData1={{data}}", server.url());
    let fetcher = B3AjustesFetcher::new(template, Duration::from_secs(5)).unwrap();

    let html = fetcher.fetch(ymd(2023, 12, 25)).await.unwrap();
    let table = AjustesTableExtractor::default().extract(&html).unwrap();
    assert_eq!(table, SettlementTable::Empty);
}

/// 추출한 행을 CSV로 저장 (pt-BR 숫자는 정규화)
#[test]
fn test_fixture_written_as_csv() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "Ajustes_{data}.csv").unwrap();
    let table = AjustesTableExtractor::default().extract(FIXTURE).unwrap();

    let path = store.write(ymd(2023, 12, 26), &table).unwrap().unwrap();
    let content = std::fs::read_to_string(path).unwrap();

    assert!(content.contains("DI1 - DI de 1 dia,F25,90010.8100,90016.2300,5.4200,5.42"));
    assert_eq!(content.lines().count(), 6);
}
