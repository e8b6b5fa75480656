use std::time::Duration;

use devportal_cli::error::ApiError;
use devportal_cli::format::{display_rate, to_value_format};
use devportal_cli::storage::Currency;
use devportal_cli::third_party::ThirdPartyClient;
use mockito::Matcher;
use serde_json::json;

fn client(url: &str) -> ThirdPartyClient {
    ThirdPartyClient::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn usd_needs_no_lookup() {
    let api = client("http://127.0.0.1:1");
    assert_eq!(api.base_value(Currency::Usd).await, 1.0);
}

#[tokio::test]
async fn base_value_reads_the_cmc_quote() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/cmc/v2/cryptocurrency/quotes/latest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "825".into()),
            Matcher::UrlEncoded("convert".into(), "eur".into()),
        ]))
        .with_body(
            json!({
                "data": { "825": { "quote": { "EUR": { "price": 0.92 } } } },
                "status": { "error_code": 0 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    assert_eq!(client(&server.url()).base_value(Currency::Eur).await, 0.92);
    m.assert_async().await;
}

#[tokio::test]
async fn failed_lookups_read_as_zero() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let api = client(&server.url());
    assert_eq!(api.base_value(Currency::Gbp).await, 0.0);
    assert_eq!(api.price("ethereum", None).await, 0.0);
}

#[tokio::test]
async fn coin_and_token_prices() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/coingeicko/api/v3/simple/price")
        .match_query(Matcher::UrlEncoded("ids".into(), "ethereum".into()))
        .with_body(json!({ "ethereum": { "usd": 3100.5 } }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/coingeicko/api/v3/simple/token_price/ethereum")
        .match_query(Matcher::UrlEncoded("contract_addresses".into(), "0xa0b8".into()))
        .with_body(json!({ "0xa0b8": { "usd": 1.0 } }).to_string())
        .create_async()
        .await;

    let api = client(&server.url());
    assert_eq!(api.price("ethereum", None).await, 3100.5);
    assert_eq!(api.price("ethereum", Some("0xa0b8")).await, 1.0);
}

#[tokio::test]
async fn jupiter_search_returns_first_hit() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jup/tokens/v2/search")
        .match_query(Matcher::UrlEncoded("query".into(), "BONK".into()))
        .with_body(
            json!([
                { "id": "mint1", "name": "Bonk", "symbol": "BONK", "icon": "https://logo", "decimals": 5 },
                { "id": "mint2", "name": "Other", "symbol": "BONK2", "decimals": 6 }
            ])
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/jup/tokens/v2/search")
        .match_query(Matcher::UrlEncoded("query".into(), "NOPE".into()))
        .with_body("[]")
        .create_async()
        .await;

    let api = client(&server.url());
    let token = api.jupiter_token("BONK").await.unwrap();
    assert_eq!(token.id, "mint1");
    assert_eq!(token.ticker, "BONK");
    assert_eq!(token.chain, "Solana");
    assert_eq!(token.logo, "https://logo");
    assert_eq!(token.decimals, 5);

    let err = api.jupiter_token("NOPE").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 404,
            message: "Token not found".into()
        }
    );
}

#[tokio::test]
async fn earnings_stay_in_usd_without_a_rate() {
    let api = ThirdPartyClient::new("http://127.0.0.1:1", Duration::from_millis(300)).unwrap();
    let rate = api.base_value(Currency::Eur).await;
    assert_eq!(rate, 0.0);

    let (currency, rate) = display_rate(Currency::Eur, rate);
    assert_eq!(currency, Currency::Usd);
    assert_eq!(to_value_format(1234.5 * rate, currency, 2), "$1,234.50");
}
