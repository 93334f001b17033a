//! Wiremock integration tests for HttpQuoteClient.
//!
//! These tests verify the HTTP interaction and error mapping using mocked responses.

use std::sync::Arc;
use std::time::Duration;

use swapquote::{
    CacheConfig, CachingQuoteClient, HttpQuoteClient, QuoteApi, QuoteRequest, SwapMode,
    SwapQuoteError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOL: &str = "So11111111111111111111111111111111111111112";
const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

fn quote_body() -> serde_json::Value {
    serde_json::json!({
        "inputMint": SOL,
        "inAmount": "1000000000",
        "outputMint": USDC,
        "outAmount": "143512345",
        "otherAmountThreshold": "142794783",
        "swapMode": "ExactIn",
        "slippageBps": 50,
        "priceImpactPct": "0.0001",
        "routePlan": [{
            "swapInfo": {
                "ammKey": "HcoJqG325TTifs6jyWvRJ9ET4pDu12Xrt2EQKZGFmuKX",
                "label": "Whirlpool",
                "inputMint": SOL,
                "outputMint": USDC,
                "inAmount": "1000000000",
                "outAmount": "143512345",
                "feeAmount": "200",
                "feeMint": SOL
            },
            "percent": 100
        }],
        "contextSlot": 301234567,
        "timeTaken": 0.012
    })
}

/// Test a successful quote with all query parameters forwarded.
#[tokio::test]
async fn test_quote_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("inputMint", SOL))
        .and(query_param("outputMint", USDC))
        .and(query_param("amount", "1000000000"))
        .and(query_param("slippageBps", "50"))
        .and(query_param("swapMode", "ExactIn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpQuoteClient::with_base_url(mock_server.uri()).unwrap();
    let request = QuoteRequest::new(SOL, USDC, 1_000_000_000)
        .slippage_bps(50)
        .swap_mode(SwapMode::ExactIn);

    let quote = client.quote(&request).await.expect("quote should succeed");
    assert_eq!(quote.out_amount, "143512345");
    assert_eq!(quote.slippage_bps, 50);
    assert_eq!(quote.route_plan.len(), 1);
    assert_eq!(quote.route_plan[0].swap_info.label.as_deref(), Some("Whirlpool"));
    assert_eq!(quote.out_amount_value(), Some(143_512_345.0));
}

/// The API key travels in the `x-api-key` header.
#[tokio::test]
async fn test_api_key_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(header("x-api-key", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpQuoteClient::with_base_url(mock_server.uri())
        .unwrap()
        .api_key("test_key");
    client
        .quote(&QuoteRequest::new(SOL, USDC, 1))
        .await
        .expect("quote with api key should succeed");
}

/// A trailing slash on the base URL does not double up.
#[tokio::test]
async fn test_base_url_trailing_slash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
        .mount(&mock_server)
        .await;

    let client = HttpQuoteClient::with_base_url(format!("{}/", mock_server.uri())).unwrap();
    assert!(client.quote(&QuoteRequest::new(SOL, USDC, 1)).await.is_ok());
}

/// Test the program label endpoint.
#[tokio::test]
async fn test_program_labels() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/program-id-to-label"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc": "Whirlpool",
            "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8": "Raydium"
        })))
        .mount(&mock_server)
        .await;

    let client = HttpQuoteClient::with_base_url(mock_server.uri()).unwrap();
    let labels = client.program_id_to_label().await.unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(
        labels.get("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8").map(String::as_str),
        Some("Raydium")
    );
}

/// Test that a 400 surfaces as an Api error carrying the body.
#[tokio::test]
async fn test_bad_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Could not find any route"))
        .mount(&mock_server)
        .await;

    let client = HttpQuoteClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .quote(&QuoteRequest::new(SOL, USDC, 1))
        .await
        .unwrap_err();

    match err {
        SwapQuoteError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("Could not find any route"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

/// Test that a malformed body surfaces as a Json error.
#[tokio::test]
async fn test_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = HttpQuoteClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .quote(&QuoteRequest::new(SOL, USDC, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SwapQuoteError::Json(_)), "got {err:?}");
}

/// Test that a timeout is reported as a transport error.
#[tokio::test]
async fn test_timeout_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(quote_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client =
        HttpQuoteClient::with_timeout(mock_server.uri(), Duration::from_millis(100)).unwrap();
    let err = client
        .quote(&QuoteRequest::new(SOL, USDC, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SwapQuoteError::Http(_)), "got {err:?}");
}

/// Construction reports failure through `Result`.
#[test]
fn test_constructors_return_result() {
    let client = HttpQuoteClient::new().unwrap();
    assert_eq!(client.base_url(), swapquote::client::DEFAULT_BASE_URL);
    assert!(HttpQuoteClient::with_timeout("http://localhost:1/", Duration::from_secs(1)).is_ok());
}

/// The caching client reaches the server once for repeated quotes.
#[tokio::test]
async fn test_caching_client_hits_server_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quote_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let http = Arc::new(HttpQuoteClient::with_base_url(mock_server.uri()).unwrap());
    let client = CachingQuoteClient::new(http, CacheConfig::default()).unwrap();
    let request = QuoteRequest::new(SOL, USDC, 1_000_000_000).slippage_bps(50);

    let first = client.quote(&request).await.unwrap();
    let second = client.quote(&request).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(client.metrics().api_calls_saved, 1);
}

/// Server errors are passed through by the caching client and not cached.
#[tokio::test]
async fn test_caching_client_passes_errors_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let http = Arc::new(HttpQuoteClient::with_base_url(mock_server.uri()).unwrap());
    let client = CachingQuoteClient::new(http, CacheConfig::default()).unwrap();
    let request = QuoteRequest::new(SOL, USDC, 1);

    for _ in 0..2 {
        let err = client.quote(&request).await.unwrap_err();
        assert_eq!(
            err,
            SwapQuoteError::Api {
                status: 503,
                message: "overloaded".into()
            }
        );
    }
    assert!(client.cache().is_empty());
}
