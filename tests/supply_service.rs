use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    http::{Request, StatusCode},
};
use chrono::Utc;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tower::ServiceExt;

use token_supply::{
    caching::CacheKey,
    env::EnvConfig,
    make_router,
    supply::{SupplyError, SupplyService},
    ServeHealth, State,
};

const CONTRACT: &str = "0x9f3bcbe48e8b754f331dfc694a894e8e686ac31d";
const BUILT_IN_ADDRESSES: usize = 13;

fn config_for(server: &ServerGuard) -> EnvConfig {
    let api_url = format!("{}/api", server.url());
    EnvConfig::from_lookup(move |key: &str| match key {
        "BSCSCAN_API_KEY" => Some("integration-key".to_string()),
        "BSCSCAN_API_URL" => Some(api_url.clone()),
        "TOKEN_CONTRACT_ADDRESS" => Some(CONTRACT.to_string()),
        "TOKEN_MAX_SUPPLY" => Some("1000000000".to_string()),
        _ => None,
    })
    .unwrap()
}

fn envelope(result: &str) -> String {
    json!({ "status": "1", "message": "OK", "result": result }).to_string()
}

async fn mock_balances(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
    server
        .mock("GET", "/api")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "tokenbalance".into()),
            Matcher::UrlEncoded("contractaddress".into(), CONTRACT.into()),
        ]))
        .with_status(200)
        // 1,000 tokens for every excluded address.
        .with_body(envelope("1000000000000000000000"))
        .expect(hits)
        .create_async()
        .await
}

async fn mock_total_supply(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
    server
        .mock("GET", "/api")
        .match_query(Matcher::UrlEncoded("action".into(), "tokensupply".into()))
        .with_status(200)
        .with_body(envelope("900000000000000000000000000"))
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn computes_supply_from_built_in_registry_test() {
    let mut server = Server::new_async().await;
    let balances = mock_balances(&mut server, BUILT_IN_ADDRESSES).await;
    let total_supply = mock_total_supply(&mut server, 1).await;

    let supply = SupplyService::from_env_config(&config_for(&server)).unwrap();

    let first = supply.get_snapshot(&CacheKey::Supply).await.unwrap();
    let second = supply.get_snapshot(&CacheKey::Supply).await.unwrap();

    balances.assert_async().await;
    total_supply.assert_async().await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.balances.len(), BUILT_IN_ADDRESSES);
    assert_eq!(first.metrics.burnt_tokens, 100_000_000);
    assert_eq!(first.metrics.circulating_supply, 899_987_000);
    assert_eq!(first.metrics.total_supply_minus_burn, 900_000_000);
}

#[tokio::test]
async fn upstream_failure_caches_nothing_test() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/api")
        .match_query(Matcher::UrlEncoded("action".into(), "tokenbalance".into()))
        .with_status(502)
        .expect(1)
        .create_async()
        .await;

    let supply = SupplyService::from_env_config(&config_for(&server)).unwrap();

    let result = supply.get_snapshot(&CacheKey::Supply).await;
    assert!(matches!(result, Err(SupplyError::Upstream(_))));
    failing.assert_async().await;

    failing.remove_async().await;
    let balances = mock_balances(&mut server, BUILT_IN_ADDRESSES).await;
    let total_supply = mock_total_supply(&mut server, 1).await;

    let snapshot = supply.get_snapshot(&CacheKey::Supply).await.unwrap();
    assert_eq!(snapshot.metrics.circulating_supply, 899_987_000);
    balances.assert_async().await;
    total_supply.assert_async().await;
}

#[tokio::test]
async fn serves_supply_over_http_test() {
    let mut server = Server::new_async().await;
    let _balances = mock_balances(&mut server, BUILT_IN_ADDRESSES).await;
    let _total_supply = mock_total_supply(&mut server, 1).await;

    let config = config_for(&server);
    let state = Arc::new(State {
        health: ServeHealth::new(Utc::now()),
        supply: SupplyService::from_env_config(&config).unwrap(),
        token_contract: config.token_contract.clone(),
        token_symbol: config.token_symbol.clone(),
    });

    let response = make_router(state)
        .oneshot(Request::builder().uri("/supply").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let mut bytes = vec![];
    while let Some(chunk) = body.data().await {
        bytes.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(String::from_utf8(bytes).unwrap(), "899987000");
}
