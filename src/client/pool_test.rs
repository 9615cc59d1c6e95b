use std::time::Duration;

use tokio::net::TcpListener;

use crate::Client;
use crate::ClientConfig;
use crate::ConnectionPool;
use crate::Error;

fn quick_config() -> ClientConfig {
    ClientConfig {
        dial_timeout: Duration::from_millis(300),
        request_timeout: Duration::from_millis(300),
        ..ClientConfig::default()
    }
}

async fn listening_endpoint() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

#[tokio::test]
async fn create_keeps_only_reachable_endpoints_in_order() {
    let (_first, first) = listening_endpoint().await;
    let refused = refused_endpoint().await;
    let (_second, second) = listening_endpoint().await;

    let pool = ConnectionPool::create(vec![first.clone(), refused, second.clone()], quick_config())
        .await
        .unwrap();

    assert_eq!(pool.connected_endpoints(), vec![first, second]);
}

#[tokio::test]
async fn create_fails_when_nothing_connects() {
    let endpoints = vec![refused_endpoint().await, refused_endpoint().await];

    let result = ConnectionPool::create(endpoints.clone(), quick_config()).await;

    match result {
        Err(Error::Dial { endpoints: tried, .. }) => assert_eq!(tried, endpoints),
        _ => panic!("expected a dial error"),
    }
}

#[tokio::test]
async fn create_fails_for_malformed_endpoints() {
    let result = ConnectionPool::create(vec!["not a url".to_string()], quick_config()).await;
    assert!(matches!(result, Err(Error::Dial { .. })));
}

#[tokio::test]
async fn create_fails_for_empty_endpoint_list() {
    let result = ConnectionPool::create(vec![], quick_config()).await;
    assert!(matches!(result, Err(Error::Dial { .. })));
}

#[tokio::test]
async fn builder_applies_timeouts() {
    let (_listener, url) = listening_endpoint().await;

    let client = Client::builder(vec![url.clone()])
        .dial_timeout(Duration::from_millis(250))
        .request_timeout(Duration::from_millis(750))
        .build()
        .await
        .unwrap();

    assert_eq!(client.endpoints(), &[url]);
    assert_eq!(client.kv().config().dial_timeout, Duration::from_millis(250));
    assert_eq!(client.kv().config().request_timeout, Duration::from_millis(750));
}
