//! Link header pagination through both clients.

mod common;

use common::{page, reply, reply_with, Scripted, ScriptedTransport};
use netclient::client::{
    AsyncClient, AsyncOptions, BlockingClient, BlockingOptions, ClientError,
};
use serde_json::json;

fn page_number(request: &netclient::client::Request) -> u32 {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

#[test]
fn test_concatenates_pages() {
    let client = BlockingClient::new(ScriptedTransport::with_responder(|request| {
        match page_number(request) {
            1 => page("[1,2]", "/items?page=2"),
            2 => page("[3]", "http://api.test/items?page=3"),
            _ => reply(200, "[4,5]"),
        }
    }));

    let items = client
        .fetch_json_array_paginated("http://api.test/items", 10, &BlockingOptions::new())
        .unwrap();
    assert_eq!(items, vec![json!(1), json!(2), json!(3), json!(4), json!(5)]);
    assert_eq!(
        client.transport().urls(),
        vec![
            "http://api.test/items",
            "http://api.test/items?page=2",
            "http://api.test/items?page=3",
        ]
    );
}

#[test]
fn test_cycle_is_detected() {
    let client = BlockingClient::new(ScriptedTransport::with_responder(|request| {
        match page_number(request) {
            1 => page("[1]", "http://api.test/items?page=2"),
            _ => page("[2]", "http://api.test/items"),
        }
    }));

    let err = client
        .fetch_json_array_paginated("http://api.test/items", 10, &BlockingOptions::new())
        .unwrap_err();
    match err {
        ClientError::PaginationCycle { url } => assert_eq!(url, "http://api.test/items"),
        other => panic!("expected PaginationCycle, got {other:?}"),
    }
    assert_eq!(client.transport().calls(), 2);
}

#[test]
fn test_self_link_is_a_cycle() {
    let client = BlockingClient::new(ScriptedTransport::with_responder(|_| {
        page("[1]", "http://api.test/items")
    }));

    let err = client
        .fetch_json_array_paginated("http://api.test/items", 10, &BlockingOptions::new())
        .unwrap_err();
    assert!(matches!(err, ClientError::PaginationCycle { .. }));
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test]
async fn test_page_cap_stops_after_exactly_max_pages() {
    let client = AsyncClient::new(ScriptedTransport::with_responder(|request| {
        let next = page_number(request) + 1;
        page("[0]", &format!("http://api.test/items?page={next}"))
    }));

    let err = client
        .fetch_json_array_paginated("http://api.test/items", 2, &AsyncOptions::new())
        .await
        .unwrap_err();
    match err {
        ClientError::PaginationLimitExceeded { max_pages, next_url } => {
            assert_eq!(max_pages, 2);
            assert_eq!(next_url, "http://api.test/items?page=3");
        }
        other => panic!("expected PaginationLimitExceeded, got {other:?}"),
    }
    assert_eq!(client.transport().calls(), 2);
}

#[tokio::test]
async fn test_last_page_within_cap_succeeds() {
    let client = AsyncClient::new(ScriptedTransport::new(vec![
        page(r#"[{"id":1}]"#, "?page=2"),
        reply(200, r#"[{"id":2}]"#),
    ]));

    let items = client
        .fetch_json_array_paginated("http://api.test/items", 2, &AsyncOptions::new())
        .await
        .unwrap();
    assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
}

#[test]
fn test_zero_max_pages_is_invalid_input() {
    let client = BlockingClient::new(ScriptedTransport::new(vec![]));
    let err = client
        .fetch_json_array_paginated("http://api.test/items", 0, &BlockingOptions::new())
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(client.transport().calls(), 0);
}

#[test]
fn test_non_array_page_is_invalid_input() {
    let client = BlockingClient::new(ScriptedTransport::new(vec![
        page("[1]", "/items?page=2"),
        reply(200, r#"{"done":true}"#),
    ]));

    let err = client
        .fetch_json_array_paginated("http://api.test/items", 5, &BlockingOptions::new())
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
}

#[test]
fn test_link_with_other_relations_and_odd_spacing() {
    let link = r#"<http://api.test/items?page=1>; rel="prev" ,  < /items?page=2 > ;title="two";  REL = "next""#;
    let client = BlockingClient::new(ScriptedTransport::new(vec![
        reply_with(200, "[1]", vec![("link", link.to_string())]),
        reply(200, "[2]"),
    ]));

    let items = client
        .fetch_json_array_paginated("http://api.test/items?page=1a", 5, &BlockingOptions::new())
        .unwrap();
    assert_eq!(items, vec![json!(1), json!(2)]);
    assert_eq!(client.transport().urls()[1], "http://api.test/items?page=2");
}

#[test]
fn test_page_failure_propagates() {
    let client = BlockingClient::new(ScriptedTransport::new(vec![
        page("[1]", "/items?page=2"),
        Scripted::TimedOut,
    ]));

    let err = client
        .fetch_json_array_paginated("http://api.test/items", 5, &BlockingOptions::new())
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }));
}
