//! Method calls through a proxy against a counter actor.

mod common;

use common::{Counter, host, init_tracing};
use durable_actors::{DurableConfig, Member, RpcError, RpcResponse, Shape};
use http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_increment_returns_state_with_auto_return() {
    init_tracing();
    let config = DurableConfig::builder().auto_return(true).build();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), config);
    let counter = proxy.get("total");

    let first: Value = counter.call("increment", vec![]).await.expect("first call");
    let second: Value = counter.call("increment", vec![]).await.expect("second call");

    assert_eq!(first, json!({ "count": 1 }));
    assert_eq!(second, json!({ "count": 2 }));
}

#[tokio::test]
async fn test_method_result_is_returned() {
    init_tracing();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());
    let counter = proxy.get("total");

    let total: u64 = counter.call("add", vec![json!(5)]).await.expect("add");
    let total_again: u64 = counter.call("add", vec![json!(2)]).await.expect("add");

    assert_eq!(total, 5);
    assert_eq!(total_again, 7);
}

#[tokio::test]
async fn test_method_without_result_decodes_as_unit() {
    init_tracing();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());

    proxy
        .get("total")
        .call::<()>("increment", vec![])
        .await
        .expect("increment");

    let raw = proxy
        .get("total")
        .call_raw("increment", vec![])
        .await
        .expect("increment");
    assert!(matches!(raw, RpcResponse::Raw(ref r) if r.status() == StatusCode::NO_CONTENT));
}

#[tokio::test]
async fn test_undefined_method_fails_with_its_name() {
    init_tracing();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());

    let err = proxy
        .get("total")
        .call::<Value>("explode", vec![])
        .await
        .expect_err("undefined method must fail");

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(matches!(err, RpcError::Remote { ref message, .. } if message.contains("explode")));
}

#[tokio::test]
async fn test_status_error_reaches_caller() {
    init_tracing();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());

    let err = proxy
        .get("total")
        .call::<Value>("claim", vec![])
        .await
        .expect_err("claim fails");

    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(err.to_string(), "remote error (409 Conflict): already claimed");
}

#[tokio::test]
async fn test_bad_argument_is_client_error() {
    init_tracing();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());

    let err = proxy
        .get("total")
        .call::<u64>("add", vec![json!("lots")])
        .await
        .expect_err("bad argument");

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_names_address_distinct_instances() {
    init_tracing();
    let (ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());

    let a: u64 = proxy.get("a").call("add", vec![json!(1)]).await.expect("a");
    let b: u64 = proxy.get("b").call("add", vec![json!(10)]).await.expect("b");
    let a_again: u64 = proxy
        .get(proxy.id_from_name("a"))
        .call("add", vec![json!(1)])
        .await
        .expect("a by id");

    assert_eq!((a, b, a_again), (1, 10, 2));
    assert_eq!(ns.instance_count(), 2);
}

#[tokio::test]
async fn test_shape_guided_members() {
    init_tracing();
    let config = DurableConfig::builder().auto_return(true).build();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), config);
    let counter = proxy.with_shape(Shape::new(["increment", "add"])).get("total");

    let Member::Method(increment) = counter.member("increment") else {
        panic!("increment is a method");
    };
    let state: Value = increment.invoke(vec![]).await.expect("increment");
    assert_eq!(state, json!({ "count": 1 }));

    let Member::Field(count) = counter.member("count") else {
        panic!("count is a field");
    };
    assert_eq!(count.read::<u64>().await.expect("read"), 1);

    count.write(&41).await.expect("write");
    assert_eq!(count.read::<u64>().await.expect("read"), 41);
}

#[tokio::test]
async fn test_transport_member_forwards_untranslated() {
    init_tracing();
    let (_ns, proxy) = host("COUNTER", |_| Counter::default(), DurableConfig::default());
    let counter = proxy.get("total");

    let Member::Transport(handle) = counter.member("fetch") else {
        panic!("fetch is the transport member");
    };
    let request = http::Request::builder()
        .uri("/somewhere/else")
        .body(String::new())
        .expect("request");
    let response = handle.fetch(request).await.expect("fetch");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
