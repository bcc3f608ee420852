//! S1: a simple two-step workflow walks init -> step_01 -> step_02 ->
//! finalize, with a chain-reaction loader embedded at every Completed/Locked
//! step and the conversation log narrating each milestone in order.

use crate::prelude::{assert_ok, body_string, Harness};
use pipulate_core::MessageRole;

#[tokio::test]
async fn walks_the_full_chain_to_finalize() {
    let harness = Harness::new();

    let response = harness.post_form("/hello/init", "pipeline_id=01").await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains(r#"hx-get="/hello/step_01?pipeline_id=default-hello-01""#));

    let response = harness.get("/hello/step_01?pipeline_id=default-hello-01").await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains(r#"name="name""#));
    assert!(body.contains(r#"name="pipeline_id" value="default-hello-01""#));

    let response = harness
        .post_form("/hello/step_01_submit", "pipeline_id=default-hello-01&name=Ada")
        .await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains("Ada"));
    assert!(body.contains(r#"hx-get="/hello/step_02?pipeline_id=default-hello-01""#));

    let response = harness.get("/hello/step_02?pipeline_id=default-hello-01").await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains("Hello Ada"));

    let response = harness
        .post_form(
            "/hello/step_02_submit",
            "pipeline_id=default-hello-01&greeting=Hello Ada",
        )
        .await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains("Hello Ada"));
    assert!(body.contains(r#"hx-get="/hello/finalize?pipeline_id=default-hello-01""#));

    let response = harness.get("/hello/finalize?pipeline_id=default-hello-01").await;
    assert_ok(&response);
    assert!(body_string(response).await.contains("finalize"));

    let response = harness.post_form("/hello/finalize", "pipeline_id=default-hello-01").await;
    assert_ok(&response);
    assert!(body_string(response).await.contains("pipulate-container"));

    let messages = harness.conversation.list_recent(20).expect("list");
    assert!(messages.iter().all(|m| m.role == MessageRole::System));
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert!(contents.iter().any(|c| c.contains("two-step introduction to Pipulate")));
    assert!(contents.iter().any(|c| c.contains("captured name = Ada")));
    assert!(contents.iter().any(|c| c.contains("captured greeting = Hello Ada")));
    assert!(contents.iter().any(|c| c.contains("hello finalized")));
}
