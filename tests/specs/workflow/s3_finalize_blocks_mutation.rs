//! S3: once a pipeline is finalized, submitting a step re-renders its
//! Locked phase and leaves the previously captured value untouched.

use crate::prelude::{assert_ok, body_string, Harness};

#[tokio::test]
async fn submit_after_finalize_is_a_no_op_that_redisplays_the_locked_value() {
    let harness = Harness::new();

    harness.post_form("/hello/init", "pipeline_id=03").await;
    harness
        .post_form("/hello/step_01_submit", "pipeline_id=default-hello-03&name=Ada")
        .await;
    harness
        .post_form(
            "/hello/step_02_submit",
            "pipeline_id=default-hello-03&greeting=Hello Ada",
        )
        .await;
    harness.post_form("/hello/finalize", "pipeline_id=default-hello-03").await;

    let response = harness
        .post_form("/hello/step_01_submit", "pipeline_id=default-hello-03&name=Bob")
        .await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains("pipulate-locked"));
    assert!(body.contains("Ada"));
    assert!(!body.contains("Bob"));

    let response = harness.get("/hello/step_01?pipeline_id=default-hello-03").await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains("pipulate-locked"));
    assert!(body.contains("Ada"));
}
