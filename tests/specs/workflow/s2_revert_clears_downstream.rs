//! S2: reverting to an earlier step clears every step at or after it, and
//! a rebuild re-renders the target step pre-filled with its prior value
//! while later steps sit as empty, untriggered placeholders.

use crate::prelude::{assert_ok, body_string, Harness};

async fn complete_step_01_and_02(harness: &Harness) {
    harness.post_form("/hello/init", "pipeline_id=02").await;
    harness
        .post_form("/hello/step_01_submit", "pipeline_id=default-hello-02&name=Ada")
        .await;
    harness
        .post_form(
            "/hello/step_02_submit",
            "pipeline_id=default-hello-02&greeting=Hello Ada",
        )
        .await;
}

#[tokio::test]
async fn revert_rebuilds_target_step_prefilled_and_clears_downstream() {
    let harness = Harness::new();
    complete_step_01_and_02(&harness).await;

    let response = harness
        .post_form("/hello/revert", "pipeline_id=default-hello-02&step_id=step_01")
        .await;
    assert_ok(&response);
    let body = body_string(response).await;

    assert!(body.contains("pipulate-container"));
    // step_01's own captured value is cleared by the revert too (the target
    // step is included in "every step j >= k is unset"), so it re-renders
    // as a blank input form, not pre-filled.
    assert!(body.contains(r#"name="name""#));
    assert!(!body.contains(r#"value="Ada""#));
    // step_02 has not been reached again yet - empty placeholder, no loader.
    assert!(body.contains(r#"<div id="step_02"></div>"#));

    // Resubmitting step_01 proves the downstream state was actually cleared,
    // not just the rendered fragment: step_02 must ask for input again.
    harness
        .post_form("/hello/step_01_submit", "pipeline_id=default-hello-02&name=Ada")
        .await;
    let response = harness.get("/hello/step_02?pipeline_id=default-hello-02").await;
    assert_ok(&response);
    let body = body_string(response).await;
    assert!(body.contains(r#"name="greeting""#));
}
