//! A content document from YAML to rendered views, driven by navigation.

use anyhow::Result;
use flowview_dsl::DslError;
use flowview_test_utils::assertions::{assert_completed, assert_pending};
use flowview_test_utils::data_generators::content_document_yaml;
use flowview_test_utils::init_tracing;
use flowview_tests::ContentRun;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_document_runs_to_completion() -> Result<()> {
    init_tracing();
    let run = ContentRun::from_yaml(&content_document_yaml())?;

    let completion = run.start();
    let list = run.render()?.expect("the first state shows a view");
    assert_eq!(list["id"], json!("list"));
    assert_eq!(list["title"]["asset"]["value"], json!("Groceries"));
    assert_eq!(
        list["rows"],
        json!([
            {"asset": {"id": "row-0", "type": "text", "value": "milk"}},
            {"asset": {"id": "row-1", "type": "text", "value": "eggs"}}
        ])
    );

    let updated = run
        .set(vec![("items", json!([{"name": "milk"}, {"name": "eggs"}, {"name": "tea"}]))])?
        .expect("still on the list view");
    assert_eq!(updated["rows"][2]["asset"]["value"], json!("tea"));

    // `confirmed` is false, so the ACTION state falls through to CONFIRM
    run.transition("next")?;
    let confirm = run.render()?.expect("the confirmation view is shown");
    assert_eq!(confirm["id"], json!("confirm"));
    assert_eq!(confirm["title"]["asset"]["value"], json!("Buy 2 things?"));
    assert_pending(&completion)?;

    let recounted = run.set(vec![("count", json!(3))])?.expect("still confirming");
    assert_eq!(recounted["title"]["asset"]["value"], json!("Buy 3 things?"));

    run.transition("back")?;
    assert_eq!(run.render()?.map(|view| view["id"].clone()), Some(json!("list")));

    run.set(vec![("confirmed", json!(true))])?;
    run.transition("next")?;

    assert_completed(&completion, "done")?;
    assert_eq!(run.render()?, None);
    assert_eq!(
        run.controller().current().map(|flow| flow.history()),
        Some(vec![
            "LIST".to_string(),
            "CHECK".to_string(),
            "CONFIRM".to_string(),
            "LIST".to_string(),
            "CHECK".to_string(),
            "END_Done".to_string(),
        ])
    );
    Ok(())
}

#[test]
fn test_invalid_document_is_rejected() {
    let source = content_document_yaml().replace("ref: confirm", "ref: missing-view");

    let err = match ContentRun::from_yaml(&source) {
        Ok(_) => panic!("document with a dangling view reference was accepted"),
        Err(err) => err,
    };

    let dsl_error = err
        .downcast_ref::<DslError>()
        .expect("validation failures surface as DslError");
    assert_eq!(dsl_error.error_code(), "ERR_DSL_VALIDATION_INVALID_REFERENCE");
    assert!(dsl_error.to_string().contains("unknown view 'missing-view'"));
}

#[test]
fn test_view_state_without_matching_view_is_an_error() -> Result<()> {
    let document = flowview_dsl::parse_content_yaml(
        &content_document_yaml().replace("ref: confirm", "ref: missing-view"),
    )?;
    let run = ContentRun::new(document);

    run.start();
    run.transition("next")?;

    let err = run.render().unwrap_err();
    assert_eq!(err.to_string(), "no view with id 'missing-view'");
    Ok(())
}
