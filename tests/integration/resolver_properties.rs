//! Properties of incremental resolution observed through whole views.

use flowview_core::{CoreError, LogLevel, ResolvedValue, Resolver, ViewPlugin};
use flowview_test_utils::data_generators::list_view;
use flowview_test_utils::{RecordingLogger, TestView};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Counts how often each node id reaches the resolve hook
#[derive(Default)]
struct ResolveCounter {
    counts: Rc<RefCell<HashMap<String, usize>>>,
}

impl ResolveCounter {
    fn count(&self, id: &str) -> usize {
        self.counts.borrow().get(id).copied().unwrap_or(0)
    }
}

impl ViewPlugin for ResolveCounter {
    fn name(&self) -> &str {
        "resolve-counter"
    }

    fn apply_resolver(&self, resolver: &Rc<Resolver>) {
        let counts = Rc::clone(&self.counts);
        resolver.hooks.resolve.tap(self.name(), move |value, node, _| {
            if let Some(id) = node.id() {
                *counts.borrow_mut().entry(id.to_string()).or_default() += 1;
            }
            Ok(value)
        });
    }
}

fn groceries() -> serde_json::Value {
    json!({
        "title": "Groceries",
        "count": 2,
        "showFooter": true,
        "items": [{"name": "milk"}, {"name": "eggs"}]
    })
}

#[test]
fn test_only_dependents_are_recomputed() {
    let counter = Rc::new(ResolveCounter::default());
    let view = TestView::builder(list_view("list"), groceries())
        .with_standard_plugins()
        .with_plugin(counter.clone())
        .build();

    view.resolve().unwrap();
    assert_eq!(counter.count("title"), 1);
    assert_eq!(counter.count("footer"), 1);
    assert_eq!(counter.count("row-0"), 1);

    view.set(vec![("title", json!("Errands"))]).unwrap();
    assert_eq!(counter.count("title"), 2);
    assert_eq!(counter.count("footer"), 1);
    assert_eq!(counter.count("row-0"), 1);
    assert_eq!(counter.count("list"), 2);

    view.set(vec![("count", json!(3))]).unwrap();
    assert_eq!(counter.count("title"), 2);
    assert_eq!(counter.count("footer"), 2);

    view.resolve().unwrap();
    assert_eq!(counter.count("title"), 3);
    assert_eq!(counter.count("footer"), 3);
}

#[test]
fn test_unchanged_subtrees_are_shared() {
    let view = TestView::new(list_view("list"), groceries());

    let first = view.resolve().unwrap().unwrap();
    let second = view.set(vec![("showFooter", json!(false))]).unwrap().unwrap();

    let title = |root: &ResolvedValue| {
        root.get("title")
            .and_then(|title| title.get("asset"))
            .cloned()
            .unwrap()
    };

    assert!(second.get("footer").is_none());
    assert!(title(&first).ptr_eq(&title(&second)));
    assert!(!first.ptr_eq(&second));

    let third = view.set(vec![("unrelated", json!(true))]).unwrap().unwrap();
    assert!(third.ptr_eq(&second));
}

#[test]
fn test_arena_does_not_grow_across_updates() {
    let view = TestView::new(list_view("list"), groceries());
    view.resolve().unwrap();

    let arena_size = || view.view().resolver().unwrap().arena().len();

    view.set(vec![("items", json!([{"name": "bread"}, {"name": "jam"}]))])
        .unwrap();
    let settled = arena_size();

    for round in 0..5 {
        view.set(vec![("items", json!([{"name": format!("item {}", round)}, {"name": "jam"}]))])
            .unwrap();
        assert_eq!(arena_size(), settled);
    }
}

#[test]
fn test_failed_update_keeps_previous_results() {
    let fail = Rc::new(Cell::new(false));

    struct Failing(Rc<Cell<bool>>);

    impl ViewPlugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply_resolver(&self, resolver: &Rc<Resolver>) {
            let fail = Rc::clone(&self.0);
            resolver.hooks.after_resolve.tap(self.name(), move |value, node, _| {
                if fail.get() && node.id() == Some("title") {
                    return Err(CoreError::Other("title is broken".to_string()));
                }
                Ok(value)
            });
        }
    }

    let view = TestView::builder(list_view("list"), groceries())
        .with_standard_plugins()
        .with_plugin(Rc::new(Failing(Rc::clone(&fail))))
        .build();

    let first = view.resolve().unwrap().unwrap();

    fail.set(true);
    let err = view.set(vec![("title", json!("Errands"))]).unwrap_err();
    assert_eq!(err.to_string(), "title is broken");

    fail.set(false);
    let unrelated = view.set(vec![("unrelated", json!(1))]).unwrap().unwrap();
    assert!(unrelated.ptr_eq(&first));

    let recovered = view.resolve().unwrap().unwrap();
    assert_eq!(
        recovered.to_json()["title"]["asset"]["value"],
        json!("Errands")
    );
}

#[test]
fn test_duplicate_ids_are_reported_once() {
    let logger = Rc::new(RecordingLogger::new());
    let view = TestView::builder(
        json!({
            "id": "view",
            "first": {"asset": {"id": "same", "type": "text", "value": "{{a}}"}},
            "second": {"asset": {"id": "same", "type": "text", "value": "{{a}}"}}
        }),
        json!({"a": 1}),
    )
    .with_standard_plugins()
    .with_logger(logger.clone())
    .build();

    view.resolve().unwrap();
    view.set(vec![("a", json!(2))]).unwrap();
    view.resolve().unwrap();

    let conflicts: Vec<String> = logger
        .messages(LogLevel::Error)
        .into_iter()
        .filter(|message| message.contains("conflicting ids: same"))
        .collect();
    assert_eq!(conflicts.len(), 1);

    let resolved = view.resolve().unwrap().unwrap().to_json();
    assert_eq!(resolved["first"]["asset"]["value"], json!(2));
    assert_eq!(resolved["second"]["asset"]["value"], json!(2));
}
