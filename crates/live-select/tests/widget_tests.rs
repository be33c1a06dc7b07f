//! Widget lifecycle, typing and pushed-event scenarios.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Harness, option_list, widget_markup};
use live_select::{
    Channel, Document, DomEffect, DomEvent, Error, LiveSelect, NodeSpec, PushTarget,
    QueuedTransport, Selector, SelectionItem, SelectionMode, SharedTaskScheduler,
};
use serde_json::json;

fn component(id: &str) -> PushTarget {
    PushTarget::Component(id.to_string())
}

// -------------------------------------------------------------------------
// Attach
// -------------------------------------------------------------------------

#[test]
fn test_attach_reads_configuration() {
    let h = Harness::with(
        &[
            ("data-debounce", "250"),
            ("data-update-min-len", "3"),
            ("data-keyboard", "hook"),
            ("data-field", "city_search"),
            ("data-mode", "tags"),
        ],
        None,
    );
    let config = h.widget.config();
    assert_eq!(config.debounce, Duration::from_millis(250));
    assert_eq!(config.update_min_len, 3);
    assert_eq!(config.field.as_deref(), Some("city_search"));
    assert_eq!(h.widget.selection_mode(), SelectionMode::Multiple);
    assert_eq!(h.widget.id(), "city");
    assert_eq!(h.widget.root(), h.root);
    assert!(h.widget.selection().is_empty());
}

#[test]
fn test_attach_styles_clear_button() {
    let h = Harness::with(&[], None);
    let doc = h.document.lock();
    let button = live_select::accessor::clear_button(&doc, h.root).unwrap();
    let container = doc
        .query_selector(h.root, &Selector::tag("div").class("container"))
        .unwrap();
    assert_eq!(doc.style(container, "position"), Some("relative"));
    assert_eq!(doc.style(button, "position"), Some("absolute"));
    assert_eq!(doc.style(button, "right"), Some("5px"));
    assert_eq!(doc.style(button, "display"), Some("block"));
}

#[test]
fn test_attach_requires_id() {
    let mut doc = Document::new();
    let body = doc.body();
    let root = doc.mount(body, NodeSpec::new("div"));
    let channel = Arc::new(Channel::new(Arc::new(QueuedTransport::new())));

    let result = LiveSelect::attach(doc.into_shared(), root, channel, SharedTaskScheduler::new());
    assert!(matches!(result, Err(Error::MissingId)));
}

#[test]
fn test_attach_to_removed_node() {
    let mut doc = Document::new();
    let body = doc.body();
    let root = doc.mount(body, widget_markup("city", &[], None));
    doc.remove(root);
    let channel = Arc::new(Channel::new(Arc::new(QueuedTransport::new())));

    let result = LiveSelect::attach(doc.into_shared(), root, channel, SharedTaskScheduler::new());
    assert!(matches!(result, Err(Error::UnknownNode)));
}

// -------------------------------------------------------------------------
// Typing
// -------------------------------------------------------------------------

#[test]
fn test_keystroke_burst_sends_one_change() {
    let h = Harness::with(&[("data-debounce", "100"), ("data-field", "city_search")], None);

    for text in ["R", "Ro", "Rom", "Rome"] {
        assert!(h.type_text(text).handled);
    }
    assert!(h.widget.is_change_pending());
    assert!(h.sent().is_empty());

    // Still inside the quiet period
    assert_eq!(h.advance(Duration::from_millis(20)), 0);
    assert_eq!(h.settle(), 1);

    let sent = h.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].event, "change");
    assert_eq!(sent[0].target, component("city"));
    assert_eq!(sent[0].payload, json!({"text": "Rome"}));
    assert_eq!(sent[1].event, "live_select_change");
    assert_eq!(sent[1].target, PushTarget::View);
    assert_eq!(
        sent[1].payload,
        json!({"id": "city", "field": "city_search", "text": "Rome"})
    );
    assert!(!h.widget.is_change_pending());
}

#[test]
fn test_change_is_routed_to_delegation_target() {
    let h = Harness::with(&[("data-phx-target", "#trip-form")], None);
    h.type_text("Oslo");
    h.settle();

    let parent = h.transport.events_named("live_select_change");
    assert_eq!(parent.len(), 1);
    assert_eq!(parent[0].target, PushTarget::Selector("#trip-form".to_string()));
    // No field attribute, no field key
    assert_eq!(parent[0].payload, json!({"id": "city", "text": "Oslo"}));
}

#[test]
fn test_text_is_trimmed() {
    let h = Harness::with(&[], None);
    h.type_text("  Paris \t");
    h.settle();
    assert_eq!(
        h.transport.events_named("change")[0].payload,
        json!({"text": "Paris"})
    );
}

#[test]
fn test_short_input_clears_options_immediately() {
    let h = Harness::with(&[("data-update-min-len", "3")], None);

    h.type_text("Ro");
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "options_clear");
    assert_eq!(sent[0].target, component("city"));
    assert_eq!(sent[0].payload, json!({}));

    h.type_text("  R  ");
    assert_eq!(h.transport.events_named("options_clear").len(), 1);

    assert_eq!(h.settle(), 0);
    assert!(h.transport.events_named("change").is_empty());
}

#[test]
fn test_short_input_cancels_pending_change() {
    let h = Harness::with(&[("data-update-min-len", "3")], None);

    h.type_text("Rom");
    assert!(h.widget.is_change_pending());
    h.type_text("R");
    assert!(!h.widget.is_change_pending());

    h.settle();
    assert!(h.transport.events_named("change").is_empty());
    assert_eq!(h.transport.events_named("options_clear").len(), 1);
}

#[test]
fn test_min_length_counts_characters() {
    let h = Harness::with(&[("data-update-min-len", "3")], None);
    h.type_text("Åå");
    assert_eq!(h.transport.events_named("options_clear").len(), 1);
    h.type_text("Ålö");
    h.settle();
    assert_eq!(h.transport.events_named("change").len(), 1);
}

// -------------------------------------------------------------------------
// Option interaction
// -------------------------------------------------------------------------

#[test]
fn test_mousedown_inside_option_clicks_it() {
    let h = Harness::with(&[], Some(option_list(3, 0, None)));
    let option = h.option("2");
    let span = h
        .document
        .lock()
        .query_selector(option, &Selector::tag("span"))
        .unwrap();

    let outcome = h.widget.dispatch(span, &DomEvent::MouseDown);
    assert!(outcome.default_prevented);

    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "option_click");
    assert_eq!(sent[0].target, component("city"));
    assert_eq!(sent[0].payload, json!({"idx": "2"}));
}

#[test]
fn test_mousedown_outside_options() {
    let h = Harness::with(&[], Some(option_list(3, 0, None)));
    let li = h.query(&Selector::tag("li"));
    let outcome = h.widget.dispatch(li, &DomEvent::MouseDown);
    assert!(!outcome.default_prevented);
    assert!(h.sent().is_empty());

    // Not inside the dropdown at all
    let outcome = h.widget.dispatch(h.text_input(), &DomEvent::MouseDown);
    assert!(!outcome.handled);
}

#[test]
fn test_remove_button_click() {
    let h = Harness::with(&[], None);
    let svg = h.query(&Selector::tag("svg"));

    let outcome = h.widget.dispatch(svg, &DomEvent::Click);
    assert!(outcome.handled);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "option_remove");
    assert_eq!(sent[0].payload, json!({"idx": "0"}));

    let second = h.query(&Selector::tag("button").attr_eq("data-idx", "1"));
    h.widget.dispatch(second, &DomEvent::Click);
    assert_eq!(h.sent()[0].payload, json!({"idx": "1"}));
}

// -------------------------------------------------------------------------
// Pushed events
// -------------------------------------------------------------------------

#[test]
fn test_single_mode_displays_label_or_current_text() {
    let h = Harness::with(&[], None);

    h.push(
        "select",
        json!({"id": "city", "selection": [], "mode": "single", "current_text": "foo"}),
    );
    assert_eq!(h.text(), "foo");

    h.push(
        "select",
        json!({
            "id": "city",
            "selection": [{"label": "Bar", "value": "bar"}],
            "mode": "single",
            "current_text": "foo"
        }),
    );
    assert_eq!(h.text(), "Bar");
    assert_eq!(h.widget.selection(), vec![SelectionItem::new("Bar", "bar")]);
}

#[test]
fn test_single_mode_without_current_text_displays_empty() {
    let h = Harness::with(&[], None);
    h.type_text("stale");
    h.push(
        "select",
        json!({"id": "city", "selection": [], "mode": "single", "current_text": null}),
    );
    assert_eq!(h.text(), "");
}

#[test]
fn test_multiple_mode_displays_current_text() {
    let h = Harness::with(&[], None);
    let selection = json!([{"label": "A", "value": 1}, {"label": "B", "value": 2}]);

    for text in ["", "typed", "more"] {
        h.push(
            "select",
            json!({"id": "city", "selection": selection, "mode": "tags", "current_text": text}),
        );
        assert_eq!(h.text(), text);
    }
    assert_eq!(h.widget.selection().len(), 2);
    assert_eq!(h.widget.selection_mode(), SelectionMode::Multiple);
}

#[test]
fn test_select_dispatches_synthetic_input() {
    let h = Harness::with(&[], None);
    h.push(
        "select",
        json!({
            "id": "city",
            "selection": [{"label": "Bar", "value": "bar"}],
            "mode": "single",
            "input_event": true
        }),
    );

    let target = h.query(&Selector::tag("input").class("single-mode"));
    assert_eq!(
        h.effects(),
        vec![DomEffect::Dispatch {
            node: target,
            event: "input".to_string(),
            bubbles: true
        }]
    );
}

#[test]
fn test_synthetic_input_target_in_multiple_mode() {
    let markup = NodeSpec::new("div")
        .id("tags")
        .child(NodeSpec::new("input").attr("type", "text"))
        .child(
            NodeSpec::new("input")
                .attr("data-live-select-empty", "")
                .attr("name", "tags[]"),
        );
    let h = Harness::new(markup);
    h.push(
        "select",
        json!({"id": "tags", "selection": [], "mode": "quick_tags", "input_event": true}),
    );
    let empty_marker = h.query(&Selector::tag("input").attr("data-live-select-empty"));
    assert_eq!(
        h.effects(),
        vec![DomEffect::Dispatch {
            node: empty_marker,
            event: "input".to_string(),
            bubbles: true
        }]
    );

    // With a selection the hidden value inputs are the target
    let hidden = h
        .document
        .lock()
        .mount(h.root, NodeSpec::new("input").attr("type", "hidden").value("1"));
    h.push(
        "select",
        json!({
            "id": "tags",
            "selection": [{"label": "A", "value": 1}],
            "mode": "quick_tags",
            "input_event": true
        }),
    );
    assert_eq!(
        h.effects(),
        vec![DomEffect::Dispatch {
            node: hidden,
            event: "input".to_string(),
            bubbles: true
        }]
    );
}

#[test]
fn test_select_without_input_event_dispatches_nothing() {
    let h = Harness::with(&[], None);
    h.push(
        "select",
        json!({"id": "city", "selection": [], "mode": "single", "input_event": false}),
    );
    assert!(h.effects().is_empty());
}

#[test]
fn test_select_parent_event() {
    let h = Harness::with(&[("data-phx-target", "#form")], None);
    h.push(
        "select",
        json!({"id": "city", "selection": [], "mode": "single", "parent_event": "city_chosen"}),
    );
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "city_chosen");
    assert_eq!(sent[0].target, PushTarget::Selector("#form".to_string()));
    assert_eq!(sent[0].payload, json!({"id": "city"}));
}

#[test]
fn test_select_mode_falls_back_to_markup() {
    let h = Harness::with(&[("data-mode", "tags")], None);
    h.push(
        "select",
        json!({"id": "city", "selection": [{"label": "A"}], "current_text": "typed"}),
    );
    assert_eq!(h.text(), "typed");
}

#[test]
fn test_active_scrolls_option_into_view() {
    let h = Harness::with(&[], Some(option_list(4, 0, Some(0))));
    let before = h.highlighted();

    h.push("active", json!({"id": "city", "idx": 3}));
    assert_eq!(h.effects(), vec![DomEffect::ScrollIntoView { node: h.option("3") }]);

    h.push("active", json!({"id": "city", "idx": "1"}));
    assert_eq!(h.effects(), vec![DomEffect::ScrollIntoView { node: h.option("1") }]);

    // Highlight classes are left to the remote owner
    assert_eq!(h.highlighted(), before);

    h.push("active", json!({"id": "city", "idx": 9}));
    assert!(h.effects().is_empty());
}

#[test]
fn test_parent_event_is_relayed() {
    let h = Harness::with(&[], None);
    h.push(
        "parent_event",
        json!({"id": "city", "event": "clear_form", "payload": {"keep": ["a"]}}),
    );
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "clear_form");
    assert_eq!(sent[0].target, PushTarget::View);
    assert_eq!(sent[0].payload, json!({"keep": ["a"]}));
}

#[test]
fn test_events_for_other_widgets_are_ignored() {
    let h = Harness::with(&[], Some(option_list(3, 0, None)));
    h.type_text("mine");
    h.sent();

    h.push(
        "select",
        json!({"id": "other", "selection": [{"label": "X"}], "mode": "single", "input_event": true, "parent_event": "x"}),
    );
    h.push("active", json!({"id": "other", "idx": 1}));
    h.push("parent_event", json!({"id": "other", "event": "x", "payload": {}}));

    assert_eq!(h.text(), "mine");
    assert!(h.widget.selection().is_empty());
    assert!(h.effects().is_empty());
    assert!(h.sent().is_empty());
}

#[test]
fn test_malformed_payload_is_ignored() {
    let h = Harness::with(&[], None);
    h.push("select", json!({"id": "city", "selection": "not a list"}));
    assert!(h.widget.selection().is_empty());
    assert!(h.sent().is_empty());
}

#[test]
fn test_widgets_share_a_channel() {
    let h = Harness::with(&[], None);
    let (other_root, other) = h.attach_sibling(widget_markup("country", &[], None));

    assert_eq!(h.channel.subscriber_count("select"), 2);
    h.push(
        "select",
        json!({"id": "country", "selection": [{"label": "Norway"}], "mode": "single"}),
    );

    assert!(h.widget.selection().is_empty());
    assert_eq!(other.selection().len(), 1);
    let input = live_select::accessor::text_input(&h.document.lock(), other_root).unwrap();
    assert_eq!(h.document.lock().value(input), Some("Norway"));
    assert_eq!(h.text(), "");

    drop(other);
    assert_eq!(h.channel.subscriber_count("select"), 1);
}

// -------------------------------------------------------------------------
// Reconnect
// -------------------------------------------------------------------------

#[test]
fn test_reconnect_with_empty_selection_sends_nothing() {
    let h = Harness::with(&[], None);
    h.widget.reconnected();
    assert!(h.sent().is_empty());
}

#[test]
fn test_reconnect_recovers_selection_once() {
    let h = Harness::with(&[], None);
    let selection = json!([
        {"label": "Rome", "value": "rome", "tag_label": "RO"},
        {"label": "Oslo", "value": {"lat": 59.9}}
    ]);
    h.push(
        "select",
        json!({"id": "city", "selection": selection, "mode": "tags", "current_text": ""}),
    );
    h.sent();

    h.widget.reconnected();
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, "selection_recovery");
    assert_eq!(sent[0].target, component("city"));
    assert_eq!(sent[0].payload, selection);
}

// -------------------------------------------------------------------------
// Refresh and detach
// -------------------------------------------------------------------------

#[test]
fn test_listeners_on_removed_elements_never_fire() {
    let h = Harness::with(&[], Some(option_list(3, 0, None)));
    let old_input = h.text_input();
    let old_option = h.option("1");

    h.rerender(Some(option_list(2, 0, None)));
    assert!(!h.widget.dispatch(old_input, &DomEvent::Input).handled);
    assert!(!h.widget.dispatch(old_option, &DomEvent::MouseDown).handled);

    // Fresh elements are not wired until refresh
    let new_input = h.text_input();
    assert_ne!(new_input, old_input);
    assert!(!h.widget.dispatch(new_input, &DomEvent::Input).handled);

    h.widget.refresh();
    assert!(!h.widget.dispatch(old_input, &DomEvent::Input).handled);
    h.document.lock().set_value(new_input, "Lima");
    assert!(h.widget.dispatch(new_input, &DomEvent::Input).handled);
    assert!(h.widget.dispatch(h.option("1"), &DomEvent::MouseDown).default_prevented);

    h.settle();
    assert_eq!(h.transport.events_named("change").len(), 1);
    assert_eq!(h.transport.events_named("option_click").len(), 1);
}

#[test]
fn test_refresh_rereads_configuration() {
    let h = Harness::with(&[("data-debounce", "100")], None);
    {
        let mut doc = h.document.lock();
        doc.set_attribute(h.root, "data-debounce", "5000");
        doc.set_attribute(h.root, "data-update-min-len", "4");
        doc.set_attribute(h.root, "data-phx-target", "#outer");
    }
    h.widget.refresh();

    let config = h.widget.config();
    assert_eq!(config.debounce, Duration::from_secs(5));
    assert_eq!(config.update_min_len, 4);

    h.type_text("Lisbon");
    assert_eq!(h.settle(), 0);
    assert_eq!(h.advance(Duration::from_secs(6)), 1);
    let parent = h.transport.events_named("live_select_change");
    assert_eq!(parent[0].target, PushTarget::Selector("#outer".to_string()));
}

#[test]
fn test_refresh_restyles_clear_button() {
    let h = Harness::with(&[], None);
    h.rerender(None);
    let button = h.query(&Selector::tag("button").attr_eq("phx-click", "clear"));
    assert_eq!(h.document.lock().style(button, "position"), None);

    h.widget.refresh();
    assert_eq!(h.document.lock().style(button, "position"), Some("absolute"));
}

#[test]
fn test_refresh_with_invalid_configuration_uses_defaults() {
    let h = Harness::with(&[("data-debounce", "300")], None);
    h.document
        .lock()
        .set_attribute(h.root, "data-debounce", "later");
    h.widget.refresh();
    assert_eq!(h.widget.config().debounce, Duration::from_millis(100));
}

#[test]
fn test_detach_cancels_pending_change() {
    let h = Harness::with(&[], None);
    h.type_text("Quito");
    assert!(h.widget.is_change_pending());
    assert_eq!(h.scheduler.active_count(), 1);

    let Harness {
        widget,
        scheduler,
        transport,
        channel,
        ..
    } = h;
    widget.detach();

    assert_eq!(scheduler.active_count(), 0);
    assert_eq!(scheduler.process_ready_at(std::time::Instant::now() + Duration::from_secs(1)), 0);
    assert!(transport.is_empty());
    assert_eq!(channel.subscriber_count("select"), 0);
    assert_eq!(channel.subscriber_count("active"), 0);
    assert_eq!(channel.subscriber_count("parent_event"), 0);
}

#[test]
fn test_pushed_events_after_detach_are_ignored() {
    let h = Harness::with(&[], None);
    let Harness {
        widget,
        channel,
        transport,
        document,
        root,
        ..
    } = h;
    widget.detach();

    let delivered = channel.deliver(
        "select",
        json!({"id": "city", "selection": [{"label": "Late"}], "mode": "single", "parent_event": "x"}),
    );
    assert_eq!(delivered, 0);
    let input = live_select::accessor::text_input(&document.lock(), root).unwrap();
    assert_eq!(document.lock().value(input), Some(""));
    assert!(transport.is_empty());
}
