//! Filling: resolve saved values back onto live elements and harvest the
//! current values of previously scanned fields.

use tracing::{debug, warn};

use crate::engine::field::{Field, FieldKind, FieldValue, Form};
use crate::engine::matcher::find_match;
use crate::page::{EventKind, NodeId, PageModel};

/// Marker class applied to every element a fill touched.
pub const FILLED_CLASS: &str = "formvault-filled";

/// Fill every scanned field that has a matching saved value. Returns the
/// number of fields actually written; a field with no match or a stale
/// selector is skipped, never an error.
pub fn fill_forms(page: &mut PageModel, forms: &[Form], saved_values: &[Field]) -> usize {
    let mut filled = 0;
    for form in forms {
        for field in &form.fields {
            // The saved copy carries the value; the scanned copy carries the
            // locators valid on this page right now.
            let Some(saved) = find_match(field, saved_values) else {
                debug!(field = %field.id, "no saved value matches field");
                continue;
            };
            if fill_field(page, field, saved) {
                filled += 1;
            }
        }
    }
    debug!(filled, "fill pass complete");
    filled
}

/// Apply one saved value to the element a scanned field points at.
pub fn fill_field(page: &mut PageModel, field: &Field, saved: &Field) -> bool {
    let Some(element) = resolve(page, field) else {
        warn!(selector = %field.selector, "fill target did not resolve");
        return false;
    };

    let live_kind = FieldKind::from_element(page.tag(element), page.input_type(element));
    let done = match live_kind {
        FieldKind::Select => fill_select(page, element, saved),
        FieldKind::Checkbox => fill_checkbox(page, element, saved),
        FieldKind::Radio => fill_radio(page, element, saved),
        _ => fill_text_like(page, element, saved),
    };
    if done {
        page.add_class(element, FILLED_CLASS);
    }
    done
}

/// Read back the current values of previously scanned fields.
///
/// Text-like fields are reported only when non-empty; select, checkbox and
/// radio fields are always reported because their empty state is meaningful.
pub fn current_values(page: &PageModel, forms: &[Form]) -> Vec<Field> {
    let mut values = Vec::new();
    for form in forms {
        for field in &form.fields {
            let Some(element) = page.query(&field.selector) else {
                warn!(selector = %field.selector, "value selector did not resolve");
                continue;
            };

            let mut current = field.clone();
            match field.kind {
                FieldKind::Select => {
                    current.value = FieldValue::Text(page.value(element));
                    current.selected_index = Some(page.selected_index(element));
                    current.selected_text = Some(page.selected_text(element));
                    values.push(current);
                }
                FieldKind::Checkbox | FieldKind::Radio => {
                    current.value = FieldValue::Bool(page.checked(element));
                    values.push(current);
                }
                _ => {
                    let text = page.value(element);
                    if !text.is_empty() {
                        current.value = FieldValue::Text(text);
                        values.push(current);
                    }
                }
            }
        }
    }
    values
}

/// Locate a field's element: selector first, then DOM id, then a name
/// selector tightened for grouped inputs.
fn resolve(page: &PageModel, field: &Field) -> Option<NodeId> {
    if let Some(element) = page.query(&field.selector) {
        return Some(element);
    }
    if let Some(element) = page.element_by_id(&field.id) {
        return Some(element);
    }
    if field.name.is_empty() {
        return None;
    }
    let by_name = match (&field.kind, &field.input_value) {
        (FieldKind::Radio | FieldKind::Checkbox, Some(value)) => format!(
            r#"input[type="{}"][name="{}"][value="{}"]"#,
            field.kind, field.name, value
        ),
        _ => format!(r#"[name="{}"]"#, field.name),
    };
    page.query(&by_name)
}

fn fill_select(page: &mut PageModel, element: NodeId, saved: &Field) -> bool {
    page.set_select_value(element, saved.value.as_text());

    // Value-based restore failed; fall back to the saved positional index.
    if page.selected_index(element) < 0 {
        if let Some(index) = saved.selected_index.filter(|&i| i >= 0) {
            page.set_selected_index(element, index);
        }
    }

    if page.selected_index(element) < 0 {
        return false;
    }
    page.dispatch(element, EventKind::Change);
    true
}

fn fill_checkbox(page: &mut PageModel, element: NodeId, saved: &Field) -> bool {
    page.set_checked(element, saved.value.is_truthy());
    page.dispatch(element, EventKind::Change);
    true
}

/// Restore a radio group: exactly the member whose value matches the saved
/// member value is checked, every other member is cleared.
fn fill_radio(page: &mut PageModel, element: NodeId, saved: &Field) -> bool {
    let group = page.name_attr(element).to_string();
    let members = page.radios_in_group(&group);

    if members.len() <= 1 {
        // Lone radio with no group to walk; toggle it directly.
        page.set_checked(element, saved.value.is_truthy());
        page.dispatch(element, EventKind::Change);
        return true;
    }

    let target = saved.input_value.as_deref().unwrap_or_default();
    let mut matched = None;
    for member in members {
        let should_check = page.value_attr(member) == target && saved.value.is_truthy();
        page.set_checked(member, should_check);
        if should_check {
            matched = Some(member);
        }
    }

    match matched {
        Some(member) => {
            page.dispatch(member, EventKind::Change);
            true
        }
        None => {
            // Nothing to check; the group was still cleared, but notify the
            // originally resolved element so listeners see the change.
            page.dispatch(element, EventKind::Change);
            false
        }
    }
}

fn fill_text_like(page: &mut PageModel, element: NodeId, saved: &Field) -> bool {
    page.focus(element);
    page.set_value(element, saved.value.as_text());
    page.dispatch(element, EventKind::Input);
    page.dispatch(element, EventKind::Change);
    page.blur(element);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scanner::scan;
    use crate::page::{DispatchedEvent, PageSnapshot};

    fn page(json: &str) -> PageModel {
        PageModel::from_snapshot(&PageSnapshot::from_json(json).unwrap())
    }

    fn saved_text(id: &str, name: &str, value: &str) -> Field {
        Field {
            id: id.to_string(),
            name: name.to_string(),
            kind: FieldKind::Text,
            selector: String::new(),
            label: String::new(),
            placeholder: String::new(),
            value: FieldValue::Text(value.to_string()),
            required: false,
            max_length: None,
            pattern: String::new(),
            options: None,
            input_value: None,
            radio_group: None,
            selected_index: None,
            selected_text: None,
        }
    }

    #[test]
    fn fills_text_field_with_full_event_sequence() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "text", "id": "email", "name": "email"}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        page.clear_events();

        let saved = vec![saved_text("email", "email", "a@b.com")];
        let filled = fill_forms(&mut page, &outcome.forms, &saved);

        assert_eq!(filled, 1);
        let element = page.query("#email").unwrap();
        assert_eq!(page.value(element), "a@b.com");
        assert!(page.has_class(element, FILLED_CLASS));
        assert_eq!(
            page.events(),
            &[
                DispatchedEvent { target: element, kind: EventKind::Input },
                DispatchedEvent { target: element, kind: EventKind::Change },
            ]
        );
    }

    #[test]
    fn select_restores_by_value_then_index() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "select", "id": "country", "options": [
                    {"value": "us", "text": "United States", "selected": true},
                    {"value": "jp", "text": "Japan"}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        let element = page.query("#country").unwrap();

        let mut saved = saved_text("country", "", "jp");
        saved.kind = FieldKind::Select;
        assert!(fill_field(&mut page, &outcome.forms[0].fields[0], &saved));
        assert_eq!(page.value(element), "jp");

        // Unknown value falls back to the saved index.
        saved.value = FieldValue::Text("de".to_string());
        saved.selected_index = Some(0);
        assert!(fill_field(&mut page, &outcome.forms[0].fields[0], &saved));
        assert_eq!(page.value(element), "us");

        // Unknown value and no usable index leaves the selection cleared.
        saved.selected_index = None;
        assert!(!fill_field(&mut page, &outcome.forms[0].fields[0], &saved));
        assert_eq!(page.selected_index(element), -1);
    }

    #[test]
    fn radio_group_checks_exactly_the_saved_member() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "radio", "name": "plan", "value": "free", "checked": true},
                {"tag": "input", "type": "radio", "name": "plan", "value": "pro"}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        let mut saved = outcome.forms[0].fields[1].clone();
        saved.value = FieldValue::Bool(true);
        let filled = fill_field(&mut page, &outcome.forms[0].fields[1], &saved);

        assert!(filled);
        let free = page.query(r#"input[type="radio"][name="plan"][value="free"]"#).unwrap();
        let pro = page.query(r#"input[type="radio"][name="plan"][value="pro"]"#).unwrap();
        assert!(!page.checked(free));
        assert!(page.checked(pro));
    }

    #[test]
    fn checkbox_applies_truthiness_rule() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "checkbox", "id": "tos", "name": "tos", "value": "yes"}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        let element = page.query("#tos").unwrap();

        let mut saved = outcome.forms[0].fields[0].clone();
        saved.value = FieldValue::Text("true".to_string());
        assert!(fill_field(&mut page, &outcome.forms[0].fields[0], &saved));
        assert!(page.checked(element));

        saved.value = FieldValue::Bool(false);
        assert!(fill_field(&mut page, &outcome.forms[0].fields[0], &saved));
        assert!(!page.checked(element));
    }

    #[test]
    fn stale_selector_falls_back_to_id_then_name() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "text", "id": "city", "name": "city"}
            ]}}"#,
        );
        let mut field = saved_text("city", "city", "");
        field.selector = "#renamed".to_string();
        let saved = saved_text("city", "city", "Berlin");

        assert!(fill_field(&mut page, &field, &saved));
        assert_eq!(page.value(page.query("#city").unwrap()), "Berlin");

        // Remove the id path too; the name selector still resolves.
        let mut field = saved_text("other", "city", "");
        field.selector = "#renamed".to_string();
        assert!(fill_field(&mut page, &field, &saved));
    }

    #[test]
    fn unresolvable_field_is_skipped_not_fatal() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "text", "id": "kept", "name": "kept"}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        let mut ghost = saved_text("ghost", "ghost", "");
        ghost.selector = "#ghost".to_string();
        let mut forms = outcome.forms.clone();
        forms[0].fields.push(ghost);

        let saved = vec![
            saved_text("kept", "kept", "v"),
            saved_text("ghost", "ghost", "w"),
        ];
        assert_eq!(fill_forms(&mut page, &forms, &saved), 1);
    }

    #[test]
    fn current_values_reports_text_only_when_non_empty() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "text", "id": "filled", "value": "x"},
                {"tag": "input", "type": "text", "id": "empty"},
                {"tag": "input", "type": "checkbox", "id": "box"}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        let values = current_values(&page, &outcome.forms);

        let ids: Vec<&str> = values.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["filled", "box"]);
        assert_eq!(values[1].value, FieldValue::Bool(false));
    }

    #[test]
    fn current_values_reflects_live_select_state() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "select", "id": "country", "options": [
                    {"value": "us", "text": "United States", "selected": true},
                    {"value": "jp", "text": "Japan"}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        page.set_select_value(page.query("#country").unwrap(), "jp");

        let values = current_values(&page, &outcome.forms);
        assert_eq!(values[0].value, FieldValue::Text("jp".to_string()));
        assert_eq!(values[0].selected_index, Some(1));
        assert_eq!(values[0].selected_text.as_deref(), Some("Japan"));
    }
}
