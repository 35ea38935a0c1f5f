//! Form scanning: find containers and input-like elements, build field
//! descriptors, and apply the transient highlight markers.

use tracing::{debug, warn};

use crate::engine::field::{Field, FieldKind, FieldValue, Form, ScanOutcome, SelectOption};
use crate::engine::selector::generate_selector;
use crate::page::{NodeId, PageModel};

/// Marker class applied to every discovered field during a scan.
pub const HIGHLIGHT_CLASS: &str = "formvault-highlight";

/// Synthetic container id for inputs outside any recognized container.
pub const ORPHAN_FORM_ID: &str = "orphan_inputs_form";

const INPUT_TAGS: [&str; 3] = ["input", "textarea", "select"];

const EXCLUDED_TYPES: [&str; 5] = ["submit", "button", "reset", "file", "image"];

/// Label text harvested from surrounding markup is capped at this length.
const NEARBY_TEXT_LIMIT: usize = 50;

/// Scan a page for forms, form-like containers, and orphan inputs.
///
/// A failing container is skipped, never the whole scan; zero forms is a
/// valid outcome. Discovered fields get a highlight marker the caller is
/// expected to clear after its display delay.
pub fn scan(page: &mut PageModel) -> ScanOutcome {
    let mut forms = Vec::new();
    let mut total_fields = 0;
    let mut field_index = 0;

    // Step 1: semantic <form> containers.
    let form_containers: Vec<NodeId> =
        page.ids().filter(|&id| page.tag(id) == "form").collect();
    debug!(count = form_containers.len(), "found <form> containers");

    // Step 2: form-like containers (class or id mentions "form"), excluding
    // anything nested inside a step-1 container.
    let form_like: Vec<NodeId> = page
        .ids()
        .filter(|&id| {
            page.tag(id) == "div"
                && (contains_form(&page.class_attr(id)) || contains_form(page.id_attr(id)))
                && page
                    .closest_ancestor(id, |p, a| p.tag(a) == "form")
                    .is_none()
        })
        .collect();
    debug!(count = form_like.len(), "found form-like containers");

    let mut claimed: Vec<NodeId> = Vec::new();
    for &container in form_containers.iter().chain(form_like.iter()) {
        claimed.push(container);
    }

    let mut container_index = 0;
    for &container in form_containers.iter().chain(form_like.iter()) {
        let inputs: Vec<NodeId> = page
            .descendants(container)
            .into_iter()
            .filter(|&id| is_input_like(page, id))
            .collect();
        match build_form(page, container, &inputs, &mut field_index, container_index) {
            Some(form) => {
                debug!(
                    form_id = %form.id,
                    fields = form.fields.len(),
                    "container contributed fields"
                );
                total_fields += form.fields.len();
                forms.push(form);
            }
            None => {
                debug!("skipped container with no valid fields");
            }
        }
        container_index += 1;
    }

    // Step 3: orphan inputs, grouped into one synthetic container.
    let all_inputs: Vec<NodeId> = page
        .ids()
        .filter(|&id| is_input_like(page, id))
        .collect();
    let orphans: Vec<NodeId> = all_inputs
        .iter()
        .copied()
        .filter(|&id| {
            page.closest_ancestor(id, |_, a| claimed.contains(&a))
                .is_none()
        })
        .collect();
    if !orphans.is_empty() {
        debug!(count = orphans.len(), "found orphan inputs");
        let fields = build_fields(page, &orphans, &mut field_index);
        if !fields.is_empty() {
            total_fields += fields.len();
            forms.push(Form {
                id: ORPHAN_FORM_ID.to_string(),
                selector: "body".to_string(),
                fields,
                url: page.url.clone(),
                title: page.title.clone(),
                is_orphan: true,
            });
        }
    }

    // Step 4: transient highlight on everything we found.
    highlight_fields(page, &forms);

    ScanOutcome {
        forms,
        total_fields,
        total_inputs: all_inputs.len(),
    }
}

/// Remove highlight markers, typically after the display delay elapses.
pub fn clear_highlights(page: &mut PageModel) {
    page.clear_class(HIGHLIGHT_CLASS);
}

fn contains_form(attr: &str) -> bool {
    attr.to_lowercase().contains("form")
}

fn is_input_like(page: &PageModel, id: NodeId) -> bool {
    INPUT_TAGS.contains(&page.tag(id))
}

fn build_form(
    page: &PageModel,
    container: NodeId,
    inputs: &[NodeId],
    field_index: &mut usize,
    container_index: usize,
) -> Option<Form> {
    let fields = build_fields(page, inputs, field_index);
    if fields.is_empty() {
        return None;
    }

    let container_id = page.id_attr(container);
    let id = if container_id.is_empty() {
        format!("form_{}", container_index)
    } else {
        container_id.to_string()
    };

    Some(Form {
        id,
        selector: generate_selector(page, container),
        fields,
        url: page.url.clone(),
        title: page.title.clone(),
        is_orphan: false,
    })
}

fn build_fields(page: &PageModel, inputs: &[NodeId], field_index: &mut usize) -> Vec<Field> {
    let mut fields = Vec::new();
    for &input in inputs {
        if !is_valid_input(page, input) {
            debug!(
                tag = page.tag(input),
                input_type = page.input_type(input),
                "skipped invalid input"
            );
            *field_index += 1;
            continue;
        }
        match extract_field(page, input, *field_index) {
            Some(field) => fields.push(field),
            None => {
                debug!(input_type = page.input_type(input), "skipped invisible input");
            }
        }
        *field_index += 1;
    }
    fields
}

/// Validity filter: excluded types, valueless hidden inputs,
/// disabled/read-only elements, and inline-hidden elements.
fn is_valid_input(page: &PageModel, id: NodeId) -> bool {
    let input_type = page.input_type(id);
    if EXCLUDED_TYPES.contains(&input_type) {
        return false;
    }
    if input_type == "hidden" && page.value_attr(id).is_empty() {
        return false;
    }
    if page.disabled(id) || page.read_only(id) {
        return false;
    }
    let style = page.style(id);
    if style.display == "none" || style.visibility == "hidden" {
        return false;
    }
    true
}

fn extract_field(page: &PageModel, input: NodeId, index: usize) -> Option<Field> {
    let kind = FieldKind::from_element(page.tag(input), page.input_type(input));

    // Zero-size elements are treated as invisible, except select/radio/checkbox
    // whose visible representation is often styled indirectly.
    let geometry_exempt = matches!(
        kind,
        FieldKind::Select | FieldKind::Radio | FieldKind::Checkbox
    );
    if !geometry_exempt {
        if let Some(rect) = page.rect(input) {
            if rect.width == 0.0 && rect.height == 0.0 {
                return None;
            }
        }
    }

    let label = find_label(page, input);
    let placeholder = if page.placeholder(input).is_empty() {
        page.aria_label(input).to_string()
    } else {
        page.placeholder(input).to_string()
    };

    let mut field = Field {
        id: if page.id_attr(input).is_empty() {
            format!("field_{}", index)
        } else {
            page.id_attr(input).to_string()
        },
        name: page.name_attr(input).to_string(),
        kind: kind.clone(),
        selector: generate_selector(page, input),
        label,
        placeholder,
        value: FieldValue::Text(String::new()),
        required: page.required(input),
        max_length: page.max_length(input).filter(|&len| len > 0),
        pattern: page.pattern(input).to_string(),
        options: None,
        input_value: None,
        radio_group: None,
        selected_index: None,
        selected_text: None,
    };

    match kind {
        FieldKind::Select => {
            field.value = FieldValue::Text(page.value(input));
            field.selected_index = Some(page.selected_index(input));
            field.selected_text = Some(page.selected_text(input));
            field.options = Some(
                page.options(input)
                    .iter()
                    .map(|o| SelectOption {
                        value: o.value.clone(),
                        text: o.text.clone(),
                        selected: o.selected,
                    })
                    .collect(),
            );
        }
        FieldKind::Checkbox => {
            field.value = FieldValue::Bool(page.checked(input));
            field.input_value = Some(page.value_attr(input).to_string());
        }
        FieldKind::Radio => {
            field.value = FieldValue::Bool(page.checked(input));
            field.input_value = Some(page.value_attr(input).to_string());
            field.radio_group = Some(page.name_attr(input).to_string());
        }
        _ => {
            field.value = FieldValue::Text(page.value(input));
        }
    }

    Some(field)
}

/// Best-effort caption for an input: explicit label, wrapping label,
/// preceding sibling label, then nearby text.
fn find_label(page: &PageModel, input: NodeId) -> String {
    let dom_id = page.id_attr(input);
    if !dom_id.is_empty() {
        if let Some(label) = page
            .ids()
            .find(|&id| page.tag(id) == "label" && page.node(id).for_id == dom_id)
        {
            return page.subtree_text(label);
        }
    }

    if let Some(wrapping) = page.closest_ancestor(input, |p, a| p.tag(a) == "label") {
        let text = page.subtree_text(wrapping);
        let value = page.value(input);
        if !value.is_empty() {
            return text.replacen(&value, "", 1).trim().to_string();
        }
        return text;
    }

    if let Some(sibling) = page.previous_sibling(input) {
        if page.tag(sibling) == "label" {
            return page.subtree_text(sibling);
        }
    }

    nearby_text(page, input)
}

/// Concatenated text found in the input's parent, capped in length.
fn nearby_text(page: &PageModel, input: NodeId) -> String {
    let Some(parent) = page.parent(input) else {
        return String::new();
    };
    let text = page.subtree_text(parent);
    text.chars().take(NEARBY_TEXT_LIMIT).collect()
}

fn highlight_fields(page: &mut PageModel, forms: &[Form]) {
    page.clear_class(HIGHLIGHT_CLASS);
    for form in forms {
        for field in &form.fields {
            // A stale selector here is cosmetic, never a scan failure.
            match page.query(&field.selector) {
                Some(element) => page.add_class(element, HIGHLIGHT_CLASS),
                None => warn!(selector = %field.selector, "highlight selector did not resolve"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSnapshot;

    fn page(json: &str) -> PageModel {
        PageModel::from_snapshot(&PageSnapshot::from_json(json).unwrap())
    }

    #[test]
    fn scans_form_containers() {
        let mut page = page(
            r#"{"url": "https://example.org/signup", "title": "Sign up", "root": {"tag": "body", "children": [
                {"tag": "form", "id": "signup", "children": [
                    {"tag": "input", "type": "text", "id": "email"},
                    {"tag": "input", "type": "submit", "value": "Go"}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        assert_eq!(outcome.forms.len(), 1);
        assert_eq!(outcome.total_fields, 1);
        assert_eq!(outcome.total_inputs, 2);
        let form = &outcome.forms[0];
        assert_eq!(form.id, "signup");
        assert!(!form.is_orphan);
        assert_eq!(form.fields[0].selector, "#email");
        assert_eq!(form.fields[0].kind, FieldKind::Text);
    }

    #[test]
    fn form_like_divs_are_scanned_unless_nested_in_form() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "body", "children": [
                {"tag": "form", "children": [
                    {"tag": "div", "class": "form-inner", "children": [
                        {"tag": "input", "type": "text", "name": "inside"}
                    ]}
                ]},
                {"tag": "div", "class": "login-Form", "children": [
                    {"tag": "input", "type": "text", "name": "outside"}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        // The nested form-like div must not double-count the inner input.
        assert_eq!(outcome.forms.len(), 2);
        assert_eq!(outcome.total_fields, 2);
        assert!(outcome.forms.iter().all(|f| !f.is_orphan));
    }

    #[test]
    fn orphan_inputs_group_into_synthetic_form() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "body", "children": [
                {"tag": "input", "type": "text", "name": "lonely"},
                {"tag": "div", "children": [
                    {"tag": "textarea", "name": "notes"}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        assert_eq!(outcome.forms.len(), 1);
        let orphan = &outcome.forms[0];
        assert!(orphan.is_orphan);
        assert_eq!(orphan.id, ORPHAN_FORM_ID);
        assert_eq!(orphan.selector, "body");
        assert_eq!(orphan.fields.len(), 2);
    }

    #[test]
    fn inputs_inside_form_like_divs_are_not_orphans() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "body", "children": [
                {"tag": "div", "class": "checkout-form", "children": [
                    {"tag": "input", "type": "text", "name": "card"}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        assert_eq!(outcome.forms.len(), 1);
        assert!(!outcome.forms[0].is_orphan);
    }

    #[test]
    fn validity_filter_excludes_expected_inputs() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "submit"},
                {"tag": "input", "type": "file"},
                {"tag": "input", "type": "hidden"},
                {"tag": "input", "type": "hidden", "value": "csrf"},
                {"tag": "input", "type": "text", "disabled": true},
                {"tag": "input", "type": "text", "readOnly": true},
                {"tag": "input", "type": "text", "style": {"display": "none"}},
                {"tag": "input", "type": "text", "name": "kept"}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        assert_eq!(outcome.total_fields, 2);
        let names: Vec<&str> = outcome.forms[0]
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert!(names.contains(&"kept"));
        // The valued hidden input survives.
        assert!(outcome.forms[0]
            .fields
            .iter()
            .any(|f| f.kind == FieldKind::Other("hidden".to_string())));
    }

    #[test]
    fn zero_size_exemption_for_custom_styled_checkboxes() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "checkbox", "name": "tos", "rect": {"width": 0, "height": 0}},
                {"tag": "input", "type": "text", "name": "gone", "rect": {"width": 0, "height": 0}}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        assert_eq!(outcome.total_fields, 1);
        assert_eq!(outcome.forms[0].fields[0].name, "tos");
    }

    #[test]
    fn synthetic_field_ids_are_unique_across_containers() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "body", "children": [
                {"tag": "form", "children": [{"tag": "input", "type": "text", "name": "a"}]},
                {"tag": "form", "children": [{"tag": "input", "type": "text", "name": "b"}]}
            ]}}"#,
        );
        let outcome = scan(&mut page);

        let mut ids: Vec<&str> = outcome
            .forms
            .iter()
            .flat_map(|f| f.fields.iter().map(|field| field.id.as_str()))
            .collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn label_derivation_prefers_explicit_label() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "label", "for": "email", "text": "Email address"},
                {"tag": "input", "type": "email", "id": "email"},
                {"tag": "label", "children": [
                    {"tag": "span", "text": "Wrapped"},
                    {"tag": "input", "type": "text", "name": "wrapped"}
                ]},
                {"tag": "label", "text": "Sibling"},
                {"tag": "input", "type": "text", "name": "sib"}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        let fields = &outcome.forms[0].fields;

        assert_eq!(fields[0].label, "Email address");
        assert_eq!(fields[1].label, "Wrapped");
        assert_eq!(fields[2].label, "Sibling");
    }

    #[test]
    fn select_fields_capture_options_and_selection() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "select", "id": "country", "options": [
                    {"value": "us", "text": "United States"},
                    {"value": "jp", "text": "Japan", "selected": true}
                ]}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        let field = &outcome.forms[0].fields[0];

        assert_eq!(field.kind, FieldKind::Select);
        assert_eq!(field.value, FieldValue::Text("jp".to_string()));
        assert_eq!(field.selected_index, Some(1));
        assert_eq!(field.selected_text.as_deref(), Some("Japan"));
        assert_eq!(field.options.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn radio_fields_capture_group_and_input_value() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "radio", "name": "plan", "value": "free", "checked": true},
                {"tag": "input", "type": "radio", "name": "plan", "value": "pro"}
            ]}}"#,
        );
        let outcome = scan(&mut page);
        let fields = &outcome.forms[0].fields;

        assert_eq!(fields[0].value, FieldValue::Bool(true));
        assert_eq!(fields[0].input_value.as_deref(), Some("free"));
        assert_eq!(fields[0].radio_group.as_deref(), Some("plan"));
        assert_eq!(fields[1].value, FieldValue::Bool(false));
    }

    #[test]
    fn empty_page_scans_to_empty_success() {
        let mut page = page(r#"{"url": "u", "root": {"tag": "body"}}"#);
        let outcome = scan(&mut page);
        assert!(outcome.forms.is_empty());
        assert_eq!(outcome.total_fields, 0);
        assert_eq!(outcome.total_inputs, 0);
    }

    #[test]
    fn scan_applies_and_clear_removes_highlight() {
        let mut page = page(
            r#"{"url": "u", "root": {"tag": "form", "children": [
                {"tag": "input", "type": "text", "id": "email"}
            ]}}"#,
        );
        scan(&mut page);
        let element = page.query("#email").unwrap();
        assert!(page.has_class(element, HIGHLIGHT_CLASS));

        clear_highlights(&mut page);
        assert!(!page.has_class(element, HIGHLIGHT_CLASS));
    }
}
