//! Selector generation: derive a reapplicable locator for an element,
//! preferring stable identifiers over structural paths.

use crate::page::{NodeId, PageModel};

/// Classes the tool itself adds while highlighting/filling. They must never
/// leak into generated selectors or the tool's own side effects would change
/// the locators it produces.
const MARKER_PREFIX: &str = "formvault-";

/// Data attributes accepted as stable identifiers, in priority order.
const DATA_ATTRS: [&str; 3] = ["id", "name", "field"];

/// Maximum ancestors in a structural fallback path.
const MAX_PATH_DEPTH: usize = 3;

/// Maximum classes carried per path segment.
const MAX_SEGMENT_CLASSES: usize = 2;

/// Generate a selector for an element. Pure in the element's identifying
/// attributes: mutating its value does not change the result.
pub fn generate_selector(page: &PageModel, element: NodeId) -> String {
    // 1. DOM id wins outright.
    let dom_id = page.id_attr(element);
    if !dom_id.is_empty() {
        return format!("#{}", dom_id);
    }

    // 2. name attribute; tightened with type+value for radio/checkbox so the
    //    selector stays unique within the group.
    let name = page.name_attr(element);
    if !name.is_empty() {
        let input_type = page.input_type(element);
        if input_type == "radio" || input_type == "checkbox" {
            return format!(
                r#"input[type="{}"][name="{}"][value="{}"]"#,
                input_type,
                name,
                page.value_attr(element)
            );
        }
        return format!(r#"[name="{}"]"#, name);
    }

    // 3. Recognized data attributes.
    for attr in DATA_ATTRS {
        if let Some(value) = page.data_attr(element, attr) {
            return format!(r#"[data-{}="{}"]"#, attr, value);
        }
    }

    // 4. Structural path fallback.
    structural_path(page, element)
}

fn structural_path(page: &PageModel, element: NodeId) -> String {
    let mut path = Vec::new();
    let mut current = Some(element);

    while let Some(id) = current {
        if path.len() >= MAX_PATH_DEPTH {
            break;
        }
        path.push(segment_for(page, id));

        current = page.parent(id);
        // Stop once the next ancestor is a form or body boundary.
        if let Some(parent) = current {
            let tag = page.tag(parent);
            if tag == "form" || tag == "body" {
                break;
            }
        }
    }

    path.reverse();
    path.join(" > ")
}

fn segment_for(page: &PageModel, id: NodeId) -> String {
    let mut segment = page.tag(id).to_string();

    let classes: Vec<&String> = page
        .classes(id)
        .iter()
        .filter(|c| !c.starts_with(MARKER_PREFIX))
        .take(MAX_SEGMENT_CLASSES)
        .collect();
    for class in classes {
        segment.push('.');
        segment.push_str(class);
    }

    let (position, same_tag_count) = page.same_tag_position(id);
    if same_tag_count > 1 {
        segment.push_str(&format!(":nth-child({})", position));
    }

    segment
}
