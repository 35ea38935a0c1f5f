//! Selector resolution for the shapes the selector generator emits.
//!
//! This is deliberately not a CSS engine: it resolves exactly the selector
//! grammar produced by `engine::selector` (plus bare tag names like `body`),
//! so the generate/resolve round-trip stays closed.

use crate::page::model::{NodeId, PageModel};

/// One segment of a structural path: `tag(.class)*(:nth-child(n))?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub tag: String,
    pub classes: Vec<String>,
    pub nth_child: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `#id`
    Id(String),
    /// `tag?([attr="value"])*`, e.g. `[name="email"]` or
    /// `input[type="radio"][name="grp"][value="a"]`
    Compound {
        tag: Option<String>,
        attrs: Vec<(String, String)>,
    },
    /// ` > `-joined structural path ending at the target element.
    Path(Vec<PathSegment>),
}

impl Selector {
    /// Parse a selector string. Returns None for shapes the generator
    /// never produces; callers treat that as "no match".
    pub fn parse(input: &str) -> Option<Selector> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(id) = input.strip_prefix('#') {
            if id.is_empty() {
                return None;
            }
            return Some(Selector::Id(id.to_string()));
        }

        if input.contains(" > ") {
            let segments = input
                .split(" > ")
                .map(parse_segment)
                .collect::<Option<Vec<_>>>()?;
            return Some(Selector::Path(segments));
        }

        if input.contains('[') {
            return parse_compound(input);
        }

        // Bare tag (the orphan container selector is `body`), possibly with
        // classes or nth-child. A single path segment covers all of these.
        Some(Selector::Path(vec![parse_segment(input)?]))
    }

    pub fn matches(&self, page: &PageModel, id: NodeId) -> bool {
        match self {
            Selector::Id(dom_id) => page.id_attr(id) == dom_id,
            Selector::Compound { tag, attrs } => {
                if let Some(tag) = tag {
                    if page.tag(id) != tag {
                        return false;
                    }
                }
                attrs.iter().all(|(key, value)| attr_matches(page, id, key, value))
            }
            Selector::Path(segments) => {
                let Some((last, ancestors)) = segments.split_last() else {
                    return false;
                };
                if !segment_matches(page, id, last) {
                    return false;
                }
                // Each preceding segment must match the next direct parent.
                let mut current = id;
                for segment in ancestors.iter().rev() {
                    let Some(parent) = page.parent(current) else {
                        return false;
                    };
                    if !segment_matches(page, parent, segment) {
                        return false;
                    }
                    current = parent;
                }
                true
            }
        }
    }
}

fn attr_matches(page: &PageModel, id: NodeId, key: &str, value: &str) -> bool {
    match key {
        "name" => page.name_attr(id) == value,
        "type" => page.input_type(id) == value,
        "value" => page.value_attr(id) == value,
        "id" => page.id_attr(id) == value,
        _ => match key.strip_prefix("data-") {
            Some(data_key) => page.data_attr(id, data_key) == Some(value),
            None => false,
        },
    }
}

fn segment_matches(page: &PageModel, id: NodeId, segment: &PathSegment) -> bool {
    if page.tag(id) != segment.tag {
        return false;
    }
    if !segment
        .classes
        .iter()
        .all(|class| page.has_class(id, class))
    {
        return false;
    }
    if let Some(nth) = segment.nth_child {
        let (position, _) = page.same_tag_position(id);
        if position != nth {
            return false;
        }
    }
    true
}

/// Parse `tag(.class)*(:nth-child(n))?`.
fn parse_segment(input: &str) -> Option<PathSegment> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (head, nth_child) = match input.find(":nth-child(") {
        Some(pos) => {
            let rest = &input[pos + ":nth-child(".len()..];
            let close = rest.find(')')?;
            let nth: usize = rest[..close].parse().ok()?;
            (&input[..pos], Some(nth))
        }
        None => (input, None),
    };

    let mut parts = head.split('.');
    let tag = parts.next()?.to_lowercase();
    if tag.is_empty() {
        return None;
    }
    let classes: Vec<String> = parts
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect();

    Some(PathSegment { tag, classes, nth_child })
}

/// Parse `tag?([attr="value"])+`.
fn parse_compound(input: &str) -> Option<Selector> {
    let first_bracket = input.find('[')?;
    let tag_part = &input[..first_bracket];
    let tag = if tag_part.is_empty() {
        None
    } else {
        Some(tag_part.to_lowercase())
    };

    let mut attrs = Vec::new();
    let mut rest = &input[first_bracket..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = rest.find(']')?;
        let body = &rest[1..close];
        let eq = body.find('=')?;
        let key = body[..eq].trim().to_string();
        let raw_value = body[eq + 1..].trim();
        let value = raw_value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(raw_value)
            .to_string();
        if key.is_empty() {
            return None;
        }
        attrs.push((key, value));
        rest = &rest[close + 1..];
    }

    if attrs.is_empty() {
        return None;
    }
    Some(Selector::Compound { tag, attrs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::model::PageSnapshot;

    fn page(json: &str) -> PageModel {
        PageModel::from_snapshot(&PageSnapshot::from_json(json).unwrap())
    }

    fn sample() -> PageModel {
        page(
            r#"{
                "url": "https://example.org/",
                "root": {
                    "tag": "body",
                    "children": [
                        {"tag": "form", "class": "signup-form", "children": [
                            {"tag": "div", "class": "row", "children": [
                                {"tag": "input", "type": "text", "id": "email", "name": "email"}
                            ]},
                            {"tag": "div", "class": "row", "children": [
                                {"tag": "input", "type": "radio", "name": "plan", "value": "free"},
                                {"tag": "input", "type": "radio", "name": "plan", "value": "pro"}
                            ]}
                        ]},
                        {"tag": "input", "type": "text", "data": {"field": "nickname"}}
                    ]
                }
            }"#,
        )
    }

    #[test]
    fn resolves_id_selector() {
        let page = sample();
        let found = page.query("#email").unwrap();
        assert_eq!(page.id_attr(found), "email");
    }

    #[test]
    fn resolves_name_selector() {
        let page = sample();
        let found = page.query(r#"[name="email"]"#).unwrap();
        assert_eq!(page.id_attr(found), "email");
    }

    #[test]
    fn resolves_tightened_radio_selector() {
        let page = sample();
        let found = page
            .query(r#"input[type="radio"][name="plan"][value="pro"]"#)
            .unwrap();
        assert_eq!(page.value_attr(found), "pro");
    }

    #[test]
    fn resolves_data_attribute_selector() {
        let page = sample();
        let found = page.query(r#"[data-field="nickname"]"#).unwrap();
        assert_eq!(page.data_attr(found, "field"), Some("nickname"));
    }

    #[test]
    fn resolves_structural_path_with_nth_child() {
        let page = sample();
        let second_row = page.query("div.row:nth-child(2) > input").unwrap();
        assert_eq!(page.value_attr(second_row), "free");
    }

    #[test]
    fn resolves_bare_body() {
        let page = sample();
        assert_eq!(page.query("body"), Some(0));
    }

    #[test]
    fn unknown_shapes_do_not_match() {
        let page = sample();
        assert_eq!(page.query(""), None);
        assert_eq!(page.query("#missing"), None);
        assert_eq!(page.query(r#"[name="nope"]"#), None);
    }
}
