//! Field matching: pair a freshly scanned field with a previously saved
//! value when exact identifiers are unavailable or unstable.
//!
//! The cascade is rule-major: a rule is evaluated against every saved
//! candidate before the next, lower-confidence rule is considered, so an id
//! match can never lose to a label match that happens to appear earlier in
//! the saved list.

use crate::engine::field::{Field, FieldKind};

/// Similarity threshold for the fuzzy fallback; strictly greater-than.
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Find the best saved value for a scanned field, or None when the field
/// should be treated as unfillable.
pub fn find_match<'a>(field: &Field, saved_values: &'a [Field]) -> Option<&'a Field> {
    // Rule 1: exact id equality, both non-empty.
    if !field.id.is_empty() {
        if let Some(saved) = saved_values.iter().find(|s| s.id == field.id) {
            return Some(saved);
        }
    }

    // Rule 2: radios match on name AND member value, and nothing else.
    // Radios sharing a name but differing value must never cross-match, so
    // the fuzzy fallback is off-limits for them.
    if field.kind == FieldKind::Radio {
        return saved_values.iter().find(|s| {
            s.kind == FieldKind::Radio
                && s.name == field.name
                && s.input_value == field.input_value
        });
    }

    // Rule 3: exact name equality, non-radio kinds only.
    if !field.name.is_empty() {
        if let Some(saved) = saved_values
            .iter()
            .find(|s| s.kind != FieldKind::Radio && s.name == field.name)
        {
            return Some(saved);
        }
    }

    // Rule 4: exact label equality, both non-empty.
    if !field.label.is_empty() {
        if let Some(saved) = saved_values.iter().find(|s| s.label == field.label) {
            return Some(saved);
        }
    }

    // Rule 5: fuzzy similarity over label-or-placeholder, same kind only.
    fuzzy_match(field, saved_values)
}

fn fuzzy_match<'a>(field: &Field, saved_values: &'a [Field]) -> Option<&'a Field> {
    let caption = caption_of(field);
    let mut best: Option<(&Field, f64)> = None;

    for saved in saved_values.iter().filter(|s| s.kind == field.kind) {
        let score = similarity(&caption, &caption_of(saved));
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((saved, score)),
        }
    }

    best.and_then(|(saved, score)| (score > SIMILARITY_THRESHOLD).then_some(saved))
}

fn caption_of(field: &Field) -> String {
    let caption = if field.label.is_empty() {
        &field.placeholder
    } else {
        &field.label
    };
    caption.to_lowercase()
}

/// Normalized inverse edit distance over characters, range [0, 1].
/// Two empty strings are defined as identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let longest = a_chars.len().max(b_chars.len());
    if longest == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a_chars, &b_chars);
    (longest - distance) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=a.len()).collect();
    let mut current = vec![0usize; a.len() + 1];

    for (i, &bc) in b.iter().enumerate() {
        current[0] = i + 1;
        for (j, &ac) in a.iter().enumerate() {
            let substitution = previous[j] + usize::from(ac != bc);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[a.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::field::FieldValue;

    fn field(id: &str, name: &str, kind: FieldKind, label: &str) -> Field {
        Field {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            selector: String::new(),
            label: label.to_string(),
            placeholder: String::new(),
            value: FieldValue::Text(String::new()),
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

    fn radio(name: &str, input_value: &str) -> Field {
        let mut f = field("", name, FieldKind::Radio, "");
        f.input_value = Some(input_value.to_string());
        f.radio_group = Some(name.to_string());
        f
    }

    #[test]
    fn id_match_beats_label_match_regardless_of_order() {
        let scanned = field("email", "", FieldKind::Text, "Your email");
        let by_label = field("other", "", FieldKind::Text, "Your email");
        let by_id = field("email", "", FieldKind::Text, "Different label");

        // The label candidate comes first in the saved list; id still wins.
        let saved = vec![by_label, by_id];
        let matched = find_match(&scanned, &saved).unwrap();
        assert_eq!(matched.id, "email");
        assert_eq!(matched.label, "Different label");
    }

    #[test]
    fn radios_match_on_name_and_value_only() {
        let scanned = radio("grp", "a");
        let saved = vec![radio("grp", "b"), radio("grp", "a")];
        let matched = find_match(&scanned, &saved).unwrap();
        assert_eq!(matched.input_value.as_deref(), Some("a"));
    }

    #[test]
    fn radios_never_match_different_value_in_same_group() {
        let scanned = radio("grp", "c");
        let saved = vec![radio("grp", "a"), radio("grp", "b")];
        assert!(find_match(&scanned, &saved).is_none());
    }

    #[test]
    fn name_match_skips_radio_candidates() {
        let scanned = field("", "color", FieldKind::Text, "");
        let saved = vec![radio("color", "red"), field("", "color", FieldKind::Text, "")];
        let matched = find_match(&scanned, &saved).unwrap();
        assert_eq!(matched.kind, FieldKind::Text);
    }

    #[test]
    fn label_match_requires_non_empty_labels() {
        let scanned = field("", "", FieldKind::Text, "");
        let saved = vec![field("", "", FieldKind::Text, "")];
        // Empty labels fall through to fuzzy, where both captions are empty
        // and similarity is 1.0 > 0.8, so the same-kind candidate matches.
        assert!(find_match(&scanned, &saved).is_some());
    }

    #[test]
    fn fuzzy_requires_same_kind() {
        let scanned = field("", "", FieldKind::Text, "First name");
        let saved = vec![field("", "", FieldKind::Textarea, "First name!")];
        assert!(find_match(&scanned, &saved).is_none());
    }

    #[test]
    fn fuzzy_picks_highest_scoring_candidate() {
        let scanned = field("", "", FieldKind::Text, "First name");
        let close = field("x", "", FieldKind::Text, "First namé");
        let far = field("y", "", FieldKind::Text, "Last name");
        let saved = vec![far, close];
        let matched = find_match(&scanned, &saved).unwrap();
        assert_eq!(matched.id, "x");
    }

    #[test]
    fn similarity_boundary_is_strict() {
        // 10-char strings differing by exactly 2 edits score 0.80 and must
        // not match; 1 edit scores 0.90 and must.
        let base = "abcdefghij";
        let two_edits = "abcdefghXY";
        let one_edit = "abcdefghiX";
        assert!((similarity(base, two_edits) - 0.8).abs() < 1e-9);
        assert!((similarity(base, one_edit) - 0.9).abs() < 1e-9);

        let scanned = field("", "", FieldKind::Text, base);
        let saved = vec![field("", "", FieldKind::Text, two_edits)];
        assert!(find_match(&scanned, &saved).is_none());

        let saved = vec![field("", "", FieldKind::Text, one_edit)];
        assert!(find_match(&scanned, &saved).is_some());
    }

    #[test]
    fn similarity_is_case_insensitive_through_captions() {
        let scanned = field("", "", FieldKind::Text, "EMAIL ADDRESS");
        let saved = vec![field("", "", FieldKind::Text, "email address")];
        assert!(find_match(&scanned, &saved).is_some());
    }

    #[test]
    fn placeholder_substitutes_for_missing_label() {
        let mut scanned = field("", "", FieldKind::Text, "");
        scanned.placeholder = "Enter your email".to_string();
        let saved = vec![field("", "", FieldKind::Text, "Enter your email")];
        assert!(find_match(&scanned, &saved).is_some());
    }

    #[test]
    fn no_candidates_yields_none() {
        let scanned = field("email", "email", FieldKind::Text, "Email");
        assert!(find_match(&scanned, &[]).is_none());
    }

    #[test]
    fn empty_strings_are_fully_similar() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
    }
}
