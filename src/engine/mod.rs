pub mod field;
pub mod filler;
pub mod matcher;
pub mod scanner;
pub mod selector;

pub use field::{Field, FieldKind, FieldValue, Form, ScanOutcome, SelectOption};
pub use filler::{current_values, fill_field, fill_forms, FILLED_CLASS};
pub use matcher::{find_match, similarity};
pub use scanner::{clear_highlights, scan, HIGHLIGHT_CLASS};
pub use selector::generate_selector;
