//! Placeholder extraction from template markup
//!
//! Two encodings reference a variable:
//! - the raw textual form `{{ name }}`, in text nodes or attribute values
//! - an editor "chip": any element carrying `data-type="variable"` and a
//!   `data-variable-name` attribute
//!
//! The markup is parsed into a DOM with `scraper` and walked in document
//! order. Chips are read from their attributes, raw placeholders are matched
//! with a regex inside text nodes and attribute values. Names outside the
//! identifier grammar are ignored.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::node::Element;
use scraper::{Html, Node};
use shared_types::is_identifier;
use std::collections::HashSet;

/// Attribute marking an element as a variable chip
pub const CHIP_TYPE_ATTR: &str = "data-type";
/// Value of [`CHIP_TYPE_ATTR`] for variable chips
pub const CHIP_TYPE_VALUE: &str = "variable";
/// Attribute holding the chip's variable name
pub const CHIP_NAME_ATTR: &str = "data-variable-name";
/// Attribute holding the chip's display label
pub const CHIP_LABEL_ATTR: &str = "data-label";

lazy_static! {
    /// `{{ name }}`; the capture may be empty or malformed and is checked
    /// against the identifier grammar by callers.
    pub static ref PLACEHOLDER_PATTERN: Regex =
        Regex::new(r"\{\{\s*([^{}\s]*)\s*\}\}").unwrap();
}

/// Ordered, de-duplicated collection of names
#[derive(Debug, Default)]
struct NameSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl NameSet {
    fn push(&mut self, name: &str) {
        if is_identifier(name) && self.seen.insert(name.to_string()) {
            self.ordered.push(name.to_string());
        }
    }

    fn scan(&mut self, text: &str) {
        for cap in PLACEHOLDER_PATTERN.captures_iter(text) {
            if let Some(name) = cap.get(1) {
                self.push(name.as_str());
            }
        }
    }
}

/// Variable names referenced by `html`, in first-occurrence order
pub fn extract_variable_names(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut names = NameSet::default();

    for node in fragment.tree.root().descendants() {
        match node.value() {
            Node::Element(element) => {
                if let Some(name) = chip_name(element) {
                    names.push(name);
                }
                for (_, value) in element.attrs() {
                    names.scan(value);
                }
            }
            Node::Text(text) => names.scan(&text.text),
            _ => {}
        }
    }

    tracing::debug!(count = names.ordered.len(), "extracted template variables");
    names.ordered
}

/// Set form of [`extract_variable_names`]
pub fn referenced_variables(html: &str) -> HashSet<String> {
    extract_variable_names(html).into_iter().collect()
}

/// Name carried by a chip element, trimmed; `None` for ordinary elements
pub(crate) fn chip_name(element: &Element) -> Option<&str> {
    if element.attr(CHIP_TYPE_ATTR) != Some(CHIP_TYPE_VALUE) {
        return None;
    }
    element.attr(CHIP_NAME_ATTR).map(str::trim)
}
