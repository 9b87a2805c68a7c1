//! Placeholder substitution and editor chip conversion
//!
//! Substitution is a single regex pass over the original template: each
//! placeholder is resolved once, and substituted text is never re-scanned.
//! Rendering is idempotent only when no value itself contains
//! placeholder-shaped text; that is the caller's responsibility.

use crate::extract::{
    chip_name, CHIP_LABEL_ATTR, CHIP_NAME_ATTR, CHIP_TYPE_ATTR, CHIP_TYPE_VALUE,
    PLACEHOLDER_PATTERN,
};
use regex::Captures;
use scraper::node::Text;
use scraper::{Html, Node};
use shared_types::{SubmittedValue, VariableDefinition, VariableValue};
use std::collections::HashMap;

/// Replace placeholders using `resolve`; unresolved ones are kept verbatim
pub fn substitute_with<F>(template: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER_PATTERN
        .replace_all(template, |caps: &Captures| {
            resolve(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Substitute snapshot values into `template`
///
/// Every `{{ name }}` with an entry in `values` is replaced by the literal
/// value. Placeholders without an entry stay untouched, and so do blank
/// deferred variables (signature anchors waiting for the counter-signer).
/// When a name appears twice in `values` the last entry wins.
pub fn substitute(template: &str, values: &[VariableValue]) -> String {
    let lookup: HashMap<&str, &VariableValue> =
        values.iter().map(|v| (v.name.as_str(), v)).collect();

    substitute_with(template, |name| match lookup.get(name) {
        Some(v) if v.deferred && v.is_blank() => None,
        Some(v) => Some(v.value.clone()),
        None => None,
    })
}

/// Substitute raw `(name, value)` submissions, for previews
pub fn substitute_submitted(template: &str, values: &[SubmittedValue]) -> String {
    let lookup: HashMap<&str, &str> = values
        .iter()
        .map(|v| (v.name.as_str(), v.value.as_str()))
        .collect();

    substitute_with(template, |name| lookup.get(name).map(|v| v.to_string()))
}

/// Replace every chip element by its `{{name}}` placeholder
///
/// Markup without chips is returned unchanged; otherwise it is
/// re-serialized from the parsed tree. Markup that starts with a doctype or
/// an `<html>` tag is handled as a whole document so its doctype, `<head>`
/// and `<body>` survive; anything else is parsed as a fragment.
pub fn chips_to_placeholders(html: &str) -> String {
    if !html.contains(CHIP_NAME_ATTR) {
        return html.to_string();
    }

    let whole = is_full_document(html);
    let mut parsed = if whole {
        Html::parse_document(html)
    } else {
        Html::parse_fragment(html)
    };
    let chips: Vec<_> = parsed
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Element(element) => chip_name(element).map(|name| (node.id(), name.to_string())),
            _ => None,
        })
        .collect();

    if chips.is_empty() {
        return html.to_string();
    }

    for (id, name) in chips {
        if let Some(mut node) = parsed.tree.get_mut(id) {
            node.insert_before(Node::Text(Text {
                text: format!("{{{{{}}}}}", name).into(),
            }));
            node.detach();
        }
    }

    if whole {
        parsed.html()
    } else {
        parsed.root_element().inner_html()
    }
}

fn is_full_document(html: &str) -> bool {
    let head: String = html
        .trim_start()
        .chars()
        .take(9)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Wrap known `{{name}}` placeholders in editor chips
///
/// Only placeholders in text are wrapped: tags (and the attribute values
/// inside them) and comments are copied as they are. Placeholders whose name
/// is not in `definitions` are left as text. The input is expected in
/// bracket form; chipifying twice nests chips.
pub fn to_chips(html: &str, definitions: &[VariableDefinition]) -> String {
    let labels: HashMap<&str, &str> = definitions
        .iter()
        .map(|d| (d.name.as_str(), d.label.as_str()))
        .collect();
    let chip = |name: &str| {
        labels.get(name).map(|label| {
            format!(
                r#"<span {}="{}" {}="{}" {}="{}">{{{{{}}}}}</span>"#,
                CHIP_TYPE_ATTR,
                CHIP_TYPE_VALUE,
                CHIP_NAME_ATTR,
                name,
                CHIP_LABEL_ATTR,
                escape_attr(label),
                name
            )
        })
    };

    markup_runs(html)
        .into_iter()
        .map(|run| match run {
            Run::Text(text) => substitute_with(text, &chip),
            Run::Markup(markup) => markup.to_string(),
        })
        .collect()
}

/// A slice of raw markup: character data, or a tag/comment
#[derive(Debug, PartialEq)]
enum Run<'a> {
    Text(&'a str),
    Markup(&'a str),
}

fn markup_runs(html: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut cursor = 0;

    while let Some(offset) = html[cursor..].find('<') {
        let open = cursor + offset;
        match tag_end(html, open) {
            Some(end) => {
                if start < open {
                    runs.push(Run::Text(&html[start..open]));
                }
                runs.push(Run::Markup(&html[open..end]));
                start = end;
                cursor = end;
            }
            // a bare `<` in text
            None => cursor = open + 1,
        }
    }
    if start < html.len() {
        runs.push(Run::Text(&html[start..]));
    }
    runs
}

/// Byte offset just past the tag or comment opening at `open`
///
/// `None` when the `<` does not open one. Quoted attribute values may
/// contain `>`. An unterminated tag runs to the end of the input.
fn tag_end(html: &str, open: usize) -> Option<usize> {
    let rest = &html[open..];
    if rest.starts_with("<!--") {
        return Some(rest[4..].find("-->").map_or(html.len(), |i| open + 4 + i + 3));
    }

    let next = rest[1..].chars().next()?;
    if !(next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')) {
        return None;
    }

    let mut quote: Option<char> = None;
    let mut last = '<';
    for (i, c) in rest.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '>' => return Some(open + i + 1),
            None if matches!(c, '"' | '\'') && last == '=' => quote = Some(c),
            None => {}
        }
        if !c.is_whitespace() {
            last = c;
        }
    }
    Some(html.len())
}

/// Full document rendering: normalize chips, then substitute
pub fn render(template: &str, values: &[VariableValue]) -> String {
    substitute(&chips_to_placeholders(template), values)
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_variable_names;
    use pretty_assertions::assert_eq;
    use shared_types::VariableType;

    fn value(name: &str, value: &str) -> VariableValue {
        VariableValue::from_definition(
            &VariableDefinition::custom(name, name, VariableType::String, false),
            value,
        )
    }

    #[test]
    fn test_replaces_every_occurrence_whitespace_tolerant() {
        let html = "<p>{{name}} / {{ name }} / {{  name}}</p>";
        assert_eq!(
            substitute(html, &[value("name", "Ada")]),
            "<p>Ada / Ada / Ada</p>"
        );
    }

    #[test]
    fn test_unresolved_placeholders_left_verbatim() {
        let html = "<p>{{a}} {{ b }} {{1bad}}</p>";
        assert_eq!(
            substitute(html, &[value("a", "x")]),
            "<p>x {{ b }} {{1bad}}</p>"
        );
    }

    #[test]
    fn test_no_cascading_substitution() {
        let html = "{{a}}-{{b}}";
        let values = [value("a", "{{b}}"), value("b", "B")];
        assert_eq!(substitute(html, &values), "{{b}}-B");
    }

    #[test]
    fn test_values_are_literal() {
        let html = "<p>{{amount}}</p>";
        assert_eq!(substitute(html, &[value("amount", "$1 & $2")]), "<p>$1 & $2</p>");
    }

    #[test]
    fn test_empty_value_replaces_but_blank_deferred_is_kept() {
        let signature = VariableValue::from_definition(
            &VariableDefinition::custom("client_signature", "Signature", VariableType::String, true)
                .deferred(),
            "",
        );
        let html = "<p>{{note}}|{{client_signature}}</p>";
        assert_eq!(
            substitute(html, &[value("note", ""), signature]),
            "<p>|{{client_signature}}</p>"
        );
    }

    #[test]
    fn test_last_duplicate_wins() {
        assert_eq!(substitute("{{a}}", &[value("a", "1"), value("a", "2")]), "2");
    }

    #[test]
    fn test_reextraction_yields_unresolved_only() {
        let html = "<p>{{client_name}} {{quote_date}} {{extra}}</p>";
        let rendered = substitute(html, &[value("client_name", "Ada"), value("quote_date", "2025-01-01")]);
        assert_eq!(extract_variable_names(&rendered), vec!["extra"]);
    }

    #[test]
    fn test_chips_to_placeholders() {
        let html = r#"<p>Bonjour <span data-type="variable" data-variable-name="client_name" data-label="Nom du client">Nom du client</span> !</p>"#;
        assert_eq!(chips_to_placeholders(html), "<p>Bonjour {{client_name}} !</p>");
        assert_eq!(chips_to_placeholders("<p>{{x}}</p>"), "<p>{{x}}</p>");
    }

    #[test]
    fn test_render_resolves_chips() {
        let html = r#"<p><span data-type="variable" data-variable-name="client_name">{{client_name}}</span></p>"#;
        let rendered = render(html, &[value("client_name", "Ada")]);
        assert_eq!(rendered, "<p>Ada</p>");
        assert!(extract_variable_names(&rendered).is_empty());
    }

    #[test]
    fn test_to_chips_wraps_known_names_only() {
        let defs = vec![VariableDefinition::custom(
            "client_name",
            "Nom \"du\" client",
            VariableType::String,
            true,
        )];
        let chipped = to_chips("<p>{{ client_name }} {{other}}</p>", &defs);
        assert_eq!(
            chipped,
            r#"<p><span data-type="variable" data-variable-name="client_name" data-label="Nom &quot;du&quot; client">{{client_name}}</span> {{other}}</p>"#
        );
        assert_eq!(
            extract_variable_names(&chipped),
            vec!["client_name", "other"]
        );
    }

    #[test]
    fn test_to_chips_leaves_attributes_alone() {
        let defs = vec![VariableDefinition::custom("site", "Site", VariableType::Url, false)];
        let html = r#"<p><a href="{{site}}" title = '{{ site }}'>1 < 2 {{site}}</a><!-- {{site}} --></p>"#;
        assert_eq!(
            to_chips(html, &defs),
            r#"<p><a href="{{site}}" title = '{{ site }}'>1 < 2 <span data-type="variable" data-variable-name="site" data-label="Site">{{site}}</span></a><!-- {{site}} --></p>"#
        );
    }

    #[test]
    fn test_chip_round_trip_keeps_attribute_placeholders() {
        let defs = vec![VariableDefinition::custom("site", "Site", VariableType::Url, false)];
        let html = r#"<p><a href="{{site}}">lien {{site}}</a></p>"#;
        let chipped = to_chips(html, &defs);
        assert_eq!(extract_variable_names(&chipped), vec!["site"]);
        assert_eq!(chips_to_placeholders(&chipped), html);
    }

    #[test]
    fn test_markup_runs() {
        assert_eq!(
            markup_runs(r#"a<b title="x>y">c</b>"#),
            vec![
                Run::Text("a"),
                Run::Markup(r#"<b title="x>y">"#),
                Run::Text("c"),
                Run::Markup("</b>"),
            ]
        );
        assert_eq!(markup_runs("<p unterminated"), vec![Run::Markup("<p unterminated")]);
    }

    #[test]
    fn test_chips_to_placeholders_keeps_full_documents() {
        let html = r#"<!DOCTYPE html><html lang="fr"><head><title>Devis</title></head><body><p><span data-type="variable" data-variable-name="client_name">Client</span></p></body></html>"#;
        assert_eq!(
            chips_to_placeholders(html),
            r#"<!DOCTYPE html><html lang="fr"><head><title>Devis</title></head><body><p>{{client_name}}</p></body></html>"#
        );
    }

    #[test]
    fn test_substitute_submitted() {
        let html = "{{a}} {{b}}";
        assert_eq!(
            substitute_submitted(html, &[SubmittedValue::new("b", "2")]),
            "{{a}} 2"
        );
    }
}
