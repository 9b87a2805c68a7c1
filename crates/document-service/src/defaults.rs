//! Built-in default templates
//!
//! Markup is loaded from `templates/` at compile time, one file per family.
//! Each default carries no custom variables; its markup references every
//! required system variable of its family.

use shared_types::{Family, Template};
use uuid::Uuid;
use variable_engine::catalog::default_template_name;

/// Quote template - loaded from templates/quote.html
const QUOTE_TEMPLATE: &str = include_str!("../templates/quote.html");

/// Invoice template - loaded from templates/invoice.html
const INVOICE_TEMPLATE: &str = include_str!("../templates/invoice.html");

/// Contract template - loaded from templates/contract.html
/// Includes both parties' signature blocks
const CONTRACT_TEMPLATE: &str = include_str!("../templates/contract.html");

/// Markup of the family's default template
pub fn default_markup(family: Family) -> &'static str {
    match family {
        Family::Quote => QUOTE_TEMPLATE,
        Family::Invoice => INVOICE_TEMPLATE,
        Family::Contract => CONTRACT_TEMPLATE,
    }
}

/// A fresh, unowned default template for `family`
pub fn default_template(family: Family) -> Template {
    let now = chrono::Utc::now();
    Template {
        id: Uuid::new_v4().to_string(),
        family,
        name: default_template_name(family).to_string(),
        content_html: default_markup(family).to_string(),
        variables: Vec::new(),
        owner_id: None,
        created_at: now,
        updated_at: now,
    }
}
