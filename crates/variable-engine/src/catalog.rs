//! System variable catalogs
//!
//! Every template of a family implicitly includes the family's system
//! variables. Catalogs are fixed configuration: the same for every tenant and
//! never mutated at runtime. Each call builds a fresh list.

use shared_types::{Family, VariableDefinition, VariableType};

/// Generic name reserved for built-in default templates
pub const BASE_TEMPLATE_NAME: &str = "Modèle de base";

struct CatalogEntry {
    name: &'static str,
    label: &'static str,
    kind: VariableType,
    required: bool,
    deferred: bool,
}

const fn entry(
    name: &'static str,
    label: &'static str,
    kind: VariableType,
    required: bool,
) -> CatalogEntry {
    CatalogEntry {
        name,
        label,
        kind,
        required,
        deferred: false,
    }
}

/// Required in markup, may be blank until the counter-signing step
const fn signature_entry(
    name: &'static str,
    label: &'static str,
    kind: VariableType,
) -> CatalogEntry {
    CatalogEntry {
        name,
        label,
        kind,
        required: true,
        deferred: true,
    }
}

const SHARED: &[CatalogEntry] = &[
    entry("client_name", "Nom du client", VariableType::String, true),
    entry("freelancer_name", "Nom du freelance", VariableType::String, true),
];

const QUOTE: &[CatalogEntry] = &[
    entry("quote_date", "Date du devis", VariableType::Date, true),
    entry("quote_number", "Numéro du devis", VariableType::Number, true),
    entry("total_amount", "Montant total HT", VariableType::Number, true),
    entry("valid_until", "Date de validité", VariableType::Date, true),
];

const INVOICE: &[CatalogEntry] = &[
    entry("invoice_number", "Numéro de la facture", VariableType::Number, true),
    entry("issue_date", "Date d’émission", VariableType::Date, true),
    entry("due_date", "Date d’échéance", VariableType::Date, true),
    entry("freelancer_address", "Adresse du freelance", VariableType::String, true),
    entry("freelancer_siret", "SIRET du freelance", VariableType::String, true),
    entry("client_address", "Adresse du client", VariableType::String, true),
    entry(
        "prestation_description",
        "Description de la prestation",
        VariableType::String,
        true,
    ),
    entry("total_amount", "Montant total HT", VariableType::Number, true),
    entry("late_penalty", "Pénalités de retard", VariableType::String, true),
    entry("payment_terms", "Modalités de paiement", VariableType::String, true),
    entry("tva_detail", "Détail TVA ou mention 293B", VariableType::String, true),
];

const CONTRACT: &[CatalogEntry] = &[
    entry("contract_date", "Date du contrat", VariableType::Date, true),
    entry("contract_number", "Numéro du contrat", VariableType::Number, true),
    entry("start_date", "Date de début", VariableType::Date, true),
    entry("end_date", "Date de fin", VariableType::Date, false),
    entry(
        "prestation_description",
        "Description de la prestation",
        VariableType::String,
        true,
    ),
    entry("total_amount", "Montant total (HT)", VariableType::Number, true),
    entry("payment_terms", "Modalités de paiement", VariableType::String, true),
    // Freelancer signature workflow
    entry("freelancer_address", "Adresse du freelance", VariableType::String, true),
    signature_entry("freelancer_signature", "Signature du freelance", VariableType::String),
    signature_entry(
        "freelancer_fullname_signed",
        "Nom complet du freelance signataire",
        VariableType::String,
    ),
    signature_entry(
        "freelancer_date_signed",
        "Date de signature du freelance",
        VariableType::Date,
    ),
    // Client signature workflow
    entry("client_address", "Adresse du client", VariableType::String, true),
    signature_entry("client_signature", "Signature du client", VariableType::String),
    signature_entry(
        "client_fullname_signed",
        "Nom complet du client signataire",
        VariableType::String,
    ),
    signature_entry(
        "client_date_signed",
        "Date de signature du client",
        VariableType::Date,
    ),
];

fn family_entries(family: Family) -> &'static [CatalogEntry] {
    match family {
        Family::Quote => QUOTE,
        Family::Invoice => INVOICE,
        Family::Contract => CONTRACT,
    }
}

fn to_definition(entry: &CatalogEntry) -> VariableDefinition {
    let def = VariableDefinition::system(entry.name, entry.label, entry.kind, entry.required);
    if entry.deferred {
        def.deferred()
    } else {
        def
    }
}

/// The ordered system catalog of `family`: shared definitions first
pub fn system_variables(family: Family) -> Vec<VariableDefinition> {
    SHARED
        .iter()
        .chain(family_entries(family))
        .map(to_definition)
        .collect()
}

/// Look up one system definition by name
pub fn find_system_variable(family: Family, name: &str) -> Option<VariableDefinition> {
    SHARED
        .iter()
        .chain(family_entries(family))
        .find(|e| e.name == name)
        .map(to_definition)
}

pub fn is_system_variable(family: Family, name: &str) -> bool {
    SHARED
        .iter()
        .chain(family_entries(family))
        .any(|e| e.name == name)
}

/// System catalog followed by the template's custom variables
///
/// Recomputed on every call so it always reflects the current catalog.
pub fn effective_variables(
    family: Family,
    custom: &[VariableDefinition],
) -> Vec<VariableDefinition> {
    let mut variables = system_variables(family);
    variables.extend(custom.iter().cloned());
    variables
}

/// Name of the family's built-in default template
pub fn default_template_name(family: Family) -> &'static str {
    match family {
        Family::Quote => "Modèle de base - Devis",
        Family::Invoice => "Modèle de base - Facture",
        Family::Contract => "Modèle de base - Contrat",
    }
}

/// Template names a user may not claim for `family`
pub fn reserved_template_names(family: Family) -> [&'static str; 2] {
    [BASE_TEMPLATE_NAME, default_template_name(family)]
}

/// Case-insensitive, whitespace-trimmed reserved name check
pub fn is_reserved_template_name(family: Family, name: &str) -> bool {
    let candidate = name.trim().to_lowercase();
    reserved_template_names(family)
        .iter()
        .any(|reserved| reserved.to_lowercase() == candidate)
}
