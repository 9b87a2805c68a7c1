use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parse failures for the closed enumerations below
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEnumError {
    #[error("Unknown document family: {0}")]
    UnknownFamily(String),

    #[error("Unknown variable type: {0}")]
    UnknownVariableType(String),

    #[error("Unknown document status: {0}")]
    UnknownStatus(String),
}

/// Returns true when `name` matches `^[A-Za-z_][A-Za-z0-9_]*$`.
///
/// This is the placeholder grammar every authored template depends on.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Document family: selects the system catalog and default template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Quote,
    Invoice,
    Contract,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Quote, Family::Invoice, Family::Contract];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Quote => "quote",
            Family::Invoice => "invoice",
            Family::Contract => "contract",
        }
    }

    /// French document name, as shown to end users
    pub fn label(&self) -> &'static str {
        match self {
            Family::Quote => "Devis",
            Family::Invoice => "Facture",
            Family::Contract => "Contrat",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quote" | "quotes" => Ok(Family::Quote),
            "invoice" | "invoices" => Ok(Family::Invoice),
            "contract" | "contracts" => Ok(Family::Contract),
            other => Err(ParseEnumError::UnknownFamily(other.to_string())),
        }
    }
}

/// Semantic type of a template variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    String,
    Number,
    Date,
    Textarea,
    Email,
    Url,
    Boolean,
}

impl VariableType {
    pub const ALL: [VariableType; 7] = [
        VariableType::String,
        VariableType::Number,
        VariableType::Date,
        VariableType::Textarea,
        VariableType::Email,
        VariableType::Url,
        VariableType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Date => "date",
            VariableType::Textarea => "textarea",
            VariableType::Email => "email",
            VariableType::Url => "url",
            VariableType::Boolean => "boolean",
        }
    }

    /// Names accepted by `FromStr`, in declaration order
    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::UnknownVariableType(s.to_string()))
    }
}

/// Where a variable definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableOrigin {
    System,
    #[default]
    Custom,
}

/// A validated variable definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    #[serde(alias = "variableName")]
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    pub required: bool,
    /// Required in the markup, but may stay blank until a later workflow
    /// step (counter-signature) fills it in.
    #[serde(default)]
    pub deferred: bool,
    #[serde(default)]
    pub origin: VariableOrigin,
}

impl VariableDefinition {
    pub fn system(name: &str, label: &str, kind: VariableType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required,
            deferred: false,
            origin: VariableOrigin::System,
        }
    }

    pub fn custom(name: &str, label: &str, kind: VariableType, required: bool) -> Self {
        Self {
            origin: VariableOrigin::Custom,
            ..Self::system(name, label, kind, required)
        }
    }

    /// Mark as deferred-required
    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn is_system(&self) -> bool {
        self.origin == VariableOrigin::System
    }
}

/// A custom variable as submitted by the editor, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDraft {
    #[serde(alias = "variableName")]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
}

impl VariableDraft {
    pub fn new(name: &str, label: &str, kind: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            required,
        }
    }
}

impl From<&VariableDefinition> for VariableDraft {
    fn from(def: &VariableDefinition) -> Self {
        Self {
            name: def.name.clone(),
            label: def.label.clone(),
            kind: def.kind.as_str().to_string(),
            required: def.required,
        }
    }
}

/// A user-authored or default template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub family: Family,
    pub name: String,
    pub content_html: String,
    /// Custom variables only; system variables are merged on read
    pub variables: Vec<VariableDefinition>,
    /// `None` marks the immutable global default template
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn is_default(&self) -> bool {
        self.owner_id.is_none()
    }

    /// Readable by `owner`: its own templates and the global defaults
    pub fn is_visible_to(&self, owner: &str) -> bool {
        match &self.owner_id {
            None => true,
            Some(id) => id == owner,
        }
    }
}

/// Default country of a client address
pub const DEFAULT_COUNTRY: &str = "France";

/// A freelancer's client; owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub owner_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique per owner, compared case-insensitively
    pub email: String,
    pub phone_number: String,
    pub address_line: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// `"First LAST"`, the way documents address a client
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim().to_uppercase())
    }
}

/// A value submitted for one variable at document creation or edit time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedValue {
    #[serde(alias = "variableName")]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl SubmittedValue {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Frozen snapshot of a definition plus its submitted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    #[serde(alias = "variableName")]
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    pub required: bool,
    #[serde(default)]
    pub deferred: bool,
    pub value: String,
}

impl VariableValue {
    pub fn from_definition(def: &VariableDefinition, value: impl Into<String>) -> Self {
        Self {
            name: def.name.clone(),
            label: def.label.clone(),
            kind: def.kind,
            required: def.required,
            deferred: def.deferred,
            value: value.into(),
        }
    }

    /// Rebuild the definition this value was snapshotted from
    pub fn definition(&self) -> VariableDefinition {
        VariableDefinition {
            name: self.name.clone(),
            label: self.label.clone(),
            kind: self.kind,
            required: self.required,
            deferred: self.deferred,
            origin: VariableOrigin::Custom,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Lifecycle status of a quote, invoice or contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Accepted,
    Refused,
    Paid,
    Overdue,
    Signed,
    Declined,
    Expired,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Accepted => "accepted",
            DocumentStatus::Refused => "refused",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Overdue => "overdue",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Declined => "declined",
            DocumentStatus::Expired => "expired",
            DocumentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "draft" => DocumentStatus::Draft,
            "sent" => DocumentStatus::Sent,
            "accepted" => DocumentStatus::Accepted,
            "refused" => DocumentStatus::Refused,
            "paid" => DocumentStatus::Paid,
            "overdue" => DocumentStatus::Overdue,
            "signed" => DocumentStatus::Signed,
            "declined" => DocumentStatus::Declined,
            "expired" => DocumentStatus::Expired,
            "cancelled" => DocumentStatus::Cancelled,
            other => return Err(ParseEnumError::UnknownStatus(other.to_string())),
        };
        Ok(status)
    }
}

/// A generated quote, invoice or contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub family: Family,
    pub owner_id: String,
    pub template_id: String,
    /// Client the document is addressed to, if any
    #[serde(default)]
    pub client_id: Option<String>,
    pub status: DocumentStatus,
    /// Template markup as it was when the document was created
    pub template_html: String,
    pub generated_html: String,
    pub variable_values: Vec<VariableValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.variable_values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_grammar() {
        assert!(is_identifier("client_name"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("A1"));
        assert!(!is_identifier("1bad"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("with space"));
        assert!(!is_identifier("dash-ed"));
        assert!(!is_identifier("é"));
    }

    #[test]
    fn test_variable_type_round_trips_through_str() {
        for kind in VariableType::ALL {
            assert_eq!(kind.as_str().parse::<VariableType>(), Ok(kind));
        }
        assert_eq!(
            "money".parse::<VariableType>(),
            Err(ParseEnumError::UnknownVariableType("money".to_string()))
        );
    }

    #[test]
    fn test_family_accepts_plural_path_segments() {
        assert_eq!("quotes".parse::<Family>(), Ok(Family::Quote));
        assert_eq!("invoice".parse::<Family>(), Ok(Family::Invoice));
        assert!("receipt".parse::<Family>().is_err());
    }

    #[test]
    fn test_definition_accepts_editor_payload() {
        let json = r#"{"variableName":"amount","label":"Montant","type":"number","required":true}"#;
        let def: VariableDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.name, "amount");
        assert_eq!(def.kind, VariableType::Number);
        assert_eq!(def.origin, VariableOrigin::Custom);
        assert!(!def.deferred);
    }

    #[test]
    fn test_draft_keeps_unknown_type_as_text() {
        let json = r#"{"name":"amount","label":"Montant","type":"money"}"#;
        let draft: VariableDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.kind, "money");
        assert!(!draft.required);
    }

    #[test]
    fn test_default_template_visible_to_everyone() {
        let now = Utc::now();
        let template = Template {
            id: "t1".to_string(),
            family: Family::Quote,
            name: "Modèle de base - Devis".to_string(),
            content_html: String::new(),
            variables: vec![],
            owner_id: None,
            created_at: now,
            updated_at: now,
        };
        assert!(template.is_default());
        assert!(template.is_visible_to("anyone"));

        let owned = Template {
            owner_id: Some("alice".to_string()),
            ..template
        };
        assert!(owned.is_visible_to("alice"));
        assert!(!owned.is_visible_to("bob"));
    }

    #[test]
    fn test_client_display_name() {
        let now = Utc::now();
        let client = Client {
            id: "c1".to_string(),
            owner_id: "alice".to_string(),
            first_name: " Jeanne ".to_string(),
            last_name: "Dupont".to_string(),
            email: "jeanne@dupont.fr".to_string(),
            phone_number: String::new(),
            address_line: String::new(),
            postal_code: String::new(),
            city: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(client.display_name(), "Jeanne DUPONT");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("overdue".parse::<DocumentStatus>(), Ok(DocumentStatus::Overdue));
        assert!("archived".parse::<DocumentStatus>().is_err());
    }
}
