pub mod types;

pub use types::{
    is_identifier, Client, Document, DocumentStatus, Family, ParseEnumError, SubmittedValue,
    Template, VariableDefinition, VariableDraft, VariableOrigin, VariableType, VariableValue,
    DEFAULT_COUNTRY,
};
