//! Client, template and document services
//!
//! Wraps the variable engine with the template and document lifecycles shared
//! by quotes, invoices and contracts, plus the clients those documents are
//! addressed to. Storage and PDF rendering are external collaborators reached
//! through the traits in [`store`] and [`renderer`].

pub mod clients;
pub mod defaults;
pub mod documents;
pub mod error;
pub mod renderer;
pub mod rules;
pub mod status;
pub mod store;
pub mod templates;

pub use clients::{ClientDraft, ClientService};
pub use documents::DocumentService;
pub use error::{RenderError, Resource, Result, ServiceError, StoreError};
pub use renderer::{DocumentRenderer, RenderedDocument};
pub use store::{ClientStore, DocumentStore, InMemoryStore, TemplateStore};
pub use templates::{TemplateDraft, TemplateService, TemplateView};
