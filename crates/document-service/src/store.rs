//! Storage collaborator interfaces and an in-memory implementation
//!
//! Services only talk to storage through [`TemplateStore`],
//! [`DocumentStore`] and [`ClientStore`]. A real deployment backs them with a
//! database; [`InMemoryStore`] serves the API binary and the tests.

use crate::error::{Resource, StoreError};
use chrono::{DateTime, Utc};
use shared_types::{Client, Document, DocumentStatus, Family, Template};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait TemplateStore: Send + Sync {
    fn find_template(&self, family: Family, id: &str) -> StoreResult<Option<Template>>;

    /// Template named `name` among `owner`'s templates and the global defaults
    ///
    /// Names are compared trimmed and case-insensitively. `exclude_id` skips
    /// the template being updated.
    fn find_template_by_name(
        &self,
        family: Family,
        owner: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Template>>;

    /// `owner`'s templates plus the global defaults, oldest first
    fn list_templates(&self, family: Family, owner: &str) -> StoreResult<Vec<Template>>;

    /// The family's global default template, if seeded
    fn default_template(&self, family: Family) -> StoreResult<Option<Template>>;

    fn insert_template(&self, template: Template) -> StoreResult<()>;

    /// Swap a stored template for `template` (same id) in one step
    fn replace_template(&self, template: Template) -> StoreResult<()>;

    /// Returns false when nothing was deleted
    fn delete_template(&self, family: Family, id: &str) -> StoreResult<bool>;
}

pub trait DocumentStore: Send + Sync {
    fn find_document(&self, family: Family, id: &str) -> StoreResult<Option<Document>>;

    fn list_documents(&self, family: Family, owner: &str) -> StoreResult<Vec<Document>>;

    /// Every document of `family`, whatever the owner (batch jobs)
    fn all_documents(&self, family: Family) -> StoreResult<Vec<Document>>;

    fn insert_document(&self, document: Document) -> StoreResult<()>;

    /// Swap in `document` only if the stored copy still has status `expected`
    ///
    /// Returns false, leaving the stored document alone, when the status has
    /// moved on since it was read.
    fn replace_document(
        &self,
        document: Document,
        expected: DocumentStatus,
    ) -> StoreResult<bool>;

    fn delete_document(&self, family: Family, id: &str) -> StoreResult<bool>;
}

pub trait ClientStore: Send + Sync {
    fn find_client(&self, id: &str) -> StoreResult<Option<Client>>;

    /// `owner`'s client with e-mail `email` (trimmed, case-insensitive),
    /// skipping `exclude_id`
    fn find_client_by_email(
        &self,
        owner: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Client>>;

    /// `owner`'s clients, newest first
    fn list_clients(&self, owner: &str) -> StoreResult<Vec<Client>>;

    fn insert_client(&self, client: Client) -> StoreResult<()>;

    fn replace_client(&self, client: Client) -> StoreResult<()>;

    fn delete_client(&self, id: &str) -> StoreResult<bool>;
}

pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Process-local store behind `RwLock`s
///
/// Enforces (family, owner, name) template uniqueness and (owner, e-mail)
/// client uniqueness on insert and replace.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    templates: RwLock<HashMap<String, Template>>,
    documents: RwLock<HashMap<String, Document>>,
    clients: RwLock<HashMap<String, Client>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn templates(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Template>>> {
        self.templates.read().map_err(|_| poisoned("templates"))
    }

    fn templates_mut(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Template>>> {
        self.templates.write().map_err(|_| poisoned("templates"))
    }

    fn documents(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Document>>> {
        self.documents.read().map_err(|_| poisoned("documents"))
    }

    fn documents_mut(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Document>>> {
        self.documents.write().map_err(|_| poisoned("documents"))
    }

    fn clients(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Client>>> {
        self.clients.read().map_err(|_| poisoned("clients"))
    }

    fn clients_mut(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Client>>> {
        self.clients.write().map_err(|_| poisoned("clients"))
    }
}

fn poisoned(table: &str) -> StoreError {
    StoreError::Backend(format!("{} lock poisoned", table))
}

/// Uniqueness backstop: same family, same owner, same name, other id
fn conflicts(existing: &Template, candidate: &Template) -> bool {
    existing.id != candidate.id
        && existing.family == candidate.family
        && existing.owner_id == candidate.owner_id
        && same_name(&existing.name, &candidate.name)
}

fn template_conflict(template: Template) -> StoreError {
    StoreError::Conflict {
        resource: Resource::Template,
        key: template.name,
    }
}

fn client_conflicts(existing: &Client, candidate: &Client) -> bool {
    existing.id != candidate.id
        && existing.owner_id == candidate.owner_id
        && same_name(&existing.email, &candidate.email)
}

fn sorted_by_creation<T>(mut items: Vec<T>, created: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| created(item));
    items
}

impl TemplateStore for InMemoryStore {
    fn find_template(&self, family: Family, id: &str) -> StoreResult<Option<Template>> {
        Ok(self
            .templates()?
            .get(id)
            .filter(|t| t.family == family)
            .cloned())
    }

    fn find_template_by_name(
        &self,
        family: Family,
        owner: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Template>> {
        Ok(self
            .templates()?
            .values()
            .filter(|t| t.family == family && t.is_visible_to(owner))
            .filter(|t| Some(t.id.as_str()) != exclude_id)
            .find(|t| same_name(&t.name, name))
            .cloned())
    }

    fn list_templates(&self, family: Family, owner: &str) -> StoreResult<Vec<Template>> {
        let visible: Vec<Template> = self
            .templates()?
            .values()
            .filter(|t| t.family == family && t.is_visible_to(owner))
            .cloned()
            .collect();
        Ok(sorted_by_creation(visible, |t: &Template| t.created_at))
    }

    fn default_template(&self, family: Family) -> StoreResult<Option<Template>> {
        Ok(self
            .templates()?
            .values()
            .find(|t| t.family == family && t.is_default())
            .cloned())
    }

    fn insert_template(&self, template: Template) -> StoreResult<()> {
        let mut templates = self.templates_mut()?;
        if templates.contains_key(&template.id) {
            return Err(StoreError::Backend(format!(
                "template {} already exists",
                template.id
            )));
        }
        if templates.values().any(|t| conflicts(t, &template)) {
            return Err(template_conflict(template));
        }
        templates.insert(template.id.clone(), template);
        Ok(())
    }

    fn replace_template(&self, template: Template) -> StoreResult<()> {
        let mut templates = self.templates_mut()?;
        if !templates.contains_key(&template.id) {
            return Err(StoreError::Backend(format!(
                "template {} does not exist",
                template.id
            )));
        }
        if templates.values().any(|t| conflicts(t, &template)) {
            return Err(template_conflict(template));
        }
        templates.insert(template.id.clone(), template);
        Ok(())
    }

    fn delete_template(&self, family: Family, id: &str) -> StoreResult<bool> {
        let mut templates = self.templates_mut()?;
        let found = templates.get(id).is_some_and(|t| t.family == family);
        if found {
            templates.remove(id);
        }
        Ok(found)
    }
}

impl DocumentStore for InMemoryStore {
    fn find_document(&self, family: Family, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .documents()?
            .get(id)
            .filter(|d| d.family == family)
            .cloned())
    }

    fn list_documents(&self, family: Family, owner: &str) -> StoreResult<Vec<Document>> {
        let owned: Vec<Document> = self
            .documents()?
            .values()
            .filter(|d| d.family == family && d.owner_id == owner)
            .cloned()
            .collect();
        Ok(sorted_by_creation(owned, |d: &Document| d.created_at))
    }

    fn all_documents(&self, family: Family) -> StoreResult<Vec<Document>> {
        let all: Vec<Document> = self
            .documents()?
            .values()
            .filter(|d| d.family == family)
            .cloned()
            .collect();
        Ok(sorted_by_creation(all, |d: &Document| d.created_at))
    }

    fn insert_document(&self, document: Document) -> StoreResult<()> {
        let mut documents = self.documents_mut()?;
        if documents.contains_key(&document.id) {
            return Err(StoreError::Backend(format!(
                "document {} already exists",
                document.id
            )));
        }
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    fn replace_document(
        &self,
        document: Document,
        expected: DocumentStatus,
    ) -> StoreResult<bool> {
        let mut documents = self.documents_mut()?;
        match documents.get_mut(&document.id) {
            Some(slot) if slot.status == expected => {
                *slot = document;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::Backend(format!(
                "document {} does not exist",
                document.id
            ))),
        }
    }

    fn delete_document(&self, family: Family, id: &str) -> StoreResult<bool> {
        let mut documents = self.documents_mut()?;
        let found = documents.get(id).is_some_and(|d| d.family == family);
        if found {
            documents.remove(id);
        }
        Ok(found)
    }
}

impl ClientStore for InMemoryStore {
    fn find_client(&self, id: &str) -> StoreResult<Option<Client>> {
        Ok(self.clients()?.get(id).cloned())
    }

    fn find_client_by_email(
        &self,
        owner: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Client>> {
        Ok(self
            .clients()?
            .values()
            .filter(|c| c.owner_id == owner && Some(c.id.as_str()) != exclude_id)
            .find(|c| same_name(&c.email, email))
            .cloned())
    }

    fn list_clients(&self, owner: &str) -> StoreResult<Vec<Client>> {
        let owned: Vec<Client> = self
            .clients()?
            .values()
            .filter(|c| c.owner_id == owner)
            .cloned()
            .collect();
        let mut owned = sorted_by_creation(owned, |c: &Client| c.created_at);
        owned.reverse();
        Ok(owned)
    }

    fn insert_client(&self, client: Client) -> StoreResult<()> {
        let mut clients = self.clients_mut()?;
        if clients.contains_key(&client.id) {
            return Err(StoreError::Backend(format!("client {} already exists", client.id)));
        }
        if clients.values().any(|c| client_conflicts(c, &client)) {
            return Err(StoreError::Conflict {
                resource: Resource::Client,
                key: client.email,
            });
        }
        clients.insert(client.id.clone(), client);
        Ok(())
    }

    fn replace_client(&self, client: Client) -> StoreResult<()> {
        let mut clients = self.clients_mut()?;
        if !clients.contains_key(&client.id) {
            return Err(StoreError::Backend(format!("client {} does not exist", client.id)));
        }
        if clients.values().any(|c| client_conflicts(c, &client)) {
            return Err(StoreError::Conflict {
                resource: Resource::Client,
                key: client.email,
            });
        }
        clients.insert(client.id.clone(), client);
        Ok(())
    }

    fn delete_client(&self, id: &str) -> StoreResult<bool> {
        Ok(self.clients_mut()?.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn template(id: &str, owner: Option<&str>, name: &str) -> Template {
        let now = Utc::now();
        Template {
            id: id.to_string(),
            family: Family::Quote,
            name: name.to_string(),
            content_html: String::new(),
            variables: vec![],
            owner_id: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_uniqueness_backstop() {
        let store = InMemoryStore::new();
        store.insert_template(template("1", Some("alice"), "Devis web")).unwrap();

        let err = store
            .insert_template(template("2", Some("alice"), " devis WEB "))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                resource: Resource::Template,
                key: " devis WEB ".to_string(),
            }
        );

        // other owner, other family: fine
        store.insert_template(template("3", Some("bob"), "Devis web")).unwrap();
        let mut invoice = template("4", Some("alice"), "Devis web");
        invoice.family = Family::Invoice;
        store.insert_template(invoice).unwrap();
    }

    #[test]
    fn test_visibility_includes_defaults() {
        let store = InMemoryStore::new();
        let mut default = template("d", None, "Modèle de base - Devis");
        default.created_at = Utc::now() - Duration::days(1);
        store.insert_template(default).unwrap();
        store.insert_template(template("a", Some("alice"), "A")).unwrap();
        store.insert_template(template("b", Some("bob"), "B")).unwrap();

        let ids: Vec<_> = store
            .list_templates(Family::Quote, "alice")
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["d", "a"]);

        assert!(store
            .find_template_by_name(Family::Quote, "alice", "modèle de base - devis", None)
            .unwrap()
            .is_some());
        assert!(store
            .find_template_by_name(Family::Quote, "alice", "B", None)
            .unwrap()
            .is_none());
        assert!(store
            .find_template_by_name(Family::Quote, "alice", "A", Some("a"))
            .unwrap()
            .is_none());
        assert_eq!(store.default_template(Family::Quote).unwrap().unwrap().id, "d");
    }

    #[test]
    fn test_family_scoping() {
        let store = InMemoryStore::new();
        store.insert_template(template("1", Some("alice"), "A")).unwrap();
        assert!(store.find_template(Family::Invoice, "1").unwrap().is_none());
        assert!(!store.delete_template(Family::Invoice, "1").unwrap());
        assert!(store.delete_template(Family::Quote, "1").unwrap());
        assert!(store.find_template(Family::Quote, "1").unwrap().is_none());
    }

    fn document(id: &str, status: DocumentStatus) -> Document {
        let now = Utc::now();
        Document {
            id: id.to_string(),
            family: Family::Invoice,
            owner_id: "alice".to_string(),
            template_id: "t".to_string(),
            client_id: None,
            status,
            template_html: String::new(),
            generated_html: String::new(),
            variable_values: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_replace_document_checks_status() {
        let store = InMemoryStore::new();
        store.insert_document(document("1", DocumentStatus::Draft)).unwrap();

        assert!(store
            .replace_document(document("1", DocumentStatus::Sent), DocumentStatus::Draft)
            .unwrap());
        // a writer that still believes the document is a draft
        let mut stale = document("1", DocumentStatus::Draft);
        stale.generated_html = "<p>stale</p>".to_string();
        assert!(!store.replace_document(stale, DocumentStatus::Draft).unwrap());

        let stored = store.find_document(Family::Invoice, "1").unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Sent);
        assert!(stored.generated_html.is_empty());

        assert!(store
            .replace_document(document("missing", DocumentStatus::Sent), DocumentStatus::Draft)
            .is_err());
    }

    fn client(id: &str, owner: &str, email: &str) -> Client {
        let now = Utc::now();
        Client {
            id: id.to_string(),
            owner_id: owner.to_string(),
            first_name: "Jeanne".to_string(),
            last_name: "Dupont".to_string(),
            email: email.to_string(),
            phone_number: String::new(),
            address_line: String::new(),
            postal_code: String::new(),
            city: String::new(),
            country: "France".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_client_email_is_unique_per_owner() {
        let store = InMemoryStore::new();
        store.insert_client(client("1", "alice", "jeanne@dupont.fr")).unwrap();
        store.insert_client(client("2", "bob", "jeanne@dupont.fr")).unwrap();

        let err = store
            .insert_client(client("3", "alice", " Jeanne@Dupont.FR "))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { resource: Resource::Client, .. }));

        assert!(store
            .find_client_by_email("alice", "JEANNE@dupont.fr", Some("1"))
            .unwrap()
            .is_none());
        assert_eq!(store.list_clients("alice").unwrap().len(), 1);
        assert!(store.delete_client("1").unwrap());
        assert!(!store.delete_client("1").unwrap());
    }
}
