//! Client management
//!
//! Every client belongs to one user and is invisible to everyone else. The
//! e-mail address is unique per user.

use crate::error::{Result, ServiceError};
use crate::store::ClientStore;
use crate::templates::MIN_SEARCH_LEN;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{Client, VariableType, DEFAULT_COUNTRY};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use variable_engine::values::is_well_formed;

/// A client as submitted by the front-end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDraft {
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: String,
    #[serde(default, alias = "addressLine")]
    pub address_line: String,
    #[serde(default, alias = "postalCode")]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    /// Defaults to [`DEFAULT_COUNTRY`]
    #[serde(default)]
    pub country: Option<String>,
}

impl ClientDraft {
    fn check(&self) -> Result<()> {
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().is_empty() {
                return Err(ServiceError::InvalidClient {
                    field,
                    message: "must not be empty".to_string(),
                });
            }
        }
        if !is_well_formed(self.email.trim(), VariableType::Email) {
            return Err(ServiceError::InvalidClient {
                field: "email",
                message: format!("\"{}\" is not an e-mail address", self.email),
            });
        }
        Ok(())
    }

    fn country(&self) -> String {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
            .to_string()
    }
}

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn ClientStore>,
}

impl ClientService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, owner: &str, draft: ClientDraft) -> Result<Client> {
        draft.check()?;
        self.check_email(owner, &draft.email, None)?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            country: draft.country(),
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone_number: draft.phone_number.trim().to_string(),
            address_line: draft.address_line.trim().to_string(),
            postal_code: draft.postal_code.trim().to_string(),
            city: draft.city.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_client(client.clone())?;
        info!(id = %client.id, owner, "created client");
        Ok(client)
    }

    /// `owner`'s clients, newest first
    pub fn list(&self, owner: &str) -> Result<Vec<Client>> {
        Ok(self.store.list_clients(owner)?)
    }

    pub fn get(&self, id: &str, owner: &str) -> Result<Client> {
        self.store
            .find_client(id)?
            .filter(|c| c.owner_id == owner)
            .ok_or_else(|| ServiceError::ClientNotFound(id.to_string()))
    }

    /// Replace every field of a client; id, owner and creation time are kept
    pub fn update(&self, id: &str, owner: &str, draft: ClientDraft) -> Result<Client> {
        let existing = self.get(id, owner)?;
        draft.check()?;
        self.check_email(owner, &draft.email, Some(id))?;

        let client = Client {
            country: draft.country(),
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone_number: draft.phone_number.trim().to_string(),
            address_line: draft.address_line.trim().to_string(),
            postal_code: draft.postal_code.trim().to_string(),
            city: draft.city.trim().to_string(),
            updated_at: Utc::now(),
            ..existing
        };

        self.store.replace_client(client.clone())?;
        info!(id, owner, "updated client");
        Ok(client)
    }

    /// Documents keep their `client_id` after the client is gone
    pub fn delete(&self, id: &str, owner: &str) -> Result<()> {
        self.get(id, owner)?;
        if !self.store.delete_client(id)? {
            return Err(ServiceError::ClientNotFound(id.to_string()));
        }
        info!(id, owner, "deleted client");
        Ok(())
    }

    /// Clients whose name, e-mail or city contains `term`, case-insensitively
    ///
    /// A trimmed term shorter than [`MIN_SEARCH_LEN`] lists every client.
    pub fn search(&self, owner: &str, term: &str) -> Result<Vec<Client>> {
        let needle = term.trim().to_lowercase();
        let clients = self.list(owner)?;
        if needle.chars().count() < MIN_SEARCH_LEN {
            return Ok(clients);
        }

        let hit = |text: &str| text.to_lowercase().contains(&needle);
        Ok(clients
            .into_iter()
            .filter(|c| hit(&c.first_name) || hit(&c.last_name) || hit(&c.email) || hit(&c.city))
            .collect())
    }

    fn check_email(&self, owner: &str, email: &str, exclude_id: Option<&str>) -> Result<()> {
        if self
            .store
            .find_client_by_email(owner, email, exclude_id)?
            .is_some()
        {
            return Err(ServiceError::DuplicateClientEmail(email.trim().to_string()));
        }
        Ok(())
    }
}
