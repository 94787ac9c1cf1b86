//! Model catalogue service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use synergia_store::{Model, ModelUpdate, Store, StoreError};
use tracing::info;
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Input for creating a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModel {
    pub name: String,
    pub provider: String,
    pub price_per_million_tokens: f64,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NewModel {
    pub fn new(name: impl Into<String>, provider: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            price_per_million_tokens: price,
            is_enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }
}

/// Domain service for AI models.
#[derive(Clone)]
pub struct ModelService {
    store: Arc<Store>,
}

impl ModelService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a model. Names are unique.
    pub fn create(&self, input: NewModel) -> Result<Model> {
        validate_name(&input.name)?;
        validate_provider(&input.provider)?;
        validate_price(input.price_per_million_tokens)?;

        if self.store.get_model_by_name(&input.name)?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Model with name '{}' already exists",
                input.name
            )));
        }

        let model = Model::new(input.name, input.provider, input.price_per_million_tokens)
            .with_enabled(input.is_enabled);
        self.store.insert_model(&model)?;

        info!(model_id = %model.id, name = %model.name, "Model created");
        Ok(model)
    }

    pub fn get(&self, id: Uuid) -> Result<Model> {
        self.store
            .get_model(id)?
            .ok_or_else(|| not_found(id))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Model> {
        self.store
            .get_model_by_name(name)?
            .ok_or_else(|| DomainError::NotFound(format!("Model with name '{}' not found", name)))
    }

    pub fn list(&self, enabled_only: bool) -> Result<Vec<Model>> {
        Ok(self.store.list_models(enabled_only)?)
    }

    pub fn list_enabled(&self) -> Result<Vec<Model>> {
        self.list(true)
    }

    pub fn list_by_provider(&self, provider: &str) -> Result<Vec<Model>> {
        Ok(self.store.list_models_by_provider(provider)?)
    }

    pub fn list_providers(&self) -> Result<Vec<String>> {
        Ok(self.store.list_providers()?)
    }

    pub fn count(&self, enabled_only: bool) -> Result<usize> {
        Ok(self.store.count_models(enabled_only)?)
    }

    /// Apply a partial update. Renaming onto another model's name is a conflict.
    pub fn update(&self, id: Uuid, update: ModelUpdate) -> Result<Model> {
        if let Some(name) = &update.name {
            validate_name(name)?;
            if let Some(existing) = self.store.get_model_by_name(name)?
                && existing.id != id
            {
                return Err(DomainError::Conflict(format!(
                    "Model with name '{}' already exists",
                    name
                )));
            }
        }
        if let Some(provider) = &update.provider {
            validate_provider(provider)?;
        }
        if let Some(price) = update.price_per_million_tokens {
            validate_price(price)?;
        }

        self.store
            .update_model(id, &update)
            .map_err(|e| map_missing(e, id))
    }

    pub fn enable(&self, id: Uuid) -> Result<Model> {
        self.store
            .set_model_enabled(id, true)
            .map_err(|e| map_missing(e, id))
    }

    pub fn disable(&self, id: Uuid) -> Result<Model> {
        self.store
            .set_model_enabled(id, false)
            .map_err(|e| map_missing(e, id))
    }

    pub fn toggle(&self, id: Uuid) -> Result<Model> {
        self.store
            .toggle_model_enabled(id)
            .map_err(|e| map_missing(e, id))
    }

    /// Delete a model. Refused while any message references it.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        if self.store.get_model(id)?.is_none() {
            return Err(not_found(id));
        }
        if self.store.model_in_use(id)? {
            return Err(DomainError::Conflict(format!(
                "Model {} is referenced by existing messages; disable it instead",
                id
            )));
        }

        self.store.delete_model(id)?;
        info!(model_id = %id, "Model deleted");
        Ok(())
    }
}

fn not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("Model with ID '{}' not found", id))
}

fn map_missing(err: StoreError, id: Uuid) -> DomainError {
    match err {
        StoreError::NotFound(_) => not_found(id),
        other => other.into(),
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("Model name must not be empty".into()));
    }
    Ok(())
}

fn validate_provider(provider: &str) -> Result<()> {
    if provider.trim().is_empty() {
        return Err(DomainError::Validation(
            "Model provider must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::Validation(
            "price_per_million_tokens must be a non-negative number".into(),
        ));
    }
    Ok(())
}
