//! Model catalogue operations.

use rusqlite::{Connection, params};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::types::{self, Model, ModelUpdate};

use super::{
    Store, format_timestamp, parse_timestamp, parse_uuid, query_count, query_list,
    query_optional,
};

const MODEL_COLUMNS: &str =
    "id, name, provider, price_per_million_tokens, is_enabled, created_at, updated_at";

impl Store {
    /// Insert a new model. Fails if the name is already taken.
    pub fn insert_model(&self, model: &Model) -> Result<()> {
        let conn = self.conn();

        conn.execute(
            r#"
            INSERT INTO models (id, name, provider, price_per_million_tokens, is_enabled, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                model.id.to_string(),
                model.name,
                model.provider,
                model.price_per_million_tokens,
                model.is_enabled,
                format_timestamp(&model.created_at),
                format_timestamp(&model.updated_at),
            ],
        )?;

        debug!("Inserted model {} ({})", model.name, model.id);
        Ok(())
    }

    /// Get a model by ID.
    pub fn get_model(&self, id: Uuid) -> Result<Option<Model>> {
        Self::get_model_in(&self.conn(), id)
    }

    /// Get a model by its unique name.
    pub fn get_model_by_name(&self, name: &str) -> Result<Option<Model>> {
        query_optional(
            &self.conn(),
            &format!("SELECT {MODEL_COLUMNS} FROM models WHERE name = ?1"),
            params![name],
            Self::row_to_model,
        )
    }

    /// List models ordered by name.
    pub fn list_models(&self, enabled_only: bool) -> Result<Vec<Model>> {
        let sql = if enabled_only {
            format!("SELECT {MODEL_COLUMNS} FROM models WHERE is_enabled = 1 ORDER BY name")
        } else {
            format!("SELECT {MODEL_COLUMNS} FROM models ORDER BY name")
        };
        query_list(&self.conn(), &sql, [], Self::row_to_model)
    }

    /// List every model from one provider.
    pub fn list_models_by_provider(&self, provider: &str) -> Result<Vec<Model>> {
        query_list(
            &self.conn(),
            &format!("SELECT {MODEL_COLUMNS} FROM models WHERE provider = ?1 ORDER BY name"),
            params![provider],
            Self::row_to_model,
        )
    }

    /// Distinct provider names, sorted.
    pub fn list_providers(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT DISTINCT provider FROM models ORDER BY provider")?;
        let providers = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(providers)
    }

    /// Apply a partial update. Bumps `updated_at`.
    pub fn update_model(&self, id: Uuid, update: &ModelUpdate) -> Result<Model> {
        let conn = self.conn();

        let mut model = Self::get_model_in(&conn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("Model {}", id)))?;

        if let Some(name) = &update.name {
            model.name = name.clone();
        }
        if let Some(provider) = &update.provider {
            model.provider = provider.clone();
        }
        if let Some(price) = update.price_per_million_tokens {
            model.price_per_million_tokens = price;
        }
        if let Some(enabled) = update.is_enabled {
            model.is_enabled = enabled;
        }
        model.updated_at = types::now();

        Self::write_model(&conn, &model)?;
        Ok(model)
    }

    /// Set the enabled flag.
    pub fn set_model_enabled(&self, id: Uuid, enabled: bool) -> Result<Model> {
        self.update_model(
            id,
            &ModelUpdate {
                is_enabled: Some(enabled),
                ..Default::default()
            },
        )
    }

    /// Flip the enabled flag.
    pub fn toggle_model_enabled(&self, id: Uuid) -> Result<Model> {
        let conn = self.conn();

        let mut model = Self::get_model_in(&conn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("Model {}", id)))?;
        model.is_enabled = !model.is_enabled;
        model.updated_at = types::now();

        Self::write_model(&conn, &model)?;
        Ok(model)
    }

    /// Delete a model by ID.
    ///
    /// Fails with a database error while messages still reference it.
    pub fn delete_model(&self, id: Uuid) -> Result<bool> {
        let rows_affected = self
            .conn()
            .execute("DELETE FROM models WHERE id = ?1", params![id.to_string()])?;
        Ok(rows_affected > 0)
    }

    /// Whether any message, deleted or not, references the model.
    pub fn model_in_use(&self, id: Uuid) -> Result<bool> {
        let count = query_count(
            &self.conn(),
            "SELECT COUNT(*) FROM messages WHERE model_id = ?1",
            params![id.to_string()],
        )?;
        Ok(count > 0)
    }

    /// Count models.
    pub fn count_models(&self, enabled_only: bool) -> Result<usize> {
        let sql = if enabled_only {
            "SELECT COUNT(*) FROM models WHERE is_enabled = 1"
        } else {
            "SELECT COUNT(*) FROM models"
        };
        query_count(&self.conn(), sql, [])
    }

    pub(super) fn get_model_in(conn: &Connection, id: Uuid) -> Result<Option<Model>> {
        query_optional(
            conn,
            &format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = ?1"),
            params![id.to_string()],
            Self::row_to_model,
        )
    }

    fn write_model(conn: &Connection, model: &Model) -> Result<()> {
        conn.execute(
            r#"
            UPDATE models
            SET name = ?2, provider = ?3, price_per_million_tokens = ?4, is_enabled = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                model.id.to_string(),
                model.name,
                model.provider,
                model.price_per_million_tokens,
                model.is_enabled,
                format_timestamp(&model.updated_at),
            ],
        )?;
        Ok(())
    }

    pub(crate) fn row_to_model(row: &rusqlite::Row) -> Result<Model> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(Model {
            id: parse_uuid(&id)?,
            name: row.get(1)?,
            provider: row.get(2)?,
            price_per_million_tokens: row.get(3)?,
            is_enabled: row.get(4)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}
