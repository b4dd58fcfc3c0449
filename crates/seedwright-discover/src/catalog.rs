//! Trigger/function catalog access.
//!
//! The primary queries read the detailed `pg_trigger`/`pg_proc` catalogs.
//! When those are unavailable (typically insufficient privilege) a fallback
//! against the portable `information_schema` views runs instead; both paths
//! return the same descriptor shape. Queries use the runtime sqlx API
//! because the fallback path must work against whatever catalog surface the
//! connection can actually see.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use sqlx::{PgPool, Row};
use tracing::warn;

use seedwright_core::{Error, Result};

use crate::model::{FunctionDescriptor, TriggerDescriptor};

/// Source of trigger and function metadata.
#[async_trait]
pub trait TriggerCatalog: Send + Sync {
    /// Triggers defined on the given tables, user triggers only.
    async fn list_triggers(&self, tables: &[String]) -> Result<Vec<TriggerDescriptor>>;

    /// Full definition text for one function, `None` when it cannot be
    /// resolved.
    async fn function_definition(&self, name: &str) -> Result<Option<FunctionDescriptor>>;
}

/// Catalog backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
    schema: String,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, "public")
    }

    pub fn with_schema(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    async fn list_triggers_detailed(&self, tables: &[String]) -> Result<Vec<TriggerDescriptor>> {
        let rows = sqlx::query(
            r#"
            select
              t.tgname as name,
              c.relname as table_name,
              t.tgtype as tgtype,
              p.proname as function_name,
              pg_get_triggerdef(t.oid) as definition
            from pg_trigger t
            join pg_class c on c.oid = t.tgrelid
            join pg_namespace n on n.oid = c.relnamespace
            join pg_proc p on p.oid = t.tgfoid
            where not t.tgisinternal
              and n.nspname = $1
              and c.relname = any($2)
            order by c.relname, t.tgname
            "#,
        )
        .bind(&self.schema)
        .bind(tables)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::Db(err.to_string()))?;

        let mut triggers = Vec::with_capacity(rows.len());
        for row in rows {
            let tgtype: i16 = row.try_get("tgtype").map_err(db_err)?;
            triggers.push(TriggerDescriptor {
                name: row.try_get("name").map_err(db_err)?,
                table: row.try_get("table_name").map_err(db_err)?,
                timing: timing_from_tgtype(tgtype).to_string(),
                events: events_from_tgtype(tgtype),
                function_name: row.try_get("function_name").map_err(db_err)?,
                definition: row.try_get("definition").ok(),
            });
        }
        Ok(triggers)
    }

    async fn list_triggers_portable(&self, tables: &[String]) -> Result<Vec<TriggerDescriptor>> {
        let rows = sqlx::query(
            r#"
            select
              trigger_name,
              event_object_table,
              action_timing,
              event_manipulation,
              action_statement
            from information_schema.triggers
            where trigger_schema = $1
              and event_object_table = any($2)
            order by event_object_table, trigger_name, event_manipulation
            "#,
        )
        .bind(&self.schema)
        .bind(tables)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::Db(err.to_string()))?;

        // information_schema emits one row per firing event; merge them
        // back into one descriptor per trigger.
        let mut merged: BTreeMap<(String, String), TriggerDescriptor> = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get("trigger_name").map_err(db_err)?;
            let table: String = row.try_get("event_object_table").map_err(db_err)?;
            let timing: String = row.try_get("action_timing").map_err(db_err)?;
            let event: String = row.try_get("event_manipulation").map_err(db_err)?;
            let statement: String = row.try_get("action_statement").map_err(db_err)?;

            let entry = merged
                .entry((table.clone(), name.clone()))
                .or_insert_with(|| TriggerDescriptor {
                    name,
                    table,
                    timing,
                    events: Vec::new(),
                    function_name: function_from_action_statement(&statement)
                        .unwrap_or_default(),
                    definition: Some(statement),
                });
            if !entry.events.contains(&event) {
                entry.events.push(event);
            }
        }

        Ok(merged.into_values().collect())
    }

    async fn function_definition_full(&self, name: &str) -> Result<Option<FunctionDescriptor>> {
        let row = sqlx::query(
            r#"
            select p.proname as name, pg_get_functiondef(p.oid) as definition
            from pg_proc p
            join pg_namespace n on n.oid = p.pronamespace
            where n.nspname = $1
              and p.proname = $2
            limit 1
            "#,
        )
        .bind(&self.schema)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Db(err.to_string()))?;

        row.map(|row| {
            Ok(FunctionDescriptor {
                name: row.try_get("name").map_err(db_err)?,
                definition: row.try_get("definition").map_err(db_err)?,
            })
        })
        .transpose()
    }

    async fn function_definition_source(&self, name: &str) -> Result<Option<FunctionDescriptor>> {
        let row = sqlx::query(
            r#"
            select p.proname as name, p.prosrc as definition
            from pg_proc p
            join pg_namespace n on n.oid = p.pronamespace
            where n.nspname = $1
              and p.proname = $2
            limit 1
            "#,
        )
        .bind(&self.schema)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Db(err.to_string()))?;

        row.map(|row| {
            Ok(FunctionDescriptor {
                name: row.try_get("name").map_err(db_err)?,
                definition: row.try_get("definition").map_err(db_err)?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl TriggerCatalog for PostgresCatalog {
    async fn list_triggers(&self, tables: &[String]) -> Result<Vec<TriggerDescriptor>> {
        match self.list_triggers_detailed(tables).await {
            Ok(triggers) => Ok(triggers),
            Err(err) => {
                warn!(error = %err, "detailed trigger catalog unavailable, using information_schema");
                self.list_triggers_portable(tables).await
            }
        }
    }

    async fn function_definition(&self, name: &str) -> Result<Option<FunctionDescriptor>> {
        match self.function_definition_full(name).await {
            Ok(function) => Ok(function),
            Err(err) => {
                warn!(function = name, error = %err, "pg_get_functiondef unavailable, using prosrc");
                self.function_definition_source(name).await
            }
        }
    }
}

#[async_trait]
impl<C: TriggerCatalog + ?Sized> TriggerCatalog for Arc<C> {
    async fn list_triggers(&self, tables: &[String]) -> Result<Vec<TriggerDescriptor>> {
        (**self).list_triggers(tables).await
    }

    async fn function_definition(&self, name: &str) -> Result<Option<FunctionDescriptor>> {
        (**self).function_definition(name).await
    }
}

fn db_err(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

/// Decode trigger timing from the `tgtype` bit field.
fn timing_from_tgtype(tgtype: i16) -> &'static str {
    const BEFORE: i16 = 1 << 1;
    const INSTEAD: i16 = 1 << 6;
    if tgtype & BEFORE != 0 {
        "BEFORE"
    } else if tgtype & INSTEAD != 0 {
        "INSTEAD OF"
    } else {
        "AFTER"
    }
}

/// Decode firing events from the `tgtype` bit field.
fn events_from_tgtype(tgtype: i16) -> Vec<String> {
    const EVENTS: [(i16, &str); 4] = [
        (1 << 2, "INSERT"),
        (1 << 3, "DELETE"),
        (1 << 4, "UPDATE"),
        (1 << 5, "TRUNCATE"),
    ];
    EVENTS
        .iter()
        .filter(|(bit, _)| tgtype & bit != 0)
        .map(|(_, event)| event.to_string())
        .collect()
}

/// Pull the function name out of an `EXECUTE FUNCTION ...` action statement.
fn function_from_action_statement(statement: &str) -> Option<String> {
    let re = Regex::new(r"(?i)EXECUTE\s+(?:FUNCTION|PROCEDURE)\s+(?:[\w$]+\.)?([\w$]+)\s*\(")
        .ok()?;
    re.captures(statement)
        .map(|caps| caps[1].to_lowercase())
}
