//! Storage seam consumed by the batched committer.
//!
//! The pipeline only needs three storage capabilities: bulk insert with
//! generated ids, indexed lookup of external camper ids, and junction
//! inserts. Keeping them behind a trait lets the commit tests drive the
//! pipeline against an in-memory store with injectable batch failures.

use std::collections::{HashMap, HashSet};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use uuid::Uuid;

use crate::import::schema::EntityKind;
use crate::import::validate::{FieldValue, ValidatedRow};

pub trait ImportStore {
    /// Insert one batch; all-or-nothing per batch. Returns the generated
    /// ids in row order.
    fn insert_rows(&mut self, kind: EntityKind, rows: &[ValidatedRow]) -> anyhow::Result<Vec<String>>;

    /// Which of the given external camper ids already exist.
    fn existing_person_ids(&mut self, person_ids: &[String]) -> anyhow::Result<HashSet<String>>;

    /// External camper id -> internal camper id, for ids that exist.
    fn resolve_person_ids(
        &mut self,
        person_ids: &[String],
    ) -> anyhow::Result<HashMap<String, String>>;

    fn link_incident_campers(
        &mut self,
        incident_id: &str,
        camper_ids: &[String],
    ) -> anyhow::Result<()>;
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }
}

impl ImportStore for SqliteStore<'_> {
    fn insert_rows(&mut self, kind: EntityKind, rows: &[ValidatedRow]) -> anyhow::Result<Vec<String>> {
        let schema = kind.schema();
        let columns = schema.columns();
        let sql = format!(
            "INSERT INTO {}(id, {}) VALUES({})",
            schema.table,
            columns.join(", "),
            repeat_vars(columns.len() + 1)
        );

        let tx = self.conn.unchecked_transaction()?;
        let mut ids: Vec<String> = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let id = Uuid::new_v4().to_string();
                let mut params: Vec<SqlValue> = Vec::with_capacity(columns.len() + 1);
                params.push(SqlValue::Text(id.clone()));
                for col in &columns {
                    params.push(to_sql_value(row.values.get(*col)));
                }
                stmt.execute(params_from_iter(params))?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn existing_person_ids(&mut self, person_ids: &[String]) -> anyhow::Result<HashSet<String>> {
        if person_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let sql = format!(
            "SELECT person_id FROM campers WHERE person_id IN ({})",
            repeat_vars(person_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(person_ids.iter()), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(found)
    }

    fn resolve_person_ids(
        &mut self,
        person_ids: &[String],
    ) -> anyhow::Result<HashMap<String, String>> {
        if person_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT person_id, id FROM campers WHERE person_id IN ({})",
            repeat_vars(person_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(person_ids.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(found)
    }

    fn link_incident_campers(
        &mut self,
        incident_id: &str,
        camper_ids: &[String],
    ) -> anyhow::Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO incident_campers(incident_id, camper_id) VALUES(?, ?)",
        )?;
        for camper_id in camper_ids {
            stmt.execute([incident_id, camper_id])?;
        }
        Ok(())
    }
}

fn to_sql_value(value: Option<&FieldValue>) -> SqlValue {
    match value {
        Some(FieldValue::Text(s)) => SqlValue::Text(s.clone()),
        Some(FieldValue::Int(n)) => SqlValue::Integer(*n),
        // Lists go to the junction table, never to a column.
        Some(FieldValue::List(_)) | Some(FieldValue::Null) | None => SqlValue::Null,
    }
}

fn repeat_vars(n: usize) -> String {
    let mut out = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}
