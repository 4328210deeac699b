//! Change-list queries: search, filter, order and page an entity listing.

use super::{AdminModel, ModelAdmin};
use crate::error::{Result, WarehouseError};
use crate::packaging::MetadataVersion;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Classifier segments joined for display and search.
const CLASSIFIER_DISPLAY_SQL: &str =
    "(SELECT group_concat(value, ' :: ') FROM json_each(c.classifier))";

/// Parameters of one change-list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeListQuery {
    /// Whitespace-separated terms; every term must match some search field.
    pub search: Option<String>,
    /// Exact-match filters keyed by `list_filter` field.
    pub filters: BTreeMap<String, String>,
    pub limit: usize,
    pub offset: usize,
}

impl ChangeListQuery {
    pub const DEFAULT_PER_PAGE: usize = 100;

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }
}

impl Default for ChangeListQuery {
    fn default() -> Self {
        Self {
            search: None,
            filters: BTreeMap::new(),
            limit: Self::DEFAULT_PER_PAGE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeListRow {
    pub id: i64,
    /// One value per `list_display` column.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeList {
    pub model: AdminModel,
    pub columns: Vec<&'static str>,
    pub rows: Vec<ChangeListRow>,
    /// Matching rows before paging.
    pub total_count: usize,
}

fn source(model: AdminModel) -> (&'static str, &'static str) {
    match model {
        AdminModel::Classifier => ("packaging_classifier c", "c.id"),
        AdminModel::Project => ("packaging_project p", "p.id"),
        AdminModel::Release => (
            "packaging_release r JOIN packaging_project p ON p.id = r.project_id",
            "r.id",
        ),
    }
}

fn field_sql(model: AdminModel, field: &str) -> Option<&'static str> {
    match (model, field) {
        (AdminModel::Classifier, "classifier") => Some(CLASSIFIER_DISPLAY_SQL),
        (AdminModel::Project, "name") => Some("p.name"),
        (AdminModel::Release, "project" | "project__name") => Some("p.name"),
        (AdminModel::Release, "version") => Some("r.version"),
        (AdminModel::Release, "summary") => Some("COALESCE(r.summary, '')"),
        (AdminModel::Release, "metadata_version") => Some("r.metadata_version"),
        _ => None,
    }
}

fn descriptor_field(model: AdminModel, field: &str) -> Result<&'static str> {
    field_sql(model, field).ok_or_else(|| {
        WarehouseError::Other(format!("{} admin has no field named {}", model, field))
    })
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Run a change-list query for `admin`.
pub fn changelist(
    conn: &Connection,
    admin: &ModelAdmin,
    query: &ChangeListQuery,
) -> Result<ChangeList> {
    let model = admin.model;
    let (from, id_column) = source(model);

    let mut where_clause = String::from("WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    // Filters
    for (field, value) in &query.filters {
        if !admin.list_filter.contains(&field.as_str()) {
            return Err(WarehouseError::validation(
                "filter",
                format!("Cannot filter {} by {}", model, field),
            ));
        }
        if field == "metadata_version" {
            value.parse::<MetadataVersion>()?;
        }
        where_clause.push_str(&format!(" AND {} = ?", descriptor_field(model, field)?));
        params_vec.push(Box::new(value.clone()));
    }

    // Search terms: AND across terms, OR across search fields
    if let Some(search) = &query.search {
        let search_sql = admin
            .search_fields
            .iter()
            .map(|field| descriptor_field(model, field))
            .collect::<Result<Vec<_>>>()?;

        if !search_sql.is_empty() {
            for term in search.split_whitespace() {
                let pattern = format!("%{}%", escape_like(term));
                let clauses: Vec<String> = search_sql
                    .iter()
                    .map(|sql| format!("{} LIKE ? ESCAPE '\\'", sql))
                    .collect();
                where_clause.push_str(&format!(" AND ({})", clauses.join(" OR ")));
                for _ in &search_sql {
                    params_vec.push(Box::new(pattern.clone()));
                }
            }
        }
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let count_sql = format!("SELECT COUNT(*) FROM {} {}", from, where_clause);
    let total_count: usize = {
        let mut stmt = conn.prepare(&count_sql)?;
        stmt.query_row(params_refs.as_slice(), |row| row.get(0))?
    };

    let mut order_by = Vec::new();
    for field in admin.ordering {
        let (field, direction) = match field.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (*field, "ASC"),
        };
        order_by.push(format!("{} {}", descriptor_field(model, field)?, direction));
    }
    // Newest first, and a stable tiebreak after explicit ordering
    order_by.push(format!("{} DESC", id_column));

    let display_sql = admin
        .list_display
        .iter()
        .map(|field| descriptor_field(model, field))
        .collect::<Result<Vec<_>>>()?;

    let mut select = vec![id_column.to_string()];
    select.extend(display_sql.iter().map(|sql| format!("COALESCE({}, '')", sql)));

    let sql = format!(
        "SELECT {} FROM {} {} ORDER BY {} LIMIT {} OFFSET {}",
        select.join(", "),
        from,
        where_clause,
        order_by.join(", "),
        query.limit,
        query.offset
    );
    debug!("Change list query for {}: {}", model, sql);

    let mut stmt = conn.prepare(&sql)?;
    let column_count = display_sql.len();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(row.get(idx + 1)?);
        }
        Ok(ChangeListRow {
            id: row.get(0)?,
            values,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }

    Ok(ChangeList {
        model,
        columns: admin.list_display.to_vec(),
        rows: entries,
        total_count,
    })
}
