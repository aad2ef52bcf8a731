use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::parser::schema::parse_create_table;
use crate::parser::SelectStatement;
use crate::sqlite::data_containers::headers::DatabaseHeader;
use crate::sqlite::data_containers::page::Page;
use crate::sqlite::data_containers::record::Value;

pub mod walker;
use walker::{walk_index, walk_table, ScanTargets};

/// How an applicable index is matched against the query's table. The
/// historical behavior compares the schema row's `name`; `tbl_name` is
/// the conventional match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMatch {
    Name,
    TableName,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub index_match: IndexMatch,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            index_match: IndexMatch::Name,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> EngineConfig {
        let index_match = match std::env::var("LITEQUERY_INDEX_MATCH").ok().as_deref() {
            Some("tbl_name") => IndexMatch::TableName,
            Some("name") | None => IndexMatch::Name,
            Some(other) => {
                warn!(value = %other, "unrecognized LITEQUERY_INDEX_MATCH, using 'name'");
                IndexMatch::Name
            }
        };
        EngineConfig { index_match }
    }
}

// one row of the schema table on page 1
#[derive(Debug)]
struct SchemaRow {
    entry_type: String,
    name: String,
    tbl_name: String,
    root_page: i64,
    sql: Option<String>,
}

impl SchemaRow {
    // rows that don't fit the five-column shape (views, triggers,
    // internal entries) are skipped, not errors
    fn from_values(values: &[Value]) -> Option<SchemaRow> {
        let entry_type = match values.first()? {
            Value::Text(s) => s.clone(),
            _ => return None,
        };
        let name = match values.get(1)? {
            Value::Text(s) => s.clone(),
            _ => return None,
        };
        let tbl_name = match values.get(2)? {
            Value::Text(s) => s.clone(),
            _ => return None,
        };
        let root_page = match values.get(3)? {
            Value::Int(v) => *v,
            _ => return None,
        };
        let sql = match values.get(4) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        };
        Some(SchemaRow {
            entry_type,
            name,
            tbl_name,
            root_page,
            sql,
        })
    }
}

/// Read-only session over one database file.
pub struct QueryEngine {
    file: File,
    header: DatabaseHeader,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn open(path: &Path, config: EngineConfig) -> Result<QueryEngine> {
        let mut file = File::open(path)
            .with_context(|| format!("cannot open database '{}'", path.display()))?;
        let header = DatabaseHeader::read(&mut file, path)?;
        Ok(QueryEngine {
            file,
            header,
            config,
        })
    }

    /// `.dbinfo`: the declared page size and the page-1 cell count. The
    /// cell count stands in for the table count and overcounts when
    /// non-table schema entries exist.
    pub fn db_info(&mut self) -> Result<Vec<String>> {
        let page = Page::read(&mut self.file, 1, self.header.page_size)?;
        Ok(vec![
            format!("database page size: {}", self.header.page_size),
            format!("number of tables: {}", page.header.cell_count),
        ])
    }

    /// `.tables`: table names in schema-row order.
    pub fn tables(&mut self) -> Result<Vec<String>> {
        let rows = self.schema_rows()?;
        Ok(rows
            .into_iter()
            .filter(|row| row.entry_type == "table")
            .map(|row| row.name)
            .collect())
    }

    pub fn select(&mut self, statement: &SelectStatement) -> Result<Vec<String>> {
        let schema = self.schema_rows()?;

        let Some(table_row) = schema
            .iter()
            .find(|row| row.entry_type == "table" && row.name == statement.table)
        else {
            return Ok(vec!["Error, table not found".to_string()]);
        };
        let Some(create_sql) = table_row.sql.as_deref() else {
            bail!("schema row for '{}' has no SQL", statement.table);
        };
        let definition = parse_create_table(create_sql)?;
        debug!(
            table = %statement.table,
            root_page = table_row.root_page,
            columns = definition.column_names.len(),
            "resolved table"
        );

        let index_root = self.applicable_index(&schema, &statement.table);
        let table_root = table_row.root_page as u64;

        // the index path only pays off when there is an equality probe
        let scan = match (&statement.condition, index_root) {
            (Some(condition), Some(index_root)) => {
                let row_ids = walk_index(
                    &mut self.file,
                    self.header.page_size,
                    index_root,
                    &condition.value,
                )?;
                debug!(matches = row_ids.len(), "index scan");
                let targets = ScanTargets::RowIds(row_ids.into_iter().collect::<HashSet<i64>>());
                walk_table(&mut self.file, self.header.page_size, table_root, &targets)?
            }
            _ => walk_table(
                &mut self.file,
                self.header.page_size,
                table_root,
                &ScanTargets::Full,
            )?,
        };
        debug!(rows = scan.rows.len(), serial_types = ?scan.serial_types, "table scan");

        let name_to_index: HashMap<String, usize> = definition
            .column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();

        // residual equality filter; non-text stored values never match
        let mut kept: Vec<(i64, &Vec<Value>)> = Vec::new();
        match &statement.condition {
            Some(condition) => {
                let column = condition.column.to_lowercase();
                let Some(&value_index) = name_to_index.get(&column) else {
                    bail!("no such column: {}", condition.column);
                };
                for (row_id, row) in scan.row_ids.iter().zip(&scan.rows) {
                    if let Some(Value::Text(text)) = row.get(value_index) {
                        if *text == condition.value {
                            kept.push((*row_id, row));
                        }
                    }
                }
            }
            None => {
                kept.extend(scan.row_ids.iter().copied().zip(&scan.rows));
            }
        }

        if statement.is_count() {
            return Ok(vec![kept.len().to_string()]);
        }

        let mut lines: Vec<String> = Vec::with_capacity(kept.len());
        for (row_id, row) in kept {
            let mut fields: Vec<String> = Vec::with_capacity(statement.columns.len());
            for column in &statement.columns {
                let rendered = if definition
                    .rowid_alias
                    .as_deref()
                    .is_some_and(|alias| alias.eq_ignore_ascii_case(column))
                {
                    row_id.to_string()
                } else {
                    let Some(&value_index) = name_to_index.get(&column.to_lowercase()) else {
                        bail!("no such column: {column}");
                    };
                    // short records leave trailing columns at their defaults
                    row.get(value_index).map(Value::to_string).unwrap_or_default()
                };
                fields.push(rendered);
            }
            lines.push(fields.join("|"));
        }
        Ok(lines)
    }

    // bootstrap: page 1 is itself a table b-tree holding the schema
    fn schema_rows(&mut self) -> Result<Vec<SchemaRow>> {
        let scan = walk_table(&mut self.file, self.header.page_size, 1, &ScanTargets::Full)?;
        Ok(scan
            .rows
            .iter()
            .filter_map(|values| SchemaRow::from_values(values))
            .collect())
    }

    fn applicable_index(&self, schema: &[SchemaRow], table: &str) -> Option<u64> {
        let row = schema.iter().find(|row| {
            row.entry_type == "index"
                && match self.config.index_match {
                    IndexMatch::Name => row.name == table,
                    IndexMatch::TableName => row.tbl_name == table,
                }
        })?;
        debug!(index = %row.name, root_page = row.root_page, "applicable index");
        Some(row.root_page as u64)
    }
}
