use std::collections::HashSet;
use std::fs::File;

use tracing::trace;

use crate::sqlite::data_containers::cells::{
    IndexInteriorCell, IndexLeafCell, TableInteriorCell, TableLeafCell,
};
use crate::sqlite::data_containers::page::{Page, PageType};
use crate::sqlite::data_containers::record::Value;
use crate::sqlite::data_containers::serial_types::SerialType;
use crate::sqlite::error::StorageError;

/// Which rows a table walk should surface.
pub enum ScanTargets {
    Full,
    RowIds(HashSet<i64>),
}

impl ScanTargets {
    fn wants(&self, row_id: i64) -> bool {
        match self {
            ScanTargets::Full => true,
            ScanTargets::RowIds(set) => set.contains(&row_id),
        }
    }

    // interval membership, half-open (lower, upper] with None as the
    // -inf / +inf sentinels; any one target inside is enough
    fn intersects(&self, lower: Option<i64>, upper: Option<i64>) -> bool {
        match self {
            ScanTargets::Full => true,
            ScanTargets::RowIds(set) => set.iter().any(|key| {
                lower.map_or(true, |lo| *key > lo) && upper.map_or(true, |hi| *key <= hi)
            }),
        }
    }
}

/// Rows gathered by a table walk, in ascending row-id order. The serial
/// types are sampled from the last emitted row; rows of one table share a
/// column count but not necessarily content types.
pub struct TableScan {
    pub row_ids: Vec<i64>,
    pub serial_types: Vec<SerialType>,
    pub rows: Vec<Vec<Value>>,
}

impl TableScan {
    fn empty() -> TableScan {
        TableScan {
            row_ids: Vec::new(),
            serial_types: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn absorb(&mut self, other: TableScan) {
        self.row_ids.extend(other.row_ids);
        if !other.serial_types.is_empty() {
            self.serial_types = other.serial_types;
        }
        self.rows.extend(other.rows);
    }
}

pub fn walk_table(
    file: &mut File,
    page_size: u32,
    page_number: u64,
    targets: &ScanTargets,
) -> Result<TableScan, StorageError> {
    let page = Page::read(file, page_number, page_size)?;
    trace!(page = page_number, kind = ?page.kind(), "table walk");

    match page.kind() {
        PageType::LeafTableBTreePage => {
            let mut scan = TableScan::empty();
            for &pointer in &page.cell_pointers {
                let cell = TableLeafCell::read(&page.data, pointer as usize)?;
                if targets.wants(cell.row_id) {
                    scan.row_ids.push(cell.row_id);
                    scan.serial_types = cell.record.serial_types;
                    scan.rows.push(cell.record.values);
                }
            }
            Ok(scan)
        }
        PageType::InteriorTableBTreePage => {
            let mut cells: Vec<TableInteriorCell> = Vec::with_capacity(page.cell_pointers.len());
            for &pointer in &page.cell_pointers {
                cells.push(TableInteriorCell::read(&page.data, pointer as usize)?);
            }
            let rightmost = page.header.right_pointer.ok_or_else(|| {
                StorageError::corrupt(format!("interior page {page_number} has no right pointer"))
            })?;

            // subtree i spans (keys[i-1], keys[i]]; the rightmost subtree
            // is unbounded above
            let mut scan = TableScan::empty();
            for (i, cell) in cells.iter().enumerate() {
                let lower = if i == 0 { None } else { Some(cells[i - 1].row_id) };
                if targets.intersects(lower, Some(cell.row_id)) {
                    scan.absorb(walk_table(
                        file,
                        page_size,
                        cell.left_child as u64,
                        targets,
                    )?);
                }
            }
            let lower = cells.last().map(|cell| cell.row_id);
            if targets.intersects(lower, None) {
                scan.absorb(walk_table(file, page_size, rightmost as u64, targets)?);
            }
            Ok(scan)
        }
        kind => Err(StorageError::corrupt(format!(
            "expected a table page at {page_number}, found {kind:?}"
        ))),
    }
}

/// Equality probe over an index tree: collects the row-id (second record
/// column) of every entry whose first column is text equal to `probe`.
/// Equal keys can sit in more than one subtree, so every child is
/// visited; interior cells carry entries of their own and contribute
/// matches directly.
pub fn walk_index(
    file: &mut File,
    page_size: u32,
    page_number: u64,
    probe: &str,
) -> Result<Vec<i64>, StorageError> {
    let page = Page::read(file, page_number, page_size)?;
    trace!(page = page_number, kind = ?page.kind(), "index walk");

    match page.kind() {
        PageType::LeafIndexBTreePage => {
            let mut row_ids: Vec<i64> = Vec::new();
            for &pointer in &page.cell_pointers {
                let cell = IndexLeafCell::read(&page.data, pointer as usize)?;
                if let Some(row_id) = probe_match(&cell.record.values, probe) {
                    row_ids.push(row_id);
                }
            }
            Ok(row_ids)
        }
        PageType::InteriorIndexBTreePage => {
            let mut cells: Vec<IndexInteriorCell> = Vec::with_capacity(page.cell_pointers.len());
            for &pointer in &page.cell_pointers {
                cells.push(IndexInteriorCell::read(&page.data, pointer as usize)?);
            }
            let rightmost = page.header.right_pointer.ok_or_else(|| {
                StorageError::corrupt(format!("interior page {page_number} has no right pointer"))
            })?;

            let mut row_ids: Vec<i64> = Vec::new();
            for cell in &cells {
                row_ids.extend(walk_index(
                    file,
                    page_size,
                    cell.left_child as u64,
                    probe,
                )?);
                if let Some(row_id) = probe_match(&cell.record.values, probe) {
                    row_ids.push(row_id);
                }
            }
            row_ids.extend(walk_index(file, page_size, rightmost as u64, probe)?);
            Ok(row_ids)
        }
        kind => Err(StorageError::corrupt(format!(
            "expected an index page at {page_number}, found {kind:?}"
        ))),
    }
}

// non-text keys never match; a missing or non-integer row-id column is
// skipped rather than surfaced
fn probe_match(values: &[Value], probe: &str) -> Option<i64> {
    match (values.first(), values.get(1)) {
        (Some(Value::Text(key)), Some(Value::Int(row_id))) if key == probe => Some(*row_id),
        _ => None,
    }
}
