//! Builders for byte-exact fixture database files used across the
//! storage-layer tests. Pages are assembled the way the file format lays
//! them out: cells packed at the tail, pointer array after the header.

use std::fs::File;
use std::io::Write;

use tempfile::NamedTempFile;

pub const PAGE_SIZE: usize = 4096;

pub fn varint(value: u64) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push(((rest & 0x7F) as u8) | 0x80);
        rest >>= 7;
    }
    groups.reverse();
    groups
}

#[derive(Clone)]
pub enum Col {
    Null,
    Int(i64),
    Text(String),
}

pub fn text(s: &str) -> Col {
    Col::Text(s.to_string())
}

/// Serializes one record: header-size varint, serial-type varints, body.
pub fn record(columns: &[Col]) -> Vec<u8> {
    let mut types: Vec<u8> = Vec::new();
    let mut body: Vec<u8> = Vec::new();
    for column in columns {
        match column {
            Col::Null => types.extend(varint(0)),
            Col::Int(v) => {
                // fixtures only need the one-byte width
                assert!((-128..=127).contains(v));
                types.extend(varint(1));
                body.push(*v as u8);
            }
            Col::Text(s) => {
                types.extend(varint(13 + 2 * s.len() as u64));
                body.extend(s.as_bytes());
            }
        }
    }
    let header_size = 1 + types.len();
    assert!(header_size < 128);
    let mut out = vec![header_size as u8];
    out.extend(types);
    out.extend(body);
    out
}

fn finish_page(
    mut page: Vec<u8>,
    local_offset: usize,
    kind: u8,
    cells: Vec<Vec<u8>>,
    right_pointer: Option<u32>,
) -> Vec<u8> {
    let header_len = if right_pointer.is_some() { 12 } else { 8 };
    let mut content_end = page.len();
    let mut pointers: Vec<u16> = Vec::new();
    for cell in &cells {
        content_end -= cell.len();
        page[content_end..content_end + cell.len()].copy_from_slice(cell);
        pointers.push(content_end as u16);
    }
    page[local_offset] = kind;
    page[local_offset + 3..local_offset + 5]
        .copy_from_slice(&(cells.len() as u16).to_be_bytes());
    page[local_offset + 5..local_offset + 7].copy_from_slice(&(content_end as u16).to_be_bytes());
    if let Some(right) = right_pointer {
        page[local_offset + 8..local_offset + 12].copy_from_slice(&right.to_be_bytes());
    }
    for (i, pointer) in pointers.iter().enumerate() {
        let offset = local_offset + header_len + 2 * i;
        page[offset..offset + 2].copy_from_slice(&pointer.to_be_bytes());
    }
    page
}

/// Table leaf page (kind 0x0D) from `(row_id, record)` pairs.
pub fn table_leaf_page(local_offset: usize, rows: &[(i64, Vec<u8>)]) -> Vec<u8> {
    let cells = rows
        .iter()
        .map(|(row_id, rec)| {
            let mut cell = varint(rec.len() as u64);
            cell.extend(varint(*row_id as u64));
            cell.extend(rec);
            cell
        })
        .collect();
    finish_page(vec![0_u8; PAGE_SIZE], local_offset, 0x0D, cells, None)
}

/// Table interior page (kind 0x05) from `(left_child, key)` pairs.
pub fn table_interior_page(entries: &[(u32, i64)], right_pointer: u32) -> Vec<u8> {
    let cells = entries
        .iter()
        .map(|(left_child, key)| {
            let mut cell = left_child.to_be_bytes().to_vec();
            cell.extend(varint(*key as u64));
            cell
        })
        .collect();
    finish_page(vec![0_u8; PAGE_SIZE], 0, 0x05, cells, Some(right_pointer))
}

/// Index leaf page (kind 0x0A) from `(key, row_id)` records.
pub fn index_leaf_page(entries: &[(Col, i64)]) -> Vec<u8> {
    let cells = entries
        .iter()
        .map(|(key, row_id)| {
            let rec = record(&[key.clone(), Col::Int(*row_id)]);
            let mut cell = varint(rec.len() as u64);
            cell.extend(rec);
            cell
        })
        .collect();
    finish_page(vec![0_u8; PAGE_SIZE], 0, 0x0A, cells, None)
}

/// Index interior page (kind 0x02) from `(left_child, key, row_id)` cells.
pub fn index_interior_page(entries: &[(u32, Col, i64)], right_pointer: u32) -> Vec<u8> {
    let cells = entries
        .iter()
        .map(|(left_child, key, row_id)| {
            let rec = record(&[key.clone(), Col::Int(*row_id)]);
            let mut cell = left_child.to_be_bytes().to_vec();
            cell.extend(varint(rec.len() as u64));
            cell.extend(rec);
            cell
        })
        .collect();
    finish_page(vec![0_u8; PAGE_SIZE], 0, 0x02, cells, Some(right_pointer))
}

/// A schema-table row: `(type, name, tbl_name, rootpage, sql)`.
pub fn schema_record(entry_type: &str, name: &str, tbl_name: &str, rootpage: i64, sql: &str) -> Vec<u8> {
    record(&[
        text(entry_type),
        text(name),
        text(tbl_name),
        Col::Int(rootpage),
        text(sql),
    ])
}

/// Assembles a database file: page 1 gets the 100-byte file header and the
/// schema leaf page; `pages` follow as pages 2, 3, ...
pub fn build_database(schema_rows: &[(i64, Vec<u8>)], pages: Vec<Vec<u8>>) -> NamedTempFile {
    let mut page1 = table_leaf_page(100, schema_rows);
    page1[..16].copy_from_slice(b"SQLite format 3\0");
    page1[16..18].copy_from_slice(&(PAGE_SIZE as u16).to_be_bytes());
    page1[56..60].copy_from_slice(&1_u32.to_be_bytes());

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&page1).unwrap();
    for page in &pages {
        assert_eq!(page.len(), PAGE_SIZE);
        file.write_all(page).unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn open(file: &NamedTempFile) -> File {
    File::open(file.path()).unwrap()
}
