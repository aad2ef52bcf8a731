use super::record::{parse_record, ParsedRecord};
use crate::sqlite::error::StorageError;
use crate::sqlite::utils::{parse_sqlite_varint, SqliteVarint};

// payload slice shared by the index cell shapes
fn read_payload(data: &[u8], offset: usize) -> Result<&[u8], StorageError> {
    let SqliteVarint {
        varint: payload_size,
        byte_size,
    } = parse_sqlite_varint(data, offset);
    if byte_size == 0 {
        return Err(StorageError::corrupt("cell payload size ends mid-varint"));
    }
    let payload_start = offset + byte_size;
    let payload_end = payload_start + payload_size as usize;
    data.get(payload_start..payload_end)
        .ok_or_else(|| StorageError::corrupt("cell payload runs off the page"))
}

/// Table leaf cell: `varint(payload_size) | varint(row_id) | record`.
pub struct TableLeafCell {
    pub row_id: i64,
    pub record: ParsedRecord,
}

impl TableLeafCell {
    pub fn read(data: &[u8], offset: usize) -> Result<TableLeafCell, StorageError> {
        let SqliteVarint {
            varint: payload_size,
            byte_size,
        } = parse_sqlite_varint(data, offset);
        if byte_size == 0 {
            return Err(StorageError::corrupt("cell payload size ends mid-varint"));
        }
        let mut cursor = offset + byte_size;

        let SqliteVarint {
            varint: row_id,
            byte_size,
        } = parse_sqlite_varint(data, cursor);
        if byte_size == 0 {
            return Err(StorageError::corrupt("cell row id ends mid-varint"));
        }
        cursor += byte_size;

        let Some(payload) = data.get(cursor..cursor + payload_size as usize) else {
            return Err(StorageError::corrupt("cell payload runs off the page"));
        };
        Ok(TableLeafCell {
            row_id: row_id as i64,
            record: parse_record(payload)?,
        })
    }
}

/// Table interior cell: `u32(left_child) | varint(row_id)`.
pub struct TableInteriorCell {
    pub left_child: u32,
    pub row_id: i64,
}

impl TableInteriorCell {
    pub fn read(data: &[u8], offset: usize) -> Result<TableInteriorCell, StorageError> {
        let Some(raw) = data.get(offset..offset + 4) else {
            return Err(StorageError::corrupt("interior cell runs off the page"));
        };
        let left_child = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let SqliteVarint {
            varint: row_id,
            byte_size,
        } = parse_sqlite_varint(data, offset + 4);
        if byte_size == 0 {
            return Err(StorageError::corrupt("interior cell key ends mid-varint"));
        }
        Ok(TableInteriorCell {
            left_child,
            row_id: row_id as i64,
        })
    }
}

/// Index leaf cell: `varint(payload_size) | record`.
pub struct IndexLeafCell {
    pub record: ParsedRecord,
}

impl IndexLeafCell {
    pub fn read(data: &[u8], offset: usize) -> Result<IndexLeafCell, StorageError> {
        let payload = read_payload(data, offset)?;
        Ok(IndexLeafCell {
            record: parse_record(payload)?,
        })
    }
}

/// Index interior cell: `u32(left_child) | varint(payload_size) | record`.
pub struct IndexInteriorCell {
    pub left_child: u32,
    pub record: ParsedRecord,
}

impl IndexInteriorCell {
    pub fn read(data: &[u8], offset: usize) -> Result<IndexInteriorCell, StorageError> {
        let Some(raw) = data.get(offset..offset + 4) else {
            return Err(StorageError::corrupt("interior cell runs off the page"));
        };
        let left_child = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let payload = read_payload(data, offset + 4)?;
        Ok(IndexInteriorCell {
            left_child,
            record: parse_record(payload)?,
        })
    }
}
