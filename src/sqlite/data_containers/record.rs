use std::fmt;

use super::serial_types::SerialType;
use crate::sqlite::error::StorageError;
use crate::sqlite::utils::{parse_sqlite_varint, SqliteVarint};

/// A decoded column value. Text is copied out of the page buffer so
/// nothing borrows from a page once decoding is done.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Blob(Vec<u8>),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Blob(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

fn take(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8], StorageError> {
    buffer
        .get(offset..offset + len)
        .ok_or_else(|| StorageError::corrupt("column value runs past the record payload"))
}

impl Value {
    /// Decodes one value at `offset`, returning the bytes consumed from
    /// the body alongside the value. Integer widths below 8 bytes
    /// sign-extend; codes 8 and 9 consume nothing and yield 0 and 1.
    pub fn decode(
        buffer: &[u8],
        offset: usize,
        serial_type: SerialType,
    ) -> Result<(usize, Value), StorageError> {
        let decoded = match serial_type {
            SerialType::Null => (0, Value::Null),
            SerialType::Int8 => {
                let raw = take(buffer, offset, 1)?;
                (1, Value::Int(i8::from_be_bytes([raw[0]]) as i64))
            }
            SerialType::Int16 => {
                let raw = take(buffer, offset, 2)?;
                (2, Value::Int(i16::from_be_bytes([raw[0], raw[1]]) as i64))
            }
            SerialType::Int24 => {
                let raw = take(buffer, offset, 3)?;
                let unsigned = i32::from_be_bytes([0, raw[0], raw[1], raw[2]]);
                // sign-extend from bit 23
                (3, Value::Int(((unsigned << 8) >> 8) as i64))
            }
            SerialType::Int32 => {
                let raw = take(buffer, offset, 4)?;
                (
                    4,
                    Value::Int(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as i64),
                )
            }
            SerialType::Int48 => {
                let raw = take(buffer, offset, 6)?;
                let unsigned =
                    i64::from_be_bytes([0, 0, raw[0], raw[1], raw[2], raw[3], raw[4], raw[5]]);
                // sign-extend from bit 47
                (6, Value::Int((unsigned << 16) >> 16))
            }
            SerialType::Int64 => {
                let raw = take(buffer, offset, 8)?;
                (
                    8,
                    Value::Int(i64::from_be_bytes([
                        raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                    ])),
                )
            }
            SerialType::Float64 => {
                let raw = take(buffer, offset, 8)?;
                (
                    8,
                    Value::Float(f64::from_be_bytes([
                        raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                    ])),
                )
            }
            SerialType::Zero => (0, Value::Int(0)),
            SerialType::One => (0, Value::Int(1)),
            SerialType::Reserved => (0, Value::Null),
            SerialType::Blob(size) => {
                let raw = take(buffer, offset, size)?;
                (size, Value::Blob(raw.to_vec()))
            }
            SerialType::Text(size) => {
                let raw = take(buffer, offset, size)?;
                let text = String::from_utf8(raw.to_vec())
                    .map_err(|_| StorageError::corrupt("text value is not valid UTF-8"))?;
                (size, Value::Text(text))
            }
        };
        Ok(decoded)
    }
}

/// One row as decoded from a cell payload: the serial types from the
/// record header and the values from the body, in column order. The
/// parser is schema-blind; callers line positions up with column names.
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub serial_types: Vec<SerialType>,
    pub values: Vec<Value>,
}

pub fn parse_record(payload: &[u8]) -> Result<ParsedRecord, StorageError> {
    let SqliteVarint {
        varint: header_size,
        byte_size,
    } = parse_sqlite_varint(payload, 0);
    if byte_size == 0 {
        return Err(StorageError::corrupt("record payload is empty"));
    }
    let header_end = header_size as usize;
    if header_end < byte_size || header_end > payload.len() {
        return Err(StorageError::corrupt("record header size is out of range"));
    }

    let mut serial_types: Vec<SerialType> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let mut header_cursor = byte_size;
    let mut body_cursor = header_end;
    while header_cursor < header_end {
        let SqliteVarint {
            varint: code,
            byte_size,
        } = parse_sqlite_varint(payload, header_cursor);
        if byte_size == 0 {
            return Err(StorageError::corrupt("record header ends mid-varint"));
        }
        header_cursor += byte_size;

        let serial_type = SerialType::from_code(code);
        let (consumed, value) = Value::decode(payload, body_cursor, serial_type)?;
        body_cursor += consumed;

        serial_types.push(serial_type);
        values.push(value);
    }

    Ok(ParsedRecord {
        serial_types,
        values,
    })
}
