use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::sqlite::error::StorageError;

pub const FILE_HEADER_SIZE: usize = 100;

const MAGIC: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug)]
pub enum DbTextEncoding {
    Utf8,
    Utf16le,
    Utf16be,
}

impl TryFrom<u32> for DbTextEncoding {
    type Error = StorageError;
    fn try_from(decoded_value: u32) -> Result<DbTextEncoding, StorageError> {
        match decoded_value {
            1 => Ok(DbTextEncoding::Utf8),
            2 => Ok(DbTextEncoding::Utf16le),
            3 => Ok(DbTextEncoding::Utf16be),
            code => Err(StorageError::UnsupportedEncoding { code }),
        }
    }
}

// the 100-byte header at the front of page 1
#[derive(Debug)]
pub struct DatabaseHeader {
    pub page_size: u32,
    #[allow(dead_code)]
    file_format_write_version: u8,
    #[allow(dead_code)]
    file_format_read_version: u8,
    #[allow(dead_code)]
    file_change_counter: u32,
    #[allow(dead_code)]
    database_page_count: u32,
    #[allow(dead_code)]
    schema_cookie: u32,
    #[allow(dead_code)]
    text_encoding: DbTextEncoding,
    #[allow(dead_code)]
    sqlite_version_number: u32,
}

impl DatabaseHeader {
    pub fn read(file: &mut File, path: &Path) -> Result<DatabaseHeader, StorageError> {
        let mut buffer = [0_u8; FILE_HEADER_SIZE];
        file.read_exact(&mut buffer).map_err(|_| StorageError::NotADatabase {
            path: path.to_path_buf(),
        })?;
        if &buffer[..MAGIC.len()] != MAGIC {
            return Err(StorageError::NotADatabase {
                path: path.to_path_buf(),
            });
        }

        // a stored page size of 1 means 65536
        let raw_page_size = u16::from_be_bytes([buffer[16], buffer[17]]);
        let page_size = if raw_page_size == 1 {
            65_536
        } else {
            raw_page_size as u32
        };

        let text_encoding = DbTextEncoding::try_from(u32::from_be_bytes([
            buffer[56], buffer[57], buffer[58], buffer[59],
        ]))?;
        if !matches!(text_encoding, DbTextEncoding::Utf8) {
            return Err(StorageError::UnsupportedEncoding {
                code: u32::from_be_bytes([buffer[56], buffer[57], buffer[58], buffer[59]]),
            });
        }

        Ok(DatabaseHeader {
            page_size,
            file_format_write_version: buffer[18],
            file_format_read_version: buffer[19],
            file_change_counter: u32::from_be_bytes([
                buffer[24], buffer[25], buffer[26], buffer[27],
            ]),
            database_page_count: u32::from_be_bytes([
                buffer[28], buffer[29], buffer[30], buffer[31],
            ]),
            schema_cookie: u32::from_be_bytes([buffer[40], buffer[41], buffer[42], buffer[43]]),
            text_encoding,
            sqlite_version_number: u32::from_be_bytes([
                buffer[96], buffer[97], buffer[98], buffer[99],
            ]),
        })
    }
}
