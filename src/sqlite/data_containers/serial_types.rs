/// Column serial types from the record header. Codes 10 and 11 are
/// reserved by the file format; they decode to null and consume nothing,
/// so the mapping stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    Zero,
    One,
    Reserved,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_code(code: u64) -> SerialType {
        match code {
            0 => Self::Null,
            1 => Self::Int8,
            2 => Self::Int16,
            3 => Self::Int24,
            4 => Self::Int32,
            5 => Self::Int48,
            6 => Self::Int64,
            7 => Self::Float64,
            8 => Self::Zero,
            9 => Self::One,
            10 | 11 => Self::Reserved,
            _ if code % 2 == 0 => Self::Blob(((code - 12) / 2) as usize),
            _ => Self::Text(((code - 13) / 2) as usize),
        }
    }

    // bytes the value occupies in the record body
    pub fn size(&self) -> usize {
        match *self {
            Self::Null => 0,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int24 => 3,
            Self::Int32 => 4,
            Self::Int48 => 6,
            Self::Int64 => 8,
            Self::Float64 => 8,
            Self::Zero => 0,
            Self::One => 0,
            Self::Reserved => 0,
            Self::Blob(size) => size,
            Self::Text(size) => size,
        }
    }
}
