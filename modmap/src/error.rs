//! Error types produced by map parsing, decoding, encoding and the device layer.

use crate::types::{DataType, Value};

/// The four configuration blocks of a register map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapBlock {
    /// the discrete-input block
    InputBits,
    /// the input-register block
    InputRegisters,
    /// the coil block
    Coils,
    /// the holding-register block
    HoldingRegisters,
}

impl std::fmt::Display for MapBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapBlock::InputBits => f.write_str("input_bits"),
            MapBlock::InputRegisters => f.write_str("input_registers"),
            MapBlock::Coils => f.write_str("coils"),
            MapBlock::HoldingRegisters => f.write_str("holding_registers"),
        }
    }
}

/// A malformed line in a register-map block.
///
/// Map parsing is eager: the first bad line fails the whole map, no
/// partial map is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapParseError {
    /// block containing the bad line
    pub block: MapBlock,
    /// 1-based line number within the block
    pub line: usize,
    /// what was wrong with the line
    pub kind: MapParseErrorKind,
}

/// Ways a register-map line can be malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapParseErrorKind {
    /// the line did not split into exactly three tokens
    WrongTokenCount(usize),
    /// the address token was not a base-10 `u16`
    BadAddress(String),
    /// the type token is not a recognized data type
    UnknownType(String),
}

impl std::error::Error for MapParseError {}

impl std::fmt::Display for MapParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block '{}' line {}: ", self.block, self.line)?;
        match &self.kind {
            MapParseErrorKind::WrongTokenCount(count) => {
                write!(f, "expected 3 tokens '<address> <key> <TYPE>', found {count}")
            }
            MapParseErrorKind::BadAddress(token) => {
                write!(f, "'{token}' is not a valid register address")
            }
            MapParseErrorKind::UnknownType(token) => {
                write!(f, "'{token}' is not a recognized data type")
            }
        }
    }
}

/// The raw array a decode operation reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceArray {
    /// discrete input bits
    InputBits,
    /// input registers
    InputWords,
    /// coil bits
    OutputBits,
    /// holding registers
    OutputWords,
}

impl std::fmt::Display for SourceArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceArray::InputBits => f.write_str("input bits"),
            SourceArray::InputWords => f.write_str("input registers"),
            SourceArray::OutputBits => f.write_str("coils"),
            SourceArray::OutputWords => f.write_str("holding registers"),
        }
    }
}

/// A raw array was too short (or absent) for an entry of the register map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundsError {
    /// key of the entry that could not be decoded
    pub key: String,
    /// array the entry reads from
    pub source: SourceArray,
    /// starting address of the entry
    pub address: u16,
    /// number of elements the entry occupies (1 for a bit)
    pub width: u16,
    /// number of elements actually available
    pub available: usize,
}

impl std::error::Error for BoundsError {}

impl std::fmt::Display for BoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "key '{}' requires {} starting at address {} with width {}, but only {} element(s) were available",
            self.key, self.source, self.address, self.width, self.available
        )
    }
}

/// A write request that could not be turned into write batches.
///
/// Any failure aborts the whole request: no batch is produced, not even
/// for keys that would have encoded successfully.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteError {
    /// keys that do not exist in the output half of the register map
    UnknownKeys(Vec<String>),
    /// a value is unrepresentable in the declared data type
    OutOfRange {
        /// key whose value was rejected
        key: String,
        /// the rejected value
        value: Value,
        /// declared data type of the key
        data_type: DataType,
    },
    /// a value's tag does not fit the declared data type, e.g. a float
    /// written to a `SIGN_16` register
    WrongValueType {
        /// key whose value was rejected
        key: String,
        /// the rejected value
        value: Value,
        /// declared data type of the key
        data_type: DataType,
    },
}

impl std::error::Error for WriteError {}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::UnknownKeys(keys) => {
                write!(f, "keys not present in the output register map: ")?;
                for (i, key) in keys.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{key}'")?;
                }
                Ok(())
            }
            WriteError::OutOfRange {
                key,
                value,
                data_type,
            } => {
                write!(f, "value {value} for key '{key}' ({data_type}) is out of range")
            }
            WriteError::WrongValueType {
                key,
                value,
                data_type,
            } => {
                write!(f, "value {value} for key '{key}' cannot be written as {data_type}")
            }
        }
    }
}

/// Errors that can occur while executing a read or write against a device.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestError {
    /// an I/O error occurred in the transport
    Io(std::io::ErrorKind),
    /// the transport returned fewer elements than requested
    ShortResponse {
        /// array that came up short
        source: SourceArray,
        /// number of elements requested
        requested: u16,
        /// number of elements received
        received: usize,
    },
    /// a raw array did not cover the register map
    Decode(BoundsError),
    /// the write request could not be encoded or batched
    Write(WriteError),
}

impl std::error::Error for RequestError {}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Io(kind) => write!(f, "I/O error: {kind}"),
            RequestError::ShortResponse {
                source,
                requested,
                received,
            } => write!(
                f,
                "requested {requested} element(s) of {source} but received {received}"
            ),
            RequestError::Decode(err) => write!(f, "decode error: {err}"),
            RequestError::Write(err) => write!(f, "write error: {err}"),
        }
    }
}

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        RequestError::Io(err.kind())
    }
}

impl From<BoundsError> for RequestError {
    fn from(err: BoundsError) -> Self {
        RequestError::Decode(err)
    }
}

impl From<WriteError> for RequestError {
    fn from(err: WriteError) -> Self {
        RequestError::Write(err)
    }
}
