//! Range-checked encoding of values into raw protocol units.

use crate::codec::FloatLayout;
use crate::types::{DataType, Value};

/// Why a single value failed to encode. The caller attaches the key and
/// the declared type when it reports the failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EncodeFailure {
    OutOfRange,
    WrongValueType,
}

/// Encode a value destined for a coil.
pub(crate) fn encode_bit(value: Value) -> Result<bool, EncodeFailure> {
    match value {
        Value::Bool(x) => Ok(x),
        _ => Err(EncodeFailure::WrongValueType),
    }
}

/// Encode a value destined for one or more registers, high word first
/// for multi-word integers, per its layout for floats.
pub(crate) fn encode_registers(value: Value, data_type: DataType) -> Result<Vec<u16>, EncodeFailure> {
    match data_type {
        DataType::Bool => Err(EncodeFailure::WrongValueType),
        DataType::Sign16 => {
            let x = in_range(integer(value)?, i16::MIN as i128, i16::MAX as i128)?;
            Ok(vec![x as i16 as u16])
        }
        DataType::Unsign16 => {
            let x = in_range(integer(value)?, 0, u16::MAX as i128)?;
            Ok(vec![x as u16])
        }
        DataType::Sign32 => {
            let x = in_range(integer(value)?, i32::MIN as i128, i32::MAX as i128)?;
            Ok(split_u32(x as i32 as u32))
        }
        DataType::Unsign32 => {
            let x = in_range(integer(value)?, 0, u32::MAX as i128)?;
            Ok(split_u32(x as u32))
        }
        DataType::Sign64 => {
            let x = in_range(integer(value)?, i64::MIN as i128, i64::MAX as i128)?;
            Ok(split_u64(x as i64 as u64))
        }
        DataType::Unsign64 => {
            let x = in_range(integer(value)?, 0, u64::MAX as i128)?;
            Ok(split_u64(x as u64))
        }
        DataType::FloatBe => float_words(value, FloatLayout::BE),
        DataType::FloatLe => float_words(value, FloatLayout::LE),
        DataType::FloatBebs => float_words(value, FloatLayout::BEBS),
        DataType::FloatLebs => float_words(value, FloatLayout::LEBS),
    }
}

fn integer(value: Value) -> Result<i128, EncodeFailure> {
    match value {
        Value::Int(x) => Ok(x as i128),
        Value::UInt(x) => Ok(x as i128),
        Value::Bool(_) | Value::Float(_) => Err(EncodeFailure::WrongValueType),
    }
}

fn in_range(value: i128, min: i128, max: i128) -> Result<i128, EncodeFailure> {
    if value < min || value > max {
        return Err(EncodeFailure::OutOfRange);
    }
    Ok(value)
}

fn split_u32(value: u32) -> Vec<u16> {
    vec![(value >> 16) as u16, value as u16]
}

fn split_u64(value: u64) -> Vec<u16> {
    vec![
        (value >> 48) as u16,
        (value >> 32) as u16,
        (value >> 16) as u16,
        value as u16,
    ]
}

fn float_words(value: Value, layout: FloatLayout) -> Result<Vec<u16>, EncodeFailure> {
    let x = match value {
        Value::Float(x) => x,
        // integral values are accepted for float registers
        Value::Int(x) => x as f64,
        Value::UInt(x) => x as f64,
        Value::Bool(_) => return Err(EncodeFailure::WrongValueType),
    };
    // also rejects NaN and infinities
    if !(x.abs() <= f32::MAX as f64) {
        return Err(EncodeFailure::OutOfRange);
    }
    Ok(layout.to_words(x as f32).to_vec())
}
