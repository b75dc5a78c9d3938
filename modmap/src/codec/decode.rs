//! Bounds-checked decoding of raw protocol units into values.

use crate::codec::FloatLayout;
use crate::error::{BoundsError, SourceArray};
use crate::map::RegisterEntry;
use crate::types::{DataType, Value};

/// Decode one register-map entry from the raw arrays of its direction.
///
/// `BOOL` entries read the bit array, everything else the word array. An
/// absent array is treated as empty, so a referencing entry turns into a
/// bounds error rather than an index panic.
pub(crate) fn decode_entry(
    entry: &RegisterEntry,
    bits: Option<&[bool]>,
    bit_source: SourceArray,
    words: Option<&[u16]>,
    word_source: SourceArray,
) -> Result<Value, BoundsError> {
    match entry.data_type {
        DataType::Bool => {
            let data = slice(entry, bits.unwrap_or_default(), bit_source, 1)?;
            Ok(Value::Bool(data[0]))
        }
        _ => decode_words(entry, words.unwrap_or_default(), word_source),
    }
}

fn decode_words(
    entry: &RegisterEntry,
    words: &[u16],
    source: SourceArray,
) -> Result<Value, BoundsError> {
    let data = slice(entry, words, source, entry.width())?;
    Ok(match entry.data_type {
        // bools never reach here, they are routed to the bit array
        DataType::Bool => Value::Bool(false),
        DataType::Sign16 => Value::Int(data[0] as i16 as i64),
        DataType::Unsign16 => Value::UInt(data[0] as u64),
        DataType::Sign32 => Value::Int(join_u32(data) as i32 as i64),
        DataType::Unsign32 => Value::UInt(join_u32(data) as u64),
        DataType::Sign64 => Value::Int(join_u64(data) as i64),
        DataType::Unsign64 => Value::UInt(join_u64(data)),
        DataType::FloatBe => float_value(data, FloatLayout::BE),
        DataType::FloatLe => float_value(data, FloatLayout::LE),
        DataType::FloatBebs => float_value(data, FloatLayout::BEBS),
        DataType::FloatLebs => float_value(data, FloatLayout::LEBS),
    })
}

fn slice<'a, T>(
    entry: &RegisterEntry,
    data: &'a [T],
    source: SourceArray,
    width: u16,
) -> Result<&'a [T], BoundsError> {
    let start = entry.address as usize;
    let end = start + width as usize;
    data.get(start..end).ok_or_else(|| BoundsError {
        key: entry.key.clone(),
        source,
        address: entry.address,
        width,
        available: data.len(),
    })
}

fn join_u32(words: &[u16]) -> u32 {
    (u32::from(words[0]) << 16) | u32::from(words[1])
}

fn join_u64(words: &[u16]) -> u64 {
    (u64::from(words[0]) << 48)
        | (u64::from(words[1]) << 32)
        | (u64::from(words[2]) << 16)
        | u64::from(words[3])
}

fn float_value(words: &[u16], layout: FloatLayout) -> Value {
    Value::Float(layout.to_float([words[0], words[1]]) as f64)
}
