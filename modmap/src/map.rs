//! Register-map parsing and the decode surface.

use std::collections::BTreeSet;

use crate::codec::decode::decode_entry;
use crate::error::{BoundsError, MapBlock, MapParseError, MapParseErrorKind, SourceArray};
use crate::types::{DataType, DecodedValues, RawFrame, ReadMode, ValueMap};

/// The four textual register-map blocks, as loaded by the configuration
/// collaborator.
///
/// Each block holds zero or more lines of the form
/// `<decimal address> <key> <TYPE>`; blank lines are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MapBlocks {
    /// discrete inputs (read-only bits)
    pub input_bits: String,
    /// input registers (read-only words)
    pub input_registers: String,
    /// coils (writable bits)
    pub coils: String,
    /// holding registers (writable words)
    pub holding_registers: String,
}

/// One parsed register-map line: a key bound to an address and data type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct RegisterEntry {
    /// offset into the entry's source array
    pub address: u16,
    /// logical name of the value
    pub key: String,
    /// declared data type
    pub data_type: DataType,
}

impl RegisterEntry {
    /// Number of registers the entry occupies (0 for a `BOOL`).
    pub fn width(&self) -> u16 {
        self.data_type.word_count()
    }
}

/// The read (input) or write (output) half of a register map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// discrete inputs and input registers
    Input,
    /// coils and holding registers
    Output,
}

/// A parsed register map: the input and output entry sequences plus the
/// aggregate counts a transport needs to size its full-map reads.
///
/// Built once at startup and immutable afterwards; decoding and batching
/// take `&self` and are safe to run concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    pub(crate) inputs: Vec<RegisterEntry>,
    pub(crate) outputs: Vec<RegisterEntry>,
    pub(crate) output_keys: BTreeSet<String>,
    input_bit_count: u16,
    input_word_count: u16,
    output_bit_count: u16,
    output_word_count: u16,
}

impl RegisterMap {
    /// Parse the four blocks into a register map.
    ///
    /// Fails eagerly on the first malformed line. Keys need not be unique
    /// within a direction; a duplicate silently overwrites the earlier
    /// key in decoded value maps.
    ///
    /// Entries that are meant to coalesce into few write transactions
    /// should be declared in non-decreasing address order; see
    /// [`RegisterMap::batch_writes`].
    pub fn parse(blocks: &MapBlocks) -> Result<RegisterMap, MapParseError> {
        let mut inputs = Vec::new();
        let input_bit_count = parse_block(&blocks.input_bits, MapBlock::InputBits, &mut inputs)?;
        parse_block(&blocks.input_registers, MapBlock::InputRegisters, &mut inputs)?;

        let mut outputs = Vec::new();
        let output_bit_count = parse_block(&blocks.coils, MapBlock::Coils, &mut outputs)?;
        parse_block(
            &blocks.holding_registers,
            MapBlock::HoldingRegisters,
            &mut outputs,
        )?;

        let output_keys = outputs.iter().map(|e| e.key.clone()).collect();
        let input_word_count = word_total(&inputs);
        let output_word_count = word_total(&outputs);

        Ok(RegisterMap {
            inputs,
            outputs,
            output_keys,
            input_bit_count,
            input_word_count,
            output_bit_count,
            output_word_count,
        })
    }

    /// Entries of the input half, in declaration order.
    pub fn inputs(&self) -> &[RegisterEntry] {
        &self.inputs
    }

    /// Entries of the output half, in declaration order.
    pub fn outputs(&self) -> &[RegisterEntry] {
        &self.outputs
    }

    /// Number of discrete inputs to read for a full input scan.
    pub fn input_bit_count(&self) -> u16 {
        self.input_bit_count
    }

    /// Number of input registers to read for a full input scan.
    pub fn input_word_count(&self) -> u16 {
        self.input_word_count
    }

    /// Number of coils to read for a full output scan.
    pub fn output_bit_count(&self) -> u16 {
        self.output_bit_count
    }

    /// Number of holding registers to read for a full output scan.
    pub fn output_word_count(&self) -> u16 {
        self.output_word_count
    }

    /// Every key of a direction mapped to its type's default value, the
    /// state an application holds before the first successful read.
    pub fn default_values(&self, direction: Direction) -> ValueMap {
        let entries = match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        };
        entries
            .iter()
            .map(|e| (e.key.clone(), e.data_type.default_value()))
            .collect()
    }

    /// Decode raw arrays into named values.
    ///
    /// `mode` selects which half (or both) to decode; an unrequested half
    /// is `None` in the result. Every entry of a selected half must be
    /// covered by its source array or the decode fails with a
    /// [`BoundsError`].
    pub fn decode(&self, frame: RawFrame, mode: ReadMode) -> Result<DecodedValues, BoundsError> {
        let inputs = if mode.covers_inputs() {
            Some(decode_half(
                &self.inputs,
                frame.input_bits,
                SourceArray::InputBits,
                frame.input_words,
                SourceArray::InputWords,
            )?)
        } else {
            None
        };
        let outputs = if mode.covers_outputs() {
            Some(decode_half(
                &self.outputs,
                frame.output_bits,
                SourceArray::OutputBits,
                frame.output_words,
                SourceArray::OutputWords,
            )?)
        } else {
            None
        };
        Ok(DecodedValues { inputs, outputs })
    }
}

fn decode_half(
    entries: &[RegisterEntry],
    bits: Option<&[bool]>,
    bit_source: SourceArray,
    words: Option<&[u16]>,
    word_source: SourceArray,
) -> Result<ValueMap, BoundsError> {
    let mut values = ValueMap::new();
    for entry in entries {
        let value = decode_entry(entry, bits, bit_source, words, word_source)?;
        values.insert(entry.key.clone(), value);
    }
    Ok(values)
}

/// Parse one block, appending entries to `out`. Returns the number of
/// entries the block declared.
fn parse_block(
    text: &str,
    block: MapBlock,
    out: &mut Vec<RegisterEntry>,
) -> Result<u16, MapParseError> {
    let mut count = 0;
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        let (address, key, type_token) = match tokens.as_slice() {
            [a, k, t] => (*a, *k, *t),
            _ => {
                return Err(MapParseError {
                    block,
                    line: index + 1,
                    kind: MapParseErrorKind::WrongTokenCount(tokens.len()),
                })
            }
        };
        let address: u16 = address.parse().map_err(|_| MapParseError {
            block,
            line: index + 1,
            kind: MapParseErrorKind::BadAddress(address.to_string()),
        })?;
        let data_type = DataType::from_token(type_token).ok_or_else(|| MapParseError {
            block,
            line: index + 1,
            kind: MapParseErrorKind::UnknownType(type_token.to_string()),
        })?;
        out.push(RegisterEntry {
            address,
            key: key.to_string(),
            data_type,
        });
        count += 1;
    }
    Ok(count)
}

fn word_total(entries: &[RegisterEntry]) -> u16 {
    entries.iter().map(RegisterEntry::width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn blocks() -> MapBlocks {
        MapBlocks {
            input_bits: "0 running BOOL\n1 fault BOOL\n".to_string(),
            input_registers: "0 temperature FLOAT_BE\n2 cycles UNSIGN_32\n4 offset SIGN_16\n"
                .to_string(),
            coils: "0 enable BOOL\n".to_string(),
            holding_registers: "0 setpoint SIGN_16\n1 limit UNSIGN_64\n".to_string(),
        }
    }

    #[test]
    fn parses_blocks_and_computes_aggregates() {
        let map = RegisterMap::parse(&blocks()).unwrap();
        assert_eq!(map.input_bit_count(), 2);
        assert_eq!(map.input_word_count(), 5);
        assert_eq!(map.output_bit_count(), 1);
        assert_eq!(map.output_word_count(), 5);
        assert_eq!(map.inputs().len(), 5);
        assert_eq!(map.outputs().len(), 3);
        assert_eq!(
            map.inputs()[2],
            RegisterEntry {
                address: 0,
                key: "temperature".to_string(),
                data_type: DataType::FloatBe,
            }
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let map = RegisterMap::parse(&MapBlocks {
            input_bits: "\n0 a BOOL\n\n  \n1 b BOOL\n".to_string(),
            ..MapBlocks::default()
        })
        .unwrap();
        assert_eq!(map.input_bit_count(), 2);
    }

    #[test]
    fn wrong_token_count_is_rejected() {
        let err = RegisterMap::parse(&MapBlocks {
            coils: "0 enable BOOL\n1 spare\n".to_string(),
            ..MapBlocks::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            MapParseError {
                block: MapBlock::Coils,
                line: 2,
                kind: MapParseErrorKind::WrongTokenCount(2),
            }
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = RegisterMap::parse(&MapBlocks {
            holding_registers: "0 setpoint FLOAT\n".to_string(),
            ..MapBlocks::default()
        })
        .unwrap_err();
        assert_eq!(
            err.kind,
            MapParseErrorKind::UnknownType("FLOAT".to_string())
        );
    }

    #[test]
    fn bad_address_is_rejected() {
        let err = RegisterMap::parse(&MapBlocks {
            input_registers: "-1 x SIGN_16\n".to_string(),
            ..MapBlocks::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, MapParseErrorKind::BadAddress("-1".to_string()));
    }

    #[test]
    fn decode_covers_the_requested_halves() {
        let map = RegisterMap::parse(&blocks()).unwrap();
        let input_bits = [true, false];
        // temperature = 3.14, cycles = 0x0001_0002, offset = -3
        let input_words = [0x4048, 0xF5C3, 0x0001, 0x0002, 0xFFFD];
        let output_bits = [true];
        let output_words = [100, 0, 0, 0, 7];
        let frame = RawFrame {
            input_bits: Some(&input_bits),
            input_words: Some(&input_words),
            output_bits: Some(&output_bits),
            output_words: Some(&output_words),
        };

        let both = map.decode(frame, ReadMode::All).unwrap();
        let inputs = both.inputs.unwrap();
        let outputs = both.outputs.unwrap();
        assert_eq!(inputs["running"], Value::Bool(true));
        assert_eq!(inputs["fault"], Value::Bool(false));
        assert_eq!(inputs["temperature"], Value::Float(3.14f32 as f64));
        assert_eq!(inputs["cycles"], Value::UInt(0x0001_0002));
        assert_eq!(inputs["offset"], Value::Int(-3));
        assert_eq!(outputs["enable"], Value::Bool(true));
        assert_eq!(outputs["setpoint"], Value::Int(100));
        assert_eq!(outputs["limit"], Value::UInt(7));

        let inputs_only = map.decode(frame, ReadMode::Inputs).unwrap();
        assert!(inputs_only.inputs.is_some());
        assert!(inputs_only.outputs.is_none());

        let outputs_only = map.decode(frame, ReadMode::Outputs).unwrap();
        assert!(outputs_only.inputs.is_none());
        assert!(outputs_only.outputs.is_some());
    }

    #[test]
    fn decode_reports_short_word_arrays() {
        let map = RegisterMap::parse(&blocks()).unwrap();
        let input_bits = [true, false];
        let input_words = [0x4048, 0xF5C3, 0x0001]; // cycles needs words 2..4
        let err = map
            .decode(
                RawFrame {
                    input_bits: Some(&input_bits),
                    input_words: Some(&input_words),
                    ..RawFrame::default()
                },
                ReadMode::Inputs,
            )
            .unwrap_err();
        assert_eq!(err.key, "cycles");
        assert_eq!(err.source, SourceArray::InputWords);
        assert_eq!(err.available, 3);
    }

    #[test]
    fn duplicate_keys_overwrite_in_declaration_order() {
        let map = RegisterMap::parse(&MapBlocks {
            input_registers: "0 level UNSIGN_16\n1 level UNSIGN_16\n".to_string(),
            ..MapBlocks::default()
        })
        .unwrap();
        let words = [10, 20];
        let decoded = map
            .decode(
                RawFrame {
                    input_words: Some(&words),
                    ..RawFrame::default()
                },
                ReadMode::Inputs,
            )
            .unwrap();
        assert_eq!(decoded.inputs.unwrap()["level"], Value::UInt(20));
    }

    #[test]
    fn default_values_follow_the_type_table() {
        let map = RegisterMap::parse(&blocks()).unwrap();
        let defaults = map.default_values(Direction::Input);
        assert_eq!(defaults["running"], Value::Bool(false));
        assert_eq!(defaults["temperature"], Value::Float(0.0));
        assert_eq!(defaults["cycles"], Value::UInt(0));
        assert_eq!(defaults["offset"], Value::Int(0));
    }
}
