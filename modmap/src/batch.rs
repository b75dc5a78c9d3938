//! Encoding of write requests and coalescing into contiguous runs.

use std::collections::BTreeMap;

use crate::codec::encode::{encode_bit, encode_registers, EncodeFailure};
use crate::error::WriteError;
use crate::map::{RegisterEntry, RegisterMap};
use crate::types::{DataType, Value, ValueMap, WriteBatches};

/// One encoded coil write.
struct BitUnit {
    address: u16,
    value: bool,
}

/// One encoded register write spanning `width` registers.
struct WordUnit {
    address: u16,
    width: u16,
    words: Vec<u16>,
}

impl RegisterMap {
    /// Encode a write request and coalesce it into the fewest contiguous
    /// write transactions.
    ///
    /// Every key must exist in the output half of the map; otherwise the
    /// call fails with [`WriteError::UnknownKeys`] naming all missing
    /// keys and nothing is encoded. Any range or type failure likewise
    /// aborts the whole request, so a write is applied atomically or not
    /// at all.
    ///
    /// Entries are visited in declaration order. Adjacent units (next
    /// address == previous address + previous width) join one run; the
    /// partition is always correct, but it is minimal only when entries
    /// are declared in non-decreasing address order.
    pub fn batch_writes(&self, request: &ValueMap) -> Result<WriteBatches, WriteError> {
        let missing: Vec<String> = request
            .keys()
            .filter(|key| !self.output_keys.contains(*key))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(WriteError::UnknownKeys(missing));
        }

        let mut bits = Vec::new();
        let mut words = Vec::new();
        for entry in &self.outputs {
            let value = match request.get(&entry.key) {
                Some(value) => *value,
                None => continue,
            };
            match entry.data_type {
                DataType::Bool => bits.push(BitUnit {
                    address: entry.address,
                    value: encode_bit(value).map_err(|failure| reject(entry, value, failure))?,
                }),
                _ => words.push(WordUnit {
                    address: entry.address,
                    width: entry.width(),
                    words: encode_registers(value, entry.data_type)
                        .map_err(|failure| reject(entry, value, failure))?,
                }),
            }
        }

        Ok(WriteBatches {
            coils: coalesce_bits(bits),
            registers: coalesce_words(words),
        })
    }
}

fn reject(entry: &RegisterEntry, value: Value, failure: EncodeFailure) -> WriteError {
    match failure {
        EncodeFailure::OutOfRange => WriteError::OutOfRange {
            key: entry.key.clone(),
            value,
            data_type: entry.data_type,
        },
        EncodeFailure::WrongValueType => WriteError::WrongValueType {
            key: entry.key.clone(),
            value,
            data_type: entry.data_type,
        },
    }
}

fn coalesce_bits(units: Vec<BitUnit>) -> Option<BTreeMap<u16, Vec<bool>>> {
    let mut units = units.into_iter();
    let first = units.next()?;
    let mut runs = BTreeMap::new();
    let mut start = first.address;
    let mut next = u32::from(first.address) + 1;
    let mut values = vec![first.value];
    for unit in units {
        if u32::from(unit.address) == next {
            values.push(unit.value);
        } else {
            runs.insert(start, std::mem::take(&mut values));
            start = unit.address;
            values.push(unit.value);
        }
        next = u32::from(unit.address) + 1;
    }
    runs.insert(start, values);
    Some(runs)
}

fn coalesce_words(units: Vec<WordUnit>) -> Option<BTreeMap<u16, Vec<u16>>> {
    let mut units = units.into_iter();
    let first = units.next()?;
    let mut runs = BTreeMap::new();
    let mut start = first.address;
    let mut next = u32::from(first.address) + u32::from(first.width);
    let mut values = first.words;
    for unit in units {
        if u32::from(unit.address) == next {
            values.extend(unit.words);
        } else {
            runs.insert(start, std::mem::take(&mut values));
            start = unit.address;
            values.extend(unit.words);
        }
        next = u32::from(unit.address) + u32::from(unit.width);
    }
    runs.insert(start, values);
    Some(runs)
}
