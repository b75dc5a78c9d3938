use std::collections::BTreeMap;

/// Data types that a register-map entry can declare.
///
/// The configuration tokens are the upper-case names used by the map
/// format, e.g. `SIGN_16` or `FLOAT_BEBS`. Each type occupies a fixed
/// number of 16-bit registers; `BOOL` occupies a single bit instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DataType {
    /// single bit, read from / written to the bit arrays (`BOOL`)
    Bool,
    /// 16-bit two's-complement integer (`SIGN_16`)
    Sign16,
    /// 16-bit unsigned integer (`UNSIGN_16`)
    Unsign16,
    /// 32-bit two's-complement integer, two registers high word first (`SIGN_32`)
    Sign32,
    /// 32-bit unsigned integer, two registers high word first (`UNSIGN_32`)
    Unsign32,
    /// 64-bit two's-complement integer, four registers high to low (`SIGN_64`)
    Sign64,
    /// 64-bit unsigned integer, four registers high to low (`UNSIGN_64`)
    Unsign64,
    /// IEEE-754 single, high word first, network byte order (`FLOAT_BE`)
    FloatBe,
    /// IEEE-754 single, low word first, swapped bytes (`FLOAT_LE`)
    FloatLe,
    /// IEEE-754 single, high word first, swapped bytes (`FLOAT_BEBS`)
    FloatBebs,
    /// IEEE-754 single, low word first, network byte order (`FLOAT_LEBS`)
    FloatLebs,
}

impl DataType {
    /// Number of 16-bit registers the type occupies. `Bool` occupies a
    /// single bit and therefore zero registers.
    pub fn word_count(self) -> u16 {
        match self {
            DataType::Bool => 0,
            DataType::Sign16 | DataType::Unsign16 => 1,
            DataType::Sign32 | DataType::Unsign32 => 2,
            DataType::Sign64 | DataType::Unsign64 => 4,
            DataType::FloatBe | DataType::FloatLe | DataType::FloatBebs | DataType::FloatLebs => 2,
        }
    }

    /// Value a key of this type holds before the first read.
    pub fn default_value(self) -> Value {
        match self {
            DataType::Bool => Value::Bool(false),
            DataType::Sign16 | DataType::Sign32 | DataType::Sign64 => Value::Int(0),
            DataType::Unsign16 | DataType::Unsign32 | DataType::Unsign64 => Value::UInt(0),
            DataType::FloatBe | DataType::FloatLe | DataType::FloatBebs | DataType::FloatLebs => {
                Value::Float(0.0)
            }
        }
    }

    /// Parse a configuration token, e.g. `"UNSIGN_32"`.
    pub fn from_token(token: &str) -> Option<DataType> {
        match token {
            "BOOL" => Some(DataType::Bool),
            "SIGN_16" => Some(DataType::Sign16),
            "UNSIGN_16" => Some(DataType::Unsign16),
            "SIGN_32" => Some(DataType::Sign32),
            "UNSIGN_32" => Some(DataType::Unsign32),
            "SIGN_64" => Some(DataType::Sign64),
            "UNSIGN_64" => Some(DataType::Unsign64),
            "FLOAT_BE" => Some(DataType::FloatBe),
            "FLOAT_LE" => Some(DataType::FloatLe),
            "FLOAT_BEBS" => Some(DataType::FloatBebs),
            "FLOAT_LEBS" => Some(DataType::FloatLebs),
            _ => None,
        }
    }

    /// The configuration token of the type.
    pub fn token(self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Sign16 => "SIGN_16",
            DataType::Unsign16 => "UNSIGN_16",
            DataType::Sign32 => "SIGN_32",
            DataType::Unsign32 => "UNSIGN_32",
            DataType::Sign64 => "SIGN_64",
            DataType::Unsign64 => "UNSIGN_64",
            DataType::FloatBe => "FLOAT_BE",
            DataType::FloatLe => "FLOAT_LE",
            DataType::FloatBebs => "FLOAT_BEBS",
            DataType::FloatLebs => "FLOAT_LEBS",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// A decoded register value or a value requested for writing.
///
/// Unsigned and signed integers carry separate tags because `UNSIGN_64`
/// exceeds the range of `i64`. Encoding accepts either integer tag for
/// any integer-typed register as long as the value is in range.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Value {
    /// a bit value
    Bool(bool),
    /// a signed integer value
    Int(i64),
    /// an unsigned integer value
    UInt(u64),
    /// a floating-point value
    Float(f64),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(x) => write!(f, "{x}"),
            Value::Int(x) => write!(f, "{x}"),
            Value::UInt(x) => write!(f, "{x}"),
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Mapping from register-map key to value.
pub type ValueMap = BTreeMap<String, Value>;

/// Selects which half of the register map a read covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ReadMode {
    /// read and decode both halves
    All,
    /// read and decode only discrete inputs and input registers
    Inputs,
    /// read and decode only coils and holding registers
    Outputs,
}

impl ReadMode {
    pub(crate) fn covers_inputs(self) -> bool {
        match self {
            ReadMode::All | ReadMode::Inputs => true,
            ReadMode::Outputs => false,
        }
    }

    pub(crate) fn covers_outputs(self) -> bool {
        match self {
            ReadMode::All | ReadMode::Outputs => true,
            ReadMode::Inputs => false,
        }
    }
}

/// Raw arrays read off the wire, as handed to [`crate::RegisterMap::decode`].
///
/// An absent array is only an error if an entry of the selected half
/// actually refers to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawFrame<'a> {
    /// discrete input bits, starting at address 0
    pub input_bits: Option<&'a [bool]>,
    /// input registers, starting at address 0
    pub input_words: Option<&'a [u16]>,
    /// coil bits, starting at address 0
    pub output_bits: Option<&'a [bool]>,
    /// holding registers, starting at address 0
    pub output_words: Option<&'a [u16]>,
}

/// Decoded values of one read operation.
///
/// A half that was not requested is `None`, never an empty map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DecodedValues {
    /// values decoded from discrete inputs and input registers
    pub inputs: Option<ValueMap>,
    /// values decoded from coils and holding registers
    pub outputs: Option<ValueMap>,
}

/// Contiguous write transactions produced by [`crate::RegisterMap::batch_writes`].
///
/// Each map entry is one wire transaction: the starting address and the
/// values to write there in order. A side with no entries is `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteBatches {
    /// coil runs, keyed by starting bit address
    pub coils: Option<BTreeMap<u16, Vec<bool>>>,
    /// register runs, keyed by starting register address
    pub registers: Option<BTreeMap<u16, Vec<u16>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        let all = [
            DataType::Bool,
            DataType::Sign16,
            DataType::Unsign16,
            DataType::Sign32,
            DataType::Unsign32,
            DataType::Sign64,
            DataType::Unsign64,
            DataType::FloatBe,
            DataType::FloatLe,
            DataType::FloatBebs,
            DataType::FloatLebs,
        ];
        for data_type in all {
            assert_eq!(DataType::from_token(data_type.token()), Some(data_type));
        }
        assert_eq!(DataType::from_token("FLOAT"), None);
        assert_eq!(DataType::from_token("bool"), None);
    }

    #[test]
    fn word_counts_match_type_widths() {
        assert_eq!(DataType::Bool.word_count(), 0);
        assert_eq!(DataType::Sign16.word_count(), 1);
        assert_eq!(DataType::Unsign32.word_count(), 2);
        assert_eq!(DataType::FloatLebs.word_count(), 2);
        assert_eq!(DataType::Sign64.word_count(), 4);
    }
}
