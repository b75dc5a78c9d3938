//! A register-map codec for Modbus field devices.
//!
//! A declarative register map binds logical keys to protocol addresses
//! and data types. This crate parses the map, decodes raw bit/word
//! arrays into named typed values, encodes application writes back into
//! raw protocol units with range validation, and coalesces scattered
//! writes into the fewest contiguous write transactions.
//!
//! The codec is pure and synchronous; all I/O lives behind the
//! [`Transport`] trait, which [`Device`] drives for full-map reads and
//! batched writes.
//!
//! # Example
//!
//! ```
//! use modmap::{MapBlocks, RawFrame, ReadMode, RegisterMap, Value, ValueMap};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let map = RegisterMap::parse(&MapBlocks {
//!         input_bits: "0 running BOOL".to_string(),
//!         input_registers: "0 temperature FLOAT_BE\n2 cycles UNSIGN_32".to_string(),
//!         coils: String::new(),
//!         holding_registers: "0 setpoint SIGN_16\n1 limit UNSIGN_16".to_string(),
//!     })?;
//!
//!     // decode a raw read of the input half
//!     let bits = [true];
//!     let words = [0x4048, 0xF5C3, 0x0000, 0x002A];
//!     let decoded = map.decode(
//!         RawFrame {
//!             input_bits: Some(&bits),
//!             input_words: Some(&words),
//!             ..RawFrame::default()
//!         },
//!         ReadMode::Inputs,
//!     )?;
//!     let inputs = decoded.inputs.unwrap();
//!     assert_eq!(inputs["running"], Value::Bool(true));
//!     assert_eq!(inputs["cycles"], Value::UInt(42));
//!
//!     // batch a write touching both holding registers: one transaction
//!     let request: ValueMap = [
//!         ("setpoint".to_string(), Value::Int(-10)),
//!         ("limit".to_string(), Value::UInt(100)),
//!     ]
//!     .into_iter()
//!     .collect();
//!     let batches = map.batch_writes(&request)?;
//!     let registers = batches.registers.unwrap();
//!     assert_eq!(registers[&0], vec![0xFFF6, 100]);
//!     Ok(())
//! }
//! ```

/// Error types for parsing, decoding, encoding and device requests
pub mod error;

mod batch;
mod codec;
mod device;
mod map;
mod types;

pub use device::{Device, Transport};
pub use map::{Direction, MapBlocks, RegisterEntry, RegisterMap};
pub use types::{DataType, DecodedValues, RawFrame, ReadMode, Value, ValueMap, WriteBatches};
