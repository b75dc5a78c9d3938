//! Driving full-map reads and batched writes through a transport.

use crate::error::{RequestError, SourceArray};
use crate::map::RegisterMap;
use crate::types::{DecodedValues, RawFrame, ReadMode, ValueMap};

/// The protocol primitives a transport collaborator must provide.
///
/// Each method is a single wire transaction against the connected unit.
/// Connection management, retries and timeouts are entirely the
/// implementor's concern; [`Device`] never retries. A read with
/// `count == 0` must resolve to an empty vector without touching the
/// wire.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Read `count` coils starting at `start`.
    async fn read_coils(&mut self, start: u16, count: u16) -> Result<Vec<bool>, RequestError>;
    /// Read `count` discrete inputs starting at `start`.
    async fn read_discrete_inputs(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<bool>, RequestError>;
    /// Read `count` holding registers starting at `start`.
    async fn read_holding_registers(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, RequestError>;
    /// Read `count` input registers starting at `start`.
    async fn read_input_registers(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, RequestError>;
    /// Write a contiguous run of coils starting at `start`.
    async fn write_coils(&mut self, start: u16, bits: &[bool]) -> Result<(), RequestError>;
    /// Write a contiguous run of holding registers starting at `start`.
    async fn write_registers(&mut self, start: u16, words: &[u16]) -> Result<(), RequestError>;
}

/// A field device: an immutable register map bound to a transport.
#[derive(Debug)]
pub struct Device<T: Transport> {
    map: RegisterMap,
    transport: T,
    mode: ReadMode,
}

impl<T: Transport> Device<T> {
    /// Bind a register map to a transport. `mode` selects which halves
    /// [`Device::receive`] scans.
    pub fn new(map: RegisterMap, transport: T, mode: ReadMode) -> Self {
        Self {
            map,
            transport,
            mode,
        }
    }

    /// The register map this device was built with.
    pub fn map(&self) -> &RegisterMap {
        &self.map
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consume the device, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Execute a full-map read and decode it into named values.
    ///
    /// Reads each covered array from address 0 with the map's aggregate
    /// count and fails with [`RequestError::ShortResponse`] if the
    /// transport returns fewer elements than requested.
    pub async fn receive(&mut self) -> Result<DecodedValues, RequestError> {
        let mut input_bits = None;
        let mut input_words = None;
        let mut output_bits = None;
        let mut output_words = None;

        if self.mode.covers_inputs() {
            let count = self.map.input_bit_count();
            let bits = self.transport.read_discrete_inputs(0, count).await?;
            input_bits = Some(checked(bits, SourceArray::InputBits, count)?);

            let count = self.map.input_word_count();
            let words = self.transport.read_input_registers(0, count).await?;
            input_words = Some(checked(words, SourceArray::InputWords, count)?);
        }
        if self.mode.covers_outputs() {
            let count = self.map.output_bit_count();
            let bits = self.transport.read_coils(0, count).await?;
            output_bits = Some(checked(bits, SourceArray::OutputBits, count)?);

            let count = self.map.output_word_count();
            let words = self.transport.read_holding_registers(0, count).await?;
            output_words = Some(checked(words, SourceArray::OutputWords, count)?);
        }

        let frame = RawFrame {
            input_bits: input_bits.as_deref(),
            input_words: input_words.as_deref(),
            output_bits: output_bits.as_deref(),
            output_words: output_words.as_deref(),
        };
        let decoded = self.map.decode(frame, self.mode)?;
        tracing::debug!("decoded full-map read, mode: {:?}", self.mode);
        Ok(decoded)
    }

    /// Encode a write request, batch it, and issue one write transaction
    /// per contiguous run, coils first, ascending start address.
    ///
    /// Nothing is written if encoding or batching fails.
    pub async fn transmit(&mut self, request: &ValueMap) -> Result<(), RequestError> {
        let batches = self.map.batch_writes(request)?;
        if let Some(coils) = &batches.coils {
            for (start, bits) in coils {
                tracing::debug!("writing {} coil(s) at address {}", bits.len(), start);
                self.transport.write_coils(*start, bits).await?;
            }
        }
        if let Some(registers) = &batches.registers {
            for (start, words) in registers {
                tracing::debug!("writing {} register(s) at address {}", words.len(), start);
                self.transport.write_registers(*start, words).await?;
            }
        }
        Ok(())
    }
}

fn checked<V>(data: Vec<V>, source: SourceArray, requested: u16) -> Result<Vec<V>, RequestError> {
    if data.len() < requested as usize {
        tracing::warn!(
            "transport returned {} element(s) of {} where {} were requested",
            data.len(),
            source,
            requested
        );
        return Err(RequestError::ShortResponse {
            source,
            requested,
            received: data.len(),
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteError;
    use crate::map::MapBlocks;
    use crate::types::Value;

    #[derive(Debug, Clone, PartialEq)]
    enum WriteOp {
        Coils(u16, Vec<bool>),
        Registers(u16, Vec<u16>),
    }

    /// In-memory device image; reads slice the arrays, writes are recorded.
    #[derive(Default)]
    struct MockTransport {
        discrete_inputs: Vec<bool>,
        input_registers: Vec<u16>,
        coils: Vec<bool>,
        holding_registers: Vec<u16>,
        writes: Vec<WriteOp>,
    }

    fn window<V: Copy>(data: &[V], start: u16, count: u16) -> Vec<V> {
        let start = start as usize;
        let end = (start + count as usize).min(data.len());
        data.get(start..end).unwrap_or_default().to_vec()
    }

    impl Transport for MockTransport {
        async fn read_coils(&mut self, start: u16, count: u16) -> Result<Vec<bool>, RequestError> {
            Ok(window(&self.coils, start, count))
        }

        async fn read_discrete_inputs(
            &mut self,
            start: u16,
            count: u16,
        ) -> Result<Vec<bool>, RequestError> {
            Ok(window(&self.discrete_inputs, start, count))
        }

        async fn read_holding_registers(
            &mut self,
            start: u16,
            count: u16,
        ) -> Result<Vec<u16>, RequestError> {
            Ok(window(&self.holding_registers, start, count))
        }

        async fn read_input_registers(
            &mut self,
            start: u16,
            count: u16,
        ) -> Result<Vec<u16>, RequestError> {
            Ok(window(&self.input_registers, start, count))
        }

        async fn write_coils(&mut self, start: u16, bits: &[bool]) -> Result<(), RequestError> {
            self.writes.push(WriteOp::Coils(start, bits.to_vec()));
            Ok(())
        }

        async fn write_registers(&mut self, start: u16, words: &[u16]) -> Result<(), RequestError> {
            self.writes.push(WriteOp::Registers(start, words.to_vec()));
            Ok(())
        }
    }

    fn map() -> RegisterMap {
        RegisterMap::parse(&MapBlocks {
            input_bits: "0 running BOOL\n".to_string(),
            input_registers: "0 speed UNSIGN_16\n".to_string(),
            coils: "0 enable BOOL\n1 reset BOOL\n".to_string(),
            holding_registers: "0 setpoint SIGN_16\n1 gain FLOAT_BE\n".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn receive_reads_and_decodes_both_halves() {
        let transport = MockTransport {
            discrete_inputs: vec![true],
            input_registers: vec![1500],
            coils: vec![true, false],
            holding_registers: vec![0xFFFB, 0x3F80, 0x0000],
            ..MockTransport::default()
        };
        let mut device = Device::new(map(), transport, ReadMode::All);
        let decoded = device.receive().await.unwrap();
        let inputs = decoded.inputs.unwrap();
        let outputs = decoded.outputs.unwrap();
        assert_eq!(inputs["running"], Value::Bool(true));
        assert_eq!(inputs["speed"], Value::UInt(1500));
        assert_eq!(outputs["enable"], Value::Bool(true));
        assert_eq!(outputs["setpoint"], Value::Int(-5));
        assert_eq!(outputs["gain"], Value::Float(1.0));
    }

    #[tokio::test]
    async fn receive_inputs_only_skips_the_output_arrays() {
        let transport = MockTransport {
            discrete_inputs: vec![false],
            input_registers: vec![42],
            ..MockTransport::default()
        };
        let mut device = Device::new(map(), transport, ReadMode::Inputs);
        let decoded = device.receive().await.unwrap();
        assert!(decoded.inputs.is_some());
        assert!(decoded.outputs.is_none());
    }

    #[tokio::test]
    async fn short_read_surfaces_as_short_response() {
        let transport = MockTransport {
            discrete_inputs: vec![true],
            input_registers: vec![], // speed missing
            ..MockTransport::default()
        };
        let mut device = Device::new(map(), transport, ReadMode::Inputs);
        let err = device.receive().await.unwrap_err();
        assert_eq!(
            err,
            RequestError::ShortResponse {
                source: SourceArray::InputWords,
                requested: 1,
                received: 0,
            }
        );
    }

    #[tokio::test]
    async fn transmit_issues_one_write_per_run() {
        let mut device = Device::new(map(), MockTransport::default(), ReadMode::All);
        let request: ValueMap = [
            ("enable".to_string(), Value::Bool(true)),
            ("reset".to_string(), Value::Bool(false)),
            ("setpoint".to_string(), Value::Int(-1)),
            ("gain".to_string(), Value::Float(1.0)),
        ]
        .into_iter()
        .collect();
        device.transmit(&request).await.unwrap();
        assert_eq!(
            device.transport().writes,
            vec![
                WriteOp::Coils(0, vec![true, false]),
                WriteOp::Registers(0, vec![0xFFFF, 0x3F80, 0x0000]),
            ]
        );
    }

    #[tokio::test]
    async fn failed_batching_writes_nothing() {
        let mut device = Device::new(map(), MockTransport::default(), ReadMode::All);
        let request: ValueMap = [
            ("enable".to_string(), Value::Bool(true)),
            ("missing".to_string(), Value::Bool(true)),
        ]
        .into_iter()
        .collect();
        let err = device.transmit(&request).await.unwrap_err();
        assert_eq!(
            err,
            RequestError::Write(WriteError::UnknownKeys(vec!["missing".to_string()]))
        );
        assert!(device.transport().writes.is_empty());
    }
}
