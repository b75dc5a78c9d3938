//! Command line demo for the `modmap` register-map codec.
//!
//! Runs reads and writes against an in-memory simulated device so the
//! full parse/decode/batch pipeline can be exercised without a PLC on
//! the network.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use modmap::error::{MapParseError, RequestError};
use modmap::{Device, MapBlocks, ReadMode, RegisterMap, Transport, Value, ValueMap};

#[derive(Debug, thiserror::Error)]
enum ClientError {
    #[error("unknown section '[{0}]' in map file")]
    BadSection(String),
    #[error("line before any section header: '{0}'")]
    LineOutsideSection(String),
    #[error("invalid assignment '{0}', expected key=value")]
    BadAssignment(String),
    #[error("'{0}' is not a bool, integer or float")]
    BadValue(String),
    #[error("map error: {0}")]
    Map(#[from] MapParseError),
    #[error("request error: {0}")]
    Request(#[from] RequestError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(about = "Exercise a register map against a simulated device")]
struct Cli {
    /// Register map file; four [section] blocks of `<address> <key> <TYPE>` lines
    #[arg(long)]
    map: Option<PathBuf>,
    /// Which halves of the map a read covers
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    All,
    Inputs,
    Outputs,
}

impl From<Mode> for ReadMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => ReadMode::All,
            Mode::Inputs => ReadMode::Inputs,
            Mode::Outputs => ReadMode::Outputs,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Read the device and print the decoded values
    Read,
    /// Write `key=value` pairs, then read back the output half
    Write {
        /// assignments like `enable=true setpoint=-10 gain=3.14`
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

/// In-memory device image backing the demo.
struct SimTransport {
    discrete_inputs: Vec<bool>,
    input_registers: Vec<u16>,
    coils: Vec<bool>,
    holding_registers: Vec<u16>,
}

impl SimTransport {
    /// Size the arrays from the map's aggregate counts and seed the
    /// input side with some plausible process data.
    fn new(map: &RegisterMap) -> Self {
        let mut sim = Self {
            discrete_inputs: vec![false; map.input_bit_count() as usize],
            input_registers: vec![0; map.input_word_count() as usize],
            coils: vec![false; map.output_bit_count() as usize],
            holding_registers: vec![0; map.output_word_count() as usize],
        };
        if let Some(first) = sim.discrete_inputs.first_mut() {
            *first = true;
        }
        // 21.5f32, high word first
        if sim.input_registers.len() >= 2 {
            sim.input_registers[0] = 0x41AC;
            sim.input_registers[1] = 0x0000;
        }
        sim
    }
}

impl Transport for SimTransport {
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
        store(&mut self.coils, start, bits, false);
        Ok(())
    }

    async fn write_registers(&mut self, start: u16, words: &[u16]) -> Result<(), RequestError> {
        store(&mut self.holding_registers, start, words, 0);
        Ok(())
    }
}

fn window<V: Copy>(data: &[V], start: u16, count: u16) -> Vec<V> {
    let start = start as usize;
    let end = (start + count as usize).min(data.len());
    data.get(start..end).unwrap_or_default().to_vec()
}

fn store<V: Copy>(data: &mut Vec<V>, start: u16, values: &[V], fill: V) {
    let start = start as usize;
    let end = start + values.len();
    if data.len() < end {
        data.resize(end, fill);
    }
    data[start..end].copy_from_slice(values);
}

/// The map used when no `--map` file is given.
fn demo_blocks() -> MapBlocks {
    MapBlocks {
        input_bits: "0 statusBit0 BOOL\n1 statusBit1 BOOL\n".to_string(),
        input_registers: "0 sensor0 FLOAT_BE\n2 sensor1 SIGN_16\n".to_string(),
        coils: "0 varBit0 BOOL\n1 varBit1 BOOL\n2 varBit2 BOOL\n3 varBit3 BOOL\n".to_string(),
        holding_registers: "0 varReg0 UNSIGN_16\n\
                            1 varReg1 SIGN_16\n\
                            2 varReg2 FLOAT_BE\n\
                            4 varReg3 SIGN_32\n\
                            6 varReg4 SIGN_16\n\
                            7 varReg5 UNSIGN_64\n"
            .to_string(),
    }
}

fn load_blocks(path: &Path) -> Result<MapBlocks, ClientError> {
    #[derive(Clone, Copy)]
    enum Section {
        InputBits,
        InputRegisters,
        Coils,
        HoldingRegisters,
    }

    let text = std::fs::read_to_string(path)?;
    let mut blocks = MapBlocks::default();
    let mut section = None;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section = Some(match name {
                "input_bits" => Section::InputBits,
                "input_registers" => Section::InputRegisters,
                "coils" => Section::Coils,
                "holding_registers" => Section::HoldingRegisters,
                _ => return Err(ClientError::BadSection(name.to_string())),
            });
            continue;
        }
        let Some(section) = section else {
            return Err(ClientError::LineOutsideSection(line.to_string()));
        };
        let target = match section {
            Section::InputBits => &mut blocks.input_bits,
            Section::InputRegisters => &mut blocks.input_registers,
            Section::Coils => &mut blocks.coils,
            Section::HoldingRegisters => &mut blocks.holding_registers,
        };
        target.push_str(line);
        target.push('\n');
    }
    Ok(blocks)
}

fn parse_assignment(text: &str) -> Result<(String, Value), ClientError> {
    let (key, raw) = text
        .split_once('=')
        .ok_or_else(|| ClientError::BadAssignment(text.to_string()))?;
    let value = if let Ok(x) = raw.parse::<bool>() {
        Value::Bool(x)
    } else if let Ok(x) = raw.parse::<i64>() {
        Value::Int(x)
    } else if let Ok(x) = raw.parse::<u64>() {
        Value::UInt(x)
    } else if let Ok(x) = raw.parse::<f64>() {
        Value::Float(x)
    } else {
        return Err(ClientError::BadValue(raw.to_string()));
    };
    Ok((key.to_string(), value))
}

fn print_values(label: &str, values: &ValueMap) {
    println!("{label}:");
    for (key, value) in values {
        println!("  {key} = {value}");
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    if let Err(ref e) = run().await {
        println!("error: {e}");
    }

    Ok(())
}

async fn run() -> Result<(), ClientError> {
    let cli = Cli::parse();

    let blocks = match &cli.map {
        Some(path) => load_blocks(path)?,
        None => demo_blocks(),
    };
    let map = RegisterMap::parse(&blocks)?;
    tracing::info!(
        "map loaded: {} input / {} output entries",
        map.inputs().len(),
        map.outputs().len()
    );

    let transport = SimTransport::new(&map);
    let mut device = Device::new(map, transport, cli.mode.into());

    match &cli.command {
        Command::Read => {
            let decoded = device.receive().await?;
            if let Some(inputs) = &decoded.inputs {
                print_values("inputs", inputs);
            }
            if let Some(outputs) = &decoded.outputs {
                print_values("outputs", outputs);
            }
        }
        Command::Write { assignments } => {
            let request: ValueMap = assignments
                .iter()
                .map(|a| parse_assignment(a))
                .collect::<Result<_, _>>()?;
            device.transmit(&request).await?;
            tracing::info!("wrote {} value(s)", request.len());
            let decoded = device.receive().await?;
            if let Some(outputs) = &decoded.outputs {
                print_values("outputs after write", outputs);
            }
        }
    }
    Ok(())
}
