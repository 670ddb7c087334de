//! Transaction model for the sidechain
//!
//! Implements the versioned UTXO transaction layout:
//! - Pre-0.9 transactions start directly with the type byte
//! - 0.9+ transactions carry a leading version byte and typed outputs
//! - The hash covers everything except the signing programs

use super::amount::Fixed64;
use super::payload::{OutputPayload, OutputType, Payload};
use super::serialize::{CodecError, Decodable, Encodable, Reader, Writer};
use crate::crypto::{double_sha256, Hash256, ProgramHash};

// =============================================================================
// Constants
// =============================================================================

/// First version with typed outputs
pub const TX_VERSION_09: u8 = 0x09;

/// Version of pre-0.9 transactions
pub const TX_VERSION_DEFAULT: u8 = 0x00;

/// Attribute usage carrying a free-form nonce
pub const ATTRIBUTE_NONCE: u8 = 0x00;

/// Sequence number of a final input
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

// =============================================================================
// Transaction Input
// =============================================================================

/// Reference to a previous output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub tx_id: Hash256,
    pub index: u16,
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

impl Encodable for Input {
    fn encode(&self, writer: &mut Writer) {
        writer.write_hash(&self.previous.tx_id);
        writer.write_u16(self.previous.index);
        writer.write_u32(self.sequence);
    }
}

impl Decodable for Input {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            previous: OutPoint {
                tx_id: reader.read_hash()?,
                index: reader.read_u16()?,
            },
            sequence: reader.read_u32()?,
        })
    }
}

// =============================================================================
// Transaction Output
// =============================================================================

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub asset_id: Hash256,
    pub value: Fixed64,
    /// Height before which the output cannot be spent
    pub output_lock: u32,
    pub program_hash: ProgramHash,
    pub output_type: OutputType,
    pub output_payload: OutputPayload,
}

impl Output {
    /// Plain value transfer to a program hash
    pub fn new(asset_id: Hash256, value: Fixed64, program_hash: ProgramHash) -> Self {
        Self {
            asset_id,
            value,
            output_lock: 0,
            program_hash,
            output_type: OutputType::Default,
            output_payload: OutputPayload::Default,
        }
    }

    fn encode_with_version(&self, version: u8, writer: &mut Writer) {
        writer.write_hash(&self.asset_id);
        writer.write_i64(self.value.sela());
        writer.write_u32(self.output_lock);
        writer.write_program_hash(&self.program_hash);
        if version >= TX_VERSION_09 {
            writer.write_u8(self.output_type.as_u8());
            self.output_payload.encode(writer);
        }
    }

    fn decode_with_version(version: u8, reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let asset_id = reader.read_hash()?;
        let value = Fixed64(reader.read_i64()?);
        let output_lock = reader.read_u32()?;
        let program_hash = reader.read_program_hash()?;

        let (output_type, output_payload) = if version >= TX_VERSION_09 {
            let output_type = OutputType::from_u8(reader.read_u8()?)?;
            (output_type, OutputPayload::decode(output_type, reader)?)
        } else {
            (OutputType::Default, OutputPayload::Default)
        };

        Ok(Self {
            asset_id,
            value,
            output_lock,
            program_hash,
            output_type,
            output_payload,
        })
    }
}

// =============================================================================
// Attributes & Programs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

impl Encodable for Attribute {
    fn encode(&self, writer: &mut Writer) {
        writer.write_u8(self.usage);
        writer.write_var_bytes(&self.data);
    }
}

impl Decodable for Attribute {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            usage: reader.read_u8()?,
            data: reader.read_var_bytes()?,
        })
    }
}

/// Signing program: redeem code plus its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

impl Encodable for Program {
    fn encode(&self, writer: &mut Writer) {
        writer.write_var_bytes(&self.parameter);
        writer.write_var_bytes(&self.code);
    }
}

impl Decodable for Program {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let parameter = reader.read_var_bytes()?;
        let code = reader.read_var_bytes()?;
        Ok(Self { code, parameter })
    }
}

// =============================================================================
// Transaction
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u8,
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    pub programs: Vec<Program>,
}

impl Transaction {
    /// Coinbase paying each `(program hash, value)` in order
    pub fn coinbase(
        data: Vec<u8>,
        asset_id: Hash256,
        payouts: &[(ProgramHash, Fixed64)],
        lock_time: u32,
    ) -> Self {
        Self {
            version: TX_VERSION_09,
            payload_version: 0,
            payload: Payload::CoinBase { data },
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: payouts
                .iter()
                .map(|(program_hash, value)| Output::new(asset_id, *value, *program_hash))
                .collect(),
            lock_time,
            programs: Vec::new(),
        }
    }

    pub fn tx_type(&self) -> u8 {
        self.payload.tx_type()
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self.payload, Payload::CoinBase { .. })
    }

    /// Free-form coinbase data, if this is a coinbase
    pub fn coinbase_data(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::CoinBase { data } => Some(data),
            _ => None,
        }
    }

    /// Serialize everything except the programs
    pub fn encode_unsigned(&self, writer: &mut Writer) {
        if self.version >= TX_VERSION_09 {
            writer.write_u8(self.version);
        }
        writer.write_u8(self.tx_type());
        writer.write_u8(self.payload_version);
        self.payload.encode(writer);
        writer.write_list(&self.attributes);
        writer.write_list(&self.inputs);
        writer.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode_with_version(self.version, writer);
        }
        writer.write_u32(self.lock_time);
    }

    pub fn hash(&self) -> Hash256 {
        let mut writer = Writer::new();
        self.encode_unsigned(&mut writer);
        double_sha256(&writer.into_inner())
    }
}

impl Encodable for Transaction {
    fn encode(&self, writer: &mut Writer) {
        self.encode_unsigned(writer);
        writer.write_list(&self.programs);
    }
}

impl Decodable for Transaction {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let first = reader.read_u8()?;
        let (version, tx_type) = if first >= TX_VERSION_09 {
            (first, reader.read_u8()?)
        } else {
            (TX_VERSION_DEFAULT, first)
        };

        let payload_version = reader.read_u8()?;
        let payload = Payload::decode(tx_type, reader)?;
        let attributes = reader.read_list()?;
        let inputs = reader.read_list()?;

        let output_count = reader.read_varint()?;
        if output_count > reader.remaining() as u64 {
            return Err(CodecError::UnexpectedEnd);
        }
        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            outputs.push(Output::decode_with_version(version, reader)?);
        }

        let lock_time = reader.read_u32()?;
        let programs = reader.read_list()?;

        Ok(Self {
            version,
            payload_version,
            payload,
            attributes,
            inputs,
            outputs,
            lock_time,
            programs,
        })
    }
}
