//! Transaction payloads and output payloads
//!
//! The transaction type byte selects the payload layout; the output type
//! byte selects the output payload layout. Both are closed enums.

use serde::{Deserialize, Serialize};

use super::amount::Fixed64;
use super::serialize::{CodecError, Decodable, Encodable, Reader, Writer};
use crate::crypto::{Hash256, ProgramHash};

// =============================================================================
// Transaction Types
// =============================================================================

pub const TX_COINBASE: u8 = 0x00;
pub const TX_REGISTER_ASSET: u8 = 0x01;
pub const TX_TRANSFER_ASSET: u8 = 0x02;
pub const TX_RECORD: u8 = 0x03;
pub const TX_SIDECHAIN_POW: u8 = 0x05;
pub const TX_WITHDRAW_FROM_SIDECHAIN: u8 = 0x07;
pub const TX_TRANSFER_CROSS_CHAIN_ASSET: u8 = 0x08;
pub const TX_REGISTER_PRODUCER: u8 = 0x09;
pub const TX_CANCEL_PRODUCER: u8 = 0x0a;
pub const TX_UPDATE_PRODUCER: u8 = 0x0b;

/// An issued asset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Asset {
    pub name: String,
    pub description: String,
    pub precision: u8,
    pub asset_type: u8,
    pub record_type: u8,
}

impl Encodable for Asset {
    fn encode(&self, writer: &mut Writer) {
        writer.write_var_string(&self.name);
        writer.write_var_string(&self.description);
        writer.write_u8(self.precision);
        writer.write_u8(self.asset_type);
        writer.write_u8(self.record_type);
    }
}

impl Decodable for Asset {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            name: reader.read_var_string()?,
            description: reader.read_var_string()?,
            precision: reader.read_u8()?,
            asset_type: reader.read_u8()?,
            record_type: reader.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAsset {
    pub asset: Asset,
    pub amount: Fixed64,
    pub controller: ProgramHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub record_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideChainPow {
    pub side_block_hash: Hash256,
    pub side_genesis_hash: Hash256,
    pub block_height: u32,
    pub signed_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawFromSideChain {
    pub block_height: u32,
    pub genesis_block_address: String,
    pub side_chain_tx_hashes: Vec<Hash256>,
}

/// Parallel lists: entry `i` sends `amounts[i]` of output `output_indexes[i]`
/// to `addresses[i]` on the main chain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferCrossChainAsset {
    pub addresses: Vec<String>,
    pub output_indexes: Vec<u64>,
    pub amounts: Vec<Fixed64>,
}

/// Producer registration; also the layout of an update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProducerPayload {
    pub owner_public_key: Vec<u8>,
    pub node_public_key: Vec<u8>,
    pub nickname: String,
    pub url: String,
    pub location: u64,
    pub net_address: String,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelProducer {
    pub owner_public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Type-specific transaction body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    CoinBase { data: Vec<u8> },
    RegisterAsset(RegisterAsset),
    TransferAsset,
    Record(Record),
    SideChainPow(SideChainPow),
    WithdrawFromSideChain(WithdrawFromSideChain),
    TransferCrossChainAsset(TransferCrossChainAsset),
    RegisterProducer(ProducerPayload),
    CancelProducer(CancelProducer),
    UpdateProducer(ProducerPayload),
}

impl Payload {
    /// The transaction type byte this payload belongs to
    pub fn tx_type(&self) -> u8 {
        match self {
            Payload::CoinBase { .. } => TX_COINBASE,
            Payload::RegisterAsset(_) => TX_REGISTER_ASSET,
            Payload::TransferAsset => TX_TRANSFER_ASSET,
            Payload::Record(_) => TX_RECORD,
            Payload::SideChainPow(_) => TX_SIDECHAIN_POW,
            Payload::WithdrawFromSideChain(_) => TX_WITHDRAW_FROM_SIDECHAIN,
            Payload::TransferCrossChainAsset(_) => TX_TRANSFER_CROSS_CHAIN_ASSET,
            Payload::RegisterProducer(_) => TX_REGISTER_PRODUCER,
            Payload::CancelProducer(_) => TX_CANCEL_PRODUCER,
            Payload::UpdateProducer(_) => TX_UPDATE_PRODUCER,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::CoinBase { .. } => "CoinBase",
            Payload::RegisterAsset(_) => "RegisterAsset",
            Payload::TransferAsset => "TransferAsset",
            Payload::Record(_) => "Record",
            Payload::SideChainPow(_) => "SideChainPow",
            Payload::WithdrawFromSideChain(_) => "WithdrawFromSideChain",
            Payload::TransferCrossChainAsset(_) => "TransferCrossChainAsset",
            Payload::RegisterProducer(_) => "RegisterProducer",
            Payload::CancelProducer(_) => "CancelProducer",
            Payload::UpdateProducer(_) => "UpdateProducer",
        }
    }

    pub fn encode(&self, writer: &mut Writer) {
        match self {
            Payload::CoinBase { data } => writer.write_var_bytes(data),
            Payload::RegisterAsset(p) => {
                p.asset.encode(writer);
                writer.write_i64(p.amount.sela());
                writer.write_program_hash(&p.controller);
            }
            Payload::TransferAsset => {}
            Payload::Record(p) => {
                writer.write_var_string(&p.record_type);
                writer.write_var_bytes(&p.data);
            }
            Payload::SideChainPow(p) => {
                writer.write_hash(&p.side_block_hash);
                writer.write_hash(&p.side_genesis_hash);
                writer.write_u32(p.block_height);
                writer.write_var_bytes(&p.signed_data);
            }
            Payload::WithdrawFromSideChain(p) => {
                writer.write_u32(p.block_height);
                writer.write_var_string(&p.genesis_block_address);
                writer.write_list(&p.side_chain_tx_hashes);
            }
            Payload::TransferCrossChainAsset(p) => {
                writer.write_varint(p.addresses.len() as u64);
                for (i, address) in p.addresses.iter().enumerate() {
                    writer.write_var_string(address);
                    writer.write_varint(p.output_indexes.get(i).copied().unwrap_or_default());
                    writer.write_i64(p.amounts.get(i).copied().unwrap_or_default().sela());
                }
            }
            Payload::RegisterProducer(p) | Payload::UpdateProducer(p) => {
                writer.write_var_bytes(&p.owner_public_key);
                writer.write_var_bytes(&p.node_public_key);
                writer.write_var_string(&p.nickname);
                writer.write_var_string(&p.url);
                writer.write_u64(p.location);
                writer.write_var_string(&p.net_address);
                writer.write_var_bytes(&p.signature);
            }
            Payload::CancelProducer(p) => {
                writer.write_var_bytes(&p.owner_public_key);
                writer.write_var_bytes(&p.signature);
            }
        }
    }

    pub fn decode(tx_type: u8, reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let payload = match tx_type {
            TX_COINBASE => Payload::CoinBase {
                data: reader.read_var_bytes()?,
            },
            TX_REGISTER_ASSET => Payload::RegisterAsset(RegisterAsset {
                asset: Asset::decode(reader)?,
                amount: Fixed64(reader.read_i64()?),
                controller: reader.read_program_hash()?,
            }),
            TX_TRANSFER_ASSET => Payload::TransferAsset,
            TX_RECORD => Payload::Record(Record {
                record_type: reader.read_var_string()?,
                data: reader.read_var_bytes()?,
            }),
            TX_SIDECHAIN_POW => Payload::SideChainPow(SideChainPow {
                side_block_hash: reader.read_hash()?,
                side_genesis_hash: reader.read_hash()?,
                block_height: reader.read_u32()?,
                signed_data: reader.read_var_bytes()?,
            }),
            TX_WITHDRAW_FROM_SIDECHAIN => Payload::WithdrawFromSideChain(WithdrawFromSideChain {
                block_height: reader.read_u32()?,
                genesis_block_address: reader.read_var_string()?,
                side_chain_tx_hashes: reader.read_list()?,
            }),
            TX_TRANSFER_CROSS_CHAIN_ASSET => {
                let count = reader.read_varint()?;
                if count > reader.remaining() as u64 {
                    return Err(CodecError::UnexpectedEnd);
                }
                let mut transfer = TransferCrossChainAsset::default();
                for _ in 0..count {
                    transfer.addresses.push(reader.read_var_string()?);
                    transfer.output_indexes.push(reader.read_varint()?);
                    transfer.amounts.push(Fixed64(reader.read_i64()?));
                }
                Payload::TransferCrossChainAsset(transfer)
            }
            TX_REGISTER_PRODUCER => Payload::RegisterProducer(decode_producer(reader)?),
            TX_CANCEL_PRODUCER => Payload::CancelProducer(CancelProducer {
                owner_public_key: reader.read_var_bytes()?,
                signature: reader.read_var_bytes()?,
            }),
            TX_UPDATE_PRODUCER => Payload::UpdateProducer(decode_producer(reader)?),
            other => return Err(CodecError::UnknownTxType(other)),
        };
        Ok(payload)
    }
}

fn decode_producer(reader: &mut Reader<'_>) -> Result<ProducerPayload, CodecError> {
    Ok(ProducerPayload {
        owner_public_key: reader.read_var_bytes()?,
        node_public_key: reader.read_var_bytes()?,
        nickname: reader.read_var_string()?,
        url: reader.read_var_string()?,
        location: reader.read_u64()?,
        net_address: reader.read_var_string()?,
        signature: reader.read_var_bytes()?,
    })
}

// =============================================================================
// Output Payloads
// =============================================================================

/// Output type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputType {
    #[default]
    Default,
    Vote,
}

impl OutputType {
    pub fn as_u8(self) -> u8 {
        match self {
            OutputType::Default => 0x00,
            OutputType::Vote => 0x01,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, CodecError> {
        match value {
            0x00 => Ok(OutputType::Default),
            0x01 => Ok(OutputType::Vote),
            other => Err(CodecError::UnknownOutputType(other)),
        }
    }
}

/// One vote category and its candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteContent {
    pub vote_type: u8,
    pub candidates: Vec<Vec<u8>>,
}

impl Encodable for VoteContent {
    fn encode(&self, writer: &mut Writer) {
        writer.write_u8(self.vote_type);
        writer.write_list(&self.candidates);
    }
}

impl Decodable for VoteContent {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            vote_type: reader.read_u8()?,
            candidates: reader.read_list()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutput {
    pub version: u8,
    pub contents: Vec<VoteContent>,
}

/// Type-specific output body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputPayload {
    #[default]
    Default,
    Vote(VoteOutput),
}

impl OutputPayload {
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputPayload::Default => OutputType::Default,
            OutputPayload::Vote(_) => OutputType::Vote,
        }
    }

    pub fn encode(&self, writer: &mut Writer) {
        match self {
            OutputPayload::Default => {}
            OutputPayload::Vote(vote) => {
                writer.write_u8(vote.version);
                writer.write_list(&vote.contents);
            }
        }
    }

    pub fn decode(output_type: OutputType, reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match output_type {
            OutputType::Default => Ok(OutputPayload::Default),
            OutputType::Vote => Ok(OutputPayload::Vote(VoteOutput {
                version: reader.read_u8()?,
                contents: reader.read_list()?,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(payload: &Payload) -> Payload {
        let mut writer = Writer::new();
        payload.encode(&mut writer);
        let bytes = writer.into_inner();
        let mut reader = Reader::new(&bytes);
        let decoded = Payload::decode(payload.tx_type(), &mut reader).unwrap();
        assert!(reader.is_finished());
        decoded
    }

    #[test]
    fn test_producer_payload_layout() {
        let payload = Payload::RegisterProducer(ProducerPayload {
            owner_public_key: vec![2; 33],
            node_public_key: vec![3; 33],
            nickname: "node-a".to_string(),
            url: "https://a.example".to_string(),
            location: 86,
            net_address: "127.0.0.1:20338".to_string(),
            signature: vec![9; 64],
        });
        assert_eq!(round_trip(&payload), payload);
        assert_eq!(payload.tx_type(), TX_REGISTER_PRODUCER);
    }

    #[test]
    fn test_cross_chain_transfer() {
        let payload = Payload::TransferCrossChainAsset(TransferCrossChainAsset {
            addresses: vec!["EXa".into(), "EXb".into()],
            output_indexes: vec![0, 1],
            amounts: vec![Fixed64(10), Fixed64(20)],
        });
        assert_eq!(round_trip(&payload), payload);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut reader = Reader::new(&[]);
        assert_eq!(
            Payload::decode(0x04, &mut reader),
            Err(CodecError::UnknownTxType(0x04))
        );
    }

    #[test]
    fn test_vote_output_payload() {
        let payload = OutputPayload::Vote(VoteOutput {
            version: 0,
            contents: vec![VoteContent {
                vote_type: 0,
                candidates: vec![vec![2; 33], vec![3; 33]],
            }],
        });
        let mut writer = Writer::new();
        payload.encode(&mut writer);
        let bytes = writer.into_inner();

        let decoded = OutputPayload::decode(OutputType::Vote, &mut Reader::new(&bytes)).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded.output_type(), OutputType::Vote);
        assert_eq!(OutputType::from_u8(2), Err(CodecError::UnknownOutputType(2)));
    }
}
