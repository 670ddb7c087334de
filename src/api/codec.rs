//! Wire records for ledger entities
//!
//! Pure conversions from transactions, blocks and payloads into the JSON
//! shapes returned by the command surface. Hashes are always rendered in
//! wire format.

use serde::Serialize;

use crate::core::payload::ProducerPayload;
use crate::core::{
    difficulty_string, Asset, Block, Encodable, Fixed64, Header, OutputPayload, Payload,
    Transaction,
};
use crate::crypto::Hash256;

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputInfo {
    pub txid: String,
    pub vout: u16,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputInfo {
    pub value: String,
    pub n: u32,
    pub address: String,
    pub assetid: String,
    pub outputlock: u32,
    #[serde(rename = "type")]
    pub output_type: u8,
    pub payload: OutputPayloadInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeInfo {
    pub usage: u8,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramInfo {
    pub code: String,
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionInfo {
    pub txid: String,
    pub hash: String,
    pub size: u32,
    pub vsize: u32,
    pub version: u8,
    pub locktime: u32,
    pub vin: Vec<InputInfo>,
    pub vout: Vec<OutputInfo>,
    pub blockhash: String,
    pub confirmations: u32,
    pub time: u32,
    pub blocktime: u32,
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub payloadversion: u8,
    pub payload: Option<PayloadInfo>,
    pub attributes: Vec<AttributeInfo>,
    pub programs: Vec<ProgramInfo>,
}

/// Project a transaction; `header` is its containing block when committed
pub fn transaction_info(tx: &Transaction, header: Option<&Header>, best_height: u32) -> TransactionInfo {
    let vin = tx
        .inputs
        .iter()
        .map(|input| InputInfo {
            txid: input.previous.tx_id.to_wire(),
            vout: input.previous.index,
            sequence: input.sequence,
        })
        .collect();

    let vout = tx
        .outputs
        .iter()
        .enumerate()
        .map(|(n, output)| OutputInfo {
            value: output.value.to_string(),
            n: n as u32,
            address: output.program_hash.to_address(),
            assetid: output.asset_id.to_wire(),
            outputlock: output.output_lock,
            output_type: output.output_type.as_u8(),
            payload: output_payload_info(&output.output_payload),
        })
        .collect();

    let attributes = tx
        .attributes
        .iter()
        .map(|attr| AttributeInfo {
            usage: attr.usage,
            data: hex::encode(&attr.data),
        })
        .collect();

    let programs = tx
        .programs
        .iter()
        .map(|program| ProgramInfo {
            code: hex::encode(&program.code),
            parameter: hex::encode(&program.parameter),
        })
        .collect();

    let (blockhash, confirmations, time) = match header {
        Some(header) => (
            header.hash().to_wire(),
            confirmations(best_height, header.height),
            header.timestamp,
        ),
        None => (String::new(), 0, 0),
    };

    let hash = tx.hash().to_wire();
    let size = tx.encoded_size() as u32;
    TransactionInfo {
        txid: hash.clone(),
        hash,
        size,
        vsize: size,
        version: tx.version,
        locktime: tx.lock_time,
        vin,
        vout,
        blockhash,
        confirmations,
        time,
        blocktime: time,
        tx_type: tx.tx_type(),
        payloadversion: tx.payload_version,
        payload: payload_info(&tx.payload),
        attributes,
        programs,
    }
}

fn confirmations(best_height: u32, height: u32) -> u32 {
    best_height.saturating_sub(height) + 1
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinbaseInfo {
    pub coinbasedata: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterAssetInfo {
    pub asset: Asset,
    pub amount: String,
    pub controller: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideChainPowInfo {
    pub sideblockhash: String,
    pub sidegenesishash: String,
    pub blockheight: u32,
    pub signeddata: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawFromSideChainInfo {
    pub blockheight: u32,
    pub genesisblockaddress: String,
    pub sidechaintransactionhashes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferCrossChainAssetInfo {
    pub crosschainaddresses: Vec<String>,
    pub outputindexes: Vec<u64>,
    pub crosschainamounts: Vec<Fixed64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerInfo {
    pub ownerpublickey: String,
    pub nodepublickey: String,
    pub nickname: String,
    pub url: String,
    pub location: u64,
    pub netaddress: String,
    pub signature: String,
}

impl From<&ProducerPayload> for ProducerInfo {
    fn from(p: &ProducerPayload) -> Self {
        Self {
            ownerpublickey: hex::encode(&p.owner_public_key),
            nodepublickey: hex::encode(&p.node_public_key),
            nickname: p.nickname.clone(),
            url: p.url.clone(),
            location: p.location,
            netaddress: p.net_address.clone(),
            signature: hex::encode(&p.signature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelProducerInfo {
    pub ownerpublickey: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadInfo {
    CoinBase(CoinbaseInfo),
    RegisterAsset(RegisterAssetInfo),
    SideChainPow(SideChainPowInfo),
    WithdrawFromSideChain(WithdrawFromSideChainInfo),
    TransferCrossChainAsset(TransferCrossChainAssetInfo),
    RegisterProducer(ProducerInfo),
    CancelProducer(CancelProducerInfo),
    UpdateProducer(ProducerInfo),
}

/// Payload record; transfers and records carry none
pub fn payload_info(payload: &Payload) -> Option<PayloadInfo> {
    let info = match payload {
        Payload::CoinBase { data } => PayloadInfo::CoinBase(CoinbaseInfo {
            coinbasedata: String::from_utf8_lossy(data).into_owned(),
        }),
        Payload::RegisterAsset(p) => {
            let mut controller = p.controller.as_bytes().to_vec();
            controller.reverse();
            PayloadInfo::RegisterAsset(RegisterAssetInfo {
                asset: p.asset.clone(),
                amount: p.amount.to_string(),
                controller: hex::encode(controller),
            })
        }
        Payload::SideChainPow(p) => PayloadInfo::SideChainPow(SideChainPowInfo {
            sideblockhash: p.side_block_hash.to_wire(),
            sidegenesishash: p.side_genesis_hash.to_wire(),
            blockheight: p.block_height,
            signeddata: hex::encode(&p.signed_data),
        }),
        Payload::WithdrawFromSideChain(p) => {
            PayloadInfo::WithdrawFromSideChain(WithdrawFromSideChainInfo {
                blockheight: p.block_height,
                genesisblockaddress: p.genesis_block_address.clone(),
                sidechaintransactionhashes: p
                    .side_chain_tx_hashes
                    .iter()
                    .map(Hash256::to_wire)
                    .collect(),
            })
        }
        Payload::TransferCrossChainAsset(p) => {
            PayloadInfo::TransferCrossChainAsset(TransferCrossChainAssetInfo {
                crosschainaddresses: p.addresses.clone(),
                outputindexes: p.output_indexes.clone(),
                crosschainamounts: p.amounts.clone(),
            })
        }
        Payload::RegisterProducer(p) => PayloadInfo::RegisterProducer(p.into()),
        Payload::CancelProducer(p) => PayloadInfo::CancelProducer(CancelProducerInfo {
            ownerpublickey: hex::encode(&p.owner_public_key),
            signature: hex::encode(&p.signature),
        }),
        Payload::UpdateProducer(p) => PayloadInfo::UpdateProducer(p.into()),
        Payload::TransferAsset | Payload::Record(_) => return None,
    };
    Some(info)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultOutputInfo {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteContentInfo {
    pub votetype: u8,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteOutputInfo {
    pub version: u8,
    pub contents: Vec<VoteContentInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputPayloadInfo {
    Default(DefaultOutputInfo),
    Vote(VoteOutputInfo),
}

pub fn output_payload_info(payload: &OutputPayload) -> OutputPayloadInfo {
    match payload {
        OutputPayload::Default => OutputPayloadInfo::Default(DefaultOutputInfo {}),
        OutputPayload::Vote(vote) => OutputPayloadInfo::Vote(VoteOutputInfo {
            version: vote.version,
            contents: vote
                .contents
                .iter()
                .map(|content| VoteContentInfo {
                    votetype: content.vote_type,
                    candidates: content.candidates.iter().map(hex::encode).collect(),
                })
                .collect(),
        }),
    }
}

// =============================================================================
// Blocks
// =============================================================================

/// Chain facts a block record depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    pub best_height: u32,
    /// Hash of the block one above, when it exists
    pub next_hash: Option<Hash256>,
    pub pow_limit_bits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockTxs {
    Hashes(Vec<String>),
    Full(Vec<TransactionInfo>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInfo {
    pub hash: String,
    pub confirmations: u32,
    pub strippedsize: u32,
    pub size: u32,
    pub weight: u32,
    pub height: u32,
    pub version: u32,
    pub versionhex: String,
    pub merkleroot: String,
    pub tx: BlockTxs,
    pub time: u32,
    pub mediantime: u32,
    pub nonce: u32,
    pub bits: u32,
    pub difficulty: String,
    pub chainwork: String,
    pub previousblockhash: String,
    pub nextblockhash: String,
    pub auxpow: String,
    pub minerinfo: String,
}

/// Project a block; `verbose` embeds full transaction records
pub fn block_info(block: &Block, ctx: &BlockContext, verbose: bool) -> BlockInfo {
    let header = &block.header;
    let tx = if verbose {
        BlockTxs::Full(
            block
                .transactions
                .iter()
                .map(|tx| transaction_info(tx, Some(header), ctx.best_height))
                .collect(),
        )
    } else {
        BlockTxs::Hashes(
            block
                .transactions
                .iter()
                .map(|tx| tx.hash().to_wire())
                .collect(),
        )
    };

    let size = block.size() as u32;
    let chain_work = ctx.best_height.saturating_sub(header.height);
    let minerinfo = block
        .transactions
        .first()
        .and_then(Transaction::coinbase_data)
        .map(|data| String::from_utf8_lossy(data).into_owned())
        .unwrap_or_default();

    BlockInfo {
        hash: block.hash().to_wire(),
        confirmations: confirmations(ctx.best_height, header.height),
        strippedsize: size,
        size,
        weight: size * 4,
        height: header.height,
        version: header.version,
        versionhex: hex::encode(header.version.to_be_bytes()),
        merkleroot: header.merkle_root.to_wire(),
        tx,
        time: header.timestamp,
        mediantime: header.timestamp,
        nonce: header.nonce,
        bits: header.bits,
        difficulty: difficulty_string(ctx.pow_limit_bits, header.bits),
        chainwork: hex::encode(chain_work.to_be_bytes()),
        previousblockhash: header.previous.to_wire(),
        nextblockhash: ctx.next_hash.unwrap_or(Hash256::ZERO).to_wire(),
        auxpow: hex::encode(header.aux_pow.to_bytes()),
        minerinfo,
    }
}

/// Hashes of a block's transactions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockTransactions {
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Height")]
    pub height: u32,
    #[serde(rename = "Transactions")]
    pub transactions: Vec<String>,
}

pub fn block_transactions(block: &Block) -> BlockTransactions {
    BlockTransactions {
        hash: block.hash().to_wire(),
        height: block.height(),
        transactions: block
            .transactions
            .iter()
            .map(|tx| tx.hash().to_wire())
            .collect(),
    }
}

/// Hex of an entity's binary encoding
pub fn raw_hex<T: Encodable>(item: &T) -> String {
    hex::encode(item.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payload::{SideChainPow, WithdrawFromSideChain};
    use crate::core::{Output, POW_LIMIT_BITS};
    use crate::crypto::address::tests::test_public_key;
    use crate::crypto::ProgramHash;
    use crate::ledger::memory::tests::{test_miner, transfer, vote_output};
    use crate::ledger::{Ledger, MemoryChain};
    use serde_json::json;

    fn context(chain: &MemoryChain, height: u32) -> BlockContext {
        BlockContext {
            best_height: chain.best_height(),
            next_hash: chain.block_hash(height + 1).ok(),
            pow_limit_bits: POW_LIMIT_BITS,
        }
    }

    #[test]
    fn test_block_summary() {
        let chain = MemoryChain::devnet(test_miner());
        let block = chain.mine_block().unwrap();
        chain.mine_block().unwrap();

        let info = block_info(&block, &context(&chain, 1), false);
        assert_eq!(info.hash, block.hash().to_wire());
        assert_eq!(info.height, 1);
        assert_eq!(info.confirmations, 2);
        assert_eq!(info.weight, info.size * 4);
        assert_eq!(info.versionhex, "00000000");
        assert_eq!(info.chainwork, "00000001");
        assert_eq!(info.difficulty, "1");
        assert_eq!(info.minerinfo, "sidechain-rpc");
        assert_eq!(info.nextblockhash, chain.block_hash(2).unwrap().to_wire());
        assert_eq!(info.tx, BlockTxs::Hashes(vec![block.transactions[0].hash().to_wire()]));
    }

    #[test]
    fn test_tip_has_zero_next_hash() {
        let chain = MemoryChain::devnet(test_miner());
        let block = chain.mine_block().unwrap();
        let info = block_info(&block, &context(&chain, 1), true);

        assert_eq!(info.nextblockhash, Hash256::ZERO.to_wire());
        match info.tx {
            BlockTxs::Full(txs) => {
                assert_eq!(txs.len(), 1);
                assert_eq!(txs[0].blockhash, info.hash);
                assert_eq!(txs[0].confirmations, 1);
            }
            BlockTxs::Hashes(_) => panic!("expected full transactions"),
        }
    }

    #[test]
    fn test_transaction_without_block() {
        let chain = MemoryChain::devnet(test_miner());
        let owner = ProgramHash::standard(&test_public_key(1)).unwrap();
        let tx = transfer(
            vec![vote_output(&chain, owner, 500_000_000, test_public_key(2))],
            1,
        );
        let info = transaction_info(&tx, None, chain.best_height());

        assert_eq!(info.txid, tx.hash().to_wire());
        assert_eq!(info.hash, info.txid);
        assert_eq!(info.confirmations, 0);
        assert!(info.blockhash.is_empty());
        assert_eq!(info.size, info.vsize);
        assert_eq!(info.payload, None);

        let value = serde_json::to_value(&info.vout[0]).unwrap();
        assert_eq!(value["value"], json!("5"));
        assert_eq!(value["address"], json!(owner.to_address()));
        assert_eq!(value["type"], json!(1));
        assert_eq!(
            value["payload"],
            json!({"version": 0, "contents": [{"votetype": 0, "candidates": [hex::encode(test_public_key(2))]}]})
        );
    }

    #[test]
    fn test_default_output_payload_is_empty_object() {
        let output = Output::new(Hash256::ZERO, Fixed64(1), test_miner());
        assert_eq!(
            serde_json::to_value(output_payload_info(&output.output_payload)).unwrap(),
            json!({})
        );
    }

    #[test]
    fn test_payload_records() {
        let chain = MemoryChain::devnet(test_miner());
        let (register, _) = chain.transaction(&chain.native_asset_id()).unwrap();
        let value = serde_json::to_value(payload_info(&register.payload)).unwrap();
        assert_eq!(value["asset"]["Name"], json!("ELA"));
        assert_eq!(value["amount"], json!("33000000"));
        assert_eq!(value["controller"], json!("00".repeat(21)));

        let pow = Payload::SideChainPow(SideChainPow {
            side_block_hash: Hash256([1; 32]),
            side_genesis_hash: Hash256([2; 32]),
            block_height: 9,
            signed_data: vec![0xab],
        });
        let value = serde_json::to_value(payload_info(&pow)).unwrap();
        assert_eq!(value["sideblockhash"], json!(Hash256([1; 32]).to_wire()));
        assert_eq!(value["signeddata"], json!("ab"));

        let mut withdrawn = [0u8; 32];
        withdrawn[0] = 0xff;
        let withdraw = Payload::WithdrawFromSideChain(WithdrawFromSideChain {
            block_height: 3,
            genesis_block_address: "gen".into(),
            side_chain_tx_hashes: vec![Hash256(withdrawn)],
        });
        let value = serde_json::to_value(payload_info(&withdraw)).unwrap();
        assert!(value["sidechaintransactionhashes"][0]
            .as_str()
            .unwrap()
            .ends_with("ff"));

        assert_eq!(payload_info(&Payload::TransferAsset), None);
    }

    #[test]
    fn test_block_transactions() {
        let chain = MemoryChain::devnet(test_miner());
        let genesis = chain.block_at(0).unwrap();
        let value = serde_json::to_value(block_transactions(&genesis)).unwrap();
        assert_eq!(value["Height"], json!(0));
        assert_eq!(value["Transactions"].as_array().unwrap().len(), 2);
        assert_eq!(
            value["Transactions"][1],
            json!(chain.native_asset_id().to_wire())
        );
    }
}
