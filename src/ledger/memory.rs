//! In-memory chain
//!
//! A complete, single-process implementation of [`Ledger`], [`Node`],
//! [`BlockEngine`] and [`MiningService`]. It backs the development server
//! and the test suites. Blocks are accepted without proof-of-work checks;
//! linkage, height and merkle root are still enforced.

use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{
    BlockEngine, EngineError, Ledger, LedgerError, MiningService, Node, NodeError, NodeSummary,
    PeerInfo, ProducerState, TransactionHistory, UnspentOutput, UnspentsByAsset,
};
use crate::core::payload::{ProducerPayload, RegisterAsset};
use crate::core::transaction::ATTRIBUTE_NONCE;
use crate::core::{
    Asset, Attribute, Block, Fixed64, Header, OutPoint, Output, OutputPayload, Payload,
    Transaction, POW_LIMIT_BITS, SELA_PER_COIN,
};
use crate::crypto::{Hash256, ProgramHash};
use crate::mining::mempool::{withdrawn_hashes, Mempool, MempoolError};

// =============================================================================
// Chain Parameters
// =============================================================================

/// Timestamp of the genesis block
pub const GENESIS_TIMESTAMP: u32 = 1_513_936_800;

/// Total coinbase value of a block
pub const BLOCK_REWARD: Fixed64 = Fixed64(5 * SELA_PER_COIN);

/// Foundation share of each coinbase, in percent
pub const FOUNDATION_SHARE_PERCENT: i64 = 30;

/// Most pool transactions packed into one template
pub const MAX_TEMPLATE_TXS: usize = 1000;

/// Identifier the in-memory node reports for itself
pub const NODE_ID: u64 = 0x5eed;

/// Vote type counting toward producers
const VOTE_TYPE_DELEGATE: u8 = 0x00;

const COINBASE_DATA: &[u8] = b"sidechain-rpc";

/// Program hash receiving the foundation share
pub fn foundation_program_hash() -> ProgramHash {
    ProgramHash::from_code(crate::crypto::address::PREFIX_STANDARD, b"foundation")
}

#[derive(Debug, Default)]
struct ChainState {
    blocks: Vec<Block>,
    block_index: HashMap<Hash256, u32>,
    transactions: HashMap<Hash256, (Transaction, u32)>,
    utxos: HashMap<OutPoint, Output>,
    assets: HashMap<Hash256, Asset>,
    withdrawn: HashSet<Hash256>,
    producers: Vec<(ProducerPayload, ProducerState)>,
    arbitrators: Vec<Vec<u8>>,
    peers: Vec<PeerInfo>,
    broadcasts: Vec<Hash256>,
    relayed: Vec<Hash256>,
}

impl ChainState {
    fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    fn apply_block(&mut self, block: Block) {
        let height = block.height();
        for tx in &block.transactions {
            let tx_id = tx.hash();
            for input in &tx.inputs {
                self.utxos.remove(&input.previous);
            }
            for (index, output) in tx.outputs.iter().enumerate() {
                self.utxos.insert(
                    OutPoint {
                        tx_id,
                        index: index as u16,
                    },
                    output.clone(),
                );
            }

            match &tx.payload {
                Payload::RegisterAsset(RegisterAsset { asset, .. }) => {
                    self.assets.insert(tx_id, asset.clone());
                }
                Payload::RegisterProducer(p) => {
                    let known = self
                        .producers
                        .iter()
                        .any(|(known, _)| known.owner_public_key == p.owner_public_key);
                    if !known {
                        self.producers.push((p.clone(), ProducerState::Registered));
                    }
                }
                Payload::UpdateProducer(p) => {
                    if let Some(entry) = self
                        .producers
                        .iter_mut()
                        .find(|(known, _)| known.owner_public_key == p.owner_public_key)
                    {
                        entry.0 = p.clone();
                    }
                }
                Payload::CancelProducer(p) => {
                    if let Some(entry) = self
                        .producers
                        .iter_mut()
                        .find(|(known, _)| known.owner_public_key == p.owner_public_key)
                    {
                        entry.1 = ProducerState::Cancelled;
                    }
                }
                _ => {}
            }
            self.withdrawn.extend(withdrawn_hashes(tx).copied());
            self.transactions.insert(tx_id, (tx.clone(), height));
        }

        self.block_index.insert(block.hash(), height);
        self.blocks.push(block);
    }

    fn votes_for(&self, owner_public_key: &[u8]) -> Fixed64 {
        self.utxos
            .values()
            .filter_map(|output| match &output.output_payload {
                OutputPayload::Vote(vote) => Some((output.value, vote)),
                OutputPayload::Default => None,
            })
            .filter(|(_, vote)| {
                vote.contents.iter().any(|content| {
                    content.vote_type == VOTE_TYPE_DELEGATE
                        && content.candidates.iter().any(|c| c == owner_public_key)
                })
            })
            .map(|(value, _)| value)
            .sum()
    }

    fn resolve_output(&self, previous: &OutPoint) -> Option<&Output> {
        self.transactions
            .get(&previous.tx_id)
            .and_then(|(tx, _)| tx.outputs.get(previous.index as usize))
    }
}

// =============================================================================
// MemoryChain
// =============================================================================

pub struct MemoryChain {
    state: RwLock<ChainState>,
    pool: Mutex<Mempool>,
    native_asset_id: Hash256,
    miner: ProgramHash,
    bits: u32,
    mining: AtomicBool,
    reject_blocks: AtomicBool,
    generated: AtomicU64,
    admitted: AtomicU64,
}

impl MemoryChain {
    /// Chain holding only a genesis block; discrete mining pays `miner`
    pub fn devnet(miner: ProgramHash) -> Self {
        Self::with_bits(miner, POW_LIMIT_BITS)
    }

    pub fn with_bits(miner: ProgramHash, bits: u32) -> Self {
        let register = Transaction {
            version: 0,
            payload_version: 0,
            payload: Payload::RegisterAsset(RegisterAsset {
                asset: Asset {
                    name: "ELA".to_string(),
                    description: String::new(),
                    precision: 8,
                    asset_type: 0,
                    record_type: 0,
                },
                amount: Fixed64(33_000_000 * SELA_PER_COIN),
                controller: ProgramHash::default(),
            }),
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            programs: Vec::new(),
        };
        let native_asset_id = register.hash();

        let coinbase = Transaction::coinbase(
            b"genesis".to_vec(),
            native_asset_id,
            &[(foundation_program_hash(), BLOCK_REWARD)],
            0,
        );
        let genesis = Block::new(
            Header {
                timestamp: GENESIS_TIMESTAMP,
                bits,
                ..Header::default()
            },
            vec![coinbase, register],
        );

        let mut state = ChainState::default();
        state.apply_block(genesis);

        Self {
            state: RwLock::new(state),
            pool: Mutex::new(Mempool::new()),
            native_asset_id,
            miner,
            bits,
            mining: AtomicBool::new(false),
            reject_blocks: AtomicBool::new(false),
            generated: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
        }
    }

    /// Generate and commit one block paying the configured miner
    pub fn mine_block(&self) -> Result<Block, EngineError> {
        self.mine_with(Vec::new())
    }

    /// Generate a block with `extra` appended after the pool transactions
    /// and commit it without pool admission checks
    pub fn mine_with(&self, extra: Vec<Transaction>) -> Result<Block, EngineError> {
        let template = self.generate_block(&self.miner)?;
        let mut transactions = template.transactions;
        transactions.extend(extra);
        let block = Block::new(template.header, transactions);
        self.commit_block(block.clone())?;
        Ok(block)
    }

    pub fn add_peer(&self, peer: PeerInfo) {
        self.state.write().peers.push(peer);
    }

    pub fn set_arbitrators(&self, arbitrators: Vec<Vec<u8>>) {
        self.state.write().arbitrators = arbitrators;
    }

    /// Make every subsequent commit fail
    pub fn set_reject_blocks(&self, reject: bool) {
        self.reject_blocks.store(reject, Ordering::SeqCst);
    }

    /// Hashes of blocks handed to [`Node::broadcast_block`], in order
    pub fn broadcasted_blocks(&self) -> Vec<Hash256> {
        self.state.read().broadcasts.clone()
    }

    /// Hashes of transactions handed to [`Node::relay`], in order
    pub fn relayed_transactions(&self) -> Vec<Hash256> {
        self.state.read().relayed.clone()
    }

    pub fn miner(&self) -> ProgramHash {
        self.miner
    }

    fn lookup_height(state: &ChainState, hash: &Hash256) -> Result<u32, LedgerError> {
        state
            .block_index
            .get(hash)
            .copied()
            .ok_or_else(|| LedgerError::NotFound(format!("block {hash}")))
    }

    fn history_entry(
        state: &ChainState,
        owner: &ProgramHash,
        address: &str,
        tx: &Transaction,
        block: &Block,
    ) -> Option<TransactionHistory> {
        let mut spent = Fixed64::ZERO;
        let mut input_total = Fixed64::ZERO;
        let mut resolved_all = true;
        let mut inputs = Vec::new();
        for input in &tx.inputs {
            match state.resolve_output(&input.previous) {
                Some(output) => {
                    input_total += output.value;
                    if output.program_hash == *owner {
                        spent += output.value;
                    }
                    let from = output.program_hash.to_address();
                    if !inputs.contains(&from) {
                        inputs.push(from);
                    }
                }
                None => resolved_all = false,
            }
        }

        let mut received = Fixed64::ZERO;
        let mut output_total = Fixed64::ZERO;
        let mut outputs = Vec::new();
        for output in &tx.outputs {
            output_total += output.value;
            if output.program_hash == *owner {
                received += output.value;
            }
            let to = output.program_hash.to_address();
            if !outputs.contains(&to) {
                outputs.push(to);
            }
        }

        let (kind, value) = if spent.sela() > 0 {
            ("spend", spent.sela() - received.sela())
        } else if received.sela() > 0 {
            ("income", received.sela())
        } else {
            return None;
        };

        let fee = if tx.is_coinbase() || !resolved_all {
            0
        } else {
            input_total.sela() - output_total.sela()
        };

        Some(TransactionHistory {
            address: address.to_string(),
            txid: tx.hash().to_wire(),
            kind: kind.to_string(),
            value,
            create_time: block.header.timestamp,
            height: block.height(),
            fee,
            inputs,
            outputs,
            tx_type: tx.payload.type_name().to_string(),
        })
    }
}

// =============================================================================
// Ledger
// =============================================================================

impl Ledger for MemoryChain {
    fn best_height(&self) -> u32 {
        self.state.read().tip().map(Block::height).unwrap_or_default()
    }

    fn native_asset_id(&self) -> Hash256 {
        self.native_asset_id
    }

    fn block_hash(&self, height: u32) -> Result<Hash256, LedgerError> {
        self.state
            .read()
            .blocks
            .get(height as usize)
            .map(Block::hash)
            .ok_or_else(|| LedgerError::NotFound(format!("block at height {height}")))
    }

    fn header(&self, hash: &Hash256) -> Result<Header, LedgerError> {
        self.block(hash).map(|block| block.header)
    }

    fn block(&self, hash: &Hash256) -> Result<Block, LedgerError> {
        let state = self.state.read();
        let height = Self::lookup_height(&state, hash)?;
        state
            .blocks
            .get(height as usize)
            .cloned()
            .ok_or_else(|| LedgerError::Inconsistent(format!("index points past tip for {hash}")))
    }

    fn transaction(&self, hash: &Hash256) -> Result<(Transaction, u32), LedgerError> {
        self.state
            .read()
            .transactions
            .get(hash)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {hash}")))
    }

    fn asset(&self, id: &Hash256) -> Result<Asset, LedgerError> {
        self.state
            .read()
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("asset {id}")))
    }

    fn unspents(&self, owner: &ProgramHash) -> Result<UnspentsByAsset, LedgerError> {
        let state = self.state.read();
        let mut grouped: UnspentsByAsset = BTreeMap::new();
        for (outpoint, output) in &state.utxos {
            if output.program_hash == *owner {
                grouped.entry(output.asset_id).or_default().push(UnspentOutput {
                    tx_id: outpoint.tx_id,
                    index: outpoint.index,
                    value: output.value,
                });
            }
        }
        for list in grouped.values_mut() {
            list.sort_by_key(|u| (u.tx_id, u.index));
        }
        Ok(grouped)
    }

    fn unspents_of_asset(
        &self,
        owner: &ProgramHash,
        asset_id: &Hash256,
    ) -> Result<Vec<UnspentOutput>, LedgerError> {
        Ok(self
            .unspents(owner)?
            .remove(asset_id)
            .unwrap_or_default())
    }

    fn is_sidechain_tx_duplicate(&self, hash: &Hash256) -> bool {
        self.state.read().withdrawn.contains(hash)
    }

    fn registered_producers(&self) -> Result<Vec<ProducerPayload>, LedgerError> {
        let state = self.state.read();
        let mut producers: Vec<(Fixed64, ProducerPayload)> = state
            .producers
            .iter()
            .map(|(p, _)| (state.votes_for(&p.owner_public_key), p.clone()))
            .collect();
        producers.sort_by(|(va, a), (vb, b)| {
            vb.cmp(va)
                .then_with(|| a.owner_public_key.cmp(&b.owner_public_key))
        });
        Ok(producers.into_iter().map(|(_, p)| p).collect())
    }

    fn producer_state(&self, owner_public_key: &[u8]) -> ProducerState {
        self.state
            .read()
            .producers
            .iter()
            .find(|(p, _)| p.owner_public_key == owner_public_key)
            .map(|(_, state)| *state)
            .unwrap_or(ProducerState::Unregistered)
    }

    fn producer_votes(&self, owner_public_key: &[u8]) -> Fixed64 {
        self.state.read().votes_for(owner_public_key)
    }

    fn arbitrators(&self) -> Vec<Vec<u8>> {
        self.state.read().arbitrators.clone()
    }

    fn transaction_history(&self, address: &str) -> Vec<TransactionHistory> {
        let Ok(owner) = ProgramHash::from_address(address) else {
            return Vec::new();
        };
        let state = self.state.read();
        state
            .blocks
            .iter()
            .flat_map(|block| {
                block
                    .transactions
                    .iter()
                    .filter_map(|tx| Self::history_entry(&state, &owner, address, tx, block))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

// =============================================================================
// Node
// =============================================================================

impl Node for MemoryChain {
    fn summary(&self) -> NodeSummary {
        let admitted = self.admitted.load(Ordering::SeqCst);
        NodeSummary {
            id: NODE_ID,
            version: 0,
            services: 1,
            relay: true,
            txn_count: admitted,
            rx_txn_count: admitted,
        }
    }

    fn neighbours(&self) -> Vec<PeerInfo> {
        self.state.read().peers.clone()
    }

    fn transaction_pool(&self) -> Vec<Transaction> {
        self.pool.lock().get_transactions_fifo(usize::MAX)
    }

    fn pool_transaction(&self, hash: &Hash256) -> Option<Transaction> {
        self.pool.lock().get(hash).cloned()
    }

    fn append_to_pool(&self, tx: Transaction) -> Result<(), NodeError> {
        let state = self.state.read();
        let tx_id = tx.hash();
        if state.transactions.contains_key(&tx_id) {
            return Err(NodeError::Duplicate(tx_id));
        }
        if let Some(hash) = withdrawn_hashes(&tx).find(|h| state.withdrawn.contains(*h)) {
            return Err(NodeError::Rejected(format!(
                "side-chain transaction {hash} already withdrawn"
            )));
        }

        let mut pool = self.pool.lock();
        match pool.add_transaction(tx, |outpoint| state.utxos.contains_key(outpoint)) {
            Ok(_) => {
                self.admitted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(MempoolError::DuplicateTransaction) => Err(NodeError::Duplicate(tx_id)),
            Err(e) => Err(NodeError::Rejected(e.to_string())),
        }
    }

    fn relay(&self, tx: &Transaction) -> Result<(), NodeError> {
        self.state.write().relayed.push(tx.hash());
        Ok(())
    }

    fn broadcast_block(&self, block: &Block) {
        self.state.write().broadcasts.push(block.hash());
    }

    fn is_duplicate_sidechain_tx(&self, hash: &Hash256) -> bool {
        self.pool.lock().has_sidechain_hash(hash)
    }
}

// =============================================================================
// BlockEngine
// =============================================================================

impl BlockEngine for MemoryChain {
    fn generate_block(&self, pay_to: &ProgramHash) -> Result<Block, EngineError> {
        let state = self.state.read();
        let tip = state
            .tip()
            .ok_or_else(|| EngineError::Generation("chain has no genesis block".to_string()))?;
        let height = tip.height() + 1;
        let now = chrono::Utc::now().timestamp().max(0) as u32;
        let timestamp = now.max(tip.header.timestamp + 1);

        let foundation_share = Fixed64(BLOCK_REWARD.sela() * FOUNDATION_SHARE_PERCENT / 100);
        let miner_share = Fixed64(BLOCK_REWARD.sela() - foundation_share.sela());
        let mut coinbase = Transaction::coinbase(
            COINBASE_DATA.to_vec(),
            self.native_asset_id,
            &[
                (foundation_program_hash(), foundation_share),
                (*pay_to, miner_share),
            ],
            height,
        );
        let nonce = self.generated.fetch_add(1, Ordering::SeqCst);
        coinbase.attributes.push(Attribute {
            usage: ATTRIBUTE_NONCE,
            data: nonce.to_le_bytes().to_vec(),
        });

        let mut transactions = vec![coinbase];
        transactions.extend(self.pool.lock().get_transactions_fifo(MAX_TEMPLATE_TXS));

        Ok(Block::new(
            Header {
                previous: tip.hash(),
                timestamp,
                bits: self.bits,
                height,
                ..Header::default()
            },
            transactions,
        ))
    }

    fn commit_block(&self, block: Block) -> Result<(), EngineError> {
        if self.reject_blocks.load(Ordering::SeqCst) {
            return Err(EngineError::Rejected("block rejected by engine".to_string()));
        }

        let mut state = self.state.write();
        let (tip_hash, tip_height) = state
            .tip()
            .map(|tip| (tip.hash(), tip.height()))
            .ok_or_else(|| EngineError::Rejected("chain has no genesis block".to_string()))?;

        if block.height() != tip_height + 1 {
            return Err(EngineError::Rejected(format!(
                "height {} does not extend tip {}",
                block.height(),
                tip_height
            )));
        }
        if block.header.previous != tip_hash {
            return Err(EngineError::Rejected(format!(
                "previous hash {} is not the tip",
                block.header.previous
            )));
        }
        if block.header.merkle_root != Block::calculate_merkle_root(&block.transactions) {
            return Err(EngineError::Rejected("merkle root mismatch".to_string()));
        }
        if block.coinbase().is_err() {
            return Err(EngineError::Rejected("missing coinbase".to_string()));
        }

        let included: Vec<Hash256> = block.transactions.iter().map(Transaction::hash).collect();
        state.apply_block(block);

        let mut pool = self.pool.lock();
        pool.remove_transactions(&included);
        pool.remove_conflicting(|outpoint| state.utxos.contains_key(outpoint));
        Ok(())
    }
}

// =============================================================================
// MiningService
// =============================================================================

impl MiningService for MemoryChain {
    fn start(&self) {
        self.mining.store(true, Ordering::SeqCst);
    }

    fn halt(&self) {
        self.mining.store(false, Ordering::SeqCst);
    }

    fn is_mining(&self) -> bool {
        self.mining.load(Ordering::SeqCst)
    }

    fn discrete_mining(&self, count: u32) -> Result<Vec<Hash256>, EngineError> {
        let mut hashes = Vec::new();
        for _ in 0..count {
            let block = self.mine_block()?;
            self.broadcast_block(&block);
            hashes.push(block.hash());
        }
        Ok(hashes)
    }
}
