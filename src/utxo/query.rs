//! Balance, listing and vote-status queries over unspent outputs

use serde::Serialize;
use thiserror::Error;

use super::classifier::{classify, OutputClass, UtxoFilter};
use crate::core::{Fixed64, Output, OutputType, Transaction};
use crate::crypto::{Hash256, ProgramHash};
use crate::ledger::{Ledger, LedgerError, Node, UnspentOutput};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtxoError {
    #[error("unknown transaction {0} from persisted utxo")]
    UnknownTransaction(Hash256),
    #[error("transaction {0} has no output {1}")]
    MissingOutput(Hash256, u16),
    #[error("unknown asset {0}")]
    UnknownAsset(Hash256),
    #[error("cannot get asset with program: {0}")]
    Ledger(#[from] LedgerError),
}

/// One listed unspent output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoInfo {
    pub txtype: u8,
    pub txid: String,
    pub assetid: String,
    pub vout: u16,
    pub address: String,
    pub amount: String,
    pub outputlock: u32,
    pub confirmations: u32,
}

/// Unspent output in the per-asset views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnspentInfo {
    #[serde(rename = "Txid")]
    pub txid: String,
    #[serde(rename = "Index")]
    pub index: u16,
    #[serde(rename = "Value")]
    pub value: String,
}

impl From<&UnspentOutput> for UnspentInfo {
    fn from(unspent: &UnspentOutput) -> Self {
        Self {
            txid: unspent.tx_id.to_wire(),
            index: unspent.index,
            value: unspent.value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetUnspents {
    #[serde(rename = "AssetId")]
    pub asset_id: String,
    #[serde(rename = "AssetName")]
    pub asset_name: String,
    #[serde(rename = "Utxo")]
    pub utxo: Vec<UnspentInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteStatus {
    pub total: String,
    pub voting: String,
    pub pending: bool,
}

/// Sum of all unspent value, optionally restricted to one asset
pub fn balance(
    ledger: &dyn Ledger,
    owner: &ProgramHash,
    asset_id: Option<&Hash256>,
) -> Result<Fixed64, UtxoError> {
    Ok(ledger
        .unspents(owner)?
        .iter()
        .filter(|(asset, _)| asset_id.map_or(true, |wanted| *asset == wanted))
        .flat_map(|(_, list)| list.iter().map(|u| u.value))
        .sum())
}

/// Sum of unspent native-asset value
pub fn received(ledger: &dyn Ledger, owner: &ProgramHash) -> Result<Fixed64, UtxoError> {
    balance(ledger, owner, Some(&ledger.native_asset_id()))
}

/// Committed transaction owning an unspent output, and its height
fn owning_transaction(
    ledger: &dyn Ledger,
    unspent: &UnspentOutput,
) -> Result<(Transaction, u32), UtxoError> {
    ledger.transaction(&unspent.tx_id).map_err(|e| match e {
        LedgerError::NotFound(_) => UtxoError::UnknownTransaction(unspent.tx_id),
        other => UtxoError::Ledger(other),
    })
}

fn output_of(tx: &Transaction, tx_id: Hash256, index: u16) -> Result<&Output, UtxoError> {
    tx.outputs
        .get(index as usize)
        .ok_or(UtxoError::MissingOutput(tx_id, index))
}

/// Native-asset unspent outputs of `address`, filtered by class
pub fn list_unspent(
    ledger: &dyn Ledger,
    address: &str,
    owner: &ProgramHash,
    filter: UtxoFilter,
) -> Result<Vec<UtxoInfo>, UtxoError> {
    let best_height = ledger.best_height();
    let native = ledger.native_asset_id();
    let unspents = ledger.unspents_of_asset(owner, &native)?;

    let mut result = Vec::with_capacity(unspents.len());
    for unspent in &unspents {
        let (tx, height) = owning_transaction(ledger, unspent)?;
        let output = output_of(&tx, unspent.tx_id, unspent.index)?;
        if !filter.admits(classify(tx.version, output.output_type)) {
            continue;
        }
        result.push(UtxoInfo {
            txtype: tx.tx_type(),
            txid: unspent.tx_id.to_wire(),
            assetid: native.to_wire(),
            vout: unspent.index,
            address: address.to_string(),
            amount: unspent.value.to_string(),
            outputlock: output.output_lock,
            confirmations: best_height.saturating_sub(height) + 1,
        });
    }
    Ok(result)
}

/// Unspent outputs grouped by asset, with asset names
pub fn unspents_by_asset(
    ledger: &dyn Ledger,
    owner: &ProgramHash,
) -> Result<Vec<AssetUnspents>, UtxoError> {
    ledger
        .unspents(owner)?
        .iter()
        .map(|(asset_id, list)| {
            let asset = ledger.asset(asset_id).map_err(|e| match e {
                LedgerError::NotFound(_) => UtxoError::UnknownAsset(*asset_id),
                other => UtxoError::Ledger(other),
            })?;
            Ok(AssetUnspents {
                asset_id: asset_id.to_wire(),
                asset_name: asset.name,
                utxo: list.iter().map(UnspentInfo::from).collect(),
            })
        })
        .collect()
}

/// Unspent outputs of one asset
pub fn unspent_outputs(
    ledger: &dyn Ledger,
    owner: &ProgramHash,
    asset_id: &Hash256,
) -> Result<Vec<UnspentInfo>, UtxoError> {
    Ok(ledger
        .unspents_of_asset(owner, asset_id)?
        .iter()
        .map(UnspentInfo::from)
        .collect())
}

/// Total and voting native value of an address, and whether a pool
/// transaction touches it
pub fn vote_status(
    ledger: &dyn Ledger,
    node: &dyn Node,
    owner: &ProgramHash,
) -> Result<VoteStatus, UtxoError> {
    let native = ledger.native_asset_id();
    let mut total = Fixed64::ZERO;
    let mut voting = Fixed64::ZERO;
    for unspent in ledger.unspents_of_asset(owner, &native)? {
        let (tx, _) = owning_transaction(ledger, &unspent)?;
        let output = output_of(&tx, unspent.tx_id, unspent.index)?;
        if classify(tx.version, output.output_type) == OutputClass::Vote {
            voting += unspent.value;
        }
        total += unspent.value;
    }

    let pool = node.transaction_pool();
    let mut pending = false;
    for tx in &pool {
        for input in &tx.inputs {
            let previous = input.previous;
            let spent_owner = match ledger.transaction(&previous.tx_id) {
                Ok((source, _)) => output_of(&source, previous.tx_id, previous.index)?.program_hash,
                Err(LedgerError::NotFound(_)) => {
                    let source = pool
                        .iter()
                        .find(|candidate| candidate.hash() == previous.tx_id)
                        .ok_or(UtxoError::UnknownTransaction(previous.tx_id))?;
                    output_of(source, previous.tx_id, previous.index)?.program_hash
                }
                Err(other) => return Err(other.into()),
            };
            if spent_owner == *owner {
                pending = true;
            }
        }
        if tx
            .outputs
            .iter()
            .any(|o| o.output_type == OutputType::Vote && o.program_hash == *owner)
        {
            pending = true;
        }
        if pending {
            break;
        }
    }

    Ok(VoteStatus {
        total: total.to_string(),
        voting: voting.to_string(),
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Input, OutPoint, TX_VERSION_09};
    use crate::crypto::address::tests::test_public_key;
    use crate::ledger::memory::tests::{test_miner, transfer, vote_output};
    use crate::ledger::{MemoryChain, Node};

    fn holder() -> ProgramHash {
        ProgramHash::standard(&test_public_key(11)).unwrap()
    }

    /// Chain where `holder` owns one 5-coin vote output on a v0.9 tx and
    /// one 1-coin normal output
    fn voting_chain() -> MemoryChain {
        let chain = MemoryChain::devnet(test_miner());
        let native = chain.native_asset_id();
        let vote = transfer(
            vec![vote_output(&chain, holder(), 500_000_000, test_public_key(3))],
            1,
        );
        let plain = transfer(
            vec![Output::new(native, Fixed64(100_000_000), holder())],
            2,
        );
        chain.mine_with(vec![vote, plain]).unwrap();
        chain
    }

    #[test]
    fn test_vote_listing_scenario() {
        let chain = voting_chain();
        let address = holder().to_address();

        let votes = list_unspent(&chain, &address, &holder(), UtxoFilter::Vote).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].amount, "5");
        assert_eq!(votes[0].confirmations, 1);

        let normal = list_unspent(&chain, &address, &holder(), UtxoFilter::Normal).unwrap();
        assert_eq!(normal.len(), 1);
        assert_eq!(normal[0].amount, "1");

        let mixed = list_unspent(&chain, &address, &holder(), UtxoFilter::Mixed).unwrap();
        assert_eq!(mixed.len(), votes.len() + normal.len());
    }

    #[test]
    fn test_legacy_vote_tag_is_normal() {
        let chain = MemoryChain::devnet(test_miner());
        let mut legacy = transfer(
            vec![vote_output(&chain, holder(), 700, test_public_key(3))],
            1,
        );
        legacy.version = 0;
        chain.mine_with(vec![legacy]).unwrap();

        let address = holder().to_address();
        assert!(list_unspent(&chain, &address, &holder(), UtxoFilter::Vote)
            .unwrap()
            .is_empty());
        let status = vote_status(&chain, &chain, &holder()).unwrap();
        assert_eq!(status.voting, "0");
        assert_eq!(status.total, "0.000007");
    }

    #[test]
    fn test_balances() {
        let chain = voting_chain();
        assert_eq!(balance(&chain, &holder(), None).unwrap(), Fixed64(600_000_000));
        assert_eq!(received(&chain, &holder()).unwrap(), Fixed64(600_000_000));
        assert_eq!(
            balance(&chain, &holder(), Some(&Hash256([9; 32]))).unwrap(),
            Fixed64::ZERO
        );
    }

    #[test]
    fn test_grouped_views() {
        let chain = voting_chain();
        let grouped = unspents_by_asset(&chain, &holder()).unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].asset_name, "ELA");
        assert_eq!(grouped[0].utxo.len(), 2);

        let native = chain.native_asset_id();
        assert_eq!(unspent_outputs(&chain, &holder(), &native).unwrap().len(), 2);
    }

    #[test]
    fn test_vote_status_pending() {
        let chain = voting_chain();
        let status = vote_status(&chain, &chain, &holder()).unwrap();
        assert_eq!(
            status,
            VoteStatus {
                total: "6".to_string(),
                voting: "5".to_string(),
                pending: false,
            }
        );

        let owned = chain
            .unspents_of_asset(&holder(), &chain.native_asset_id())
            .unwrap()[0];
        let mut spend = transfer(
            vec![Output::new(chain.native_asset_id(), Fixed64(1), test_miner())],
            7,
        );
        spend.version = TX_VERSION_09;
        spend.inputs.push(Input {
            previous: OutPoint {
                tx_id: owned.tx_id,
                index: owned.index,
            },
            sequence: 0,
        });
        chain.append_to_pool(spend).unwrap();

        assert!(vote_status(&chain, &chain, &holder()).unwrap().pending);
    }
}
