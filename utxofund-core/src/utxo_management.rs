//! In-memory UTXO store
//!
//! [`InMemoryUtxoStore`] keeps outputs keyed by owner and output id and
//! implements [`UtxoSource`] over them. It is used by tests and by hosts
//! that load their outputs up front. Reservation is explicit: a reserved
//! output is invisible to funding until it is released.

use crate::utxo_selection::types::Candidate;
use crate::utxo_source::{CandidateQuery, Page, SourceError, UtxoSource};
use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use utxofund_common::types::{OutputId, OwnerId, ScriptType};

/// Status of the transaction that created an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Mined with a proof
    Completed,
    /// Accepted by the network, proof pending
    Unproven,
    /// Broadcast in progress, not yet acknowledged
    Sending,
    /// Rejected; its outputs can never be spent
    Failed,
}

/// An output as recorded by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOutput {
    pub output_id: OutputId,
    pub owner: OwnerId,
    pub basket: String,
    pub value: Amount,
    pub script_type: ScriptType,
    pub spendable: bool,
    pub reserved: bool,
    pub tx_status: TxStatus,
}

impl StoredOutput {
    /// Create a spendable, unreserved output of a completed transaction
    pub fn new(
        output_id: OutputId,
        owner: OwnerId,
        basket: impl Into<String>,
        value: Amount,
        script_type: ScriptType,
    ) -> Self {
        Self {
            output_id,
            owner,
            basket: basket.into(),
            value,
            script_type,
            spendable: true,
            reserved: false,
            tx_status: TxStatus::Completed,
        }
    }

    /// Set the status of the creating transaction
    pub fn with_status(mut self, tx_status: TxStatus) -> Self {
        self.tx_status = tx_status;
        self
    }

    /// Mark the output as spendable or not
    pub fn with_spendable(mut self, spendable: bool) -> Self {
        self.spendable = spendable;
        self
    }

    fn is_available(&self) -> bool {
        self.spendable && !self.reserved && self.tx_status != TxStatus::Failed
    }

    fn is_eligible(&self, include_sending: bool) -> bool {
        self.is_available()
            && match self.tx_status {
                TxStatus::Completed | TxStatus::Unproven => true,
                TxStatus::Sending => include_sending,
                TxStatus::Failed => false,
            }
    }

    fn to_candidate(&self) -> Result<Candidate, SourceError> {
        if self.value == Amount::ZERO {
            return Err(SourceError::CorruptRecord {
                output_id: self.output_id,
                reason: "spendable output holds no value".to_string(),
            });
        }

        Ok(Candidate::for_script(self.output_id, self.value, self.script_type))
    }
}

/// Thread-safe in-memory output store
#[derive(Debug, Default)]
pub struct InMemoryUtxoStore {
    outputs: RwLock<BTreeMap<(OwnerId, OutputId), StoredOutput>>,
}

impl InMemoryUtxoStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given outputs
    pub fn with_outputs<I>(outputs: I) -> Self
    where
        I: IntoIterator<Item = StoredOutput>,
    {
        let store = Self::new();
        for output in outputs {
            store.insert(output);
        }
        store
    }

    // Every write is a single map operation, so a poisoned lock holds consistent data
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<(OwnerId, OutputId), StoredOutput>> {
        self.outputs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<(OwnerId, OutputId), StoredOutput>> {
        self.outputs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds an output, returning the one it replaced
    pub fn insert(&self, output: StoredOutput) -> Option<StoredOutput> {
        self.write().insert((output.owner, output.output_id), output)
    }

    /// Looks up an output
    pub fn get(&self, owner: OwnerId, output_id: OutputId) -> Option<StoredOutput> {
        self.read().get(&(owner, output_id)).cloned()
    }

    /// Reserves outputs so that funding no longer sees them
    ///
    /// # Returns
    /// The number of outputs that were newly reserved
    pub fn reserve(&self, owner: OwnerId, output_ids: &[OutputId]) -> usize {
        self.set_reserved(owner, output_ids, true)
    }

    /// Releases reserved outputs
    ///
    /// # Returns
    /// The number of outputs that were released
    pub fn release(&self, owner: OwnerId, output_ids: &[OutputId]) -> usize {
        self.set_reserved(owner, output_ids, false)
    }

    fn set_reserved(&self, owner: OwnerId, output_ids: &[OutputId], reserved: bool) -> usize {
        let mut outputs = self.write();
        let mut changed = 0;
        for id in output_ids {
            if let Some(output) = outputs.get_mut(&(owner, *id)) {
                if output.reserved != reserved {
                    output.reserved = reserved;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Number of stored outputs
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl UtxoSource for InMemoryUtxoStore {
    fn find_candidates(
        &self,
        query: &CandidateQuery<'_>,
        page: Page,
    ) -> Result<Vec<Candidate>, SourceError> {
        let outputs = self.read();

        let mut eligible: Vec<&StoredOutput> = outputs
            .values()
            .filter(|o| o.owner == query.owner && o.basket == query.basket)
            .filter(|o| o.is_eligible(query.include_sending))
            .filter(|o| !query.forbidden.contains(&o.output_id))
            .collect();

        eligible.sort_by(|a, b| {
            a.value
                .cmp(&b.value)
                .then_with(|| a.output_id.cmp(&b.output_id))
        });

        eligible
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .map(StoredOutput::to_candidate)
            .collect()
    }

    fn count_available(&self, owner: OwnerId, basket: &str) -> Result<u64, SourceError> {
        let count = self
            .read()
            .values()
            .filter(|o| o.owner == owner && o.basket == basket && o.is_available())
            .count();

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const OWNER: OwnerId = OwnerId(7);

    fn output(id: u64, sats: u64) -> StoredOutput {
        StoredOutput::new(OutputId(id), OWNER, "default", Amount::from_sat(sats), ScriptType::P2pkh)
    }

    fn query<'a>(forbidden: &'a HashSet<OutputId>, include_sending: bool) -> CandidateQuery<'a> {
        CandidateQuery {
            owner: OWNER,
            basket: "default",
            forbidden,
            include_sending,
        }
    }

    #[test]
    fn test_candidates_sorted_smallest_first() {
        let store = InMemoryUtxoStore::with_outputs(vec![
            output(1, 5_000),
            output(2, 1_000),
            output(3, 3_000),
            output(4, 1_000),
        ]);
        let forbidden = HashSet::new();

        let ids: Vec<u64> = store
            .find_candidates(&query(&forbidden, false), Page::first(10))
            .unwrap()
            .iter()
            .map(|c| c.output_id.0)
            .collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);

        let second: Vec<u64> = store
            .find_candidates(&query(&forbidden, false), Page::first(3).next())
            .unwrap()
            .iter()
            .map(|c| c.output_id.0)
            .collect();
        assert_eq!(second, vec![1]);
    }

    #[test]
    fn test_eligibility_filters() {
        let other_owner = StoredOutput::new(
            OutputId(10),
            OwnerId(8),
            "default",
            Amount::from_sat(100),
            ScriptType::P2pkh,
        );
        let mut other_basket = output(11, 100);
        other_basket.basket = "savings".to_string();

        let store = InMemoryUtxoStore::with_outputs(vec![
            output(1, 100),
            output(2, 200).with_status(TxStatus::Sending),
            output(3, 300).with_status(TxStatus::Failed),
            output(4, 400).with_spendable(false),
            output(5, 500),
            output(6, 600).with_status(TxStatus::Unproven),
            other_owner,
            other_basket,
        ]);
        assert_eq!(store.reserve(OWNER, &[OutputId(5)]), 1);

        let forbidden: HashSet<OutputId> = [OutputId(6)].into_iter().collect();
        let ids = |include_sending| -> Vec<u64> {
            store
                .find_candidates(&query(&forbidden, include_sending), Page::first(100))
                .unwrap()
                .iter()
                .map(|c| c.output_id.0)
                .collect()
        };

        assert_eq!(ids(false), vec![1]);
        assert_eq!(ids(true), vec![1, 2]);

        // 1, 2 and 6 are available; 5 is reserved
        assert_eq!(store.count_available(OWNER, "default").unwrap(), 3);

        assert_eq!(store.release(OWNER, &[OutputId(5), OutputId(1)]), 1);
        assert_eq!(store.count_available(OWNER, "default").unwrap(), 4);
    }

    #[test]
    fn test_zero_value_record_is_corrupt() {
        let store = InMemoryUtxoStore::with_outputs(vec![output(1, 0)]);
        let forbidden = HashSet::new();

        let result = store.find_candidates(&query(&forbidden, false), Page::first(10));
        assert!(matches!(
            result,
            Err(SourceError::CorruptRecord { output_id: OutputId(1), .. })
        ));
    }
}
