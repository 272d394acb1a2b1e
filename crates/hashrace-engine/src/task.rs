use hashrace_crypto::solution_commitment;
use hashrace_types::{AccountAddress, Amount, CommitmentHash, Score};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A committed, not-yet-revealed solution and the stake backing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commitment {
    pub commitment: CommitmentHash,
    pub stake: Amount,
}

impl Commitment {
    pub fn new(commitment: CommitmentHash, stake: Amount) -> Self {
        Self { commitment, stake }
    }

    pub fn matches(&self, solution: &[u8]) -> bool {
        solution_commitment(solution) == self.commitment
    }
}

/// Competition state for one block identifier. Created by the first accepted
/// commitment, destroyed exactly once at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Pooled stake, always the sum of all recorded commitment stakes.
    pub bank: Amount,

    /// Best score seen so far, `Score::ZERO` until the first reveal.
    pub score: Score,

    /// Account credited as best revealer.
    pub leader: Option<AccountAddress>,

    pub commitments: HashMap<AccountAddress, Commitment>,
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

impl Task {
    pub fn new() -> Self {
        Self {
            bank: Amount::ZERO,
            score: Score::ZERO,
            leader: None,
            commitments: HashMap::new(),
        }
    }

    pub fn has_commitment_from(&self, account: &AccountAddress) -> bool {
        self.commitments.contains_key(account)
    }

    pub fn commitment_of(&self, account: &AccountAddress) -> Option<&Commitment> {
        self.commitments.get(account)
    }

    /// Record a commitment and fold its stake into the bank. Returns `None`
    /// on bank overflow, leaving the task untouched.
    pub fn record_commitment(
        &mut self,
        account: AccountAddress,
        commitment: Commitment,
    ) -> Option<Amount> {
        let new_bank = self.bank.checked_add(commitment.stake)?;
        self.commitments.insert(account, commitment);
        self.bank = new_bank;
        Some(new_bank)
    }

    /// Install a strictly better reveal.
    pub fn record_reveal(&mut self, account: AccountAddress, score: Score) {
        self.score = score;
        self.leader = Some(account);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> AccountAddress {
        AccountAddress::from_bytes([byte; 32])
    }

    #[test]
    fn test_bank_accumulates_stakes() {
        let mut task = Task::new();

        let c1 = Commitment::new(solution_commitment(b"a"), Amount::from_units(10));
        let c2 = Commitment::new(solution_commitment(b"b"), Amount::from_units(15));

        assert_eq!(task.record_commitment(addr(1), c1), Some(Amount::from_units(10)));
        assert_eq!(task.record_commitment(addr(2), c2), Some(Amount::from_units(25)));
        assert_eq!(task.bank, Amount::from_units(25));
        assert!(task.has_commitment_from(&addr(1)));
        assert!(!task.has_commitment_from(&addr(3)));
    }

    #[test]
    fn test_bank_overflow_leaves_task_untouched() {
        let mut task = Task::new();
        let c1 = Commitment::new(solution_commitment(b"a"), Amount::from_units(u64::MAX));
        let c2 = Commitment::new(solution_commitment(b"b"), Amount::from_units(1));

        task.record_commitment(addr(1), c1).unwrap();
        assert_eq!(task.record_commitment(addr(2), c2), None);
        assert_eq!(task.bank, Amount::from_units(u64::MAX));
        assert!(!task.has_commitment_from(&addr(2)));
    }

    #[test]
    fn test_commitment_verifies_preimage() {
        let commitment = Commitment::new(solution_commitment(b"secret"), Amount::from_units(1));
        assert!(commitment.matches(b"secret"));
        assert!(!commitment.matches(b"guess"));
    }

    #[test]
    fn test_reveal_overwrites_leader() {
        let mut task = Task::new();
        task.record_reveal(addr(1), Score::from_bytes([1u8; 32]));
        task.record_reveal(addr(2), Score::from_bytes([2u8; 32]));

        assert_eq!(task.leader, Some(addr(2)));
        assert_eq!(task.score, Score::from_bytes([2u8; 32]));
    }
}
