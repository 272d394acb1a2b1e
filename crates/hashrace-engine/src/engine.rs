use crate::balances::BalanceManager;
use crate::config::CompetitionConfig;
use crate::error::{CompetitionError, Result};
use crate::task::{Commitment, Task};
use hashrace_crypto::{difficulty_estimate, score_solution, solution_commitment};
use hashrace_ledger::LedgerReader;
use hashrace_types::{AccountAddress, Amount, BlockHash, CommitmentHash, Score};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Snapshot of a task's public state.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub bank: Amount,
    pub score: Score,
    pub leader: Option<AccountAddress>,
    pub commitment_count: usize,
}

/// What a settlement did with the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The recorded best revealer collected the full bank.
    Paid {
        winner: AccountAddress,
        amount: Amount,
    },

    /// The window elapsed with no reveal; every committer got their own
    /// stake back.
    Refunded {
        refunds: Vec<(AccountAddress, Amount)>,
    },
}

/// The competition engine. Tasks are keyed by recent block hashes; accounts
/// commit hidden solutions with a stake, reveal them for scoring, and the
/// best revealer sweeps the pooled stakes once the window closes.
pub struct CompetitionEngine {
    config: CompetitionConfig,
    address: AccountAddress,
    ledger: Arc<dyn LedgerReader>,
    tasks: Arc<RwLock<HashMap<BlockHash, Task>>>,
    balances: Arc<BalanceManager>,

    // Metrics
    pub tasks_opened: Option<Arc<prometheus::IntCounter>>,
    pub commitments_total: Option<Arc<prometheus::IntCounter>>,
    pub reveals_total: Option<Arc<prometheus::IntCounter>>,
    pub settlements_total: Option<Arc<prometheus::IntCounter>>,
}

impl CompetitionEngine {
    pub fn new(
        config: CompetitionConfig,
        address: AccountAddress,
        ledger: Arc<dyn LedgerReader>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            address,
            ledger,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            balances: Arc::new(BalanceManager::new()),
            tasks_opened: None,
            commitments_total: None,
            reveals_total: None,
            settlements_total: None,
        })
    }

    /// Set metrics for tracking competition operations
    pub fn set_metrics(
        &mut self,
        tasks_opened: Arc<prometheus::IntCounter>,
        commitments_total: Arc<prometheus::IntCounter>,
        reveals_total: Arc<prometheus::IntCounter>,
        settlements_total: Arc<prometheus::IntCounter>,
    ) {
        self.tasks_opened = Some(tasks_opened);
        self.commitments_total = Some(commitments_total);
        self.reveals_total = Some(reveals_total);
        self.settlements_total = Some(settlements_total);
    }

    pub fn blocks_to_create_task(&self) -> u64 {
        self.config.blocks_to_create_task
    }

    pub fn bet_size(&self) -> Amount {
        self.config.bet_size
    }

    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    /// The engine's value ledger. The embedding application funds accounts
    /// through this before they can stake.
    pub fn balances(&self) -> &BalanceManager {
        &self.balances
    }

    /// Scan backward for a block with the given hash. Returns the 1-based
    /// lookback of the first match strictly below `max_lookback`, `None` if
    /// the hash matches nothing in range. A match at or beyond
    /// `max_lookback` is out of range by design: the window excludes its
    /// own upper bound.
    pub async fn find_block_by_hash(
        &self,
        candidate: &BlockHash,
        max_lookback: u64,
    ) -> Option<u64> {
        for lookback in 1..max_lookback {
            match self.ledger.block_hash(lookback).await {
                Some(hash) if hash == *candidate => return Some(lookback),
                Some(_) => {}
                // Past the retained history, nothing deeper can match.
                None => break,
            }
        }
        None
    }

    /// Commit a hidden solution against a task, attaching `stake`.
    pub async fn claim_solution(
        &self,
        caller: AccountAddress,
        task_id: BlockHash,
        commitment: CommitmentHash,
        stake: Amount,
    ) -> Result<()> {
        if stake < self.config.bet_size {
            return Err(CompetitionError::InsufficientStake {
                required: self.config.bet_size,
                attached: stake,
            });
        }

        let lookback = self.ensure_ongoing(&task_id).await?;

        let mut tasks = self.tasks.write().await;

        if tasks
            .get(&task_id)
            .map_or(false, |task| task.has_commitment_from(&caller))
        {
            return Err(CompetitionError::AlreadyClaimed {
                task: task_id,
                account: caller,
            });
        }

        // Validate everything before any mutation so a failure cannot
        // leave the stake debited: the caller's balance first, then the
        // bank addition.
        let available = self.balances.balance_of(caller).await;
        if available < stake {
            return Err(CompetitionError::InsufficientBalance {
                account: caller,
                available,
                required: stake,
            });
        }
        let current_bank = tasks.get(&task_id).map_or(Amount::ZERO, |task| task.bank);
        if current_bank.checked_add(stake).is_none() {
            return Err(CompetitionError::BankOverflow(task_id));
        }

        self.balances.debit(caller, stake).await?;

        let opened = !tasks.contains_key(&task_id);
        let task = tasks.entry(task_id).or_insert_with(Task::new);
        task.record_commitment(caller, Commitment::new(commitment, stake))
            .ok_or(CompetitionError::BankOverflow(task_id))?;

        if opened {
            if let Some(ref counter) = self.tasks_opened {
                counter.inc();
            }
            let current_index = self.ledger.current_index().await;
            info!(
                task = task_id.short_hex(),
                lookback,
                window = self.config.blocks_to_create_task,
                current_index,
                "⏳ Task opened"
            );
        }
        if let Some(ref counter) = self.commitments_total {
            counter.inc();
        }

        info!(
            task = task_id.short_hex(),
            account = %caller,
            commitment = hex::encode(&commitment.as_bytes()[..8]),
            stake = stake.to_units(),
            bank = task.bank.to_units(),
            total_commitments = task.commitments.len(),
            "🎲 Solution claimed"
        );

        Ok(())
    }

    /// Reveal a previously committed solution and score it.
    pub async fn submit_solution(
        &self,
        caller: AccountAddress,
        task_id: BlockHash,
        solution: &[u8],
    ) -> Result<Score> {
        self.ensure_ongoing(&task_id).await?;

        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CompetitionError::NoCommitmentFound {
                task: task_id,
                account: caller,
            })?;

        let commitment =
            task.commitment_of(&caller)
                .ok_or(CompetitionError::NoCommitmentFound {
                    task: task_id,
                    account: caller,
                })?;

        if !commitment.matches(solution) {
            return Err(CompetitionError::CommitmentMismatch {
                expected: commitment.commitment.to_hex(),
                actual: solution_commitment(solution).to_hex(),
            });
        }

        let score = score_solution(&self.address, &task_id, solution);
        if score <= task.score {
            return Err(CompetitionError::BetterSolutionExists {
                current: task.score,
                submitted: score,
            });
        }

        task.record_reveal(caller, score);

        if let Some(ref counter) = self.reveals_total {
            counter.inc();
        }

        info!(
            task = task_id.short_hex(),
            account = %caller,
            score = hex::encode(&score.as_bytes()[..8]),
            difficulty = difficulty_estimate(&self.address, &task_id, solution),
            "🔓 Solution revealed"
        );

        Ok(score)
    }

    /// Sweep the bank of an expired task. Callable by anyone; the payout
    /// always goes to the recorded best revealer, or back to the committers
    /// when nobody revealed.
    pub async fn claim_reward(&self, task_id: BlockHash) -> Result<SettlementOutcome> {
        if self
            .find_block_by_hash(&task_id, self.config.blocks_to_create_task)
            .await
            .is_some()
        {
            return Err(CompetitionError::TaskStillOngoing(task_id));
        }

        let mut tasks = self.tasks.write().await;
        let task = tasks
            .remove(&task_id)
            .ok_or(CompetitionError::UnknownTask(task_id))?;

        let payouts: Vec<(AccountAddress, Amount)> = match task.leader {
            Some(winner) => vec![(winner, task.bank)],
            None => task
                .commitments
                .iter()
                .map(|(account, commitment)| (*account, commitment.stake))
                .collect(),
        };

        // All credits are validated up front so settlement is all-or-nothing.
        for (account, amount) in &payouts {
            let current = self.balances.balance_of(*account).await;
            if current.checked_add(*amount).is_none() {
                tasks.insert(task_id, task);
                return Err(CompetitionError::BalanceOverflow(*account));
            }
        }
        for (account, amount) in &payouts {
            self.balances.credit(*account, *amount).await?;
        }

        if let Some(ref counter) = self.settlements_total {
            counter.inc();
        }

        let outcome = match task.leader {
            Some(winner) => {
                info!(
                    task = task_id.short_hex(),
                    winner = %winner,
                    amount = task.bank.to_units(),
                    score = hex::encode(&task.score.as_bytes()[..8]),
                    "🏆 Reward claimed"
                );
                SettlementOutcome::Paid {
                    winner,
                    amount: task.bank,
                }
            }
            None => {
                warn!(
                    task = task_id.short_hex(),
                    refunds = payouts.len(),
                    bank = task.bank.to_units(),
                    "Task expired with no reveals, refunding stakes"
                );
                SettlementOutcome::Refunded { refunds: payouts }
            }
        };

        Ok(outcome)
    }

    /// Get a task's public state.
    pub async fn task(&self, task_id: &BlockHash) -> Option<TaskView> {
        let tasks = self.tasks.read().await;
        tasks.get(task_id).map(|task| TaskView {
            bank: task.bank,
            score: task.score,
            leader: task.leader,
            commitment_count: task.commitments.len(),
        })
    }

    /// Number of active tasks.
    pub async fn task_count(&self) -> usize {
        let tasks = self.tasks.read().await;
        tasks.len()
    }

    /// Number of commitments recorded for a task.
    pub async fn commitment_count(&self, task_id: &BlockHash) -> usize {
        let tasks = self.tasks.read().await;
        tasks
            .get(task_id)
            .map(|task| task.commitments.len())
            .unwrap_or(0)
    }

    /// Sum of all task banks. For invariant checks.
    pub async fn total_banked(&self) -> Amount {
        let tasks = self.tasks.read().await;
        tasks.values().fold(Amount::ZERO, |acc, task| {
            acc.checked_add(task.bank).unwrap_or(acc)
        })
    }

    async fn ensure_ongoing(&self, task_id: &BlockHash) -> Result<u64> {
        self.find_block_by_hash(task_id, self.config.blocks_to_create_task)
            .await
            .ok_or(CompetitionError::TaskNotOngoing(*task_id))
    }
}
