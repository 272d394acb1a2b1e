use crate::error::{CompetitionError, Result};
use hashrace_types::{AccountAddress, Amount};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Per-account value ledger owned by the engine. Stakes attached to a
/// commitment are debited here; settlement payouts and refunds are credited
/// back. Accounts are funded by the embedding application via `credit`.
pub struct BalanceManager {
    balances: Arc<RwLock<HashMap<AccountAddress, Amount>>>,
}

impl Default for BalanceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceManager {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn balance_of(&self, account: AccountAddress) -> Amount {
        let balances = self.balances.read().await;
        balances.get(&account).copied().unwrap_or(Amount::ZERO)
    }

    pub async fn credit(&self, account: AccountAddress, amount: Amount) -> Result<()> {
        if amount == Amount::ZERO {
            return Ok(());
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(&account).copied().unwrap_or(Amount::ZERO);
        let new_balance = current
            .checked_add(amount)
            .ok_or(CompetitionError::BalanceOverflow(account))?;
        balances.insert(account, new_balance);

        info!(
            account = %account,
            amount = amount.to_units(),
            balance_before = current.to_units(),
            balance_after = new_balance.to_units(),
            "💰 Balance credited"
        );
        Ok(())
    }

    pub async fn debit(&self, account: AccountAddress, amount: Amount) -> Result<()> {
        if amount == Amount::ZERO {
            return Ok(());
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(&account).copied().unwrap_or(Amount::ZERO);
        let new_balance =
            current
                .checked_sub(amount)
                .ok_or(CompetitionError::InsufficientBalance {
                    account,
                    available: current,
                    required: amount,
                })?;

        if new_balance == Amount::ZERO {
            balances.remove(&account);
        } else {
            balances.insert(account, new_balance);
        }

        info!(
            account = %account,
            amount = amount.to_units(),
            balance_before = current.to_units(),
            balance_after = new_balance.to_units(),
            "💸 Balance debited"
        );
        Ok(())
    }

    /// Sum of all account balances. Saturating, for invariant checks only.
    pub async fn total(&self) -> Amount {
        let balances = self.balances.read().await;
        balances.values().fold(Amount::ZERO, |acc, amount| {
            acc.checked_add(*amount).unwrap_or(acc)
        })
    }
}
