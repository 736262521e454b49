//! Per-identity credit balances.

use alloy::primitives::U256;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::{TreasuryError, TreasuryResult};
use crate::identity::Identity;
use crate::ledger::hold::CreditHold;
use crate::observability::metrics;

/// Ledger entry for one identity.
///
/// `held` is the sum of in-flight redemption holds; it is neither spendable
/// nor reported as balance.
#[derive(Debug, Default, Clone, Copy)]
struct Account {
    available: U256,
    held: U256,
}

/// The authoritative identity → credit mapping.
///
/// Each mutation takes the owning shard's write lock for the duration of a
/// single arithmetic update, so operations on one identity are linearizable
/// and no lock outlives the call. In particular, nothing here is held while
/// a settlement waits on the chain.
#[derive(Debug, Default)]
pub struct LedgerStore {
    accounts: DashMap<Identity, Account>,
}

impl LedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add earned credits, creating the entry on first credit.
    pub fn credit(&self, identity: Identity, amount: U256) -> TreasuryResult<U256> {
        require_positive(amount)?;

        let balance = {
            let mut account = self.accounts.entry(identity).or_default();
            account.available = account
                .available
                .checked_add(amount)
                .ok_or_else(|| TreasuryError::InvalidAmount("credit overflows balance".into()))?;
            account.available
        };

        metrics::record_ledger_op("credit");
        metrics::record_ledger_identities(self.accounts.len());
        tracing::debug!(identity = %identity, amount = %amount, balance = %balance, "Credited");
        Ok(balance)
    }

    /// Subtract credits immediately.
    ///
    /// Redemptions go through [`LedgerStore::reserve`] instead so the amount
    /// is withheld while the transfer is in flight.
    pub fn debit(&self, identity: Identity, amount: U256) -> TreasuryResult<U256> {
        require_positive(amount)?;

        let balance = match self.accounts.get_mut(&identity) {
            Some(mut account) => {
                ensure_covered(amount, account.available)?;
                account.available -= amount;
                account.available
            }
            None => return Err(insufficient(amount, U256::ZERO)),
        };

        metrics::record_ledger_op("debit");
        tracing::debug!(identity = %identity, amount = %amount, balance = %balance, "Debited");
        Ok(balance)
    }

    /// Current spendable balance, zero for unknown identities.
    pub fn balance_of(&self, identity: &Identity) -> U256 {
        self.accounts
            .get(identity)
            .map(|account| account.available)
            .unwrap_or(U256::ZERO)
    }

    /// Withhold `amount` from the identity's balance for a redemption.
    ///
    /// The check and the decrement happen under one lock. The returned hold
    /// must be committed on confirmation; any other outcome releases it,
    /// including dropping it.
    pub fn reserve(self: &Arc<Self>, identity: Identity, amount: U256) -> TreasuryResult<CreditHold> {
        require_positive(amount)?;

        match self.accounts.get_mut(&identity) {
            Some(mut account) => {
                ensure_covered(amount, account.available)?;
                account.available -= amount;
                account.held += amount;
            }
            None => return Err(insufficient(amount, U256::ZERO)),
        }

        metrics::record_ledger_op("reserve");
        tracing::debug!(identity = %identity, amount = %amount, "Credits reserved");
        Ok(CreditHold::new(Arc::clone(self), identity, amount))
    }

    /// Drop a hold's amount for good. Returns the remaining balance.
    pub(crate) fn finalize_hold(&self, identity: &Identity, amount: U256) -> U256 {
        let balance = match self.accounts.get_mut(identity) {
            Some(mut account) => {
                account.held = account.held.saturating_sub(amount);
                account.available
            }
            None => U256::ZERO,
        };
        metrics::record_ledger_op("commit");
        balance
    }

    /// Return a hold's amount to the spendable balance.
    pub(crate) fn restore_hold(&self, identity: &Identity, amount: U256) -> U256 {
        let mut account = self.accounts.entry(*identity).or_default();
        account.held = account.held.saturating_sub(amount);
        account.available = account.available.saturating_add(amount);
        metrics::record_ledger_op("release");
        account.available
    }

    /// Amount currently withheld by in-flight redemptions.
    pub fn held_of(&self, identity: &Identity) -> U256 {
        self.accounts
            .get(identity)
            .map(|account| account.held)
            .unwrap_or(U256::ZERO)
    }

    /// Number of identities that have ever been credited.
    pub fn identity_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of all spendable balances.
    pub fn total_credits(&self) -> U256 {
        self.accounts
            .iter()
            .fold(U256::ZERO, |sum, entry| sum.saturating_add(entry.available))
    }
}

fn require_positive(amount: U256) -> TreasuryResult<()> {
    if amount.is_zero() {
        return Err(TreasuryError::InvalidAmount("Amount must be positive".into()));
    }
    Ok(())
}

fn ensure_covered(requested: U256, available: U256) -> TreasuryResult<()> {
    if requested > available {
        return Err(insufficient(requested, available));
    }
    Ok(())
}

fn insufficient(requested: U256, available: U256) -> TreasuryError {
    TreasuryError::InsufficientCredits { requested, available }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn eth(milli: u64) -> U256 {
        U256::from(milli) * U256::from(1_000_000_000_000_000u64)
    }

    fn user(byte: u8) -> Identity {
        Identity::from(Address::repeat_byte(byte))
    }

    #[test]
    fn test_running_balance() {
        let ledger = LedgerStore::new();
        let id = user(1);

        assert_eq!(ledger.balance_of(&id), U256::ZERO);
        assert_eq!(ledger.credit(id, eth(500)).unwrap(), eth(500));
        assert_eq!(ledger.credit(id, eth(250)).unwrap(), eth(750));
        assert_eq!(ledger.debit(id, eth(700)).unwrap(), eth(50));
        assert_eq!(ledger.debit(id, eth(50)).unwrap(), U256::ZERO);
        assert_eq!(ledger.balance_of(&id), U256::ZERO);
        assert_eq!(ledger.identity_count(), 1);
    }

    #[test]
    fn test_overdraw_leaves_balance() {
        let ledger = LedgerStore::new();
        let id = user(2);
        ledger.credit(id, eth(100)).unwrap();

        let err = ledger.debit(id, eth(200)).unwrap_err();
        assert_eq!(
            err,
            TreasuryError::InsufficientCredits {
                requested: eth(200),
                available: eth(100),
            }
        );
        assert_eq!(ledger.balance_of(&id), eth(100));
    }

    #[test]
    fn test_unknown_identity_cannot_debit() {
        let ledger = LedgerStore::new();
        assert!(matches!(
            ledger.debit(user(3), eth(1)),
            Err(TreasuryError::InsufficientCredits { .. })
        ));
        assert_eq!(ledger.identity_count(), 0);
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let ledger = LedgerStore::new();
        let id = user(4);
        assert!(matches!(ledger.credit(id, U256::ZERO), Err(TreasuryError::InvalidAmount(_))));
        assert!(matches!(ledger.debit(id, U256::ZERO), Err(TreasuryError::InvalidAmount(_))));
    }

    #[test]
    fn test_totals_span_identities() {
        let ledger = LedgerStore::new();
        ledger.credit(user(5), eth(100)).unwrap();
        ledger.credit(user(6), eth(300)).unwrap();
        assert_eq!(ledger.identity_count(), 2);
        assert_eq!(ledger.total_credits(), eth(400));
    }

    #[test]
    fn test_concurrent_credits_are_not_lost() {
        let ledger = Arc::new(LedgerStore::new());
        let id = user(7);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        ledger.credit(id, eth(1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.balance_of(&id), eth(2000));
    }

    #[test]
    fn test_concurrent_debits_never_go_negative() {
        let ledger = Arc::new(LedgerStore::new());
        let id = user(8);
        ledger.credit(id, eth(100)).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || ledger.debit(id, eth(10)).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 10);
        assert_eq!(ledger.balance_of(&id), U256::ZERO);
    }
}
