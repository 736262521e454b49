//! Pessimistic credit holds for in-flight redemptions.

use alloy::primitives::U256;
use std::sync::Arc;

use crate::identity::Identity;
use crate::ledger::store::LedgerStore;

/// Credits withheld from an identity while its transfer is unresolved.
///
/// Created by [`LedgerStore::reserve`]. [`CreditHold::commit`] makes the
/// deduction permanent; [`CreditHold::release`] or dropping the hold gives
/// the credits back.
#[derive(Debug)]
#[must_use = "dropping a hold releases the credits"]
pub struct CreditHold {
    ledger: Arc<LedgerStore>,
    identity: Identity,
    amount: U256,
    settled: bool,
}

impl CreditHold {
    pub(crate) fn new(ledger: Arc<LedgerStore>, identity: Identity, amount: U256) -> Self {
        Self {
            ledger,
            identity,
            amount,
            settled: false,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    /// Finalize the debit. Returns the identity's remaining balance.
    pub fn commit(mut self) -> U256 {
        self.settled = true;
        let balance = self.ledger.finalize_hold(&self.identity, self.amount);
        tracing::info!(
            identity = %self.identity,
            amount = %self.amount,
            balance = %balance,
            "Credit hold committed"
        );
        balance
    }

    /// Return the credits. Returns the identity's balance afterwards.
    pub fn release(mut self) -> U256 {
        self.settled = true;
        self.restore()
    }

    fn restore(&self) -> U256 {
        let balance = self.ledger.restore_hold(&self.identity, self.amount);
        tracing::info!(
            identity = %self.identity,
            amount = %self.amount,
            balance = %balance,
            "Credit hold released"
        );
        balance
    }
}

impl Drop for CreditHold {
    fn drop(&mut self) {
        if !self.settled {
            self.restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreasuryError;
    use alloy::primitives::Address;

    fn setup(credits: u64) -> (Arc<LedgerStore>, Identity) {
        let ledger = Arc::new(LedgerStore::new());
        let id = Identity::from(Address::repeat_byte(0x11));
        ledger.credit(id, U256::from(credits)).unwrap();
        (ledger, id)
    }

    #[test]
    fn test_reserve_withholds_balance() {
        let (ledger, id) = setup(100);
        let hold = ledger.reserve(id, U256::from(60u64)).unwrap();

        assert_eq!(ledger.balance_of(&id), U256::from(40u64));
        assert_eq!(ledger.held_of(&id), U256::from(60u64));
        assert!(matches!(
            ledger.reserve(id, U256::from(50u64)),
            Err(TreasuryError::InsufficientCredits { .. })
        ));

        assert_eq!(hold.commit(), U256::from(40u64));
        assert_eq!(ledger.held_of(&id), U256::ZERO);
        assert_eq!(ledger.balance_of(&id), U256::from(40u64));
    }

    #[test]
    fn test_release_restores_balance() {
        let (ledger, id) = setup(100);
        let hold = ledger.reserve(id, U256::from(100u64)).unwrap();
        assert_eq!(ledger.balance_of(&id), U256::ZERO);

        assert_eq!(hold.release(), U256::from(100u64));
        assert_eq!(ledger.held_of(&id), U256::ZERO);
    }

    #[test]
    fn test_drop_releases() {
        let (ledger, id) = setup(100);
        {
            let _hold = ledger.reserve(id, U256::from(30u64)).unwrap();
            assert_eq!(ledger.balance_of(&id), U256::from(70u64));
        }
        assert_eq!(ledger.balance_of(&id), U256::from(100u64));
    }

    #[test]
    fn test_credit_during_hold() {
        let (ledger, id) = setup(100);
        let hold = ledger.reserve(id, U256::from(100u64)).unwrap();
        ledger.credit(id, U256::from(5u64)).unwrap();

        assert_eq!(hold.release(), U256::from(105u64));
    }
}
