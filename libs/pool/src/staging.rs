//! Atomic multi-asset deposit staging.
//!
//! Asset transfers arrive as independent, unordered notifications - there is
//! no way to receive "all N at once" at the protocol boundary. The staging
//! instance for `(owner, pool)` turns those arrivals into one atomic
//! `update_reserves` call. Its address is derived deterministically, so
//! concurrent deposits from the same owner toward the same pool always land
//! on the same aggregator instead of forking a duplicate.
//!
//! Lifecycle: `Collecting` until a commit triggers, then the instance is
//! consumed (the runtime drops it from its registry), whether the pool
//! accepted the deposit or refunded it.

use crate::error::StagingError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::{derive_staging_address, Address, TokenId, U256};

/// What a staging call resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingOutcome {
    /// Still collecting; nothing left the instance.
    Pending,
    /// Hand the accumulated amounts to the pool and terminate.
    Commit {
        deposits: Vec<(TokenId, U256)>,
        min_shares: U256,
    },
}

/// Per-`(owner, pool)` deposit aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositStaging {
    address: Address,
    factory: Address,
    owner: Address,
    pool: Address,
    /// Accumulated amounts; one entry per distinct token, insertion order.
    deposits: Vec<(TokenId, U256)>,
}

impl DepositStaging {
    pub fn create(factory: Address, owner: Address, pool: Address) -> Self {
        Self {
            address: derive_staging_address(&owner, &pool),
            factory,
            owner,
            pool,
            deposits: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn deposits(&self) -> &[(TokenId, U256)] {
        &self.deposits
    }

    /// Record one asset arrival, forwarded by the factory boundary.
    ///
    /// Repeat arrivals of the same token accumulate onto its entry; the
    /// distinct-token count only grows on first sight. With a nonzero
    /// `expected_asset_count`, reaching that many distinct tokens commits in
    /// the same call - a later arrival carrying a lower expectation can
    /// therefore finalize a deposit that got stuck waiting.
    pub fn on_asset_deposit(
        &mut self,
        caller: Address,
        token: TokenId,
        amount: U256,
        expected_asset_count: u8,
        min_shares: U256,
    ) -> Result<StagingOutcome, StagingError> {
        if caller != self.factory {
            return Err(StagingError::Unauthorized {
                caller,
                operation: "deposit_notification",
            });
        }

        match self.deposits.iter_mut().find(|(held, _)| *held == token) {
            Some((_, held_amount)) => *held_amount = *held_amount + amount,
            None => self.deposits.push((token, amount)),
        }
        debug!(
            staging = %self.address,
            %token,
            %amount,
            distinct = self.deposits.len(),
            "asset staged"
        );

        if expected_asset_count > 0 && self.deposits.len() >= expected_asset_count as usize {
            return Ok(StagingOutcome::Commit {
                deposits: std::mem::take(&mut self.deposits),
                min_shares,
            });
        }
        Ok(StagingOutcome::Pending)
    }

    /// Explicit owner-triggered commit of whatever has accumulated.
    pub fn deposit_all(
        &mut self,
        caller: Address,
        min_shares: U256,
    ) -> Result<StagingOutcome, StagingError> {
        if caller != self.owner {
            return Err(StagingError::Unauthorized {
                caller,
                operation: "deposit_all",
            });
        }
        if self.deposits.is_empty() {
            return Err(StagingError::NoTokensDeposited);
        }
        Ok(StagingOutcome::Commit {
            deposits: std::mem::take(&mut self.deposits),
            min_shares,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 32])
    }

    fn token(byte: u8) -> TokenId {
        TokenId::Contract(addr(byte))
    }

    fn staging() -> DepositStaging {
        DepositStaging::create(addr(0xfa), addr(0x01), addr(0x02))
    }

    #[test]
    fn address_matches_derivation() {
        let s = staging();
        assert_eq!(
            s.address(),
            derive_staging_address(&addr(0x01), &addr(0x02))
        );
    }

    #[test]
    fn repeat_arrivals_accumulate_one_entry() {
        let mut s = staging();
        let factory = addr(0xfa);
        for _ in 0..2 {
            s.on_asset_deposit(factory, token(1), U256::from(42u8), 0, U256::zero())
                .unwrap();
        }
        s.on_asset_deposit(factory, token(2), U256::from(7u8), 0, U256::zero())
            .unwrap();

        assert_eq!(
            s.deposits(),
            &[
                (token(1), U256::from(84u8)),
                (token(2), U256::from(7u8)),
            ]
        );
    }

    #[test]
    fn auto_commits_at_expected_count() {
        let mut s = staging();
        let factory = addr(0xfa);
        let first = s
            .on_asset_deposit(factory, token(1), U256::from(1u8), 2, U256::zero())
            .unwrap();
        assert_eq!(first, StagingOutcome::Pending);

        let second = s
            .on_asset_deposit(factory, token(2), U256::from(2u8), 2, U256::zero())
            .unwrap();
        assert_eq!(
            second,
            StagingOutcome::Commit {
                deposits: vec![(token(1), U256::from(1u8)), (token(2), U256::from(2u8))],
                min_shares: U256::zero(),
            }
        );
    }

    #[test]
    fn lower_expectation_finalizes_a_stuck_deposit() {
        let mut s = staging();
        let factory = addr(0xfa);
        // First transfer expected a sibling that never showed up.
        s.on_asset_deposit(factory, token(1), U256::from(1u8), 2, U256::zero())
            .unwrap();
        // A follow-up expecting just one token flushes everything staged.
        let outcome = s
            .on_asset_deposit(factory, token(2), U256::from(2u8), 1, U256::zero())
            .unwrap();
        assert!(matches!(outcome, StagingOutcome::Commit { deposits, .. } if deposits.len() == 2));
    }

    #[test]
    fn deposit_all_is_owner_gated() {
        let mut s = staging();
        s.on_asset_deposit(addr(0xfa), token(1), U256::from(1u8), 0, U256::zero())
            .unwrap();

        let err = s.deposit_all(addr(0xee), U256::zero()).unwrap_err();
        assert!(matches!(err, StagingError::Unauthorized { .. }));

        let outcome = s.deposit_all(addr(0x01), U256::from(5u8)).unwrap();
        assert!(matches!(
            outcome,
            StagingOutcome::Commit { min_shares, .. } if min_shares == U256::from(5u8)
        ));
    }

    #[test]
    fn deposit_all_requires_staged_tokens() {
        let mut s = staging();
        assert_eq!(
            s.deposit_all(addr(0x01), U256::zero()),
            Err(StagingError::NoTokensDeposited)
        );
    }

    #[test]
    fn notifications_are_factory_gated() {
        let mut s = staging();
        let err = s
            .on_asset_deposit(addr(0x01), token(1), U256::from(1u8), 0, U256::zero())
            .unwrap_err();
        assert!(matches!(
            err,
            StagingError::Unauthorized {
                operation: "deposit_notification",
                ..
            }
        ));
    }
}
