//! The engine: instance registry, FIFO dispatch, effect outbox.

use crate::message::{Effect, Envelope, Message};
use anyhow::{anyhow, Context, Result};
use codec::{ForwardPayload, SwapParams, WithdrawMode};
use oracle::Oracle;
use pool::{
    BurnOutcome, DepositOutcome, DepositStaging, Payout, Pool, StagingOutcome, SwapOutcome,
};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};
use types::{derive_staging_address, Address, TokenId, U256};

/// Registration and boundary-submission failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An instance already lives at this address
    #[error("address {address} is already registered")]
    AlreadyRegistered { address: Address },

    /// No instance lives at this address
    #[error("no instance registered at {address}")]
    UnknownInstance { address: Address },
}

/// Deterministic single-threaded execution engine.
///
/// `factory` is the trusted notifier identity of the vault boundary: deposit
/// notifications reach staging instances under this identity, matching the
/// staging instances' own authorization check.
pub struct Engine {
    now: u64,
    factory: Address,
    pools: HashMap<Address, Pool>,
    stagings: HashMap<Address, DepositStaging>,
    oracles: HashMap<Address, Oracle>,
    queue: VecDeque<Envelope>,
    outbox: Vec<Effect>,
}

impl Engine {
    pub fn new(factory: Address) -> Self {
        Self {
            now: 0,
            factory,
            pools: HashMap::new(),
            stagings: HashMap::new(),
            oracles: HashMap::new(),
            queue: VecDeque::new(),
            outbox: Vec::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Advance the injected clock; deadlines and ramps read this value.
    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    // ---- registry --------------------------------------------------------

    /// Install a pool; a second registration at the same address is the
    /// double-init error of the modeled chain.
    pub fn register_pool(&mut self, pool: Pool) -> Result<(), EngineError> {
        let address = pool.address();
        if self.pools.contains_key(&address) {
            return Err(EngineError::AlreadyRegistered { address });
        }
        self.pools.insert(address, pool);
        Ok(())
    }

    pub fn register_oracle(&mut self, address: Address, oracle: Oracle) -> Result<(), EngineError> {
        if self.oracles.contains_key(&address) {
            return Err(EngineError::AlreadyRegistered { address });
        }
        self.oracles.insert(address, oracle);
        Ok(())
    }

    pub fn pool(&self, address: &Address) -> Option<&Pool> {
        self.pools.get(address)
    }

    pub fn pool_mut(&mut self, address: &Address) -> Option<&mut Pool> {
        self.pools.get_mut(address)
    }

    pub fn oracle_mut(&mut self, address: &Address) -> Option<&mut Oracle> {
        self.oracles.get_mut(address)
    }

    /// The staging instance for `(owner, pool)`, if currently collecting.
    pub fn staging(&self, owner: &Address, pool: &Address) -> Option<&DepositStaging> {
        self.stagings.get(&derive_staging_address(owner, pool))
    }

    /// Drain accumulated boundary effects, in emission order.
    pub fn drain_outbox(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbox)
    }

    // ---- boundary entrypoints --------------------------------------------

    /// An asset transfer arrived at the vault boundary carrying an opaque
    /// forward payload. Decodes into a swap or deposit instruction and
    /// enqueues the corresponding call. A payload that does not decode is a
    /// transport-level bounce: nothing was accepted.
    pub fn asset_transfer(
        &mut self,
        from: Address,
        token: TokenId,
        amount: U256,
        forward_payload: &[u8],
    ) -> Result<()> {
        let payload = ForwardPayload::decode(forward_payload)
            .context("asset transfer forward payload did not decode")?;
        match payload {
            ForwardPayload::Swap(params) => {
                let first = params
                    .steps
                    .first()
                    .ok_or_else(|| anyhow!("swap payload with no hops"))?;
                self.queue.push_back(Envelope {
                    from: self.factory,
                    to: first.pool,
                    message: Message::SwapNotification {
                        token,
                        amount,
                        params,
                    },
                });
            }
            ForwardPayload::Deposit(params) => {
                self.queue.push_back(Envelope {
                    from: self.factory,
                    to: params.pool,
                    message: Message::DepositNotification {
                        owner: from,
                        token,
                        amount,
                        expected_asset_count: params.expected_asset_count,
                        min_shares: params.min_shares,
                    },
                });
            }
        }
        self.run();
        Ok(())
    }

    /// Owner-triggered commit of their staging instance for `pool`.
    pub fn deposit_all(
        &mut self,
        caller: Address,
        pool: Address,
        min_shares: U256,
    ) -> Result<(), EngineError> {
        let staging_address = derive_staging_address(&caller, &pool);
        if !self.stagings.contains_key(&staging_address) {
            return Err(EngineError::UnknownInstance {
                address: staging_address,
            });
        }
        self.queue.push_back(Envelope {
            from: caller,
            to: pool,
            message: Message::DepositAll {
                owner: caller,
                min_shares,
            },
        });
        self.run();
        Ok(())
    }

    /// Share ledger notified the pool that `owner` burned `shares`;
    /// `payload` encodes the withdrawal mode.
    pub fn burn_notification(
        &mut self,
        pool: Address,
        owner: Address,
        shares: U256,
        payload: Vec<u8>,
    ) {
        self.queue.push_back(Envelope {
            from: owner,
            to: pool,
            message: Message::BurnNotification {
                owner,
                shares,
                payload,
            },
        });
        self.run();
    }

    /// Oracle-side `send_price`: build the rates vector for `pool` and push
    /// it under the oracle's identity. The pool only accepts the push if the
    /// oracle is its configured rates manager.
    pub fn send_price(&mut self, oracle_address: Address, pool_address: Address) -> Result<()> {
        let pool = self
            .pools
            .get(&pool_address)
            .ok_or(EngineError::UnknownInstance {
                address: pool_address,
            })?;
        let oracle = self
            .oracles
            .get(&oracle_address)
            .ok_or(EngineError::UnknownInstance {
                address: oracle_address,
            })?;
        let rates = oracle
            .build_rates(pool.n_coins())
            .context("oracle cannot build a full rates vector")?;

        self.queue.push_back(Envelope {
            from: oracle_address,
            to: pool_address,
            message: Message::UpdateRates { rates },
        });
        self.run();
        Ok(())
    }

    // ---- dispatch --------------------------------------------------------

    /// Process queued envelopes to exhaustion, strictly FIFO. Each envelope
    /// is one serialized call on its target instance.
    pub fn run(&mut self) {
        while let Some(envelope) = self.queue.pop_front() {
            self.dispatch(envelope);
        }
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { from, to, message } = envelope;
        match message {
            Message::SwapNotification {
                token,
                amount,
                params,
            } => self.handle_swap(from, to, token, amount, params, false),
            Message::PeerSwap {
                token,
                amount,
                params,
            } => self.handle_swap(from, to, token, amount, params, true),
            Message::DepositNotification {
                owner,
                token,
                amount,
                expected_asset_count,
                min_shares,
            } => self.handle_deposit_notification(
                from,
                to,
                owner,
                token,
                amount,
                expected_asset_count,
                min_shares,
            ),
            Message::DepositAll { owner, min_shares } => {
                self.handle_deposit_all(from, to, owner, min_shares)
            }
            Message::BurnNotification {
                owner,
                shares,
                payload,
            } => self.handle_burn(to, owner, shares, payload),
            Message::UpdateRates { rates } => self.handle_update_rates(from, to, rates),
        }
    }

    fn handle_swap(
        &mut self,
        from: Address,
        to: Address,
        token: TokenId,
        amount: U256,
        params: SwapParams,
        is_peer_hop: bool,
    ) {
        // A peer hop must come from a pool this engine knows; anything else
        // could forge mid-route state.
        if is_peer_hop && !self.pools.contains_key(&from) {
            self.reject(to, format!("peer_swap from unregistered sender {from}"));
            return;
        }

        let now = self.now;
        let Some(pool) = self.pools.get_mut(&to) else {
            // The pool is gone or never existed: compensate the sender's
            // recipient rather than strand the transfer.
            self.outbox.push(Effect::Payout {
                source: from,
                payout: Payout {
                    token,
                    amount,
                    recipient: params.recipient,
                    payload: params.fail_payload,
                },
            });
            warn!(%to, "swap target pool not found; input refunded");
            return;
        };

        match pool.swap(now, token, amount, params) {
            Ok(SwapOutcome::Payout(payout)) => {
                self.outbox.push(Effect::Payout { source: to, payout });
            }
            Ok(SwapOutcome::Refund { payout, .. }) => {
                self.outbox.push(Effect::Payout { source: to, payout });
            }
            Ok(SwapOutcome::Forward {
                next_pool,
                token,
                amount,
                params,
            }) => {
                if self.pools.contains_key(&next_pool) {
                    debug!(%to, %next_pool, %amount, "hop committed, forwarding");
                    self.queue.push_back(Envelope {
                        from: to,
                        to: next_pool,
                        message: Message::PeerSwap {
                            token,
                            amount,
                            params,
                        },
                    });
                } else {
                    // Next hop unreachable: this hop stays committed, its
                    // output compensates the recipient directly.
                    warn!(%next_pool, "next hop unreachable; compensating payout");
                    self.outbox.push(Effect::Payout {
                        source: to,
                        payout: Payout {
                            token,
                            amount,
                            recipient: params.recipient,
                            payload: params.fail_payload,
                        },
                    });
                }
            }
            Err(err) => {
                self.reject(to, format!("swap failed: {err}"));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_deposit_notification(
        &mut self,
        from: Address,
        pool_address: Address,
        owner: Address,
        token: TokenId,
        amount: U256,
        expected_asset_count: u8,
        min_shares: U256,
    ) {
        if !self.pools.contains_key(&pool_address) {
            // No such pool: bounce the asset straight back.
            self.outbox.push(Effect::Payout {
                source: from,
                payout: Payout {
                    token,
                    amount,
                    recipient: owner,
                    payload: None,
                },
            });
            warn!(%pool_address, "deposit target pool not found; asset returned");
            return;
        }

        let factory = self.factory;
        let staging_address = derive_staging_address(&owner, &pool_address);
        let staging = self
            .stagings
            .entry(staging_address)
            .or_insert_with(|| DepositStaging::create(factory, owner, pool_address));

        match staging.on_asset_deposit(from, token, amount, expected_asset_count, min_shares) {
            Ok(StagingOutcome::Pending) => {}
            Ok(StagingOutcome::Commit {
                deposits,
                min_shares,
            }) => {
                self.commit_deposit(staging_address, pool_address, owner, deposits, min_shares);
            }
            Err(err) => {
                self.reject(staging_address, format!("deposit notification: {err}"));
            }
        }
    }

    fn handle_deposit_all(
        &mut self,
        caller: Address,
        pool_address: Address,
        owner: Address,
        min_shares: U256,
    ) {
        let staging_address = derive_staging_address(&owner, &pool_address);
        let Some(staging) = self.stagings.get_mut(&staging_address) else {
            self.reject(staging_address, "no staging instance".to_string());
            return;
        };
        match staging.deposit_all(caller, min_shares) {
            Ok(StagingOutcome::Commit {
                deposits,
                min_shares,
            }) => {
                self.commit_deposit(staging_address, pool_address, owner, deposits, min_shares);
            }
            Ok(StagingOutcome::Pending) => unreachable!("deposit_all never leaves state pending"),
            Err(err) => {
                self.reject(staging_address, format!("deposit_all: {err}"));
            }
        }
    }

    /// Single commit call into the pool; the staging instance terminates
    /// either way, and refunds (if any) are the pool's payouts.
    fn commit_deposit(
        &mut self,
        staging_address: Address,
        pool_address: Address,
        owner: Address,
        deposits: Vec<(TokenId, U256)>,
        min_shares: U256,
    ) {
        self.stagings.remove(&staging_address);

        let now = self.now;
        let Some(pool) = self.pools.get_mut(&pool_address) else {
            // Pools are never deregistered; if the target is gone anyway,
            // the staged assets travel back to the owner.
            warn!(%pool_address, "commit target pool not found; deposits returned");
            for (token, amount) in deposits {
                self.outbox.push(Effect::Payout {
                    source: staging_address,
                    payout: Payout {
                        token,
                        amount,
                        recipient: owner,
                        payload: None,
                    },
                });
            }
            return;
        };
        match pool.update_reserves(now, staging_address, owner, &deposits, min_shares) {
            Ok(DepositOutcome::Minted { depositor, shares }) => {
                self.outbox.push(Effect::SharesMinted {
                    pool: pool_address,
                    owner: depositor,
                    shares,
                });
            }
            Ok(DepositOutcome::Refunded { payouts, reason }) => {
                debug!(%pool_address, ?reason, "deposit refunded");
                for payout in payouts {
                    self.outbox.push(Effect::Payout {
                        source: pool_address,
                        payout,
                    });
                }
            }
            Err(err) => {
                self.reject(pool_address, format!("update_reserves: {err}"));
            }
        }
    }

    fn handle_burn(&mut self, pool_address: Address, owner: Address, shares: U256, payload: Vec<u8>) {
        let now = self.now;
        let Some(pool) = self.pools.get_mut(&pool_address) else {
            self.reject(pool_address, "no such pool".to_string());
            return;
        };

        // A payload that does not decode fails the whole burn: no payouts,
        // shares reported back to the owner.
        let mode = match WithdrawMode::decode(&payload) {
            Ok(mode) => mode,
            Err(err) => {
                self.outbox.push(Effect::BurnRejected {
                    pool: pool_address,
                    owner,
                    shares,
                    error: format!("malformed withdrawal payload: {err}"),
                });
                return;
            }
        };

        match pool.burn_shares(now, owner, shares, mode) {
            Ok(BurnOutcome {
                owner,
                shares_burned,
                payouts,
            }) => {
                self.outbox.push(Effect::SharesBurned {
                    pool: pool_address,
                    owner,
                    shares: shares_burned,
                });
                for payout in payouts {
                    self.outbox.push(Effect::Payout {
                        source: pool_address,
                        payout,
                    });
                }
            }
            Err(err) => {
                self.outbox.push(Effect::BurnRejected {
                    pool: pool_address,
                    owner,
                    shares,
                    error: err.to_string(),
                });
            }
        }
    }

    fn handle_update_rates(&mut self, from: Address, pool_address: Address, rates: Vec<U256>) {
        let Some(pool) = self.pools.get_mut(&pool_address) else {
            self.reject(pool_address, "no such pool".to_string());
            return;
        };
        if let Err(err) = pool.update_rates(from, &rates) {
            self.reject(pool_address, format!("update_rates: {err}"));
        }
    }

    fn reject(&mut self, to: Address, error: String) {
        warn!(%to, error, "call rejected");
        self.outbox.push(Effect::Rejected { to, error });
    }
}
