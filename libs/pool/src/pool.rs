//! The pool state machine.
//!
//! Every public method is one complete call: it validates, prices, and either
//! commits the whole balance transition or leaves state untouched. Paths
//! where the pool already custodies user funds (swaps, deposit commits) never
//! abort - they return a refund payout instead, carrying the instruction's
//! fail payload, so funds keep moving even when the trade cannot.

use crate::asset::Asset;
use crate::error::{DepositRejection, PoolError, SwapRejection};
use crate::quote::{
    self, balanced_withdrawal, deposit_quote, swap_quote, token_amount_estimate,
    withdraw_one_quote, DepositQuote, SwapQuote, WithdrawOneQuote,
};
use crate::ramp::AmplificationRamp;
use basin_math::{compute_d, MathError};
use codec::{SwapParams, WithdrawMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::constants::{MAX_A, MAX_A_CHANGE, MAX_ADMIN_FEE, MAX_COINS, MAX_FEE, RATE_SCALE};
use types::{derive_staging_address, Address, TokenId, U256};

/// One outbound transfer instruction toward the vault boundary.
///
/// Fire-and-forget from the pool's perspective; the payout sink owns
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub token: TokenId,
    pub amount: U256,
    pub recipient: Address,
    pub payload: Option<Vec<u8>>,
}

/// What a swap call resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Terminal hop: pay the output to the recipient.
    Payout(Payout),
    /// Business rule violated: return the input to the recipient.
    Refund {
        payout: Payout,
        reason: SwapRejection,
    },
    /// More hops remain: forward the output to the next pool.
    Forward {
        next_pool: Address,
        token: TokenId,
        amount: U256,
        params: SwapParams,
    },
}

/// What a deposit commit resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    /// Reserves updated; mint `shares` to `depositor` on the share ledger.
    Minted { depositor: Address, shares: U256 },
    /// Deposit rejected: every staged asset travels back to the depositor.
    Refunded {
        reason: DepositRejection,
        payouts: Vec<Payout>,
    },
}

/// A committed share burn: one payout per nonzero withdrawal amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnOutcome {
    pub owner: Address,
    pub shares_burned: U256,
    pub payouts: Vec<Payout>,
}

/// Pool construction parameters.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub address: Address,
    pub factory: Address,
    pub rates_manager: Address,
    /// `(token, precision)` per asset; precision is `10^(18 - decimals)`.
    pub assets: Vec<(TokenId, U256)>,
    /// Initial 18-decimal fixed-point rate per asset.
    pub rates: Vec<U256>,
    pub initial_a: u64,
    pub fee: u64,
    pub admin_fee_share: u64,
}

/// Read-only state snapshot, the `get_pool_data` surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: Address,
    pub factory: Address,
    pub rates_manager: Address,
    pub assets: Vec<Asset>,
    pub total_shares: U256,
    pub a: u64,
    pub fee: u64,
    pub admin_fee_share: u64,
}

/// One pool instance. See the crate docs for the operation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    address: Address,
    factory: Address,
    rates_manager: Address,
    assets: Vec<Asset>,
    total_shares: U256,
    ramp: AmplificationRamp,
    fee: u64,
    admin_fee_share: u64,
}

impl Pool {
    /// One-time initialization; a pool is `Active` for its whole lifetime
    /// afterwards (re-registration under the same address is the runtime's
    /// double-init guard).
    pub fn init(config: PoolConfig) -> Result<Self, PoolError> {
        let n = config.assets.len();
        if !(2..=MAX_COINS).contains(&n) {
            return Err(PoolError::InvalidAssets {
                reason: "asset count outside 2..=8",
            });
        }
        for (i, (token, precision)) in config.assets.iter().enumerate() {
            if precision.is_zero() {
                return Err(PoolError::InvalidAssets {
                    reason: "zero precision",
                });
            }
            if config.assets[i + 1..].iter().any(|(other, _)| other == token) {
                return Err(PoolError::InvalidAssets {
                    reason: "duplicate token",
                });
            }
        }
        if config.rates.len() != n {
            return Err(PoolError::InvalidRates {
                expected: n,
                got: config.rates.len(),
            });
        }
        if config.rates.iter().any(U256::is_zero) {
            return Err(PoolError::InvalidRates { expected: n, got: n });
        }
        if config.initial_a == 0 || config.initial_a > MAX_A {
            return Err(PoolError::InvalidAmplification {
                target: config.initial_a,
                current: config.initial_a,
            });
        }
        if config.fee > MAX_FEE {
            return Err(PoolError::InvalidFee {
                value: config.fee,
                max: MAX_FEE,
            });
        }
        if config.admin_fee_share > MAX_ADMIN_FEE {
            return Err(PoolError::InvalidFee {
                value: config.admin_fee_share,
                max: MAX_ADMIN_FEE,
            });
        }

        let assets = config
            .assets
            .into_iter()
            .zip(config.rates)
            .map(|((token, precision), rate)| Asset {
                token,
                balance: U256::zero(),
                admin_fee_balance: U256::zero(),
                precision,
                rate,
            })
            .collect();

        Ok(Self {
            address: config.address,
            factory: config.factory,
            rates_manager: config.rates_manager,
            assets,
            total_shares: U256::zero(),
            ramp: AmplificationRamp::flat(config.initial_a),
            fee: config.fee,
            admin_fee_share: config.admin_fee_share,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn n_coins(&self) -> usize {
        self.assets.len()
    }

    pub fn total_shares(&self) -> U256 {
        self.total_shares
    }

    pub fn asset_index(&self, token: &TokenId) -> Option<usize> {
        self.assets.iter().position(|asset| asset.token == *token)
    }

    /// Interpolated amplification at `now`.
    pub fn current_a(&self, now: u64) -> u64 {
        self.ramp.current(now)
    }

    pub fn balances(&self) -> Vec<U256> {
        self.assets.iter().map(|asset| asset.balance).collect()
    }

    pub fn admin_fee_balances(&self) -> Vec<U256> {
        self.assets
            .iter()
            .map(|asset| asset.admin_fee_balance)
            .collect()
    }

    pub fn snapshot(&self, now: u64) -> PoolSnapshot {
        PoolSnapshot {
            address: self.address,
            factory: self.factory,
            rates_manager: self.rates_manager,
            assets: self.assets.clone(),
            total_shares: self.total_shares,
            a: self.current_a(now),
            fee: self.fee,
            admin_fee_share: self.admin_fee_share,
        }
    }

    // ---- swaps -----------------------------------------------------------

    /// Execute the current hop of a routed swap.
    ///
    /// `token_in`/`amount_in` is what the vault credited to this pool;
    /// `params.steps[0]` must name this pool. Business failures refund
    /// `amount_in` to the recipient with the fail payload attached; only
    /// solver failures and an empty route are hard errors.
    pub fn swap(
        &mut self,
        now: u64,
        token_in: TokenId,
        amount_in: U256,
        params: SwapParams,
    ) -> Result<SwapOutcome, PoolError> {
        let step = params.steps.first().cloned().ok_or(PoolError::EmptyRoute)?;

        if step.pool != self.address {
            return Ok(self.refund(
                token_in,
                amount_in,
                &params,
                SwapRejection::MalformedRoute {
                    expected: self.address,
                    got: step.pool,
                },
            ));
        }
        if now > params.deadline {
            return Ok(self.refund(
                token_in,
                amount_in,
                &params,
                SwapRejection::DeadlineExpired {
                    deadline: params.deadline,
                    now,
                },
            ));
        }
        let Some(index_in) = self.asset_index(&token_in) else {
            return Ok(self.refund(
                token_in,
                amount_in,
                &params,
                SwapRejection::UnknownTokenIn { token: token_in },
            ));
        };
        let Some(index_out) = self.asset_index(&step.to_token) else {
            return Ok(self.refund(
                token_in,
                amount_in,
                &params,
                SwapRejection::UnknownTokenOut {
                    token: step.to_token,
                },
            ));
        };

        let amount_out = if index_in == index_out {
            // Degenerate same-asset hop: hand the input straight through,
            // fee-free, without touching reserves.
            amount_in
        } else {
            let SwapQuote {
                amount_out,
                admin_fee,
            } = swap_quote(
                &self.assets,
                self.current_a(now),
                self.fee,
                self.admin_fee_share,
                index_in,
                index_out,
                amount_in,
            )?;

            if amount_out < step.limit {
                return Ok(self.refund(
                    token_in,
                    amount_in,
                    &params,
                    SwapRejection::LimitNotMet {
                        quoted: amount_out,
                        limit: step.limit,
                    },
                ));
            }

            let charged = amount_out
                .checked_add(admin_fee)
                .and_then(|total| self.assets[index_out].balance.checked_sub(total))
                .ok_or(MathError::Overflow {
                    context: "output reserve underflow",
                })?;
            self.assets[index_in].balance = self.assets[index_in].balance + amount_in;
            self.assets[index_out].balance = charged;
            self.assets[index_out].admin_fee_balance =
                self.assets[index_out].admin_fee_balance + admin_fee;

            debug!(
                pool = %self.address,
                index_in,
                index_out,
                %amount_in,
                %amount_out,
                %admin_fee,
                "swap committed"
            );
            amount_out
        };

        if params.steps.len() == 1 {
            return Ok(SwapOutcome::Payout(Payout {
                token: step.to_token,
                amount: amount_out,
                recipient: params.recipient,
                payload: params.success_payload,
            }));
        }

        let remaining = SwapParams {
            steps: params.steps[1..].to_vec(),
            recipient: params.recipient,
            deadline: params.deadline,
            success_payload: params.success_payload,
            fail_payload: params.fail_payload,
        };
        Ok(SwapOutcome::Forward {
            next_pool: remaining.steps[0].pool,
            token: step.to_token,
            amount: amount_out,
            params: remaining,
        })
    }

    fn refund(
        &self,
        token_in: TokenId,
        amount_in: U256,
        params: &SwapParams,
        reason: SwapRejection,
    ) -> SwapOutcome {
        warn!(pool = %self.address, ?reason, %amount_in, "swap refunded");
        SwapOutcome::Refund {
            payout: Payout {
                token: token_in,
                amount: amount_in,
                recipient: params.recipient,
                payload: params.fail_payload.clone(),
            },
            reason,
        }
    }

    /// Quote a swap without mutating anything (the `get_dy` getter).
    pub fn get_dy(&self, now: u64, i: usize, j: usize, dx: U256) -> Result<U256, PoolError> {
        self.check_index(i)?;
        self.check_index(j)?;
        let quote = swap_quote(
            &self.assets,
            self.current_a(now),
            self.fee,
            self.admin_fee_share,
            i,
            j,
            dx,
        )?;
        Ok(quote.amount_out)
    }

    // ---- liquidity -------------------------------------------------------

    /// Commit a staged deposit into reserves.
    ///
    /// Only the deterministic staging instance for `(depositor, pool)` may
    /// call this; the pool re-derives that address itself. Rejections refund
    /// every staged asset to the depositor.
    pub fn update_reserves(
        &mut self,
        now: u64,
        caller: Address,
        depositor: Address,
        deposits: &[(TokenId, U256)],
        min_shares: U256,
    ) -> Result<DepositOutcome, PoolError> {
        let expected = derive_staging_address(&depositor, &self.address);
        if caller != expected {
            return Err(PoolError::CallerNotAuthorized {
                caller,
                operation: "update_reserves",
            });
        }

        // Resolve staged tokens onto asset indices before touching anything.
        let mut amounts = vec![U256::zero(); self.assets.len()];
        for (token, amount) in deposits {
            let Some(index) = self.asset_index(token) else {
                return Ok(self.refund_deposit(
                    depositor,
                    deposits,
                    DepositRejection::UnknownToken { token: *token },
                ));
            };
            amounts[index] = amounts[index] + *amount;
        }

        let DepositQuote { shares, admin_fees } = match deposit_quote(
            &self.assets,
            self.current_a(now),
            self.fee,
            self.admin_fee_share,
            self.total_shares,
            &amounts,
        ) {
            Ok(quote) => quote,
            Err(MathError::ZeroBalance { .. }) if self.total_shares.is_zero() => {
                return Ok(self.refund_deposit(
                    depositor,
                    deposits,
                    DepositRejection::InsufficientSeedAssets,
                ));
            }
            Err(err @ MathError::Convergence { .. }) => return Err(err.into()),
            Err(err) => {
                return Ok(self.refund_deposit(depositor, deposits, DepositRejection::Math(err)));
            }
        };

        if shares < min_shares {
            return Ok(self.refund_deposit(
                depositor,
                deposits,
                DepositRejection::SharesBelowMinimum {
                    minted: shares,
                    min: min_shares,
                },
            ));
        }

        for (i, asset) in self.assets.iter_mut().enumerate() {
            asset.balance = asset.balance + amounts[i] - admin_fees[i];
            asset.admin_fee_balance = asset.admin_fee_balance + admin_fees[i];
        }
        self.total_shares = self.total_shares + shares;

        debug!(pool = %self.address, depositor = %depositor, %shares, "deposit committed");
        Ok(DepositOutcome::Minted { depositor, shares })
    }

    fn refund_deposit(
        &self,
        depositor: Address,
        deposits: &[(TokenId, U256)],
        reason: DepositRejection,
    ) -> DepositOutcome {
        warn!(pool = %self.address, depositor = %depositor, ?reason, "deposit refunded");
        let payouts = deposits
            .iter()
            .map(|(token, amount)| Payout {
                token: *token,
                amount: *amount,
                recipient: depositor,
                payload: None,
            })
            .collect();
        DepositOutcome::Refunded { reason, payouts }
    }

    /// Burn `shares` into assets per the withdrawal mode.
    ///
    /// Any policy failure here is a hard error: the shares are not burned and
    /// nothing is paid out (the share ledger returns them to the owner).
    pub fn burn_shares(
        &mut self,
        now: u64,
        owner: Address,
        shares: U256,
        mode: WithdrawMode,
    ) -> Result<BurnOutcome, PoolError> {
        if shares > self.total_shares {
            return Err(PoolError::InsufficientShares {
                shares,
                total: self.total_shares,
            });
        }

        let payouts = match mode {
            WithdrawMode::Balanced { min_amounts } => {
                if min_amounts.len() != self.assets.len() {
                    return Err(PoolError::InvalidWithdrawFloors {
                        expected: self.assets.len(),
                        got: min_amounts.len(),
                    });
                }
                let amounts = balanced_withdrawal(&self.assets, self.total_shares, shares)?;
                for (index, (amount, min)) in amounts.iter().zip(&min_amounts).enumerate() {
                    if amount < min {
                        return Err(PoolError::WithdrawalFloorNotMet {
                            index,
                            amount: *amount,
                            min: *min,
                        });
                    }
                }

                let mut payouts = Vec::new();
                for (asset, amount) in self.assets.iter_mut().zip(&amounts) {
                    asset.balance = asset.balance - *amount;
                    if !amount.is_zero() {
                        payouts.push(Payout {
                            token: asset.token,
                            amount: *amount,
                            recipient: owner,
                            payload: None,
                        });
                    }
                }
                payouts
            }
            WithdrawMode::SingleCoin { index, min_amount } => {
                let index = index as usize;
                self.check_index(index)?;
                let WithdrawOneQuote {
                    amount_out,
                    admin_fee,
                } = withdraw_one_quote(
                    &self.assets,
                    self.current_a(now),
                    self.fee,
                    self.admin_fee_share,
                    self.total_shares,
                    shares,
                    index,
                )?;
                if amount_out < min_amount {
                    return Err(PoolError::WithdrawalFloorNotMet {
                        index,
                        amount: amount_out,
                        min: min_amount,
                    });
                }

                let asset = &mut self.assets[index];
                asset.balance = asset
                    .balance
                    .checked_sub(amount_out + admin_fee)
                    .ok_or(MathError::Overflow {
                        context: "withdrawal reserve underflow",
                    })?;
                asset.admin_fee_balance = asset.admin_fee_balance + admin_fee;

                if amount_out.is_zero() {
                    Vec::new()
                } else {
                    vec![Payout {
                        token: asset.token,
                        amount: amount_out,
                        recipient: owner,
                        payload: None,
                    }]
                }
            }
        };

        self.total_shares = self.total_shares - shares;
        debug!(pool = %self.address, owner = %owner, %shares, "shares burned");
        Ok(BurnOutcome {
            owner,
            shares_burned: shares,
            payouts,
        })
    }

    /// Share estimate for a deposit or withdrawal (`calc_token_amount`).
    pub fn calc_token_amount(
        &self,
        now: u64,
        amounts: &[U256],
        is_deposit: bool,
    ) -> Result<U256, PoolError> {
        if amounts.len() != self.assets.len() {
            return Err(PoolError::InvalidWithdrawFloors {
                expected: self.assets.len(),
                got: amounts.len(),
            });
        }
        Ok(token_amount_estimate(
            &self.assets,
            self.current_a(now),
            self.fee,
            self.admin_fee_share,
            self.total_shares,
            amounts,
            is_deposit,
        )?)
    }

    /// Quote a single-coin withdrawal (`get_withdraw_one_coin`).
    pub fn get_withdraw_one_coin(
        &self,
        now: u64,
        shares: U256,
        index: usize,
    ) -> Result<U256, PoolError> {
        self.check_index(index)?;
        if shares > self.total_shares {
            return Err(PoolError::InsufficientShares {
                shares,
                total: self.total_shares,
            });
        }
        let quote = withdraw_one_quote(
            &self.assets,
            self.current_a(now),
            self.fee,
            self.admin_fee_share,
            self.total_shares,
            shares,
            index,
        )?;
        Ok(quote.amount_out)
    }

    /// `D * RATE_SCALE / total_shares`: share price in the normalized unit.
    pub fn virtual_price(&self, now: u64) -> Result<U256, PoolError> {
        let xp = quote::normalized_balances(&self.assets)?;
        let ann = quote::amplification(self.current_a(now), self.assets.len())?;
        let d = compute_d(&xp, ann)?;
        Ok(quote::mul_div(d, U256::from(RATE_SCALE), self.total_shares)?)
    }

    // ---- admin -----------------------------------------------------------

    /// Replace the per-asset exchange rates (rates manager only).
    pub fn update_rates(&mut self, caller: Address, rates: &[U256]) -> Result<(), PoolError> {
        if caller != self.rates_manager {
            return Err(PoolError::CallerNotAuthorized {
                caller,
                operation: "update_rates",
            });
        }
        if rates.len() != self.assets.len() || rates.iter().any(U256::is_zero) {
            return Err(PoolError::InvalidRates {
                expected: self.assets.len(),
                got: rates.len(),
            });
        }
        for (asset, rate) in self.assets.iter_mut().zip(rates) {
            asset.rate = *rate;
        }
        debug!(pool = %self.address, "rates updated");
        Ok(())
    }

    /// Hand rate-update authority to a new manager (factory only).
    pub fn update_rates_manager(
        &mut self,
        caller: Address,
        new_manager: Address,
    ) -> Result<(), PoolError> {
        self.require_factory(caller, "update_rates_manager")?;
        self.rates_manager = new_manager;
        Ok(())
    }

    /// Replace fee parameters (factory only).
    pub fn update_fees(
        &mut self,
        caller: Address,
        fee: u64,
        admin_fee_share: u64,
    ) -> Result<(), PoolError> {
        self.require_factory(caller, "update_fees")?;
        if fee > MAX_FEE {
            return Err(PoolError::InvalidFee {
                value: fee,
                max: MAX_FEE,
            });
        }
        if admin_fee_share > MAX_ADMIN_FEE {
            return Err(PoolError::InvalidFee {
                value: admin_fee_share,
                max: MAX_ADMIN_FEE,
            });
        }
        self.fee = fee;
        self.admin_fee_share = admin_fee_share;
        Ok(())
    }

    /// Schedule a linear amplification ramp toward `target_a` completing at
    /// `completion_time` (factory only).
    pub fn update_amplification(
        &mut self,
        caller: Address,
        now: u64,
        target_a: u64,
        completion_time: u64,
    ) -> Result<(), PoolError> {
        self.require_factory(caller, "update_amplification")?;
        if completion_time <= now {
            return Err(PoolError::RampTimeInPast {
                completion: completion_time,
                now,
            });
        }
        let current = self.current_a(now);
        let too_large = target_a > current.saturating_mul(MAX_A_CHANGE);
        let too_small = target_a < current / MAX_A_CHANGE || target_a == 0;
        if target_a > MAX_A || too_large || too_small {
            return Err(PoolError::InvalidAmplification {
                target: target_a,
                current,
            });
        }
        self.ramp.schedule(now, target_a, completion_time);
        debug!(pool = %self.address, target_a, completion_time, "amplification ramp scheduled");
        Ok(())
    }

    /// Freeze the amplification at its current interpolated value (factory
    /// only).
    pub fn stop_amplification_ramp(&mut self, caller: Address, now: u64) -> Result<(), PoolError> {
        self.require_factory(caller, "stop_amplification_ramp")?;
        self.ramp.stop(now);
        Ok(())
    }

    /// Pay out collected admin fees (factory only).
    ///
    /// A zero amount, and an amount above the tracked balance, are silent
    /// no-ops: the call succeeds and nothing is sent.
    pub fn withdraw_admin_fees(
        &mut self,
        caller: Address,
        token: TokenId,
        recipient: Address,
        amount: U256,
    ) -> Result<Option<Payout>, PoolError> {
        self.require_factory(caller, "withdraw_admin_fees")?;
        let index = self
            .asset_index(&token)
            .ok_or(PoolError::UnknownToken { token })?;

        if amount.is_zero() {
            return Ok(None);
        }
        if amount > self.assets[index].admin_fee_balance {
            warn!(
                pool = %self.address,
                %amount,
                available = %self.assets[index].admin_fee_balance,
                "admin fee withdrawal exceeds balance; nothing sent"
            );
            return Ok(None);
        }

        self.assets[index].admin_fee_balance = self.assets[index].admin_fee_balance - amount;
        Ok(Some(Payout {
            token,
            amount,
            recipient,
            payload: None,
        }))
    }

    fn require_factory(&self, caller: Address, operation: &'static str) -> Result<(), PoolError> {
        if caller != self.factory {
            return Err(PoolError::CallerNotAuthorized { caller, operation });
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), PoolError> {
        if index >= self.assets.len() {
            return Err(PoolError::AssetIndexOutOfRange {
                index,
                n_coins: self.assets.len(),
            });
        }
        Ok(())
    }
}
