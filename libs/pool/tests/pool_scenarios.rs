//! End-to-end pool behaviors: heterogeneous precisions, reserve drain
//! resistance, rate-aware single-coin withdrawals and liquidity round trips.

use codec::{SwapParams, SwapStep, WithdrawMode};
use pool::{DepositOutcome, Pool, PoolConfig, SwapOutcome};
use types::constants::{precision_for_decimals, FEE_DENOMINATOR, RATE_SCALE};
use types::{derive_staging_address, Address, TokenId, U256};

fn addr(byte: u8) -> Address {
    Address([byte; 32])
}

/// Token identity of asset `index` in every pool built here.
fn token_at(index: usize) -> TokenId {
    TokenId::Contract(addr(0x10 + index as u8))
}

const FACTORY: u8 = 0xfa;
const USER: u8 = 0x05;

struct PoolSpec {
    decimals: Vec<u32>,
    rates: Vec<U256>,
    liquidity: Vec<U256>,
    a: u64,
    fee: u64,
    admin_fee_share: u64,
}

fn build_pool(spec: PoolSpec) -> Pool {
    let config = PoolConfig {
        address: addr(0xb0),
        factory: addr(FACTORY),
        rates_manager: addr(FACTORY),
        assets: spec
            .decimals
            .iter()
            .enumerate()
            .map(|(i, d)| (token_at(i), U256::from(precision_for_decimals(*d))))
            .collect(),
        rates: spec.rates,
        initial_a: spec.a,
        fee: spec.fee,
        admin_fee_share: spec.admin_fee_share,
    };
    let mut pool = Pool::init(config).unwrap();

    let depositor = addr(USER);
    let staging = derive_staging_address(&depositor, &pool.address());
    let deposits: Vec<(TokenId, U256)> = spec
        .liquidity
        .iter()
        .enumerate()
        .map(|(i, liquidity)| (token_at(i), *liquidity))
        .collect();
    let outcome = pool
        .update_reserves(0, staging, depositor, &deposits, U256::zero())
        .unwrap();
    assert!(
        matches!(outcome, DepositOutcome::Minted { .. }),
        "seed deposit must mint: {outcome:?}"
    );
    pool
}

fn hop_to(pool: &Pool, to: usize, limit: U256) -> SwapParams {
    SwapParams {
        steps: vec![SwapStep {
            pool: pool.address(),
            to_token: token_at(to),
            limit,
        }],
        recipient: addr(USER),
        deadline: 1_000_000,
        success_payload: None,
        fail_payload: None,
    }
}

#[test]
fn quotes_match_execution_across_precisions() {
    // 8-, 9- and 13-decimal assets in one pool, 0.3% fee, half to admin.
    let one8 = U256::from(10u64).pow(U256::from(8u8));
    let one9 = U256::from(10u64).pow(U256::from(9u8));
    let one13 = U256::from(10u64).pow(U256::from(13u8));
    let units = U256::from(1_000_000u64);

    let mut pool = build_pool(PoolSpec {
        decimals: vec![8, 9, 13],
        rates: vec![U256::from(RATE_SCALE); 3],
        liquidity: vec![units * one8, units * one9, units * one13],
        a: 200,
        fee: 30_000_000,
        admin_fee_share: FEE_DENOMINATOR / 2,
    });

    let amount_in = U256::from(10_000u64) * one8;
    let quote = pool.get_dy(0, 0, 1, amount_in).unwrap();

    let outcome = pool
        .swap(0, token_at(0), amount_in, hop_to(&pool, 1, quote))
        .unwrap();
    let SwapOutcome::Payout(payout) = outcome else {
        panic!("expected payout, got {outcome:?}");
    };
    assert_eq!(payout.amount, quote);

    // 10_000 units in at 0.3% fee: just under 9_970 units out.
    let units_out = payout.amount / one9;
    assert!(
        units_out == U256::from(9_969u64) || units_out == U256::from(9_970u64),
        "unexpected output: {units_out}"
    );
}

#[test]
fn output_reserve_never_drains_to_zero() {
    // Swap five orders of magnitude more than the pool holds, repeatedly.
    let liquidity = U256::from(100_000u64);
    let mut pool = build_pool(PoolSpec {
        decimals: vec![8, 8, 8],
        rates: vec![U256::from(RATE_SCALE); 3],
        liquidity: vec![liquidity; 3],
        a: 200,
        fee: 0,
        admin_fee_share: 0,
    });

    let amount_in = liquidity.pow(U256::from(5u8));

    let outcome = pool
        .swap(0, token_at(0), amount_in, hop_to(&pool, 1, U256::one()))
        .unwrap();
    let SwapOutcome::Payout(payout) = outcome else {
        panic!("expected payout, got {outcome:?}");
    };
    // All but the last unit of the destination reserve is paid out.
    assert_eq!(payout.amount, liquidity - U256::one());
    assert_eq!(pool.balances()[1], U256::one());
    assert_eq!(pool.balances()[0], liquidity + amount_in);

    // Further identical swaps quote zero output and refund against a 1-unit
    // limit, leaving the final reserve unit in place.
    let outcome = pool
        .swap(0, token_at(0), amount_in, hop_to(&pool, 1, U256::one()))
        .unwrap();
    assert!(
        matches!(outcome, SwapOutcome::Refund { .. }),
        "drained reserve must refuse further swaps: {outcome:?}"
    );
    assert_eq!(pool.balances()[1], U256::one());
}

#[test]
fn single_coin_withdrawal_accounts_for_rates() {
    // A pool holding equal-decimal assets at live oracle rates; withdraw
    // 1/80 of the shares into the third asset. The payout equals the
    // proportional slice of total pool value expressed in that asset, up to
    // solver rounding.
    let rate0 = U256::from(RATE_SCALE);
    let rate1 = U256::from(1_053_573_440u64) * U256::from(1_000_000_000u64);
    let rate2 = U256::from(1_046_677_804u64) * U256::from(1_000_000_000u64);
    let precision = U256::from(precision_for_decimals(9));

    let liquidity = [
        U256::from(100_000u64),
        U256::from(94_915u64),
        U256::from(95_540u64),
    ];
    let mut pool = build_pool(PoolSpec {
        decimals: vec![9, 9, 9],
        rates: vec![rate0, rate1, rate2],
        liquidity: liquidity.to_vec(),
        a: 200,
        fee: 0,
        admin_fee_share: FEE_DENOMINATOR / 2,
    });

    let shares = pool.total_shares() / U256::from(80u8);
    let estimate = pool.get_withdraw_one_coin(0, shares, 2).unwrap();

    // total normalized value / 80, denormalized at asset 2's precision+rate
    let total_value = liquidity[0] * precision * rate0 / U256::from(RATE_SCALE)
        + liquidity[1] * precision * rate1 / U256::from(RATE_SCALE)
        + liquidity[2] * precision * rate2 / U256::from(RATE_SCALE);
    let expected =
        total_value * U256::from(RATE_SCALE) / (U256::from(80u8) * precision * rate2);

    let diff = if estimate > expected {
        estimate - expected
    } else {
        expected - estimate
    };
    assert!(
        diff <= U256::from(2u8),
        "estimate {estimate} vs expected {expected}"
    );

    // Executing the burn pays exactly the estimate.
    let outcome = pool
        .burn_shares(
            0,
            addr(USER),
            shares,
            WithdrawMode::SingleCoin {
                index: 2,
                min_amount: estimate,
            },
        )
        .unwrap();
    assert_eq!(outcome.payouts.len(), 1);
    assert_eq!(outcome.payouts[0].amount, estimate);
}

#[test]
fn burning_all_shares_returns_initial_liquidity() {
    let liquidity = U256::from(5_000_000u64);
    let mut pool = build_pool(PoolSpec {
        decimals: vec![8, 9],
        rates: vec![U256::from(RATE_SCALE); 2],
        liquidity: vec![liquidity; 2],
        a: 200,
        fee: 30_000_000,
        admin_fee_share: FEE_DENOMINATOR / 2,
    });

    let outcome = pool
        .burn_shares(
            0,
            addr(USER),
            pool.total_shares(),
            WithdrawMode::Balanced {
                min_amounts: vec![liquidity; 2],
            },
        )
        .unwrap();
    assert_eq!(outcome.payouts.len(), 2);
    for payout in &outcome.payouts {
        assert_eq!(payout.amount, liquidity);
    }
    assert_eq!(pool.total_shares(), U256::zero());
    assert_eq!(pool.balances(), vec![U256::zero(); 2]);
}

#[test]
fn share_estimate_matches_minted_amount() {
    // calc_token_amount in the deposit direction prices the imbalance fee,
    // so its result is safe to pass as the depositor's minimum.
    let one9 = U256::from(10u64).pow(U256::from(9u8));
    let mut pool = build_pool(PoolSpec {
        decimals: vec![9, 9, 9],
        rates: vec![U256::from(RATE_SCALE); 3],
        liquidity: vec![
            U256::from(1_000u64) * one9,
            U256::from(1_001u64) * one9,
            U256::from(1_001u64) * one9,
        ],
        a: 200,
        fee: 3_000_000,
        admin_fee_share: FEE_DENOMINATOR / 2,
    });

    let amount = U256::from(42u64) * one9;
    let amounts = vec![U256::zero(), amount, U256::zero()];
    let estimate = pool.calc_token_amount(0, &amounts, true).unwrap();
    assert!(!estimate.is_zero());

    let depositor = addr(USER);
    let staging = derive_staging_address(&depositor, &pool.address());
    let shares_before = pool.total_shares();
    let outcome = pool
        .update_reserves(0, staging, depositor, &[(token_at(1), amount)], estimate)
        .unwrap();

    let DepositOutcome::Minted { shares, .. } = outcome else {
        panic!("estimate should satisfy its own floor");
    };
    assert_eq!(shares, estimate);
    assert_eq!(pool.total_shares(), shares_before + shares);
}

#[test]
fn deposits_only_increase_pool_value() {
    let one9 = U256::from(10u64).pow(U256::from(9u8));
    let mut pool = build_pool(PoolSpec {
        decimals: vec![9, 9],
        rates: vec![U256::from(RATE_SCALE); 2],
        liquidity: vec![U256::from(10_000u64) * one9; 2],
        a: 100,
        fee: 30_000_000,
        admin_fee_share: FEE_DENOMINATOR / 2,
    });

    let value_of = |pool: &Pool| -> U256 {
        pool.balances()
            .iter()
            .fold(U256::zero(), |acc, b| acc + *b)
    };

    let before = value_of(&pool);
    let depositor = addr(USER);
    let staging = derive_staging_address(&depositor, &pool.address());
    pool.update_reserves(
        0,
        staging,
        depositor,
        &[(token_at(0), U256::from(777u64) * one9)],
        U256::zero(),
    )
    .unwrap();
    assert!(value_of(&pool) > before);
}
