//! End-to-end engine scenarios
//!
//! Walks the engine through complete user flows and checks balances and
//! reserves against hand-computed constant-product results.

use amm_ledger::{AmmAction, AmmEngine, AmmError, EngineConfig, Stateful};

const SCALE: u128 = 1_000_000_000;

#[test]
fn test_initial_pool_and_dust_swap() {
    let mut engine = AmmEngine::new();
    engine.mint_tokens("alice", "USDC", 1000).unwrap();
    engine.mint_tokens("alice", "ETH", 1).unwrap();

    let minted = engine
        .add_liquidity("alice", "USDC", "ETH", 1000, 1)
        .unwrap();
    // floor(sqrt(1 * 1000))
    assert_eq!(minted, 31);

    let reserves = engine.get_reserves("USDC", "ETH");
    assert_eq!(
        reserves.to_string(),
        "Reserves: ETH = 1, USDC = 1000, Total Liquidity: 31"
    );
    assert_eq!(engine.get_user_balance("alice", "USDC"), 0);
    assert_eq!(engine.get_user_balance("alice", "ETH"), 0);

    // 100 USDC against a single unit of ETH rounds down to nothing
    engine.mint_tokens("alice", "USDC", 100).unwrap();
    let out = engine
        .swap_exact_tokens_for_tokens("alice", "USDC", "ETH", 100, 0)
        .unwrap();
    assert_eq!(out, 0);
    assert_eq!(engine.get_user_balance("alice", "USDC"), 0);
    assert_eq!(engine.get_user_balance("alice", "ETH"), 0);

    let reserves = engine.get_reserves("ETH", "USDC");
    assert_eq!(reserves.reserve_of("USDC"), 1100);
    assert_eq!(reserves.reserve_of("ETH"), 1);
}

#[test]
fn test_balanced_pool_swap_with_fee() {
    let mut engine = AmmEngine::new();
    engine.mint_tokens("lp", "X", 100_000).unwrap();
    engine.mint_tokens("lp", "Y", 100_000).unwrap();
    engine
        .add_liquidity("lp", "X", "Y", 100_000, 100_000)
        .unwrap();

    engine.mint_tokens("trader", "X", 1000).unwrap();
    let out = engine
        .swap_exact_tokens_for_tokens("trader", "X", "Y", 1000, 980)
        .unwrap();
    assert_eq!(out, 987);
    assert_eq!(engine.get_user_balance("trader", "Y"), 987);

    let reserves = engine.get_reserves("Y", "X");
    assert_eq!(reserves.reserve_of("X"), 101_000);
    assert_eq!(reserves.reserve_of("Y"), 99_013);
    // fees stay in the pool
    assert!(reserves.reserve_a * reserves.reserve_b > 100_000 * 100_000);
}

#[test]
fn test_reserves_are_symmetric_in_token_order() {
    let mut engine = AmmEngine::new();
    engine.mint_tokens("alice", "BTC", 50).unwrap();
    engine.mint_tokens("alice", "USDC", 3_000_000).unwrap();
    engine
        .add_liquidity("alice", "USDC", "BTC", 3_000_000, 50)
        .unwrap();

    assert_eq!(
        engine.get_reserves("BTC", "USDC"),
        engine.get_reserves("USDC", "BTC")
    );
    assert_eq!(
        engine.liquidity_balance("alice", "BTC", "USDC"),
        engine.liquidity_balance("alice", "USDC", "BTC")
    );
    assert_eq!(engine.pool_count(), 1);
}

#[test]
fn test_unknown_pool_reads_as_zero() {
    let engine = AmmEngine::new();
    let reserves = engine.get_reserves("FOO", "BAR");
    assert_eq!(reserves.token_a, "BAR");
    assert_eq!(reserves.token_b, "FOO");
    assert_eq!(
        (reserves.reserve_a, reserves.reserve_b, reserves.total_liquidity),
        (0, 0, 0)
    );
    assert_eq!(engine.get_user_balance("nobody", "FOO"), 0);
}

#[test]
fn test_liquidity_round_trip_returns_deposit() {
    let mut engine = AmmEngine::new();
    engine.mint_tokens("alice", "DAI", 5000).unwrap();
    engine.mint_tokens("alice", "WETH", 5000).unwrap();
    engine.mint_tokens("bob", "DAI", 400).unwrap();
    engine.mint_tokens("bob", "WETH", 100).unwrap();

    engine
        .add_liquidity("alice", "DAI", "WETH", 4000, 1000)
        .unwrap();
    let shares = engine
        .add_liquidity("bob", "DAI", "WETH", 400, 100)
        .unwrap();
    assert_eq!(shares, 200);

    let (dai, weth) = engine
        .remove_liquidity("bob", "DAI", "WETH", shares)
        .unwrap();
    assert_eq!((dai, weth), (400, 100));
    assert_eq!(engine.liquidity_balance("bob", "DAI", "WETH"), 0);
    assert_eq!(engine.get_user_balance("bob", "DAI"), 400);
    assert_eq!(engine.get_user_balance("bob", "WETH"), 100);

    let reserves = engine.get_reserves("DAI", "WETH");
    assert_eq!(reserves.reserve_of("DAI"), 4000);
    assert_eq!(reserves.reserve_of("WETH"), 1000);
    assert_eq!(reserves.total_liquidity, 2000);
}

#[test]
fn test_pools_are_independent() {
    let mut engine = AmmEngine::new();
    for token in ["ETH", "USDC", "DAI"] {
        engine.mint_tokens("alice", token, 1_000_000).unwrap();
    }
    engine
        .add_liquidity("alice", "ETH", "USDC", 10_000, 200_000)
        .unwrap();
    engine
        .add_liquidity("alice", "USDC", "DAI", 50_000, 50_000)
        .unwrap();
    assert_eq!(engine.pool_count(), 2);

    let dai_pool = engine.get_reserves("DAI", "USDC");
    engine
        .swap_exact_tokens_for_tokens("alice", "ETH", "USDC", 500, 0)
        .unwrap();
    assert_eq!(engine.get_reserves("USDC", "DAI"), dai_pool);

    // no pool joins ETH and DAI directly
    let err = engine
        .swap_exact_tokens_for_tokens("alice", "ETH", "DAI", 500, 0)
        .unwrap_err();
    assert_eq!(
        err,
        AmmError::PoolNotFound {
            token_a: "DAI".to_string(),
            token_b: "ETH".to_string(),
        }
    );
}

#[test]
fn test_large_amounts() {
    let deposit = 1_000_000_000 * SCALE;
    let mut engine = AmmEngine::new();
    engine.mint_tokens("whale", "WETH", 2 * deposit).unwrap();
    engine.mint_tokens("whale", "USDC", 2 * deposit).unwrap();

    let minted = engine
        .add_liquidity("whale", "WETH", "USDC", deposit, deposit)
        .unwrap();
    assert_eq!(minted, deposit);

    let amount_in = 1_000_000 * SCALE;
    let out = engine
        .swap_exact_tokens_for_tokens("whale", "USDC", "WETH", amount_in, 0)
        .unwrap();
    assert!(out > 0 && out < amount_in);

    let (weth, usdc) = engine
        .remove_liquidity("whale", "WETH", "USDC", minted)
        .unwrap();
    assert_eq!(usdc, deposit + amount_in);
    assert_eq!(weth, deposit - out);
    assert_eq!(engine.get_user_balance("whale", "USDC"), 2 * deposit);
    assert_eq!(engine.get_user_balance("whale", "WETH"), 2 * deposit);
}

#[test]
fn test_overflowing_swap_is_rejected_without_side_effects() {
    let reserve = 10_000_000_000 * SCALE;
    let mut engine = AmmEngine::new();
    engine.mint_tokens("alice", "A", u128::MAX).unwrap();
    engine.mint_tokens("alice", "B", u128::MAX).unwrap();
    engine
        .add_liquidity("alice", "A", "B", reserve, reserve)
        .unwrap();
    let before = engine.commit().unwrap();

    // amount_in * 9970 * reserve no longer fits in 128 bits
    let err = engine
        .swap_exact_tokens_for_tokens("alice", "A", "B", 100_000_000 * SCALE, 0)
        .unwrap_err();
    assert_eq!(err.kind(), "ArithmeticOverflow");
    assert_eq!(engine.commit().unwrap(), before);
}

#[test]
fn test_action_batch_with_failures_continues() {
    let mut engine = AmmEngine::with_config(EngineConfig::default()).unwrap();
    let batch = vec![
        AmmAction::MintTokens {
            user: "alice".to_string(),
            token: "USDC".to_string(),
            amount: 1000,
        },
        AmmAction::SwapExactTokensForTokens {
            user: "alice".to_string(),
            token_in: "USDC".to_string(),
            token_out: "ETH".to_string(),
            amount_in: 10,
            min_amount_out: 0,
        },
        AmmAction::GetUserBalance {
            user: "alice".to_string(),
            token: "USDC".to_string(),
        },
    ];

    let results: Vec<_> = batch
        .into_iter()
        .map(|action| engine.apply_event(action))
        .collect();
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().kind(), "PoolNotFound");
    assert_eq!(
        results[2].as_ref().unwrap().to_string(),
        "User alice has 1000 USDC tokens"
    );
}

#[test]
fn test_commitment_survives_restore() {
    let mut engine = AmmEngine::new();
    engine.mint_tokens("alice", "USDC", 2000).unwrap();
    engine.mint_tokens("alice", "ETH", 2000).unwrap();
    engine
        .add_liquidity("alice", "USDC", "ETH", 1500, 1500)
        .unwrap();

    let commitment = engine.commit().unwrap();
    let mut restored =
        AmmEngine::from_commitment(&commitment, EngineConfig::default()).unwrap();
    assert_eq!(restored.commit().unwrap().to_hex(), commitment.to_hex());

    // the restored engine keeps trading identically
    let a = engine
        .swap_exact_tokens_for_tokens("alice", "ETH", "USDC", 100, 0)
        .unwrap();
    let b = restored
        .swap_exact_tokens_for_tokens("alice", "ETH", "USDC", 100, 0)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(engine.commit().unwrap(), restored.commit().unwrap());
}
