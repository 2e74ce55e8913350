//! End-to-end scenarios: snapshot -> store -> registry -> engine.

use pizzalend_core::{
    AliasConfig, Converter, EngineConfig, Error, ExtendedAsset, ExtendedSymbol, HealthEvaluator,
    Infeasible, LiquidationEngine, Name, PositionAggregator, ReserveRegistry, Symbol,
};
use pizzalend_store::{MemoryStore, Snapshot, StoreError};

const SNAPSHOT: &str = r#"
    [[reserves]]
    id = "pzusdt"
    wrapped = "4,PZUSDT@pztken.pizza"
    anchor = "4,USDT@tethertether"
    cumulative_deposit = "2000000.0000 USDT"
    available_deposit = "1000000.0000 USDT"
    wrapped_supply = "0.0000 PZUSDT"
    borrow = "0.0000 USDT"
    cumulative_borrow = "0.0000 USDT"
    variable_borrow = "0.0000 USDT"
    stable_borrow = "0.0000 USDT"
    price = "1.0000"
    exchange_rate = "1.000388"
    updated_at = "2024-01-01T00:00:00Z"

    [reserves.config]
    liquidation_rate_bps = 10000
    liquidation_bonus_bps = 500
    max_ltv_bps = 8000

    [[reserves]]
    id = "pzeos"
    wrapped = "4,PZEOS@pztken.pizza"
    anchor = "4,EOS@eosio.token"
    cumulative_deposit = "100000.0000 EOS"
    available_deposit = "100000.0000 EOS"
    wrapped_supply = "0.0000 PZEOS"
    borrow = "0.0000 EOS"
    cumulative_borrow = "0.0000 EOS"
    variable_borrow = "0.0000 EOS"
    stable_borrow = "0.0000 EOS"
    price = "5.0000"
    exchange_rate = "1"
    updated_at = "2024-01-01T00:00:00Z"

    [reserves.config]
    liquidation_rate_bps = 8000
    liquidation_bonus_bps = 1000
    max_ltv_bps = 7000

    # alice: 100 EOS posted (worth 500, risk-weighted 400), 500 USDT owed
    [[collaterals]]
    id = 1
    account = "alice"
    reserve = "pzeos"
    quantity = "100.0000 PZEOS"
    updated_at = "2024-01-01T00:00:00Z"

    [[loans]]
    id = 1
    account = "alice"
    reserve = "pzusdt"
    principal = "500.0000 USDT"
    outstanding_scaled = 49999990000
    rate_type = "variable"
    last_calculated_at = "2024-01-01T00:00:00Z"
    updated_at = "2024-01-01T00:00:00Z"

    # carol: collateral only
    [[collaterals]]
    id = 2
    account = "carol"
    reserve = "pzusdt"
    quantity = "10.0000 PZUSDT"
    updated_at = "2024-01-01T00:00:00Z"
"#;

fn store() -> MemoryStore {
    Snapshot::from_toml(SNAPSHOT).unwrap().into_store().unwrap()
}

fn registry(store: &MemoryStore) -> ReserveRegistry {
    ReserveRegistry::from_store(store, AliasConfig::default()).unwrap()
}

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

fn asset(s: &str) -> ExtendedAsset {
    s.parse().unwrap()
}

#[test]
fn wrap_produces_documented_ratio() {
    let store = store();
    let registry = registry(&store);
    let converter = Converter::new(&registry, &store);

    let pzusdt: Symbol = "4,PZUSDT".parse().unwrap();
    let out = converter
        .get_amount_out(&asset("1.0000 USDT@tethertether"), &pzusdt)
        .unwrap();
    assert_eq!(out, asset("0.9996 PZUSDT@pztken.pizza"));

    // Round trip never gains
    let back = converter.unwrap(&out, false).unwrap();
    assert!(back.amount() <= 10_000);
}

#[test]
fn unwrap_is_all_or_nothing_at_deposit_limit() {
    let store = store();
    let registry = registry(&store);
    let converter = Converter::new(&registry, &store);

    let wrapped = asset("1000000.0000 PZUSDT@pztken.pizza");
    assert!(converter.unwrap(&wrapped, false).unwrap().is_zero());
    assert_eq!(
        converter.unwrap(&wrapped, true).unwrap(),
        asset("1000388.0000 USDT@tethertether")
    );
}

#[test]
fn lookalike_issuer_is_not_lendable() {
    let store = store();
    let registry = registry(&store);
    let converter = Converter::new(&registry, &store);

    let result = converter.wrap(&asset("1.0000 USDT@fake.token"));
    assert!(matches!(result, Err(Error::NotLendable(_))));

    let pzusdt: Symbol = "4,PZUSDT".parse().unwrap();
    let result = converter.get_amount_out(&asset("1.0000 USDT@fake.token"), &pzusdt);
    assert!(matches!(result, Err(Error::NotConvertible { .. })));
}

#[test]
fn unhealthy_account_has_factor_point_eight() {
    let store = store();
    let registry = registry(&store);
    let evaluator = HealthEvaluator::new(PositionAggregator::new(&registry, &store));

    let factor = evaluator.health_factor(&name("alice")).unwrap();
    assert_eq!(factor.to_string(), "0.8");

    let report = evaluator.evaluate(&name("alice")).unwrap();
    assert!(report.is_liquidatable());
    assert!((report.loan_value_f64() - 500.0).abs() < 1e-9);
}

#[test]
fn collateral_only_account_is_never_liquidatable() {
    let store = store();
    let registry = registry(&store);
    let evaluator = HealthEvaluator::new(PositionAggregator::new(&registry, &store));

    let report = evaluator.evaluate(&name("carol")).unwrap();
    assert!(report.factor.is_zero());
    assert!(!report.is_liquidatable());
}

#[test]
fn liquidation_quote_pays_two_thirds_of_bonus() {
    let store = store();
    let registry = registry(&store);
    let config = EngineConfig::default();
    let engine = LiquidationEngine::new(
        PositionAggregator::new(&registry, &store),
        config.liquidation,
    );
    let eos: ExtendedSymbol = "4,EOS@eosio.token".parse().unwrap();

    let (quote, candidate) = engine
        .quote(&name("alice"), &asset("400.0000 USDT@tethertether"), &eos)
        .unwrap();
    assert_eq!(quote.collateral_out, asset("85.3333 EOS@eosio.token"));
    assert_eq!(quote.seized_wrapped, Some(asset("85.3333 PZEOS@pztken.pizza")));
    let candidate = candidate.unwrap();
    assert_eq!(candidate.account, name("alice"));

    // Repaying all 500 USDT would take 106.6666 EOS, more than is posted
    let (quote, candidate) = engine
        .quote(&name("alice"), &asset("500.0000 USDT@tethertether"), &eos)
        .unwrap();
    assert_eq!(quote.infeasible, Some(Infeasible::ExceedsHeldCollateral));
    assert!(candidate.is_none());
}

#[test]
fn collateral_split_across_rows_is_combined() {
    let mut snapshot = Snapshot::from_toml(SNAPSHOT).unwrap();
    snapshot.collaterals[0].quantity = "50.0000 PZEOS".parse().unwrap();
    let mut second = snapshot.collaterals[0].clone();
    second.id = 3;
    snapshot.collaterals.push(second);
    let store = snapshot.into_store().unwrap();
    let registry = registry(&store);
    let engine = LiquidationEngine::new(
        PositionAggregator::new(&registry, &store),
        EngineConfig::default().liquidation,
    );
    let eos: ExtendedSymbol = "4,EOS@eosio.token".parse().unwrap();

    let (quote, candidate) = engine
        .quote(&name("alice"), &asset("400.0000 USDT@tethertether"), &eos)
        .unwrap();
    assert_eq!(quote.infeasible, None);
    assert_eq!(quote.collateral_out, asset("85.3333 EOS@eosio.token"));
    assert!(candidate.is_some());
}

#[test]
fn debt_free_account_has_no_matching_loan() {
    let store = store();
    let registry = registry(&store);
    let aggregator = PositionAggregator::new(&registry, &store);
    let usdt: ExtendedSymbol = "4,USDT@tethertether".parse().unwrap();

    // No loan matches whether or not health is rechecked
    for config in [EngineConfig::strict(), EngineConfig::permissive()] {
        let engine = LiquidationEngine::new(aggregator, config.liquidation);
        let (quote, _) = engine
            .quote(&name("carol"), &asset("1.0000 USDT@tethertether"), &usdt)
            .unwrap();
        assert_eq!(quote.infeasible, Some(Infeasible::NoMatchingLoan));
    }
}

#[test]
fn store_rejects_shared_anchor() {
    let mut snapshot = Snapshot::from_toml(SNAPSHOT).unwrap();
    let mut clone = snapshot.reserves[0].clone();
    clone.id = name("pzusdtb");
    clone.wrapped = "4,PZUSDTB@pztken.pizza".parse().unwrap();
    clone.wrapped_supply = "0.0000 PZUSDTB".parse().unwrap();
    snapshot.reserves.push(clone.clone());
    assert!(snapshot.into_store().is_err());

    let store = MemoryStore::new();
    let first = Snapshot::from_toml(SNAPSHOT).unwrap().reserves.remove(0);
    store.insert_reserve(first).unwrap();
    assert!(matches!(
        store.insert_reserve(clone),
        Err(StoreError::DuplicateAnchor { .. })
    ));
}
