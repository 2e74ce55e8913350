//! pizzalend health and liquidation report
//!
//! Loads a reserve/position snapshot and, for every account:
//! - logs a health report (debt, risk-weighted collateral, borrow limit, factor)
//! - quotes a liquidation against its preferred debt/collateral pair when the
//!   health factor is below one
//!
//! Nothing is transferred or persisted.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pizzalend_core::u256_math::BPS_DENOMINATOR;
use pizzalend_core::{
    AccountPositions, EngineConfig, ExtendedAsset, HealthEvaluator, LiquidationEngine, Name,
    PositionAggregator, PositionStore, ReserveRegistry,
};
use pizzalend_store::Snapshot;

/// Environment variable names.
mod env {
    pub const SNAPSHOT: &str = "PIZZALEND_SNAPSHOT";
}

const DEFAULT_SNAPSHOT: &str = "data/snapshot.toml";

/// Repay fractions tried in turn, in basis points of the loan.
const REPAY_STEPS_BPS: [i64; 3] = [10_000, 5_000, 2_500];

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pizzalend_core=debug")),
        )
        .init();

    // PIZZALEND_CONFIG (file) or PIZZALEND_PROFILE (default, strict, permissive)
    let config = EngineConfig::from_env().context("Failed to load engine config")?;
    config.log_config();

    let snapshot_path =
        std::env::var(env::SNAPSHOT).unwrap_or_else(|_| DEFAULT_SNAPSHOT.to_string());
    let store = Snapshot::from_file(&snapshot_path)?.into_store()?;

    let registry = ReserveRegistry::from_store(&store, config.aliases.clone())
        .context("Failed to build reserve registry")?;
    let aggregator = PositionAggregator::new(&registry, &store);
    let evaluator = HealthEvaluator::new(aggregator);
    let engine = LiquidationEngine::new(aggregator, config.liquidation.clone());

    let accounts = store.accounts();
    info!(accounts = accounts.len(), reserves = registry.len(), "Evaluating accounts");

    let mut liquidatable = 0usize;
    for account in &accounts {
        let report = match evaluator.evaluate(account) {
            Ok(report) => report,
            Err(e) => {
                warn!(account = %account, error = %e, "Skipping account");
                continue;
            }
        };

        info!(
            account = %account,
            debt = report.loan_value_f64(),
            collateral = report.collateral_value_f64(),
            factor = %report.factor,
            "Health report"
        );

        if report.is_liquidatable() {
            liquidatable += 1;
            if let Err(e) = quote_account(&engine, &aggregator, account) {
                warn!(account = %account, error = %e, "Skipping quote");
            }
        }
    }

    info!(liquidatable, "Done");
    Ok(())
}

/// `step` basis points of `amount`, floored.
fn repay_step(amount: i64, step: i64) -> Result<i64> {
    let scaled = i128::from(amount) * i128::from(step) / i128::from(BPS_DENOMINATOR);
    i64::try_from(scaled).context("Repay amount out of range")
}

/// Quote the account's preferred pair, shrinking the repay amount until the
/// payout fits the held collateral.
fn quote_account(
    engine: &LiquidationEngine<'_>,
    aggregator: &PositionAggregator<'_>,
    account: &Name,
) -> Result<()> {
    let positions = AccountPositions::load(aggregator, account)?;
    let Some((loan, collateral)) = engine.preferred_pair(&positions.loans, &positions.collaterals)?
    else {
        warn!(account = %account, "No liquidatable pair");
        return Ok(());
    };

    for step in REPAY_STEPS_BPS {
        let amount = repay_step(loan.asset.amount(), step)?;
        let repay = ExtendedAsset::from_amount(amount, loan.asset.extended_symbol());
        let (quote, candidate) = engine.quote(account, &repay, &collateral.asset.extended_symbol())?;

        if let Some(candidate) = candidate {
            info!(
                account = %candidate.account,
                repay = %candidate.repay,
                collateral = %candidate.collateral,
                value_out = quote.value_out_f64(),
                "Liquidation quote"
            );
            return Ok(());
        }
        if let Some(reason) = quote.infeasible {
            info!(account = %account, repay = %repay, reason = %reason, "Quote rejected");
        }
    }
    Ok(())
}
