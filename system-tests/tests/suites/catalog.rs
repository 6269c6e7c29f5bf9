// system-tests/tests/suites/catalog.rs
// ============================================================================
// Module: Catalog Behavior Tests
// Description: Catalog side effects and name freshness against the market stub.
// Purpose: Check that scenarios build on each other and names never collide.
// Dependencies: market-contract, helpers
// ============================================================================

//! ## Overview
//! Later scenarios depend on data written by earlier ones; these tests keep
//! the fixture alive (deletion fault) to inspect what the run left behind,
//! and rerun the suite on one server to show fresh names avoid collisions.

use std::error::Error;
use std::time::Duration;

use helpers::artifacts::TestReporter;
use helpers::market_stub::StubFaults;
use helpers::market_stub::spawn_market_stub;
use helpers::market_stub::spawn_market_stub_with;
use helpers::timeouts::resolve_timeout;
use market_contract::ContractRunner;
use market_contract::MarketHttpClient;
use market_contract::NoopRunLog;
use market_contract::RunnerError;
use market_contract::SuiteContext;
use market_contract::fresh_market_name;
use market_contract::market_suite;
use serde_json::json;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn products_land_in_their_categories() -> Result<(), Box<dyn Error>> {
    let mut reporter = TestReporter::new("products_land_in_their_categories")?;
    let stub = spawn_market_stub_with(StubFaults {
        fail_delete: true,
        ..StubFaults::default()
    })?;
    let client = MarketHttpClient::new(resolve_timeout(Duration::from_secs(5)))?;
    let context = SuiteContext::new(stub.base_url(), fresh_market_name());
    let report =
        ContractRunner::new(&client, &NoopRunLog).run_suite(&market_suite(), context).await?;

    let id = report
        .market_id
        .as_ref()
        .and_then(|id| id.as_str().parse::<u64>().ok())
        .ok_or("numeric fixture id expected")?;
    let expectations = [
        ("hortifruit/frutas", json!([{"nome": "Banana", "valor": 3}])),
        ("hortifruit/legumes", json!([{"nome": "Pimentão", "valor": 5}])),
        ("padaria/salgados", json!([{"nome": "Coxinha", "valor": 8}])),
    ];
    for (category, expected) in expectations {
        let stored = json!(stub.products(id, category));
        if stored != expected {
            return Err(format!("{category}: expected {expected}, stored {stored}").into());
        }
    }

    reporter.finish("pass", vec!["rejected product was not stored".to_string()])?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_runs_use_fresh_names() -> Result<(), Box<dyn Error>> {
    let mut reporter = TestReporter::new("repeated_runs_use_fresh_names")?;
    let stub = spawn_market_stub()?;
    let client = MarketHttpClient::new(resolve_timeout(Duration::from_secs(5)))?;
    let runner = ContractRunner::new(&client, &NoopRunLog);
    let suite = market_suite();

    let first =
        runner.run_suite(&suite, SuiteContext::new(stub.base_url(), fresh_market_name())).await?;
    let second =
        runner.run_suite(&suite, SuiteContext::new(stub.base_url(), fresh_market_name())).await?;
    if !first.passed() || !second.passed() {
        return Err("both runs should pass".into());
    }
    if first.market_name == second.market_name {
        return Err("names should differ between runs".into());
    }
    if first.market_id == second.market_id {
        return Err("the server should assign a new id per run".into());
    }

    reporter.finish("pass", vec![format!("{} then {}", first.market_name, second.market_name)])?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn reused_name_collides_at_setup() -> Result<(), Box<dyn Error>> {
    let mut reporter = TestReporter::new("reused_name_collides_at_setup")?;
    let stub = spawn_market_stub_with(StubFaults {
        fail_delete: true,
        ..StubFaults::default()
    })?;
    let client = MarketHttpClient::new(resolve_timeout(Duration::from_secs(5)))?;
    let runner = ContractRunner::new(&client, &NoopRunLog);
    let suite = market_suite();
    let name = fresh_market_name();

    runner.run_suite(&suite, SuiteContext::new(stub.base_url(), name.as_str())).await?;
    let second = runner.run_suite(&suite, SuiteContext::new(stub.base_url(), name.as_str())).await;
    let Err(RunnerError::Setup {
        report,
        ..
    }) = second
    else {
        return Err("second setup with the same name should fail".into());
    };
    if report.status != Some(400) {
        return Err(format!("expected a 400 duplicate rejection, got {:?}", report.status).into());
    }

    reporter.finish("pass", vec!["duplicate name rejected at setup".to_string()])?;
    drop(reporter);
    Ok(())
}
