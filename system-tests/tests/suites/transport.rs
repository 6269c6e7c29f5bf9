// system-tests/tests/suites/transport.rs
// ============================================================================
// Module: Transport Tests
// Description: Transcript fidelity and unreachable-server handling.
// Purpose: Tie the client transcript to what the server actually received.
// Dependencies: market-contract, helpers
// ============================================================================

use std::error::Error;
use std::net::TcpListener;
use std::time::Duration;

use helpers::artifacts::TestReporter;
use helpers::market_stub::spawn_market_stub;
use helpers::timeouts::resolve_timeout;
use market_contract::ContractRunner;
use market_contract::HttpMethod;
use market_contract::MarketHttpClient;
use market_contract::NoopRunLog;
use market_contract::RunnerError;
use market_contract::SuiteContext;
use market_contract::fresh_market_name;
use market_contract::market_suite;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn transcript_matches_server_log() -> Result<(), Box<dyn Error>> {
    let mut reporter = TestReporter::new("transcript_matches_server_log")?;
    let stub = spawn_market_stub()?;
    let client = MarketHttpClient::new(resolve_timeout(Duration::from_secs(5)))?;
    let context = SuiteContext::new(stub.base_url(), fresh_market_name());
    ContractRunner::new(&client, &NoopRunLog).run_suite(&market_suite(), context).await?;

    let transcript = client.transcript();
    reporter.artifacts().write_json("transcript.json", &transcript)?;
    let sent: Vec<(String, String)> = transcript
        .iter()
        .map(|entry| {
            let path = entry
                .url
                .split_once("://")
                .and_then(|(_, rest)| rest.find('/').map(|index| &rest[index..]))
                .unwrap_or_default();
            (entry.method.to_string(), path.to_string())
        })
        .collect();
    let received: Vec<(String, String)> =
        stub.requests().into_iter().map(|request| (request.method, request.path)).collect();
    if sent != received {
        return Err(format!("transcript {sent:?} differs from server log {received:?}").into());
    }
    let sequences: Vec<u64> = transcript.iter().map(|entry| entry.sequence).collect();
    if sequences != (1..=19).collect::<Vec<u64>>() {
        return Err(format!("unexpected sequence numbers {sequences:?}").into());
    }
    if transcript.last().map(|entry| entry.method) != Some(HttpMethod::Delete) {
        return Err("teardown should be the last exchange".into());
    }

    reporter.finish("pass", vec!["19 exchanges recorded in order".to_string()])?;
    drop(reporter);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_aborts_in_setup() -> Result<(), Box<dyn Error>> {
    let mut reporter = TestReporter::new("unreachable_server_aborts_in_setup")?;
    let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let client = MarketHttpClient::new(resolve_timeout(Duration::from_secs(2)))?;
    let context =
        SuiteContext::new(format!("http://127.0.0.1:{port}/mercado"), fresh_market_name());

    let result =
        ContractRunner::new(&client, &NoopRunLog).run_suite(&market_suite(), context).await;
    let Err(RunnerError::Setup {
        report,
        reason,
    }) = result
    else {
        return Err("setup should fail without a server".into());
    };
    if report.status.is_some() || client.transcript().len() != 1 {
        return Err("exactly one failed exchange expected".into());
    }

    reporter.finish("pass", vec![reason])?;
    drop(reporter);
    Ok(())
}
