// crates/market-contract/src/catalog.rs
// ============================================================================
// Module: Market Scenario Catalog
// Description: The ordered market and product scenarios.
// Purpose: Declare the contract of the market API as data.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`market_suite`] returns the full ordered suite. Later scenarios rely on
//! side effects of earlier ones (the fixture exists, products were added), so
//! the order of the returned vector is part of the contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::StatusCode;
use serde_json::json;

use crate::identifiers::MarketId;
use crate::scenario::Scenario;
use crate::scenario::ScenarioPath;
use crate::scenario::ScenarioSuite;
use crate::scenario::SetupStep;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suite name used in logs and reports.
pub const SUITE_NAME: &str = "mercado";
/// Valid 14-digit cnpj.
pub const VALID_CNPJ: &str = "12345678910123";
/// cnpj with too few digits.
pub const SHORT_CNPJ: &str = "123456789";
/// Address used on creation.
pub const ADDRESS: &str = "sao ludgero";
/// Address used on update.
pub const UPDATED_ADDRESS: &str = "São Ludgero";
/// Pointer to the created id in the creation response.
pub const CREATED_ID_POINTER: &str = "/novoMercado/id";
/// Id that never exists on the server.
pub const UNKNOWN_MARKET_ID: u64 = 0;

/// Duplicate-name rejection message.
pub const MSG_DUPLICATE_NAME: &str = "O nome {nome} já existe na lista de Mercados.";
/// Short cnpj rejection message.
pub const MSG_CNPJ_LENGTH: &str = "CNPJ deve ter 14 dígitos";
/// Successful update message.
pub const MSG_UPDATED: &str = "Mercado atualizado com sucesso";
/// Invalid update rejection message.
pub const MSG_INVALID_INPUT: &str = "Dados de entrada inválidos";
/// Invalid product value rejection message.
pub const MSG_INVALID_VALUE: &str = "Valor deve ser um número inteiro e não negativo";
/// Successful deletion message.
pub const MSG_DELETED: &str = "Mercado com ID {id} foi removido com sucesso.";

/// Generic product collection under a market.
pub const PRODUCTS: &str = "/produtos";
/// Fruit section.
pub const FRUITS: &str = "/produtos/hortifruit/frutas";
/// Vegetable section.
pub const VEGETABLES: &str = "/produtos/hortifruit/legumes";
/// Savory bakery section.
pub const SAVORIES: &str = "/produtos/padaria/salgados";

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Builds the ordered market suite.
#[must_use]
pub fn market_suite() -> ScenarioSuite {
    ScenarioSuite {
        name: SUITE_NAME.to_string(),
        setup: SetupStep {
            request: Scenario::post("create fixture market", ScenarioPath::Collection)
                .with_json(market_body(VALID_CNPJ, ADDRESS))
                .expect_status(StatusCode::CREATED),
            id_pointer: CREATED_ID_POINTER.to_string(),
        },
        scenarios: vec![
            Scenario::post("duplicate market name is rejected", ScenarioPath::Collection)
                .with_json(market_body(VALID_CNPJ, ADDRESS))
                .expect_status(StatusCode::BAD_REQUEST)
                .expect_body_contains(MSG_DUPLICATE_NAME),
            Scenario::post("short cnpj is rejected on create", ScenarioPath::Collection)
                .with_json(market_body(SHORT_CNPJ, ADDRESS))
                .expect_status(StatusCode::BAD_REQUEST)
                .expect_body_contains(MSG_CNPJ_LENGTH),
            Scenario::get("markets are listed", ScenarioPath::Collection),
            Scenario::get("fixture market is fetched", ScenarioPath::fixture()),
            Scenario::get("unknown market is not found", unknown_market())
                .expect_status(StatusCode::NOT_FOUND),
            Scenario::put("fixture market is updated", ScenarioPath::fixture())
                .with_json(market_body(VALID_CNPJ, UPDATED_ADDRESS))
                .expect_body_contains(MSG_UPDATED),
            Scenario::put("invalid update is rejected", ScenarioPath::fixture())
                .with_json(market_body(SHORT_CNPJ, ADDRESS))
                .expect_status(StatusCode::BAD_REQUEST)
                .expect_body_contains(MSG_INVALID_INPUT),
            Scenario::put("unknown market update is not found", unknown_market())
                .with_json(market_body(SHORT_CNPJ, ADDRESS))
                .expect_status(StatusCode::NOT_FOUND),
            Scenario::post("fruit is added", ScenarioPath::fixture_child(PRODUCTS))
                .with_json(json!({"nome": "Banana", "valor": 3}))
                .expect_status(StatusCode::CREATED),
            Scenario::post("fractional value is rejected", ScenarioPath::fixture_child(PRODUCTS))
                .with_json(json!({"nome": "Maça", "valor": 5.5}))
                .expect_status(StatusCode::BAD_REQUEST)
                .expect_body_contains(MSG_INVALID_VALUE),
            Scenario::post("negative value is rejected", ScenarioPath::fixture_child(PRODUCTS))
                .with_json(json!({"nome": "Laranja", "valor": -1}))
                .expect_status(StatusCode::BAD_REQUEST)
                .expect_body_contains(MSG_INVALID_VALUE),
            Scenario::get("fruits are listed", ScenarioPath::fixture_child(FRUITS)),
            Scenario::post("vegetable is added", ScenarioPath::fixture_child(VEGETABLES))
                .with_json(json!({"nome": "Pimentão", "valor": 5}))
                .expect_status(StatusCode::CREATED),
            Scenario::get("vegetables are listed", ScenarioPath::fixture_child(VEGETABLES)),
            Scenario::post("savory is added", ScenarioPath::fixture_child(SAVORIES))
                .with_json(json!({"nome": "Coxinha", "valor": 8}))
                .expect_status(StatusCode::CREATED),
            Scenario::get("savories are listed", ScenarioPath::fixture_child(SAVORIES)),
            Scenario::delete("unknown market delete is not found", unknown_market())
                .expect_status(StatusCode::NOT_FOUND),
        ],
        teardown: Scenario::delete("delete fixture market", ScenarioPath::fixture())
            .expect_body_contains(MSG_DELETED),
    }
}

/// Market body carrying the fixture name placeholder.
fn market_body(cnpj: &str, address: &str) -> serde_json::Value {
    json!({
        "nome": "{nome}",
        "cnpj": cnpj,
        "endereco": address,
    })
}

/// Path of a market id that is never created.
fn unknown_market() -> ScenarioPath {
    ScenarioPath::market(MarketId::from_number(UNKNOWN_MARKET_ID))
}
