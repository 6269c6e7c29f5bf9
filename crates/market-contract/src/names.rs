// crates/market-contract/src/names.rs
// ============================================================================
// Module: Market Name Generation
// Description: Fresh company-style names for the suite fixture.
// Purpose: Avoid name collisions between independent suite runs.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! The remote API rejects duplicate market names, so every run creates its
//! fixture under a fresh name. Names read like company names and end with a
//! numeric tag that makes repeated draws unlikely to collide.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::seq::SliceRandom;

// ============================================================================
// SECTION: Word Lists
// ============================================================================

/// Leading words for generated names.
const ADJECTIVES: &[&str] = &[
    "Bom", "Grande", "Novo", "Central", "Popular", "Real", "Nacional", "Familiar", "Tropical",
    "Sul", "Norte", "Vila",
];

/// Middle words for generated names.
const NOUNS: &[&str] = &[
    "Preco", "Sabor", "Colheita", "Mercado", "Emporio", "Armazem", "Feira", "Celeiro", "Quitanda",
    "Despensa",
];

/// Legal-form suffixes for generated names.
const SUFFIXES: &[&str] = &["Ltda", "S.A.", "e Filhos", "Comercio", "Atacadista", "Distribuidora"];

/// Exclusive upper bound of the numeric tag.
const TAG_BOUND: u32 = 1_000_000;

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Draws a company-style market name from the supplied RNG.
pub fn market_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Novo");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Mercado");
    let suffix = SUFFIXES.choose(rng).copied().unwrap_or("Ltda");
    let tag = rng.gen_range(0..TAG_BOUND);
    format!("{adjective} {noun} {suffix} {tag:06}")
}

/// Draws a market name from the thread-local RNG.
#[must_use]
pub fn fresh_market_name() -> String {
    market_name(&mut rand::thread_rng())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
