// system-tests/src/lib.rs
// ============================================================================
// Module: Market Contract System Tests Library
// Description: Shared configuration for system test binaries.
// Purpose: Provide typed environment settings to the suites in `tests/`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts the configuration shared by the market contract
//! system-test binaries in `system-tests/tests`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
