//! Library crate for live-scoring-back, exposing modules for binaries and integration tests.

pub mod config;
/// Persistence layer: the game store trait and its backends.
pub mod dao;
mod dto;
mod error;
/// HTTP routing.
pub mod routes;
pub mod scoring;
/// Service layer shared by the HTTP handlers.
pub mod services;
/// Shared application state.
pub mod state;
