//! Gamertag Report Library
//!
//! Derives a gamertag from an email-style identifier and assembles an
//! estimated account report from public profile and achievement pages.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `gamertag`: Identifier to gamertag derivation.
//! - `handlers`: HTTP request handlers.
//! - `models`: Report data models and request/response bodies.
//! - `random`: Injectable random source for estimated fields.
//! - `render`: Plain-text report rendering.
//! - `report`: Report assembly (profile, achievements, estimates).
//! - `sources`: Public page sources (directory, achievement tracker).

pub mod config;
pub mod errors;
pub mod gamertag;
pub mod handlers;
pub mod models;
pub mod random;
pub mod render;
pub mod report;
pub mod sources;
