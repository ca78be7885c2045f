//! Card fraud ring simulator.
//!
//! Simulates cards and POS devices, spreads compromise from devices to
//! the cards used on them through a synthetic transaction graph, and
//! answers the graph queries that surface suspected fraud rings.

pub mod compromise;
pub mod config;
pub mod engine;
pub mod error;
pub mod fraud_query;
pub mod model;
pub mod population;
pub mod remediation;
pub mod rng;
pub mod store;
pub mod transaction_generator;
pub mod types;
