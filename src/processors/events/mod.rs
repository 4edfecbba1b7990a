//! Event mapping.
//!
//! `event_data` decodes raw logs, the `factory` and `pair` processors apply
//! them to cached entities, and `pricing`/`volume_calculator` hold the price
//! and volume rules both processors share.

pub mod constants;
pub mod day_data;
pub mod event_data;
pub mod factory;
pub mod mapper_context;
pub mod pair;
pub mod pricing;
pub mod volume_calculator;
