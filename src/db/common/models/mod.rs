// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Entity rows. Every row is keyed by a string id and implements
//! [`Entity`](crate::db::store::Entity).

pub mod day_data_models;
pub mod factory_models;
pub mod pair_models;
pub mod swapper_models;
pub mod token_models;
pub mod transaction_models;

pub use day_data_models::{FactoryDayData, PairDayData, PairHourData, TokenDayData};
pub use factory_models::{Bundle, Factory, BUNDLE_ID};
pub use pair_models::{LiquidityPosition, Pair};
pub use swapper_models::{SwapPeriod, SwapStatPeriod, Swapper, SwapperType};
pub use token_models::Token;
pub use transaction_models::{Burn, Mint, TokenSwapEvent, Transaction};
