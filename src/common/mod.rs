// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! # Common Utilities and Shared Components
//!
//! ## Components
//!
//! ### Processor Status Management
//! - Receives a checkpoint after every committed batch
//! - Lets the surrounding runner resume from the last committed block
//!
//! A failed batch never reaches the saver, so the recorded checkpoint always
//! points at state that is fully flushed to the store.

/// Processor status tracking and checkpoint management
pub mod processor_status_saver;

pub use processor_status_saver::get_processor_status_saver;
