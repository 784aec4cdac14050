//! # Architecture Abstraction Layer
//!
//! Board-facing pieces the portable kernel needs on real hardware: a
//! millisecond clock and a text console. Currently implements the Cortex-M4
//! port; other targets add sibling modules.

pub mod cortex_m4;
