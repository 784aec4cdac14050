//! # SwapOS — Swapping Operating System
//!
//! A cooperative round-robin task scheduler for memory-constrained
//! microcontrollers that must run more tasks than fit in working memory.
//!
//! ## Overview
//!
//! Tasks are registered once at start-up and admitted into a small working
//! set from the operator console. When the working set is full, the
//! lowest-priority resident task is swapped out to a byte-addressable
//! non-volatile store (an I²C EEPROM on the reference board) and swapped
//! back in when the rotation reaches it again.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Operator console (text)                 │
//! ├────────────────────────────────────────────────────────┤
//! │              Kernel context (kernel.rs)                 │
//! │            new() · register() · poll(now)               │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Shell       │   Scheduler        │  Transfer         │
//! │  shell.rs    │   scheduler.rs     │  transfer.rs      │
//! │  ─ parse()   │   ─ admit()        │  ─ send()         │
//! │  ─ execute() │   ─ remove()       │  ─ receive        │
//! │              │   ─ tick()         │  ─ diagnostics    │
//! ├──────────────┼────────────────────┼───────────────────┤
//! │  File store  │  Registry · Swap   │  Byte channels    │
//! │  fs.rs       │  registry.rs       │  io.rs            │
//! │              │  swap.rs           │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │        Task model (task.rs) · Errors (error.rs)         │
//! ├────────────────────────────────────────────────────────┤
//! │      Arch port (arch/cortex_m4.rs, feature firmware)    │
//! │          SysTick clock · ITM console · ITM logger       │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Execution Model
//!
//! - **Single thread**: the main loop calls `Kernel::poll` forever
//! - **Cooperative**: a task body runs to completion on every tick; slice
//!   overruns are only noticed after the body returns
//! - **Mutually exclusive modes**: scheduling commands require the
//!   scheduler running, file and transfer commands require it stopped
//!
//! ## Memory Model
//!
//! - **No heap**: all tables are `heapless` containers of fixed capacity
//! - **Registry owns records**, task bodies are borrowed `&mut dyn TaskBody`
//! - **Swap images** exclude the body; it is re-resolved by name on restore

#![no_std]

pub mod config;
pub mod error;
pub mod task;
pub mod registry;
pub mod swap;
pub mod scheduler;
pub mod fs;
pub mod io;
pub mod transfer;
pub mod shell;
pub mod kernel;
#[cfg(feature = "firmware")]
pub mod arch;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorClass, Result};
pub use kernel::Kernel;
pub use scheduler::{Admission, Scheduler, Tick};
pub use task::{TaskBody, TaskId, TaskRecord};
