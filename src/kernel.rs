//! # Kernel
//!
//! Top-level context for SwapOS. A [`Kernel`] bundles the scheduler, the
//! file store, the transfer link and the command line, and is passed
//! explicitly to the control loop instead of living in globals.
//!
//! ## Control Loop
//!
//! ```text
//! main()
//!   ├─► Kernel::new()          ← byte store, file store, link
//!   ├─► Kernel::register()     ← bind task bodies (×N)
//!   └─► loop
//!         └─► Kernel::poll(now)
//!               ├─► transfer session open? → Transfer::poll()
//!               │                    else → Shell::poll()
//!               └─► Scheduler::tick()       ← at most one task body
//! ```
//!
//! Every step returns promptly; a body that blocks stalls the whole loop.

use core::fmt::Write;

use crate::error::Result;
use crate::fs::FileStore;
use crate::io::{ByteSink, ByteSource};
use crate::scheduler::{Scheduler, Tick};
use crate::shell::{self, Context, Shell};
use crate::swap::ByteStore;
use crate::task::{TaskBody, TaskId};
use crate::transfer::Transfer;

pub struct Kernel<'a, B, F, L> {
    scheduler: Scheduler<'a, B>,
    files: F,
    transfer: Transfer<L>,
    shell: Shell,
}

impl<'a, B, F, L> Kernel<'a, B, F, L>
where
    B: ByteStore,
    F: FileStore,
    L: ByteSource + ByteSink,
{
    pub fn new(store: B, files: F, link: L) -> Self {
        Self {
            scheduler: Scheduler::new(store),
            files,
            transfer: Transfer::new(link),
            shell: Shell::new(),
        }
    }

    /// Bind a task body to `name`. Call during start-up, before the loop.
    pub fn register(&mut self, name: &str, body: &'a mut dyn TaskBody) -> Result<TaskId> {
        self.scheduler.register(name, body)
    }

    pub fn scheduler(&self) -> &Scheduler<'a, B> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<'a, B> {
        &mut self.scheduler
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut F {
        &mut self.files
    }

    pub fn transfer(&self) -> &Transfer<L> {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut Transfer<L> {
        &mut self.transfer
    }

    /// One iteration of the control loop at time `now` (milliseconds).
    ///
    /// Operator input is left unread while a transfer session is open.
    pub fn poll<S, W>(&mut self, now: u32, input: &mut S, console: &mut W) -> Tick
    where
        S: ByteSource,
        W: Write,
    {
        if self.transfer.is_active() {
            if let Err(e) = self.transfer.poll(now, &mut self.files, console) {
                shell::report(console, e, None);
            }
        } else {
            let mut ctx = Context {
                now,
                scheduler: &mut self.scheduler,
                files: &mut self.files,
                transfer: &mut self.transfer,
            };
            self.shell.poll(input, &mut ctx, console);
        }

        let tick = self.scheduler.tick(now);
        if let Tick::Ran { fault: Some(e), .. } = tick {
            shell::report(console, e, None);
        }
        tick
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
