//! # SwapOS Example Firmware
//!
//! Runs the swapping scheduler on a Cortex-M4 with five demonstration tasks
//! and a three-slot working set:
//!
//! | Task | Behavior |
//! |------|----------|
//! | `blink` | toggles a software LED flag |
//! | `count` | increments a counter |
//! | `sample` | folds a pseudo-random sensor reading into an average |
//! | `watchdog` | counts how often it was fed |
//! | `idle` | does nothing |
//!
//! The operator script below admits all five, so two of them are swapped
//! out to the byte store and the rotation swaps them back in turn. Console
//! replies appear on ITM port 0 and log records on ITM port 1.
//!
//! Build: `cargo build --release --features firmware --target thumbv7em-none-eabihf`

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use panic_halt as _;

use swapos::arch::cortex_m4::{self, ItmConsole};
use swapos::config::MAX_REGISTERED_TASKS;
use swapos::fs::RamFiles;
use swapos::io::{ByteSink, ByteSource, SliceSource};
use swapos::swap::{RamStore, RECORD_SIZE};
use swapos::Kernel;

/// Commands replayed on the console input at boot.
const BOOT_SCRIPT: &[u8] = b"exec blink -t 500 -p 2\n\
exec count -t 1000\n\
exec sample -p 20 -t 250\n\
exec watchdog -p 1\n\
exec idle -p 0 -t 100\n\
inspect\n\
start\n";

/// Radio link placeholder for boards without a module fitted: never
/// receives, discards everything sent.
struct NoLink;

impl ByteSource for NoLink {
    fn read_byte(&mut self) -> Option<u8> {
        None
    }
}

impl ByteSink for NoLink {
    fn write_bytes(&mut self, _bytes: &[u8]) {}
}

#[exception]
fn SysTick() {
    cortex_m4::on_systick();
}

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();
    cortex_m4::configure_systick(&mut cp.SYST);
    cortex_m4::init_logger(log::LevelFilter::Info);
    let mut console = ItmConsole::new(cp.ITM);

    // --- Task bodies ---
    let mut led = false;
    let mut blink = || led = !led;

    let mut counter: u32 = 0;
    let mut count = || counter = counter.wrapping_add(1);

    let mut seed: u32 = 0x2545_F491;
    let mut average: u32 = 0;
    let mut sample = || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        average = (average * 7 + (seed % 400)) / 8;
    };

    let mut feeds: u32 = 0;
    let mut watchdog = || feeds = feeds.wrapping_add(1);

    let mut idle = || {};

    // --- Kernel ---
    let mut kernel = Kernel::new(
        RamStore::<{ RECORD_SIZE * MAX_REGISTERED_TASKS }>::new(),
        RamFiles::<4, 256>::new(),
        NoLink,
    );
    kernel.register("blink", &mut blink).unwrap();
    kernel.register("count", &mut count).unwrap();
    kernel.register("sample", &mut sample).unwrap();
    kernel.register("watchdog", &mut watchdog).unwrap();
    kernel.register("idle", &mut idle).unwrap();

    let mut input = SliceSource::new(BOOT_SCRIPT);
    loop {
        kernel.poll(cortex_m4::millis(), &mut input, &mut console);
    }
}
