//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4: the SysTick millisecond
//! clock, an operator console and a `log` backend on the ITM.
//!
//! ## Clock
//!
//! SysTick fires at `TICK_HZ` and the handler (installed by the firmware
//! binary) calls [`on_systick`]. The counter is shared between the handler
//! and the main loop, so every access happens inside a critical section.
//!
//! ## ITM Stimulus Ports
//!
//! - Port 0: operator console
//! - Port 1: log records

use core::cell::Cell;
use core::fmt;

use cortex_m::interrupt::{self, Mutex};
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{itm, ITM};
use log::{LevelFilter, Log, Metadata, Record};

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

const CONSOLE_PORT: usize = 0;
const LOG_PORT: usize = 1;

// ---------------------------------------------------------------------------
// Millisecond clock
// ---------------------------------------------------------------------------

static MILLIS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Configure SysTick to fire once per millisecond from the core clock.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Advance the clock by one tick. Call from the SysTick handler only.
pub fn on_systick() {
    interrupt::free(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    });
}

/// Milliseconds since `configure_systick`. Wraps after ~49 days.
pub fn millis() -> u32 {
    interrupt::free(|cs| MILLIS.borrow(cs).get())
}

// ---------------------------------------------------------------------------
// ITM console
// ---------------------------------------------------------------------------

/// Operator console on ITM stimulus port 0.
pub struct ItmConsole {
    itm: ITM,
}

impl ItmConsole {
    pub fn new(itm: ITM) -> Self {
        Self { itm }
    }
}

impl fmt::Write for ItmConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        cortex_m::itm::write_str(&mut self.itm.stim[CONSOLE_PORT], s);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ITM logger
// ---------------------------------------------------------------------------

struct ItmLogger;

static LOGGER: ItmLogger = ItmLogger;

impl Log for ItmLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        struct Port;
        impl fmt::Write for Port {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                // Safety: the log port is only written from here, inside a
                // critical section.
                let regs = ITM::PTR as *mut itm::RegisterBlock;
                let stim = unsafe { &mut (*regs).stim[LOG_PORT] };
                cortex_m::itm::write_str(stim, s);
                Ok(())
            }
        }

        interrupt::free(|_cs| {
            let _ = fmt::Write::write_fmt(
                &mut Port,
                format_args!("[{}] {}: {}\n", millis(), record.level(), record.args()),
            );
        });
    }

    fn flush(&self) {}
}

/// Route `log` records to ITM port 1 at `level` and above.
pub fn init_logger(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
