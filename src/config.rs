//! # SwapOS Configuration
//!
//! Compile-time constants governing the scheduler, the command line and the
//! transfer session. All limits are fixed at compile time and nothing is
//! allocated dynamically.

/// Maximum number of tasks resident in working memory at once.
/// Admitting a task beyond this evicts the lowest-priority resident task.
pub const MAX_TASKS: usize = 3;

/// Maximum number of tasks that can be registered overall
/// (resident + swapped + dormant). Bounds the registry table.
pub const MAX_REGISTERED_TASKS: usize = 5;

/// Maximum task name length in bytes. Longer names are truncated on
/// registration. The persisted name field is one byte wider (NUL padded).
pub const TASK_NAME_LEN: usize = 9;

/// Command line buffer size in bytes, terminator included. A line that
/// reaches `CMD_BUFFER_SIZE - 1` bytes without a newline is dispatched as is.
pub const CMD_BUFFER_SIZE: usize = 50;

/// Slice length given to a task when `exec` omits `-t`, and the duration a
/// freshly registered task carries.
pub const DEFAULT_DURATION_MS: u32 = 3000;

/// Priority given to a task when `exec` omits `-p`.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Priority a task carries between registration and its first admission.
pub const REGISTERED_PRIORITY: i32 = 0;

/// Maximum file name length accepted by file and transfer commands.
pub const FILE_NAME_LEN: usize = 19;

/// File that `BTGET` stores received content in. Overwritten on every
/// successful transfer.
pub const RECEIVE_FILE_NAME: &str = "received.txt";

/// How long `BTGET` waits for a frame before giving up.
pub const RECEIVE_TIMEOUT_MS: u32 = 60_000;

/// Longest receive frame (`START:` … `END_TRANSFER`) accepted, in bytes.
pub const RECEIVE_LINE_LEN: usize = 256;

/// Window after each `BTDIAG` probe during which link responses are echoed.
pub const DIAG_WINDOW_MS: u32 = 1000;

/// SysTick frequency in Hz. One tick is one millisecond of scheduler time.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
