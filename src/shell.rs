//! # Command Interpreter
//!
//! Line-oriented operator commands. Bytes are accumulated into a fixed line
//! buffer and a line is acted on when a newline arrives or the buffer fills.
//!
//! ## Commands
//!
//! | Command | Allowed | Effect |
//! |---------|---------|--------|
//! | `start` / `stop` | always | resume / pause the scheduler |
//! | `exec <name> [-t ms] [-p prio]` | running | admit a task |
//! | `halt <name>` | running | remove a task |
//! | `inspect` | always | dump the task table and pause |
//! | `CREATE <file>` / `DELETE <file>` | paused | file store |
//! | `VIEW` | always | list files |
//! | `BTSEND <file>` / `BTGET` / `BTDIAG` | paused | transfer link |
//!
//! Scheduling and I/O commands are mutually exclusive so that file and link
//! traffic never interleaves with task execution.

use core::fmt::Write;
use core::str::FromStr;

use heapless::{String, Vec};
use log::warn;

use crate::config::{CMD_BUFFER_SIZE, DEFAULT_DURATION_MS, DEFAULT_PRIORITY, FILE_NAME_LEN};
use crate::error::{Error, Result};
use crate::fs::FileStore;
use crate::io::{ByteSink, ByteSource};
use crate::scheduler::Scheduler;
use crate::swap::ByteStore;
use crate::transfer::Transfer;

/// Payload bytes per line; the last buffer byte is reserved for the
/// terminator.
const LINE_CAPACITY: usize = CMD_BUFFER_SIZE - 1;

/// A parsed command line. Names borrow from the line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'l> {
    Start,
    Stop,
    Exec { name: &'l str, duration: u32, priority: i32 },
    Halt { name: &'l str },
    Inspect,
    Create { file: &'l str },
    Delete { file: &'l str },
    View,
    BtSend { file: &'l str },
    BtGet,
    BtDiag,
}

impl<'l> Command<'l> {
    /// Task or file name the command acts on, for error reports.
    fn subject(&self) -> Option<&'l str> {
        match *self {
            Command::Exec { name, .. } | Command::Halt { name } => Some(name),
            Command::Create { file } | Command::Delete { file } | Command::BtSend { file } => {
                Some(file)
            }
            _ => None,
        }
    }
}

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command<'_>>> {
    let mut tokens = line.split_ascii_whitespace();
    let Some(keyword) = tokens.next() else {
        return Ok(None);
    };
    let cmd = match keyword {
        "start" => Command::Start,
        "stop" => Command::Stop,
        "exec" => parse_exec(tokens)?,
        "halt" => Command::Halt { name: tokens.next().ok_or(Error::MissingArgument("task name"))? },
        "inspect" => Command::Inspect,
        "CREATE" => Command::Create { file: file_arg(tokens.next())? },
        "DELETE" => Command::Delete { file: file_arg(tokens.next())? },
        "VIEW" => Command::View,
        "BTSEND" => Command::BtSend { file: file_arg(tokens.next())? },
        "BTGET" => Command::BtGet,
        "BTDIAG" => Command::BtDiag,
        _ => return Err(Error::InvalidCommand),
    };
    Ok(Some(cmd))
}

/// `exec <name>` followed by `-t`/`-p` pairs in any order. Unknown tokens
/// are skipped; a repeated flag keeps its last value.
fn parse_exec<'l>(mut tokens: impl Iterator<Item = &'l str>) -> Result<Command<'l>> {
    let name = tokens.next().ok_or(Error::MissingArgument("task name"))?;
    let mut duration = DEFAULT_DURATION_MS;
    let mut priority = DEFAULT_PRIORITY;
    while let Some(tok) = tokens.next() {
        match tok {
            "-t" => duration = flag_value(tokens.next(), "-t")?,
            "-p" => priority = flag_value(tokens.next(), "-p")?,
            _ => {}
        }
    }
    Ok(Command::Exec { name, duration, priority })
}

fn flag_value<T: FromStr>(tok: Option<&str>, flag: &'static str) -> Result<T> {
    tok.ok_or(Error::MissingArgument(flag))?
        .parse()
        .map_err(|_| Error::InvalidNumber(flag))
}

fn file_arg(tok: Option<&str>) -> Result<&str> {
    let file = tok.ok_or(Error::MissingArgument("file name"))?;
    if file.len() > FILE_NAME_LEN {
        return Err(Error::NameTooLong);
    }
    Ok(file)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Everything a command may act on during one loop iteration.
pub struct Context<'c, 'a, B, F, L> {
    pub now: u32,
    pub scheduler: &'c mut Scheduler<'a, B>,
    pub files: &'c mut F,
    pub transfer: &'c mut Transfer<L>,
}

impl<B, F, L> Context<'_, '_, B, F, L>
where
    B: ByteStore,
    F: FileStore,
    L: ByteSource + ByteSink,
{
    fn require_running(&self) -> Result<()> {
        if self.scheduler.is_paused() {
            return Err(Error::SchedulerPaused);
        }
        Ok(())
    }

    fn require_paused(&self) -> Result<()> {
        if !self.scheduler.is_paused() {
            return Err(Error::SchedulerRunning);
        }
        Ok(())
    }

    /// Carry out `cmd`, writing operator replies to `console`.
    pub fn execute<W: Write>(&mut self, cmd: Command<'_>, console: &mut W) -> Result<()> {
        match cmd {
            Command::Start => {
                self.scheduler.resume();
                let _ = writeln!(console, "Scheduler started.");
            }
            Command::Stop => {
                self.scheduler.pause();
                let _ = writeln!(console, "Scheduler stopped.");
            }
            Command::Exec { name, duration, priority } => {
                self.require_running()?;
                let admission = self.scheduler.admit(name, duration, priority)?;
                if let Some(victim) = admission.evicted {
                    let victim = &self.scheduler.record(victim).name;
                    let _ = writeln!(console, "Memory full: swapped out {}", victim);
                }
                let _ = writeln!(console, "Added task: {}", name);
            }
            Command::Halt { name } => {
                self.require_running()?;
                self.scheduler.remove(name)?;
                let _ = writeln!(console, "Removed task: {}", name);
            }
            Command::Inspect => {
                let _ = self.scheduler.inspect(console);
            }
            Command::Create { file } => {
                self.require_paused()?;
                self.files.create(file)?;
                let mut content: String<64> = String::new();
                let _ = writeln!(content, "This is the content of {}", file);
                if let Err(e) = self.files.write(file, content.as_bytes()) {
                    let _ = self.files.delete(file);
                    return Err(e);
                }
                let _ = writeln!(console, "Created {}", file);
            }
            Command::Delete { file } => {
                self.require_paused()?;
                self.files.delete(file)?;
                let _ = writeln!(console, "Deleted {}", file);
            }
            Command::View => list_files(self.files, console),
            Command::BtSend { file } => {
                self.require_paused()?;
                self.transfer.send(file, self.files, console)?;
            }
            Command::BtGet => {
                self.require_paused()?;
                self.transfer.begin_receive(self.now, console)?;
            }
            Command::BtDiag => {
                self.require_paused()?;
                self.transfer.begin_diagnostic(self.now, console)?;
            }
        }
        Ok(())
    }
}

fn list_files<F: FileStore, W: Write>(files: &mut F, console: &mut W) {
    let _ = writeln!(console, "--- Files ---");
    let mut regular = 0;
    files.list(&mut |entry| {
        if entry.is_dir {
            let _ = writeln!(console, "  {} (directory)", entry.name);
        } else {
            let _ = writeln!(console, "  {} ({} bytes)", entry.name, entry.size);
            regular += 1;
        }
    });
    if regular == 0 {
        let _ = writeln!(console, "  No files found.");
    }
    let _ = writeln!(console, "-------------");
}

/// Write one error line to the operator.
pub fn report<W: Write>(console: &mut W, err: Error, subject: Option<&str>) {
    let _ = match subject {
        Some(s) => writeln!(console, "Error: {}: {}", err, s),
        None => writeln!(console, "Error: {}", err),
    };
}

// ---------------------------------------------------------------------------
// Line discipline
// ---------------------------------------------------------------------------

/// Accumulates operator input and dispatches complete lines.
pub struct Shell {
    line: Vec<u8, LINE_CAPACITY>,
}

impl Shell {
    pub const fn new() -> Self {
        Self { line: Vec::new() }
    }

    /// Consume pending input and run every complete line. Stops early once
    /// a command opens a transfer session, leaving later input unread.
    pub fn poll<S, B, F, L, W>(
        &mut self,
        input: &mut S,
        ctx: &mut Context<'_, '_, B, F, L>,
        console: &mut W,
    ) where
        S: ByteSource,
        B: ByteStore,
        F: FileStore,
        L: ByteSource + ByteSink,
        W: Write,
    {
        while let Some(b) = input.read_byte() {
            if b != b'\n' {
                if self.line.push(b).is_ok() && !self.line.is_full() {
                    continue;
                }
                warn!("command line reached {} bytes, dispatching", LINE_CAPACITY);
            }
            self.dispatch(ctx, console);
            self.line.clear();
            if ctx.transfer.is_active() {
                break;
            }
        }
    }

    fn dispatch<B, F, L, W>(&self, ctx: &mut Context<'_, '_, B, F, L>, console: &mut W)
    where
        B: ByteStore,
        F: FileStore,
        L: ByteSource + ByteSink,
        W: Write,
    {
        let Ok(text) = core::str::from_utf8(&self.line) else {
            report(console, Error::InvalidCommand, None);
            return;
        };
        match parse(text) {
            Ok(None) => {}
            Ok(Some(cmd)) => {
                if let Err(e) = ctx.execute(cmd, console) {
                    let subject = match e {
                        Error::SchedulerPaused | Error::SchedulerRunning => None,
                        _ => cmd.subject(),
                    };
                    report(console, e, subject);
                }
            }
            Err(e) => {
                // Only an unknown keyword is itself the offending token.
                let subject = match e {
                    Error::InvalidCommand => text.split_ascii_whitespace().next(),
                    _ => None,
                };
                report(console, e, subject);
            }
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
