//! # File Transfer
//!
//! Framed file transfer over a serial radio link (HC-06 style module).
//!
//! ## Framing
//!
//! ```text
//!  send:     START:<name>\n<raw bytes>END:TRANSFER\n
//!  receive:  START:<content>END_TRANSFER\n        (one line)
//! ```
//!
//! Received content is trimmed and stored in `RECEIVE_FILE_NAME`.
//!
//! ## Sessions
//!
//! Sending is synchronous. Receiving and diagnostics wait on the link, so
//! they run as a session advanced by [`Transfer::poll`] once per loop
//! iteration. While a session is open the command line is not processed.

use core::fmt::Write;
use core::mem;

use heapless::Vec;
use log::{info, warn};

use crate::config::{DIAG_WINDOW_MS, RECEIVE_FILE_NAME, RECEIVE_LINE_LEN, RECEIVE_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::fs::FileStore;
use crate::io::{ByteSink, ByteSource};

const FRAME_START: &str = "START:";
const FRAME_END: &str = "END_TRANSFER";
const SEND_TRAILER: &[u8] = b"END:TRANSFER\n";

/// Commands sent to the radio module by `BTDIAG`, in order.
const PROBES: [&[u8]; 2] = [b"AT\r\n", b"AT+VERSION\r\n"];

enum Session {
    Idle,
    Receiving { started: u32, line: Vec<u8, RECEIVE_LINE_LEN> },
    Diagnosing { probe: usize, started: u32 },
}

pub struct Transfer<L> {
    link: L,
    session: Session,
}

/// Extract the content of a receive frame, markers and surrounding
/// whitespace stripped.
pub fn parse_frame(line: &str) -> Result<&str> {
    let rest = line.trim().strip_prefix(FRAME_START).ok_or(Error::InvalidFrame)?;
    let end = rest.find(FRAME_END).ok_or(Error::InvalidFrame)?;
    Ok(rest[..end].trim())
}

impl<L: ByteSource + ByteSink> Transfer<L> {
    pub const fn new(link: L) -> Self {
        Self { link, session: Session::Idle }
    }

    /// True while a receive or diagnostic session is open.
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self.session, Session::Idle)
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Frame and send `name` over the link. Returns the payload size.
    pub fn send<F, W>(&mut self, name: &str, files: &mut F, console: &mut W) -> Result<usize>
    where
        F: FileStore,
        W: Write,
    {
        if self.is_active() {
            return Err(Error::TransferBusy);
        }
        if !files.exists(name) {
            return Err(Error::UnknownFile);
        }
        let _ = writeln!(console, "Sending file via Bluetooth: {}", name);

        self.link.write_bytes(FRAME_START.as_bytes());
        self.link.write_bytes(name.as_bytes());
        self.link.write_bytes(b"\n");

        let mut chunk = [0u8; 32];
        let mut sent = 0;
        loop {
            let n = files.read(name, sent, &mut chunk)?;
            if n == 0 {
                break;
            }
            self.link.write_bytes(&chunk[..n]);
            sent += n;
        }
        self.link.write_bytes(SEND_TRAILER);

        info!("sent {} ({} bytes)", name, sent);
        let _ = writeln!(console, "File sent successfully");
        Ok(sent)
    }

    /// Start waiting for a receive frame.
    pub fn begin_receive<W: Write>(&mut self, now: u32, console: &mut W) -> Result<()> {
        if self.is_active() {
            return Err(Error::TransferBusy);
        }
        self.session = Session::Receiving { started: now, line: Vec::new() };
        let _ = writeln!(console, "Waiting for Bluetooth file transfer...");
        let _ = writeln!(console, "Send file with format: START: content END_TRANSFER");
        Ok(())
    }

    /// Send the first probe and start echoing the module's replies.
    pub fn begin_diagnostic<W: Write>(&mut self, now: u32, console: &mut W) -> Result<()> {
        if self.is_active() {
            return Err(Error::TransferBusy);
        }
        let _ = writeln!(console, "Running Bluetooth diagnostics...");
        self.link.write_bytes(PROBES[0]);
        self.session = Session::Diagnosing { probe: 0, started: now };
        Ok(())
    }

    /// Advance the open session. A failed session is closed and its error
    /// returned; success and progress messages go to `console`.
    pub fn poll<F, W>(&mut self, now: u32, files: &mut F, console: &mut W) -> Result<()>
    where
        F: FileStore,
        W: Write,
    {
        match &mut self.session {
            Session::Idle => Ok(()),
            Session::Receiving { started, line } => {
                while let Some(b) = self.link.read_byte() {
                    if b == b'\n' {
                        let Session::Receiving { line, .. } =
                            mem::replace(&mut self.session, Session::Idle)
                        else {
                            return Ok(());
                        };
                        return store_frame(&line, files, console);
                    }
                    if line.push(b).is_err() {
                        self.session = Session::Idle;
                        warn!("receive frame exceeds {} bytes", RECEIVE_LINE_LEN);
                        return Err(Error::InvalidFrame);
                    }
                }
                if now.wrapping_sub(*started) >= RECEIVE_TIMEOUT_MS {
                    self.session = Session::Idle;
                    warn!("receive timed out");
                    return Err(Error::TransferTimeout);
                }
                Ok(())
            }
            Session::Diagnosing { probe, started } => {
                while let Some(b) = self.link.read_byte() {
                    let _ = console.write_char(b as char);
                }
                if now.wrapping_sub(*started) < DIAG_WINDOW_MS {
                    return Ok(());
                }
                *probe += 1;
                if let Some(cmd) = PROBES.get(*probe) {
                    self.link.write_bytes(cmd);
                    *started = now;
                } else {
                    self.session = Session::Idle;
                    let _ = writeln!(console, "Diagnostic complete");
                }
                Ok(())
            }
        }
    }
}

fn store_frame<F: FileStore, W: Write>(line: &[u8], files: &mut F, console: &mut W) -> Result<()> {
    let text = core::str::from_utf8(line).map_err(|_| Error::InvalidFrame)?;
    let content = parse_frame(text)?;
    if files.exists(RECEIVE_FILE_NAME) {
        let _ = writeln!(console, "File already exists. Overwriting...");
    }
    files.write(RECEIVE_FILE_NAME, content.as_bytes())?;
    info!("received {} bytes into {}", content.len(), RECEIVE_FILE_NAME);
    let _ = writeln!(console, "File received and saved as {}", RECEIVE_FILE_NAME);
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
