//! # Task Record
//!
//! Defines the per-task scheduling record and the callable a task runs.
//!
//! ## Lifecycle
//!
//! ```text
//!   register()            admit()               evict()
//!  ──────────► Dormant ──────────► Active ──────────► Swapped
//!                 ▲                 │  ▲                  │
//!                 │     remove()    │  │     restore()    │
//!                 └─────────────────┘  └──────────────────┘
//! ```
//!
//! A record is never both active and swapped. `remove()` discards slice
//! progress without persisting it; the record must be re-admitted to run.

use heapless::String;

use crate::config::{DEFAULT_DURATION_MS, REGISTERED_PRIORITY, TASK_NAME_LEN};

/// Bounded task name.
pub type TaskName = String<TASK_NAME_LEN>;

/// Index of a record in the registry. Stable for the lifetime of the
/// registry since registrations are never removed.
pub type TaskId = usize;

// ---------------------------------------------------------------------------
// Task body
// ---------------------------------------------------------------------------

/// The work a task performs each time the scheduler runs it.
///
/// `run` must return promptly. The scheduler only checks the slice boundary
/// after `run` returns, so a long body overruns its slice and nothing else
/// runs meanwhile.
pub trait TaskBody {
    fn run(&mut self);
}

impl<F: FnMut()> TaskBody for F {
    #[inline]
    fn run(&mut self) {
        self()
    }
}

// ---------------------------------------------------------------------------
// Residency
// ---------------------------------------------------------------------------

/// Where a task's state currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// Registered but never admitted, or halted.
    Dormant,
    /// Resident in the working set and part of the rotation.
    Active,
    /// Persisted to the byte store, not resident.
    Swapped,
}

// ---------------------------------------------------------------------------
// Task record
// ---------------------------------------------------------------------------

/// Scheduling metadata for one registered task.
///
/// `start_time == 0` means the current slice has not begun; the scheduler
/// stamps `start_time`/`end_time` on the first run of each slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub name: TaskName,
    /// Slice length in milliseconds.
    pub duration: u32,
    pub start_time: u32,
    pub end_time: u32,
    /// Eviction rank, lower is evicted first.
    pub priority: i32,
    pub residency: Residency,
}

impl TaskRecord {
    /// A dormant record carrying the registration defaults.
    pub fn dormant(name: &str) -> Self {
        Self {
            name: truncate_name(name),
            duration: DEFAULT_DURATION_MS,
            start_time: 0,
            end_time: 0,
            priority: REGISTERED_PRIORITY,
            residency: Residency::Dormant,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.residency == Residency::Active
    }

    #[inline]
    pub fn is_swapped(&self) -> bool {
        self.residency == Residency::Swapped
    }

    #[inline]
    pub fn is_dormant(&self) -> bool {
        self.residency == Residency::Dormant
    }

    /// Mark the slice as not yet begun.
    #[inline]
    pub fn reset_slice(&mut self) {
        self.start_time = 0;
    }

    /// Stamp the slice bounds if the slice has not begun yet.
    pub fn begin_slice(&mut self, now: u32) {
        if self.start_time == 0 {
            self.start_time = now;
            self.end_time = now.wrapping_add(self.duration);
        }
    }

    /// True once `duration` milliseconds have passed since the slice began.
    /// Measured as a wrapping difference so a slice may span the clock wrap.
    #[inline]
    pub fn slice_elapsed(&self, now: u32) -> bool {
        now.wrapping_sub(self.start_time) >= self.duration
    }
}

/// Copy at most `TASK_NAME_LEN` bytes of `name`, stopping at a character
/// boundary.
pub fn truncate_name(name: &str) -> TaskName {
    let mut out = TaskName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dormant_defaults() {
        let rec = TaskRecord::dormant("sensor");
        assert_eq!(rec.name.as_str(), "sensor");
        assert_eq!(rec.duration, DEFAULT_DURATION_MS);
        assert_eq!(rec.priority, REGISTERED_PRIORITY);
        assert_eq!(rec.start_time, 0);
        assert!(rec.is_dormant());
        assert!(!rec.is_active());
        assert!(!rec.is_swapped());
    }

    #[test]
    fn test_name_truncated_to_nine_bytes() {
        let rec = TaskRecord::dormant("distance_logger");
        assert_eq!(rec.name.as_str(), "distance_");
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        // 4 × 2-byte chars = 8 bytes, the fifth does not fit.
        let name = truncate_name("ééééé");
        assert_eq!(name.as_str(), "éééé");
    }

    #[test]
    fn test_slice_stamped_once() {
        let mut rec = TaskRecord::dormant("a");
        rec.duration = 500;
        rec.begin_slice(100);
        assert_eq!((rec.start_time, rec.end_time), (100, 600));

        // Already begun: later calls leave the bounds alone.
        rec.begin_slice(250);
        assert_eq!((rec.start_time, rec.end_time), (100, 600));
        assert_eq!(rec.end_time - rec.start_time, rec.duration);

        assert!(!rec.slice_elapsed(599));
        assert!(rec.slice_elapsed(600));

        rec.reset_slice();
        rec.begin_slice(700);
        assert_eq!((rec.start_time, rec.end_time), (700, 1200));
    }

    #[test]
    fn test_slice_spans_clock_wrap() {
        let mut rec = TaskRecord::dormant("a");
        rec.duration = 100;
        rec.begin_slice(u32::MAX - 10);
        assert_eq!(rec.end_time, 89);

        assert!(!rec.slice_elapsed(u32::MAX - 10));
        assert!(!rec.slice_elapsed(u32::MAX));
        assert!(!rec.slice_elapsed(88));
        assert!(rec.slice_elapsed(89));
    }

    #[test]
    fn test_closure_is_task_body() {
        let mut runs = 0;
        {
            let mut body = || runs += 1;
            let dyn_body: &mut dyn TaskBody = &mut body;
            dyn_body.run();
            dyn_body.run();
        }
        assert_eq!(runs, 2);
    }
}
