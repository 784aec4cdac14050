//! # Scheduler
//!
//! Cooperative round-robin scheduler over a working set smaller than the
//! registry. Tasks that do not fit are swapped out to the byte store and
//! swapped back in when the rotation reaches them.
//!
//! ## Tick
//!
//! Each call to [`Scheduler::tick`] runs at most one task body:
//! 1. **Idle check**: paused or nothing registered → return
//! 2. **Restore**: if the task under the cursor is swapped, bring it back
//! 3. **Stamp slice**: on the first run of a slice, set start/end times
//! 4. **Run**: invoke the body exactly once
//! 5. **Cycle**: if the slice has elapsed, swap the task out, advance the
//!    cursor, restore the next task and reset its slice
//!
//! ## Admission
//!
//! When the working set is full, admission evicts the resident task with
//! the smallest priority. Ties go to the earliest registered task.

use core::fmt;

use log::{info, warn};

use crate::config::MAX_TASKS;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::swap::{ByteStore, Swap};
use crate::task::{Residency, TaskBody, TaskId, TaskRecord};

/// Outcome of a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub task: TaskId,
    /// Resident task swapped out to make room, if any.
    pub evicted: Option<TaskId>,
}

/// Outcome of one [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Paused, nothing registered, or nothing admitted.
    Idle,
    /// The body of `task` ran once.
    Ran {
        task: TaskId,
        /// The slice ended and the cursor moved on.
        cycled: bool,
        /// A restore during this tick failed validation.
        fault: Option<Error>,
    },
}

pub struct Scheduler<'a, B> {
    registry: Registry<'a>,
    swap: Swap<B>,
    /// Rotation cursor into the registry.
    current: TaskId,
    /// Number of records in the `Active` state.
    active_count: usize,
    paused: bool,
}

impl<'a, B: ByteStore> Scheduler<'a, B> {
    /// Create a running scheduler with an empty registry.
    pub const fn new(store: B) -> Self {
        Self {
            registry: Registry::new(),
            swap: Swap::new(store),
            current: 0,
            active_count: 0,
            paused: false,
        }
    }

    /// Register a dormant task. See [`Registry::register`].
    pub fn register(&mut self, name: &str, body: &'a mut dyn TaskBody) -> Result<TaskId> {
        self.registry.register(name, body)
    }

    pub fn registry(&self) -> &Registry<'a> {
        &self.registry
    }

    pub fn swap(&self) -> &Swap<B> {
        &self.swap
    }

    pub fn swap_mut(&mut self) -> &mut Swap<B> {
        &mut self.swap
    }

    #[inline]
    pub fn record(&self, id: TaskId) -> &TaskRecord {
        self.registry.record(id)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    #[inline]
    pub fn current(&self) -> TaskId {
        self.current
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
        info!("scheduler paused");
    }

    pub fn resume(&mut self) {
        self.paused = false;
        info!("scheduler resumed");
    }

    // -----------------------------------------------------------------------
    // Admission and removal
    // -----------------------------------------------------------------------

    /// Admit `name` into the working set with the given slice and priority.
    pub fn admit(&mut self, name: &str, duration: u32, priority: i32) -> Result<Admission> {
        let id = self.registry.find(name).ok_or(Error::UnknownTask)?;
        if self.registry.record(id).is_active() {
            warn!("task {} already active", name);
            return Err(Error::AlreadyActive);
        }

        let evicted = self.make_room()?;

        let rec = self.registry.record_mut(id);
        rec.duration = duration;
        rec.priority = priority;
        rec.residency = Residency::Active;
        rec.reset_slice();
        self.active_count += 1;
        info!("admitted {} ({} ms, priority {})", rec.name, duration, priority);

        Ok(Admission { task: id, evicted })
    }

    /// Drop `name` from the working set. Its slice progress is discarded
    /// and nothing is persisted.
    pub fn remove(&mut self, name: &str) -> Result<TaskId> {
        let id = self.registry.find(name).ok_or(Error::UnknownTask)?;
        let rec = self.registry.record_mut(id);
        if !rec.is_active() {
            return Err(Error::NotActive);
        }
        rec.residency = Residency::Dormant;
        self.active_count -= 1;
        info!("removed {}", rec.name);
        Ok(id)
    }

    /// The resident task with the strictly smallest priority, scanning in
    /// registration order so that the earliest task wins ties.
    pub fn eviction_candidate(&self) -> Option<TaskId> {
        let mut victim: Option<(TaskId, i32)> = None;
        for (id, rec) in self.registry.records().iter().enumerate() {
            if !rec.is_active() {
                continue;
            }
            match victim {
                Some((_, lowest)) if rec.priority >= lowest => {}
                _ => victim = Some((id, rec.priority)),
            }
        }
        victim.map(|(id, _)| id)
    }

    /// Free one working-set slot if the set is full.
    fn make_room(&mut self) -> Result<Option<TaskId>> {
        if self.active_count < MAX_TASKS {
            return Ok(None);
        }
        let Some(victim) = self.eviction_candidate() else {
            warn!("working set full with nothing to evict");
            return Err(Error::NoEvictableTask);
        };
        info!("memory full, swapping out {}", self.registry.record(victim).name);
        self.evict(victim);
        Ok(Some(victim))
    }

    fn evict(&mut self, id: TaskId) {
        self.swap.evict(id, self.registry.record_mut(id));
        self.active_count -= 1;
    }

    /// Swap `id` back in, evicting another task first if the set is full.
    /// A validation failure still leaves the task resident.
    fn restore(&mut self, id: TaskId) -> Result<()> {
        self.make_room()?;
        let restored = self.swap.restore(id, self.registry.record_mut(id));
        self.active_count += 1;
        restored
    }

    // -----------------------------------------------------------------------
    // Round robin
    // -----------------------------------------------------------------------

    /// First admitted task at or after `from`, wrapping around. Dormant
    /// tasks are not part of the rotation.
    fn next_in_rotation(&self, from: TaskId) -> Option<TaskId> {
        let len = self.registry.len();
        (0..len)
            .map(|step| (from + step) % len)
            .find(|id| !self.registry.record(*id).is_dormant())
    }

    /// Run one scheduling step at time `now` (milliseconds).
    pub fn tick(&mut self, now: u32) -> Tick {
        if self.paused || self.registry.is_empty() {
            return Tick::Idle;
        }
        let Some(id) = self.next_in_rotation(self.current % self.registry.len()) else {
            return Tick::Idle;
        };
        self.current = id;

        let mut fault = None;
        if self.registry.record(id).is_swapped() {
            fault = self.restore(id).err();
        }

        self.registry.record_mut(id).begin_slice(now);
        self.registry.run(id);

        let cycled = self.registry.record(id).slice_elapsed(now);
        if cycled {
            info!("cycling out {}", self.registry.record(id).name);
            self.evict(id);

            // `id` is swapped now, so the rotation always has a next task.
            let next = self
                .next_in_rotation((id + 1) % self.registry.len())
                .unwrap_or(id);
            self.current = next;
            if self.registry.record(next).is_swapped() {
                if let Err(e) = self.restore(next) {
                    fault = Some(e);
                }
            }
            self.registry.record_mut(next).reset_slice();
        }

        Tick::Ran { task: id, cycled, fault }
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Pause the scheduler and write one line per registered task.
    pub fn inspect<W: fmt::Write>(&mut self, out: &mut W) -> fmt::Result {
        self.pause();
        writeln!(out, "--- Task List ---")?;
        for rec in self.registry.records() {
            writeln!(
                out,
                "Name: {} | Duration: {}ms | Priority: {} | Active: {} | Swapped: {}",
                rec.name,
                rec.duration,
                rec.priority,
                yes_no(rec.is_active()),
                yes_no(rec.is_swapped()),
            )?;
        }
        writeln!(out, "-----------------")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_REGISTERED_TASKS;
    use crate::swap::{RamStore, RECORD_SIZE};
    use core::cell::Cell;

    type Store = RamStore<{ RECORD_SIZE * MAX_REGISTERED_TASKS }>;

    fn active_records(s: &Scheduler<'_, Store>) -> usize {
        s.registry().records().iter().filter(|r| r.is_active()).count()
    }

    fn check_invariants(s: &Scheduler<'_, Store>) {
        assert_eq!(s.active_count(), active_records(s));
        assert!(s.active_count() <= MAX_TASKS);
    }

    #[test]
    fn test_priority_eviction_scenario() {
        let mut bodies = [|| {}; 5];
        let mut s = Scheduler::new(Store::new());
        for (body, name) in bodies.iter_mut().zip(["A", "B", "C", "D", "E"]) {
            s.register(name, body).unwrap();
        }

        assert_eq!(s.admit("A", 1000, 5).unwrap().evicted, None);
        assert_eq!(s.admit("B", 1000, 1).unwrap().evicted, None);
        assert_eq!(s.admit("C", 1000, 9).unwrap().evicted, None);
        assert_eq!(s.active_count(), 3);

        // B has the lowest priority.
        let d = s.admit("D", 1000, 5).unwrap();
        assert_eq!(d, Admission { task: 3, evicted: Some(1) });
        assert!(s.record(1).is_swapped());

        // A and D tie at 5; A registered first.
        let e = s.admit("E", 1000, 2).unwrap();
        assert_eq!(e, Admission { task: 4, evicted: Some(0) });
        assert!(s.record(0).is_swapped());
        assert!(s.record(3).is_active());
        check_invariants(&s);
    }

    #[test]
    fn test_admit_errors() {
        let mut body = || {};
        let mut s = Scheduler::new(Store::new());
        s.register("only", &mut body).unwrap();

        assert_eq!(s.admit("missing", 10, 1), Err(Error::UnknownTask));
        s.admit("only", 10, 1).unwrap();
        assert_eq!(s.admit("only", 20, 2), Err(Error::AlreadyActive));
        assert_eq!(s.active_count(), 1);
    }

    #[test]
    fn test_remove_discards_progress() {
        let mut body = || {};
        let mut s = Scheduler::new(Store::new());
        s.register("t", &mut body).unwrap();

        assert_eq!(s.remove("t"), Err(Error::NotActive));
        assert_eq!(s.remove("nope"), Err(Error::UnknownTask));

        s.admit("t", 100, 1).unwrap();
        s.tick(10);
        assert_eq!(s.remove("t"), Ok(0));
        assert!(s.record(0).is_dormant());
        assert_eq!(s.active_count(), 0);
        // Nothing was persisted.
        assert!(s.swap().store().as_bytes().iter().all(|b| *b == 0xFF));

        // Re-admission starts a fresh slice.
        s.admit("t", 100, 1).unwrap();
        assert_eq!(s.record(0).start_time, 0);
    }

    #[test]
    fn test_admit_remove_sequences_keep_count() {
        let mut bodies = [|| {}; 5];
        let mut s = Scheduler::new(Store::new());
        let names = ["a", "b", "c", "d", "e"];
        for (body, name) in bodies.iter_mut().zip(names) {
            s.register(name, body).unwrap();
        }

        // Deterministic pseudo-random walk over admit/remove.
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let name = names[(seed % 5) as usize];
            if seed & 0x100 == 0 {
                let _ = s.admit(name, 50, (seed >> 20) as i32 % 7);
            } else {
                let _ = s.remove(name);
            }
            check_invariants(&s);
        }
    }

    #[test]
    fn test_eviction_picks_minimum_priority() {
        let mut bodies = [|| {}; 4];
        let mut s = Scheduler::new(Store::new());
        for (body, name) in bodies.iter_mut().zip(["w", "x", "y", "z"]) {
            s.register(name, body).unwrap();
        }
        s.admit("w", 10, 4).unwrap();
        s.admit("x", 10, -2).unwrap();
        s.admit("y", 10, i32::MAX).unwrap();
        assert_eq!(s.eviction_candidate(), Some(1));
        assert_eq!(s.admit("z", 10, 0).unwrap().evicted, Some(1));
        assert_eq!(s.eviction_candidate(), Some(3));
    }

    #[test]
    fn test_tick_idle_when_paused_or_empty() {
        let runs = Cell::new(0);
        let mut body = || runs.set(runs.get() + 1);
        let mut s = Scheduler::new(Store::new());
        assert_eq!(s.tick(1), Tick::Idle);

        s.register("r", &mut body).unwrap();
        // Registered but dormant.
        assert_eq!(s.tick(1), Tick::Idle);

        s.admit("r", 100, 1).unwrap();
        s.pause();
        assert_eq!(s.tick(2), Tick::Idle);
        assert_eq!(runs.get(), 0);

        s.resume();
        assert!(matches!(s.tick(3), Tick::Ran { task: 0, cycled: false, fault: None }));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_round_robin_cycles_through_swap() {
        let a_runs = Cell::new(0);
        let b_runs = Cell::new(0);
        let mut a = || a_runs.set(a_runs.get() + 1);
        let mut b = || b_runs.set(b_runs.get() + 1);
        let mut s = Scheduler::new(Store::new());
        s.register("a", &mut a).unwrap();
        s.register("b", &mut b).unwrap();
        s.admit("a", 100, 1).unwrap();
        s.admit("b", 50, 1).unwrap();

        // Slice of a: [1, 101).
        assert!(matches!(s.tick(1), Tick::Ran { task: 0, cycled: false, .. }));
        assert_eq!((s.record(0).start_time, s.record(0).end_time), (1, 101));
        assert!(matches!(s.tick(60), Tick::Ran { task: 0, cycled: false, .. }));
        assert!(matches!(s.tick(101), Tick::Ran { task: 0, cycled: true, .. }));

        // a swapped out, b already resident and armed for a fresh slice.
        assert!(s.record(0).is_swapped());
        assert_eq!(s.current(), 1);
        assert_eq!(s.record(1).start_time, 0);
        check_invariants(&s);

        assert!(matches!(s.tick(110), Tick::Ran { task: 1, cycled: false, .. }));
        assert_eq!(s.record(1).end_time - s.record(1).start_time, 50);
        assert!(matches!(s.tick(160), Tick::Ran { task: 1, cycled: true, fault: None }));

        // Back to a: restored from the store with a reset slice.
        assert!(s.record(0).is_active());
        assert!(s.record(1).is_swapped());
        assert_eq!(s.record(0).start_time, 0);
        assert_eq!(s.record(0).duration, 100);
        check_invariants(&s);

        assert_eq!((a_runs.get(), b_runs.get()), (3, 2));
    }

    #[test]
    fn test_single_task_restarts_its_own_slice() {
        let mut body = || {};
        let mut s = Scheduler::new(Store::new());
        s.register("solo", &mut body).unwrap();
        s.admit("solo", 10, 0).unwrap();

        assert!(matches!(s.tick(5), Tick::Ran { cycled: false, .. }));
        assert!(matches!(s.tick(15), Tick::Ran { cycled: true, fault: None, .. }));
        // Swapped out and straight back in.
        assert!(s.record(0).is_active());
        assert_eq!(s.record(0).start_time, 0);
        assert!(matches!(s.tick(16), Tick::Ran { cycled: false, .. }));
        assert_eq!((s.record(0).start_time, s.record(0).end_time), (16, 26));
        check_invariants(&s);
    }

    #[test]
    fn test_rotation_skips_dormant_tasks() {
        let runs = [Cell::new(0), Cell::new(0), Cell::new(0)];
        let mut a = || runs[0].set(runs[0].get() + 1);
        let mut b = || runs[1].set(runs[1].get() + 1);
        let mut c = || runs[2].set(runs[2].get() + 1);
        let mut s = Scheduler::new(Store::new());
        s.register("a", &mut a).unwrap();
        s.register("b", &mut b).unwrap();
        s.register("c", &mut c).unwrap();
        s.admit("a", 1, 0).unwrap();
        s.admit("c", 1, 0).unwrap();

        for now in 1..=6 {
            s.tick(now);
        }
        assert_eq!(runs[1].get(), 0);
        assert_eq!(runs[0].get() + runs[2].get(), 6);
        check_invariants(&s);
    }

    #[test]
    fn test_swapped_cursor_restore_respects_capacity() {
        let mut bodies = [|| {}; 4];
        let mut s = Scheduler::new(Store::new());
        for (body, name) in bodies.iter_mut().zip(["p", "q", "r", "t"]) {
            s.register(name, body).unwrap();
        }
        s.admit("p", 1000, 1).unwrap();
        s.admit("q", 1000, 5).unwrap();
        s.admit("r", 1000, 6).unwrap();
        // Evicts p, the task under the cursor.
        s.admit("t", 1000, 7).unwrap();
        assert!(s.record(0).is_swapped());

        // Restoring p needs a slot: q now has the lowest resident priority.
        assert!(matches!(s.tick(1), Tick::Ran { task: 0, fault: None, .. }));
        assert!(s.record(0).is_active());
        assert!(s.record(1).is_swapped());
        check_invariants(&s);
    }

    #[test]
    fn test_corrupt_restore_is_reported() {
        let mut a = || {};
        let mut b = || {};
        let mut s = Scheduler::new(Store::new());
        s.register("a", &mut a).unwrap();
        s.register("b", &mut b).unwrap();
        s.admit("a", 10, 1).unwrap();
        s.admit("b", 10, 1).unwrap();

        assert!(matches!(s.tick(1), Tick::Ran { task: 0, cycled: false, .. }));
        assert!(matches!(s.tick(11), Tick::Ran { task: 0, cycled: true, .. }));
        // Damage a's image, then let b's slice run out.
        s.swap_mut().store_mut().as_bytes_mut()[0] = b'z';
        s.tick(12);
        let tick = s.tick(22);
        assert_eq!(
            tick,
            Tick::Ran { task: 1, cycled: true, fault: Some(Error::CorruptImage { slot: 0 }) }
        );
        // The registry copy keeps a schedulable.
        assert!(s.record(0).is_active());
        assert_eq!(s.record(0).name.as_str(), "a");
        check_invariants(&s);
    }

    #[test]
    fn test_inspect_pauses_and_lists() {
        let mut a = || {};
        let mut b = || {};
        let mut s = Scheduler::new(Store::new());
        s.register("alpha", &mut a).unwrap();
        s.register("beta", &mut b).unwrap();
        s.admit("alpha", 250, 4).unwrap();

        let mut out: heapless::String<512> = heapless::String::new();
        s.inspect(&mut out).unwrap();
        assert!(s.is_paused());
        assert!(out.contains("Name: alpha | Duration: 250ms | Priority: 4 | Active: Yes | Swapped: No"));
        assert!(out.contains("Name: beta | Duration: 3000ms | Priority: 0 | Active: No | Swapped: No"));
    }
}
