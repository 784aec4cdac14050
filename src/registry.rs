//! # Task Registry
//!
//! Static, append-only table binding task names to their bodies. The
//! registry owns the records and borrows the bodies; the scheduler refers to
//! tasks only by [`TaskId`] and runs them through [`Registry::run`].

use heapless::Vec;
use log::{info, warn};

use crate::config::MAX_REGISTERED_TASKS;
use crate::error::{Error, Result};
use crate::task::{TaskBody, TaskId, TaskRecord};

pub struct Registry<'a> {
    records: Vec<TaskRecord, MAX_REGISTERED_TASKS>,
    /// `bodies[i]` belongs to `records[i]`.
    bodies: Vec<&'a mut dyn TaskBody, MAX_REGISTERED_TASKS>,
}

impl<'a> Registry<'a> {
    pub const fn new() -> Self {
        Self { records: Vec::new(), bodies: Vec::new() }
    }

    /// Append a dormant task. Names are not deduplicated: a second
    /// registration under an existing name is shadowed by the first for
    /// every name lookup.
    pub fn register(&mut self, name: &str, body: &'a mut dyn TaskBody) -> Result<TaskId> {
        if self.records.is_full() {
            warn!("registry full, dropping task {}", name);
            return Err(Error::RegistryFull);
        }
        let id = self.records.len();
        let _ = self.records.push(TaskRecord::dormant(name));
        let _ = self.bodies.push(body);
        info!("registered task {} as #{}", self.records[id].name, id);
        Ok(id)
    }

    /// First task whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.records.iter().position(|r| r.name == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn record(&self, id: TaskId) -> &TaskRecord {
        &self.records[id]
    }

    #[inline]
    pub fn record_mut(&mut self, id: TaskId) -> &mut TaskRecord {
        &mut self.records[id]
    }

    /// Records in registration order.
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    /// Invoke the body bound to `id` once.
    #[inline]
    pub fn run(&mut self, id: TaskId) {
        self.bodies[id].run();
    }
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_register_until_full() {
        let mut bodies = [|| {}; MAX_REGISTERED_TASKS + 1];
        let mut reg = Registry::new();
        let names = ["a", "b", "c", "d", "e", "f"];
        let mut results = [Ok(0); MAX_REGISTERED_TASKS + 1];
        for ((body, name), slot) in bodies.iter_mut().zip(names).zip(results.iter_mut()) {
            *slot = reg.register(name, body);
        }
        assert_eq!(results[..MAX_REGISTERED_TASKS], [Ok(0), Ok(1), Ok(2), Ok(3), Ok(4)]);
        assert_eq!(results[MAX_REGISTERED_TASKS], Err(Error::RegistryFull));
        assert_eq!(reg.len(), MAX_REGISTERED_TASKS);
        assert_eq!(reg.find("f"), None);
    }

    #[test]
    fn test_duplicate_name_shadowed() {
        let first = Cell::new(0);
        let second = Cell::new(0);
        let mut a = || first.set(first.get() + 1);
        let mut b = || second.set(second.get() + 1);
        let mut reg = Registry::new();
        assert_eq!(reg.register("dup", &mut a), Ok(0));
        assert_eq!(reg.register("dup", &mut b), Ok(1));

        let id = reg.find("dup").unwrap();
        assert_eq!(id, 0);
        reg.run(id);
        assert_eq!((first.get(), second.get()), (1, 0));
    }

    #[test]
    fn test_lookup_uses_truncated_name() {
        let mut body = || {};
        let mut reg = Registry::new();
        reg.register("ultrasonic", &mut body).unwrap();
        assert_eq!(reg.find("ultrasoni"), Some(0));
        assert_eq!(reg.find("ultrasonic"), None);
    }

    #[test]
    fn test_new_records_are_dormant() {
        let mut body = || {};
        let mut reg = Registry::new();
        reg.register("idle", &mut body).unwrap();
        assert!(reg.record(0).is_dormant());
    }
}
