/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Request counters, grouped per controller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter name that collects increments of unregistered names.
pub const FALLBACK_COUNTER: &str = "*";

/// One counter value as reported to the AP plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsEntry {
    pub group: String,
    pub name: String,
    pub value: u64,
}

/// Fixed set of named counters.
pub struct StatsGroup {
    name: &'static str,
    names: Vec<&'static str>,
    index: HashMap<&'static str, usize>,
    counters: Vec<AtomicU64>,
    fallback: AtomicU64,
}

impl StatsGroup {
    fn new(name: &'static str, counter_names: &[&'static str]) -> Self {
        let mut names: Vec<&'static str> = counter_names.to_vec();
        names.sort_unstable();
        names.dedup();
        let index = names
            .iter()
            .enumerate()
            .map(|(position, name)| (*name, position))
            .collect();
        let counters = names.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            name,
            names,
            index,
            counters,
            fallback: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inc(&self, counter: &str) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: &str, n: u64) {
        match self.index.get(counter) {
            Some(position) => self.counters[*position].fetch_add(n, Ordering::Relaxed),
            None => self.fallback.fetch_add(n, Ordering::Relaxed),
        };
    }

    pub fn get(&self, counter: &str) -> u64 {
        if counter == FALLBACK_COUNTER {
            return self.fallback.load(Ordering::Relaxed);
        }
        self.index
            .get(counter)
            .map_or(0, |position| self.counters[*position].load(Ordering::Relaxed))
    }

    /// Registered counters by name, then the fallback bucket when non-zero.
    pub fn entries(&self) -> Vec<StatsEntry> {
        let mut entries: Vec<StatsEntry> = self
            .names
            .iter()
            .zip(self.counters.iter())
            .map(|(name, counter)| StatsEntry {
                group: self.name.to_string(),
                name: name.to_string(),
                value: counter.load(Ordering::Relaxed),
            })
            .collect();
        let fallback = self.fallback.load(Ordering::Relaxed);
        if fallback != 0 {
            entries.push(StatsEntry {
                group: self.name.to_string(),
                name: FALLBACK_COUNTER.to_string(),
                value: fallback,
            });
        }
        entries
    }
}

/// All counter groups of one broker.
#[derive(Default)]
pub struct StatsTable {
    groups: Vec<Arc<StatsGroup>>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group, or returns the existing one of that name.
    pub fn register(&mut self, name: &'static str, counters: &[&'static str]) -> Arc<StatsGroup> {
        if let Some(existing) = self.group(name) {
            return existing;
        }
        let group = Arc::new(StatsGroup::new(name, counters));
        self.groups.push(Arc::clone(&group));
        self.groups.sort_by_key(|group| group.name());
        group
    }

    pub fn group(&self, name: &str) -> Option<Arc<StatsGroup>> {
        self.groups.iter().find(|group| group.name() == name).cloned()
    }

    pub fn entries(&self) -> Vec<StatsEntry> {
        self.groups.iter().flat_map(|group| group.entries()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{StatsTable, FALLBACK_COUNTER};

    #[test]
    fn unknown_counters_fall_into_the_fallback_bucket() {
        let mut table = StatsTable::new();
        let group = table.register("vmctl", &["hello", "hello/err"]);

        group.inc("hello");
        group.inc("hello");
        group.inc("flowmod");
        group.add("flowmod/err", 2);

        assert_eq!(group.get("hello"), 2);
        assert_eq!(group.get("hello/err"), 0);
        assert_eq!(group.get(FALLBACK_COUNTER), 3);
    }

    #[test]
    fn entries_are_sorted_by_group_then_name() {
        let mut table = StatsTable::new();
        let vm = table.register("vmctl", &["monitor", "hello"]);
        let ap = table.register("apctl", &["getstats"]);
        vm.inc("monitor");
        ap.inc("unknown");

        let listed: Vec<(String, String, u64)> = table
            .entries()
            .into_iter()
            .map(|entry| (entry.group, entry.name, entry.value))
            .collect();

        assert_eq!(
            listed,
            vec![
                ("apctl".to_string(), "getstats".to_string(), 0),
                ("apctl".to_string(), "*".to_string(), 1),
                ("vmctl".to_string(), "hello".to_string(), 0),
                ("vmctl".to_string(), "monitor".to_string(), 1),
            ]
        );
    }

    #[test]
    fn registering_twice_returns_the_same_group() {
        let mut table = StatsTable::new();
        let first = table.register("dpctl", &["hello"]);
        let second = table.register("dpctl", &["other"]);
        first.inc("hello");

        assert_eq!(second.get("hello"), 1);
        assert_eq!(table.entries().len(), 1);
    }
}
