//! Contingency event data consumed by the resilience evaluation.

use serde::{Deserialize, Serialize};

use gridplan_core::EventSpec;

use crate::error::{EngineError, EngineResult};

/// Event flags of one planning year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEvents {
    /// Whether the base-case cost of this year is needed.
    pub base: bool,
    /// One flag per event: whether the event strikes this year.
    pub events: Vec<bool>,
}

/// Capacity availability per event and the years each event affects.
///
/// Event numbers are 1-based; event 0 is the base case with every
/// multiplier at 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    pub names: Vec<String>,
    /// Per capacity entry: `[1, m_1, .., m_n]`.
    pub capacity: Vec<Vec<f64>>,
    /// Per year, starting with year 1.
    pub years: Vec<YearEvents>,
}

impl EventTable {
    pub fn from_specs(specs: &[EventSpec], years: u32) -> Self {
        let years = (1..=years)
            .map(|year| {
                let events: Vec<bool> = specs.iter().map(|e| e.years.contains(&year)).collect();
                YearEvents {
                    base: events.iter().any(|&hit| hit),
                    events,
                }
            })
            .collect();
        Self {
            names: specs.iter().map(|e| e.name.clone()).collect(),
            capacity: Vec::new(),
            years,
        }
    }

    pub fn push_capacity(&mut self, multipliers: Vec<f64>) {
        self.capacity.push(multipliers);
    }

    pub fn event_count(&self) -> usize {
        self.names.len()
    }

    /// Availability of capacity entry `capacity` under `event`.
    pub fn multiplier(&self, capacity: usize, event: usize) -> f64 {
        self.capacity
            .get(capacity)
            .and_then(|m| m.get(event))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn needs_base(&self, year: u32) -> bool {
        self.year(year).map(|y| y.base).unwrap_or(false)
    }

    pub fn affects(&self, year: u32, event: usize) -> bool {
        if event == 0 {
            return self.needs_base(year);
        }
        self.year(year)
            .and_then(|y| y.events.get(event - 1))
            .copied()
            .unwrap_or(false)
    }

    fn year(&self, year: u32) -> Option<&YearEvents> {
        year.checked_sub(1).and_then(|y| self.years.get(y as usize))
    }

    /// Check the table against the session it is used with.
    pub fn validate(&self, capacities: usize, years: u32) -> EngineResult<()> {
        if self.capacity.len() != capacities {
            return Err(EngineError::Inconsistent(format!(
                "event table has {} capacity entries, registry has {}",
                self.capacity.len(),
                capacities
            )));
        }
        if self.years.len() != years as usize {
            return Err(EngineError::Inconsistent(format!(
                "event table covers {} years, horizon has {}",
                self.years.len(),
                years
            )));
        }
        let width = self.event_count() + 1;
        if let Some(bad) = self.capacity.iter().position(|m| m.len() != width) {
            return Err(EngineError::Inconsistent(format!(
                "capacity entry {} has {} multipliers, expected {}",
                bad,
                self.capacity[bad].len(),
                width
            )));
        }
        Ok(())
    }
}
