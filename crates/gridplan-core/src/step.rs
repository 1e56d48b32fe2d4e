//! Hierarchical time steps.
//!
//! A planning horizon is a stack of resolution levels. Level 0 counts years;
//! deeper levels split a year into seasons, day types, load blocks and so on.
//! A [`Step`] names one bucket of that hierarchy and prints as the level
//! letters followed by their values:
//!
//! ```text
//!   levels:  Y(20)  S(4)  B(3)
//!   step:    Y3S2B1   -> year 3, season 2, block 1
//!   coarse:  Y3S2     -> every block of season 2 in year 3
//! ```
//!
//! Steps compare lexicographically on their values, most significant (year)
//! first, so a shorter step sorts before every refinement of it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GridplanError, GridplanResult};

/// One resolution level of the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Single-letter name used in step labels.
    pub name: char,
    /// Number of buckets at this level (years for level 0).
    pub length: u32,
}

impl Level {
    pub fn new(name: char, length: u32) -> Self {
        Self { name, length }
    }
}

/// The planning horizon: resolution levels plus hours per finest step.
#[derive(Debug, Clone, PartialEq)]
pub struct Horizon {
    levels: Vec<Level>,
    step_hours: Vec<f64>,
}

impl Horizon {
    /// Build a horizon. An empty `step_hours` spreads 8760 hours evenly over
    /// the finest sub-year steps.
    pub fn new(levels: Vec<Level>, step_hours: Vec<f64>) -> GridplanResult<Self> {
        if levels.is_empty() {
            return Err(GridplanError::Config(
                "horizon needs at least the year level".into(),
            ));
        }
        for (i, level) in levels.iter().enumerate() {
            if !level.name.is_ascii_alphabetic() {
                return Err(GridplanError::Config(format!(
                    "level name '{}' must be an ASCII letter",
                    level.name
                )));
            }
            if level.length == 0 {
                return Err(GridplanError::Config(format!(
                    "level '{}' has zero length",
                    level.name
                )));
            }
            if levels[..i].iter().any(|l| l.name == level.name) {
                return Err(GridplanError::Config(format!(
                    "level name '{}' used twice",
                    level.name
                )));
            }
        }

        let per_year: usize = levels[1..].iter().map(|l| l.length as usize).product();
        let step_hours = if step_hours.is_empty() {
            vec![8760.0 / per_year as f64; per_year]
        } else if step_hours.len() != per_year {
            return Err(GridplanError::Config(format!(
                "step_hours has {} entries but a year has {} steps",
                step_hours.len(),
                per_year
            )));
        } else if step_hours.iter().any(|h| !h.is_finite() || *h < 0.0) {
            return Err(GridplanError::Config(
                "step_hours must be finite and non-negative".into(),
            ));
        } else {
            step_hours
        };

        Ok(Self { levels, step_hours })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of resolution levels, years included.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Number of planning years.
    pub fn years(&self) -> u32 {
        self.levels[0].length
    }

    /// Number of finest steps in one year.
    pub fn steps_per_year(&self) -> usize {
        self.step_hours.len()
    }

    /// The last step of the horizon: every level at its length.
    pub fn last_step(&self) -> Step {
        Step {
            parts: self.levels.iter().map(|l| (l.name, l.length)).collect(),
        }
    }

    /// Label of a whole year, e.g. `Y3`.
    pub fn year_label(&self, year: u32) -> String {
        format!("{}{}", self.levels[0].name, year)
    }

    /// Every finest step of the horizon, in order.
    pub fn steps(&self) -> Vec<Step> {
        let mut out = Vec::with_capacity(self.years() as usize * self.steps_per_year());
        let mut step = Step {
            parts: self.levels.iter().map(|l| (l.name, 1)).collect(),
        };
        while step.year() <= self.years() {
            out.push(step.clone());
            step = step.next(self);
        }
        out
    }

    /// Check that a step uses this horizon's letters and stays in range.
    pub fn check(&self, step: &Step) -> GridplanResult<()> {
        if step.parts.is_empty() || step.parts.len() > self.levels.len() {
            return Err(GridplanError::Validation(format!(
                "step '{}' has {} levels, horizon has {}",
                step,
                step.parts.len(),
                self.levels.len()
            )));
        }
        for (k, ((letter, value), level)) in step.parts.iter().zip(&self.levels).enumerate() {
            if *letter != level.name {
                return Err(GridplanError::Validation(format!(
                    "step '{}' uses letter '{}' where level '{}' is expected",
                    step, letter, level.name
                )));
            }
            let low = if k == 0 { 1 } else { 0 };
            if *value < low || *value > level.length {
                return Err(GridplanError::Validation(format!(
                    "step '{}' is outside the horizon",
                    step
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, step: &Step) -> bool {
        self.check(step).is_ok()
    }

    /// Hours covered by a step: the sum over every finest step it contains.
    /// A sub-year component of 0 matches the whole level.
    pub fn hours(&self, step: &Step) -> f64 {
        let lengths: Vec<u32> = self.levels[1..].iter().map(|l| l.length).collect();
        let wanted: Vec<u32> = step.values().skip(1).collect();
        let mut fine = vec![1u32; lengths.len()];
        let mut total = 0.0;
        for hours in &self.step_hours {
            let matches = wanted
                .iter()
                .zip(&fine)
                .all(|(want, have)| *want == 0 || want == have);
            if matches {
                total += hours;
            }
            for k in (0..fine.len()).rev() {
                if fine[k] < lengths[k] {
                    fine[k] += 1;
                    break;
                }
                fine[k] = 1;
            }
        }
        total
    }
}

/// A position in the time hierarchy.
#[derive(Debug, Clone)]
pub struct Step {
    parts: Vec<(char, u32)>,
}

impl Step {
    /// Build a step from its values using the horizon's letters.
    pub fn from_values(values: &[u32], horizon: &Horizon) -> GridplanResult<Self> {
        let step = Step {
            parts: values
                .iter()
                .zip(horizon.levels())
                .map(|(v, l)| (l.name, *v))
                .collect(),
        };
        if values.len() > horizon.depth() {
            return Err(GridplanError::Validation(format!(
                "{} step values for a {}-level horizon",
                values.len(),
                horizon.depth()
            )));
        }
        horizon.check(&step)?;
        Ok(step)
    }

    /// Parse a label and check it against the horizon.
    pub fn parse(text: &str, horizon: &Horizon) -> GridplanResult<Self> {
        let step: Step = text.parse()?;
        horizon.check(&step)?;
        Ok(step)
    }

    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.parts.iter().map(|(_, v)| *v)
    }

    /// Number of levels this step resolves.
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    pub fn year(&self) -> u32 {
        self.parts.first().map(|(_, v)| *v).unwrap_or(0)
    }

    pub fn with_year(&self, year: u32) -> Step {
        let mut step = self.clone();
        if let Some(first) = step.parts.first_mut() {
            first.1 = year;
        }
        step
    }

    pub fn add_years(&self, years: u32) -> Step {
        self.with_year(self.year() + years)
    }

    /// The following step at the same resolution. Sub-year levels wrap and
    /// carry; the year is never capped, so the step after the horizon end
    /// lies beyond it.
    pub fn next(&self, horizon: &Horizon) -> Step {
        let mut step = self.clone();
        for k in (0..step.parts.len()).rev() {
            if k == 0 {
                step.parts[0].1 += 1;
                break;
            }
            let length = horizon.levels().get(k).map(|l| l.length).unwrap_or(1);
            if step.parts[k].1 < length {
                step.parts[k].1 += 1;
                break;
            }
            step.parts[k].1 = 1;
        }
        step
    }

    /// Flat 1-based bucket of the sub-year part at this step's resolution.
    pub fn column(&self, horizon: &Horizon) -> usize {
        let mut column = 0usize;
        for (k, (_, value)) in self.parts.iter().enumerate().skip(1) {
            let length = horizon.levels().get(k).map(|l| l.length).unwrap_or(1) as usize;
            column = column * length + ((*value).max(1) - 1) as usize;
        }
        column + 1
    }

    /// True when every component from `depth` on is 0 or 1.
    pub fn is_first_in_year(&self, depth: usize) -> bool {
        self.parts.iter().skip(depth).all(|(_, v)| *v <= 1)
    }

    pub fn hours(&self, horizon: &Horizon) -> f64 {
        horizon.hours(self)
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.values().eq(other.values())
    }
}

impl Eq for Step {}

impl Hash for Step {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in self.values() {
            v.hash(state);
        }
    }
}

impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Step {
    fn cmp(&self, other: &Self) -> Ordering {
        self.values().cmp(other.values())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, value) in &self.parts {
            write!(f, "{}{}", letter, value)?;
        }
        Ok(())
    }
}

impl FromStr for Step {
    type Err = GridplanError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = Vec::new();
        let mut chars = text.chars().peekable();
        while let Some(letter) = chars.next() {
            if !letter.is_ascii_alphabetic() {
                return Err(GridplanError::Parse(format!(
                    "step '{}': expected a level letter, found '{}'",
                    text, letter
                )));
            }
            let mut digits = String::new();
            while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(c);
                chars.next();
            }
            let value = digits.parse::<u32>().map_err(|_| {
                GridplanError::Parse(format!(
                    "step '{}': level '{}' has no value",
                    text, letter
                ))
            })?;
            parts.push((letter, value));
        }
        if parts.is_empty() {
            return Err(GridplanError::Parse("empty step label".into()));
        }
        Ok(Step { parts })
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon() -> Horizon {
        Horizon::new(
            vec![Level::new('Y', 3), Level::new('S', 2), Level::new('B', 3)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let h = horizon();
        let step = Step::parse("Y2S1B3", &h).unwrap();
        assert_eq!(step.year(), 2);
        assert_eq!(step.values().collect::<Vec<_>>(), vec![2, 1, 3]);
        assert_eq!(step.to_string(), "Y2S1B3");
    }

    #[test]
    fn test_parse_rejects_bad_labels() {
        let h = horizon();
        assert!(Step::parse("", &h).is_err());
        assert!(Step::parse("Y", &h).is_err());
        assert!(Step::parse("2S1", &h).is_err());
        assert!(Step::parse("Y4S1B1", &h).is_err());
        assert!(Step::parse("Y1B1S1", &h).is_err());
        assert!(Step::parse("Y1S3", &h).is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let h = horizon();
        let a = Step::parse("Y1S2B3", &h).unwrap();
        let b = Step::parse("Y2S1B1", &h).unwrap();
        let coarse = Step::parse("Y2S1", &h).unwrap();
        assert!(a < b);
        assert!(coarse < b);
        assert!(a < coarse);
    }

    #[test]
    fn test_next_carries_into_year() {
        let h = horizon();
        let step = Step::parse("Y1S1B3", &h).unwrap();
        assert_eq!(step.next(&h).to_string(), "Y1S2B1");
        let end = h.last_step();
        assert_eq!(end.to_string(), "Y3S2B3");
        assert_eq!(end.next(&h).to_string(), "Y4S1B1");
    }

    #[test]
    fn test_steps_enumerates_horizon() {
        let h = horizon();
        let steps = h.steps();
        assert_eq!(steps.len(), 18);
        assert_eq!(steps[0].to_string(), "Y1S1B1");
        assert_eq!(steps[17], h.last_step());
    }

    #[test]
    fn test_column_and_hours() {
        let h = horizon();
        let step = Step::parse("Y1S2B2", &h).unwrap();
        assert_eq!(step.column(&h), 5);
        assert!((step.hours(&h) - 8760.0 / 6.0).abs() < 1e-9);

        let season = Step::parse("Y1S2", &h).unwrap();
        assert_eq!(season.column(&h), 2);
        assert!((season.hours(&h) - 4380.0).abs() < 1e-9);

        let year = Step::parse("Y3", &h).unwrap();
        assert!((year.hours(&h) - 8760.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_step_hours() {
        let h = Horizon::new(
            vec![Level::new('Y', 2), Level::new('B', 2)],
            vec![3000.0, 5760.0],
        )
        .unwrap();
        assert_eq!(Step::parse("Y2B2", &h).unwrap().hours(&h), 5760.0);
        assert!(Horizon::new(vec![Level::new('Y', 2), Level::new('B', 2)], vec![1.0]).is_err());
    }

    #[test]
    fn test_first_in_year() {
        let h = horizon();
        assert!(Step::parse("Y2S1B1", &h).unwrap().is_first_in_year(1));
        assert!(Step::parse("Y2S0B1", &h).unwrap().is_first_in_year(1));
        assert!(!Step::parse("Y2S1B2", &h).unwrap().is_first_in_year(1));
        // only the block has to be first when investing per season
        assert!(Step::parse("Y2S2B1", &h).unwrap().is_first_in_year(2));
    }

    #[test]
    fn test_year_arithmetic() {
        let h = horizon();
        let step = Step::parse("Y1S2B1", &h).unwrap();
        assert_eq!(step.add_years(2).to_string(), "Y3S2B1");
        assert_eq!(step.with_year(2).to_string(), "Y2S2B1");
        assert_eq!(h.year_label(2), "Y2");
    }

    #[test]
    fn test_serde_as_label() {
        let h = horizon();
        let step = Step::parse("Y1S2B1", &h).unwrap();
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, "\"Y1S2B1\"");
        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }
}
