//! Attribution of flat solution vectors back to arcs, nodes and years.
//!
//! Every variable family keeps its own [`SolutionIndex`] in declaration
//! order. The flat solution vector is the concatenation of all families in
//! [`VariableFamily::ALL`] order, so a family's values start where the
//! previous family's entries end.
//!
//! Persisted indices use four lines per entry:
//!
//! ```text
//! <position>
//! <column>
//! <year>
//! <name>
//! ```

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// One declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Logical entity id (asset, site or metric).
    pub position: usize,
    /// Time bucket of the variable's step.
    pub column: usize,
    pub year: u32,
    pub name: String,
}

/// Ordered registry of the variables of one family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionIndex {
    entries: Vec<IndexEntry>,
}

impl SolutionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: usize, column: usize, year: u32, name: impl Into<String>) {
        self.entries.push(IndexEntry {
            position,
            column,
            year,
            name: name.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, i: usize) -> usize {
        self.entries[i].position
    }

    pub fn column(&self, i: usize) -> usize {
        self.entries[i].column
    }

    pub fn year(&self, i: usize) -> u32 {
        self.entries[i].year
    }

    pub fn name(&self, i: usize) -> &str {
        &self.entries[i].name
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Sum the values of contiguous runs of entries sharing a position.
    ///
    /// `values[start + i]` belongs to entry `i`; missing values count as zero.
    pub fn sum_by_row(&self, values: &[f64], start: usize) -> Vec<f64> {
        let mut sums = Vec::new();
        let mut current: Option<usize> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let value = values.get(start + i).copied().unwrap_or(0.0);
            if current == Some(entry.position) {
                if let Some(last) = sums.last_mut() {
                    *last += value;
                }
            } else {
                sums.push(value);
                current = Some(entry.position);
            }
        }
        sums
    }

    pub fn write_to(&self, mut out: impl Write) -> std::io::Result<()> {
        for entry in &self.entries {
            writeln!(out, "{}", entry.position)?;
            writeln!(out, "{}", entry.column)?;
            writeln!(out, "{}", entry.year)?;
            writeln!(out, "{}", entry.name)?;
        }
        Ok(())
    }

    /// Parse the four-line record format. `path` only labels errors.
    pub fn read_from(input: impl BufRead, path: &Path) -> EngineResult<Self> {
        let lines = input.lines().collect::<Result<Vec<_>, _>>()?;
        let err = |line: usize, message: String| EngineError::Index {
            path: path.to_path_buf(),
            message: format!("line {}: {}", line, message),
        };
        if lines.len() % 4 != 0 {
            return Err(err(
                lines.len(),
                format!("truncated record ({} lines is not a multiple of 4)", lines.len()),
            ));
        }

        let mut index = SolutionIndex::new();
        for (record, chunk) in lines.chunks(4).enumerate() {
            let first = record * 4 + 1;
            let position = chunk[0]
                .trim()
                .parse::<usize>()
                .map_err(|e| err(first, format!("invalid position: {}", e)))?;
            let column = chunk[1]
                .trim()
                .parse::<usize>()
                .map_err(|e| err(first + 1, format!("invalid column: {}", e)))?;
            let year = chunk[2]
                .trim()
                .parse::<u32>()
                .map_err(|e| err(first + 2, format!("invalid year: {}", e)))?;
            index.add(position, column, year, chunk[3].trim_end());
        }
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let mut file = std::io::BufWriter::new(fs::File::create(path)?);
        self.write_to(&mut file)?;
        file.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let file = fs::File::open(path).map_err(|e| EngineError::Index {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::read_from(BufReader::new(file), path)
    }
}

/// Where the variables of a family live under decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Master,
    Subproblem,
}

/// Variable families in flat solution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableFamily {
    Capacity,
    Investment,
    Emission,
    ReserveMargin,
    RegulationMargin,
    RampMargin10,
    RampMargin30,
    RampMargin60,
    Flow,
    Unserved,
    RampHeadroom10,
    RampHeadroom30,
    RampHeadroom60,
    ContingencyReserve,
    OperationalReserve,
    RegulationUp,
    RegulationDown,
    DcAngle,
}

impl VariableFamily {
    pub const ALL: [VariableFamily; 18] = [
        VariableFamily::Capacity,
        VariableFamily::Investment,
        VariableFamily::Emission,
        VariableFamily::ReserveMargin,
        VariableFamily::RegulationMargin,
        VariableFamily::RampMargin10,
        VariableFamily::RampMargin30,
        VariableFamily::RampMargin60,
        VariableFamily::Flow,
        VariableFamily::Unserved,
        VariableFamily::RampHeadroom10,
        VariableFamily::RampHeadroom30,
        VariableFamily::RampHeadroom60,
        VariableFamily::ContingencyReserve,
        VariableFamily::OperationalReserve,
        VariableFamily::RegulationUp,
        VariableFamily::RegulationDown,
        VariableFamily::DcAngle,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Stem of the persisted index file (`idx_<stem>.csv`).
    pub fn stem(self) -> &'static str {
        match self {
            VariableFamily::Capacity => "cap",
            VariableFamily::Investment => "inv",
            VariableFamily::Emission => "em",
            VariableFamily::ReserveMargin => "rm",
            VariableFamily::RegulationMargin => "rmrc",
            VariableFamily::RampMargin10 => "rmrp10",
            VariableFamily::RampMargin30 => "rmrp30",
            VariableFamily::RampMargin60 => "rmrp60",
            VariableFamily::Flow => "arc",
            VariableFamily::Unserved => "ud",
            VariableFamily::RampHeadroom10 => "rc10",
            VariableFamily::RampHeadroom30 => "rc30",
            VariableFamily::RampHeadroom60 => "rc60",
            VariableFamily::ContingencyReserve => "cr",
            VariableFamily::OperationalReserve => "crop",
            VariableFamily::RegulationUp => "ru",
            VariableFamily::RegulationDown => "rd",
            VariableFamily::DcAngle => "dc",
        }
    }

    pub fn index_file(self) -> String {
        format!("idx_{}.csv", self.stem())
    }

    pub fn result_file(self) -> &'static str {
        match self {
            VariableFamily::Capacity => "post_arc_cap.csv",
            VariableFamily::Investment => "post_arc_inv.csv",
            VariableFamily::Emission => "post_emissions.csv",
            VariableFamily::ReserveMargin => "post_node_rm.csv",
            VariableFamily::RegulationMargin => "post_node_rmrc.csv",
            VariableFamily::RampMargin10 => "post_node_rmrp10.csv",
            VariableFamily::RampMargin30 => "post_node_rmrp30.csv",
            VariableFamily::RampMargin60 => "post_node_rmrp60.csv",
            VariableFamily::Flow => "post_arc_flow.csv",
            VariableFamily::Unserved => "post_node_ud.csv",
            VariableFamily::RampHeadroom10 => "post_node_RC10.csv",
            VariableFamily::RampHeadroom30 => "post_node_RC30.csv",
            VariableFamily::RampHeadroom60 => "post_node_RC60.csv",
            VariableFamily::ContingencyReserve => "post_arc_cr.csv",
            VariableFamily::OperationalReserve => "post_arc_crop.csv",
            VariableFamily::RegulationUp => "post_arc_ru.csv",
            VariableFamily::RegulationDown => "post_arc_rd.csv",
            VariableFamily::DcAngle => "post_node_dc.csv",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            VariableFamily::Capacity => "% Capacity",
            VariableFamily::Investment => "% Investments",
            VariableFamily::Emission => "% Emissions",
            VariableFamily::ReserveMargin => "% Reserve margins",
            VariableFamily::RegulationMargin => "% Ramp margins",
            VariableFamily::RampMargin10 => "% 10 min. Ramp margins",
            VariableFamily::RampMargin30 => "% 30 min. Ramp margins",
            VariableFamily::RampMargin60 => "% 60 min. Ramp margins",
            VariableFamily::Flow => "% Arc flows",
            VariableFamily::Unserved => "% Demand not served at nodes",
            VariableFamily::RampHeadroom10 => "% 10m Ramp margins",
            VariableFamily::RampHeadroom30 => "% 30m Ramp margins",
            VariableFamily::RampHeadroom60 => "% 60m Ramp margins",
            VariableFamily::ContingencyReserve => "% Generator Contingency Reserve",
            VariableFamily::OperationalReserve => "% Generator Operational Contingency Reserve",
            VariableFamily::RegulationUp => "% Generator Up Regulation",
            VariableFamily::RegulationDown => "% Generator Down Regulation",
            VariableFamily::DcAngle => "% DC voltage angles",
        }
    }

    pub fn placement(self) -> Placement {
        match self {
            VariableFamily::Capacity
            | VariableFamily::Investment
            | VariableFamily::ReserveMargin
            | VariableFamily::RegulationMargin
            | VariableFamily::RampMargin10
            | VariableFamily::RampMargin30
            | VariableFamily::RampMargin60
            | VariableFamily::RampHeadroom10
            | VariableFamily::RampHeadroom30
            | VariableFamily::RampHeadroom60 => Placement::Master,
            _ => Placement::Subproblem,
        }
    }
}

/// One [`SolutionIndex`] per variable family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRegistry {
    indices: Vec<SolutionIndex>,
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self {
            indices: vec![SolutionIndex::new(); VariableFamily::ALL.len()],
        }
    }
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, family: VariableFamily) -> &SolutionIndex {
        &self.indices[family.slot()]
    }

    pub fn get_mut(&mut self, family: VariableFamily) -> &mut SolutionIndex {
        &mut self.indices[family.slot()]
    }

    /// Offset of a family's first value in the flat solution vector.
    pub fn start(&self, family: VariableFamily) -> usize {
        self.indices[..family.slot()].iter().map(SolutionIndex::len).sum()
    }

    /// Total number of variables across all families.
    pub fn total(&self) -> usize {
        self.indices.iter().map(SolutionIndex::len).sum()
    }

    pub fn save_dir(&self, dir: &Path) -> EngineResult<()> {
        for family in VariableFamily::ALL {
            self.get(family).save(&dir.join(family.index_file()))?;
        }
        Ok(())
    }

    pub fn load_dir(dir: &Path) -> EngineResult<Self> {
        let mut registry = IndexRegistry::new();
        for family in VariableFamily::ALL {
            *registry.get_mut(family) = SolutionIndex::load(&dir.join(family.index_file()))?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sum_by_row_groups_contiguous_positions() {
        let mut index = SolutionIndex::new();
        index.add(1, 1, 1, "a");
        index.add(1, 1, 1, "b");
        index.add(2, 2, 2, "c");
        assert_eq!(index.sum_by_row(&[3.0, 4.0, 5.0], 0), vec![7.0, 5.0]);
        assert_eq!(index.sum_by_row(&[9.0, 3.0, 4.0, 5.0], 1), vec![7.0, 5.0]);
    }

    #[test]
    fn test_sum_by_row_splits_non_contiguous_runs() {
        let mut index = SolutionIndex::new();
        index.add(1, 1, 1, "a");
        index.add(2, 1, 1, "b");
        index.add(1, 2, 2, "c");
        assert_eq!(index.sum_by_row(&[1.0, 2.0, 3.0], 0), vec![1.0, 2.0, 3.0]);
        assert!(SolutionIndex::new().sum_by_row(&[], 0).is_empty());
    }

    #[test]
    fn test_four_line_records() {
        let mut index = SolutionIndex::new();
        index.add(0, 3, 1, "capNGNYY1_ELNYY1");
        index.add(4, 7, 2, "UD_ELNYY2");
        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "0\n3\n1\ncapNGNYY1_ELNYY1\n4\n7\n2\nUD_ELNYY2\n"
        );
        let back = SolutionIndex::read_from(Cursor::new(buf), Path::new("idx_cap.csv")).unwrap();
        assert_eq!(back, index);
        assert_eq!(back.name(1), "UD_ELNYY2");
        assert_eq!(back.year(0), 1);
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let err = SolutionIndex::read_from(Cursor::new("0\n1\n1\n"), Path::new("idx_ud.csv"))
            .unwrap_err();
        match err {
            EngineError::Index { path, message } => {
                assert_eq!(path, Path::new("idx_ud.csv"));
                assert!(message.contains("truncated"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let bad = SolutionIndex::read_from(Cursor::new("x\n1\n1\nname\n"), Path::new("idx.csv"));
        assert!(matches!(bad, Err(EngineError::Index { .. })));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SolutionIndex::load(&dir.path().join("idx_cap.csv")).unwrap_err();
        assert!(matches!(err, EngineError::Index { .. }));
    }

    #[test]
    fn test_registry_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.get_mut(VariableFamily::Flow).add(0, 1, 1, "f");
        registry.get_mut(VariableFamily::Capacity).add(0, 1, 1, "c");
        registry.save_dir(dir.path()).unwrap();
        assert!(dir.path().join("idx_arc.csv").exists());

        let back = IndexRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(back, registry);
        assert_eq!(back.start(VariableFamily::Flow), 1);
        assert_eq!(back.total(), 2);
    }

    #[test]
    fn test_family_placement() {
        assert_eq!(VariableFamily::Capacity.placement(), Placement::Master);
        assert_eq!(VariableFamily::RampHeadroom30.placement(), Placement::Master);
        assert_eq!(VariableFamily::Emission.placement(), Placement::Subproblem);
        assert_eq!(VariableFamily::DcAngle.index_file(), "idx_dc.csv");
    }
}
