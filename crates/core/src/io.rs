//! Submission CSV load/save.
//!
//! Format: header `id,x,y,deg`, one row per placed tree. Ids are `NNN_i`
//! with the zero-padded group size and the tree index. Numeric fields may
//! carry a literal `s` prefix, which the loader strips and the writer
//! emits; values are written fixed-point with 15 fractional digits so a
//! save/load cycle reproduces the poses.
//!
//! The loader is tolerant: rows may appear in any order, a group's size
//! comes from the id's `NNN` field (not the row count), rows with an
//! index at or beyond the group size are dropped, and missing indices
//! default to the zero pose.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{Layout, Pose};

/// Largest group size in a submission.
pub const MAX_GROUP: usize = 200;

#[derive(Debug, Deserialize)]
struct InputRow {
    id: String,
    x: String,
    y: String,
    deg: String,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    id: String,
    x: String,
    y: String,
    deg: String,
}

fn parse_value(field: &str) -> Result<f64> {
    field
        .trim_start_matches('s')
        .parse::<f64>()
        .map_err(|_| Error::InvalidNumber(field.to_string()))
}

fn parse_id(id: &str) -> Result<(usize, usize)> {
    let malformed = || Error::MalformedId(id.to_string());
    let (group, index) = id.split_once('_').ok_or_else(&malformed)?;
    if group.len() != 3 {
        return Err(malformed());
    }
    let n: usize = group.parse().map_err(|_| malformed())?;
    let i: usize = index.parse().map_err(|_| malformed())?;
    if n == 0 {
        return Err(malformed());
    }
    Ok((n, i))
}

/// Loads a submission into a map from group size to layout.
pub fn load_submission(path: &Path) -> Result<BTreeMap<usize, Layout>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut rows: BTreeMap<usize, Vec<(usize, Pose)>> = BTreeMap::new();
    for record in reader.deserialize::<InputRow>() {
        let row = record?;
        let (n, i) = parse_id(&row.id)?;
        let pose = Pose::new(
            parse_value(&row.x)?,
            parse_value(&row.y)?,
            parse_value(&row.deg)?,
        );
        rows.entry(n).or_default().push((i, pose));
    }

    let mut groups = BTreeMap::new();
    for (n, poses) in rows {
        let mut layout = Layout::with_len(n);
        for (i, pose) in poses {
            if i < n {
                layout.set_pose(i, pose);
            }
        }
        groups.insert(n, layout);
    }

    if groups.is_empty() {
        return Err(Error::EmptySubmission(path.display().to_string()));
    }
    Ok(groups)
}

/// Writes a submission, ascending group size then tree index.
pub fn save_submission(path: &Path, groups: &BTreeMap<usize, Layout>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_path(path)?;
    for (&n, layout) in groups.range(1..=MAX_GROUP) {
        for i in 0..layout.len() {
            let pose = layout.pose(i);
            writer.serialize(OutputRow {
                id: format!("{:03}_{}", n, i),
                x: format!("s{:.15}", pose.x),
                y: format!("s{:.15}", pose.y),
                deg: format!("s{:.15}", pose.deg),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
