use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{Error, GeoPoint, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    ZoneEnter,
    ZoneExit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    /// The zone label, like "work" or "uturn"
    pub value: String,
    pub point_index: usize,
}

/// The columns besides x and y, split by section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtraColumns {
    pub columns: Vec<String>,
    // Per section, per point
    pub values: Vec<Vec<Vec<f64>>>,
}

/// A guidance path for a field robot, expressed in a local frame around a geodetic anchor.
///
/// All points live in one flat list. Sections are contiguous runs of it, so concatenating them
/// always gives back the full list.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    name: Option<String>,
    anchor: GeoPoint,
    columns: Vec<String>,
    x_idx: usize,
    y_idx: usize,
    // Row-major, columns.len() values per point
    values: Vec<f64>,
    // Contiguous and in order. Only the last one may be empty.
    sections: Vec<Range<usize>>,
    annotations: Vec<Annotation>,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self {
            name: None,
            anchor: GeoPoint::default(),
            columns: vec!["x".to_string(), "y".to_string()],
            x_idx: 0,
            y_idx: 1,
            values: Vec::new(),
            sections: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

impl Trajectory {
    pub fn new(columns: Vec<String>, anchor: GeoPoint) -> Result<Self> {
        let mut traj = Self {
            anchor,
            ..Default::default()
        };
        traj.set_columns(columns)?;
        Ok(traj)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = Some(name.into());
    }

    pub fn anchor(&self) -> GeoPoint {
        self.anchor
    }

    /// Only allowed before the first point is added
    pub fn set_anchor(&mut self, anchor: GeoPoint) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::schema("can't move the anchor of a non-empty trajectory"));
        }
        self.anchor = anchor;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Only allowed before the first point is added
    pub fn set_columns(&mut self, columns: Vec<String>) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::schema(
                "can't change the columns of a non-empty trajectory",
            ));
        }
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| Error::schema(format!("column '{name}' is required, got {columns:?}")))
        };
        self.x_idx = find("x")?;
        self.y_idx = find("y")?;
        self.columns = columns;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.values.len() / self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn point(&self, idx: usize) -> &[f64] {
        let n = self.columns.len();
        &self.values[idx * n..(idx + 1) * n]
    }

    pub fn points(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.columns.len())
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn check_point(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.columns.len() {
            return Err(Error::schema(format!(
                "point has {} values, but the columns are {:?}",
                point.len(),
                self.columns
            )));
        }
        Ok(())
    }

    /// Adds a point to the end of the last section.
    pub fn append_point(&mut self, point: &[f64]) -> Result<()> {
        self.check_point(point)?;
        let idx = self.len();
        self.values.extend_from_slice(point);
        match self.sections.last_mut() {
            Some(section) => section.end = idx + 1,
            None => self.sections.push(idx..idx + 1),
        }
        Ok(())
    }

    /// Starts a new section containing these points. An empty list opens a section that the next
    /// `append_point` fills.
    pub fn append_section<P: AsRef<[f64]>>(&mut self, points: &[P]) -> Result<()> {
        for pt in points {
            self.check_point(pt.as_ref())?;
        }
        let start = self.len();
        for pt in points {
            self.values.extend_from_slice(pt.as_ref());
        }
        let range = start..self.len();
        match self.sections.last_mut() {
            // Don't leave an empty section in the middle
            Some(last) if last.is_empty() => *last = range,
            _ => self.sections.push(range),
        }
        Ok(())
    }

    /// Bounds aren't checked here; see `check_annotations`.
    pub fn append_annotation<S: Into<String>>(
        &mut self,
        kind: AnnotationKind,
        value: S,
        point_index: usize,
    ) {
        self.annotations.push(Annotation {
            kind,
            value: value.into(),
            point_index,
        });
    }

    pub(crate) fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    fn section_ranges(&self) -> impl Iterator<Item = &Range<usize>> {
        self.sections.iter().filter(|r| !r.is_empty())
    }

    pub fn num_sections(&self) -> usize {
        self.section_ranges().count()
    }

    /// The points of each section, in order
    pub fn sections(&self) -> impl Iterator<Item = Vec<&[f64]>> {
        self.section_ranges()
            .map(move |r| r.clone().map(|idx| self.point(idx)).collect())
    }

    /// The index of the first point of every section
    pub fn section_indexes(&self) -> Vec<usize> {
        self.section_ranges().map(|r| r.start).collect()
    }

    /// The (x, y) of every point, ignoring other columns
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.points()
            .map(|pt| (pt[self.x_idx], pt[self.y_idx]))
            .collect()
    }

    pub fn extra_columns(&self) -> ExtraColumns {
        let indices: Vec<usize> = (0..self.columns.len())
            .filter(|i| *i != self.x_idx && *i != self.y_idx)
            .collect();
        let columns = indices.iter().map(|i| self.columns[*i].clone()).collect();
        let values = self
            .sections()
            .map(|section| {
                section
                    .into_iter()
                    .map(|pt| indices.iter().map(|i| pt[*i]).collect())
                    .collect()
            })
            .collect();
        ExtraColumns { columns, values }
    }

    /// Planar length along each section. The jump between sections doesn't count.
    pub fn length(&self) -> f64 {
        let pts = self.positions();
        self.section_ranges()
            .map(|r| {
                pts[r.clone()]
                    .windows(2)
                    .map(|pair| (pair[1].0 - pair[0].0).hypot(pair[1].1 - pair[0].1))
                    .sum::<f64>()
            })
            .sum()
    }

    /// Groups the zone annotations by label into (enter, exit) point index pairs. Each enter is
    /// matched with the next exit of its label. An exit with nothing open, like the one a path
    /// starting in a turn begins with, is skipped, and a zone still open at the end is left out.
    pub fn zones(&self) -> BTreeMap<String, Vec<(usize, usize)>> {
        let mut open: BTreeMap<&str, usize> = BTreeMap::new();
        let mut zones: BTreeMap<String, Vec<(usize, usize)>> = BTreeMap::new();
        for a in &self.annotations {
            match a.kind {
                AnnotationKind::ZoneEnter => {
                    open.entry(a.value.as_str()).or_insert(a.point_index);
                }
                AnnotationKind::ZoneExit => {
                    if let Some(enter) = open.remove(a.value.as_str()) {
                        zones
                            .entry(a.value.clone())
                            .or_insert_with(Vec::new)
                            .push((enter, a.point_index));
                    }
                }
            }
        }
        zones
    }

    /// Every annotation must point inside the trajectory, and per label, enters and exits must
    /// alternate in increasing order and balance out.
    pub fn check_annotations(&self) -> Result<()> {
        let len = self.len();
        let mut open: BTreeMap<&str, (AnnotationKind, usize)> = BTreeMap::new();
        for a in &self.annotations {
            if a.point_index >= len {
                return Err(Error::schema(format!(
                    "annotation {:?} '{}' points to {}, but there are only {} points",
                    a.kind, a.value, a.point_index, len
                )));
            }
            let expected = match open.get(a.value.as_str()) {
                Some((AnnotationKind::ZoneEnter, _)) => AnnotationKind::ZoneExit,
                _ => AnnotationKind::ZoneEnter,
            };
            if a.kind != expected {
                return Err(Error::schema(format!(
                    "zone '{}' has {:?} at {} where {:?} was expected",
                    a.value, a.kind, a.point_index, expected
                )));
            }
            if let Some((_, prev)) = open.get(a.value.as_str()) {
                let in_order = match a.kind {
                    AnnotationKind::ZoneExit => a.point_index >= *prev,
                    AnnotationKind::ZoneEnter => a.point_index > *prev,
                };
                if !in_order {
                    return Err(Error::schema(format!(
                        "zone '{}' goes backwards at {}",
                        a.value, a.point_index
                    )));
                }
            }
            open.insert(&a.value, (a.kind, a.point_index));
        }
        for (zone, (kind, idx)) in open {
            if kind == AnnotationKind::ZoneEnter {
                return Err(Error::schema(format!(
                    "zone '{zone}' entered at {idx} is never exited"
                )));
            }
        }
        Ok(())
    }

    /// True if the annotations all point to existing points
    pub(crate) fn annotations_in_bounds(&self) -> bool {
        let len = self.len();
        self.annotations.iter().all(|a| a.point_index < len)
    }
}
