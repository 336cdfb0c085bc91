//! Structured I/O formats.
//!
//! An [`IOFormat`] is an ordered list of [`IOSegment`]s. Each segment has a
//! static kind that decides how its variables are laid out in the file; the
//! kind alone picks the printer, never the values being printed.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::variable::{SizeExpr, Variable, VariableShape};

/// Whether a format describes a test input or a test output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// The layout rule of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IOSegmentKind {
    /// Scalars and vectors on a single line.
    Line,
    /// Parallel vectors, one element of each per line.
    Lines,
    /// One string, verbatim.
    RawLine,
    /// A vector of strings, one per line, verbatim.
    RawLines,
    /// A matrix, one row per line.
    Grid,
}

impl fmt::Display for IOSegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IOSegmentKind::Line => write!(f, "line"),
            IOSegmentKind::Lines => write!(f, "lines"),
            IOSegmentKind::RawLine => write!(f, "raw_line"),
            IOSegmentKind::RawLines => write!(f, "raw_lines"),
            IOSegmentKind::Grid => write!(f, "grid"),
        }
    }
}

/// Kind-specific layout attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentLayout {
    Line,
    Lines { size: SizeExpr },
    RawLine,
    RawLines { size: Option<SizeExpr> },
    Grid { rows: SizeExpr, columns: SizeExpr },
}

/// One structurally distinct block of a test file.
///
/// Constructed through the kind-specific constructors, which reject variable
/// shapes the kind cannot lay out. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOSegment {
    layout: SegmentLayout,
    variables: Vec<Variable>,
}

impl IOSegment {
    /// A single line of scalars and vectors, printed left to right.
    ///
    /// Only the last vector may leave its size unspecified. An empty variable
    /// list prints an empty line.
    pub fn line(variables: Vec<Variable>) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSegment {
            kind: IOSegmentKind::Line,
            reason,
        };
        let last = variables.len().saturating_sub(1);
        for (i, var) in variables.iter().enumerate() {
            match var.shape() {
                VariableShape::Scalar => {}
                VariableShape::Vector { size: None } if i != last => {
                    return Err(invalid(format!(
                        "vector '{}' without a size must be the last variable",
                        var.name()
                    )));
                }
                VariableShape::Vector { .. } => {}
                VariableShape::Matrix => {
                    return Err(invalid(format!(
                        "matrix '{}' cannot be printed on a single line",
                        var.name()
                    )));
                }
            }
        }
        Self::new(SegmentLayout::Line, variables)
    }

    /// `size` lines, line `i` holding element `i` of every vector.
    ///
    /// A matrix may appear as the last variable; its row `i` is appended to
    /// line `i` (rows may differ in length).
    pub fn lines(
        size: impl Into<SizeExpr>,
        variables: Vec<Variable>,
    ) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSegment {
            kind: IOSegmentKind::Lines,
            reason,
        };
        if variables.is_empty() {
            return Err(invalid("at least one variable is required".into()));
        }
        let last = variables.len() - 1;
        for (i, var) in variables.iter().enumerate() {
            match var.shape() {
                VariableShape::Vector { size: None } => {}
                VariableShape::Vector { size: Some(_) } => {
                    return Err(invalid(format!(
                        "vector '{}' takes its length from the segment size",
                        var.name()
                    )));
                }
                VariableShape::Matrix if i == last => {}
                VariableShape::Matrix => {
                    return Err(invalid(format!(
                        "jagged matrix '{}' must be the last variable",
                        var.name()
                    )));
                }
                VariableShape::Scalar => {
                    return Err(invalid(format!(
                        "scalar '{}' cannot be spread over lines",
                        var.name()
                    )));
                }
            }
        }
        Self::new(SegmentLayout::Lines { size: size.into() }, variables)
    }

    /// One string variable printed verbatim on its own line.
    pub fn raw_line(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(SegmentLayout::RawLine, vec![Variable::scalar(name)])
    }

    /// A vector of strings printed verbatim, one per line.
    pub fn raw_lines(name: impl Into<String>, size: Option<SizeExpr>) -> Result<Self, ConfigError> {
        let variable = Variable::new(name, VariableShape::Vector { size: size.clone() });
        Self::new(SegmentLayout::RawLines { size }, vec![variable])
    }

    /// A `rows` x `columns` matrix printed row by row.
    pub fn grid(
        name: impl Into<String>,
        rows: impl Into<SizeExpr>,
        columns: impl Into<SizeExpr>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            SegmentLayout::Grid {
                rows: rows.into(),
                columns: columns.into(),
            },
            vec![Variable::matrix(name)],
        )
    }

    fn new(layout: SegmentLayout, variables: Vec<Variable>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for var in &variables {
            if var.name().is_empty() {
                return Err(ConfigError::InvalidSegment {
                    kind: layout_kind(&layout),
                    reason: "variable names must not be empty".into(),
                });
            }
            if !seen.insert(var.name()) {
                return Err(ConfigError::DuplicateVariable(var.name().to_string()));
            }
        }
        Ok(Self { layout, variables })
    }

    pub fn kind(&self) -> IOSegmentKind {
        layout_kind(&self.layout)
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

fn layout_kind(layout: &SegmentLayout) -> IOSegmentKind {
    match layout {
        SegmentLayout::Line => IOSegmentKind::Line,
        SegmentLayout::Lines { .. } => IOSegmentKind::Lines,
        SegmentLayout::RawLine => IOSegmentKind::RawLine,
        SegmentLayout::RawLines { .. } => IOSegmentKind::RawLines,
        SegmentLayout::Grid { .. } => IOSegmentKind::Grid,
    }
}

/// An ordered, non-empty sequence of segments describing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOFormat {
    direction: Direction,
    segments: Vec<IOSegment>,
}

impl IOFormat {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn segments(&self) -> &[IOSegment] {
        &self.segments
    }

    /// All variables of all segments, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.segments.iter().flat_map(|s| s.variables().iter())
    }
}

/// Accumulates segments for an [`IOFormat`].
#[derive(Debug, Default)]
pub struct IOFormatBuilder {
    direction: Option<Direction>,
    direction_conflict: bool,
    segments: Vec<IOSegment>,
}

impl IOFormatBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare_for_input_format(self) -> Self {
        self.select(Direction::Input)
    }

    pub fn prepare_for_output_format(self) -> Self {
        self.select(Direction::Output)
    }

    fn select(mut self, direction: Direction) -> Self {
        if self.direction.is_some() {
            self.direction_conflict = true;
        }
        self.direction = Some(direction);
        self
    }

    pub fn add_io_segment(mut self, segment: IOSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Validate and freeze the format.
    pub fn build(self) -> Result<IOFormat, ConfigError> {
        if self.direction_conflict {
            return Err(ConfigError::DirectionAlreadySet);
        }
        let direction = self.direction.ok_or(ConfigError::MissingDirection)?;
        if self.segments.is_empty() {
            return Err(ConfigError::EmptyFormat(direction));
        }

        let mut seen = HashSet::new();
        for var in self.segments.iter().flat_map(|s| s.variables()) {
            if !seen.insert(var.name()) {
                return Err(ConfigError::DuplicateVariable(var.name().to_string()));
            }
        }

        Ok(IOFormat {
            direction,
            segments: self.segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_line(name: &str) -> IOSegment {
        IOSegment::line(vec![Variable::scalar(name)]).unwrap()
    }

    #[test]
    fn build_keeps_declaration_order() {
        let format = IOFormatBuilder::new()
            .prepare_for_input_format()
            .add_io_segment(scalar_line("A"))
            .add_io_segment(IOSegment::grid("G", 2usize, 3usize).unwrap())
            .add_io_segment(scalar_line("B"))
            .build()
            .unwrap();

        assert_eq!(format.direction(), Direction::Input);
        let kinds: Vec<_> = format.segments().iter().map(IOSegment::kind).collect();
        assert_eq!(
            kinds,
            vec![IOSegmentKind::Line, IOSegmentKind::Grid, IOSegmentKind::Line]
        );
        let names: Vec<_> = format.variables().map(Variable::name).collect();
        assert_eq!(names, vec!["A", "G", "B"]);
    }

    #[test]
    fn build_without_direction_fails() {
        let err = IOFormatBuilder::new()
            .add_io_segment(scalar_line("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDirection));
    }

    #[test]
    fn build_with_two_directions_fails() {
        let err = IOFormatBuilder::new()
            .prepare_for_input_format()
            .prepare_for_output_format()
            .add_io_segment(scalar_line("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DirectionAlreadySet));
    }

    #[test]
    fn build_empty_format_fails() {
        let err = IOFormatBuilder::new()
            .prepare_for_output_format()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFormat(Direction::Output)));
    }

    #[test]
    fn build_rejects_duplicate_variables_across_segments() {
        let err = IOFormatBuilder::new()
            .prepare_for_input_format()
            .add_io_segment(scalar_line("N"))
            .add_io_segment(scalar_line("N"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariable(name) if name == "N"));
    }

    #[test]
    fn line_rejects_matrix_and_unsized_vector_before_end() {
        assert!(IOSegment::line(vec![Variable::matrix("M")]).is_err());
        assert!(IOSegment::line(vec![Variable::vector("A"), Variable::scalar("B")]).is_err());
        assert!(IOSegment::line(vec![Variable::scalar("B"), Variable::vector("A")]).is_ok());
        assert!(IOSegment::line(vec![]).is_ok());
    }

    #[test]
    fn lines_shape_rules() {
        assert!(IOSegment::lines("N", vec![]).is_err());
        assert!(IOSegment::lines("N", vec![Variable::scalar("X")]).is_err());
        assert!(
            IOSegment::lines("N", vec![Variable::matrix("J"), Variable::vector("A")]).is_err()
        );
        let seg =
            IOSegment::lines("N", vec![Variable::vector("A"), Variable::matrix("J")]).unwrap();
        assert_eq!(seg.kind(), IOSegmentKind::Lines);
        assert_eq!(
            seg.layout(),
            &SegmentLayout::Lines {
                size: SizeExpr::var("N")
            }
        );
    }

    #[test]
    fn lines_rejects_vector_with_own_size() {
        let err = IOSegment::lines("N", vec![Variable::sized_vector("A", "M")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSegment {
                kind: IOSegmentKind::Lines,
                ..
            }
        ));
    }

    #[test]
    fn segment_rejects_duplicate_names() {
        let err = IOSegment::line(vec![Variable::scalar("A"), Variable::scalar("A")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariable(_)));
    }
}
