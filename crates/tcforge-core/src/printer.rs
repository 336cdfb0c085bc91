//! Segment printers and the format-level dispatcher.
//!
//! Every [`IOSegmentKind`] has one [`SegmentPrinter`]. [`IOVariablesPrinter`]
//! walks a format in declaration order and hands each segment to the printer
//! registered for its kind.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::error::ConfigError;
use crate::format::{Direction, IOFormat, IOSegment, IOSegmentKind, SegmentLayout};
use crate::variable::{Scalar, Values, VariableShape};

/// Serializes one segment's variables in that segment's layout.
pub trait SegmentPrinter: Send + Sync {
    fn print(
        &self,
        segment: &IOSegment,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError>;
}

/// Prints scalars and vectors space-separated on one line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinePrinter;

impl SegmentPrinter for LinePrinter {
    fn print(
        &self,
        segment: &IOSegment,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError> {
        let mut tokens: Vec<&Scalar> = Vec::new();
        for var in segment.variables() {
            match var.shape() {
                VariableShape::Scalar => tokens.push(values.scalar(var.name())?),
                VariableShape::Vector { size } => {
                    let items = values.vector(var.name())?;
                    if let Some(size) = size {
                        check_len(var.name(), size.resolve(values)?, items.len())?;
                    }
                    tokens.extend(items);
                }
                VariableShape::Matrix => {
                    return Err(ConfigError::ValueShape {
                        name: var.name().to_string(),
                        expected: "scalar or vector",
                    })
                }
            }
        }
        write_tokens(out, tokens)?;
        Ok(())
    }
}

/// Prints parallel vectors one element per line, with an optional jagged tail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinesPrinter;

impl SegmentPrinter for LinesPrinter {
    fn print(
        &self,
        segment: &IOSegment,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError> {
        let SegmentLayout::Lines { size } = segment.layout() else {
            return Err(wrong_printer(segment));
        };
        let size = size.resolve(values)?;

        let mut columns: Vec<&[Scalar]> = Vec::new();
        let mut jagged: Option<&[Vec<Scalar>]> = None;
        for var in segment.variables() {
            match var.shape() {
                VariableShape::Vector { .. } => {
                    let items = values.vector(var.name())?;
                    check_len(var.name(), size, items.len())?;
                    columns.push(items);
                }
                VariableShape::Matrix => {
                    let rows = values.matrix(var.name())?;
                    check_len(var.name(), size, rows.len())?;
                    jagged = Some(rows);
                }
                VariableShape::Scalar => {
                    return Err(ConfigError::ValueShape {
                        name: var.name().to_string(),
                        expected: "vector",
                    })
                }
            }
        }

        for i in 0..size {
            let row = columns
                .iter()
                .map(|column| &column[i])
                .chain(jagged.into_iter().flat_map(|rows| rows[i].iter()));
            write_tokens(out, row)?;
        }
        Ok(())
    }
}

/// Prints a single string verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLinePrinter;

impl SegmentPrinter for RawLinePrinter {
    fn print(
        &self,
        segment: &IOSegment,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError> {
        let var = segment
            .variables()
            .first()
            .ok_or_else(|| wrong_printer(segment))?;
        let line = values
            .scalar(var.name())?
            .as_str()
            .ok_or_else(|| string_error(var.name()))?;
        writeln!(out, "{line}")?;
        Ok(())
    }
}

/// Prints a vector of strings verbatim, one per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLinesPrinter;

impl SegmentPrinter for RawLinesPrinter {
    fn print(
        &self,
        segment: &IOSegment,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError> {
        let SegmentLayout::RawLines { size } = segment.layout() else {
            return Err(wrong_printer(segment));
        };
        let var = segment
            .variables()
            .first()
            .ok_or_else(|| wrong_printer(segment))?;
        let lines = values.vector(var.name())?;
        if let Some(size) = size {
            check_len(var.name(), size.resolve(values)?, lines.len())?;
        }
        for line in lines {
            let line = line.as_str().ok_or_else(|| string_error(var.name()))?;
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

/// Prints a matrix row by row.
///
/// Rows made only of chars are printed without separators.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridPrinter;

impl SegmentPrinter for GridPrinter {
    fn print(
        &self,
        segment: &IOSegment,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError> {
        let SegmentLayout::Grid { rows, columns } = segment.layout() else {
            return Err(wrong_printer(segment));
        };
        let var = segment
            .variables()
            .first()
            .ok_or_else(|| wrong_printer(segment))?;
        let rows = rows.resolve(values)?;
        let columns = columns.resolve(values)?;

        let matrix = values.matrix(var.name())?;
        check_len(var.name(), rows, matrix.len())?;
        for (i, row) in matrix.iter().enumerate() {
            check_len(&format!("{}[{i}]", var.name()), columns, row.len())?;
        }

        for row in matrix {
            if !row.is_empty() && row.iter().all(Scalar::is_char) {
                for c in row {
                    write!(out, "{c}")?;
                }
                out.write_all(b"\n")?;
            } else {
                write_tokens(out, row)?;
            }
        }
        Ok(())
    }
}

fn write_tokens<'a>(
    out: &mut dyn Write,
    tokens: impl IntoIterator<Item = &'a Scalar>,
) -> io::Result<()> {
    for (i, token) in tokens.into_iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        write!(out, "{token}")?;
    }
    out.write_all(b"\n")
}

fn check_len(name: &str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::SizeMismatch {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

fn string_error(name: &str) -> ConfigError {
    ConfigError::ValueShape {
        name: name.to_string(),
        expected: "string",
    }
}

fn wrong_printer(segment: &IOSegment) -> ConfigError {
    ConfigError::InvalidSegment {
        kind: segment.kind(),
        reason: "segment handed to a printer of another kind".into(),
    }
}

/// The default kind → printer table.
pub fn default_printers() -> HashMap<IOSegmentKind, Box<dyn SegmentPrinter>> {
    let mut printers: HashMap<IOSegmentKind, Box<dyn SegmentPrinter>> = HashMap::new();
    printers.insert(IOSegmentKind::Line, Box::new(LinePrinter));
    printers.insert(IOSegmentKind::Lines, Box::new(LinesPrinter));
    printers.insert(IOSegmentKind::RawLine, Box::new(RawLinePrinter));
    printers.insert(IOSegmentKind::RawLines, Box::new(RawLinesPrinter));
    printers.insert(IOSegmentKind::Grid, Box::new(GridPrinter));
    printers
}

/// Prints a problem's input and output formats.
pub struct IOVariablesPrinter {
    printers: HashMap<IOSegmentKind, Box<dyn SegmentPrinter>>,
    input_format: IOFormat,
    output_format: Option<IOFormat>,
}

impl std::fmt::Debug for IOVariablesPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IOVariablesPrinter")
            .field("printers", &self.printers.keys().collect::<Vec<_>>())
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .finish()
    }
}

impl IOVariablesPrinter {
    /// Create a printer with the default printer for every segment kind.
    pub fn new(
        input_format: IOFormat,
        output_format: Option<IOFormat>,
    ) -> Result<Self, ConfigError> {
        Self::with_printers(input_format, output_format, default_printers())
    }

    /// Create a printer with an explicit kind → printer table.
    pub fn with_printers(
        input_format: IOFormat,
        output_format: Option<IOFormat>,
        printers: HashMap<IOSegmentKind, Box<dyn SegmentPrinter>>,
    ) -> Result<Self, ConfigError> {
        expect_direction(&input_format, Direction::Input)?;
        if let Some(output_format) = &output_format {
            expect_direction(output_format, Direction::Output)?;
        }
        Ok(Self {
            printers,
            input_format,
            output_format,
        })
    }

    pub fn input_format(&self) -> &IOFormat {
        &self.input_format
    }

    pub fn output_format(&self) -> Option<&IOFormat> {
        self.output_format.as_ref()
    }

    pub fn print_input(&self, values: &Values, out: &mut dyn Write) -> Result<(), ConfigError> {
        self.print(&self.input_format, values, out)
    }

    pub fn print_output(&self, values: &Values, out: &mut dyn Write) -> Result<(), ConfigError> {
        let format = self
            .output_format
            .as_ref()
            .ok_or(ConfigError::NoOutputFormat)?;
        self.print(format, values, out)
    }

    /// Print the input format into a string.
    pub fn render_input(&self, values: &Values) -> Result<String, ConfigError> {
        let mut buf = Vec::new();
        self.print_input(values, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Print the output format into a string.
    pub fn render_output(&self, values: &Values) -> Result<String, ConfigError> {
        let mut buf = Vec::new();
        self.print_output(values, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn print(
        &self,
        format: &IOFormat,
        values: &Values,
        out: &mut dyn Write,
    ) -> Result<(), ConfigError> {
        for segment in format.segments() {
            let kind = segment.kind();
            let printer = self
                .printers
                .get(&kind)
                .ok_or(ConfigError::NoPrinter(kind))?;
            tracing::trace!(%kind, direction = %format.direction(), "printing segment");
            printer.print(segment, values, out)?;
        }
        Ok(())
    }
}

pub(crate) fn expect_direction(
    format: &IOFormat,
    expected: Direction,
) -> Result<(), ConfigError> {
    if format.direction() == expected {
        Ok(())
    } else {
        Err(ConfigError::WrongDirection {
            expected,
            actual: format.direction(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::format::IOFormatBuilder;
    use crate::variable::{SizeExpr, Value, Variable};

    fn input_format(segments: Vec<IOSegment>) -> IOFormat {
        segments
            .into_iter()
            .fold(
                IOFormatBuilder::new().prepare_for_input_format(),
                IOFormatBuilder::add_io_segment,
            )
            .build()
            .unwrap()
    }

    fn render(segments: Vec<IOSegment>, values: &Values) -> Result<String, ConfigError> {
        IOVariablesPrinter::new(input_format(segments), None)
            .unwrap()
            .render_input(values)
    }

    struct RecordingPrinter {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl SegmentPrinter for RecordingPrinter {
        fn print(
            &self,
            segment: &IOSegment,
            _values: &Values,
            _out: &mut dyn Write,
        ) -> Result<(), ConfigError> {
            self.calls
                .lock()
                .unwrap()
                .push(segment.variables()[0].name().to_string());
            Ok(())
        }
    }

    #[test]
    fn dispatches_each_segment_once_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut printers: HashMap<IOSegmentKind, Box<dyn SegmentPrinter>> = HashMap::new();
        printers.insert(
            IOSegmentKind::Line,
            Box::new(RecordingPrinter {
                calls: Arc::clone(&calls),
            }),
        );
        let format = input_format(vec![
            IOSegment::line(vec![Variable::scalar("A")]).unwrap(),
            IOSegment::line(vec![Variable::scalar("B")]).unwrap(),
        ]);
        let printer = IOVariablesPrinter::with_printers(format, None, printers).unwrap();

        let mut out = Vec::new();
        printer.print_input(&Values::new(), &mut out).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["A", "B"]);
        assert!(out.is_empty());
    }

    #[test]
    fn missing_printer_is_reported() {
        let format = input_format(vec![IOSegment::grid("G", 1usize, 1usize).unwrap()]);
        let printer = IOVariablesPrinter::with_printers(format, None, HashMap::new()).unwrap();
        let err = printer.render_input(&Values::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoPrinter(IOSegmentKind::Grid)));
    }

    #[test]
    fn two_scalar_lines() {
        let out = render(
            vec![
                IOSegment::line(vec![Variable::scalar("A")]).unwrap(),
                IOSegment::line(vec![Variable::scalar("B")]).unwrap(),
            ],
            &Values::new().with("A", 3).with("B", 5),
        )
        .unwrap();
        assert_eq!(out, "3\n5\n");
    }

    #[test]
    fn line_with_scalars_and_vectors() {
        let segment = IOSegment::line(vec![
            Variable::scalar("N"),
            Variable::sized_vector("A", "N"),
            Variable::vector("B"),
        ])
        .unwrap();
        let values = Values::new()
            .with("N", 2)
            .with("A", Value::vector([4, 5]))
            .with("B", Value::vector(["x", "y", "z"]));
        assert_eq!(render(vec![segment], &values).unwrap(), "2 4 5 x y z\n");
    }

    #[test]
    fn line_size_mismatch() {
        let segment =
            IOSegment::line(vec![Variable::scalar("N"), Variable::sized_vector("A", "N")])
                .unwrap();
        let values = Values::new().with("N", 3).with("A", Value::vector([1, 2]));
        let err = render(vec![segment], &values).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SizeMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn empty_line_segment() {
        let out = render(vec![IOSegment::line(vec![]).unwrap()], &Values::new()).unwrap();
        assert_eq!(out, "\n");
    }

    #[test]
    fn lines_with_jagged_tail() {
        let segment = IOSegment::lines(
            "N",
            vec![
                Variable::vector("A"),
                Variable::vector("B"),
                Variable::matrix("J"),
            ],
        )
        .unwrap();
        let values = Values::new()
            .with("N", 2)
            .with("A", Value::vector([1, 2]))
            .with("B", Value::vector([10, 20]))
            .with("J", Value::matrix(vec![vec![7, 8, 9], vec![]]));
        assert_eq!(render(vec![segment], &values).unwrap(), "1 10 7 8 9\n2 20\n");
    }

    #[test]
    fn lines_vector_length_checked() {
        let segment =
            IOSegment::lines(SizeExpr::fixed(3), vec![Variable::vector("A")]).unwrap();
        let values = Values::new().with("A", Value::vector([1, 2]));
        assert!(matches!(
            render(vec![segment], &values),
            Err(ConfigError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn grid_of_ints_and_chars() {
        let values = Values::new()
            .with("R", 2)
            .with("C", 3)
            .with("M", Value::matrix([[1, 2, 3], [4, 5, 6]]))
            .with("G", Value::char_grid(["#.#", "..#"]));
        let out = render(
            vec![
                IOSegment::line(vec![Variable::scalar("R"), Variable::scalar("C")]).unwrap(),
                IOSegment::grid("M", "R", "C").unwrap(),
                IOSegment::grid("G", "R", "C").unwrap(),
            ],
            &values,
        )
        .unwrap();
        assert_eq!(out, "2 3\n1 2 3\n4 5 6\n#.#\n..#\n");
    }

    #[test]
    fn grid_dimensions_checked() {
        let values = Values::new().with("M", Value::matrix([[1, 2], [3, 4]]));
        let err = render(
            vec![IOSegment::grid("M", 2usize, 3usize).unwrap()],
            &values,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SizeMismatch { name, .. } if name == "M[0]"));
    }

    #[test]
    fn raw_segments_are_verbatim() {
        let values = Values::new()
            .with("S", "  hello  world ")
            .with("L", Value::vector(["a b", "", "c"]));
        let out = render(
            vec![
                IOSegment::raw_line("S").unwrap(),
                IOSegment::raw_lines("L", Some(SizeExpr::fixed(3))).unwrap(),
            ],
            &values,
        )
        .unwrap();
        assert_eq!(out, "  hello  world \na b\n\nc\n");
    }

    #[test]
    fn raw_line_requires_string() {
        let values = Values::new().with("S", 5);
        let err = render(vec![IOSegment::raw_line("S").unwrap()], &values).unwrap_err();
        assert!(matches!(err, ConfigError::ValueShape { expected: "string", .. }));
    }

    #[test]
    fn missing_value_is_reported() {
        let err = render(
            vec![IOSegment::line(vec![Variable::scalar("N")]).unwrap()],
            &Values::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue(name) if name == "N"));
    }

    #[test]
    fn output_format_required_for_print_output() {
        let printer = IOVariablesPrinter::new(
            input_format(vec![IOSegment::line(vec![Variable::scalar("N")]).unwrap()]),
            None,
        )
        .unwrap();
        assert!(matches!(
            printer.render_output(&Values::new()),
            Err(ConfigError::NoOutputFormat)
        ));
    }

    #[test]
    fn output_format_direction_checked() {
        let input = input_format(vec![IOSegment::line(vec![Variable::scalar("N")]).unwrap()]);
        let err = IOVariablesPrinter::new(input.clone(), Some(input)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::WrongDirection {
                expected: Direction::Output,
                ..
            }
        ));
    }
}
