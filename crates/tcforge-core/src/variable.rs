//! Variable descriptors and the values bound to them.
//!
//! A segment declares *which* variables it lays out and in what shape; the
//! values come from the test case at print time through a [`Values`] map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single printable token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
}

impl Scalar {
    /// Returns the integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Scalar::Char(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Char(c) => write!(f, "{c}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<char> for Scalar {
    fn from(c: char) -> Self {
        Scalar::Char(c)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

/// The value bound to one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Vector(Vec<Scalar>),
    Matrix(Vec<Vec<Scalar>>),
}

impl Value {
    pub fn vector<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Value::Vector(items.into_iter().map(Into::into).collect())
    }

    pub fn matrix<R, I, T>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Value::Matrix(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Build a char matrix from one string per row.
    pub fn char_grid<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Value::Matrix(
            rows.into_iter()
                .map(|row| row.as_ref().chars().map(Scalar::Char).collect())
                .collect(),
        )
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Scalar(c.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s.into())
    }
}

/// Values bound to variable names for one test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, Value>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn require(&self, name: &str) -> Result<&Value, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingValue(name.to_string()))
    }

    pub fn scalar(&self, name: &str) -> Result<&Scalar, ConfigError> {
        match self.require(name)? {
            Value::Scalar(s) => Ok(s),
            _ => Err(shape_error(name, "scalar")),
        }
    }

    pub fn vector(&self, name: &str) -> Result<&[Scalar], ConfigError> {
        match self.require(name)? {
            Value::Vector(v) => Ok(v),
            _ => Err(shape_error(name, "vector")),
        }
    }

    pub fn matrix(&self, name: &str) -> Result<&[Vec<Scalar>], ConfigError> {
        match self.require(name)? {
            Value::Matrix(m) => Ok(m),
            // An empty array cannot be told apart from an empty matrix.
            Value::Vector(v) if v.is_empty() => Ok(&[]),
            _ => Err(shape_error(name, "matrix")),
        }
    }
}

impl FromIterator<(String, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Values(iter.into_iter().collect())
    }
}

fn shape_error(name: &str, expected: &'static str) -> ConfigError {
    ConfigError::ValueShape {
        name: name.to_string(),
        expected,
    }
}

/// A size: either a literal count or the name of an integer scalar variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeExpr {
    Fixed(usize),
    Variable(String),
}

impl SizeExpr {
    pub fn fixed(n: usize) -> Self {
        SizeExpr::Fixed(n)
    }

    pub fn var(name: impl Into<String>) -> Self {
        SizeExpr::Variable(name.into())
    }

    /// Resolve against the values of the test case being printed.
    pub fn resolve(&self, values: &Values) -> Result<usize, ConfigError> {
        match self {
            SizeExpr::Fixed(n) => Ok(*n),
            SizeExpr::Variable(name) => {
                let scalar = values.scalar(name)?;
                scalar
                    .as_int()
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| ConfigError::InvalidSize(name.clone()))
            }
        }
    }
}

impl fmt::Display for SizeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeExpr::Fixed(n) => write!(f, "{n}"),
            SizeExpr::Variable(name) => f.write_str(name),
        }
    }
}

impl FromStr for SizeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty size expression".to_string());
        }
        if let Ok(n) = s.parse::<usize>() {
            return Ok(SizeExpr::Fixed(n));
        }
        if s.chars().all(|c| c.is_alphanumeric() || c == '_') {
            Ok(SizeExpr::Variable(s.to_string()))
        } else {
            Err(format!("invalid size expression: {s}"))
        }
    }
}

impl From<usize> for SizeExpr {
    fn from(n: usize) -> Self {
        SizeExpr::Fixed(n)
    }
}

impl From<&str> for SizeExpr {
    fn from(name: &str) -> Self {
        SizeExpr::Variable(name.to_string())
    }
}

/// The declared shape of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableShape {
    Scalar,
    Vector { size: Option<SizeExpr> },
    Matrix,
}

/// A named variable descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    shape: VariableShape,
}

impl Variable {
    pub fn new(name: impl Into<String>, shape: VariableShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, VariableShape::Scalar)
    }

    /// A vector whose length is not checked (only valid as the last item of a line).
    pub fn vector(name: impl Into<String>) -> Self {
        Self::new(name, VariableShape::Vector { size: None })
    }

    pub fn sized_vector(name: impl Into<String>, size: impl Into<SizeExpr>) -> Self {
        Self::new(
            name,
            VariableShape::Vector {
                size: Some(size.into()),
            },
        )
    }

    pub fn matrix(name: impl Into<String>) -> Self {
        Self::new(name, VariableShape::Matrix)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &VariableShape {
        &self.shape
    }
}
