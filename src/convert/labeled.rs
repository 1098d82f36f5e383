//! Labeled n-dimensional arrays: an `ndarray` buffer plus one label vector
//! per axis.

use crate::error::{IcsvError, Result};
use chrono::NaiveDateTime;
use ndarray::{Array, Dimension, IxDyn};
use std::cmp::Ordering;
use std::fmt;

/// Coordinate value along one axis
#[derive(Debug, Clone)]
pub enum Label {
    Int(i64),
    Float(f64),
    Text(String),
    Datetime(NaiveDateTime),
    Missing,
}

impl Label {
    fn rank(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Datetime(_) => 2,
            Self::Text(_) => 3,
            Self::Missing => 4,
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Datetime(a), Self::Datetime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Datetime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S")),
            Self::Missing => write!(f, "NA"),
        }
    }
}

/// One named axis and its coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledAxis {
    pub name: String,
    pub labels: Vec<Label>,
}

impl LabeledAxis {
    pub fn new(name: impl Into<String>, labels: Vec<Label>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &Label) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// Element type of an array, ordered from narrowest to widest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementKind {
    Int,
    Float,
    Text,
}

/// Array buffer; `Float` marks missing values as NaN, `Text` as `None`
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData<D: Dimension> {
    Int(Array<i64, D>),
    Float(Array<f64, D>),
    Text(Array<Option<String>, D>),
}

impl<D: Dimension> ArrayData<D> {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int(_) => ElementKind::Int,
            Self::Float(_) => ElementKind::Float,
            Self::Text(_) => ElementKind::Text,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Int(a) => a.shape(),
            Self::Float(a) => a.shape(),
            Self::Text(a) => a.shape(),
        }
    }

    pub fn as_int(&self) -> Option<&Array<i64, D>> {
        match self {
            Self::Int(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&Array<f64, D>> {
        match self {
            Self::Float(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Array<Option<String>, D>> {
        match self {
            Self::Text(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_dyn(self) -> ArrayData<IxDyn> {
        match self {
            Self::Int(a) => ArrayData::Int(a.into_dyn()),
            Self::Float(a) => ArrayData::Float(a.into_dyn()),
            Self::Text(a) => ArrayData::Text(a.into_dyn()),
        }
    }
}

/// An array whose axes carry names and coordinate labels
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray<D: Dimension> {
    data: ArrayData<D>,
    axes: Vec<LabeledAxis>,
}

impl<D: Dimension> LabeledArray<D> {
    /// Combine a buffer with one axis per dimension; every axis must have as
    /// many labels as the buffer has entries along it
    pub fn new(data: ArrayData<D>, axes: Vec<LabeledAxis>) -> Result<Self> {
        let shape = data.shape();
        if shape.len() != axes.len() {
            return Err(IcsvError::format(format!(
                "array has {} dimensions but {} axes were given",
                shape.len(),
                axes.len()
            )));
        }
        for (axis, &len) in axes.iter().zip(shape) {
            if axis.len() != len {
                return Err(IcsvError::format(format!(
                    "axis '{}' has {} labels for {} entries",
                    axis.name,
                    axis.len(),
                    len
                )));
            }
        }
        Ok(Self { data, axes })
    }

    pub fn data(&self) -> &ArrayData<D> {
        &self.data
    }

    pub fn axes(&self) -> &[LabeledAxis] {
        &self.axes
    }

    pub fn axis(&self, name: &str) -> Option<&LabeledAxis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    pub fn dims(&self) -> Vec<&str> {
        self.axes.iter().map(|axis| axis.name.as_str()).collect()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn into_dyn(self) -> LabeledArray<IxDyn> {
        LabeledArray {
            data: self.data.into_dyn(),
            axes: self.axes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_new_checks_axis_lengths() {
        let data = ArrayData::Float(Array2::<f64>::zeros((2, 3)));
        let rows = LabeledAxis::new("row", vec![Label::Int(1), Label::Int(2)]);
        let cols = LabeledAxis::new(
            "field",
            vec![Label::Text("a".into()), Label::Text("b".into())],
        );

        let err = LabeledArray::new(data, vec![rows, cols]).unwrap_err();
        assert!(err.to_string().contains("axis 'field'"));
    }

    #[test]
    fn test_new_checks_dimension_count() {
        let data = ArrayData::Int(Array2::<i64>::zeros((1, 1)));
        let rows = LabeledAxis::new("row", vec![Label::Int(1)]);
        assert!(LabeledArray::new(data, vec![rows]).unwrap_err().is_format());
    }

    #[test]
    fn test_accessors_and_into_dyn() {
        let data = ArrayData::Float(Array2::<f64>::zeros((1, 2)));
        let axes = vec![
            LabeledAxis::new("row", vec![Label::Int(1)]),
            LabeledAxis::new("field", vec![Label::Text("a".into()), Label::Text("b".into())]),
        ];
        let array = LabeledArray::new(data, axes).unwrap();

        assert_eq!(array.dims(), vec!["row", "field"]);
        assert_eq!(array.shape(), &[1, 2]);
        assert_eq!(array.axis("field").unwrap().position(&Label::Text("b".into())), Some(1));

        let dynamic = array.into_dyn();
        assert_eq!(dynamic.data().kind(), ElementKind::Float);
        assert_eq!(dynamic.shape(), &[1, 2]);
    }

    #[test]
    fn test_label_ordering() {
        let mut labels = vec![
            Label::Missing,
            Label::Float(2.5),
            Label::Int(3),
            Label::Int(-1),
            Label::Float(-0.5),
        ];
        labels.sort();
        assert_eq!(
            labels,
            vec![
                Label::Int(-1),
                Label::Int(3),
                Label::Float(-0.5),
                Label::Float(2.5),
                Label::Missing
            ]
        );
    }
}
