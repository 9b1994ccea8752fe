use std::cmp::Ordering;

/// A cell value as seen by a comparison.
///
/// Cells are always stored as text. When two cells are compared, each side is
/// classified on the fly: if both parse as finite numbers they are compared
/// numerically, otherwise they are compared byte-wise as strings. The
/// classification is never written back to storage, so the order of an index
/// stays textual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// A cell whose text parses as a finite 64-bit float.
    Number(f64),
    /// Any other cell.
    Text(&'a str),
}

impl<'a> Value<'a> {
    /// Classifies a raw cell.
    ///
    /// `NaN` and infinities are treated as text so that every number has a
    /// total order.
    pub fn parse(raw: &'a str) -> Self {
        match raw.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Number(number),
            _ => Self::Text(raw),
        }
    }

    /// Returns `true` if the value is a [Value::Number].
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Returns the inner number if this is a [Value::Number].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Compares two raw cells, numerically when both parse as numbers and
/// lexicographically otherwise.
pub fn compare(left: &str, right: &str) -> Ordering {
    match (Value::parse(left), Value::parse(right)) {
        // finite on both sides, and -0 compares equal to 0
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}
