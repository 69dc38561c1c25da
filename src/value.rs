use serde::Serialize;

/// A single tabular cell value.
///
/// JSON numbers that fit an `i64` become `Int`; every other finite number
/// becomes `Float`. Nested arrays and objects are not representable as
/// cells and are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn dtype(&self) -> DataType {
        match self {
            Scalar::Null => DataType::Null,
            Scalar::Bool(_) => DataType::Bool,
            Scalar::Int(_) => DataType::Int,
            Scalar::Float(_) => DataType::Float,
            Scalar::String(_) => DataType::String,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// The JSON lexical form of this value, used when a value is cast into
    /// a column that widened to `String`.
    pub fn lexical_form(&self) -> String {
        match self {
            Scalar::Null => String::from("null"),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => n.to_string(),
                None => f.to_string(),
            },
            Scalar::String(s) => s.clone(),
        }
    }
}

/// Column type. `Null` is the type of a column whose every observed value
/// was the JSON null literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Bool,
    Int,
    Float,
    String,
}

impl DataType {
    /// Least upper bound of two column types.
    ///
    /// `Null` is the identity (nullability is tracked separately); equal
    /// types stay; any two distinct non-null types widen to `String`.
    /// Associative and commutative, so inference does not depend on record
    /// order or batch boundaries.
    pub fn widen(self, other: DataType) -> DataType {
        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => t,
            (a, b) if a == b => a,
            _ => DataType::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Bool => "boolean",
            DataType::Int => "integer",
            DataType::Float => "number",
            DataType::String => "string",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen_identity_and_equal() {
        assert_eq!(DataType::Null.widen(DataType::Int), DataType::Int);
        assert_eq!(DataType::Int.widen(DataType::Null), DataType::Int);
        assert_eq!(DataType::Bool.widen(DataType::Bool), DataType::Bool);
        assert_eq!(DataType::Null.widen(DataType::Null), DataType::Null);
    }

    #[test]
    fn test_widen_mixed_goes_to_string() {
        assert_eq!(DataType::Int.widen(DataType::Float), DataType::String);
        assert_eq!(DataType::Bool.widen(DataType::String), DataType::String);
    }

    #[test]
    fn test_widen_is_commutative_and_associative() {
        let types = [
            DataType::Null,
            DataType::Bool,
            DataType::Int,
            DataType::Float,
            DataType::String,
        ];
        for a in types {
            for b in types {
                assert_eq!(a.widen(b), b.widen(a));
                for c in types {
                    assert_eq!(a.widen(b).widen(c), a.widen(b.widen(c)));
                }
            }
        }
    }

    #[test]
    fn test_scalar_serializes_as_plain_json() {
        assert_eq!(serde_json::to_string(&Scalar::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Scalar::Int(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&Scalar::String("hi".into())).unwrap(),
            "\"hi\""
        );
    }

    #[test]
    fn test_lexical_form() {
        assert_eq!(Scalar::Int(42).lexical_form(), "42");
        assert_eq!(Scalar::Bool(true).lexical_form(), "true");
        assert_eq!(Scalar::Float(1.5).lexical_form(), "1.5");
    }
}
