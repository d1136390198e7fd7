//! Type coercion and aggregation of raw source values.
//!
//! String-keyed sources hand over raw strings, converted with
//! [`FromRawValue`]. The body hands over typed JSON values, deserialized with
//! serde. Uploaded files are assigned as they are.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thales_core::{ConversionError, UploadedFile};

/// Conversion from one raw string value.
///
/// # Example
///
/// ```rust
/// use thales_engine::FromRawValue;
///
/// assert_eq!(i32::from_raw(" 42 ").unwrap(), 42);
/// assert_eq!(bool::from_raw("TRUE").unwrap(), true);
/// assert!(u8::from_raw("300").is_err());
/// ```
pub trait FromRawValue: Sized {
    /// Converts `raw` into `Self`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] if `raw` is not a valid `Self`.
    fn from_raw(raw: &str) -> Result<Self, ConversionError>;
}

macro_rules! impl_from_raw_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRawValue for $ty {
                fn from_raw(raw: &str) -> Result<Self, ConversionError> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|e| ConversionError::new::<$ty>(raw, e.to_string()))
                }
            }
        )*
    };
}

impl_from_raw_parse!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl FromRawValue for bool {
    fn from_raw(raw: &str) -> Result<Self, ConversionError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ConversionError::new::<bool>(raw, "expected 'true' or 'false'"))
        }
    }
}

impl FromRawValue for char {
    fn from_raw(raw: &str) -> Result<Self, ConversionError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConversionError::new::<char>(raw, "expected exactly one character")),
        }
    }
}

impl FromRawValue for String {
    fn from_raw(raw: &str) -> Result<Self, ConversionError> {
        Ok(raw.to_string())
    }
}

impl<T: FromRawValue> FromRawValue for Option<T> {
    fn from_raw(raw: &str) -> Result<Self, ConversionError> {
        T::from_raw(raw).map(Some)
    }
}

/// One source's raw values for one property.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue<'a> {
    /// Raw strings from a string-keyed provider, in source order.
    Text(Vec<String>),
    /// Uploaded files from the form provider.
    Files(Vec<UploadedFile>),
    /// A typed value from the hydrated body.
    Json(&'a Value),
}

impl SourceValue<'_> {
    /// Short description of the value kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Files(_) => "files",
            Self::Json(_) => "json",
        }
    }
}

/// Converts the first raw value.
///
/// # Errors
///
/// Fails when there are no raw values or the first one does not convert.
pub fn convert_scalar<T: FromRawValue>(raw: &[String]) -> Result<T, ConversionError> {
    let first = raw.first().ok_or_else(ConversionError::empty::<T>)?;
    T::from_raw(first)
}

/// Converts every raw value, dropping the ones that fail.
///
/// # Errors
///
/// Fails when no value converts.
///
/// # Example
///
/// ```rust
/// use thales_engine::coerce::aggregate;
///
/// let raw = vec!["1".to_string(), "2".to_string(), "x".to_string(), "3".to_string()];
/// assert_eq!(aggregate::<i32>(&raw).unwrap(), vec![1, 2, 3]);
/// ```
pub fn aggregate<T: FromRawValue>(raw: &[String]) -> Result<Vec<T>, ConversionError> {
    let values: Vec<T> = raw.iter().filter_map(|r| T::from_raw(r).ok()).collect();

    if values.is_empty() {
        let shown = raw.join(",");
        return Err(ConversionError::new::<Vec<T>>(shown, "no value converted"));
    }
    Ok(values)
}

/// Deserializes a typed body value into `T`.
///
/// # Errors
///
/// Fails when the value does not fit `T`.
pub fn from_json<T: DeserializeOwned>(value: &Value) -> Result<T, ConversionError> {
    T::deserialize(value).map_err(|e| ConversionError::new::<T>(value.to_string(), e.to_string()))
}

/// Converts one source's raw values into a scalar `T`.
pub(crate) fn scalar_from<T>(value: SourceValue<'_>) -> Result<T, ConversionError>
where
    T: FromRawValue + DeserializeOwned,
{
    match value {
        SourceValue::Text(raw) => convert_scalar(&raw),
        SourceValue::Json(value) => from_json(value),
        SourceValue::Files(_) => Err(ConversionError::new::<T>("<file>", "files cannot bind to a scalar")),
    }
}

/// Converts one source's raw values into a `Vec<T>`.
pub(crate) fn collection_from<T>(value: SourceValue<'_>) -> Result<Vec<T>, ConversionError>
where
    T: FromRawValue + DeserializeOwned,
{
    match value {
        SourceValue::Text(raw) => aggregate(&raw),
        SourceValue::Json(value) => from_json(value),
        SourceValue::Files(_) => {
            Err(ConversionError::new::<Vec<T>>("<file>", "files cannot bind to a collection"))
        }
    }
}

/// Takes the first uploaded file.
pub(crate) fn file_from(value: SourceValue<'_>) -> Result<UploadedFile, ConversionError> {
    match value {
        SourceValue::Files(files) => files
            .into_iter()
            .next()
            .ok_or_else(ConversionError::empty::<UploadedFile>),
        other => Err(ConversionError::new::<UploadedFile>(
            other.kind(),
            "only uploaded files bind to a file property",
        )),
    }
}

/// Takes every uploaded file.
pub(crate) fn files_from(value: SourceValue<'_>) -> Result<Vec<UploadedFile>, ConversionError> {
    match value {
        SourceValue::Files(files) if !files.is_empty() => Ok(files),
        SourceValue::Files(_) => Err(ConversionError::empty::<Vec<UploadedFile>>()),
        other => Err(ConversionError::new::<Vec<UploadedFile>>(
            other.kind(),
            "only uploaded files bind to a file collection",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(i64::from_raw("-7").unwrap(), -7);
        assert_eq!(f64::from_raw("2.5").unwrap(), 2.5);
        assert!(i32::from_raw("").is_err());
        assert!(u32::from_raw("-1").is_err());
    }

    #[test]
    fn test_bool() {
        assert!(bool::from_raw("True").unwrap());
        assert!(!bool::from_raw("false").unwrap());
        assert!(bool::from_raw("1").is_err());
    }

    #[test]
    fn test_char_and_string() {
        assert_eq!(char::from_raw("x").unwrap(), 'x');
        assert!(char::from_raw("xy").is_err());
        assert_eq!(String::from_raw("  keep  ").unwrap(), "  keep  ");
    }

    #[test]
    fn test_option() {
        assert_eq!(Option::<u8>::from_raw("5").unwrap(), Some(5));
        assert!(Option::<u8>::from_raw("five").is_err());
    }

    #[test]
    fn test_scalar_takes_first() {
        assert_eq!(convert_scalar::<i32>(&raw(&["1", "2"])).unwrap(), 1);
        assert!(convert_scalar::<i32>(&raw(&["x", "2"])).is_err());
        assert!(convert_scalar::<i32>(&[]).is_err());
    }

    #[test]
    fn test_aggregate_drops_failures() {
        assert_eq!(aggregate::<i32>(&raw(&["1", "2", "x", "3"])).unwrap(), vec![1, 2, 3]);
        assert!(aggregate::<i32>(&raw(&["x", "y"])).is_err());
    }

    #[test]
    fn test_json_values() {
        assert_eq!(from_json::<i32>(&json!(42)).unwrap(), 42);
        assert_eq!(from_json::<Vec<String>>(&json!(["a", "b"])).unwrap(), vec!["a", "b"]);
        assert!(from_json::<i32>(&json!("42")).is_err());
    }

    #[test]
    fn test_files_do_not_bind_to_scalars() {
        let files = SourceValue::Files(vec![UploadedFile::new("doc", "x")]);
        assert!(scalar_from::<String>(files).is_err());

        let text = SourceValue::Text(raw(&["a"]));
        assert!(file_from(text).is_err());
    }

    #[test]
    fn test_file_shapes() {
        let files = vec![UploadedFile::new("doc", "a"), UploadedFile::new("doc", "b")];

        let first = file_from(SourceValue::Files(files.clone())).unwrap();
        assert_eq!(&first.data()[..], b"a");
        assert_eq!(files_from(SourceValue::Files(files)).unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn aggregate_keeps_every_integer_in_order(
            items in prop::collection::vec(prop_oneof![
                any::<i32>().prop_map(|n| n.to_string()),
                "[a-z]{1,4}",
            ], 0..20)
        ) {
            let expected: Vec<i32> = items.iter().filter_map(|s| s.parse().ok()).collect();

            match aggregate::<i32>(&items) {
                Ok(values) => prop_assert_eq!(values, expected),
                Err(_) => prop_assert!(expected.is_empty()),
            }
        }
    }
}
