use std::fmt::{self, Display, Formatter};

use gdal_sys::OGRFieldType;

use crate::errors::GdalError;
use crate::subset::SchemaError;
use crate::vector::{field_type_to_name, Defn, Feature};

/// Value an attribute is compared with.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(value) => write!(f, "'{value}'"),
            FilterValue::Integer(value) => write!(f, "{value}"),
            FilterValue::Real(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Real(value)
    }
}

/// Selects features whose `field` equals `value`.
///
/// The filter only makes sense against a schema: [`AttributeFilter::compile`]
/// resolves the field and converts the value to the field's type.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeFilter {
    field: String,
    value: FilterValue,
}

impl AttributeFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        AttributeFilter {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Resolve the filter against a layer schema.
    ///
    /// Conversion rules by field type:
    ///
    /// * String, date and time fields compare OGR's text rendering of the
    ///   value. Numeric filter values are formatted first.
    /// * Integer fields take integers, text parsing as an integer, and reals
    ///   without a fractional part.
    /// * Real fields take finite reals, integers and text parsing as a
    ///   finite real.
    ///
    /// Any other field type is rejected with [`SchemaError::UnsupportedFieldType`].
    pub fn compile(&self, defn: &Defn) -> Result<CompiledFilter, SchemaError> {
        let missing = || SchemaError::MissingField {
            field: self.field.clone(),
        };
        let field_index = defn.field_index(&self.field).map_err(|_| missing())?;
        let field = field_index
            .and_then(|idx| defn.field(idx).ok())
            .ok_or_else(missing)?;
        let field_name = field.name();
        let field_type = field.field_type();

        let mismatch = || SchemaError::TypeMismatch {
            field: field_name.clone(),
            field_type: field_type_to_name(field_type),
            value: self.value.clone(),
        };

        let (target, push_down) = match field_type {
            OGRFieldType::OFTString => (Target::Text(self.text_value()), true),
            OGRFieldType::OFTDate | OGRFieldType::OFTTime | OGRFieldType::OFTDateTime => {
                (Target::Text(self.text_value()), false)
            }
            OGRFieldType::OFTInteger | OGRFieldType::OFTInteger64 => {
                let value = match &self.value {
                    FilterValue::Integer(value) => *value,
                    FilterValue::Text(text) => text.trim().parse::<i64>().map_err(|_| mismatch())?,
                    FilterValue::Real(value) => integral(*value).ok_or_else(mismatch)?,
                };
                (Target::Integer(value), true)
            }
            OGRFieldType::OFTReal => {
                let value = match &self.value {
                    FilterValue::Real(value) => *value,
                    FilterValue::Integer(value) => *value as f64,
                    FilterValue::Text(text) => text.trim().parse::<f64>().map_err(|_| mismatch())?,
                };
                if !value.is_finite() {
                    return Err(mismatch());
                }
                (Target::Real(value), true)
            }
            _ => {
                return Err(SchemaError::UnsupportedFieldType {
                    field: field_name,
                    field_type: field_type_to_name(field_type),
                })
            }
        };

        Ok(CompiledFilter {
            field_name,
            field_index: field.index(),
            target,
            push_down,
        })
    }

    fn text_value(&self) -> String {
        match &self.value {
            FilterValue::Text(text) => text.clone(),
            FilterValue::Integer(value) => value.to_string(),
            FilterValue::Real(value) => value.to_string(),
        }
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.fract() != 0. || !(i64::MIN as f64..i64::MAX as f64).contains(&value) {
        return None;
    }
    Some(value as i64)
}

#[derive(Clone, Debug, PartialEq)]
enum Target {
    Text(String),
    Integer(i64),
    Real(f64),
}

/// An [`AttributeFilter`] bound to one field of a layer schema.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledFilter {
    field_name: String,
    field_index: usize,
    target: Target,
    push_down: bool,
}

impl CompiledFilter {
    /// Name of the field as spelled in the schema.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    /// Whether `feature` passes the filter. Unset and null values never do.
    pub fn matches(&self, feature: &Feature) -> Result<bool, GdalError> {
        let idx = self.field_index;
        let matched = match &self.target {
            Target::Text(expected) => feature
                .field_as_string(idx)?
                .is_some_and(|value| value == *expected),
            Target::Integer(expected) => feature
                .field_as_integer64(idx)?
                .is_some_and(|value| value == *expected),
            Target::Real(expected) => feature
                .field_as_double(idx)?
                .is_some_and(|value| value == *expected),
        };
        Ok(matched)
    }

    /// Whether OGR SQL compares this field the way [`CompiledFilter::matches`] does.
    ///
    /// False for date and time fields, whose SQL comparison does not go
    /// through the text rendering.
    pub fn can_push_down(&self) -> bool {
        self.push_down
    }

    /// The filter as an OGR SQL `WHERE` clause.
    pub fn to_sql(&self) -> String {
        let field = format!("\"{}\"", self.field_name.replace('"', "\"\""));
        match &self.target {
            Target::Text(value) => format!("{field} = '{}'", value.replace('\'', "''")),
            Target::Integer(value) => format!("{field} = {value}"),
            Target::Real(value) => format!("{field} = {value:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture;
    use crate::Dataset;

    fn compile(filter: AttributeFilter) -> Result<CompiledFilter, SchemaError> {
        let ds = Dataset::open(fixture("points.geojson")).unwrap();
        let layer = ds.layer(0).unwrap();
        filter.compile(layer.defn())
    }

    fn count_matches(name: &str, filter: AttributeFilter) -> usize {
        let ds = Dataset::open(fixture(name)).unwrap();
        let mut layer = ds.layer(0).unwrap();
        let compiled = filter.compile(layer.defn()).unwrap();
        layer
            .features()
            .filter(|feature| compiled.matches(feature).unwrap())
            .count()
    }

    #[test]
    fn test_string_field() {
        assert_eq!(
            count_matches("basins.geojson", AttributeFilter::equals("HYBAS_ID", "10")),
            2
        );
        // numbers are compared by their text on string fields
        assert_eq!(
            count_matches("basins.geojson", AttributeFilter::equals("HYBAS_ID", 20)),
            1
        );
        assert_eq!(
            count_matches("basins.geojson", AttributeFilter::equals("HYBAS_ID", "1")),
            0
        );
    }

    #[test]
    fn test_field_name_is_case_insensitive() {
        let compiled = compile(AttributeFilter::equals("class", 1)).unwrap();
        assert_eq!(compiled.field_name(), "CLASS");
        assert_eq!(compiled.field_index(), 0);
    }

    #[test]
    fn test_integer_field() {
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("CLASS", 1)),
            3
        );
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("CLASS", " 2 ")),
            1
        );
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("CLASS", 3.0)),
            1
        );
        assert!(matches!(
            compile(AttributeFilter::equals("CLASS", 1.5)),
            Err(SchemaError::TypeMismatch { .. })
        ));
        assert!(matches!(
            compile(AttributeFilter::equals("CLASS", "one")),
            Err(SchemaError::TypeMismatch { ref field, .. }) if field == "CLASS"
        ));
    }

    #[test]
    fn test_real_field() {
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("WEIGHT", 0.5)),
            2
        );
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("WEIGHT", 2)),
            1
        );
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("WEIGHT", "1.25")),
            1
        );
        for value in [
            FilterValue::Real(f64::NAN),
            FilterValue::Real(f64::INFINITY),
            FilterValue::Real(f64::NEG_INFINITY),
            FilterValue::from("inf"),
        ] {
            assert!(matches!(
                compile(AttributeFilter::equals("WEIGHT", value)),
                Err(SchemaError::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_nulls_never_match() {
        // the fifth point has a null LABEL
        assert_eq!(
            count_matches("points.geojson", AttributeFilter::equals("LABEL", "")),
            0
        );
    }

    #[test]
    fn test_missing_field() {
        assert!(matches!(
            compile(AttributeFilter::equals("NOPE", "x")),
            Err(SchemaError::MissingField { ref field }) if field == "NOPE"
        ));
    }

    #[test]
    fn test_list_field_is_unsupported() {
        assert!(matches!(
            compile(AttributeFilter::equals("TAGS", "river")),
            Err(SchemaError::UnsupportedFieldType { ref field_type, .. }) if field_type == "StringList"
        ));
    }

    #[test]
    fn test_sql_rendering() {
        let compiled = compile(AttributeFilter::equals("LABEL", "it's")).unwrap();
        assert_eq!(compiled.to_sql(), "\"LABEL\" = 'it''s'");
        assert!(compiled.can_push_down());

        let compiled = compile(AttributeFilter::equals("CLASS", "3")).unwrap();
        assert_eq!(compiled.to_sql(), "\"CLASS\" = 3");

        let compiled = compile(AttributeFilter::equals("WEIGHT", 2)).unwrap();
        assert_eq!(compiled.to_sql(), "\"WEIGHT\" = 2.0");

        let compiled = compile(AttributeFilter::equals("SURVEYED", "2021/03/04")).unwrap();
        assert!(!compiled.can_push_down());
    }

    #[test]
    fn test_sql_matches_compiled_filter() {
        for filter in [
            AttributeFilter::equals("LABEL", "it's"),
            AttributeFilter::equals("CLASS", 1),
            AttributeFilter::equals("WEIGHT", 0.5),
        ] {
            let ds = Dataset::open(fixture("points.geojson")).unwrap();
            let mut layer = ds.layer(0).unwrap();
            let compiled = filter.compile(layer.defn()).unwrap();
            let expected = layer
                .features()
                .filter(|feature| compiled.matches(feature).unwrap())
                .count();
            layer.set_attribute_filter(&compiled.to_sql()).unwrap();
            assert_eq!(layer.features().count(), expected, "{}", compiled.to_sql());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(FilterValue::from("10").to_string(), "'10'");
        assert_eq!(FilterValue::from(10).to_string(), "10");
        assert_eq!(FilterValue::from(0.5).to_string(), "0.5");
    }
}
