use chrono::{FixedOffset, NaiveDate, TimeZone};

use super::*;
use crate::assert_near;
use crate::errors::GdalError;
use crate::test_utils::{fixture, SuppressGDALErrorLog};
use crate::Dataset;

fn with_layer<F>(name: &str, f: F)
where
    F: FnOnce(&mut Layer),
{
    let ds = Dataset::open(fixture(name)).unwrap();
    let mut layer = ds.layer(0).unwrap();
    f(&mut layer);
}

#[test]
fn test_iterate_features() {
    with_layer("basins.geojson", |layer| {
        assert_eq!(layer.features().count(), 3);
        // iteration restarts from the first feature
        assert_eq!(layer.features().count(), 3);
        assert_eq!(layer.feature_count(), 3);
    });
}

#[test]
fn test_layer_schema() {
    with_layer("basins.geojson", |layer| {
        assert_eq!(layer.name(), "basins");
        assert_eq!(layer.geometry_type(), OGRwkbGeometryType::wkbPolygon);
        let names: Vec<String> = layer.defn().fields().map(|f| f.name()).collect();
        assert_eq!(names, vec!["HYBAS_ID", "PFAF_ID", "UP_AREA", "NAME"]);

        let pfaf = layer.defn().field_by_name("PFAF_ID").unwrap();
        assert_eq!(pfaf.index(), 1);
        assert_eq!(pfaf.field_type(), OGRFieldType::OFTInteger);
        assert_eq!(layer.defn().field_index("nope").unwrap(), None);
        assert!(matches!(
            layer.defn().field_by_name("nope"),
            Err(GdalError::InvalidFieldName { .. })
        ));
    });
}

#[test]
fn test_typed_field_values() {
    with_layer("basins.geojson", |layer| {
        let feature = layer.features().next().unwrap();
        assert_eq!(feature.fid(), Some(0));
        assert_eq!(
            feature.field("HYBAS_ID").unwrap(),
            Some(FieldValue::StringValue("10".to_string()))
        );
        assert_eq!(
            feature.field("PFAF_ID").unwrap().and_then(FieldValue::into_int),
            Some(711)
        );
        let area = feature.field("UP_AREA").unwrap().and_then(FieldValue::into_real);
        assert_near!(area.unwrap(), 1520.5);
        assert!(matches!(
            feature.field("nope"),
            Err(GdalError::InvalidFieldName { .. })
        ));
    });
}

#[test]
fn test_raw_field_accessors() {
    with_layer("points.geojson", |layer| {
        let features: Vec<Feature> = layer.features().collect();
        assert_eq!(features[1].field_as_integer64(0).unwrap(), Some(2));
        assert_eq!(features[1].field_as_double(1).unwrap(), Some(1.25));
        assert_eq!(
            features[2].field_as_string(2).unwrap(),
            Some("it's".to_string())
        );
        // null values are reported as missing
        assert_eq!(features[4].field_as_string(2).unwrap(), None);
        assert!(!features[4].is_field_set(2).unwrap());
        assert!(matches!(
            features[0].field_as_string(9),
            Err(GdalError::InvalidFieldIndex { index: 9, .. })
        ));
    });
}

#[test]
fn test_date_field() {
    with_layer("points.geojson", |layer| {
        let idx = layer.defn().field_index("SURVEYED").unwrap().unwrap();
        assert_eq!(
            layer.defn().field(idx).unwrap().field_type(),
            OGRFieldType::OFTDate
        );
        let feature = layer.features().next().unwrap();
        assert_eq!(
            feature.field_by_index(idx).unwrap(),
            Some(FieldValue::DateValue(
                NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()
            ))
        );
    });
}

#[test]
fn test_set_fields_on_new_feature() {
    with_layer("points.geojson", |layer| {
        let mut feature = Feature::new(layer.defn()).unwrap();
        assert_eq!(feature.fid(), None);
        assert_eq!(feature.field_by_index(0).unwrap(), None);

        feature
            .set_field_by_index(0, &FieldValue::IntegerValue(42))
            .unwrap();
        feature
            .set_field_by_index(2, &FieldValue::StringValue("new".to_string()))
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        feature
            .set_field_by_index(3, &FieldValue::DateValue(date))
            .unwrap();

        assert_eq!(
            feature.field("CLASS").unwrap(),
            Some(FieldValue::IntegerValue(42))
        );
        assert_eq!(
            feature.field("LABEL").unwrap(),
            Some(FieldValue::StringValue("new".to_string()))
        );
        assert_eq!(
            feature.field("SURVEYED").unwrap(),
            Some(FieldValue::DateValue(date))
        );
        assert!(feature
            .set_field_by_index(7, &FieldValue::IntegerValue(1))
            .is_err());
    });
}

#[test]
fn test_datetime_value_conversions() {
    let value = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2021, 6, 1, 12, 30, 0)
        .unwrap();
    let value = FieldValue::DateTimeValue(value);
    assert_eq!(value.clone().into_string(), None);
    assert_eq!(value.into_int64(), None);
    assert_eq!(FieldValue::Integer64Value(1 << 40).into_int(), None);
    assert_eq!(FieldValue::IntegerValue(7).into_real(), Some(7.0));
}

#[test]
fn test_geometry_is_borrowed_from_feature() {
    with_layer("basins.geojson", |layer| {
        let feature = layer.features().next().unwrap();
        let geometry = feature.geometry().unwrap();
        assert_eq!(
            geometry.wkt().unwrap(),
            "POLYGON ((10 45,10 46,11 46,11 45,10 45))"
        );
        // a clone outlives the feature
        let copy = geometry.clone();
        drop(feature);
        assert_eq!(copy.geometry_type(), OGRwkbGeometryType::wkbPolygon);
    });
}

#[test]
fn test_set_geometry() {
    with_layer("nulls.geojson", |layer| {
        let mut features = layer.features();
        let _first = features.next().unwrap();
        let mut second = features.next().unwrap();
        assert!(second.geometry().is_none());

        let point = Geometry::from_wkt("POINT (9 9)").unwrap();
        second.set_geometry(&point).unwrap();
        assert_eq!(second.geometry(), Some(&point));
    });
}

#[test]
fn test_attribute_filter() {
    with_layer("basins.geojson", |layer| {
        layer.set_attribute_filter("\"HYBAS_ID\" = '10'").unwrap();
        assert_eq!(layer.features().count(), 2);
        layer.clear_attribute_filter();
        assert_eq!(layer.features().count(), 3);

        let _nolog = SuppressGDALErrorLog::new();
        assert!(matches!(
            layer.set_attribute_filter("\"NOPE\" = "),
            Err(GdalError::OgrError {
                method_name: "OGR_L_SetAttributeFilter",
                ..
            })
        ));
    });
}

#[test]
fn test_layer_spatial_ref() {
    with_layer("basins.geojson", |layer| {
        let srs = layer.spatial_ref().unwrap();
        assert!(srs.is_geographic());
    });
}
