use super::srs::SpatialRef;
use crate::errors::GdalError;
use crate::test_utils::SuppressGDALErrorLog;

#[test]
fn from_epsg_to_wkt() {
    let spatial_ref = SpatialRef::from_epsg(4326).unwrap();
    let wkt = spatial_ref.to_wkt().unwrap();
    assert!(wkt.starts_with("GEOGCS[\"WGS 84\""));
    assert!(wkt.ends_with("AUTHORITY[\"EPSG\",\"4326\"]]"));
    assert!(spatial_ref.is_geographic());
    assert!(!spatial_ref.is_projected());
}

#[test]
fn from_definition_forms() {
    let utm = SpatialRef::from_definition("EPSG:32616").unwrap();
    assert!(utm.is_projected());
    assert_eq!(utm.auth_name().unwrap(), "EPSG");
    assert_eq!(utm.auth_code().unwrap(), 32616);

    let from_wkt = SpatialRef::from_definition(&utm.to_wkt().unwrap()).unwrap();
    assert_eq!(from_wkt, utm);
}

#[test]
fn comparison() {
    let wgs84 = SpatialRef::from_epsg(4326).unwrap();
    let same = SpatialRef::from_wkt(&wgs84.to_wkt().unwrap()).unwrap();
    let utm = SpatialRef::from_epsg(32616).unwrap();

    assert_eq!(wgs84, same);
    assert_ne!(wgs84, utm);
    assert_eq!(wgs84.clone(), wgs84);
}

#[test]
fn invalid_definition() {
    let _nolog = SuppressGDALErrorLog::new();
    assert!(matches!(
        SpatialRef::from_definition("not a crs"),
        Err(GdalError::OgrError {
            method_name: "OSRSetFromUserInput",
            ..
        })
    ));
    assert!(SpatialRef::from_epsg(1).is_err());
}
