use std::convert::{TryFrom, TryInto};

use gdal_sys::OGRwkbGeometryType;

use crate::errors::GdalError;
use crate::vector::Geometry;

impl Geometry {
    /// Converts this geometry into its [`geo_types`] counterpart.
    ///
    /// Z values are dropped. Curve and surface types are not supported.
    pub fn to_geo(&self) -> Result<geo_types::Geometry<f64>, GdalError> {
        self.try_into()
    }

    fn sub_geometries(&self) -> Result<Vec<geo_types::Geometry<f64>>, GdalError> {
        (0..self.geometry_count())
            .map(|n| unsafe { self._get_geometry(n) }.to_geo())
            .collect()
    }

    fn linestring(&self) -> geo_types::LineString<f64> {
        self.get_point_vec()
            .into_iter()
            .map(|(x, y, _)| geo_types::Coord { x, y })
            .collect()
    }
}

fn unexpected(expected: &'static str) -> GdalError {
    GdalError::BadArgument(format!("expected a {expected} member"))
}

impl TryFrom<&Geometry> for geo_types::Geometry<f64> {
    type Error = GdalError;

    fn try_from(geo: &Geometry) -> Result<geo_types::Geometry<f64>, Self::Error> {
        let geometry_type = unsafe { gdal_sys::OGR_GT_Flatten(geo.geometry_type()) };

        match geometry_type {
            OGRwkbGeometryType::wkbPoint => {
                let (x, y, _) = geo.get_point(0);
                Ok(geo_types::Geometry::Point(geo_types::Point::new(x, y)))
            }
            OGRwkbGeometryType::wkbLineString | OGRwkbGeometryType::wkbLinearRing => {
                Ok(geo_types::Geometry::LineString(geo.linestring()))
            }
            OGRwkbGeometryType::wkbPolygon => {
                let mut rings = (0..geo.geometry_count())
                    .map(|n| unsafe { geo._get_geometry(n) }.linestring());
                let outer = rings.next().unwrap_or_else(|| geo_types::LineString::new(vec![]));
                Ok(geo_types::Geometry::Polygon(geo_types::Polygon::new(
                    outer,
                    rings.collect(),
                )))
            }
            OGRwkbGeometryType::wkbMultiPoint => {
                let points = geo
                    .sub_geometries()?
                    .into_iter()
                    .map(|g| match g {
                        geo_types::Geometry::Point(p) => Ok(p),
                        _ => Err(unexpected("Point")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(geo_types::Geometry::MultiPoint(geo_types::MultiPoint(points)))
            }
            OGRwkbGeometryType::wkbMultiLineString => {
                let lines = geo
                    .sub_geometries()?
                    .into_iter()
                    .map(|g| match g {
                        geo_types::Geometry::LineString(l) => Ok(l),
                        _ => Err(unexpected("LineString")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(geo_types::Geometry::MultiLineString(
                    geo_types::MultiLineString(lines),
                ))
            }
            OGRwkbGeometryType::wkbMultiPolygon => {
                let polygons = geo
                    .sub_geometries()?
                    .into_iter()
                    .map(|g| match g {
                        geo_types::Geometry::Polygon(p) => Ok(p),
                        _ => Err(unexpected("Polygon")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(geo_types::Geometry::MultiPolygon(geo_types::MultiPolygon(
                    polygons,
                )))
            }
            OGRwkbGeometryType::wkbGeometryCollection => Ok(
                geo_types::Geometry::GeometryCollection(geo_types::GeometryCollection(
                    geo.sub_geometries()?,
                )),
            ),
            _ => Err(GdalError::UnsupportedGdalGeometryType(geometry_type)),
        }
    }
}
