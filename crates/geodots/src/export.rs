//! CSV and JSON writers for detections and georeferenced points.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::{GeoPoint, PixelPoint};

pub const GEO_CSV_HEADER: &str = "longitude,latitude";
pub const PIXEL_CSV_HEADER: &str = "x,y";

/// Header row then one `longitude,latitude` row per point, input order.
///
/// Values use the shortest representation that parses back to the same `f64`.
pub fn write_geo_csv<W: Write>(out: &mut W, points: &[GeoPoint]) -> std::io::Result<()> {
    writeln!(out, "{GEO_CSV_HEADER}")?;
    for p in points {
        writeln!(out, "{},{}", p.longitude, p.latitude)?;
    }
    Ok(())
}

/// Header row then one `x,y` row per detected pixel.
pub fn write_pixel_csv<W: Write>(out: &mut W, points: &[PixelPoint]) -> std::io::Result<()> {
    writeln!(out, "{PIXEL_CSV_HEADER}")?;
    for p in points {
        writeln!(out, "{},{}", p.x, p.y)?;
    }
    Ok(())
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn write_file_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    create_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .map_err(|e| Error::io(path, e))
}

pub fn write_geo_csv_file(path: &Path, points: &[GeoPoint]) -> Result<()> {
    write_file_with(path, |out| write_geo_csv(out, points))?;
    tracing::info!("Wrote {} coordinates to {}", points.len(), path.display());
    Ok(())
}

pub fn write_pixel_csv_file(path: &Path, points: &[PixelPoint]) -> Result<()> {
    write_file_with(path, |out| write_pixel_csv(out, points))?;
    tracing::info!("Wrote {} pixel positions to {}", points.len(), path.display());
    Ok(())
}

/// Pretty-printed JSON of any serializable value.
pub fn write_json_file<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_file_with(path, |out| out.write_all(json.as_bytes()))?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::px;

    #[test]
    fn geo_csv_has_header_and_rows_in_order() {
        let mut buf = Vec::new();
        write_geo_csv(
            &mut buf,
            &[GeoPoint::new(-101.2345, 43.1234), GeoPoint::new(-100.5, 42.75)],
        )
        .expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "longitude,latitude\n-101.2345,43.1234\n-100.5,42.75\n");
    }

    #[test]
    fn empty_detection_still_writes_header() {
        let mut buf = Vec::new();
        write_geo_csv(&mut buf, &[]).expect("write");
        assert_eq!(buf, b"longitude,latitude\n");
    }

    #[test]
    fn values_survive_a_text_round_trip() {
        let p = GeoPoint::new(-101.12345678901234, 42.98765432109876);
        let mut buf = Vec::new();
        write_geo_csv(&mut buf, &[p]).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let row = text.lines().nth(1).expect("row");
        let (lon, lat) = row.split_once(',').expect("two columns");
        assert_eq!(lon.parse::<f64>().expect("lon"), p.longitude);
        assert_eq!(lat.parse::<f64>().expect("lat"), p.latitude);
    }

    #[test]
    fn pixel_csv_lists_integer_positions() {
        let mut buf = Vec::new();
        write_pixel_csv(&mut buf, &[px(12, 40), px(7, 3)]).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "x,y\n12,40\n7,3\n");
    }

    #[test]
    fn file_writers_create_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("nested/out/coordinates.csv");
        write_geo_csv_file(&csv, &[GeoPoint::new(1.0, 2.0)]).expect("csv");
        assert_eq!(
            std::fs::read_to_string(&csv).expect("read"),
            "longitude,latitude\n1,2\n"
        );

        let json = dir.path().join("report.json");
        write_json_file(&json, &vec![px(1, 2)]).expect("json");
        let back: Vec<PixelPoint> =
            serde_json::from_str(&std::fs::read_to_string(&json).expect("read")).expect("parse");
        assert_eq!(back, vec![px(1, 2)]);
    }
}
