use super::JobReport;
use crate::api::load_image;
use crate::control::exclude_near_control_points;
use crate::error::Result;
use crate::export::{write_geo_csv_file, write_json_file};
use crate::{fit_homography, DotDetector, Georeferencer, ImageFileSink, JobConfig};

/// Run a job end to end: detect, georeference and write every output.
///
/// Control points are fitted after detection so the visualization is still
/// written when the control points turn out to be unusable.
pub fn run_job(job: &JobConfig) -> Result<JobReport> {
    job.validate()?;
    let detector = DotDetector::new(job.detect.clone())?;
    let image = load_image(&job.image)?;

    let detection = match &job.visualization {
        Some(path) => detector.detect_with_sink(&image, &mut ImageFileSink::new(path))?,
        None => detector.detect(&image),
    };

    let mut points = detection.pixel_points();
    let mut n_excluded = 0;
    if let Some(radius) = job.exclude_control_radius_px {
        let before = points.len();
        points = exclude_near_control_points(points, &job.control_points, radius);
        n_excluded = before - points.len();
        if n_excluded > 0 {
            tracing::info!(
                "Excluded {} detections within {} px of a control point",
                n_excluded,
                radius
            );
        }
    }
    if points.is_empty() {
        tracing::warn!("No dots detected in {}", job.image.display());
    }

    let fit = fit_homography(&job.control_points, &job.fit)?;
    let coordinates = Georeferencer::from_fit(fit.clone()).georeference(&points)?;
    write_geo_csv_file(&job.output_csv, &coordinates)?;

    let report = JobReport {
        image: job.image.clone(),
        detection,
        n_excluded,
        points,
        coordinates,
        fit,
        output_csv: job.output_csv.clone(),
        visualization: job.visualization.clone(),
    };

    if let Some(path) = &job.report {
        write_json_file(path, &report)?;
    }
    Ok(report)
}
