//! Calibration curve rendering for the trainer's diagnostics.

use std::path::Path;

use plotters::prelude::*;

use super::evaluate::CalibrationPoint;
use crate::error::{Error, Result};

const PLOT_SIZE: (u32, u32) = (640, 480);

fn plot_err(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

/// Draw mean predicted probability against observed default frequency, with
/// the diagonal of a perfectly calibrated model for reference. Written as SVG.
pub fn write_calibration_plot(points: &[CalibrationPoint], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| Error::unavailable(dir.display().to_string(), e))?;
    }

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Calibration curve", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(54)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Mean predicted probability")
        .y_desc("Fraction of defaults")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new([(0.0, 0.0), (1.0, 1.0)], BLACK.mix(0.4)))
        .map_err(plot_err)?
        .label("Perfectly calibrated")
        .legend(|(x, y)| PathElement::new([(x, y), (x + 16, y)], BLACK.mix(0.4)));

    let curve: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.mean_predicted, p.fraction_positive))
        .collect();
    chart
        .draw_series(LineSeries::new(curve.iter().copied(), BLUE.stroke_width(2)))
        .map_err(plot_err)?
        .label("Logistic regression")
        .legend(|(x, y)| PathElement::new([(x, y), (x + 16, y)], BLUE.stroke_width(2)));
    chart
        .draw_series(curve.iter().map(|&xy| Circle::new(xy, 4, BLUE.filled())))
        .map_err(plot_err)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Calibration plot written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plots").join("calibration.svg");
        let points = [
            CalibrationPoint { mean_predicted: 0.1, fraction_positive: 0.08, count: 40 },
            CalibrationPoint { mean_predicted: 0.55, fraction_positive: 0.6, count: 12 },
            CalibrationPoint { mean_predicted: 0.9, fraction_positive: 0.85, count: 7 },
        ];
        write_calibration_plot(&points, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }
}
