//! 2D overview of the embedding space
//!
//! Principal-component projection (via `nalgebra`'s symmetric eigen solver)
//! rendered as an SVG scatter plot. SVG avoids system font dependencies.

use crate::vectors::KeyedVectors;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Plot errors
#[derive(Error, Debug)]
pub enum PlotError {
    /// Nothing meaningful to project
    #[error("Cannot project {points} points with {dimensions} dimensions to 2D")]
    Degenerate { points: usize, dimensions: usize },

    /// Drawing backend error
    #[error("Drawing error: {0}")]
    Draw(String),
}

pub type PlotResult<T> = Result<T, PlotError>;

fn draw_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Draw(e.to_string())
}

/// Project each row onto the first two principal components
pub fn project_2d(vectors: &Array2<f32>) -> PlotResult<Vec<(f64, f64)>> {
    let (n, d) = vectors.dim();
    if n == 0 || d < 2 {
        return Err(PlotError::Degenerate {
            points: n,
            dimensions: d,
        });
    }

    let mut centered = DMatrix::<f64>::from_fn(n, d, |i, j| f64::from(vectors[[i, j]]));
    for j in 0..d {
        let mean = centered.column(j).mean();
        centered.column_mut(j).add_scalar_mut(-mean);
    }

    let covariance = centered.transpose() * &centered / (n.max(2) - 1) as f64;
    let eigen = SymmetricEigen::new(covariance);

    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    let axes = DMatrix::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
    ]);

    let scores = centered * axes;
    Ok((0..n).map(|i| (scores[(i, 0)], scores[(i, 1)])).collect())
}

fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    let pad = ((max - min) * 0.05).max(1e-3);
    (min - pad)..(max + pad)
}

/// Render points as an SVG scatter plot
pub fn render_scatter(points: &[(f64, f64)], path: &Path, title: &str) -> PlotResult<()> {
    if points.is_empty() {
        return Err(PlotError::Degenerate {
            points: 0,
            dimensions: 2,
        });
    }

    let root = SVGBackend::new(path, (900, 900)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            padded_range(points.iter().map(|p| p.0)),
            padded_range(points.iter().map(|p| p.1)),
        )
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("PC 1")
        .y_desc("PC 2")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 2, BLUE.mix(0.4).filled())),
        )
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Project and plot a vector table; returns the number of points drawn
pub fn plot_embeddings(kv: &KeyedVectors, path: &Path, title: &str) -> PlotResult<usize> {
    let points = project_2d(kv.vectors())?;
    render_scatter(&points, path, title)?;
    debug!(points = points.len(), path = %path.display(), "Rendered embedding plot");
    Ok(points.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_collinear_points_land_on_first_axis() {
        let vectors = array![[0.0f32, 0.0, 1.0], [1.0, 1.0, 1.0], [2.0, 2.0, 1.0], [3.0, 3.0, 1.0]];

        let points = project_2d(&vectors).unwrap();

        assert_eq!(points.len(), 4);
        for &(_, y) in &points {
            assert!(y.abs() < 1e-9, "second component should vanish, got {y}");
        }
        // Evenly spaced along the line, up to sign
        let step = points[1].0 - points[0].0;
        assert!((step.abs() - 2f64.sqrt()).abs() < 1e-9);
        assert!((points[3].0 - points[2].0 - step).abs() < 1e-9);
        // Centered
        let mean: f64 = points.iter().map(|p| p.0).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn test_single_dimension_is_degenerate() {
        let vectors = array![[1.0f32], [2.0]];
        assert!(matches!(
            project_2d(&vectors),
            Err(PlotError::Degenerate { dimensions: 1, .. })
        ));
    }

    #[test]
    fn test_no_points_is_degenerate() {
        let vectors = Array2::<f32>::zeros((0, 4));
        assert!(matches!(project_2d(&vectors), Err(PlotError::Degenerate { points: 0, .. })));
    }

    #[test]
    fn test_renders_svg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embedding.svg");
        let kv = KeyedVectors::from_rows(
            2,
            vec![
                ("P1".to_string(), 1, vec![0.0, 1.0]),
                ("P2".to_string(), 1, vec![1.0, 0.0]),
                ("P3".to_string(), 1, vec![1.0, 1.0]),
            ],
        )
        .unwrap();

        let drawn = plot_embeddings(&kv, &path, "test").unwrap();

        assert_eq!(drawn, 3);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
    }
}
