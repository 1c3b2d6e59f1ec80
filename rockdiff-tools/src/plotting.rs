use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use rockdiff_algorithms::pipeline::ClusterAnalysis;
use rockdiff_core::nalgebra::Point2;

const IMAGE_SIZE: (u32, u32) = (800, 800);

type PlotResult = Result<(), Box<dyn Error>>;

// Square plot ranges around all points, with a margin of 5% of the extent
fn plot_ranges(points: &[Point2<f64>]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let (mut min, mut max) = (Point2::new(f64::MAX, f64::MAX), Point2::new(f64::MIN, f64::MIN));
    for point in points {
        min = Point2::new(min.x.min(point.x), min.y.min(point.y));
        max = Point2::new(max.x.max(point.x), max.y.max(point.y));
    }
    let extent = (max.x - min.x).max(max.y - min.y).max(1e-6) * 1.1;
    let center = Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
    (
        (center.x - extent / 2.0)..(center.x + extent / 2.0),
        (center.y - extent / 2.0)..(center.y + extent / 2.0),
    )
}

fn closed_ring(ring: &[Point2<f64>]) -> Vec<(f64, f64)> {
    ring.iter()
        .chain(ring.first())
        .map(|point| (point.x, point.y))
        .collect()
}

/// Draws the projected points of a cluster together with its boundary polygons. Exteriors are drawn in red, holes
/// in blue
pub fn plot_boundary(cluster: &ClusterAnalysis, path: &Path) -> PlotResult {
    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (x_range, y_range) = plot_ranges(&cluster.footprint);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(x_range, y_range)?;

    chart.draw_series(
        cluster
            .footprint
            .iter()
            .map(|point| Circle::new((point.x, point.y), 2, BLACK.filled())),
    )?;
    if let Some(boundary) = &cluster.boundary {
        for polygon in boundary.polygons() {
            chart.draw_series(std::iter::once(PathElement::new(
                closed_ring(polygon.exterior()),
                RED.stroke_width(2),
            )))?;
            chart.draw_series(polygon.interiors().iter().map(|hole| {
                PathElement::new(closed_ring(hole), BLUE.stroke_width(2))
            }))?;
        }
    }
    root.present()?;
    Ok(())
}

/// Draws the triangles that make up the footprint of a cluster, coloured from blue (smallest) to red (largest)
/// by the mean displacement magnitude of their vertices
pub fn plot_surface(cluster: &ClusterAnalysis, magnitudes: &[f64], path: &Path) -> PlotResult {
    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (x_range, y_range) = plot_ranges(&cluster.footprint);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(x_range, y_range)?;

    let mean_magnitude =
        |triangle: &[usize; 3]| triangle.iter().map(|v| magnitudes[*v]).sum::<f64>() / 3.0;
    let (low, high) = cluster
        .mesh
        .triangles()
        .iter()
        .map(mean_magnitude)
        .fold((f64::MAX, f64::MIN), |(low, high), value| {
            (low.min(value), high.max(value))
        });
    let span = (high - low).max(1e-12);

    chart.draw_series(cluster.mesh.triangles().iter().map(|triangle| {
        let t = (mean_magnitude(triangle) - low) / span;
        let color = HSLColor(0.66 * (1.0 - t), 0.85, 0.5);
        Polygon::new(
            triangle
                .iter()
                .map(|v| (cluster.footprint[*v].x, cluster.footprint[*v].y))
                .collect::<Vec<_>>(),
            color.filled(),
        )
    }))?;
    chart.draw_series(cluster.mesh.triangles().iter().map(|triangle| {
        let vertices = triangle
            .iter()
            .map(|v| cluster.footprint[*v])
            .collect::<Vec<_>>();
        PathElement::new(closed_ring(&vertices), BLACK.mix(0.3).stroke_width(1))
    }))?;
    root.present()?;
    Ok(())
}
