use std::path::Path;

use glyph_layout::Polygon;
use plotters::{coord::types::RangedCoordf64, prelude::*};

use crate::{Cli, Outcome, Shape};

const POINT_COLOR: RGBColor = RGBColor(0x58, 0x50, 0x8d);
const OUTLINE_COLOR: RGBColor = RGBColor(0xbc, 0x50, 0x90);

const LABEL_STYLE: (&str, i32) = ("sans-serif", 30);

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

pub fn save_png(
    cli: &Cli,
    outcome: &Outcome,
    outlines: &[(String, Polygon)],
    output_path: &Path,
) -> anyhow::Result<()> {
    let chart_name = cli.chart_name();
    let bounds = Bounds::new(&outcome.shapes, outlines);

    let width = 800;
    let height = 800;
    let dpi_scale = 2;
    let root = BitMapBackend::new(output_path, (width * dpi_scale, height * dpi_scale))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .caption(chart_name, ("sans-serif", 50))
        .build_cartesian_2d(bounds.min_x..bounds.max_x, bounds.min_y..bounds.max_y)?;

    draw_axes(&mut chart)?;

    // Outlines go underneath the points and their labels.
    for shape in &outcome.shapes {
        if let Some((_, outline)) = outlines.iter().find(|(glyph, _)| *glyph == shape.glyph) {
            draw_outline(&mut chart, shape, outline)?;
        }
    }
    for shape in &outcome.shapes {
        draw_point(&mut chart, shape)?;
    }

    // Finished.
    root.present()?;
    println!("Plot saved to {}", output_path.display());
    Ok(())
}

/// Span of the chart area
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Bounds {
    fn new(shapes: &[Shape], outlines: &[(String, Polygon)]) -> Self {
        // Get the furthest X and Y component in each direction,
        // so we can establish the span of the graph.
        let (mut xs, mut ys): (Vec<_>, Vec<_>) = shapes
            .iter()
            .map(|s| (s.position.x, s.position.y))
            .unzip();
        for shape in shapes {
            let Some((_, outline)) = outlines.iter().find(|(glyph, _)| *glyph == shape.glyph)
            else {
                continue;
            };
            let (lo, hi) = outline.bounds();
            xs.push(shape.position.x + lo.x);
            xs.push(shape.position.x + hi.x);
            ys.push(shape.position.y + lo.y);
            ys.push(shape.position.y + hi.y);
        }
        let padding = 1.0;
        let min_x = xs.iter().copied().reduce(libm::fmin).unwrap_or(0.0) - padding;
        let max_x = xs.iter().copied().reduce(libm::fmax).unwrap_or(0.0) + padding;
        let min_y = ys.iter().copied().reduce(libm::fmin).unwrap_or(0.0) - padding;
        let max_y = ys.iter().copied().reduce(libm::fmax).unwrap_or(0.0) + padding;
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

fn draw_axes<DB: DrawingBackend>(chart: &mut Chart<'_, DB>) -> anyhow::Result<()>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    chart
        .configure_mesh()
        .label_style(LABEL_STYLE) // axis labels
        .axis_desc_style(LABEL_STYLE) // x/y axis captions
        .draw()?;

    // Overlay bold black axes at x=0 and y=0
    let x_range = chart.as_coord_spec().x_spec().to_owned();
    let y_range = chart.as_coord_spec().y_spec().to_owned();

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(0.0, y_range.range().start), (0.0, y_range.range().end)],
        BLACK.stroke_width(3),
    )))?;

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x_range.range().start, 0.0), (x_range.range().end, 0.0)],
        BLACK.stroke_width(3),
    )))?;
    Ok(())
}

/// The glyph outline, translated to where its shape ended up.
fn draw_outline<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    shape: &Shape,
    outline: &Polygon,
) -> anyhow::Result<()>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    let at = shape.position;
    let vertices: Vec<(f64, f64)> = outline.vertices().map(|v| (at.x + v.x, at.y + v.y)).collect();
    chart.draw_series(std::iter::once(plotters::prelude::Polygon::new(
        vertices.clone(),
        OUTLINE_COLOR.mix(0.3).filled(),
    )))?;
    let mut closed = vertices;
    closed.push(closed[0]);
    chart.draw_series(std::iter::once(PathElement::new(
        closed,
        OUTLINE_COLOR.stroke_width(2),
    )))?;
    Ok(())
}

fn draw_point<DB: DrawingBackend>(chart: &mut Chart<'_, DB>, shape: &Shape) -> anyhow::Result<()>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    let label = format!("{} ({})", shape.label, shape.glyph);
    chart.draw_series(PointSeries::of_element(
        vec![(shape.position.x, shape.position.y)],
        5,
        &POINT_COLOR,
        &|coord, size, style| {
            EmptyElement::at(coord)
                + Circle::new((0, 0), size, style.filled())
                + Text::new(label.clone(), (10, -10), LABEL_STYLE.into_font())
        },
    ))?;
    Ok(())
}
