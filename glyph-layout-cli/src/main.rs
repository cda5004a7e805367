use std::{
    io::{self, Read},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use glyph_layout::{
    Config, FrameOutcome, Point, Polygon, StepStatus, Warning,
    textual::{Session, parse_polygon},
};
use tracing_subscriber::fmt::SubscriberBuilder;

mod visualize;

const DEFAULT_FRAMES: usize = 1000;

#[derive(Parser)]
#[command(name = "glyph-layout", version, about, long_about = None)]
struct Cli {
    /// Path to the session file.
    /// Use '-' for stdin.
    #[arg(short = 'f', long)]
    filepath: PathBuf,

    /// Directory holding the pair boundary files (`A-B.dat`, `S-contains-A.dat`).
    #[arg(long)]
    pairs: PathBuf,

    /// Give up after this many frames.
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    frames: usize,

    /// Ignore the session's starting positions and scatter the shapes randomly,
    /// using this seed.
    #[arg(long)]
    scatter: Option<u64>,

    /// Width of the scatter area.
    #[arg(long, default_value_t = 100.0)]
    width: f64,

    /// Height of the scatter area.
    #[arg(long, default_value_t = 100.0)]
    height: f64,

    /// Grab the shape nearest this point, e.g. `--grab 0,0`.
    #[arg(long, value_parser = parse_point, requires = "to")]
    grab: Option<Point>,

    /// Drag the grabbed shape here before running.
    #[arg(long, value_parser = parse_point, requires = "grab")]
    to: Option<Point>,

    /// Show the final position of each shape.
    #[arg(long = "show-positions")]
    show_positions: bool,

    /// Save the final layout as a PNG.
    #[arg(short = 'o', long = "png-path")]
    png_path: Option<PathBuf>,

    /// Directory holding glyph outlines (`A.dat`), drawn in the PNG around each shape.
    #[arg(long)]
    glyphs: Option<PathBuf>,

    /// End each frame early once a step leaves the energy unchanged.
    #[arg(long = "stop-on-stall")]
    stop_on_stall: bool,

    /// Log every optimizer step.
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn chart_name(&self) -> String {
        if self.filepath.display().to_string() == "-" {
            "glyph-layout".to_owned()
        } else {
            self.filepath.display().to_string()
        }
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {s}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    Ok(Point::new(x, y))
}

/// One laid-out shape.
struct Shape {
    label: String,
    glyph: String,
    position: Point,
}

/// Everything a run produced.
struct Outcome {
    shapes: Vec<Shape>,
    lints: Vec<(Option<String>, Warning)>,
    num_glyphs: usize,
    num_terms: usize,
    frames: usize,
    restarts: usize,
    last: FrameOutcome,
    per_frame: Duration,
}

fn main() {
    let cli = Cli::parse();
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();
    let outcome = match main_inner(&cli) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    if let Err(e) = handle_output(&outcome, &cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    if let StepStatus::Failed(_) = outcome.last.status() {
        std::process::exit(1);
    }
}

fn handle_output(outcome: &Outcome, cli: &Cli) -> anyhow::Result<()> {
    print_output(outcome, cli.show_positions);
    if let Some(ref p) = cli.png_path {
        let outlines = match cli.glyphs {
            Some(ref dir) => read_outlines(dir, outcome)?,
            None => Default::default(),
        };
        visualize::save_png(cli, outcome, &outlines, p)?;
    }
    Ok(())
}

/// Read the outline of every glyph the layout used.
fn read_outlines(
    dir: &std::path::Path,
    outcome: &Outcome,
) -> anyhow::Result<Vec<(String, Polygon)>> {
    let mut outlines: Vec<(String, Polygon)> = Vec::new();
    for shape in &outcome.shapes {
        if outlines.iter().any(|(glyph, _)| *glyph == shape.glyph) {
            continue;
        }
        let path = dir.join(format!("{}.dat", shape.glyph));
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("could not read outline {}", path.display()))?;
        let outline = parse_polygon(&text)
            .with_context(|| format!("bad outline in {}", path.display()))?;
        outlines.push((shape.glyph.clone(), outline));
    }
    Ok(outlines)
}

fn main_inner(cli: &Cli) -> anyhow::Result<Outcome> {
    let session_txt = read_session(cli)?;
    let session = Session::from_str(&session_txt)?;
    let mut loaded = session
        .load_dir(&cli.pairs)
        .with_context(|| format!("could not load boundaries from {}", cli.pairs.display()))?;
    if let Some(seed) = cli.scatter {
        loaded.scatter(cli.width, cli.height, seed);
    }

    let labels: Vec<String> = loaded.labels().map(ToString::to_string).collect();
    let glyphs: Vec<String> = loaded
        .model()
        .shape_glyphs()
        .iter()
        .map(|&g| loaded.glyphs().name(g).to_owned())
        .collect();
    let num_glyphs = loaded.glyphs().len();
    let num_terms = loaded.model().terms().len();

    let mut controller = loaded
        .into_controller(Config::default())?
        .with_stop_on_stall(cli.stop_on_stall);
    if let (Some(grab), Some(to)) = (cli.grab, cli.to) {
        controller.select(grab);
        controller.drag(to);
    }
    let lints = controller
        .lint()
        .into_iter()
        .map(|w| (w.about_shape.map(|id| labels[id as usize].clone()), w))
        .collect();

    let now = std::time::Instant::now();
    let mut frames = 0;
    let mut restarts = 0;
    let mut last = controller.frame();
    frames += 1;
    while frames < cli.frames {
        match last.status() {
            StepStatus::Converged => break,
            // Starting afresh gets the line search off a kink.
            StepStatus::Failed(_) if restarts < cli.frames / 10 => {
                restarts += 1;
                controller.invalidate();
            }
            StepStatus::Failed(_) => break,
            StepStatus::Stepped => {}
        }
        last = controller.frame();
        frames += 1;
    }
    let per_frame = now.elapsed() / frames as u32;
    controller.release();

    let shapes = controller
        .placement()
        .positions()
        .zip(labels.into_iter().zip(glyphs))
        .map(|((_, position), (label, glyph))| Shape {
            label,
            glyph,
            position,
        })
        .collect();
    Ok(Outcome {
        shapes,
        lints,
        num_glyphs,
        num_terms,
        frames,
        restarts,
        last,
        per_frame,
    })
}

/// Prints the output nicely to stdout.
fn print_output(outcome: &Outcome, show_positions: bool) {
    let Outcome {
        shapes,
        lints,
        num_glyphs,
        num_terms,
        frames,
        restarts,
        last,
        per_frame,
    } = outcome;
    print_lints(lints);
    println!(
        "Problem size: {} shapes, {num_glyphs} glyphs, {num_terms} terms",
        shapes.len()
    );
    print_status(*last, *frames, *restarts);
    print_performance(*per_frame);
    if show_positions {
        println!("Positions:");
        for Shape {
            label,
            glyph,
            position: Point { x, y },
        } in shapes
        {
            println!("\t{label} ({glyph}): ({x:.2}, {y:.2})");
        }
    }
}

fn print_status(last: FrameOutcome, frames: usize, restarts: usize) {
    use colored::Colorize;
    let frames = if restarts > 0 {
        format!("{frames} frames ({restarts} restarts)")
    } else {
        format!("{frames} frames")
    };
    match last.status() {
        StepStatus::Converged => println!("Converged after {frames}"),
        StepStatus::Stepped => println!("{} after {frames}", "Still moving".yellow()),
        StepStatus::Failed(reason) => {
            eprintln!("{}: {reason} after {frames}", "Layout failed".red());
        }
    }
    println!(
        "Final energy: {:.6} (gradient norm {:.2e})",
        last.energy(),
        last.gradient_norm()
    );
}

fn print_performance(duration: Duration) {
    use colored::Colorize;
    let time = format!("{}μs", duration.as_micros());
    println!("Mean frame time {time}");
    let frames_per_second = Duration::from_secs(1).as_micros() / duration.as_micros().max(1);
    let frames_per_second = if frames_per_second <= 60 {
        frames_per_second.to_string().red()
    } else {
        frames_per_second.to_string().normal()
    };
    println!("i.e. {frames_per_second} frames per second");
}

fn print_lints(lints: &[(Option<String>, Warning)]) {
    use colored::Colorize;
    if !lints.is_empty() {
        println!("Lints:");
        for (shape, lint) in lints {
            let content = lint.content.to_string();
            match shape {
                Some(label) => println!("\t{label}: {}", content.yellow()),
                None => println!("\t{}", content.yellow()),
            }
        }
    }
}

/// Read the session text from a file or stdin, depending on user args.
/// They pass a filename, or '-' for stdin.
fn read_session(cli: &Cli) -> anyhow::Result<String> {
    // Read from file
    if cli.filepath != PathBuf::from("-") {
        return std::fs::read_to_string(&cli.filepath)
            .with_context(|| format!("could not read {}", cli.filepath.display()));
    }

    // Read from stdin
    let mut session_txt = String::with_capacity(100);
    io::stdin().read_to_string(&mut session_txt)?;
    Ok(session_txt)
}
