use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use scrollshot::CaptureConfig;
use scrollshot::domain::{
    CaptureTarget, Color, Document, ImageFormat, PaddingSpec, Rect, ScrollOffset, Size,
};
use scrollshot::simulated::SimulatedPage;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    /// Scroll from the top until the end of the page
    Full,
    /// Only what is on screen at the start scroll position
    Visible,
    /// The rectangle given with --region
    Region,
}

/// Capture a tall image as if it were a scrolling web page
#[derive(Parser, Debug)]
#[command(name = "scrollshot", version, about, long_about = None)]
struct Cli {
    /// Image standing in for the rendered document, in device pixels
    input: PathBuf,

    #[arg(short, long, value_enum, default_value = "full")]
    target: Target,

    /// Capture region in CSS pixels: x,y,width,height
    #[arg(long, value_parser = parse_region)]
    region: Option<Rect<Document>>,

    /// Viewport size in CSS pixels: WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720", value_parser = parse_viewport)]
    viewport: (f64, f64),

    /// Device pixel ratio of the input image
    #[arg(long, default_value = "1.0")]
    dpr: f64,

    /// Initial vertical scroll position in CSS pixels
    #[arg(long, default_value = "0")]
    scroll: f64,

    /// Height in CSS pixels of a fixed header painted over the viewport
    #[arg(long)]
    sticky_header: Option<f64>,

    #[arg(long, default_value = "#336699")]
    header_color: Color,

    /// png, jpeg, webp or svg (defaults to the configured format)
    #[arg(short, long)]
    format: Option<ImageFormat>,

    #[arg(short, long)]
    quality: Option<u8>,

    /// Padding on every side in CSS pixels
    #[arg(long)]
    padding: Option<f64>,

    /// Padding color as #rgb, #rrggbb or #rrggbbaa
    #[arg(long)]
    padding_color: Option<Color>,

    /// Corner radius in CSS pixels
    #[arg(long)]
    radius: Option<f64>,

    /// Use squircle corners with the given smoothing (0 to 1)
    #[arg(long)]
    squircle: Option<f64>,

    /// Output file (defaults to the pictures directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Store the effective options as the new defaults
    #[arg(long)]
    save_config: bool,
}

fn parse_region(s: &str) -> Result<Rect<Document>, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid region '{s}': {err}"))?;
    match parts[..] {
        [x, y, width, height] => Ok(Rect::new(x, y, width, height)),
        _ => Err(format!("invalid region '{s}': expected x,y,width,height")),
    }
}

fn parse_viewport(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid viewport '{s}': expected WIDTHxHEIGHT"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid viewport '{s}': {err}"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn output_path(format: ImageFormat) -> Option<PathBuf> {
    let mut path = dirs::picture_dir().or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))?;
    let name = chrono::Local::now()
        .format("Screenshot_%Y-%m-%d_%H-%M-%S")
        .to_string();
    path.push(format!("{name}.{}", format.extension()));
    Some(path)
}

impl Cli {
    fn apply(&self, config: &mut CaptureConfig) {
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(amount) = self.padding {
            config.padding = PaddingSpec::uniform(amount, config.padding.color);
        }
        if let Some(color) = self.padding_color {
            config.padding.color = color;
        }
        if let Some(radius) = self.radius {
            config.corners.radius = radius;
        }
        if let Some(smoothing) = self.squircle {
            config.corners.use_squircle = true;
            config.corners.smoothing = smoothing;
        }
    }

    fn capture_target(&self) -> Option<CaptureTarget> {
        match self.target {
            Target::Full => Some(CaptureTarget::FullPage),
            Target::Visible => Some(CaptureTarget::Visible),
            Target::Region => self.region.map(CaptureTarget::Region),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = CaptureConfig::load();
    cli.apply(&mut config);
    if cli.save_config {
        config.save();
    }

    let document = image::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?
        .to_rgba8();
    let (width, height) = cli.viewport;
    let mut page = SimulatedPage::new(document, cli.dpr, Size::new(width, height));
    if let Some(header) = cli.sticky_header {
        page = page.with_fixed_element(
            "header",
            Rect::new(0.0, 0.0, width, header),
            cli.header_color,
        );
    }
    page.set_scroll(ScrollOffset::new(0.0, cli.scroll.max(0.0)));
    let mut camera = page.camera();

    let target = cli.capture_target();
    let result = scrollshot::capture(&mut page, &mut camera, target.as_ref(), &config)
        .await
        .inspect_err(|err| log::error!("Capture failed: {err}"))?;

    let path = match cli.output {
        Some(path) => path,
        None => output_path(config.format).context("No pictures directory available")?,
    };
    std::fs::write(&path, &result.blob.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Saved {}x{} capture to {}", result.width, result.height, path.display());
    println!("{}", path.display());
    Ok(())
}
