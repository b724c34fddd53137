use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use btsticker::printer::{send_frame, FrameSink, WriterSink};
use btsticker::types::{DEFAULT_MATRIX_SIZE, DEFAULT_THRESHOLD};
use btsticker::{protocol, Algorithm, DitherParameters, MonoRaster, PrintSettings, ScaleType};

#[derive(Parser)]
#[command(name = "btsticker")]
#[command(about = "Dither pictures and print them on the 12x30 mm Bluetooth sticker printer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a picture and send (or save) the print frame
    Print(PrintArgs),
    /// Decode a saved frame and render it as a PNG
    Inspect {
        /// Frame file written by `print --output`
        frame: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        preview: PathBuf,
    },
}

#[derive(Args)]
struct PrintArgs {
    /// Input picture (PNG, JPEG or BMP)
    image: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Algorithm::default(), env = "BTSTICKER_ALGORITHM")]
    algorithm: Algorithm,

    #[arg(short, long, value_enum, default_value_t = ScaleType::default(), env = "BTSTICKER_SCALE")]
    scale: ScaleType,

    /// Quantization threshold, 0-255
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, env = "BTSTICKER_THRESHOLD")]
    threshold: u8,

    /// Swap black and white
    #[arg(long, env = "BTSTICKER_INVERT")]
    invert: bool,

    /// Bayer matrix side: 2, 4 or 8
    #[arg(long, default_value_t = DEFAULT_MATRIX_SIZE, env = "BTSTICKER_MATRIX_SIZE")]
    matrix_size: u32,

    /// 0.0-2.0; the tone stage only runs when brightness or contrast is not 1.0
    #[arg(long, default_value_t = 1.0, env = "BTSTICKER_BRIGHTNESS")]
    brightness: f32,

    /// 0.0-2.0, see --brightness
    #[arg(long, default_value_t = 1.0, env = "BTSTICKER_CONTRAST")]
    contrast: f32,

    /// Sobel edge blend, 0.0-1.0
    #[arg(long, default_value_t = 0.0, env = "BTSTICKER_EDGES")]
    edges: f32,

    /// Extra clockwise rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, env = "BTSTICKER_ROTATE")]
    rotate: f32,

    /// Keep the picture's orientation even when it disagrees with the label
    #[arg(long, env = "BTSTICKER_NO_AUTO_ROTATE")]
    no_auto_rotate: bool,

    /// Write the frame to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Bound RFCOMM device node, e.g. /dev/rfcomm0
    #[arg(short, long, env = "BTSTICKER_DEVICE")]
    device: Option<PathBuf>,

    /// Scan for the printer over Bluetooth LE and print to it
    #[cfg(feature = "ble")]
    #[arg(long)]
    ble: bool,

    /// UUID of the BLE write characteristic; defaults to the first writable one
    #[cfg(feature = "ble")]
    #[arg(long, requires = "ble", env = "BTSTICKER_BLE_CHAR")]
    ble_char: Option<String>,

    /// Save the dithered label as a PNG
    #[arg(long)]
    preview: Option<PathBuf>,
}

impl PrintArgs {
    fn settings(&self) -> PrintSettings {
        PrintSettings {
            scale: self.scale,
            auto_rotate: !self.no_auto_rotate,
            rotation: self.rotate,
            algorithm: self.algorithm,
            dither: DitherParameters {
                threshold: self.threshold,
                invert: self.invert,
                matrix_size: self.matrix_size,
                brightness: self.brightness,
                contrast: self.contrast,
                edge_intensity: self.edges,
            },
        }
    }

    #[cfg(feature = "ble")]
    fn wants_ble(&self) -> bool {
        self.ble
    }

    #[cfg(not(feature = "ble"))]
    fn wants_ble(&self) -> bool {
        false
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Print(args) => run_print(&args),
        Commands::Inspect { frame, preview } => run_inspect(&frame, &preview),
    }
}

fn run_print(args: &PrintArgs) -> Result<(), Box<dyn std::error::Error>> {
    let img = image::open(&args.image)?.to_rgba8();
    info!(
        "Loaded {} ({}x{})",
        args.image.display(),
        img.width(),
        img.height()
    );

    let raster = btsticker::convert(&img, &args.settings())?;
    if let Some(path) = &args.preview {
        save_preview(&raster, path)?;
    }
    let frame = protocol::encode(&raster)?;

    let mut delivered = false;
    if let Some(path) = &args.output {
        send_frame(&mut WriterSink::new(File::create(path)?), &frame)?;
        info!("Frame written to {}", path.display());
        delivered = true;
    }
    if let Some(path) = &args.device {
        let device = OpenOptions::new().write(true).open(path)?;
        send_frame(&mut WriterSink::new(device), &frame)?;
        delivered = true;
    }
    if args.wants_ble() {
        send_over_ble(args, &frame)?;
        delivered = true;
    }

    if !delivered && args.preview.is_none() {
        warn!("No destination given, writing frame to stdout");
        WriterSink::new(io::stdout().lock()).send(&frame)?;
    }
    Ok(())
}

#[cfg(feature = "ble")]
fn send_over_ble(args: &PrintArgs, frame: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    use btsticker::ble::{BleSink, BleTarget};

    let target = BleTarget {
        write_char_uuid: args.ble_char.clone(),
        ..BleTarget::default()
    };
    let mut sink = BleSink::connect(&target)?;
    let sent = sink.send(frame);
    sink.disconnect()?;
    Ok(sent?)
}

#[cfg(not(feature = "ble"))]
fn send_over_ble(_args: &PrintArgs, _frame: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    Ok(())
}

fn run_inspect(frame: &Path, preview: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(frame)?;
    let raster = protocol::decode(&bytes)?;
    info!(
        "{}: {}x{} label, {} ink dots",
        frame.display(),
        raster.width(),
        raster.height(),
        raster.ink_count()
    );
    save_preview(&raster, preview)
}

fn save_preview(raster: &MonoRaster, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    raster.to_luma().save(path)?;
    info!("Preview saved to {}", path.display());
    Ok(())
}
