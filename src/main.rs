use clap::{Parser, Subcommand};
use image::{DynamicImage, ImageFormat};
use stayhappy_imaging::config::{self, RetargetConfig};
use stayhappy_imaging::imaging::{
    FileImageSource, ImageSource, SaliencyAnalyzer, focal_point, is_supported_photo,
};
use stayhappy_imaging::output;
use stayhappy_imaging::retarget::{RenditionSink, Retargeter};
use stayhappy_imaging::types::{Image, Size};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stayhappy-imaging")]
#[command(about = "Saliency-aware photo re-targeting for journal widgets")]
#[command(long_about = "\
Saliency-aware photo re-targeting for journal widgets

Every photo can be requested at any size. The result is exactly that size,
scaled to cover it and cropped around the part of the photo that stands out.

Photo directory layout (flat, names are opaque identifiers):

  photos/
  ├── 6F1C0A2E-....jpg
  ├── 9B77D3F1-....png
  └── ...

Run 'stayhappy-imaging gen-config' to generate a documented stayhappy.toml.")]
#[command(version)]
struct Cli {
    /// Photo directory
    #[arg(long, default_value = "photos", global = true)]
    photos: PathBuf,

    /// Output directory for pre-rendered images
    #[arg(long, default_value = "rendered", global = true)]
    output: PathBuf,

    /// Config file (stock defaults if absent)
    #[arg(long, default_value = "stayhappy.toml", global = true)]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-target one photo to a size and write the result
    Retarget {
        /// Photo to re-target
        file: PathBuf,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        /// Output path (format from extension; default <stem>-<w>x<h>.png next to the photo)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the salient region and focal point of a photo
    Analyze {
        /// Photo to analyze
        file: PathBuf,
    },
    /// Render every photo in the photo directory at every widget size
    Prerender {
        /// Sizes as WxH, comma separated (default: [prerender] sizes from config)
        #[arg(long, value_delimiter = ',', value_parser = parse_size)]
        sizes: Vec<Size>,
        /// Write a JSON report of the run
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a stock stayhappy.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Retarget {
            ref file,
            width,
            height,
            ref out,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let (source, file_name) = source_for(file)?;
            let photo = source.load(&file_name).await?;
            let retargeter = Retargeter::from_config(Arc::new(source), &config);

            let target = Size::new(width, height);
            let result = retargeter.retarget(photo.clone(), target).await?;
            let out_path = out
                .clone()
                .unwrap_or_else(|| file.with_file_name(rendition_file_name(&file_name, target)));
            save_image(&result, &out_path)?;

            for line in output::format_retarget_output(
                file,
                (photo.width(), photo.height()),
                &out_path,
                (result.width(), result.height()),
            ) {
                println!("{}", line);
            }
        }
        Command::Analyze { ref file } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let (source, file_name) = source_for(file)?;
            let photo = source.load(&file_name).await?;

            let analyzer = SaliencyAnalyzer::from_config(&config.saliency);
            let pixels = photo.clone();
            let bbox = tokio::task::spawn_blocking(move || analyzer.analyze(pixels.pixels())).await?;

            for line in output::format_analysis(
                file,
                (photo.width(), photo.height()),
                &bbox,
                focal_point(&bbox),
            ) {
                println!("{}", line);
            }
        }
        Command::Prerender {
            ref sizes,
            ref report,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let sizes = if sizes.is_empty() {
                config_sizes(&config)
            } else {
                sizes.clone()
            };
            let file_names = photo_names(&cli.photos);
            println!(
                "==> Pre-rendering {} photos at {} sizes → {}",
                file_names.len(),
                sizes.len(),
                cli.output.display()
            );

            std::fs::create_dir_all(&cli.output)?;
            let retargeter =
                Retargeter::from_config(Arc::new(FileImageSource::new(&cli.photos)), &config);
            let out_dir = cli.output.clone();
            let sink: RenditionSink = Arc::new(move |name: &str, target: Size, image: &Image| {
                save_image(image, &out_dir.join(rendition_file_name(name, target)))
            });

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_prerender_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = retargeter
                .prerender_to(&file_names, &sizes, Some(tx), Some(sink))
                .await;
            printer.join().ok();
            println!("{}", output::format_cache_summary(retargeter.cache()));

            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(report_path, json)?;
            }
            if !result.is_complete() {
                return Err(format!("{} renditions failed", result.failed.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// A file source rooted at the photo's directory, plus the photo's name in it.
fn source_for(file: &Path) -> Result<(FileImageSource, String), String> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("not a photo file: {}", file.display()))?;
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((FileImageSource::new(dir), file_name.to_string()))
}

/// Photo file names directly inside `dir`, sorted.
fn photo_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_photo(e.path()))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

fn config_sizes(config: &RetargetConfig) -> Vec<Size> {
    config
        .prerender
        .sizes
        .iter()
        .map(|&[w, h]| Size::from((w, h)))
        .collect()
}

/// `<stem>-<w>x<h>.png`
fn rendition_file_name(file_name: &str, target: Size) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    format!("{}-{}.png", stem, target)
}

/// Write `image` with the format implied by `path`'s extension.
fn save_image(image: &Image, path: &Path) -> std::io::Result<()> {
    let format = ImageFormat::from_path(path).map_err(std::io::Error::other)?;
    let pixels = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.pixels().to_rgb8()),
        _ => image.pixels().clone(),
    };
    pixels
        .save_with_format(path, format)
        .map_err(std::io::Error::other)
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid dimension {v:?} in {s:?}"))
    };
    Ok(Size::from((parse(w)?, parse(h)?)))
}
