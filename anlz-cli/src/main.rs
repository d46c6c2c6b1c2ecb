//! Command-line renderer for ANLZ preview waveforms

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use anlz_core::{decode_color_preview, decode_preview, read_anlz_file, AnlzFile, Raster, RenderConfig};

#[derive(Parser)]
#[command(name = "anlz")]
#[command(about = "Render Rekordbox ANLZ preview waveforms to PNG")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the PWV4 color preview (usually in ANLZ0000.EXT)
    ColorPreview {
        file: PathBuf,

        #[command(flatten)]
        render: RenderArgs,

        /// Also write one image per raw channel
        #[arg(long)]
        channels: bool,
    },

    /// Decode the PWAV/PWV2 preview pair (usually in ANLZ0000.DAT)
    Preview {
        file: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// List the tags in an ANLZ file
    Tags {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Stored columns to render (1200 for PWV4, 400 for PWAV)
    #[arg(short, long)]
    width: Option<usize>,

    /// Divide bar heights by this factor
    #[arg(long, default_value = "1")]
    height_scale: usize,

    /// Draw every Nth stored column
    #[arg(long, default_value = "1")]
    width_scale: usize,

    /// Directory for the PNG files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

impl RenderArgs {
    fn config(&self, defaults: RenderConfig, file: &Path) -> RenderConfig {
        RenderConfig {
            width: self.width.unwrap_or(defaults.width),
            height_scale: self.height_scale,
            width_scale: self.width_scale,
            ..defaults
        }
        .with_input_path(file)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::ColorPreview { file, render, channels } => {
            let data = load(&file)?;
            let config = render.config(RenderConfig::for_color_preview(), &file);
            let written = render_color_preview(&data, &config, &render.out_dir, channels)?;
            report(&written);
        }
        Commands::Preview { file, render } => {
            let data = load(&file)?;
            let config = render.config(RenderConfig::for_preview(), &file);
            let written = render_preview(&data, &config, &render.out_dir)?;
            report(&written);
        }
        Commands::Tags { file, json } => {
            let data = load(&file)?;
            let anlz = AnlzFile::parse(&data)
                .with_context(|| format!("Cannot parse tags of {:?}", file))?;
            print_tags(&anlz, json)?;
        }
    }
    Ok(())
}

fn load(file: &Path) -> anyhow::Result<Vec<u8>> {
    read_anlz_file(file).with_context(|| format!("Cannot read {:?}", file))
}

fn render_color_preview(
    data: &[u8],
    config: &RenderConfig,
    out_dir: &Path,
    channels: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let preview = decode_color_preview(data, config)?;

    let mut rasters = vec![
        ("color".to_string(), preview.color_raster()),
        ("blue".to_string(), preview.blue_raster()),
    ];
    if channels {
        for (i, raster) in preview.channel_rasters().into_iter().enumerate() {
            rasters.push((format!("channel-{}", i), raster));
        }
    }
    write_rasters(out_dir, &rasters)
}

fn render_preview(data: &[u8], config: &RenderConfig, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let preview = decode_preview(data, config)?;
    let rasters = [
        ("preview".to_string(), preview.fine_raster()),
        ("tiny-preview".to_string(), preview.coarse_raster()),
    ];
    write_rasters(out_dir, &rasters)
}

fn write_rasters(out_dir: &Path, rasters: &[(String, Raster)]) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Cannot create output directory {:?}", out_dir))?;

    let mut written = Vec::with_capacity(rasters.len());
    for (name, raster) in rasters {
        let path = out_dir.join(format!("{}.png", name));
        raster
            .save_png(&path)
            .with_context(|| format!("Cannot write {:?}", path))?;
        info!("Wrote {}x{} raster to {:?}", raster.width(), raster.height(), path);
        written.push(path);
    }
    Ok(written)
}

fn report(written: &[PathBuf]) {
    for path in written {
        println!("✓ {}", path.display());
    }
}

fn print_tags(anlz: &AnlzFile, json: bool) -> anyhow::Result<()> {
    let summaries = anlz.summaries();
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("File length: {} bytes", anlz.header.len_file);
    println!("\nTags:");
    for tag in &summaries {
        println!(
            "  {:#08x}  {}  {:<18} header={:<3} length={}",
            tag.offset, tag.code, tag.name, tag.len_header, tag.len_tag
        );
    }
    Ok(())
}
