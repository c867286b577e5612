mod downloads;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use rnaview_core::svg::decode_base64;
use rnaview_core::{
    ControllerConfig, HttpPredictionService, Presence, PredictionController, PredictionRequest,
    RenderErrorPolicy, UiState, ViewState, Visualization,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::downloads::DirectoryDownloads;

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PresenceArg {
    /// Key present and not null; an MFE of 0 is accepted
    Strict,
    /// Falsy values count as missing
    Truthy,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RenderErrorsArg {
    Degrade,
    Banner,
}

/// RNA secondary structure prediction client
#[derive(Parser)]
#[command(name = "rnaview", version)]
struct Cli {
    /// RNA sequence to fold (e.g. GGGAAACCC)
    #[arg(short, long)]
    sequence: String,

    /// Prediction endpoint (default: http://localhost:5000/predict)
    #[arg(short, long)]
    url: Option<String>,

    /// Extra form field sent with the request, as name=value. Repeatable.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// Request timeout in seconds (default: wait for the transport)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// JSON controller configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How response fields are checked for presence
    #[arg(long, value_enum)]
    presence: Option<PresenceArg>,

    /// What to do with an unusable visualization payload
    #[arg(long, value_enum)]
    render_errors: Option<RenderErrorsArg>,

    /// Directory to save the visualization into (default: don't save)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// More logging (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got `{s}`"))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ControllerConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ControllerConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.endpoint = url.clone();
    }
    if cli.timeout.is_some() {
        config.timeout_secs = cli.timeout;
    }
    if let Some(p) = cli.presence {
        config.presence = match p {
            PresenceArg::Strict => Presence::Strict,
            PresenceArg::Truthy => Presence::Truthy,
        };
    }
    if let Some(r) = cli.render_errors {
        config.render_errors = match r {
            RenderErrorsArg::Degrade => RenderErrorPolicy::Degrade,
            RenderErrorsArg::Banner => RenderErrorPolicy::Banner,
        };
    }
    Ok(config)
}

/// Write the displayed visualization into `dir`.
fn save_visualization(
    controller: &PredictionController<ViewState>,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let Some(response) = controller.response() else {
        return Ok(Vec::new());
    };

    let mut written = Vec::new();
    match &response.visualization {
        Visualization::Svg(_) => {
            let mut host = DirectoryDownloads::new(dir);
            controller
                .download_current_visualization(&mut host)
                .context("failed to save SVG")?;
            written.extend_from_slice(host.saved());
        }
        Visualization::Raster(plot) => {
            written.push(write_png(dir, plot)?);
        }
        Visualization::Graph(_) => {
            written.push(write_graph(dir, controller.surface())?);
        }
        Visualization::RasterWithGraph { plot, .. } => {
            written.push(write_png(dir, plot)?);
            written.push(write_graph(dir, controller.surface())?);
        }
    }
    Ok(written)
}

fn write_png(dir: &Path, plot: &str) -> Result<PathBuf> {
    let path = dir.join("rna_structure.png");
    let bytes = decode_base64(plot).context("plot payload is not valid base64")?;
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn write_graph(dir: &Path, view: &ViewState) -> Result<PathBuf> {
    let path = dir.join("rna_graph.svg");
    let markup = view.secondary.as_deref().unwrap_or_default();
    fs::write(&path, markup).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn print_view(view: &ViewState, format: Format) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut handle, view)?;
            writeln!(handle)?;
        }
        Format::Text => {
            writeln!(handle, "Sequence:  {}", view.sequence)?;
            writeln!(handle, "Structure: {}", view.structure)?;
            writeln!(handle, "MFE:       {} kcal/mol", view.mfe)?;
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli)?;
    let service = HttpPredictionService::from_config(&config)
        .context("failed to set up HTTP client")?;
    info!(endpoint = %service.endpoint(), "using prediction service");

    let mut request = PredictionRequest::new(cli.sequence.clone());
    for (name, value) in &cli.fields {
        request = request.with_field(name.clone(), value.clone());
    }

    let mut controller = PredictionController::new(ViewState::default(), config);
    controller.submit(&service, request).await;

    if controller.state() != UiState::Success {
        let view = controller.surface();
        if let Format::Json = cli.format {
            print_view(view, cli.format)?;
        }
        eprintln!("error: {}", view.error_message);
        return Ok(false);
    }

    print_view(controller.surface(), cli.format)?;
    if let Some(dir) = &cli.output_dir {
        for path in save_visualization(&controller, dir)? {
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
