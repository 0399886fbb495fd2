mod commands;
mod repl;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use foundation::LayerKind;
use formats::{OptionsManifest, ViewerQuery};
use orchestrator::{CityModelPrompt, NoSubstitute, Session, acquire_city_model};
use runtime::EventBus;
use scene::{HeadlessRenderer, VisibilityConfig};
use streaming::{
    DEFAULT_WORKERS, FilesystemSource, HttpSource, LoadError, LoaderConfig, ResourceSource,
    build_loader,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Loads design options and reports what the viewer shows")]
struct Args {
    /// Options manifest, resolved against the data root or base URL
    #[arg(long, default_value = "options.json")]
    manifest: String,

    /// Local directory holding the datasets
    #[arg(long, env = "VIEWER_DATA_ROOT", default_value = ".")]
    data_root: String,

    /// Fetch datasets over HTTP from this base URL instead of the data root
    #[arg(long)]
    base_url: Option<String>,

    /// City model path, overriding the manifest
    #[arg(long)]
    city_model: Option<String>,

    /// Viewer query, e.g. `option=1&option=3&ignoreData=wind`
    #[arg(long)]
    query: Option<String>,

    /// Option to load (name or number); repeatable
    #[arg(long)]
    option: Vec<String>,

    /// Layer to leave out entirely; repeatable
    #[arg(long)]
    ignore_data: Vec<String>,

    /// Number of loader workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// One thread per request instead of a bounded pool
    #[arg(long)]
    unbounded: bool,

    /// Option selected once loading completes
    #[arg(long)]
    select: Option<String>,

    /// Layer toggled off initially; repeatable
    #[arg(long)]
    hide: Vec<String>,

    /// Read commands from stdin after loading
    #[arg(long)]
    interactive: bool,
}

/// Asks on the terminal for another city model when one fails to load.
struct StdinPrompt;

impl CityModelPrompt for StdinPrompt {
    fn substitute(&mut self, failed: &str, error: &LoadError) -> Option<String> {
        eprint!("city model {failed} failed ({error}); another path, or empty to skip: ");
        io::stderr().flush().ok()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let line = line.trim();
        (!line.is_empty()).then(|| line.to_string())
    }
}

fn build_source(args: &Args) -> Result<Arc<dyn ResourceSource>, Box<dyn std::error::Error>> {
    let source: Arc<dyn ResourceSource> = match &args.base_url {
        Some(url) => Arc::new(HttpSource::new(url.clone())?),
        None => Arc::new(FilesystemSource::new(&args.data_root)),
    };
    Ok(source)
}

fn parse_layers(keys: &[String]) -> Result<Vec<LayerKind>, Box<dyn std::error::Error>> {
    keys.iter()
        .map(|key| {
            LayerKind::from_key(key).ok_or_else(|| format!("unknown layer `{key}`").into())
        })
        .collect()
}

fn real_main(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = build_source(&args)?;
    info!(source = %source.describe(), "data source");

    let mut manifest = OptionsManifest::from_json_slice(&source.fetch(&args.manifest)?)?;
    let mut query = match &args.query {
        Some(q) => ViewerQuery::parse(q)?,
        None => ViewerQuery::default(),
    };
    for option in &args.option {
        query.push_option(option);
    }
    for key in &args.ignore_data {
        query.push_ignored(key)?;
    }
    let initial = manifest.apply_query(&query)?;
    info!(options = ?manifest.option_names(), selected = %initial, "manifest ready");

    let loader_config = if args.unbounded {
        LoaderConfig::Unbounded
    } else {
        LoaderConfig::Bounded {
            workers: args.workers,
        }
    };
    let mut loader = build_loader(loader_config, Arc::clone(&source))?;

    let mut events = EventBus::new();
    let city_path = args.city_model.clone().or(manifest.city_model_path.clone());
    let mut prompt: Box<dyn CityModelPrompt> = if args.interactive {
        Box::new(StdinPrompt)
    } else {
        Box::new(NoSubstitute)
    };
    let city = acquire_city_model(loader.as_mut(), city_path.as_deref(), prompt.as_mut(), &mut events)?;

    let selected = args
        .select
        .as_deref()
        .map(commands::option_name)
        .unwrap_or(initial);
    let mut config = VisibilityConfig::new(selected);
    let hidden = parse_layers(&args.hide)?;
    for layer in LayerKind::ALL {
        if query.is_ignored(layer) || hidden.contains(&layer) {
            config.set_layer(layer, false);
        }
    }

    let mut session = Session::new(&manifest, city, loader, HeadlessRenderer::new(), config)
        .with_events(events);
    session.run()?;
    info!(metrics = ?session.loader_metrics(), "loading finished");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in session.events().loading_log() {
        writeln!(out, "{line}")?;
    }
    repl::write_status(&session, &mut out)?;

    if args.interactive {
        run_interactive(&mut session, &query.ignore_data, &mut out)?;
    }
    Ok(())
}

fn run_interactive(
    session: &mut Session<HeadlessRenderer>,
    ignored: &[LayerKind],
    out: &mut impl Write,
) -> io::Result<()> {
    let stdin = io::stdin();
    repl::run_repl(session, ignored, stdin.lock(), out)
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match real_main(Args::parse()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
