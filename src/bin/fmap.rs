use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use fiscal_map::render::export;
use fiscal_map::{
    ColorDomain, GeometryClient, GeometrySource, MapConfig, MapController, MapScene, RegionLookup,
    RegionRef, metrics,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Far enough past every transition that exports show the settled state.
const SETTLED: f64 = 1.0e6;

#[derive(Parser, Debug)]
#[command(
    name = "fmap",
    version,
    about = "Render, search & inspect choropleth maps of per-region impacts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a map to SVG or PNG (optionally with a selected region).
    Render(RenderArgs),
    /// List regions whose name contains a query.
    Search(SearchArgs),
    /// Print the colour domain of a metric feed.
    Domain(DomainArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// GeoJSON FeatureCollection: a file path or an http(s) URL.
    #[arg(short, long)]
    geometry: String,
    /// Metric feed (.csv or .json).
    #[arg(short, long)]
    metrics: Option<PathBuf>,
    /// JSON configuration file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Feature property holding the region identifier.
    #[arg(long)]
    id_property: Option<String>,
    /// Feature property holding the region display name.
    #[arg(long)]
    name_property: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Output image (.svg or .png).
    #[arg(short, long)]
    out: PathBuf,
    /// Highlight and zoom to the region with this identifier.
    #[arg(long)]
    select: Option<String>,
    /// Highlight the first region matching this query.
    #[arg(long, conflicts_with = "select")]
    search: Option<String>,
    /// Zoom-in (positive) or zoom-out (negative) button presses applied last.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    zoom_steps: i32,
    /// Period label to display from the metrics' `value_<period>` columns.
    #[arg(long)]
    period: Option<String>,
    /// Surface width in pixels.
    #[arg(long)]
    width: Option<f64>,
    /// Surface height in pixels.
    #[arg(long)]
    height: Option<f64>,
    /// Legend title.
    #[arg(long)]
    title: Option<String>,
    /// Attribution text (empty string to hide it).
    #[arg(long)]
    attribution: Option<String>,
    /// Also save the region-joined metrics (.csv or .json), zero-filled where missing.
    #[arg(long)]
    save_metrics: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Case-insensitive name fragment.
    query: String,
    /// Maximum number of results.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct DomainArgs {
    /// Metric feed (.csv or .json).
    #[arg(short, long)]
    metrics: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Search(args) => cmd_search(args),
        Command::Domain(args) => cmd_domain(args),
    }
}

fn load_config(source: &SourceArgs) -> Result<MapConfig> {
    let mut config = match &source.config {
        Some(path) => MapConfig::load_from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => MapConfig::default(),
    };
    if let Some(p) = &source.id_property {
        config.feed.id_property = p.clone();
    }
    if let Some(p) = &source.name_property {
        config.feed.name_property = p.clone();
    }
    Ok(config)
}

fn build_scene(source: &SourceArgs, config: &MapConfig) -> Result<MapScene> {
    let client = GeometryClient::new(config.feed.clone())?;
    let geometry = GeometrySource::parse(&source.geometry);
    let regions = client
        .load(&geometry)
        .with_context(|| format!("loading geometry from {geometry}"))?;
    let mut scene = MapScene::new(&regions, config);
    if let Some(path) = &source.metrics {
        let rows = metrics::load(path).with_context(|| format!("reading metrics {}", path.display()))?;
        scene.set_metrics(rows, 0.0);
    }
    Ok(scene)
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    if let Some(w) = args.width {
        config.surface.width = w;
    }
    if let Some(h) = args.height {
        config.surface.height = h;
    }
    if let Some(t) = &args.title {
        config.style.legend_title = t.clone();
    }
    if let Some(a) = &args.attribution {
        config.style.attribution = a.clone();
    }

    let mut scene = build_scene(&args.source, &config)?;
    if let Some(period) = &args.period {
        let known = scene
            .period()
            .is_some_and(|p| p.periods.iter().any(|x| x == period));
        if !known {
            bail!("unknown period `{period}`");
        }
        scene.select_period(period, 0.0);
    }

    // The CLI plays the parent: the controller reports intent, we answer with a sync.
    let requested: Rc<RefCell<Option<Option<RegionRef>>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&requested);
    let mut controller = MapController::controlled(
        &config,
        Box::new(move |r: Option<&RegionRef>| *sink.borrow_mut() = Some(r.cloned())),
    );

    if let Some(id) = &args.select {
        let Some(region) = scene.region_ref(id) else {
            bail!("no region with id `{id}`");
        };
        controller.sync_selection(&scene, Some(&region), 0.0);
    } else if let Some(query) = &args.search {
        controller.set_search_query(&scene, query);
        if !controller.pick_search_result(&scene, 0, 0.0) {
            bail!("no region matches `{query}`");
        }
        let selection = requested.borrow_mut().take();
        if let Some(selection) = selection {
            controller.sync_selection(&scene, selection.as_ref(), 0.0);
        }
    }

    for _ in 0..args.zoom_steps.max(0) {
        controller.zoom_in(0.0);
    }
    for _ in 0..(-args.zoom_steps).max(0) {
        controller.zoom_out(0.0);
    }
    controller.tick(SETTLED);

    export::render_to_file(&scene, &controller, SETTLED, &args.out)?;
    eprintln!("Wrote map to {}", args.out.display());
    if let Some(region) = controller.highlighted() {
        eprintln!("Highlighted {} ({})", region.name, region.id);
    }

    if let Some(path) = &args.save_metrics {
        let joined: Vec<_> = scene
            .regions()
            .iter()
            .map(|r| scene.metric_snapshot(&r.region))
            .collect();
        save_metrics(&joined, path)?;
        eprintln!("Saved {} rows to {}", joined.len(), path.display());
    }
    Ok(())
}

fn save_metrics(rows: &[fiscal_map::RegionMetric], path: &Path) -> Result<()> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => metrics::save_json(rows, path)?,
        Some("csv") | None => metrics::save_csv(rows, path)?,
        Some(other) => bail!("unsupported format: {other}"),
    }
    Ok(())
}

fn cmd_search(args: SearchArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    if let Some(limit) = args.limit {
        config.search.limit = limit;
    }
    let scene = build_scene(&args.source, &config)?;
    let results = scene.search(&args.query);
    if results.is_empty() {
        eprintln!("No regions match `{}`", args.query);
    }
    for r in &results {
        println!("{}\t{}", r.id, scene.result_label(r));
    }
    Ok(())
}

fn cmd_domain(args: DomainArgs) -> Result<()> {
    let rows = metrics::load(&args.metrics)
        .with_context(|| format!("reading metrics {}", args.metrics.display()))?;
    let values: Vec<f64> = rows.iter().map(|m| m.value).collect();
    let domain = ColorDomain::from_values(&values);
    println!(
        "min={} max={} sign={}",
        domain.min,
        domain.max,
        domain.sign.label()
    );
    Ok(())
}
