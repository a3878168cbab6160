//!
//! canopy CLI binary
//! -----------------
//! Loads the default store plus any uploaded workbooks and prints dashboard
//! views as JSON, or applies one edit to the default store.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use canopy::config::DashboardConfig;
use canopy::edit::{export_table, ColumnKind, EditSource};
use canopy::engine::MetricOutcome;
use canopy::registry::UploadedSource;
use canopy::session::DashboardSession;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [flags] report [--dispensary <name>]\n  {program} [flags] tables\n  {program} [flags] show <qualified_table> [--columns a,b,c] [--frame]\n  {program} [flags] add-column <qualified_table> <column> <text|number|date|boolean>\n  {program} [flags] create-table <name>\n  {program} [flags] export <default|upload_file_name> <sheet> [--out <dir>]\n\nFlags:\n  --store <path>     Default store workbook (default: data/db.json, env CANOPY_DEFAULT_STORE)\n  --upload <path>    Uploaded workbook; repeat for several, precedence follows order\n  --config <path>    JSON config file; CANOPY_* environment variables override it\n  --today <date>     Day used for \"sales today\" (YYYY-MM-DD)\n  --frame            Print `show` output as a table instead of JSON\n  -h, --help         Show this help"
    );
}

fn take_value(args: &[String], i: usize, flag: &str, program: &str) -> String {
    if i + 1 >= args.len() {
        eprintln!("{} requires a value", flag);
        print_usage(program);
        std::process::exit(2);
    }
    args[i + 1].clone()
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut store: Option<PathBuf> = None;
    let mut uploads: Vec<PathBuf> = Vec::new();
    let mut config_path: Option<PathBuf> = None;
    let mut today: Option<String> = None;
    let mut dispensary: Option<String> = None;
    let mut columns: Option<String> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut as_frame = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--store" => { store = Some(take_value(&args, i, "--store", &program).into()); i += 2; continue; }
            "--upload" => { uploads.push(take_value(&args, i, "--upload", &program).into()); i += 2; continue; }
            "--config" => { config_path = Some(take_value(&args, i, "--config", &program).into()); i += 2; continue; }
            "--today" => { today = Some(take_value(&args, i, "--today", &program)); i += 2; continue; }
            "--dispensary" => { dispensary = Some(take_value(&args, i, "--dispensary", &program)); i += 2; continue; }
            "--columns" => { columns = Some(take_value(&args, i, "--columns", &program)); i += 2; continue; }
            "--out" => { out_dir = Some(take_value(&args, i, "--out", &program).into()); i += 2; continue; }
            "--frame" => { as_frame = true; i += 1; continue; }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => { positional.push(other.to_string()); i += 1; }
        }
    }

    let mut config = match &config_path {
        Some(p) => DashboardConfig::from_json_file(p)?,
        None => DashboardConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(p) = store { config.default_store = p; }

    let mut loaded = Vec::with_capacity(uploads.len());
    for p in &uploads {
        loaded.push(UploadedSource::from_path(p).with_context(|| format!("reading upload '{}'", p.display()))?);
    }
    info!(target: "canopy", "canopy starting: store='{}' uploads={}", config.default_store.display(), loaded.len());

    let mut session = DashboardSession::load(config, loaded);
    if let Some(d) = today {
        let day = chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").with_context(|| format!("--today must be YYYY-MM-DD, got '{}'", d))?;
        session = session.with_today(day);
    }
    for e in session.load_errors() {
        eprintln!("warning: {}", e);
    }

    let Some(command) = positional.first().cloned() else {
        print_usage(&program);
        std::process::exit(2);
    };
    let arg = |n: usize, what: &str| positional.get(n).cloned().ok_or_else(|| anyhow!("{} requires <{}>", command, what));

    match command.as_str() {
        "report" => {
            let report = session.report(dispensary.as_deref());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "tables" => {
            println!("{}", serde_json::to_string_pretty(&session.table_summaries())?);
        }
        "show" => {
            let qualified = arg(1, "qualified_table")?;
            let wanted: Vec<String> = columns
                .map(|c| c.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_default();
            let wanted: Vec<&str> = wanted.iter().map(String::as_str).collect();
            match session.custom_view(&qualified, &wanted) {
                MetricOutcome::Available(table) if as_frame => println!("{}", table.to_frame()?),
                outcome => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
        }
        "add-column" => {
            let qualified = arg(1, "qualified_table")?;
            let column = arg(2, "column")?;
            let kind: ColumnKind = arg(3, "kind")?.parse()?;
            session.add_column(&qualified, &column, kind)?;
            println!("added column '{}' to {}", column, qualified);
        }
        "create-table" => {
            let name = arg(1, "name")?;
            session.create_table(&name)?;
            println!("created table '{}'", name);
        }
        "export" => {
            let source = arg(1, "source")?;
            let sheet = arg(2, "sheet")?;
            let source = if source == "default" { EditSource::DefaultStore } else { EditSource::Upload(source) };
            let copy = session.editor().open(&source, &sheet)?;
            let download = export_table(&copy.sheet, &copy.table)?;
            let target = out_dir.unwrap_or_else(|| PathBuf::from(".")).join(&download.file_name);
            std::fs::write(&target, &download.bytes).with_context(|| format!("writing '{}'", target.display()))?;
            println!("wrote {}", target.display());
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&program);
            std::process::exit(2);
        }
    }
    Ok(())
}
