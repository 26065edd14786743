use anyhow::Result;
use cancergrid::{
    cache::DatasetCache,
    config::Config,
    pipeline::{self, write_matrices_json, DenseMatrix, Metric, Observation, Sex},
    render::{render_matrix, Palette},
};
use std::{
    env,
    io::{self, BufRead, Write},
    path::Path,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    // ─── 2) load configuration ───────────────────────────────────────
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.validate()?;
    info!(
        categories = config.vocabulary.len(),
        years = config.years.len(),
        "configuration loaded"
    );

    // ─── 3) command loop ─────────────────────────────────────────────
    let cache = DatasetCache::new();
    print_help();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("i") | Some("incidence") => show_metric(&config, &cache, Metric::Incidence),
            Some("m") | Some("mortality") => show_metric(&config, &cache, Metric::Mortality),
            Some("r") | Some("reload") => {
                cache.invalidate();
                println!("cache cleared; sources will be re-read on the next draw");
            }
            Some("e") | Some("export") => {
                let path = parts.next().unwrap_or("matrices.json");
                match export(&config, &cache, Path::new(path)) {
                    Ok(count) => println!("wrote {} matrices to {}", count, path),
                    Err(e) => eprintln!("export failed: {:#}", e),
                }
            }
            Some("h") | Some("help") => print_help(),
            Some("q") | Some("quit") => break,
            Some(other) => println!("unknown command: {} (h for help)", other),
            None => {}
        }
    }
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  i | incidence      draw incidence matrices (male, female)");
    println!("  m | mortality      draw mortality matrices (male, female)");
    println!("  r | reload         drop cached sources, re-read on next draw");
    println!("  e | export [path]  write all matrices as JSON (default matrices.json)");
    println!("  q | quit");
}

/// Decode (through the cache) and reconcile one metric's source file.
/// `None` means the dataset is unavailable.
fn observations_for(
    config: &Config,
    cache: &DatasetCache,
    metric: Metric,
) -> Option<Vec<Observation>> {
    match metric {
        Metric::Incidence => cache
            .get_or_load(&config.incidence.path)
            .map(|table| pipeline::incidence_observations(&table, &config.incidence)),
        Metric::Mortality => cache
            .get_or_load(&config.mortality.path)
            .map(|table| pipeline::mortality_observations(&table, &config.mortality)),
    }
}

fn show_metric(config: &Config, cache: &DatasetCache, metric: Metric) {
    let source_path = match metric {
        Metric::Incidence => &config.incidence.path,
        Metric::Mortality => &config.mortality.path,
    };
    let Some(observations) = observations_for(config, cache, metric) else {
        println!("dataset unavailable: {}", source_path.display());
        return;
    };

    for (sex, palette) in [(Sex::Male, Palette::Blues), (Sex::Female, Palette::Reds)] {
        let matrix = DenseMatrix::build(
            &observations,
            metric,
            sex,
            &config.vocabulary,
            &config.years,
        );
        println!("{}", render_matrix(&matrix, palette));
    }
}

fn export(config: &Config, cache: &DatasetCache, path: &Path) -> Result<usize> {
    let mut matrices = Vec::new();
    for metric in [Metric::Incidence, Metric::Mortality] {
        let Some(observations) = observations_for(config, cache, metric) else {
            println!("dataset unavailable: skipping {}", metric.as_str());
            continue;
        };
        for sex in [Sex::Male, Sex::Female] {
            matrices.push(DenseMatrix::build(
                &observations,
                metric,
                sex,
                &config.vocabulary,
                &config.years,
            ));
        }
    }
    write_matrices_json(path, &matrices)?;
    Ok(matrices.len())
}
