//! Inspect command - show persisted layer state

use crate::cli::args::{InspectArgs, OutputFormat};
use crate::error::DeplayerResult;
use crate::layer::{Layer, LayerStore};
use crate::lifecycle::CACHE_KEY;
use crate::provenance::SbomFormat;
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct LayerJson {
    name: String,
    path: String,
    build: bool,
    launch: bool,
    cache: bool,
    cache_sha: Option<String>,
    sbom: Vec<String>,
}

/// Execute the inspect command
pub async fn execute(args: InspectArgs) -> DeplayerResult<()> {
    let store = LayerStore::new(&args.layers);
    let layer = store.get(&args.layer_name).await?;

    let sbom_formats: Vec<SbomFormat> = SbomFormat::all()
        .iter()
        .copied()
        .filter(|f| layer.sbom_path(*f).exists())
        .collect();

    match args.format {
        OutputFormat::Table => print_table(&layer, &sbom_formats),
        OutputFormat::Json => print_json(&layer, &sbom_formats)?,
    }

    Ok(())
}

fn cache_sha(layer: &Layer) -> Option<&str> {
    layer.metadata.get(CACHE_KEY).and_then(toml::Value::as_str)
}

fn flag(value: bool) -> String {
    if value {
        style("yes").green().to_string()
    } else {
        style("no").dim().to_string()
    }
}

fn print_table(layer: &Layer, sbom_formats: &[SbomFormat]) {
    println!("Layer: {}", layer.name);
    println!("Path:  {}", layer.path.display());
    println!();

    println!("{:<10} {}", "build", flag(layer.roles.build));
    println!("{:<10} {}", "launch", flag(layer.roles.launch));
    println!("{:<10} {}", "cache", flag(layer.roles.cache));

    match cache_sha(layer) {
        Some(sha) => println!("{:<10} {}", CACHE_KEY, sha),
        None => println!("{:<10} {}", CACHE_KEY, style("not installed").yellow()),
    }

    if sbom_formats.is_empty() {
        println!("{:<10} {}", "sbom", style("none").dim());
    } else {
        for format in sbom_formats {
            println!("{:<10} {}", "sbom", layer.sbom_path(*format).display());
        }
    }
}

fn print_json(layer: &Layer, sbom_formats: &[SbomFormat]) -> DeplayerResult<()> {
    let json = LayerJson {
        name: layer.name.clone(),
        path: layer.path.display().to_string(),
        build: layer.roles.build,
        launch: layer.roles.launch,
        cache: layer.roles.cache,
        cache_sha: cache_sha(layer).map(str::to_string),
        sbom: sbom_formats.iter().map(|f| f.media_type().to_string()).collect(),
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
