//! Build command - run one layer build invocation

use crate::cli::args::BuildArgs;
use crate::config::{BuildConfig, BuildpackDescriptor, DESCRIPTOR_FILE};
use crate::error::DeplayerResult;
use crate::layer::LayerStore;
use crate::lifecycle::{Build, BuildContext, Decision};
use crate::manager::CatalogManager;
use crate::plan::BuildPlan;
use crate::provenance::FilesystemSbomGenerator;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs) -> DeplayerResult<()> {
    // Validated before anything touches the layers directory
    let config = BuildConfig::from_env()?;

    let descriptor = BuildpackDescriptor::from_file(&args.buildpack.join(DESCRIPTOR_FILE)).await?;
    let plan = BuildPlan::from_file(&args.plan).await?;
    debug!("Build plan has {} entries", plan.entries.len());

    let context = BuildContext {
        buildpack: descriptor.buildpack,
        cnb_path: args.buildpack,
        platform_path: args.platform,
        stack: args.stack,
        plan,
        layers: LayerStore::new(args.layers),
    };

    let manager = CatalogManager::new();
    let sbom_generator = FilesystemSbomGenerator::new();

    let mut build = Build::new(&manager, &sbom_generator, config, &args.dependency)
        .with_priorities(args.version_source_priority);
    if let Some(name) = args.layer_name {
        build = build.with_layer_name(name);
    }

    let outcome = build.run(&context).await?;
    context.layers.commit_outcome(&outcome).await?;

    let verb = match outcome.decision {
        Decision::Reused => "reused",
        Decision::Rebuilt => "rebuilt",
    };
    for layer in &outcome.layers {
        println!("Layer {} {} ({})", layer.name, verb, layer.path.display());
    }

    Ok(())
}
