//! Layer lifecycle controller
//!
//! Drives one layer through a single build invocation:
//!
//! ```text
//! Fresh -> Evaluated -> Reused ------------------------> Committed
//!                    \-> Rebuilding (reset, install, SBOM, commit) -> Committed
//! ```
//!
//! The reuse path touches neither the filesystem nor the metadata. The
//! rebuild path writes the cache key last, so a failure anywhere before it
//! leaves a layer that presents as fresh on the next invocation.

use crate::config::{BuildConfig, BuildpackInfo, DESCRIPTOR_FILE};
use crate::error::{DeplayerError, DeplayerResult};
use crate::layer::{Layer, LayerStore};
use crate::lifecycle::decision::{should_reuse, CACHE_KEY};
use crate::manager::DependencyManager;
use crate::plan::BuildPlan;
use crate::provenance::{
    record_provenance, BuildMetadata, LaunchMetadata, SbomFormat, SbomGenerator,
};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// States a layer passes through during one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Loaded from the store, nothing decided yet
    Fresh,
    /// Reuse decision made
    Evaluated,
    /// Previous installation kept
    Reused,
    /// Reset and reinstalling
    Rebuilding,
    /// Final state handed back to the pipeline
    Committed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fresh => "fresh",
            Self::Evaluated => "evaluated",
            Self::Reused => "reused",
            Self::Rebuilding => "rebuilding",
            Self::Committed => "committed",
        };
        write!(f, "{}", name)
    }
}

/// Which branch the invocation took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Reused,
    Rebuilt,
}

/// Everything an invocation needs from the pipeline
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub buildpack: BuildpackInfo,
    /// Buildpack directory containing `buildpack.toml`
    pub cnb_path: PathBuf,
    /// Platform directory (bindings, env)
    pub platform_path: PathBuf,
    pub stack: String,
    pub plan: BuildPlan,
    pub layers: LayerStore,
}

/// Result of one invocation, handed back to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub layers: Vec<Layer>,
    pub build: BuildMetadata,
    pub launch: LaunchMetadata,
    pub decision: Decision,
}

/// Lifecycle controller for one dependency layer
pub struct Build<'a> {
    dependencies: &'a dyn DependencyManager,
    sbom_generator: &'a dyn SbomGenerator,
    config: BuildConfig,
    dependency_id: String,
    layer_name: String,
    priorities: Vec<String>,
}

impl<'a> Build<'a> {
    /// Create a controller installing `dependency_id` into a layer of the same name
    pub fn new(
        dependencies: &'a dyn DependencyManager,
        sbom_generator: &'a dyn SbomGenerator,
        config: BuildConfig,
        dependency_id: impl Into<String>,
    ) -> Self {
        let dependency_id = dependency_id.into();
        Self {
            dependencies,
            sbom_generator,
            config,
            layer_name: dependency_id.clone(),
            dependency_id,
            priorities: Vec::new(),
        }
    }

    /// Install into a layer with a different name
    pub fn with_layer_name(mut self, name: impl Into<String>) -> Self {
        self.layer_name = name.into();
        self
    }

    /// Prefer plan entries whose `version-source` appears earlier in `priorities`
    pub fn with_priorities(mut self, priorities: Vec<String>) -> Self {
        self.priorities = priorities;
        self
    }

    /// Run one invocation against `context`
    pub async fn run(&self, context: &BuildContext) -> DeplayerResult<BuildOutcome> {
        info!("{} {}", context.buildpack.name, context.buildpack.version);

        let mut layer = context.layers.get(&self.layer_name).await?;
        let mut state = LifecycleState::Fresh;
        debug!("Layer {} is {}", layer.name, state);

        let priorities: Vec<&str> = self.priorities.iter().map(String::as_str).collect();
        let entry = context
            .plan
            .resolve(&self.dependency_id, &priorities)
            .ok_or_else(|| DeplayerError::PlanEntryMissing(self.dependency_id.clone()))?;
        let version = entry.requested_version();

        let dependency = self
            .dependencies
            .resolve(
                &context.cnb_path.join(DESCRIPTOR_FILE),
                &entry.name,
                version,
                &context.stack,
            )
            .await?;
        debug!("Resolved {} to {}", version, dependency);

        let bom = self
            .dependencies
            .generate_bill_of_materials(std::slice::from_ref(&dependency));
        let roles = context.plan.merge_layer_types(&self.dependency_id);
        let (build, launch) = record_provenance(bom, roles);

        let reuse = should_reuse(&layer.metadata, &dependency);
        transition(&mut state, LifecycleState::Evaluated);

        if reuse {
            transition(&mut state, LifecycleState::Reused);
            info!("Reusing cached layer {}", layer.path.display());

            layer.roles = roles;

            transition(&mut state, LifecycleState::Committed);
            return Ok(BuildOutcome {
                layers: vec![layer],
                build,
                launch,
                decision: Decision::Reused,
            });
        }

        transition(&mut state, LifecycleState::Rebuilding);
        info!("Executing build process");

        layer.reset().await?;
        layer.roles = roles;

        info!("  Installing {} {}", dependency.display_name(), dependency.version);
        let ((), duration) = timed(self.dependencies.deliver(
            &dependency,
            &context.cnb_path,
            &layer.path,
            &context.platform_path,
        ))
        .await?;
        info!("    Completed in {}ms", duration.as_millis());

        if self.config.disable_sbom {
            info!("  Skipping SBOM generation for {}", dependency.display_name());
        } else {
            info!("  Generating SBOM for {}", layer.path.display());
            let (sbom, duration) = timed(
                self.sbom_generator
                    .generate_from_dependency(&dependency, &layer.path),
            )
            .await?;
            info!("    Completed in {}ms", duration.as_millis());

            let formats = &context.buildpack.sbom_formats;
            info!("  Writing SBOM in the following format(s): {}", format_list(formats));
            layer.sbom = sbom.in_formats(formats)?;
        }

        layer.metadata = toml::Table::from_iter([(
            CACHE_KEY.to_string(),
            toml::Value::String(dependency.content_hash().to_string()),
        )]);

        transition(&mut state, LifecycleState::Committed);
        Ok(BuildOutcome {
            layers: vec![layer],
            build,
            launch,
            decision: Decision::Rebuilt,
        })
    }
}

fn transition(state: &mut LifecycleState, next: LifecycleState) {
    debug!("Layer lifecycle: {} -> {}", state, next);
    *state = next;
}

async fn timed<T, F>(future: F) -> DeplayerResult<(T, Duration)>
where
    F: Future<Output = DeplayerResult<T>>,
{
    let start = Instant::now();
    let value = future.await?;
    Ok((value, start.elapsed()))
}

fn format_list(formats: &[SbomFormat]) -> String {
    if formats.is_empty() {
        return "none".to_string();
    }
    formats
        .iter()
        .map(SbomFormat::media_type)
        .collect::<Vec<_>>()
        .join(", ")
}
