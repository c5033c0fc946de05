//! Subcommand implementations

pub mod fetch;
pub mod run;
pub mod target;

use launchpad_core::Pipeline;

/// Log the startup lines shared by `run` and `fetch`.
fn log_start(pipeline: &Pipeline) {
    let release = pipeline.release();
    tracing::info!("start {}", release.display_name);
    tracing::info!(
        "working at directory {}",
        pipeline.config().work_dir(release).display()
    );
    tracing::debug!(
        "release metadata at {}",
        pipeline.config().release_url(release)
    );
}
