//! Enables trace logging for Atoll to some sink

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Filtered;
use tracing_subscriber::fmt::Layer as LayerFmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use super::conf::{Conf, Tracing};

/// Setup local tracing to stdout
fn setup_local(conf: &Tracing) -> Filtered<LayerFmt<Registry>, LevelFilter, Registry> {
    tracing_subscriber::fmt::layer().with_filter(conf.level.to_filter())
}

/// Setup basic tracing
///
/// # Arguments
///
/// * `conf` - The Atoll config to pull tracing settings from
pub fn setup(conf: &Conf) {
    // setup our local tracer
    let local = setup_local(&conf.tracing);
    // setup our registry
    tracing_subscriber::registry().with(local).try_init().unwrap();
}
