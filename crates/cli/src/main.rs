//! interpose-demo: a slow service behind caching and logging interceptors.
//!
//! Calls each slow member twice per cache lifetime. The call count printed
//! after every pass only moves when the cache missed:
//!
//! ```text
//! calls: 0
//! round 1: calls = 2
//! round 1: calls = 2
//! round 2: calls = 4
//! round 2: calls = 4
//! ```

mod commands;
mod interceptors;
mod service;

use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use interpose_proxy::{InterceptorConfig, ProxyFactory};

use commands::{build_cli, matches_to_action, Action, DemoOptions};
use interceptors::ResultCache;
use service::{SleepyService, SlowService};

fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    match matches_to_action(&matches) {
        Action::InitConfig(path) => init_config(&path),
        Action::Run(options) => {
            init_logging(&options.log);
            run(&options)
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, InterceptorConfig::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn build_factory(
    options: &DemoOptions,
    cache: &Arc<ResultCache>,
) -> anyhow::Result<ProxyFactory<dyn SlowService>> {
    let catalog = interceptors::catalog(cache);
    let factory = match &options.config {
        Some(path) => {
            let config = InterceptorConfig::from_file(path)?;
            info!(path = %path.display(), "using interceptor config");
            ProxyFactory::<dyn SlowService>::configured(catalog, &config)?
        }
        None => ProxyFactory::<dyn SlowService>::declarative(catalog)?,
    };
    Ok(factory)
}

fn run(options: &DemoOptions) -> anyhow::Result<()> {
    let cache = Arc::new(ResultCache::new(options.ttl));
    let factory = build_factory(options, &cache)?;
    let service = factory.generate_proxy(Arc::new(SleepyService::new(options.delay)));

    println!("calls: {}", service.get_calls()?);
    for round in 1..=options.rounds {
        for _ in 0..2 {
            service.sleep_1s()?;
            service.sleep_2s()?;
            println!("round {}: calls = {}", round, service.get_calls()?);
        }
        if round < options.rounds {
            thread::sleep(options.ttl + options.delay);
        }
    }
    Ok(())
}
