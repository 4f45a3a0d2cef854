use gravsim::{ScenarioConfig, Scenario};
use gravsim::{bench_gravity, bench_step};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario YAML, looked up under `scenarios/` unless the path exists as given
    #[arg(short, default_value = "two_jupiters.yaml")]
    file_name: String,

    /// Write the final state as snapshot JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the direct-vs-tree benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let given = PathBuf::from(file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };

    let scenario_cfg = ScenarioConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_gravity();
        bench_step();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(&scenario_cfg)?;

    let steps = scenario.run()?;
    let space = &scenario.space;
    info!(
        "finished after {} steps: t = {:.6e}, {} bodies, momentum = ({:.6e}, {:.6e})",
        steps,
        space.time(),
        space.len(),
        space.momentum().x,
        space.momentum().y
    );

    if let Some(path) = args.output {
        fs::write(&path, space.get_state().to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("snapshot written to {}", path.display());
    }

    Ok(())
}
