use anyhow::Context;
use argh::FromArgs;
use posecfg::{common::*, Config};

/// Validates a pose-training run configuration.
#[derive(FromArgs)]
struct Args {
    /// the configuration file.
    #[argh(
        option,
        default = "PathBuf::from(\"configurations/default.jsonc\")"
    )]
    configuration: PathBuf,
    /// print the bound configuration as pretty JSON.
    #[argh(switch)]
    dump: bool,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args: Args = argh::from_env();

    let config = Config::open(&args.configuration)
        .with_context(|| format!("cannot load {}", args.configuration.display()))?;

    info!("environment: {}", config.environment.name);
    info!(
        "model: {} ({} joints)",
        config.training.model.name.as_keyword(),
        config.training.model.num_joints
    );
    if let Some(backbone) = &config.training.model.backbone {
        info!("backbone: {}", backbone.model.as_keyword());
    }
    info!(
        "datasets: {}",
        config
            .data_collection
            .datasets
            .iter()
            .map(|selection| selection.kind.as_keyword())
            .join(", ")
    );
    info!(
        "epochs: {}, batch size: {}, optimizer: {} (lr {})",
        config.training.general.num_epochs,
        config.training.general.batch_size,
        config.training.optimizer.name.as_keyword(),
        config.training.optimizer.lr
    );

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }

    Ok(())
}
