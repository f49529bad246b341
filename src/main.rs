use anyhow::Result;
use flightcheck::{
    catalog::CATALOG,
    cli::{Cli, Commands},
    config::Config,
    pipeline,
};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            config,
            database,
            output_dir,
            data_dir,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            if database.is_some() {
                config.database = database;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if !data_dir.is_empty() {
                config.input_search_paths = data_dir;
            }

            let report = pipeline::run(&config)?;
            println!("{report}");
        }

        Commands::ListAnomalies => {
            println!("Anomaly definitions (execution order):\n");
            for kind in CATALOG {
                println!("  {:<30} {}", kind.label(), kind.description());
            }
        }
    }

    Ok(())
}
