extern crate rc_zone;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use rc_zone::core::space_heat_demand::zone::CalculationCore;
use rc_zone::output::FileOutput;
use rc_zone::{aggregate_building, calc_equal_air_temp, run_simulation};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct RcZoneArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate the zones of a building description into lumped models
    Aggregate {
        building_file: PathBuf,
        /// "vdi" or "ebc", overriding the core named in the building file
        #[arg(long, short)]
        core: Option<String>,
    },
    /// Simulate a lumped model against a set of simulation inputs
    Simulate {
        model_file: PathBuf,
        inputs_file: PathBuf,
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
    /// Calculate the equivalent outdoor air temperature of a lumped model from weather series
    EqualAirTemp {
        model_file: PathBuf,
        weather_file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = RcZoneArgs::parse();

    match args.command {
        Command::Aggregate {
            building_file,
            core,
        } => {
            let calculation_core = core.as_deref().map(CalculationCore::parse).transpose()?;
            let models = aggregate_building(
                BufReader::new(File::open(&building_file)?),
                calculation_core,
            )?;

            info!("Aggregated {} lumped model(s)", models.len());
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &models)?;
            writeln!(stdout)?;
        }
        Command::Simulate {
            model_file,
            inputs_file,
            output_dir,
        } => {
            let output_key = file_stem(&model_file)?;
            let output_dir = match output_dir {
                Some(output_dir) => output_dir,
                None => model_file
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            };

            let results = run_simulation(
                BufReader::new(File::open(&model_file)?),
                BufReader::new(File::open(&inputs_file)?),
                FileOutput::new(output_dir, "{}_results.csv".to_string()),
                &output_key,
            )?;
            info!("Simulated {} steps", results.t_air.len());
        }
        Command::EqualAirTemp {
            model_file,
            weather_file,
        } => {
            let equal_air_temp = calc_equal_air_temp(
                BufReader::new(File::open(&model_file)?),
                BufReader::new(File::open(&weather_file)?),
            )?;

            let mut stdout = io::stdout().lock();
            serde_json::to_writer(&mut stdout, &equal_air_temp)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

fn file_stem(path: &Path) -> anyhow::Result<String> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Could not derive a file name from {path:?}"))
}
