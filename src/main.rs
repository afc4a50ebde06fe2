use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::Cli;
use gridtemp::{
    create_output, read_ghcn_data, read_inventory, read_parquet_observations,
    read_parquet_stations, write_monthly, write_yearly, AnomalyConfig, GlobalAnomaly,
    GridTempError, LoadError, ObservationStore, StationCatalog, YearRange,
};
use log::{error, info};
use std::error::Error;
use std::io::{BufWriter, Write};
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<(), GridTempError> {
    let config = AnomalyConfig::builder()
        .reference_period(YearRange::new(args.ref_start, args.ref_end))
        .min_samples(args.min_samples)
        .grid_size(args.grid)
        .years(YearRange::new(args.first_year, args.last_year))
        .population(args.population)
        .missing_months(args.missing_months)
        .build();
    let engine = GlobalAnomaly::new(config)?;

    let (catalog, store) = load(&args)?;
    let report = engine.run(&catalog, &store);
    info!("{:?}", report.summary());

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(create_output(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    if args.monthly {
        write_monthly(&report.monthly, &mut writer, args.format)?;
    } else {
        write_yearly(&report.yearly, &mut writer, args.format)?;
    }
    if let Some(path) = &args.output {
        let series = if args.monthly { "monthly series" } else { "yearly series" };
        info!("Wrote {} as {} to {:?}", series, args.format, path);
    }
    Ok(())
}

fn load(args: &Cli) -> Result<(StationCatalog, ObservationStore), LoadError> {
    if let (Some(stations), Some(observations)) = (&args.parquet_stations, &args.parquet_observations) {
        let (catalog, _) = read_parquet_stations(stations)
            .filter(args.population)
            .default_population(args.default_population)
            .call()?;
        let (store, _) = read_parquet_observations(observations)
            .catalog(&catalog)
            .element(&args.element)
            .maybe_dataset_type(args.dataset_type.as_deref())
            .call()?;
        return Ok((catalog, store));
    }

    let (Some(inventory), Some(data)) = (&args.inventory, &args.data) else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "expected <INVENTORY> <DATA>, or --parquet-stations with --parquet-observations",
            )
            .exit();
    };
    let (catalog, _) = read_inventory(inventory, &args.population)?;
    let (store, _) = read_ghcn_data(data, &catalog)?;
    Ok((catalog, store))
}
