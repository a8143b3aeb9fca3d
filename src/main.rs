#[macro_use]
extern crate clap;

use {
    anyhow::{bail, Context, Result},
    clap::ArgMatches,
    log::{error, info},
    simplelog::{Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::fs::File,
    wrf_restack::{
        assemble::YearAssembler,
        catalog::{self, scan::scan, Catalog},
        io::{r4::R4Reader, r4::R4Writer, RawReader, Workers, Writer},
        parameters::{Parameters, RawFormat},
    },
};

#[quit::main]
fn main() {
    let matches = clap_app!(wrf_restack =>
        (version: crate_version!())
        (@arg PARAMETERS: -p --parameters +takes_value +required "Path to file containing restacking parameters.")
        (@arg VERBOSE: -v --verbose ... "Increases logging verbosity, may be repeated.")
        (@subcommand catalog =>
            (about: "Reads the forecast time of every raw file and writes the catalog table.")
        )
        (@subcommand restack =>
            (about: "Restacks one variable over one calendar year of hourly raw files.")
            (@arg VARIABLE: -V --variable +takes_value +required "WRF variable name, exactly as in the raw files.")
            (@arg YEAR: -y --year +takes_value +required "Calendar year to restack.")
            (@arg WORKERS: -n --workers +takes_value "Number of workers reading raw files, overrides the parameters file.")
        )
    )
    .get_matches();

    let level = match matches.occurrences_of("VERBOSE") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, LogConfig::default(), TerminalMode::Mixed)
        .expect("Failed to initialize logger");

    let params = {
        // Should never panic as clap should return an error if the argument was not supplied
        let path = matches
            .value_of("PARAMETERS")
            .expect("Path to parameters file not supplied");

        let file = File::open(path).unwrap_or_else(|e| {
            error!("Failed to open {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        let params = serde_yaml::from_reader::<_, Parameters>(file).unwrap_or_else(|e| {
            error!("Failed to parse parameters from {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        info!(
            "Successfully loaded restacking parameters from \"{}\": \n{:#?}",
            path, params
        );

        params
    };

    run_subcommand(matches.subcommand(), params).unwrap_or_else(|e| {
        error!("Error: \"{:#}\"", e);
        quit::with_code(1);
    });
}

fn reader(params: &Parameters) -> Result<Box<dyn RawReader>> {
    let reader: Box<dyn RawReader> = match params.environment.raw_format {
        RawFormat::R4 => Box::new(R4Reader::new(&params.grid)),
        #[cfg(feature = "netcdf")]
        RawFormat::Netcdf => Box::new(wrf_restack::io::netcdf::NetcdfReader),
        #[cfg(not(feature = "netcdf"))]
        RawFormat::Netcdf => bail!("NetCDF support requires building with the \"netcdf\" feature"),
    };

    Ok(reader)
}

fn writer(params: &Parameters) -> Result<Box<dyn Writer>> {
    let env = &params.environment;
    let writer: Box<dyn Writer> = match env.raw_format {
        RawFormat::R4 => Box::new(R4Writer::new(&env.output_directory, &env.group)),
        #[cfg(feature = "netcdf")]
        RawFormat::Netcdf => Box::new(wrf_restack::io::netcdf::NetcdfWriter::new(
            &env.output_directory,
            &env.group,
        )),
        #[cfg(not(feature = "netcdf"))]
        RawFormat::Netcdf => bail!("NetCDF support requires building with the \"netcdf\" feature"),
    };

    Ok(writer)
}

fn run_subcommand(subcmd: (&str, Option<&ArgMatches>), mut params: Parameters) -> Result<()> {
    let (name, args) = match subcmd {
        (name, Some(args)) => (name, args),
        _ => bail!("No subcommand selected"),
    };

    info!("Starting {}", name);

    match name {
        "catalog" => {
            let reader = reader(&params)?;
            let workers = Workers::from_parameters(&params.numerical)?;

            let rows = scan(
                &params.environment.raw_directory,
                reader.as_ref(),
                &params.variables.forecast_time_variable,
                &workers,
            );
            catalog::save(&rows, &params.environment.catalog_table)?;

            info!(
                "Forecast times table for {} written to {}",
                params.environment.raw_directory.display(),
                params.environment.catalog_table.display()
            );
        }
        "restack" => {
            // Required arguments, clap rejects the invocation without them
            let variable = args.value_of("VARIABLE").unwrap_or_default();
            let year = value_t!(args, "YEAR", i32)?;
            if args.is_present("WORKERS") {
                params.numerical.workers = value_t!(args, "WORKERS", usize)?;
            }

            let catalog = Catalog::load(
                &params.environment.catalog_table,
                params.numerical.cycle_start_forecast_time,
            )
            .with_context(|| {
                format!(
                    "Failed to load catalog {}",
                    params.environment.catalog_table.display()
                )
            })?;

            let reader = reader(&params)?;
            let writer = writer(&params)?;
            let workers = Workers::from_parameters(&params.numerical)?;
            info!("Reading raw files with {} workers", workers.threads());

            let assembler = YearAssembler::new(&params, &catalog, reader.as_ref(), &workers);
            let path = assembler
                .run(variable, year, writer.as_ref())
                .with_context(|| format!("Failed to restack {} for {}", variable, year))?;

            info!("Restacked {} for {} to {}", variable, year, path.display());
        }
        _ => {
            // Should be unreachable due to clap catching this error
            bail!("Unrecognized subcommand");
        }
    }

    info!("Finished {}", name);

    Ok(())
}
