use {
    crate::{
        calendar::{hourly_range, hours_in_year, is_leap_day},
        catalog::Catalog,
        error::{RestackError, Result},
        io::{RawReader, Workers, Writer},
        parameters::{LeapDays, Parameters},
        restack::{
            accumulation, plain,
            wind::{self, Rotation},
            Context, VariableClass,
        },
    },
    chrono::NaiveDateTime,
    log::{info, warn},
    ndarray::{ArrayD, Axis},
    std::path::PathBuf,
};

/// One restacked (variable, year), ready to be serialized
#[derive(Debug, Clone, PartialEq)]
pub struct StackedYear {
    pub variable: String,
    pub year: i32,
    /// `(time, [level,] y, x)`
    pub data: ArrayD<f32>,
    pub dimensions: Vec<String>,
    pub timestamps: Vec<NaiveDateTime>,
    pub leap_days: LeapDays,
}

/// Dispatches (variable, year) requests to the matching restacker and validates the result
pub struct YearAssembler<'a> {
    parameters: &'a Parameters,
    catalog: &'a Catalog,
    reader: &'a dyn RawReader,
    workers: &'a Workers,
    rotation: Option<Rotation>,
}

impl<'a> YearAssembler<'a> {
    pub fn new(
        parameters: &'a Parameters,
        catalog: &'a Catalog,
        reader: &'a dyn RawReader,
        workers: &'a Workers,
    ) -> Self {
        YearAssembler {
            parameters,
            catalog,
            reader,
            workers,
            rotation: None,
        }
    }

    /// Supplies the grid rotation used for wind variables instead of reading the ancillary file
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn class(&self, variable: &str) -> VariableClass {
        VariableClass::of(variable, &self.parameters.variables)
    }

    pub fn assemble(&self, variable: &str, year: i32) -> Result<StackedYear> {
        let ctx = Context {
            catalog: self.catalog,
            reader: self.reader,
            workers: self.workers,
        };

        let class = self.class(variable);
        info!("Restacking {} {} as {:?}", variable, year, class);

        let data = match class {
            VariableClass::Accumulation => accumulation::restack(ctx, variable, year)?,
            VariableClass::Plain => plain::restack(ctx, variable, year)?,
            VariableClass::Wind => {
                let loaded;
                let rotation = match &self.rotation {
                    Some(rotation) => rotation,
                    None => {
                        loaded = Rotation::load(
                            self.reader,
                            &self.parameters.environment.ancillary_file,
                            &self.parameters.variables,
                        )?;
                        &loaded
                    }
                };
                wind::restack(ctx, variable, year, rotation)?
            }
        };

        let dimensions = match data.ndim() {
            3 => vec!["time", "y", "x"],
            4 => vec![
                "time",
                self.parameters.variables.level_dimension(variable),
                "y",
                "x",
            ],
            ndim => {
                return Err(RestackError::Dimensionality {
                    variable: variable.to_owned(),
                    ndim,
                })
            }
        };

        let leap_days = self.parameters.calendar.leap_days;
        let records = self.catalog.year(year);
        let data = match leap_days {
            LeapDays::Keep => data,
            LeapDays::Drop => {
                let rows = records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| !is_leap_day(r.month, r.day))
                    .map(|(i, _)| i)
                    .collect::<Vec<usize>>();
                if rows.len() == records.len() {
                    data
                } else {
                    data.select(Axis(0), &rows)
                }
            }
        };

        let steps = data.len_of(Axis(0));
        self.check_length(variable, year, steps)?;

        // Row 0 is backed by the first record of the year, whichever folder it is filed in
        let start = records
            .first()
            .map(|r| r.timestamp)
            .ok_or(RestackError::YearNotInCatalog { year })?;

        Ok(StackedYear {
            variable: variable.to_owned(),
            year,
            data,
            dimensions: dimensions.into_iter().map(str::to_owned).collect(),
            timestamps: hourly_range(start, steps, leap_days),
            leap_days,
        })
    }

    /// Restacks and hands the result to `writer`
    pub fn run(&self, variable: &str, year: i32, writer: &dyn Writer) -> Result<PathBuf> {
        let stacked = self.assemble(variable, year)?;
        writer.write(&stacked)
    }

    fn check_length(&self, variable: &str, year: i32, actual: usize) -> Result<()> {
        let expected = hours_in_year(year, self.parameters.calendar.leap_days);
        if actual == expected {
            return Ok(());
        }

        if self.parameters.calendar.strict_year_length {
            Err(RestackError::YearLength {
                variable: variable.to_owned(),
                year,
                expected,
                actual,
            })
        } else {
            warn!(
                "{} {}: restacked {} hourly timesteps, expected {}",
                variable, year, actual, expected
            );
            Ok(())
        }
    }
}
