use {
    serde::{Deserialize, Serialize},
    std::{collections::BTreeMap, path::PathBuf},
};

/// Restacking parameters
#[derive(Debug, PartialEq, Default, Deserialize)]
pub struct Parameters {
    pub environment: Environment,
    pub grid: Grid,
    pub numerical: Numerical,
    pub calendar: Calendar,
    pub variables: VariableTable,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Environment {
    /// CSV table of raw files with their parsed dates and forecast times
    pub catalog_table: PathBuf,
    /// Root directory containing one subdirectory of raw files per year
    pub raw_directory: PathBuf,
    /// File holding the grid rotation fields used to rotate winds
    pub ancillary_file: PathBuf,
    /// Directory restacked archives are written to
    pub output_directory: PathBuf,
    /// Model and scenario combination, used in output file names
    pub group: String,
    /// Storage format of the raw files and of the restacked output
    pub raw_format: RawFormat,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            catalog_table: PathBuf::from("WRFDS_forecast_time_attr.csv"),
            raw_directory: PathBuf::from("raw"),
            ancillary_file: PathBuf::from("geo_em.d01.nc"),
            output_directory: PathBuf::from("restacked"),
            group: "gfdl_hist".to_owned(),
            raw_format: RawFormat::R4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawFormat {
    R4,
    Netcdf,
}

/// Shape of the model grid, needed for formats that do not describe themselves
#[derive(Debug, PartialEq, Deserialize)]
pub struct Grid {
    pub rows: usize,
    pub columns: usize,
    /// Vertical level count of every variable that has levels
    pub levels: BTreeMap<String, usize>,
}

impl Default for Grid {
    fn default() -> Self {
        let mut levels = BTreeMap::new();
        for name in &["QVAPOR", "T", "U", "V", "GHT", "OMEGA", "CLDFRA"] {
            levels.insert((*name).to_owned(), 9);
        }
        for name in &["TSLB", "SMOIS", "SH2O"] {
            levels.insert((*name).to_owned(), 4);
        }

        Grid {
            rows: 262,
            columns: 262,
            levels,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Numerical {
    /// forecast_time value carried by the first record of every reinitialization cycle
    pub cycle_start_forecast_time: i64,
    /// Size of the worker pool reading raw files
    pub workers: usize,
    /// Number of times a raw file read is attempted before the run fails
    pub read_attempts: usize,
    /// Pause between failed read attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for Numerical {
    fn default() -> Self {
        Numerical {
            cycle_start_forecast_time: 6,
            workers: 24,
            read_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Calendar {
    /// Whether February 29th is kept in leap year archives
    pub leap_days: LeapDays,
    /// Fail when a restacked year does not have one timestep per hour
    pub strict_year_length: bool,
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar {
            leap_days: LeapDays::Keep,
            strict_year_length: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeapDays {
    Keep,
    Drop,
}

/// Static classification of WRF variable names
#[derive(Debug, PartialEq, Deserialize)]
pub struct VariableTable {
    pub version: u32,
    /// Variables reported cumulatively since the last reinitialization
    pub accumulation: Vec<String>,
    /// Grid-relative wind components, paired by swapping the leading U/V
    pub wind: Vec<String>,
    /// Variables whose vertical dimension is soil depth rather than pressure
    pub soil_levels: Vec<String>,
    pub cosine_variable: String,
    pub sine_variable: String,
    /// Variable whose forecast_time attribute is read when cataloguing raw files
    pub forecast_time_variable: String,
}

impl Default for VariableTable {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| (*s).to_owned()).collect();

        VariableTable {
            version: 1,
            accumulation: owned(&["ACSNOW", "PCPT", "PCPC", "PCPNC", "POTEVP"]),
            wind: owned(&["U", "V", "U10", "V10", "UBOT", "VBOT"]),
            soil_levels: owned(&["TSLB", "SMOIS", "SH2O"]),
            cosine_variable: "COSALPHA".to_owned(),
            sine_variable: "SINALPHA".to_owned(),
            forecast_time_variable: "PCPT".to_owned(),
        }
    }
}

impl VariableTable {
    /// Name of the vertical dimension written for a 4-D variable
    pub fn level_dimension(&self, variable: &str) -> &'static str {
        if self.soil_levels.iter().any(|v| v == variable) {
            "lv_DBLY3"
        } else {
            "lv_ISBL2"
        }
    }
}

#[cfg(test)]
mod test {
    use {super::*, std::fs::File};

    #[test]
    fn defaults() {
        assert_eq!(
            Parameters::default(),
            serde_yaml::from_reader::<_, Parameters>(
                File::open("src/testdata/defaults.yaml").unwrap()
            )
            .unwrap()
        );
    }

    #[test]
    fn level_dimension() {
        let table = VariableTable::default();

        assert_eq!("lv_DBLY3", table.level_dimension("TSLB"));
        assert_eq!("lv_ISBL2", table.level_dimension("QVAPOR"));
    }
}
