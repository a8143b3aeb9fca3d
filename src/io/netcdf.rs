//! Raw WRF NetCDF files and compressed NetCDF4 output.

use {
    crate::{
        assemble::StackedYear,
        error::{ReadError, Result},
        io::{RawReader, Writer},
    },
    log::info,
    ndarray::{ArrayD, IxDyn},
    netcdf_rs::AttributeValue,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Compression level of written archives
const DEFLATE_LEVEL: i32 = 5;

fn open(path: &Path) -> Result<netcdf_rs::File, ReadError> {
    netcdf_rs::open(path).map_err(|e| ReadError::Format {
        path: path.to_owned(),
        message: e.to_string(),
    })
}

pub struct NetcdfReader;

impl RawReader for NetcdfReader {
    fn read(&self, path: &Path, variable: &str) -> Result<ArrayD<f32>, ReadError> {
        let file = open(path)?;
        let var = file
            .variable(variable)
            .ok_or_else(|| ReadError::MissingVariable {
                path: path.to_owned(),
                variable: variable.to_owned(),
            })?;

        let shape = var
            .dimensions()
            .iter()
            .map(|d| d.len())
            .collect::<Vec<usize>>();
        let values = var.get_values::<f32, _>(..).map_err(|e| ReadError::Format {
            path: path.to_owned(),
            message: e.to_string(),
        })?;

        ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| ReadError::Format {
            path: path.to_owned(),
            message: e.to_string(),
        })
    }

    fn forecast_time(&self, path: &Path, variable: &str) -> Result<i64, ReadError> {
        let file = open(path)?;
        let missing = || ReadError::MissingAttribute {
            path: path.to_owned(),
            variable: variable.to_owned(),
            attribute: "forecast_time".to_owned(),
        };

        let value = file
            .variable(variable)
            .and_then(|v| v.attribute("forecast_time"))
            .ok_or_else(missing)?
            .value()
            .map_err(|e| ReadError::Format {
                path: path.to_owned(),
                message: e.to_string(),
            })?;

        match value {
            AttributeValue::Short(x) => Ok(i64::from(x)),
            AttributeValue::Int(x) => Ok(i64::from(x)),
            AttributeValue::Longlong(x) => Ok(x),
            AttributeValue::Shorts(xs) if !xs.is_empty() => Ok(i64::from(xs[0])),
            AttributeValue::Ints(xs) if !xs.is_empty() => Ok(i64::from(xs[0])),
            AttributeValue::Longlongs(xs) if !xs.is_empty() => Ok(xs[0]),
            _ => Err(missing()),
        }
    }
}

/// Writes restacked years as `<variable>/<VARIABLE>_wrf_hourly_<group>_<year>.nc`
pub struct NetcdfWriter {
    output_directory: PathBuf,
    group: String,
}

impl NetcdfWriter {
    pub fn new<P: Into<PathBuf>>(output_directory: P, group: &str) -> Self {
        NetcdfWriter {
            output_directory: output_directory.into(),
            group: group.to_owned(),
        }
    }

    pub fn path(&self, variable: &str, year: i32) -> PathBuf {
        self.output_directory
            .join(variable.to_lowercase())
            .join(format!("{}_wrf_hourly_{}_{}.nc", variable, self.group, year))
    }
}

impl Writer for NetcdfWriter {
    fn write(&self, stacked: &StackedYear) -> Result<PathBuf> {
        let path = self.path(&stacked.variable, stacked.year);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }

        let mut file = netcdf_rs::create(&path)?;
        for (name, &len) in stacked.dimensions.iter().zip(stacked.data.shape()) {
            file.add_dimension(name, len)?;
        }

        let reference = stacked.timestamps.first().copied();
        if let Some(reference) = reference {
            let hours = stacked
                .timestamps
                .iter()
                .map(|t| (*t - reference).num_hours() as f64)
                .collect::<Vec<f64>>();
            let mut time = file.add_variable::<f64>("time", &["time"])?;
            time.put_values(&hours, ..)?;
            time.put_attribute("units", format!("hours since {}", reference))?;
            time.put_attribute("calendar", "standard")?;
            file.add_attribute("reference_time", reference.to_string())?;
        }

        let dims = stacked
            .dimensions
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>();
        let mut var = file.add_variable::<f32>(&stacked.variable, &dims)?;
        var.set_compression(DEFLATE_LEVEL, true)?;
        let values = stacked.data.iter().copied().collect::<Vec<f32>>();
        var.put_values(&values, ..)?;

        file.add_attribute("wrf_group", self.group.as_str())?;

        info!(
            "Restacked {} {} written to {}",
            stacked.variable,
            stacked.year,
            path.display()
        );

        Ok(path)
    }
}
