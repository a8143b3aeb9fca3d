//! Headerless little-endian `float32` grids with YAML sidecars.
//!
//! A raw timestep `dir/WRFDS_d01.1979-01-02_00.nc` is stored as one `.r4` file per
//! variable (`dir/WRFDS_d01.1979-01-02_00.PCPT.r4`) plus `dir/WRFDS_d01.1979-01-02_00.yaml`
//! holding its attributes. Values are row-major `([level,] y, x)`.

use {
    crate::{
        assemble::StackedYear,
        error::{ReadError, Result},
        io::{RawReader, Writer},
        parameters::{Grid, LeapDays},
    },
    byteorder::{ByteOrder, LittleEndian},
    chrono::NaiveDateTime,
    log::info,
    ndarray::{ArrayD, IxDyn},
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        fs::{self, File},
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    },
};

/// Attributes of one raw timestep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAttributes {
    pub forecast_time: i64,
}

/// Describes a restacked `.r4` archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub variable: String,
    pub group: String,
    pub year: i32,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub leap_days: LeapDays,
}

pub fn variable_path(raw: &Path, variable: &str) -> PathBuf {
    raw.with_extension(format!("{}.r4", variable))
}

pub fn attributes_path(raw: &Path) -> PathBuf {
    raw.with_extension("yaml")
}

pub fn encode(values: impl IntoIterator<Item = f32>) -> Vec<u8> {
    let mut bytes = vec![];
    values.into_iter().for_each(|x| {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, x);
        bytes.extend_from_slice(&buf);
    });
    bytes
}

pub struct R4Reader {
    rows: usize,
    columns: usize,
    levels: BTreeMap<String, usize>,
}

impl R4Reader {
    pub fn new(grid: &Grid) -> Self {
        R4Reader {
            rows: grid.rows,
            columns: grid.columns,
            levels: grid.levels.clone(),
        }
    }

    fn shape(&self, variable: &str) -> Vec<usize> {
        match self.levels.get(variable) {
            Some(&nz) => vec![nz, self.rows, self.columns],
            None => vec![self.rows, self.columns],
        }
    }
}

impl RawReader for R4Reader {
    fn read(&self, path: &Path, variable: &str) -> Result<ArrayD<f32>, ReadError> {
        let file = variable_path(path, variable);
        let bytes = fs::read(&file).map_err(|source| ReadError::Io {
            path: file.clone(),
            source,
        })?;

        let shape = self.shape(variable);
        let expected = shape.iter().product::<usize>();
        if bytes.len() != expected * 4 {
            return Err(ReadError::Size {
                path: file,
                variable: variable.to_owned(),
                expected,
                actual: bytes.len() / 4,
            });
        }

        let values = bytes
            .chunks(4)
            .map(LittleEndian::read_f32)
            .collect::<Vec<f32>>();

        ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| ReadError::Format {
            path: file,
            message: e.to_string(),
        })
    }

    fn forecast_time(&self, path: &Path, _variable: &str) -> Result<i64, ReadError> {
        let file = attributes_path(path);
        let f = File::open(&file).map_err(|source| ReadError::Io {
            path: file.clone(),
            source,
        })?;

        serde_yaml::from_reader::<_, RawAttributes>(f)
            .map(|attrs| attrs.forecast_time)
            .map_err(|e| ReadError::Format {
                path: file,
                message: e.to_string(),
            })
    }
}

/// Writes restacked years as `<variable>/<VARIABLE>_wrf_hourly_<group>_<year>.r4`
pub struct R4Writer {
    output_directory: PathBuf,
    group: String,
}

impl R4Writer {
    pub fn new<P: Into<PathBuf>>(output_directory: P, group: &str) -> Self {
        R4Writer {
            output_directory: output_directory.into(),
            group: group.to_owned(),
        }
    }

    pub fn path(&self, variable: &str, year: i32) -> PathBuf {
        self.output_directory
            .join(variable.to_lowercase())
            .join(format!("{}_wrf_hourly_{}_{}.r4", variable, self.group, year))
    }
}

impl Writer for R4Writer {
    fn write(&self, stacked: &StackedYear) -> Result<PathBuf> {
        let path = self.path(&stacked.variable, stacked.year);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut f = BufWriter::new(File::create(&path)?);
        f.write_all(&encode(stacked.data.iter().copied()))?;
        f.flush()?;

        let header = Header {
            variable: stacked.variable.clone(),
            group: self.group.clone(),
            year: stacked.year,
            dimensions: stacked.dimensions.clone(),
            shape: stacked.data.shape().to_vec(),
            start: stacked.timestamps.first().copied(),
            end: stacked.timestamps.last().copied(),
            leap_days: stacked.leap_days,
        };
        serde_yaml::to_writer(File::create(path.with_extension("yaml"))?, &header)?;

        info!("Restacked {} {} written to {}", stacked.variable, stacked.year, path.display());

        Ok(path)
    }
}
