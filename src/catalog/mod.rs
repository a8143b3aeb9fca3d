//! Table of raw per-timestep WRF files.
//!
//! The table is produced once per WRF group (model and scenario) by walking the raw
//! directory tree (see [`scan`]) and is read in full before any restacking begins. Each
//! record is tagged on ingestion with whether it opens a reinitialization cycle.

pub mod scan;

use {
    crate::{
        calendar::timestamp,
        error::{RestackError, Result},
    },
    chrono::NaiveDateTime,
    log::{debug, warn},
    serde::{Deserialize, Serialize},
    std::{
        convert::TryFrom,
        path::{Path, PathBuf},
    },
};

/// Marker written by the catalog step for files it could not read
pub const NODATA: i64 = -9999;

/// Position of a record relative to model reinitialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleBoundary {
    CycleStart,
    CycleContinuation,
}

/// One row of the forecast-times table as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    #[serde(alias = "fn")]
    pub filepath: PathBuf,
    pub year: i64,
    pub folder_year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub forecast_time: i64,
}

impl CatalogRow {
    pub fn nodata(filepath: PathBuf) -> Self {
        CatalogRow {
            filepath,
            year: NODATA,
            folder_year: NODATA,
            month: NODATA,
            day: NODATA,
            hour: NODATA,
            forecast_time: NODATA,
        }
    }

    fn is_nodata(&self) -> bool {
        [
            self.year,
            self.folder_year,
            self.month,
            self.day,
            self.hour,
            self.forecast_time,
        ]
        .contains(&NODATA)
    }
}

/// A single raw model output file
#[derive(Debug, Clone, PartialEq)]
pub struct RawTimestepRecord {
    pub filepath: PathBuf,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    /// Year-named directory the file resides in
    pub folder_year: i32,
    /// Hours since the last reinitialization
    pub forecast_time: i64,
    pub boundary: CycleBoundary,
    pub timestamp: NaiveDateTime,
}

impl RawTimestepRecord {
    fn sort_key(&self) -> (i32, u32, u32, u32) {
        (self.year, self.month, self.day, self.hour)
    }

    fn from_row(row: CatalogRow, cycle_start_forecast_time: i64) -> Result<Self> {
        let invalid = |message: &str| RestackError::Catalog {
            record: row.filepath.display().to_string(),
            message: message.to_owned(),
        };

        let year = i32::try_from(row.year).map_err(|_| invalid("year out of range"))?;
        let folder_year =
            i32::try_from(row.folder_year).map_err(|_| invalid("folder year out of range"))?;
        let month = u32::try_from(row.month).map_err(|_| invalid("negative month"))?;
        let day = u32::try_from(row.day).map_err(|_| invalid("negative day"))?;
        let hour = u32::try_from(row.hour).map_err(|_| invalid("negative hour"))?;

        let timestamp =
            timestamp(year, month, day, hour).ok_or_else(|| invalid("not a valid date and hour"))?;

        let boundary = if row.forecast_time == cycle_start_forecast_time {
            CycleBoundary::CycleStart
        } else {
            CycleBoundary::CycleContinuation
        };

        Ok(RawTimestepRecord {
            filepath: row.filepath,
            year,
            month,
            day,
            hour,
            folder_year,
            forecast_time: row.forecast_time,
            boundary,
            timestamp,
        })
    }
}

/// Chronologically sorted records of one WRF group
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    records: Vec<RawTimestepRecord>,
}

impl Catalog {
    /// Builds a catalog from rows in any order.
    ///
    /// No-data rows are dropped, records are sorted by (year, month, day, hour) and a
    /// timestamp present in more than one folder keeps the copy filed under its own year.
    pub fn from_rows<I>(rows: I, cycle_start_forecast_time: i64) -> Result<Self>
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut records = Vec::new();
        for row in rows {
            if row.is_nodata() {
                warn!("Dropping unreadable raw file {}", row.filepath.display());
                continue;
            }
            records.push(RawTimestepRecord::from_row(row, cycle_start_forecast_time)?);
        }

        records.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.filepath.cmp(&b.filepath))
        });

        let mut deduped: Vec<RawTimestepRecord> = Vec::with_capacity(records.len());
        for record in records {
            match deduped.last_mut() {
                Some(last) if last.sort_key() == record.sort_key() => {
                    warn!(
                        "Duplicate timestep {} in {} and {}",
                        record.timestamp,
                        last.filepath.display(),
                        record.filepath.display()
                    );
                    if last.folder_year != last.year && record.folder_year == record.year {
                        *last = record;
                    }
                }
                _ => deduped.push(record),
            }
        }

        debug!("Catalog holds {} records", deduped.len());

        Ok(Catalog { records: deduped })
    }

    /// Reads a forecast-times CSV table
    pub fn load<P: AsRef<Path>>(path: P, cycle_start_forecast_time: i64) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize::<CatalogRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Self::from_rows(rows, cycle_start_forecast_time)
    }

    pub fn records(&self) -> &[RawTimestepRecord] {
        &self.records
    }

    /// Records stamped with `year`, in chronological order
    pub fn year(&self, year: i32) -> Vec<&RawTimestepRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }
}

/// Writes a forecast-times CSV table
pub fn save<P: AsRef<Path>>(rows: &[CatalogRow], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn row(year: i64, month: i64, day: i64, hour: i64, forecast_time: i64) -> CatalogRow {
    CatalogRow {
        filepath: PathBuf::from(format!(
            "{}/WRFDS_d01.{:04}-{:02}-{:02}_{:02}.nc",
            year, year, month, day, hour
        )),
        year,
        folder_year: year,
        month,
        day,
        hour,
        forecast_time,
    }
}
