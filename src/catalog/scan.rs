//! Building the forecast-times table from a tree of raw files.

use {
    super::CatalogRow,
    crate::io::{RawReader, Workers},
    log::{info, warn},
    rayon::prelude::*,
    std::path::{Path, PathBuf},
    walkdir::WalkDir,
};

/// Date parts parsed from a raw file path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDate {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub folder_year: i64,
}

/// Parses `<folder_year>/<prefix>.<YYYY>-<MM>-<DD>_<HH>.nc`
pub fn parse_path(path: &Path) -> Option<FileDate> {
    let name = path.file_name()?.to_str()?;
    let mut parts = name.rsplit('.');
    parts.next()?;
    let stamp = parts.next()?;

    let mut ymd = stamp.split('-');
    let year = ymd.next()?.parse().ok()?;
    let month = ymd.next()?.parse().ok()?;
    let (day, hour) = {
        let mut day_hour = ymd.next()?.split('_');
        (day_hour.next()?.parse().ok()?, day_hour.next()?.parse().ok()?)
    };

    let folder_year = path.parent()?.file_name()?.to_str()?.parse().ok()?;

    Some(FileDate {
        year,
        month,
        day,
        hour,
        folder_year,
    })
}

/// Raw timesteps one directory below `root` that are filed under their own year.
///
/// A timestep is found through its `.nc` file or, for `.r4` trees, its `.yaml` sidecar and
/// is always listed under its `.nc` name.
pub fn list_files<P: AsRef<Path>>(root: P) -> Vec<(PathBuf, FileDate)> {
    let mut files = WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "nc" || ext == "yaml"))
        .map(|path| path.with_extension("nc"))
        .filter_map(|path| match parse_path(&path) {
            Some(date) => Some((path, date)),
            None => {
                warn!("Skipping {}, name does not carry a timestamp", path.display());
                None
            }
        })
        .filter(|(_, date)| date.folder_year == date.year)
        .collect::<Vec<_>>();

    files.sort_by(|(a, x), (b, y)| {
        (x.year, x.month, x.day, x.hour)
            .cmp(&(y.year, y.month, y.day, y.hour))
            .then_with(|| a.cmp(b))
    });
    files.dedup_by(|(a, _), (b, _)| a == b);

    files
}

/// Reads the forecast time of every raw file under `root`.
///
/// Files whose forecast time cannot be read are kept as no-data rows rather than failing
/// the scan.
pub fn scan<P: AsRef<Path>>(
    root: P,
    reader: &dyn RawReader,
    forecast_time_variable: &str,
    workers: &Workers,
) -> Vec<CatalogRow> {
    let files = list_files(&root);
    info!(
        "Reading forecast times of {} files under {}",
        files.len(),
        root.as_ref().display()
    );

    workers.install(|| {
        files
            .into_par_iter()
            .map(
                |(path, date)| match reader.forecast_time(&path, forecast_time_variable) {
                    Ok(forecast_time) => CatalogRow {
                        filepath: path,
                        year: date.year,
                        folder_year: date.folder_year,
                        month: date.month,
                        day: date.day,
                        hour: date.hour,
                        forecast_time,
                    },
                    Err(e) => {
                        warn!("{}", e);
                        CatalogRow::nodata(path)
                    }
                },
            )
            .collect::<Vec<CatalogRow>>()
    })
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{catalog::NODATA, io::memory::MemoryReader},
        std::{fs, time::Duration},
        tempdir::TempDir,
    };

    #[test]
    fn parses_raw_names() {
        assert_eq!(
            Some(FileDate {
                year: 1979,
                month: 1,
                day: 2,
                hour: 5,
                folder_year: 1980,
            }),
            parse_path(Path::new("/raw/1980/WRFDS_d01.1979-01-02_05.nc"))
        );
        assert_eq!(None, parse_path(Path::new("/raw/1980/notes.nc")));
        assert_eq!(None, parse_path(Path::new("/raw/misc/WRFDS_d01.1979-01-02_05.nc")));
    }

    #[test]
    fn scans_tree() {
        let dir = TempDir::new("wrf-restack").unwrap();
        let root = dir.path();
        for (folder, name) in &[
            ("1979", "WRFDS_d01.1979-01-02_01.nc"),
            ("1979", "WRFDS_d01.1979-01-02_00.nc"),
            ("1979", "WRFDS_d01.1979-01-02_02.nc"),
            ("1980", "WRFDS_d01.1979-12-31_23.nc"),
            ("1980", "WRFDS_d01.1980-01-01_00.nc"),
            ("1980", "WRFDS_d01.1980-01-01_00.yaml"),
            ("1980", "WRFDS_d01.1980-01-01_00.PCPT.r4"),
        ] {
            fs::create_dir_all(root.join(folder)).unwrap();
            fs::write(root.join(folder).join(name), b"").unwrap();
        }

        let mut reader = MemoryReader::default();
        reader
            .forecast_times
            .insert(root.join("1979/WRFDS_d01.1979-01-02_00.nc"), 6);
        reader
            .forecast_times
            .insert(root.join("1979/WRFDS_d01.1979-01-02_01.nc"), 1);
        reader
            .forecast_times
            .insert(root.join("1980/WRFDS_d01.1980-01-01_00.nc"), 2);

        let workers = Workers::new(2, 1, Duration::from_millis(0)).unwrap();
        let rows = scan(root, &reader, "PCPT", &workers);

        assert_eq!(
            vec![0, 1, NODATA, 0],
            rows.iter().map(|r| r.hour).collect::<Vec<_>>()
        );
        assert_eq!(6, rows[0].forecast_time);
        assert_eq!(NODATA, rows[2].forecast_time);
        assert_eq!(2, rows[3].forecast_time);
    }
}
