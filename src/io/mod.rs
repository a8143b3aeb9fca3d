//! Reading raw files on a fixed-size worker pool.

#[cfg(feature = "netcdf")]
pub mod netcdf;
pub mod r4;

use {
    crate::{
        assemble::StackedYear,
        error::{ReadError, RestackError, Result},
        parameters::Numerical,
    },
    log::warn,
    ndarray::{ArrayD, ArrayView, Axis, IxDyn},
    rayon::prelude::*,
    std::{
        path::{Path, PathBuf},
        thread,
        time::Duration,
    },
};

/// Source of raw per-timestep grids
pub trait RawReader: Sync {
    /// Reads every value of `variable` from one raw file, shaped `([level,] y, x)`
    fn read(&self, path: &Path, variable: &str) -> Result<ArrayD<f32>, ReadError>;

    /// Reads the `forecast_time` attribute attached to `variable`
    fn forecast_time(&self, path: &Path, variable: &str) -> Result<i64, ReadError>;
}

/// Destination of restacked years
pub trait Writer {
    /// Serializes one restacked (variable, year), replacing any existing output, and
    /// returns the path written
    fn write(&self, stacked: &StackedYear) -> Result<PathBuf>;
}

/// Worker pool distributing per-file reads, with a bounded number of attempts per file
pub struct Workers {
    pool: rayon::ThreadPool,
    attempts: usize,
    delay: Duration,
}

impl Workers {
    pub fn new(workers: usize, attempts: usize, delay: Duration) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("restack-worker-{}", i))
            .build()?;

        Ok(Workers {
            pool,
            attempts: attempts.max(1),
            delay,
        })
    }

    pub fn from_parameters(numerical: &Numerical) -> Result<Self> {
        Self::new(
            numerical.workers,
            numerical.read_attempts,
            Duration::from_millis(numerical.retry_delay_ms),
        )
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` inside the pool so nested rayon iterators use its threads
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Calls `f` on every path in parallel and returns the results in the order of `paths`.
    ///
    /// A failing call is retried until the attempt budget is spent, after which the whole
    /// batch fails with the offending path.
    pub fn map<P, T, F>(&self, paths: &[P], f: F) -> Result<Vec<T>>
    where
        P: AsRef<Path> + Sync,
        T: Send,
        F: Fn(&Path) -> Result<T, ReadError> + Sync,
    {
        self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.attempt(path.as_ref(), &f))
                .collect::<Result<Vec<T>>>()
        })
    }

    /// Reads `variable` from every path and stacks the grids along a new leading time axis
    pub fn read_stack<P>(
        &self,
        reader: &dyn RawReader,
        paths: &[P],
        variable: &str,
    ) -> Result<ArrayD<f32>>
    where
        P: AsRef<Path> + Sync,
    {
        let grids = self.map(paths, |path| reader.read(path, variable))?;
        stack(variable, paths, grids)
    }

    fn attempt<T, F>(&self, path: &Path, f: &F) -> Result<T>
    where
        F: Fn(&Path) -> Result<T, ReadError>,
    {
        let mut attempt = 1;
        loop {
            match f(path) {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= self.attempts => {
                    return Err(RestackError::RawFileRead {
                        path: path.to_owned(),
                        attempts: attempt,
                        source,
                    })
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}, retrying", attempt, self.attempts, e);
                    thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}

/// Stacks per-timestep grids along a new leading time axis.
///
/// Every grid must share the shape of the first and the result must be `(time, y, x)` or
/// `(time, level, y, x)`.
pub fn stack<P: AsRef<Path>>(
    variable: &str,
    paths: &[P],
    grids: Vec<ArrayD<f32>>,
) -> Result<ArrayD<f32>> {
    let first = match grids.first() {
        Some(first) => first.shape().to_vec(),
        None => return Ok(ArrayD::zeros(IxDyn(&[0, 0, 0]))),
    };

    for (grid, path) in grids.iter().zip(paths) {
        if grid.shape() != first.as_slice() {
            return Err(RestackError::ShapeMismatch {
                variable: variable.to_owned(),
                path: path.as_ref().to_owned(),
                expected: first,
                actual: grid.shape().to_vec(),
            });
        }
    }

    let ndim = first.len() + 1;
    if ndim != 3 && ndim != 4 {
        return Err(RestackError::Dimensionality {
            variable: variable.to_owned(),
            ndim,
        });
    }

    let views = grids.iter().map(|g| g.view()).collect::<Vec<ArrayView<f32, IxDyn>>>();

    Ok(ndarray::stack(Axis(0), &views)?)
}

#[cfg(test)]
pub(crate) mod memory {
    use {
        super::*,
        std::{
            collections::{HashMap, HashSet},
            path::PathBuf,
            sync::Mutex,
        },
    };

    /// Raw files held in memory, optionally failing a number of reads per file
    #[derive(Default)]
    pub struct MemoryReader {
        pub grids: HashMap<(PathBuf, String), ArrayD<f32>>,
        pub forecast_times: HashMap<PathBuf, i64>,
        pub failures: Mutex<HashMap<PathBuf, usize>>,
        pub unreadable: HashSet<PathBuf>,
    }

    impl MemoryReader {
        pub fn insert<P: Into<PathBuf>>(&mut self, path: P, variable: &str, grid: ArrayD<f32>) {
            self.grids.insert((path.into(), variable.to_owned()), grid);
        }

        pub fn fail_times<P: Into<PathBuf>>(&mut self, path: P, times: usize) {
            self.failures.lock().unwrap().insert(path.into(), times);
        }
    }

    fn unavailable(path: &Path) -> ReadError {
        ReadError::Io {
            path: path.to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "unavailable"),
        }
    }

    impl RawReader for MemoryReader {
        fn read(&self, path: &Path, variable: &str) -> Result<ArrayD<f32>, ReadError> {
            if self.unreadable.contains(path) {
                return Err(unavailable(path));
            }
            if let Some(remaining) = self.failures.lock().unwrap().get_mut(path) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(unavailable(path));
                }
            }

            self.grids
                .get(&(path.to_owned(), variable.to_owned()))
                .cloned()
                .ok_or_else(|| ReadError::MissingVariable {
                    path: path.to_owned(),
                    variable: variable.to_owned(),
                })
        }

        fn forecast_time(&self, path: &Path, variable: &str) -> Result<i64, ReadError> {
            self.forecast_times
                .get(path)
                .copied()
                .ok_or_else(|| ReadError::MissingAttribute {
                    path: path.to_owned(),
                    variable: variable.to_owned(),
                    attribute: "forecast_time".to_owned(),
                })
        }
    }
}
