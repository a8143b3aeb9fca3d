use {std::path::PathBuf, thiserror::Error};

pub type Result<T, E = RestackError> = std::result::Result<T, E>;

/// Failure of a single attempt to read a raw file
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("variable {variable} not found in {path}")]
    MissingVariable { path: PathBuf, variable: String },

    #[error("attribute {attribute} not found on {variable} in {path}")]
    MissingAttribute {
        path: PathBuf,
        variable: String,
        attribute: String,
    },

    #[error("{path} holds {actual} values for {variable}, expected {expected}")]
    Size {
        path: PathBuf,
        variable: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to decode {path}: {message}")]
    Format { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum RestackError {
    #[error("failed to read raw file {path} after {attempts} attempt(s): {source}")]
    RawFileRead {
        path: PathBuf,
        attempts: usize,
        #[source]
        source: ReadError,
    },

    #[error("cycles overlapping {year} are not contiguous in the catalog: {indices:?}")]
    NonContiguousCycles { year: i32, indices: Vec<usize> },

    #[error("no catalog records fall in {year}")]
    YearNotInCatalog { year: i32 },

    #[error("{variable} stacked to {ndim} dimensions, expected 3 or 4")]
    Dimensionality { variable: String, ndim: usize },

    #[error("{variable}: {path} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        path: PathBuf,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{variable} {year}: restacked {actual} hourly timesteps, expected {expected}")]
    YearLength {
        variable: String,
        year: i32,
        expected: usize,
        actual: usize,
    },

    #[error("{0} is not a U or V wind component")]
    UnknownWindVariable(String),

    #[error("rotation fields of shape {rotation:?} cannot be broadcast to wind shape {wind:?}")]
    RotationShape {
        rotation: Vec<usize>,
        wind: Vec<usize>,
    },

    #[error("U component has shape {u:?} but V component has shape {v:?}")]
    ComponentShape { u: Vec<usize>, v: Vec<usize> },

    #[error("every timestep of a grid column is missing, nothing to interpolate from")]
    EmptyInterpolationColumn,

    #[error("invalid catalog record {record}: {message}")]
    Catalog { record: String, message: String },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "netcdf")]
    #[error(transparent)]
    Netcdf(#[from] netcdf_rs::Error),
}
