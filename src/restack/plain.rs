use {
    super::Context,
    crate::error::{RestackError, Result},
    log::info,
    ndarray::ArrayD,
    std::path::Path,
};

/// Stacks the raw grids of `variable` stamped with `year` in chronological order
pub fn restack(ctx: Context, variable: &str, year: i32) -> Result<ArrayD<f32>> {
    let paths = ctx
        .catalog
        .year(year)
        .into_iter()
        .map(|r| r.filepath.as_path())
        .collect::<Vec<&Path>>();

    if paths.is_empty() {
        return Err(RestackError::YearNotInCatalog { year });
    }

    info!("Stacking {} timesteps of {} {}", paths.len(), variable, year);

    ctx.workers.read_stack(ctx.reader, &paths, variable)
}
