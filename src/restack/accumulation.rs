//! Restacking of variables accumulated since the last model reinitialization.
//!
//! Within a reinitialization cycle the raw values are cumulative, so hourly increments are
//! recovered by differencing consecutive timesteps. The first timestep of every cycle has
//! no predecessor in its own run and is left missing, then filled by interpolating along
//! time across the cycle boundary. To make that possible at the edges of the requested
//! year the cycles either side of it are restacked too and trimmed off afterwards.

use {
    super::Context,
    crate::{
        cycle::{self, Cycle},
        error::Result,
        interp::fill_nan_along_time,
    },
    log::{debug, info},
    ndarray::{ArrayD, ArrayView, Axis, IxDyn, Slice},
    std::path::Path,
};

/// Per-interval increments of a cumulative stack; the first timestep is NaN
pub fn diff(stacked: &ArrayD<f32>) -> ArrayD<f32> {
    let mut out = ArrayD::from_elem(stacked.raw_dim(), f32::NAN);

    if stacked.len_of(Axis(0)) > 1 {
        let later = stacked.slice_axis(Axis(0), Slice::new(1, None, 1));
        let earlier = stacked.slice_axis(Axis(0), Slice::new(0, Some(-1), 1));
        out.slice_axis_mut(Axis(0), Slice::new(1, None, 1))
            .assign(&(&later - &earlier));
    }

    out
}

/// Differenced, gap-filled and non-negative hourly increments of `variable` over `year`
pub fn restack(ctx: Context, variable: &str, year: i32) -> Result<ArrayD<f32>> {
    let cycles = cycle::group(ctx.catalog.records());
    let selected = cycle::window(&cycles, year)?
        .into_iter()
        .map(|i| cycles[i])
        .collect::<Vec<Cycle>>();

    info!(
        "Restacking {} {} from {} reinitialization cycles",
        variable,
        year,
        selected.len()
    );

    let mut diffs = Vec::with_capacity(selected.len());
    for c in &selected {
        let paths = c
            .records
            .iter()
            .map(|r| r.filepath.as_path())
            .collect::<Vec<&Path>>();

        debug!(
            "Cycle starting {} ({} timesteps)",
            c.records[0].timestamp,
            paths.len()
        );

        let stacked = ctx.workers.read_stack(ctx.reader, &paths, variable)?;
        diffs.push(diff(&stacked));
    }

    let views = diffs
        .iter()
        .map(|d| d.view())
        .collect::<Vec<ArrayView<f32, IxDyn>>>();
    let mut arr = ndarray::concatenate(Axis(0), &views)?;
    drop(diffs);

    ctx.workers.install(|| fill_nan_along_time(&mut arr))?;

    let rows = cycle::year_rows(&selected, year);
    let mut arr = arr.select(Axis(0), &rows);

    arr.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v });

    Ok(arr)
}
