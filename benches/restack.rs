use {
    criterion::{black_box, criterion_group, criterion_main, Benchmark, Criterion},
    ndarray::{Array2, Array3, ArrayD},
    std::path::PathBuf,
    wrf_restack::{
        interp::fill_nan_along_time,
        io::stack,
        restack::{
            accumulation::diff,
            wind::{Component, Rotation},
        },
    },
};

const NY: usize = 262;
const NX: usize = 262;

/// One 48 hour reinitialization cycle of a cumulative surface field
fn cycle() -> ArrayD<f32> {
    Array3::from_shape_fn((48, NY, NX), |(t, j, i)| (t * (1 + (i + j) % 7)) as f32).into_dyn()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench(
        "accumulation",
        Benchmark::new("diff_48", |b| {
            let stacked = cycle();
            b.iter(|| diff(black_box(&stacked)))
        })
        .sample_size(20),
    );

    c.bench(
        "accumulation",
        Benchmark::new("fill_nan_3_cycles", |b| {
            let mut gappy = cycle();
            for t in &[0, 16, 32] {
                gappy.index_axis_mut(ndarray::Axis(0), *t).fill(f32::NAN);
            }

            b.iter(|| {
                let mut arr = gappy.clone();
                fill_nan_along_time(black_box(&mut arr)).unwrap();
                arr
            })
        })
        .sample_size(10),
    );

    c.bench(
        "wind",
        Benchmark::new("rotate_9_levels", |b| {
            let alpha = Array2::from_shape_fn((NY, NX), |(j, i)| (i as f32 - j as f32) / NX as f32);
            let rotation = Rotation::new(
                alpha.mapv(f32::cos).into_dyn(),
                alpha.mapv(f32::sin).into_dyn(),
            )
            .unwrap();
            let u = Array3::<f32>::from_elem((9, NY, NX), 3.0).into_dyn();
            let v = Array3::<f32>::from_elem((9, NY, NX), -1.5).into_dyn();

            b.iter(|| {
                rotation
                    .rotate(black_box(&u), black_box(&v), Component::U)
                    .unwrap()
            })
        })
        .sample_size(20),
    );

    c.bench(
        "io",
        Benchmark::new("stack_48", |b| {
            let paths = (0..48)
                .map(|i| PathBuf::from(format!("{}.nc", i)))
                .collect::<Vec<PathBuf>>();

            b.iter(|| {
                let grids = vec![Array2::<f32>::zeros((NY, NX)).into_dyn(); 48];
                stack("T2", &paths, grids).unwrap()
            })
        })
        .sample_size(20),
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
