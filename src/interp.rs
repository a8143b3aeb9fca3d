use {
    crate::error::{RestackError, Result},
    ndarray::{ArrayD, ArrayViewMut1, Axis, Zip},
    std::sync::atomic::{AtomicBool, Ordering},
};

/// Replaces NaNs in `y` by linear interpolation between the nearest known neighbours.
///
/// Missing values before the first (after the last) known value take that value. Returns
/// `false` if `y` holds missing values but no known value to fill them from.
pub fn fill_nan(mut y: ArrayViewMut1<f32>) -> bool {
    let n = y.len();
    let mut prev: Option<usize> = None;
    let mut i = 0;

    while i < n {
        if !y[i].is_nan() {
            prev = Some(i);
            i += 1;
            continue;
        }

        let mut j = i;
        while j < n && y[j].is_nan() {
            j += 1;
        }
        let next = if j < n { Some(j) } else { None };

        match (prev, next) {
            (Some(a), Some(b)) => {
                let (ya, yb) = (f64::from(y[a]), f64::from(y[b]));
                let slope = (yb - ya) / (b - a) as f64;
                for k in i..j {
                    y[k] = (slope * (k - a) as f64 + ya) as f32;
                }
            }
            (Some(a), None) => {
                let ya = y[a];
                y.slice_mut(ndarray::s![i..j]).fill(ya);
            }
            (None, Some(b)) => {
                let yb = y[b];
                y.slice_mut(ndarray::s![i..j]).fill(yb);
            }
            (None, None) => return false,
        }

        i = j;
    }

    true
}

/// Interpolates NaNs along the leading (time) axis, independently at every grid point
pub fn fill_nan_along_time(arr: &mut ArrayD<f32>) -> Result<()> {
    let empty = AtomicBool::new(false);

    Zip::from(arr.lanes_mut(Axis(0))).par_for_each(|lane| {
        if !fill_nan(lane) {
            empty.store(true, Ordering::Relaxed);
        }
    });

    if empty.load(Ordering::Relaxed) {
        return Err(RestackError::EmptyInterpolationColumn);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use {
        super::*,
        approx::assert_abs_diff_eq,
        ndarray::{arr1, Array1, Array3},
    };

    fn filled(values: &[f32]) -> Array1<f32> {
        let mut y = arr1(values);
        assert!(fill_nan(y.view_mut()));
        y
    }

    #[test]
    fn interior_gap() {
        assert_eq!(arr1(&[1.0, 2.0, 3.0]), filled(&[1.0, f32::NAN, 3.0]));
        assert_eq!(
            arr1(&[0.0, 1.0, 2.0, 3.0]),
            filled(&[0.0, f32::NAN, f32::NAN, 3.0])
        );
    }

    #[test]
    fn edges_clamp() {
        assert_eq!(arr1(&[3.0, 3.0, 4.0]), filled(&[f32::NAN, 3.0, 4.0]));
        assert_eq!(arr1(&[3.0, 4.0, 4.0]), filled(&[3.0, 4.0, f32::NAN]));
    }

    #[test]
    fn nothing_missing() {
        assert_eq!(arr1(&[5.0, 1.0]), filled(&[5.0, 1.0]));
        assert_eq!(Array1::<f32>::zeros(0), filled(&[]));
    }

    #[test]
    fn all_missing() {
        let mut y = arr1(&[f32::NAN, f32::NAN]);
        assert!(!fill_nan(y.view_mut()));
    }

    #[test]
    fn independent_columns() {
        let mut arr = Array3::<f32>::zeros((3, 2, 2));
        arr[[0, 0, 0]] = 2.0;
        arr[[1, 0, 0]] = f32::NAN;
        arr[[2, 0, 0]] = 4.0;
        arr[[1, 1, 1]] = f32::NAN;
        arr[[2, 1, 1]] = 10.0;
        let mut arr = arr.into_dyn();

        fill_nan_along_time(&mut arr).unwrap();

        assert_abs_diff_eq!(3.0, arr[[1, 0, 0]]);
        assert_abs_diff_eq!(5.0, arr[[1, 1, 1]]);
        assert_abs_diff_eq!(0.0, arr[[1, 0, 1]]);
        assert!(arr.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn empty_column() {
        let mut arr = Array3::<f32>::from_elem((2, 1, 2), f32::NAN);
        arr[[0, 0, 0]] = 1.0;
        let mut arr = arr.into_dyn();

        assert!(matches!(
            fill_nan_along_time(&mut arr),
            Err(RestackError::EmptyInterpolationColumn)
        ));
    }
}
