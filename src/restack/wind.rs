//! Rotation of grid-relative wind components to earth-relative ones.
//!
//! See <http://www2.mmm.ucar.edu/wrf/users/FAQ_files/Miscellaneous.html>: with `alpha` the
//! local rotation of the model grid,
//!
//! ```text
//! U_earth = U_grid * cos(alpha) - V_grid * sin(alpha)
//! V_earth = V_grid * cos(alpha) + U_grid * sin(alpha)
//! ```

use {
    super::Context,
    crate::{
        error::{RestackError, Result},
        io::{self, RawReader},
        parameters::VariableTable,
    },
    log::info,
    ndarray::{ArrayD, Axis, Zip},
    std::path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    U,
    V,
}

/// A wind variable and the variable holding its counterpart at the same level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindPair {
    pub component: Component,
    pub u: String,
    pub v: String,
}

impl WindPair {
    pub fn of(variable: &str) -> Result<Self> {
        let rest = variable.get(1..).unwrap_or_default();
        let component = match variable.chars().next() {
            Some('U') => Component::U,
            Some('V') => Component::V,
            _ => return Err(RestackError::UnknownWindVariable(variable.to_owned())),
        };

        Ok(WindPair {
            component,
            u: format!("U{}", rest),
            v: format!("V{}", rest),
        })
    }
}

/// Cosine and sine of the local grid rotation, read once per run
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    cos: ArrayD<f32>,
    sin: ArrayD<f32>,
}

impl Rotation {
    /// Leading length-one axes (a `Time` dimension, say) are dropped from both fields
    pub fn new(cos: ArrayD<f32>, sin: ArrayD<f32>) -> Result<Self> {
        let (cos, sin) = (squeeze(cos), squeeze(sin));
        if cos.shape() != sin.shape() {
            return Err(RestackError::RotationShape {
                rotation: cos.shape().to_vec(),
                wind: sin.shape().to_vec(),
            });
        }

        Ok(Rotation { cos, sin })
    }

    pub fn load(reader: &dyn RawReader, path: &Path, table: &VariableTable) -> Result<Self> {
        let read = |variable: &str| {
            reader
                .read(path, variable)
                .map_err(|source| RestackError::RawFileRead {
                    path: path.to_owned(),
                    attempts: 1,
                    source,
                })
        };

        Self::new(read(&table.cosine_variable)?, read(&table.sine_variable)?)
    }

    /// Earth-relative `component` from grid-relative `u` and `v` of shape `([level,] y, x)`
    pub fn rotate(
        &self,
        u: &ArrayD<f32>,
        v: &ArrayD<f32>,
        component: Component,
    ) -> Result<ArrayD<f32>> {
        if u.shape() != v.shape() {
            return Err(RestackError::ComponentShape {
                u: u.shape().to_vec(),
                v: v.shape().to_vec(),
            });
        }

        let shape_error = || RestackError::RotationShape {
            rotation: self.cos.shape().to_vec(),
            wind: u.shape().to_vec(),
        };
        let cos = self.cos.broadcast(u.raw_dim()).ok_or_else(shape_error)?;
        let sin = self.sin.broadcast(u.raw_dim()).ok_or_else(shape_error)?;

        let mut out = ArrayD::zeros(u.raw_dim());
        let zip = Zip::from(&mut out).and(u).and(v).and(&cos).and(&sin);
        match component {
            Component::U => zip.for_each(|o, &u, &v, &c, &s| *o = u * c - v * s),
            Component::V => zip.for_each(|o, &u, &v, &c, &s| *o = v * c + u * s),
        }

        Ok(out)
    }
}

fn squeeze(mut arr: ArrayD<f32>) -> ArrayD<f32> {
    while arr.ndim() > 2 && arr.len_of(Axis(0)) == 1 {
        arr = arr.index_axis_move(Axis(0), 0);
    }
    arr
}

/// Earth-relative grids of `variable` for every timestep of `year`, in chronological order
pub fn restack(
    ctx: Context,
    variable: &str,
    year: i32,
    rotation: &Rotation,
) -> Result<ArrayD<f32>> {
    let pair = WindPair::of(variable)?;
    let paths = ctx
        .catalog
        .year(year)
        .into_iter()
        .map(|r| r.filepath.as_path())
        .collect::<Vec<&Path>>();

    if paths.is_empty() {
        return Err(RestackError::YearNotInCatalog { year });
    }

    info!(
        "Rotating {} timesteps of {} {} using {} and {}",
        paths.len(),
        variable,
        year,
        pair.u,
        pair.v
    );

    let rotated = ctx.workers.map(&paths, |path| {
        let u = ctx.reader.read(path, &pair.u)?;
        let v = ctx.reader.read(path, &pair.v)?;
        Ok(rotation.rotate(&u, &v, pair.component))
    })?;

    let grids = rotated.into_iter().collect::<Result<Vec<ArrayD<f32>>>>()?;

    io::stack(variable, &paths, grids)
}

#[cfg(test)]
mod test {
    use {
        super::*,
        approx::assert_abs_diff_eq,
        ndarray::{arr2, Array2, Array3},
        std::f32::consts::PI,
    };

    fn rotation(alpha: f32) -> Rotation {
        Rotation::new(
            Array2::from_elem((1, 1), alpha.cos()).into_dyn(),
            Array2::from_elem((1, 1), alpha.sin()).into_dyn(),
        )
        .unwrap()
    }

    fn scalar(x: f32) -> ArrayD<f32> {
        Array2::from_elem((1, 1), x).into_dyn()
    }

    #[test]
    fn pairs() {
        assert_eq!(
            WindPair {
                component: Component::V,
                u: "U10".to_owned(),
                v: "V10".to_owned()
            },
            WindPair::of("V10").unwrap()
        );
        assert_eq!("VBOT", WindPair::of("UBOT").unwrap().v);
        assert_eq!("U", WindPair::of("V").unwrap().u);
        assert!(WindPair::of("T2").is_err());
    }

    #[test]
    fn quarter_turn() {
        let r = rotation(PI / 2.0);
        let (u, v) = (scalar(1.0), scalar(0.0));

        assert_abs_diff_eq!(
            0.0,
            r.rotate(&u, &v, Component::U).unwrap()[[0, 0]],
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            1.0,
            r.rotate(&u, &v, Component::V).unwrap()[[0, 0]],
            epsilon = 1e-6
        );
    }

    #[test]
    fn preserves_magnitude() {
        let (ug, vg) = (3.5f32, -1.25f32);
        let (u, v) = (scalar(ug), scalar(vg));

        for i in 0..=64 {
            let alpha = -PI + 2.0 * PI * i as f32 / 64.0;
            let r = rotation(alpha);
            let ue = r.rotate(&u, &v, Component::U).unwrap()[[0, 0]];
            let ve = r.rotate(&u, &v, Component::V).unwrap()[[0, 0]];

            assert_abs_diff_eq!(ug * ug + vg * vg, ue * ue + ve * ve, epsilon = 1e-4);
        }
    }

    #[test]
    fn broadcasts_over_levels() {
        let r = Rotation::new(
            arr2(&[[1.0, 0.0]]).into_dyn(),
            arr2(&[[0.0, 1.0]]).into_dyn(),
        )
        .unwrap();
        let u = Array3::from_elem((3, 1, 2), 2.0f32).into_dyn();
        let v = Array3::from_elem((3, 1, 2), 5.0f32).into_dyn();

        let ue = r.rotate(&u, &v, Component::U).unwrap();

        assert_eq!(&[3, 1, 2], ue.shape());
        for level in ue.outer_iter() {
            assert_eq!(2.0, level[[0, 0]]);
            assert_eq!(-5.0, level[[0, 1]]);
        }
    }

    #[test]
    fn squeezes_time_axis() {
        let r = Rotation::new(
            Array3::from_elem((1, 2, 2), 1.0f32).into_dyn(),
            Array3::from_elem((1, 2, 2), 0.0f32).into_dyn(),
        )
        .unwrap();
        let u = Array2::from_elem((2, 2), 4.0f32).into_dyn();

        assert_eq!(u, r.rotate(&u, &u, Component::U).unwrap());
    }

    #[test]
    fn incompatible_grid() {
        let r = rotation(0.0);
        let u = Array2::from_elem((2, 3), 1.0f32).into_dyn();
        let r2 = Rotation::new(
            Array2::from_elem((3, 3), 1.0f32).into_dyn(),
            Array2::from_elem((3, 3), 0.0f32).into_dyn(),
        )
        .unwrap();

        assert!(r.rotate(&u, &u, Component::U).is_ok());
        assert!(matches!(
            r2.rotate(&u, &u, Component::U),
            Err(RestackError::RotationShape { .. })
        ));
    }

    #[test]
    fn mismatched_components() {
        let r = rotation(0.0);
        let u = Array2::from_elem((2, 3), 1.0f32).into_dyn();
        let v = Array3::from_elem((2, 2, 3), 1.0f32).into_dyn();

        match r.rotate(&u, &v, Component::V) {
            Err(RestackError::ComponentShape { u, v }) => {
                assert_eq!(vec![2, 3], u);
                assert_eq!(vec![2, 2, 3], v);
            }
            other => panic!("unexpected result {:?}", other.map(|a| a.shape().to_vec())),
        }
    }
}
