use ndarray::{Array, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, Slice};

use crate::types::{SiftError, SiftResult};

/// Default orbit-bin window shown in the reflectivity profile plot
pub const DEFAULT_ORBIT_WINDOW: (usize, usize) = (17500, 19500);

/// Shift negative longitudes by +360 so swaths crossing the dateline stay
/// contiguous. Returns a new array; the input is left untouched.
pub fn wrap_longitudes<S, D>(longitudes: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    longitudes.mapv(|lon| if lon < 0.0 { lon + 360.0 } else { lon })
}

/// Rows `start..end` of an orbit-bin x range-bin profile, transposed to
/// range-bin x orbit-bin for plotting.
pub fn orbit_window<S>(
    profile: &ArrayBase<S, ndarray::Ix2>,
    start: usize,
    end: usize,
) -> SiftResult<ArrayView2<'_, f64>>
where
    S: Data<Elem = f64>,
{
    let rows = profile.nrows();
    if start >= end {
        return Err(SiftError::InvalidArgument(format!(
            "orbit window is empty: {}..{}",
            start, end
        )));
    }
    if end > rows {
        return Err(SiftError::InvalidArgument(format!(
            "orbit window {}..{} exceeds profile length {}",
            start, end, rows
        )));
    }

    log::debug!(
        "Extracting orbit bins {}..{} of {} ({} range bins)",
        start,
        end,
        rows,
        profile.ncols()
    );

    Ok(profile
        .slice_axis(Axis(0), Slice::from(start..end))
        .reversed_axes())
}

/// `orbit_window` for a dynamically shaped field; fails unless it is 2-D
pub fn orbit_window_dyn(
    profile: &ndarray::ArrayD<f64>,
    start: usize,
    end: usize,
) -> SiftResult<Array2<f64>> {
    let profile = profile
        .view()
        .into_dimensionality::<ndarray::Ix2>()
        .map_err(|_| {
            SiftError::InvalidArgument(format!(
                "orbit window needs a 2-D profile, got shape {:?}",
                profile.shape()
            ))
        })?;
    Ok(orbit_window(&profile, start, end)?.to_owned())
}
