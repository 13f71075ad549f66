use thiserror::Error;

/// Parameter validation failures.
///
/// The generators never fail; these errors are raised by the config layer
/// before parameters reach them.
#[derive(Debug, Error)]
pub enum SylvaError {
    #[error("{field} = {value} is outside the accepted range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("min_scale ({min}) must not exceed max_scale ({max})")]
    ScaleRangeInverted { min: f32, max: f32 },

    #[error("unknown tree type {0}, expected 0-3")]
    UnknownTreeType(i64),

    #[error("unknown tree type name {0:?}")]
    UnknownTreeName(String),

    #[error("invalid params JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check `value` against the inclusive range `[min, max]`.
pub(crate) fn check_range<T>(field: &'static str, value: T, min: T, max: T) -> Result<(), SylvaError>
where
    T: PartialOrd + Into<f64> + Copy,
{
    // NaN fails both comparisons, so reject it explicitly.
    let v: f64 = value.into();
    if v.is_nan() || value < min || value > max {
        return Err(SylvaError::OutOfRange { field, value: v, min: min.into(), max: max.into() });
    }
    Ok(())
}
