/// Square meters in one hectare
pub const M2_PER_HECTARE: f64 = 10_000.0;

pub fn square_meters_to_hectares(area_m2: f64) -> f64 {
    area_m2 / M2_PER_HECTARE
}

/// Round to `decimals` places, ties to even (same as pandas `.round`)
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Share of `part` in `total` as a percentage.
/// `None` when `total` is not strictly positive.
pub fn percent_of(part: f64, total: f64) -> Option<f64> {
    if total > 0.0 {
        Some(part / total * 100.0)
    } else {
        None
    }
}
