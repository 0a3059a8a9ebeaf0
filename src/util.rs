use itertools::Itertools;


// Mean of the values, or 0 for an empty input.
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

// Population standard deviation, or 0 for an empty input.
pub fn std_dev(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let m = mean(values.clone());
    let (sum_sq, count) =
        values.fold((0.0, 0), |(sum_sq, count), v| (sum_sq + (v - m) * (v - m), count + 1));
    if count == 0 { 0.0 } else { (sum_sq / count as f64).sqrt() }
}

// Rounds halves towards positive infinity, so that -2.5 becomes -2 and 2.5 becomes 3.
pub fn round_half_up(value: f64) -> i64 { (value + 0.5).floor() as i64 }

pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub fn ids_to_string<T: std::fmt::Display>(ids: impl IntoIterator<Item = T>) -> String {
    ids.into_iter().join(", ")
}
