//! Freshness scoring from raw sensor values.
//!
//! Three independent piecewise-linear sub-scores are combined with fixed
//! weights (VOC 0.60, temperature 0.25, humidity 0.15). VOC is the primary
//! spoilage indicator. The weighted sum is rounded half-away-from-zero and
//! clamped to [0, 100].

const VOC_WEIGHT: f64 = 0.60;
const TEMPERATURE_WEIGHT: f64 = 0.25;
const HUMIDITY_WEIGHT: f64 = 0.15;

// VOC band edges (ppm)
const VOC_LOW: f64 = 50.0;
const VOC_MEDIUM: f64 = 150.0;
const VOC_HIGH: f64 = 300.0;
const VOC_MAX: f64 = 500.0;

// Temperature band edges (°C); 4-10 is optimal for most produce
const TEMP_OPTIMAL_MIN: f64 = 4.0;
const TEMP_OPTIMAL_MAX: f64 = 10.0;
const TEMP_ACCEPTABLE_MAX: f64 = 15.0;
const TEMP_DANGER_MAX: f64 = 30.0;

// Humidity band edges (%); 85-95 is optimal
const HUMIDITY_OPTIMAL_MIN: f64 = 85.0;
const HUMIDITY_OPTIMAL_MAX: f64 = 95.0;
const HUMIDITY_HIGH_MAX: f64 = 98.0;
const HUMIDITY_ACCEPTABLE_MIN: f64 = 60.0;
const HUMIDITY_LOW_MIN: f64 = 40.0;

/// Compute the freshness score for a reading. Total over all inputs: values
/// outside the expected ranges are clamped by the band edges, not rejected.
pub fn freshness_score(voc: f64, temperature: f64, humidity: f64) -> i32 {
    let weighted = voc_score(voc) * VOC_WEIGHT
        + temperature_score(temperature) * TEMPERATURE_WEIGHT
        + humidity_score(humidity) * HUMIDITY_WEIGHT;

    (weighted.round() as i32).clamp(0, 100)
}

/// Lower VOC means fresher produce.
fn voc_score(voc: f64) -> f64 {
    if voc <= VOC_LOW {
        100.0
    } else if voc <= VOC_MEDIUM {
        lerp(voc, VOC_LOW, VOC_MEDIUM, 100.0, 70.0)
    } else if voc <= VOC_HIGH {
        lerp(voc, VOC_MEDIUM, VOC_HIGH, 70.0, 40.0)
    } else if voc <= VOC_MAX {
        lerp(voc, VOC_HIGH, VOC_MAX, 40.0, 10.0)
    } else {
        0.0
    }
}

fn temperature_score(temperature: f64) -> f64 {
    if (TEMP_OPTIMAL_MIN..=TEMP_OPTIMAL_MAX).contains(&temperature) {
        100.0
    } else if (0.0..TEMP_OPTIMAL_MIN).contains(&temperature) {
        85.0
    } else if temperature < 0.0 {
        // Freezing damages most produce
        30.0
    } else if temperature <= TEMP_ACCEPTABLE_MAX {
        lerp(temperature, TEMP_OPTIMAL_MAX, TEMP_ACCEPTABLE_MAX, 100.0, 70.0)
    } else if temperature <= TEMP_DANGER_MAX {
        lerp(temperature, TEMP_ACCEPTABLE_MAX, TEMP_DANGER_MAX, 70.0, 20.0)
    } else {
        10.0
    }
}

fn humidity_score(humidity: f64) -> f64 {
    if (HUMIDITY_OPTIMAL_MIN..=HUMIDITY_OPTIMAL_MAX).contains(&humidity) {
        100.0
    } else if humidity > HUMIDITY_OPTIMAL_MAX && humidity <= HUMIDITY_HIGH_MAX {
        85.0
    } else if humidity > HUMIDITY_HIGH_MAX {
        50.0
    } else if humidity >= HUMIDITY_ACCEPTABLE_MIN {
        lerp(
            humidity,
            HUMIDITY_ACCEPTABLE_MIN,
            HUMIDITY_OPTIMAL_MIN,
            60.0,
            100.0,
        )
    } else if humidity >= HUMIDITY_LOW_MIN {
        lerp(
            humidity,
            HUMIDITY_LOW_MIN,
            HUMIDITY_ACCEPTABLE_MIN,
            30.0,
            60.0,
        )
    } else {
        20.0
    }
}

fn lerp(value: f64, from: f64, to: f64, start: f64, end: f64) -> f64 {
    start + (value - from) / (to - from) * (end - start)
}
