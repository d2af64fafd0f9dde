use crate::models::ranking::{Trend, TrendDirection};

/// Classifies movement from `previous` to `current`. Lower ranks are better,
/// so a drop in the number is an `Up` move.
pub fn classify(current: Option<f64>, previous: Option<f64>) -> Trend {
    let (Some(current), Some(previous)) = (current, previous) else {
        return Trend::unknown();
    };

    let delta = previous - current;
    if delta > 0.0 {
        Trend {
            direction: TrendDirection::Up,
            magnitude: Some(delta),
        }
    } else if delta < 0.0 {
        Trend {
            direction: TrendDirection::Down,
            magnitude: Some(delta.abs()),
        }
    } else {
        Trend {
            direction: TrendDirection::Same,
            magnitude: Some(0.0),
        }
    }
}

pub fn classify_edition(current: Option<u32>, previous: Option<u32>) -> Trend {
    classify(current.map(f64::from), previous.map(f64::from))
}
