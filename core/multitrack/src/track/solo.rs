//! Gain/solo resolution.
//!
//! The solo selection is engine-wide and passed in by the caller on every
//! call. Tracks never store it.

use crate::{constants::UNITY_GAIN, track::TrackId};

/// Whether a track with `id` and mute state `active` should be heard.
///
/// - soloed itself: audible regardless of `active`
/// - another track soloed: silent
/// - nothing soloed: audible iff `active`
pub fn is_solo_or_active(id: &TrackId, active: bool, solo: Option<&TrackId>) -> bool {
    match solo {
        Some(soloed) if soloed == id => true,
        Some(_) => false,
        None => active,
    }
}

/// Effective gain-stage value. Both gains combine additively around unity, so
/// untouched values (1 and 1) give 1.
pub fn effective_gain(audible: bool, track_gain_value: f32, gain_value: f32) -> f32 {
    if audible {
        track_gain_value + gain_value - UNITY_GAIN
    } else {
        0.0
    }
}
