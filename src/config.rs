/// The runtime tuning parameters for the touch controller are represented here.
///
/// These are fixed for a given deployment but kept as plain construction parameters so
/// that tests can exercise the controller across configurations. The capacities which
/// size the internal arrays (ring size, polyphony, filter window) are const generic
/// arguments on the controller instead, since they determine storage.
#[derive(Clone, Copy, Debug)]
pub struct TouchConfig {
    /// A pad's filtered value must exceed this for the pad to count as a touched peak.
    ///
    /// Compared against the unscaled moving sum, so it is roughly `WINDOW` times the
    /// per-reading threshold you actually want.
    pub touch_threshold: u32,

    /// How far (in ring units) a detected bump may be from an existing touch point and
    /// still count as that same finger having moved.
    pub close_range: f32,

    /// Number of pads on each side of a raw peak included in the weighted centroid.
    pub centroid_half_width: usize,

    /// How far (in ring units) a touch may drift past its current note's center before
    /// the note is re-quantized.
    ///
    /// Values above 0.5 give the sticky, oscillation-free feel: a touch has to commit
    /// to the next pad before the note changes.
    pub hysteresis_margin: f32,

    /// Added to the quantized ring index to form the MIDI note number.
    pub note_offset: u8,

    /// Number of consecutive unmatched ticks an active touch survives before release.
    pub grace_ticks: u32,
}

impl Default for TouchConfig {
    /// The values used by the instrument firmware, tuned on the actual hardware.
    fn default() -> Self {
        Self {
            touch_threshold: 40,
            close_range: 3.0,
            centroid_half_width: 3,
            hysteresis_margin: 0.7,
            note_offset: 24,
            grace_ticks: 5,
        }
    }
}
