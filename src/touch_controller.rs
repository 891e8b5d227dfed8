use core::array;

use heapless::Vec;
use num_traits::float::Float;

use crate::config::TouchConfig;
use crate::midi::NoteEvent;
use crate::pad_filter::PadFilter;
use crate::touch_point::TouchPoint;

/// The location reported to the visual-feedback callback when nothing is touched.
///
/// Deliberately outside the valid ring range `[0, RING)` so a renderer can clear its
/// display without special-casing emptiness itself.
pub const NO_TOUCH_LOCATION: f32 = -1.0;

/// The whole tracked state of the ring instrument is represented here.
///
/// The controller owns one `PadFilter` per ring position and a fixed pool of `POLY`
/// touch points, all by value. Every sampling tick the caller feeds one raw reading per
/// pad and then runs one detection pass: bumps in the filtered ring profile are found
/// by a zero-crossing scan of the neighbor differences, refined into weighted
/// centroids, and matched against the touch points already in flight. Note events fall
/// out of the touch points through the callback injected at construction.
///
/// * `RING` - the number of pads around the ring
///
/// * `POLY` - the polyphony ceiling, how many simultaneous touches are tracked
///
/// * `WINDOW` - the moving-average window length of each pad filter
///
/// A tick is O(`RING` + `POLY` × centroid window) with no allocation, so the whole pass
/// fits comfortably inside a hard real-time sampling period. The note and LED callbacks
/// run inline on the same tick and must not block; anything slow (serial transports and
/// such) should queue on the caller's side.
pub struct TouchController<E, const RING: usize, const POLY: usize, const WINDOW: usize> {
    /// The pad filter ring
    pads: [PadFilter<WINDOW>; RING],

    /// The polyphony pool
    touch_points: [TouchPoint; POLY],

    /// Number of raw peak candidates found in the most recent detection pass
    touch_count: usize,

    cfg: TouchConfig,

    /// The injected note-emission capability
    emit: E,
}

impl<E, const RING: usize, const POLY: usize, const WINDOW: usize>
    TouchController<E, RING, POLY, WINDOW>
where
    E: FnMut(NoteEvent),
{
    /// `TouchController::new(cfg, emit)` is a new controller with all pads zeroed and
    /// every touch point free.
    ///
    /// # Arguments:
    ///
    /// * `cfg` - the runtime tuning parameters
    ///
    /// * `emit` - called synchronously with every note event the instrument produces
    pub fn new(cfg: TouchConfig, emit: E) -> Self {
        Self {
            pads: array::from_fn(|_| PadFilter::new()),
            touch_points: array::from_fn(|_| TouchPoint::new(RING, cfg)),
            touch_count: 0,
            cfg,
            emit,
        }
    }

    /// `tc.set_reading(p, raw)` feeds one raw sensor reading into pad `p`.
    ///
    /// The caller supplies one reading per ring position per tick, before running
    /// `detect_and_update`. Out-of-range indices wrap onto the ring.
    pub fn set_reading(&mut self, pad: usize, raw: u16) {
        self.pads[Self::ring_index(pad as i32)].set_reading(raw);
    }

    /// `tc.touch_count()` is the number of raw bumps found in the most recent pass.
    pub fn touch_count(&self) -> usize {
        self.touch_count
    }

    /// `tc.touch_point(i)` is a read-only view of polyphony slot `i`.
    pub fn touch_point(&self, index: usize) -> &TouchPoint {
        &self.touch_points[index]
    }

    /// `tc.pad(p)` is a read-only view of the filter for ring position `p`.
    ///
    /// Out-of-range indices wrap onto the ring.
    pub fn pad(&self, pad: usize) -> &PadFilter<WINDOW> {
        &self.pads[Self::ring_index(pad as i32)]
    }

    /// `tc.detect_and_update()` runs one full detection pass. Call exactly once per tick,
    /// after feeding the readings.
    ///
    /// Bumps are scanned, refined, and matched; touch points that went unmatched age
    /// toward release and matched ones get their per-tick bookkeeping closed out. All
    /// note events for the tick are emitted inline from here.
    pub fn detect_and_update(&mut self) {
        let raw_peaks = self.scan_for_peaks();
        self.touch_count = raw_peaks.len();

        for &p in &raw_peaks {
            let (location, intensity) = self.refine_centroid(p);
            self.match_or_allocate(location, intensity);
        }

        for tp in self.touch_points.iter_mut() {
            if tp.was_matched() {
                tp.end_of_tick();
            } else {
                tp.age_if_unmatched(&mut self.emit);
            }
        }
    }

    /// `tc.for_each_active(visit)` calls `visit(location, intensity)` once per active
    /// touch point, for driving LED feedback.
    ///
    /// If no touch point is active, `visit` is called exactly once with the
    /// `(NO_TOUCH_LOCATION, 0)` sentinel so the renderer can clear deterministically.
    pub fn for_each_active<V: FnMut(f32, i32)>(&self, mut visit: V) {
        let mut any_active = false;
        for tp in self.touch_points.iter() {
            if tp.is_active() {
                visit(tp.location(), tp.intensity());
                any_active = true;
            }
        }
        if !any_active {
            visit(NO_TOUCH_LOCATION, 0);
        }
    }

    /// `tc.scan_for_peaks()` walks the ring once and collects the raw peak candidates
    /// in ring order.
    ///
    /// A pad is a raw peak when the neighbor differences cross from falling to rising
    /// right after it (its own delta negative, the next pad's delta non-negative) and
    /// its filtered value clears the touch threshold. The walk takes one extra step past
    /// the full circumference so the seam between the last and first pad is examined
    /// like any other pair. Collection stops at the polyphony ceiling; later candidates
    /// in the same tick are dropped.
    fn scan_for_peaks(&mut self) -> Vec<usize, POLY> {
        for pad in self.pads.iter_mut() {
            pad.clear_peak();
        }

        let mut peaks = Vec::new();
        let mut diff_before: i32 = 0;
        for i in 0..=(RING as i32) {
            let neighbor_current = self.pads[Self::ring_index(i - 1)].current();
            let diff_after = self.pads[Self::ring_index(i)].set_delta(neighbor_current);

            if diff_before < 0 && diff_after >= 0 {
                let p = Self::ring_index(i - 1);
                if self.pads[p].current() > self.cfg.touch_threshold {
                    self.pads[p].mark_peak();
                    if peaks.push(p).is_err() {
                        break;
                    }
                }
            }
            diff_before = diff_after;
        }
        peaks
    }

    /// `tc.refine_centroid(p)` is the `(location, intensity)` of the bump whose raw peak
    /// sits at pad `p`.
    ///
    /// Location is the intensity-weighted average position over the window of pads
    /// around `p`, computed with unwrapped positions so the average stays continuous
    /// across the ring seam, then normalized back into `[0, RING)`. Intensity is the
    /// plain sum of the window.
    fn refine_centroid(&self, p: usize) -> (f32, i32) {
        let half = self.cfg.centroid_half_width as i32;
        let mut weight_sum: i32 = 0;
        let mut weighted_pos: f32 = 0.0;

        for offset in -half..=half {
            let unwrapped = p as i32 + offset;
            let weight = self.pads[Self::ring_index(unwrapped)].current() as i32;
            weight_sum += weight;
            weighted_pos += unwrapped as f32 * weight as f32;
        }

        // the peak itself cleared the threshold, so the window sum is never zero
        let location = Self::normalize_location(weighted_pos / weight_sum as f32);
        (location, weight_sum)
    }

    /// `tc.match_or_allocate(loc, i)` routes one refined bump to the touch point pool.
    ///
    /// The active, not-yet-matched touch point with the smallest position difference
    /// claims the bump if it lies within the closeness range; otherwise the first free
    /// slot starts a new touch. With every slot active and nothing close enough, the
    /// bump is dropped: that is the polyphony ceiling, not a failure.
    fn match_or_allocate(&mut self, location: f32, intensity: i32) {
        let mut closest: Option<usize> = None;
        let mut closest_dist = f32::INFINITY;
        for (i, tp) in self.touch_points.iter().enumerate() {
            if !tp.is_active() || tp.was_matched() {
                continue;
            }
            let dist = (tp.location() - location).abs();
            if dist < closest_dist {
                closest_dist = dist;
                closest = Some(i);
            }
        }

        if let Some(i) = closest {
            if self.touch_points[i].is_within(location) {
                self.touch_points[i].move_to(location, intensity, &mut self.emit);
                return;
            }
        }

        if let Some(free) = self.touch_points.iter_mut().find(|tp| !tp.is_active()) {
            free.activate(location, intensity, &mut self.emit);
        }
    }

    /// `TouchController::ring_index(i)` maps any integer offset onto a valid ring index.
    ///
    /// Adds the ring size back in before the final remainder, since a single `%` on a
    /// negative value would stay negative.
    fn ring_index(i: i32) -> usize {
        let n = RING as i32;
        (((i % n) + n) % n) as usize
    }

    /// `TouchController::normalize_location(loc)` wraps a continuous position into `[0, RING)`.
    fn normalize_location(mut location: f32) -> f32 {
        let n = RING as f32;
        while location < 0.0 {
            location += n;
        }
        while location >= n {
            location -= n;
        }
        location
    }
}
