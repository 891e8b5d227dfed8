use num_traits::float::Float;

use crate::config::TouchConfig;
use crate::midi::{intensity_to_velocity, NoteEvent};

/// One slot of the polyphony pool is represented here.
///
/// A touch point is either free or actively tracking one finger on the ring. While
/// active it carries the continuous centroid position of the contact, its intensity,
/// and the single discrete note currently sounding for it. The note only changes when
/// the position commits past a hysteresis margin, so a finger resting near a pad
/// boundary never makes the note chatter.
///
/// An active touch point that stops being matched to a detected bump is not released
/// immediately: it survives a short grace period of unmatched ticks first, which rides
/// out one-tick sensor dropouts without retriggering the note.
pub struct TouchPoint {
    /// Number of pads on the ring, the exclusive upper bound for note quantization
    ring_size: usize,

    cfg: TouchConfig,

    /// Continuous ring position of the contact, meaningful only while active
    center: f32,

    /// Sensor-domain intensity of the contact
    intensity: i32,

    /// The ring index of the note currently sounding; `None` means this slot is free
    note: Option<u8>,

    /// Set when a detected bump claims this point during the current tick
    matched_this_tick: bool,

    /// Advances every tick this point is active
    age: u32,

    /// The value `age` had at the end of the last matched tick
    last_matched_age: u32,
}

impl TouchPoint {
    /// `TouchPoint::new(n, cfg)` is a free touch point for a ring of `n` pads.
    pub fn new(ring_size: usize, cfg: TouchConfig) -> Self {
        Self {
            ring_size,
            cfg,
            center: 0.0,
            intensity: 0,
            note: None,
            matched_this_tick: false,
            age: 0,
            last_matched_age: 0,
        }
    }

    /// `tp.is_active()` is `true` iff this point is currently tracking a contact.
    pub fn is_active(&self) -> bool {
        self.note.is_some()
    }

    /// `tp.was_matched()` is `true` iff a detected bump claimed this point this tick.
    pub fn was_matched(&self) -> bool {
        self.matched_this_tick
    }

    /// `tp.location()` is the continuous ring position, only meaningful while active.
    pub fn location(&self) -> f32 {
        self.center
    }

    /// `tp.intensity()` is the sensor-domain intensity of the contact.
    pub fn intensity(&self) -> i32 {
        self.intensity
    }

    /// `tp.midi_note()` is the MIDI note currently sounding for this point, if any.
    pub fn midi_note(&self) -> Option<u8> {
        self.note.map(|idx| idx.wrapping_add(self.cfg.note_offset))
    }

    /// `tp.activate(loc, i, emit)` claims this free slot for a new contact.
    ///
    /// Quantizes `loc` to the nearest pad, emits a note-on through `emit` with the
    /// velocity derived from intensity `i`, and starts the age counters. Does nothing
    /// if `loc` cannot be quantized to a valid pad, or if the slot is already active.
    pub fn activate<E: FnMut(NoteEvent)>(&mut self, location: f32, intensity: i32, emit: &mut E) {
        if self.is_active() {
            return;
        }
        let idx = match self.quantize(location) {
            Some(idx) => idx,
            None => return,
        };

        self.center = location;
        self.intensity = intensity;
        self.note = Some(idx);
        self.matched_this_tick = true;
        self.age = 0;
        self.last_matched_age = 0;

        emit(NoteEvent::note_on(
            idx.wrapping_add(self.cfg.note_offset),
            intensity_to_velocity(intensity),
        ));
    }

    /// `tp.is_within(loc)` is `true` iff this point is active and `loc` lies within the
    /// closeness range of its current position.
    ///
    /// Used by the controller for matching; never mutates state.
    pub fn is_within(&self, location: f32) -> bool {
        self.is_active() && (location - self.center).abs() <= self.cfg.close_range
    }

    /// `tp.move_to(loc, i, emit)` moves this active point to a freshly detected bump.
    ///
    /// The continuous position and intensity always update so the LED feedback follows
    /// the finger smoothly. The sounding note only changes when `loc` has drifted more
    /// than the hysteresis margin past the current note's center; when it does, the old
    /// note is turned off and the new one turned on as a pair.
    pub fn move_to<E: FnMut(NoteEvent)>(&mut self, location: f32, intensity: i32, emit: &mut E) {
        let old_idx = match self.note {
            Some(idx) => idx,
            None => return,
        };

        self.center = location;
        self.intensity = intensity;
        self.matched_this_tick = true;

        if (location - f32::from(old_idx)).abs() <= self.cfg.hysteresis_margin {
            return;
        }
        if let Some(new_idx) = self.quantize(location) {
            if new_idx != old_idx {
                self.note = Some(new_idx);
                emit(NoteEvent::note_off(
                    old_idx.wrapping_add(self.cfg.note_offset),
                ));
                emit(NoteEvent::note_on(
                    new_idx.wrapping_add(self.cfg.note_offset),
                    intensity_to_velocity(intensity),
                ));
            }
        }
    }

    /// `tp.age_if_unmatched(emit)` ages this active point through one tick with no match.
    ///
    /// Once the point has gone the full grace period without a match it emits its final
    /// note-off and frees the slot.
    pub fn age_if_unmatched<E: FnMut(NoteEvent)>(&mut self, emit: &mut E) {
        let idx = match self.note {
            Some(idx) => idx,
            None => return,
        };

        self.age = self.age.wrapping_add(1);
        if self.age.wrapping_sub(self.last_matched_age) >= self.cfg.grace_ticks {
            emit(NoteEvent::note_off(idx.wrapping_add(self.cfg.note_offset)));
            self.note = None;
            self.intensity = 0;
        }
    }

    /// `tp.end_of_tick()` finishes a matched tick: advances the age counter, anchors
    /// "last matched" at now, and clears the matched flag for the next tick.
    pub fn end_of_tick(&mut self) {
        if self.is_active() {
            self.age = self.age.wrapping_add(1);
            self.last_matched_age = self.age;
        }
        self.matched_this_tick = false;
    }

    /// `tp.quantize(loc)` is the ring index nearest to `loc`, clamped into the ring.
    ///
    /// `None` only for non-finite input, which aborts the single activation or move
    /// that produced it.
    fn quantize(&self, location: f32) -> Option<u8> {
        if !location.is_finite() || self.ring_size == 0 {
            return None;
        }
        let idx = location.round().max(0.0) as usize;
        Some(idx.min(self.ring_size - 1) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{MidiMessage, MAX_VELOCITY, VELOCITY_BAND_FLOOR};
    use core::cell::RefCell;
    use std::vec::Vec;

    const RING_SIZE: usize = 24;

    /// `test_point()` is a free touch point with the stock config (offset 24, grace 5)
    fn test_point() -> TouchPoint {
        TouchPoint::new(RING_SIZE, TouchConfig::default())
    }

    #[test]
    fn fresh_point_is_free() {
        let tp = test_point();
        assert!(!tp.is_active());
        assert_eq!(tp.midi_note(), None);
    }

    #[test]
    fn activation_emits_one_note_on_in_band() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(10.2, 900, &mut emit);

        assert!(tp.is_active());
        assert!(tp.was_matched());
        assert_eq!(tp.midi_note(), Some(10 + 24));

        let events = events.into_inner();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MidiMessage::NoteOn);
        assert_eq!(events[0].note, 10 + 24);
        assert!(VELOCITY_BAND_FLOOR <= events[0].velocity);
        assert!(events[0].velocity <= MAX_VELOCITY);
    }

    #[test]
    fn quantization_clamps_to_ring_edges() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut low = test_point();
        low.activate(-0.4, 500, &mut emit);
        assert_eq!(low.midi_note(), Some(24));

        let mut high = test_point();
        high.activate(23.8, 500, &mut emit);
        assert_eq!(high.midi_note(), Some(23 + 24));
    }

    #[test]
    fn non_finite_location_aborts_activation() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(f32::NAN, 500, &mut emit);
        assert!(!tp.is_active());
        assert!(events.into_inner().is_empty());
    }

    #[test]
    fn is_within_false_while_free() {
        let tp = test_point();
        assert!(!tp.is_within(0.0));
    }

    #[test]
    fn is_within_respects_close_range() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(10.0, 500, &mut emit);
        assert!(tp.is_within(12.5));
        assert!(!tp.is_within(14.0));
    }

    #[test]
    fn moves_inside_hysteresis_band_emit_nothing() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(10.0, 500, &mut emit);
        events.borrow_mut().clear();

        for loc in [10.3, 9.4, 10.65, 9.35] {
            tp.move_to(loc, 500, &mut emit);
            tp.end_of_tick();
        }

        assert!(events.into_inner().is_empty());
        assert_eq!(tp.midi_note(), Some(10 + 24));
        // position still followed the finger
        assert!((tp.location() - 9.35).abs() < 1e-6);
    }

    #[test]
    fn move_past_hysteresis_emits_off_then_on() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(10.0, 500, &mut emit);
        events.borrow_mut().clear();

        // 0.8 past the note center, beyond the 0.7 margin
        tp.move_to(10.8, 500, &mut emit);

        let events = events.into_inner();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], NoteEvent::note_off(10 + 24));
        assert_eq!(events[1].kind, MidiMessage::NoteOn);
        assert_eq!(events[1].note, 11 + 24);
        assert_eq!(tp.midi_note(), Some(11 + 24));
    }

    #[test]
    fn grace_period_holds_note_then_releases_once() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(10.0, 500, &mut emit);
        tp.end_of_tick();
        events.borrow_mut().clear();

        // four unmatched ticks: still sounding
        for _ in 0..4 {
            tp.age_if_unmatched(&mut emit);
            assert!(tp.is_active());
        }
        assert!(events.borrow().is_empty());

        // fifth unmatched tick releases
        tp.age_if_unmatched(&mut emit);
        assert!(!tp.is_active());

        let events = events.into_inner();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], NoteEvent::note_off(10 + 24));
    }

    #[test]
    fn rematch_during_grace_restarts_the_clock() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(10.0, 500, &mut emit);
        tp.end_of_tick();

        for _ in 0..3 {
            tp.age_if_unmatched(&mut emit);
        }
        // the finger comes back before the grace runs out
        tp.move_to(10.1, 500, &mut emit);
        tp.end_of_tick();

        // a full grace period is needed again
        for _ in 0..4 {
            tp.age_if_unmatched(&mut emit);
            assert!(tp.is_active());
        }
        tp.age_if_unmatched(&mut emit);
        assert!(!tp.is_active());
    }

    #[test]
    fn released_slot_is_reusable() {
        let events = RefCell::new(Vec::new());
        let mut emit = |ev: NoteEvent| events.borrow_mut().push(ev);

        let mut tp = test_point();
        tp.activate(5.0, 500, &mut emit);
        tp.end_of_tick();
        for _ in 0..5 {
            tp.age_if_unmatched(&mut emit);
        }
        assert!(!tp.is_active());

        tp.activate(18.0, 700, &mut emit);
        assert!(tp.is_active());
        assert_eq!(tp.midi_note(), Some(18 + 24));
    }
}
