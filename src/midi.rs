/// The two MIDI messages the touch controller can produce.
///
/// The discriminants are the MIDI status bytes so a transport collaborator can render
/// wire bytes directly with `kind as u8 | channel`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MidiMessage {
    NoteOn = 0x90,
    NoteOff = 0x80,
}

/// A single note event emitted by the touch controller.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NoteEvent {
    pub kind: MidiMessage,
    pub note: u8,
    pub velocity: u8,
}

impl NoteEvent {
    /// `NoteEvent::note_on(n, v)` is a note-on event for note `n` at velocity `v`
    pub fn note_on(note: u8, velocity: u8) -> Self {
        Self {
            kind: MidiMessage::NoteOn,
            note,
            velocity,
        }
    }

    /// `NoteEvent::note_off(n)` is a note-off event for note `n` at the fixed release velocity
    pub fn note_off(note: u8) -> Self {
        Self {
            kind: MidiMessage::NoteOff,
            note,
            velocity: RELEASE_VELOCITY,
        }
    }

    /// `ev.status_byte()` is the MIDI status byte for this event, before channel merging
    pub fn status_byte(&self) -> u8 {
        self.kind as u8
    }
}

/// `intensity_to_velocity(i)` is the touch intensity `i` compressed into the note-on velocity band.
///
/// The raw intensity scale depends on the sensor chips and the filter window, so rather
/// than map it across the full MIDI range (which would make most notes whisper-quiet)
/// the intensity is clamped and squeezed into the upper third of the range. Loudness
/// differences stay audible but the instrument never emits extreme velocities.
pub fn intensity_to_velocity(intensity: i32) -> u8 {
    let clamped = intensity.clamp(0, INTENSITY_FULL_SCALE);
    let span = (MAX_VELOCITY - VELOCITY_BAND_FLOOR) as i32;
    VELOCITY_BAND_FLOOR + ((clamped * span) / INTENSITY_FULL_SCALE) as u8
}

/// The velocity sent with note-off messages
pub const RELEASE_VELOCITY: u8 = 0;

/// The maximum value for a velocity message
pub const MAX_VELOCITY: u8 = (1 << 7) - 1;

/// The bottom of the note-on velocity band, roughly two thirds of the way up the MIDI range
pub const VELOCITY_BAND_FLOOR: u8 = 86;

/// Intensities at or above this hit the top of the velocity band.
///
/// Sized for the AT42QT-class sensors: per-pad readings of a firm press run a few
/// hundred counts, times the 4-sample moving sum, summed over the centroid window.
const INTENSITY_FULL_SCALE: i32 = 4096;
