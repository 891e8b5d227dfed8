//! # Capacitive ring touch controller core
//!
//! This crate turns a ring of raw capacitive pad readings into a small number of
//! continuously-moving touch points, each bound to a stable MIDI note. It is the
//! signal-processing heart of a ring-shaped touch instrument: pads are sampled once
//! per tick, touches are detected as bumps in the filtered readings, and each touch
//! emits note-on/note-off events as it appears, slides around the ring, and lifts off.
//!
//! # Inputs
//!
//! * One raw 16 bit reading per pad per tick, fed in by whatever samples the sensor chips
//!
//! # Outputs
//!
//! * MIDI-style note events `(kind, note, velocity)` delivered through a callback
//! injected at construction
//!
//! * A per-touch `(location, intensity)` feed for driving LED feedback, queried through
//! a second callback
//!
//! This crate has no direct connection to the physical hardware. Reading the sensor
//! chips, multiplexing the bus, lighting the LEDs, and shipping the note events off the
//! device all belong to the caller; the core only does the math in between. This keeps
//! the whole thing testable on a host machine with made up readings.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod midi;
pub mod pad_filter;
pub mod touch_point;
pub mod touch_controller;
