//! Core of the Glance RSVP reader.
//!
//! Everything here is `no_std + alloc`: text shaping, timing, index mapping,
//! page segmentation and the tick-driven playback engine. Hosts provide the
//! clock, the store and the command source.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app;
pub mod codec;
pub mod document;
pub mod index;
pub mod input;
pub mod orp;
pub mod pages;
pub mod render;
pub mod settings;
pub mod store;
pub mod text;
pub mod timing;
