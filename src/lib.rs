//! Regulate: debounce and throttle async outputs driven by pushed values.
//!
//! A [`regulator::Regulator`] sits between a producer pushing values at any
//! rate and an async output that should only see a paced subset of them.
//! The [`adapter`] module wraps a regulator around a stored value or an
//! action, and [`config`] backs the `regulate` command-line tool.

pub mod adapter;
pub mod config;
pub mod regulator;
pub mod time;
