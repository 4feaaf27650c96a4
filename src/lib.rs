//! Traffic Control Library
//!
//! The simulated traffic-network control core: an intersection registry
//! driven by per-signal phase timers, a stochastic congestion model, a
//! rule-based alert engine, an incident log, and network-wide
//! emergency/corridor coordination. Runs headless; map and dashboard
//! front ends are thin snapshot consumers.

pub mod control;
