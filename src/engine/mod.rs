// src/engine/mod.rs
//
// The HTTP-free core: deterministic option shuffling, the per-attempt
// state machine, and the pure scoring/level/window arithmetic.

pub mod scoring;
pub mod session;
pub mod shuffle;
