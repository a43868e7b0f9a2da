//! The bricks game: a pile of bricks, a human and a computer taking turns,
//! and whoever takes the last brick wins.
//!
//! [`game`] holds the rules and the turn loop, [`ai`] the computer's move
//! policy, [`stats`] and [`storage`] the per-account win/loss counters.

pub mod ai;
pub mod auth;
pub mod game;
pub mod i18n;
pub mod stats;
pub mod storage;
pub mod ui;
