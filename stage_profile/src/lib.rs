//! Core library for the stage guessing game backend.
//!
//! The centre of the crate is [`profile`], which turns sparse elevation samples
//! into an evenly spaced gradient profile. The remaining modules describe
//! stages and results, check trivia answers, and read samples from files or a
//! SQLite stage store.

pub mod answer;
pub mod config;
pub mod io;
pub mod profile;
pub mod stage;

pub use config::ProfileConfig;
pub use profile::{
    interpolate_elevation, interpolate_gradient_profile, interpolate_gradient_profile_with,
    ElevationPoint, ElevationProfile, FinalPoint, GradientPoint, ProfileError,
};
