//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod missions;

pub use missions::{MissionLibrary, drive_step, image_step, mission_json, video_step};
