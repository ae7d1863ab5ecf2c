//! JSON persistence for rating profiles.

use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use super::RatingProfile;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("profile io error: {0}")]
    Io(#[from] io::Error),
    #[error("profile json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads a profile, substituting defaults for a missing file or missing fields.
pub fn load_profile(path: &Path) -> Result<RatingProfile, StoreError> {
    if !path.exists() {
        info!(
            "no profile at {}, starting from defaults",
            path.display()
        );
        return Ok(RatingProfile::default());
    }

    let contents = fs::read_to_string(path)?;
    let mut profile: RatingProfile = serde_json::from_str(&contents)?;
    profile.normalize();
    Ok(profile)
}

/// Like [`load_profile`], but a damaged file falls back to defaults.
pub fn load_profile_or_default(path: &Path) -> RatingProfile {
    match load_profile(path) {
        Ok(profile) => profile,
        Err(error) => {
            warn!(
                "failed to load profile {}: {}; using defaults",
                path.display(),
                error
            );
            RatingProfile::default()
        }
    }
}

pub fn save_profile(profile: &RatingProfile, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(profile)?;
    fs::write(path, json)?;
    Ok(())
}
