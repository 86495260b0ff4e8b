use crate::profile::types::ExtractionProfile;
use crate::profile::validation::validate;
use crate::ProfileError;
use std::path::Path;

/// Loads and validates an extraction profile from a JSON file
///
/// # Arguments
///
/// * `path` - Path to the JSON profile document
///
/// # Returns
///
/// * `Ok(ExtractionProfile)` - Successfully loaded and validated profile
/// * `Err(ProfileError)` - Failed to read, parse, or validate the profile
pub fn load_profile(path: &Path) -> Result<ExtractionProfile, ProfileError> {
    let content = std::fs::read_to_string(path)?;
    parse_profile(&content)
}

/// Parses and validates an extraction profile from a JSON string
pub fn parse_profile(content: &str) -> Result<ExtractionProfile, ProfileError> {
    let profile: ExtractionProfile = serde_json::from_str(content)?;
    validate(&profile)?;
    Ok(profile)
}
