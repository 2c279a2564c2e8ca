use crate::spot::Spot;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

pub fn load_catalog_from_path(path: impl AsRef<Path>) -> Result<Vec<Spot>, CatalogError> {
    let contents = std::fs::read_to_string(path)?;
    parse_catalog(&contents)
}

/// Parse a JSON array of spots and reject empty or duplicate ids.
pub fn parse_catalog(contents: &str) -> Result<Vec<Spot>, CatalogError> {
    let spots: Vec<Spot> = serde_json::from_str(contents)?;
    validate_catalog(&spots)?;
    Ok(spots)
}

fn validate_catalog(spots: &[Spot]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(spots.len());
    for spot in spots {
        if spot.id.trim().is_empty() {
            return Err(CatalogError::Invalid(format!(
                "spot {:?} has an empty id",
                spot.name
            )));
        }
        if !seen.insert(spot.id.as_str()) {
            return Err(CatalogError::Invalid(format!("duplicate spot id: {}", spot.id)));
        }
    }
    Ok(())
}
