// Validation layer gate
//
// Checks requested diagnostic layers against what the loader reports before
// the instance is created. Names are compared by value up to their
// terminator.

use super::driver::{enumerate, raw_name, Driver};
use super::error::{BringupError, Stage};
use std::collections::HashSet;
use std::ffi::CString;

/// Requested layers the loader does not know about, in request order
pub fn missing_validation_layers<D: Driver>(
    driver: &D,
    requested: &[CString],
) -> Result<Vec<String>, BringupError> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let available = enumerate(|out| driver.enumerate_instance_layer_properties(out))
        .map_err(BringupError::driver(Stage::EnumerateLayers))?;
    let available: HashSet<String> = available.iter().map(|l| raw_name(&l.layer_name)).collect();
    log::debug!("Available instance layers: {:?}", available);

    Ok(requested
        .iter()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !available.contains(name))
        .collect())
}

/// True when every requested layer is available. An empty request is
/// vacuously satisfied.
pub fn check_validation_layer_support<D: Driver>(
    driver: &D,
    requested: &[CString],
) -> Result<bool, BringupError> {
    Ok(missing_validation_layers(driver, requested)?.is_empty())
}
