//! Visible-device allow-list
//!
//! Parses the comma-separated device index list used by CUDA to restrict
//! which GPUs a process may see.

use crate::error::AllowListError;
use std::env::{self, VarError};

/// Environment variable holding the allow-list by default
pub const DEFAULT_VISIBLE_DEVICES_ENV: &str = "CUDA_VISIBLE_DEVICES";

/// Parse a comma-separated list of device indices
///
/// Order and duplicates are preserved and indices are not checked against
/// the installed devices; that happens when a device is requested.
/// An empty or blank value yields an empty list.
///
/// # Examples
///
/// ```
/// use nvinfo::services::visibility::parse_allow_list;
///
/// assert_eq!(parse_allow_list("0,2,5").unwrap(), vec![0, 2, 5]);
/// assert!(parse_allow_list("0,x,5").is_err());
/// ```
pub fn parse_allow_list(value: &str) -> Result<Vec<u32>, AllowListError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    value
        .split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<u32>()
                .map_err(|source| AllowListError::InvalidToken {
                    token: token.to_string(),
                    source,
                })
        })
        .collect()
}

/// Read and parse the allow-list from the environment variable `var`
///
/// An unset variable yields an empty list.
pub fn visible_indices_from_env(var: &str) -> Result<Vec<u32>, AllowListError> {
    match env::var(var) {
        Ok(value) => parse_allow_list(&value),
        Err(VarError::NotPresent) => Ok(Vec::new()),
        Err(VarError::NotUnicode(_)) => Err(AllowListError::NotUnicode(var.to_string())),
    }
}
