//! ABI artifact loading.
//!
//! Accepts either a bare JSON ABI array or a compiler artifact object
//! (Hardhat, Foundry) that carries the array under an `abi` key.

use std::path::Path;

use alloy::json_abi::JsonAbi;
use eyre::{Context, Result};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while interpreting ABI JSON.
#[derive(Debug, Error)]
pub enum AbiError {
    /// The text is not valid JSON or not a valid ABI.
    #[error("invalid ABI JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// An artifact object without an `abi` key.
    #[error("artifact object has no `abi` key")]
    MissingAbi,
    /// Neither an array nor an object.
    #[error("expected an ABI array or an artifact object, found {0}")]
    UnexpectedShape(&'static str),
}

/// Parses ABI JSON from a string.
///
/// # Errors
/// Returns [`AbiError`] if the JSON is malformed or has neither accepted shape.
pub fn parse_abi(json: &str) -> Result<JsonAbi, AbiError> {
    let value: Value = serde_json::from_str(json)?;
    let abi = match value {
        array @ Value::Array(_) => array,
        Value::Object(mut artifact) => artifact.remove("abi").ok_or(AbiError::MissingAbi)?,
        other => return Err(AbiError::UnexpectedShape(json_kind(&other))),
    };
    Ok(serde_json::from_value(abi)?)
}

/// Reads and parses an ABI file.
///
/// # Errors
/// Returns error if the file cannot be read or does not hold a usable ABI.
pub fn load_abi(path: &Path) -> Result<JsonAbi> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read ABI file {}", path.display()))?;
    let abi = parse_abi(&content)
        .wrap_err_with(|| format!("failed to parse ABI file {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        events = abi.events().count(),
        functions = abi.functions().count(),
        "loaded ABI"
    );
    Ok(abi)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
