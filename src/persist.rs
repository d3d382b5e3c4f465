//! Rule-set persistence: a UTF-8 JSON file holding the ordered stack list.
//!
//! The current container is `{"stack_list": [...]}`. A bare `[...]` array is
//! an older on-disk shape that is still accepted on read; writing always
//! produces the object shape.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::stack::Stack;

#[derive(Serialize, Deserialize)]
struct Container {
    stack_list: Vec<Stack>,
}

/// Encode a rule set in the current container shape.
pub(crate) fn encode(stacks: &[Stack]) -> Result<String> {
    let container = Container {
        stack_list: stacks.to_vec(),
    };
    serde_json::to_string(&container).map_err(|e| Error::Malformed(e.to_string()))
}

/// Decode a rule set from either container shape, preserving stored hashes,
/// ids, aliases, and order exactly.
pub(crate) fn decode(data: &str) -> Result<Vec<Stack>> {
    if let Ok(container) = serde_json::from_str::<Container>(data) {
        return Ok(container.stack_list);
    }
    serde_json::from_str::<Vec<Stack>>(data).map_err(|e| Error::Malformed(e.to_string()))
}

pub(crate) fn save(path: &Path, stacks: &[Stack]) -> Result<()> {
    let data = encode(stacks)?;
    fs::write(path, data)?;
    debug!(rules = stacks.len(), path = %path.display(), "model saved");
    Ok(())
}

pub(crate) fn load(path: &Path) -> Result<Vec<Stack>> {
    let data = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    decode(&data)
}
