//! Event Validation - Pure Domain Logic
//!
//! Per-event re-derivation: field formats, index uniqueness, hash, fleet
//! ownership, signature and the input/output shape of each event type.

use shared_crypto::{is_sha256_hex, sha256_hex, verify_signature};
use shared_types::{Event, EventType, Rules};
use std::collections::HashSet;

use super::errors::{Result, ValidationError};

pub(crate) fn check_hash(field: &str, value: &str) -> Result<()> {
    if is_sha256_hex(value) {
        Ok(())
    } else {
        Err(ValidationError::MalformedHash {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

pub(crate) fn check_unique_indices(
    field: &str,
    indices: impl IntoIterator<Item = u32>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for index in indices {
        if !seen.insert(index) {
            return Err(ValidationError::DuplicateIndex {
                field: field.to_string(),
                index,
            });
        }
    }
    Ok(())
}

fn shape_error(event_type: EventType, reason: &'static str) -> ValidationError {
    ValidationError::InvalidShape { event_type, reason }
}

/// Input/output counts required by each event type.
///
/// - reward: no inputs, at least one output, every output carries units
/// - jump: at least one input, one or two outputs, two outputs land in
///   different systems
/// - attack: at least two inputs, no more outputs than inputs
pub fn check_shape(event: &Event) -> Result<()> {
    let inputs = event.inputs.len();
    let outputs = event.outputs.len();

    match event.event_type {
        EventType::Reward => {
            if inputs != 0 {
                return Err(shape_error(event.event_type, "reward events cannot have inputs"));
            }
            if outputs == 0 {
                return Err(shape_error(
                    event.event_type,
                    "reward events with no recipients should not be included",
                ));
            }
            if event.outputs.iter().any(|o| o.amount() == 0) {
                return Err(shape_error(event.event_type, "reward outputs must carry units"));
            }
        }
        EventType::Jump => {
            if inputs == 0 {
                return Err(shape_error(event.event_type, "jump events cannot have zero inputs"));
            }
            if outputs == 0 {
                return Err(shape_error(event.event_type, "jump events cannot have zero outputs"));
            }
            if outputs > 2 {
                return Err(shape_error(
                    event.event_type,
                    "jump events cannot have more than 2 outputs",
                ));
            }
            if outputs == 2 && event.outputs[0].location == event.outputs[1].location {
                return Err(shape_error(
                    event.event_type,
                    "jump event cannot split in one system",
                ));
            }
        }
        EventType::Attack => {
            if inputs < 2 {
                return Err(shape_error(
                    event.event_type,
                    "attack events need at least two inputs",
                ));
            }
            if outputs > inputs {
                return Err(shape_error(
                    event.event_type,
                    "attacks cannot have more outputs than inputs",
                ));
            }
        }
    }
    Ok(())
}

/// Re-derive everything an event commits to.
pub fn validate_event(event: &Event, rules: &Rules) -> Result<()> {
    let prefix = format!("events[{}]", event.index);

    check_hash(&format!("{prefix}.hash"), &event.hash)?;
    check_hash(&format!("{prefix}.key"), &event.key)?;
    check_hash(&format!("{prefix}.fleet.hash"), &event.fleet.hash)?;
    if event.version != rules.event_version {
        return Err(ValidationError::VersionMismatch {
            field: format!("{prefix}.version"),
            expected: rules.event_version,
            actual: event.version,
        });
    }
    let public_key = event
        .fleet
        .public_key
        .as_deref()
        .ok_or_else(|| ValidationError::MissingField {
            field: format!("{prefix}.fleet.public_key"),
        })?;

    check_unique_indices(&format!("{prefix}.inputs"), event.inputs.iter().map(|i| i.index))?;
    for input in &event.inputs {
        check_hash(&format!("{prefix}.inputs[{}].key", input.index), &input.key)?;
    }

    check_unique_indices(&format!("{prefix}.outputs"), event.outputs.iter().map(|o| o.index))?;
    for output in &event.outputs {
        let field = format!("{prefix}.outputs[{}]", output.index);
        check_hash(&format!("{field}.key"), &output.key)?;
        check_hash(&format!("{field}.fleet.hash"), &output.fleet.hash)?;
        if let Some(location) = &output.location {
            check_hash(&format!("{field}.location"), location)?;
        }
        if output.output_type != event.event_type {
            return Err(ValidationError::OutputTypeMismatch {
                expected: event.event_type,
                actual: output.output_type,
            });
        }
    }

    let computed = event
        .compute_hash()
        .map_err(|_| ValidationError::MissingField {
            field: format!("{prefix}.fleet.public_key"),
        })?;
    if computed != event.hash {
        return Err(ValidationError::HashMismatch {
            field: format!("{prefix}.hash"),
            expected: computed,
            actual: event.hash.clone(),
        });
    }

    let fleet_hash = sha256_hex(public_key);
    if fleet_hash != event.fleet.hash {
        return Err(ValidationError::HashMismatch {
            field: format!("{prefix}.fleet.public_key"),
            expected: fleet_hash,
            actual: event.fleet.hash.clone(),
        });
    }

    verify_signature(public_key, &event.hash, &event.signature).map_err(|e| {
        ValidationError::InvalidSignature {
            event: event.key.clone(),
            reason: e.to_string(),
        }
    })?;

    check_shape(event)
}
