// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Canonical composite-key derivation.
//!
//! Every internal structure is keyed by a composite string derived from a
//! group name and a caller key. Two calls that produce the same composite key
//! are the same cache slot regardless of calling site, so key derivation must
//! be deterministic: structured keys are serialized with stable (sorted) map
//! ordering, making logically-equal values compose identically.

use serde::Serialize;

/// Builds the composite key for a (group, key) pair.
///
/// The composite is `"{group}:{key}"`. Groups therefore must not contain
/// `':'` if group-level clears are used, since [`group_prefix`] matching is
/// purely textual.
#[must_use]
pub fn compose(group: &str, key: &str) -> String {
    format!("{group}:{key}")
}

/// Returns the composite-key prefix covering every key in a group.
#[must_use]
pub fn group_prefix(group: &str) -> String {
    format!("{group}:")
}

/// Derives a canonical string form for an arbitrary serializable key.
///
/// Plain strings canonicalize to themselves (without added quotes); any
/// other value is serialized as JSON with sorted map keys, so field order in
/// the source value never changes the composite key. Unserializable inputs
/// degrade to a best-effort placeholder rather than failing: a key collision
/// is a correctness concern, but never a crash concern.
///
/// # Examples
///
/// ```
/// use rememo::keys::canonical;
///
/// assert_eq!(canonical("user:42"), "user:42");
/// assert_eq!(canonical(&(7, "x")), "[7,\"x\"]");
/// ```
#[must_use]
pub fn canonical<T>(key: &T) -> String
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(key) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(value) => value.to_string(),
        Err(_) => format!("<uncanonical:{}>", std::any::type_name::<T>()),
    }
}
