//! Layer merging.
//!
//! Implements section-by-section, key-by-key merging where the overlay wins.
//! Sections and keys present only in the overlay are added to the result.

use super::layer::ConfigLayer;

/// Merge two layers, with `overlay` taking precedence over `base`.
///
/// - Sections are merged key by key
/// - A key present in both takes the overlay's value, whatever its type
/// - Sections present only in `base` are kept as they are
///
/// # Example
/// ```
/// use flow2api_config::config::{ConfigLayer, merge_layers};
///
/// let mut base = ConfigLayer::new();
/// base.set("server", "host", "localhost");
/// base.set("server", "port", 8000i64);
///
/// let mut overlay = ConfigLayer::new();
/// overlay.set("server", "port", 9000i64);
///
/// let merged = merge_layers(base, overlay);
/// assert_eq!(merged.get("server", "port").and_then(|v| v.as_i64()), Some(9000));
/// assert_eq!(merged.get("server", "host").and_then(|v| v.as_str()), Some("localhost"));
/// ```
pub fn merge_layers(base: ConfigLayer, overlay: ConfigLayer) -> ConfigLayer {
    let mut merged = base;
    for (section_name, overlay_section) in overlay.into_inner() {
        let section = merged.inner_mut().entry(section_name).or_default();
        for (key, value) in overlay_section {
            section.insert(key, value);
        }
    }
    merged
}

/// Merge multiple layers in order, with later layers taking precedence.
pub fn merge_all(layers: impl IntoIterator<Item = ConfigLayer>) -> ConfigLayer {
    layers.into_iter().fold(ConfigLayer::new(), merge_layers)
}
