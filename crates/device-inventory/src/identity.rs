/// Derive a stable device id from a display name.
///
/// Lowercases, drops anything outside `[A-Za-z0-9_-]` and whitespace, then
/// joins the remaining words with `_`. Hyphens separate words like
/// whitespace, so the result only ever contains `[a-z0-9_]`.
///
/// ```
/// use device_inventory::derive_id;
///
/// assert_eq!(derive_id("New York City, NY"), "new_york_city_ny");
/// assert_eq!(derive_id("core-1 (lab)"), "core_1_lab");
/// ```
pub fn derive_id(name: &str) -> String {
    let scrubbed: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();

    scrubbed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}
