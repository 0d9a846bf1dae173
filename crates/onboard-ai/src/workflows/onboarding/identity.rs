//! Name canonicalization and cross-document identity matching.

/// Lower-case the name and drop everything that is not a letter.
pub fn normalize(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphabetic())
        .collect()
}

/// Check the profile name against every submitted document.
///
/// An absent secondary document passes vacuously; a submitted one must match like the others.
pub fn all_match(
    profile_name: &str,
    primary_id_name: &str,
    secondary_id_name: Option<&str>,
    income_name: &str,
) -> bool {
    let base = normalize(profile_name);
    if base.is_empty() {
        return false;
    }

    let primary_ok = base == normalize(primary_id_name);
    let secondary_ok = secondary_id_name
        .map(|name| base == normalize(name))
        .unwrap_or(true);
    let income_ok = base == normalize(income_name);

    primary_ok && secondary_ok && income_ok
}
