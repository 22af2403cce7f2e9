use crate::error::ApiError;

/// slugify
///
/// Derives a URL slug from a display name: lowercase, trimmed, everything but
/// ASCII word characters, whitespace and `-` dropped, whitespace runs turned
/// into `-`, and repeated dashes collapsed. Names without any ASCII word
/// characters (e.g. pure CJK) yield an empty string.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut last_dash = false;
    for c in kept.chars() {
        if c.is_whitespace() || c == '-' {
            if !last_dash {
                slug.push('-');
            }
            last_dash = true;
        } else {
            slug.push(c);
            last_dash = false;
        }
    }
    slug
}

/// validate_slug
///
/// Accepts lowercase kebab-case made of ASCII letters, digits and `_`.
pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    let is_valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if is_valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "invalid slug '{slug}': use lowercase letters, digits, '_' and single dashes"
        )))
    }
}

/// resolve_slug
///
/// Uses the explicit slug when given, otherwise derives one from `source`.
/// A derived slug that comes out empty is rejected so the caller supplies one.
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Result<String, ApiError> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => {
            let derived = slugify(source).trim_matches('-').to_string();
            if derived.is_empty() {
                return Err(ApiError::bad_request(
                    "could not derive a slug from the name; provide one explicitly",
                ));
            }
            derived
        }
    };
    validate_slug(&slug)?;
    Ok(slug)
}
