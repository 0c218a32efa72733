/// Fallback token for titles with no alphanumeric content.
const EMPTY_TITLE_SLUG: &str = "logbook";

/// Normalize a log book title into a URL-safe base token.
///
/// Lowercases, keeps ASCII alphanumerics, collapses every run of other
/// characters into a single hyphen, and trims hyphens at both ends.
/// A title with nothing usable falls back to `"logbook"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        EMPTY_TITLE_SLUG.to_string()
    } else {
        slug
    }
}

/// Pick the first free slug for an owner: the base token itself, then
/// `base-2`, `base-3`, and so on.
///
/// The probe is an optimistic pre-check only. The probe and the eventual
/// insert are not one transaction, so the storage layer's unique constraint
/// stays the final arbiter; callers retry allocation when the insert loses
/// that race.
pub fn allocate<F, E>(base: &str, mut exists: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    if !exists(base)? {
        return Ok(base.to_string());
    }

    let mut i = 2u32;
    loop {
        let candidate = format!("{base}-{i}");
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;

    fn taken(slugs: &[&str]) -> HashSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    fn allocate_against(base: &str, existing: &HashSet<String>) -> String {
        allocate(base, |c| Ok::<_, Infallible>(existing.contains(c))).unwrap()
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Trip Notes"), "trip-notes");
    }

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
    }

    #[test]
    fn slugify_strips_punctuation() {
        assert_eq!(slugify("C++ & Rust!"), "c-rust");
    }

    #[test]
    fn slugify_keeps_digits() {
        assert_eq!(slugify("Day 1 Log"), "day-1-log");
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify(""), "logbook");
        assert_eq!(slugify("!!! ???"), "logbook");
    }

    #[test]
    fn allocate_free_base() {
        let existing = taken(&[]);
        assert_eq!(allocate_against("trip-notes", &existing), "trip-notes");
    }

    #[test]
    fn allocate_first_suffix() {
        let existing = taken(&["trip-notes"]);
        assert_eq!(allocate_against("trip-notes", &existing), "trip-notes-2");
    }

    #[test]
    fn allocate_skips_taken_suffixes() {
        let existing = taken(&["trip-notes", "trip-notes-2", "trip-notes-3"]);
        assert_eq!(allocate_against("trip-notes", &existing), "trip-notes-4");
    }

    #[test]
    fn allocate_propagates_probe_errors() {
        let result = allocate("trip-notes", |_| Err("probe failed"));
        assert_eq!(result, Err("probe failed"));
    }
}
