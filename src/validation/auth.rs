//! Field rules shared by the request DTOs, in the shape `garde`'s
//! `custom(..)` rule expects.

/// Static segments routed under `/api/datasets/`. A user named after one
/// of them could never be reached by `DELETE /api/datasets/{username}`.
pub const RESERVED_USERNAMES: &[&str] = &[
    "by-user",
    "last-train-model",
    "model-training-history",
    "records",
    "train-model",
];

/// Usernames double as object-store path segments.
pub fn username(value: &str, _ctx: &()) -> garde::Result {
    if value.len() < 3 {
        return Err(garde::Error::new("must be at least 3 characters long"));
    }

    if value.len() > 255 {
        return Err(garde::Error::new("must be at most 255 characters"));
    }

    if !value.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(garde::Error::new(
            "can only contain letters, numbers, dots, underscores, and hyphens",
        ));
    }

    if value == "." || value == ".." {
        return Err(garde::Error::new("is not a valid username"));
    }

    if RESERVED_USERNAMES.contains(&value) {
        return Err(garde::Error::new("is reserved"));
    }

    Ok(())
}

pub fn password(value: &str, _ctx: &()) -> garde::Result {
    if value.len() < 8 {
        return Err(garde::Error::new("must be at least 8 characters long"));
    }

    if value.len() > 128 {
        return Err(garde::Error::new("must be at most 128 characters"));
    }

    Ok(())
}

/// Non-blank after trimming.
pub fn present(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("is required"));
    }
    Ok(())
}

/// Institution ids become the first segment of a dataset prefix.
pub fn path_segment(value: &str, ctx: &()) -> garde::Result {
    present(value, ctx)?;
    if value.contains('/') || value.contains('\\') {
        return Err(garde::Error::new("must not contain path separators"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(username("alice_01", &()).is_ok());
        assert!(username("al", &()).is_err());
        assert!(username("alice/../bob", &()).is_err());
        assert!(username("..", &()).is_err());
    }

    #[test]
    fn dataset_route_segments_are_reserved() {
        for name in RESERVED_USERNAMES {
            assert!(username(name, &()).is_err(), "{} should be reserved", name);
        }
        assert!(username("records2", &()).is_ok());
    }

    #[test]
    fn passwords() {
        assert!(password("correct horse", &()).is_ok());
        assert!(password("short", &()).is_err());
        assert!(password(&"x".repeat(129), &()).is_err());
    }

    #[test]
    fn segments() {
        assert!(path_segment("inst-1", &()).is_ok());
        assert!(path_segment("  ", &()).is_err());
        assert!(path_segment("a/b", &()).is_err());
    }
}
