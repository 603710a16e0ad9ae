use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 64;

fn is_valid_name_char(c: char, allow_hyphen: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (allow_hyphen && c == '-')
}

fn validate(
    name: &str,
    entity: &str,
    allow_hyphen: bool,
    forbid_leading_special: bool,
) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName(format!("{entity} name cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName(format!(
            "{entity} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !name.chars().all(|c| is_valid_name_char(c, allow_hyphen)) {
        let allowed = if allow_hyphen {
            "alphanumeric characters, hyphens, and underscores"
        } else {
            "alphanumeric characters and underscores"
        };
        return Err(Error::InvalidName(format!(
            "{entity} name '{name}' can only contain {allowed}"
        )));
    }
    if forbid_leading_special && (name.starts_with('-') || name.starts_with('_')) {
        return Err(Error::InvalidName(format!(
            "{entity} name '{name}' cannot start with a hyphen or underscore"
        )));
    }
    Ok(())
}

/// Database and principal names double as file names and lookup keys.
pub fn validate_database_name(name: &str) -> Result<()> {
    validate(name, "Database", true, true)
}

pub fn validate_principal_name(name: &str) -> Result<()> {
    validate(name, "Principal", true, true)
}

/// Collection names are embedded in SQL identifiers; a leading underscore is
/// reserved for the catalog tables.
pub fn validate_collection_name(name: &str) -> Result<()> {
    validate(name, "Collection", false, true)
}

/// Field names are embedded in JSON paths of expression indexes.
pub fn validate_field_name(name: &str) -> Result<()> {
    validate(name, "Field", false, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_database_name("persona_db").is_ok());
        assert!(validate_principal_name("persona-app").is_ok());
        assert!(validate_collection_name("estudios").is_ok());
        assert!(validate_field_name("_id").is_ok());
        assert!(validate_field_name("idProf").is_ok());
    }

    #[test]
    fn test_empty_name() {
        assert!(validate_database_name("").is_err());
        assert!(validate_principal_name("").is_err());
    }

    #[test]
    fn test_reserved_leading_underscore() {
        assert!(validate_collection_name("_collections").is_err());
        assert!(validate_database_name("-admin").is_err());
    }

    #[test]
    fn test_rejects_sql_and_path_characters() {
        assert!(validate_collection_name("persona\"; DROP").is_err());
        assert!(validate_field_name("a.b").is_err());
        assert!(validate_field_name("a'b").is_err());
        assert!(validate_database_name("../etc").is_err());
    }

    #[test]
    fn test_length_limit() {
        assert!(validate_database_name(&"a".repeat(64)).is_ok());
        assert!(validate_database_name(&"a".repeat(65)).is_err());
    }
}
