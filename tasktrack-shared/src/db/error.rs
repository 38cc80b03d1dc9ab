/// Store error classification
///
/// This module is the single place where vendor-specific SQLSTATE codes are
/// mapped into a closed error-kind enum; callers match on `DbErrorKind` and
/// never look at raw codes themselves.
///
/// # SQLSTATE mapping
///
/// | Code  | Kind                |
/// |-------|---------------------|
/// | 23505 | UniqueViolation     |
/// | 23502 | NotNullViolation    |
/// | 23503 | ForeignKeyViolation |
/// | 22P02 | InvalidTextValue    |
/// | other | Other(code)         |
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::db::error::{classify, DbErrorKind};
///
/// # fn example(err: sqlx::Error) {
/// match classify(&err) {
///     DbErrorKind::UniqueViolation => println!("duplicate"),
///     DbErrorKind::NotNullViolation => println!("missing fields"),
///     other => println!("unhandled: {other}"),
/// }
/// # }
/// ```

use thiserror::Error;

/// Closed set of store error kinds the services care about
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbErrorKind {
    /// A unique constraint was violated (SQLSTATE 23505)
    #[error("unique constraint violation")]
    UniqueViolation,

    /// A NOT NULL constraint was violated (SQLSTATE 23502)
    #[error("not-null constraint violation")]
    NotNullViolation,

    /// A foreign key constraint was violated (SQLSTATE 23503)
    #[error("foreign key constraint violation")]
    ForeignKeyViolation,

    /// Input could not be parsed for a typed column, e.g. a bad enum
    /// label (SQLSTATE 22P02)
    #[error("invalid text representation")]
    InvalidTextValue,

    /// The query expected a row and found none
    #[error("row not found")]
    RowNotFound,

    /// Any other error, carrying the raw SQLSTATE when the driver
    /// provided one
    #[error("unclassified database error")]
    Other(Option<String>),
}

impl DbErrorKind {
    /// Maps a raw SQLSTATE code into an error kind
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("23505") => DbErrorKind::UniqueViolation,
            Some("23502") => DbErrorKind::NotNullViolation,
            Some("23503") => DbErrorKind::ForeignKeyViolation,
            Some("22P02") => DbErrorKind::InvalidTextValue,
            other => DbErrorKind::Other(other.map(str::to_string)),
        }
    }

    /// Returns the raw SQLSTATE for unclassified errors, if known
    pub fn raw_code(&self) -> Option<&str> {
        match self {
            DbErrorKind::Other(code) => code.as_deref(),
            _ => None,
        }
    }
}

/// Classifies a sqlx error into the internal error-kind enum
///
/// Non-database errors (pool timeouts, protocol errors) all collapse into
/// `Other(None)`; services treat those as internal errors.
pub fn classify(err: &sqlx::Error) -> DbErrorKind {
    match err {
        sqlx::Error::RowNotFound => DbErrorKind::RowNotFound,
        sqlx::Error::Database(db_err) => DbErrorKind::from_code(db_err.code().as_deref()),
        _ => DbErrorKind::Other(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_known_states() {
        assert_eq!(
            DbErrorKind::from_code(Some("23505")),
            DbErrorKind::UniqueViolation
        );
        assert_eq!(
            DbErrorKind::from_code(Some("23502")),
            DbErrorKind::NotNullViolation
        );
        assert_eq!(
            DbErrorKind::from_code(Some("23503")),
            DbErrorKind::ForeignKeyViolation
        );
        assert_eq!(
            DbErrorKind::from_code(Some("22P02")),
            DbErrorKind::InvalidTextValue
        );
    }

    #[test]
    fn test_from_code_preserves_unknown_state() {
        let kind = DbErrorKind::from_code(Some("42883"));
        assert_eq!(kind, DbErrorKind::Other(Some("42883".to_string())));
        assert_eq!(kind.raw_code(), Some("42883"));
    }

    #[test]
    fn test_from_code_without_state() {
        let kind = DbErrorKind::from_code(None);
        assert_eq!(kind, DbErrorKind::Other(None));
        assert_eq!(kind.raw_code(), None);
    }

    #[test]
    fn test_classify_row_not_found() {
        assert_eq!(classify(&sqlx::Error::RowNotFound), DbErrorKind::RowNotFound);
    }
}
