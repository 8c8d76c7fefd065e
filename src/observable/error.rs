// ============================================================================
// spark-observables - Errors
// ============================================================================

use super::value::Key;

/// Errors raised by observable reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservableError {
    #[error("value of kind `{kind}` is not observable")]
    NotObservable { kind: &'static str },

    #[error("cannot write `{key}`: target is frozen")]
    Frozen { key: Key },

    #[error("cannot write `{key}`: property is read-only")]
    ReadOnly { key: Key },

    #[error("cannot write `{key}`: sigil names are read-only signal accessors")]
    SigilWrite { key: Key },

    #[error("key `{key}` is not valid on an {kind}")]
    InvalidKey { key: Key, kind: &'static str },
}

pub type Result<T> = std::result::Result<T, ObservableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_key() {
        let err = ObservableError::SigilWrite { key: Key::from("$count") };
        assert_eq!(
            err.to_string(),
            "cannot write `$count`: sigil names are read-only signal accessors"
        );

        let err = ObservableError::InvalidKey { key: Key::from("name"), kind: "array" };
        assert_eq!(err.to_string(), "key `name` is not valid on an array");
    }
}
