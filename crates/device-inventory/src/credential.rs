use std::fmt;

use serde::Deserialize;

/// A secret string that never leaves the process through logs.
///
/// `Debug` is redacted and there is intentionally no `Display` or
/// `Serialize` impl; the execution driver reads it through [`Secret::expose`].
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(**********)")
    }
}

/// Login credential for a device or proxy.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let cred: Credential =
            serde_yml::from_str("username: lg\npassword: hunter2\n").unwrap();
        assert_eq!(cred.username, "lg");
        assert_eq!(cred.password.expose(), "hunter2");

        let debug = format!("{cred:?}");
        assert!(!debug.contains("hunter2"), "secret leaked: {debug}");
        assert!(debug.contains("**********"));
    }
}
