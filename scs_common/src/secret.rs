use std::{
    fmt,
    fmt::{Debug, Display},
};

/// Wrapper for API keys, signing secrets and SMTP passwords. The inner value never appears in `Debug` or `Display`
/// output, so configs holding secrets can be logged freely.
#[derive(Clone, Default)]
pub struct Secret<T: Clone + Default>(T);

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_masking() {
        let secret = Secret::new("sk_live_hunter2".to_string());
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "sk_live_hunter2");
    }
}
