#[derive(Debug, Clone)]
pub struct SearchURL(String);

impl AsRef<str> for SearchURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SearchURL {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }
}
