use std::path::Path;

/// Substring-based exclusion: a path is excluded when any pattern occurs
/// anywhere in its full path string, not just in a single component.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.matching_pattern(path).is_some()
    }

    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        let path_str = path.to_string_lossy();
        self.patterns
            .iter()
            .find(|pattern| path_str.contains(pattern.as_str()))
            .map(String::as_str)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
