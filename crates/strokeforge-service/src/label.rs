//! Label pairs identify one game's scoring model.

use std::fmt;

/// The two target classes of one game.
///
/// Order does not matter: `("cat", "dog")` and `("dog", "cat")` are the
/// same pair and share one model instance.
///
/// # Example
///
/// ```
/// use strokeforge_service::LabelPair;
///
/// let pair = LabelPair::new("dog", "cat");
/// assert_eq!(pair, LabelPair::new("cat", "dog"));
/// assert_eq!(pair.key(), "cat-dog");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelPair {
    first: String,
    second: String,
}

impl LabelPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// The lexicographically smaller label.
    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Both labels, sorted and joined with `-`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.first, self.second)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.first == label || self.second == label
    }
}

impl fmt::Display for LabelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for LabelPair {
    fn from((a, b): (A, B)) -> Self {
        Self::new(a, b)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_order_is_irrelevant() {
        let mut set = HashSet::new();
        set.insert(LabelPair::new("star", "apple"));
        set.insert(LabelPair::from(("apple", "star")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_key_is_sorted() {
        let pair = LabelPair::new("zebra", "ant");
        assert_eq!(pair.first(), "ant");
        assert_eq!(pair.second(), "zebra");
        assert_eq!(pair.key(), "ant-zebra");
        assert_eq!(pair.to_string(), pair.key());
        assert!(pair.contains("zebra"));
        assert!(!pair.contains("bee"));
    }
}
