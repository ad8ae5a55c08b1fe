//! Placeholder tokens recognised in the HTML shell.

/// One of the five markers the compositor replaces, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Collected head tags.
    Head,
    /// Split point between head and tail; rendered markup goes here.
    Html,
    /// Global state script.
    InitialState,
    /// Store state script.
    InitialStoreState,
    /// Dehydrated query cache script.
    Data,
}

impl Placeholder {
    pub const ALL: [Placeholder; 5] = [
        Placeholder::Head,
        Placeholder::Html,
        Placeholder::InitialState,
        Placeholder::InitialStoreState,
        Placeholder::Data,
    ];

    /// The literal comment token.
    pub const fn token(self) -> &'static str {
        match self {
            Placeholder::Head => "<!--app-head-->",
            Placeholder::Html => "<!--app-html-->",
            Placeholder::InitialState => "<!--app-initial-state-->",
            Placeholder::InitialStoreState => "<!--app-initial-valtio-state-->",
            Placeholder::Data => "<!--app-data-->",
        }
    }

    /// Tokens the template must carry but does not contain.
    pub fn missing_from(template: &str) -> Vec<Placeholder> {
        Self::ALL
            .into_iter()
            .filter(|p| !template.contains(p.token()))
            .collect()
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_from() {
        let template = "<head><!--app-head--></head><body><!--app-html--></body>";
        assert_eq!(
            Placeholder::missing_from(template),
            vec![
                Placeholder::InitialState,
                Placeholder::InitialStoreState,
                Placeholder::Data
            ]
        );
    }

    #[test]
    fn test_tokens_are_distinct() {
        for a in Placeholder::ALL {
            for b in Placeholder::ALL {
                if a != b {
                    assert!(!a.token().contains(b.token()));
                }
            }
        }
    }
}
