use crate::config::ActionConfig;

const REPLACE_SEPARATOR: &str = "->";

/// A parsed rule action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Literal substring substitution across the whole URL.
    Replace { from: String, to: String },
}

impl Action {
    /// Parse a configured action. Unknown kinds and malformed args yield `None`.
    pub fn parse(config: &ActionConfig) -> Option<Self> {
        match config.kind.trim() {
            "replace" => {
                let parts: Vec<&str> = config.args.split(REPLACE_SEPARATOR).collect();
                let [from, to] = parts.as_slice() else {
                    return None;
                };
                Some(Self::Replace {
                    from: from.trim().to_string(),
                    to: to.trim().to_string(),
                })
            }
            _ => None,
        }
    }

    /// Apply this action to a URL.
    pub fn apply(&self, url: &str) -> String {
        match self {
            // An empty needle would splice `to` between every character.
            Self::Replace { from, .. } if from.is_empty() => url.to_string(),
            Self::Replace { from, to } => url.replace(from.as_str(), to),
        }
    }
}
