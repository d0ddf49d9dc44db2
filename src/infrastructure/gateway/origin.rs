//! Cross-origin policy for the generation route

use regex::Regex;

use crate::domain::DomainError;

/// Decides which origin is declared back to a browser caller
///
/// Known origins are echoed. Unknown or absent origins receive the canonical
/// origin so the browser rejects the response cleanly.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    canonical: String,
    allowed: Vec<String>,
    preview: Option<Regex>,
}

/// Outcome of matching a request origin against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginCheck {
    /// Value for `Access-Control-Allow-Origin`
    pub allow_origin: String,
    pub recognized: bool,
}

impl OriginPolicy {
    pub fn new(
        canonical: impl Into<String>,
        allowed: Vec<String>,
        preview_pattern: Option<&str>,
    ) -> Result<Self, DomainError> {
        let canonical = normalize(&canonical.into());
        if canonical.is_empty() {
            return Err(DomainError::configuration("Canonical origin cannot be empty"));
        }

        let preview = preview_pattern
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                Regex::new(&anchored(p)).map_err(|e| {
                    DomainError::configuration(format!("Invalid preview origin pattern: {}", e))
                })
            })
            .transpose()?;

        let mut allowed: Vec<String> = allowed.iter().map(|o| normalize(o)).collect();
        if !allowed.contains(&canonical) {
            allowed.push(canonical.clone());
        }

        Ok(Self {
            canonical,
            allowed,
            preview,
        })
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = normalize(origin);
        self.allowed.contains(&origin)
            || self
                .preview
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(&origin))
    }

    pub fn check(&self, origin: Option<&str>) -> OriginCheck {
        match origin {
            Some(origin) if self.is_allowed(origin) => OriginCheck {
                allow_origin: normalize(origin),
                recognized: true,
            },
            _ => OriginCheck {
                allow_origin: self.canonical.clone(),
                recognized: false,
            },
        }
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Anchor the whole pattern, alternations included, to the full origin
fn anchored(pattern: &str) -> String {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    let pattern = pattern.strip_suffix('$').unwrap_or(pattern);
    format!("^(?:{})$", pattern)
}
