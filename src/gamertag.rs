//! Derives a candidate gamertag from an email-style identifier.
//!
//! 1. Take the local part (everything before the first `@`)
//! 2. Strip everything outside `[A-Za-z0-9 ]`
//! 3. Expand into an ordered, de-duplicated list of gamertag variants
//! 4. Probe the first five variants against the directory site
//! 5. Fall back to the cleaned local part when nothing is found
use crate::errors::AppError;
use crate::sources::PageSource;
use std::collections::HashSet;
use std::sync::Arc;

/// How many candidates are probed against the directory.
pub const MAX_PROBES: usize = 5;

/// Returns the substring before the first `@`.
pub fn local_part(identifier: &str) -> Result<&str, AppError> {
    identifier
        .split_once('@')
        .map(|(local, _)| local)
        .ok_or_else(|| AppError::InvalidIdentifier("identifier must contain '@'".to_string()))
}

/// Keeps ASCII letters, digits and spaces.
pub fn clean_local_part(local: &str) -> String {
    local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

/// Ordered gamertag variants of `username`, first occurrence wins.
pub fn candidate_handles(username: &str) -> Vec<String> {
    let variants = [
        username.to_string(),
        username.to_lowercase(),
        username.to_uppercase(),
        format!("{}x", username),
        format!("x{}", username),
        format!("{}gamer", username),
        format!("gamer{}", username),
        format!("{}live", username),
        username.replace('_', ""),
        username.replace('.', ""),
        username.replace('-', ""),
    ];

    let mut seen = HashSet::new();
    variants
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Resolves identifiers to gamertags using a directory lookup.
#[derive(Clone)]
pub struct GamertagResolver {
    source: Arc<dyn PageSource>,
}

impl GamertagResolver {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Derives the handle for `identifier`.
    ///
    /// Fails only on malformed input: no `@`, or a local part with nothing
    /// left after cleaning. Directory errors count as "not found".
    pub async fn derive(&self, identifier: &str) -> Result<String, AppError> {
        let username = clean_local_part(local_part(identifier.trim())?);
        if username.trim().is_empty() {
            return Err(AppError::InvalidIdentifier(
                "identifier has no usable characters before '@'".to_string(),
            ));
        }

        for candidate in candidate_handles(&username).into_iter().take(MAX_PROBES) {
            if self.source.existence_check(&candidate).await {
                tracing::info!("✓ Gamertag found in directory: {}", candidate);
                return Ok(candidate);
            }
        }

        tracing::info!(
            "No directory match for derived candidates, using {}",
            username
        );
        Ok(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("john.doe@example.com").unwrap(), "john.doe");
        assert_eq!(local_part("a@b@c").unwrap(), "a");
        assert_eq!(local_part("@example.com").unwrap(), "");
        assert!(matches!(
            local_part("no-at-sign"),
            Err(AppError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_clean_strips_punctuation() {
        assert_eq!(clean_local_part("john.doe_99-x"), "johndoe99x");
        assert_eq!(clean_local_part("Big Boss"), "Big Boss");
        assert_eq!(clean_local_part("jöhn+tag"), "jhntag");
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(
            candidate_handles("Ace"),
            vec![
                "Ace", "ace", "ACE", "Acex", "xAce", "Acegamer", "gamerAce", "Acelive"
            ]
        );
    }

    #[test]
    fn test_candidates_dedup_lowercase_input() {
        // identity, lower and the punctuation variants collapse
        let candidates = candidate_handles("ace");
        assert_eq!(
            candidates,
            vec!["ace", "ACE", "acex", "xace", "acegamer", "gamerace", "acelive"]
        );
    }
}
