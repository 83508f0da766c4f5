// Human-readable identifiers: workspace slugs and project keys.
//
// Both are derived from a display name, then made unique by probing the store
// and appending an increasing numeric suffix. The probe is advisory only; the
// unique indexes reject whichever concurrent writer loses the race.

use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::database::store::{Constraint, Store, StoreError};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("'{0}' contains no characters usable in an identifier")]
    EmptyBase(String),

    #[error("no free identifier for base '{base}' after {attempts} attempts")]
    Exhausted { base: String, attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a numeric suffix is joined to the base candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixStyle {
    /// `acme`, `acme-1`, `acme-2`
    Hyphenated,
    /// `MOB`, `MOB1`, `MOB2`
    Appended,
}

impl SuffixStyle {
    pub fn candidate(&self, base: &str, n: u32) -> String {
        match (self, n) {
            (_, 0) => base.to_string(),
            (SuffixStyle::Hyphenated, n) => format!("{}-{}", base, n),
            (SuffixStyle::Appended, n) => format!("{}{}", base, n),
        }
    }
}

/// Answers whether a candidate identifier is already taken in its scope
#[async_trait]
pub trait CollisionProbe: Send + Sync {
    async fn is_taken(&self, candidate: &str) -> Result<bool, StoreError>;
}

/// Slugs are global among non-deleted workspaces
pub struct SlugProbe<'a> {
    pub store: &'a dyn Store,
}

#[async_trait]
impl CollisionProbe for SlugProbe<'_> {
    async fn is_taken(&self, candidate: &str) -> Result<bool, StoreError> {
        self.store.workspace_slug_in_use(candidate).await
    }
}

/// Keys are per workspace and count soft-deleted projects too
pub struct ProjectKeyProbe<'a> {
    pub store: &'a dyn Store,
    pub workspace_id: Uuid,
}

#[async_trait]
impl CollisionProbe for ProjectKeyProbe<'_> {
    async fn is_taken(&self, candidate: &str) -> Result<bool, StoreError> {
        self.store.project_key_in_use(self.workspace_id, candidate).await
    }
}

/// Lowercase, drop anything outside `[a-z0-9\s-]`, fold whitespace and hyphen
/// runs into single hyphens, trim hyphens at the ends.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
    }
    slug
}

/// True when `slug` matches `^[a-z0-9]+(-[a-z0-9]+)*$`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

/// One word: its first three characters. Several words: their initials, at
/// most four. Nothing usable: `fallback`.
pub fn project_key_base(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    match words.as_slice() {
        [] => fallback.to_string(),
        [word] => word.chars().take(3).collect(),
        many => many.iter().filter_map(|w| w.chars().next()).take(4).collect(),
    }
}

/// Probe `base`, then `base` with suffixes 1..=max_attempts, returning the first free candidate
pub async fn resolve_unique(
    probe: &dyn CollisionProbe,
    base: &str,
    style: SuffixStyle,
    max_attempts: u32,
) -> Result<String, GenerationError> {
    for n in 0..=max_attempts {
        let candidate = style.candidate(base, n);
        if !probe.is_taken(&candidate).await? {
            return Ok(candidate);
        }
    }

    tracing::error!("Identifier space exhausted for base '{}' after {} attempts", base, max_attempts);
    Err(GenerationError::Exhausted {
        base: base.to_string(),
        attempts: max_attempts,
    })
}

/// Probe for a free candidate and hand it to `insert`. When `insert` loses a
/// race on `constraint`, probe again, at most `limits.write_retries` more times.
pub async fn claim_unique<F, Fut>(
    probe: &dyn CollisionProbe,
    base: &str,
    style: SuffixStyle,
    limits: &GenerationConfig,
    constraint: Constraint,
    mut insert: F,
) -> Result<String, GenerationError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let mut attempt = 0;
    loop {
        let candidate = resolve_unique(probe, base, style, limits.max_attempts).await?;
        match insert(candidate.clone()).await {
            Ok(()) => return Ok(candidate),
            Err(e) if e.is_conflict_on(constraint) && attempt < limits.write_retries => {
                attempt += 1;
                tracing::warn!(
                    "Identifier '{}' claimed concurrently, regenerating ({}/{})",
                    candidate,
                    attempt,
                    limits.write_retries
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Derive a slug from a workspace name and insert with it
pub async fn claim_workspace_slug<F, Fut>(
    store: &dyn Store,
    name: &str,
    limits: &GenerationConfig,
    insert: F,
) -> Result<String, GenerationError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let base = slugify(name);
    if base.is_empty() {
        return Err(GenerationError::EmptyBase(name.to_string()));
    }
    claim_unique(
        &SlugProbe { store },
        &base,
        SuffixStyle::Hyphenated,
        limits,
        Constraint::WorkspaceSlug,
        insert,
    )
    .await
}

/// Derive a key from a project name and insert with it, within one workspace
pub async fn claim_project_key<F, Fut>(
    store: &dyn Store,
    workspace_id: Uuid,
    name: &str,
    limits: &GenerationConfig,
    insert: F,
) -> Result<String, GenerationError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let base = project_key_base(name, &limits.default_project_key);
    claim_unique(
        &ProjectKeyProbe { store, workspace_id },
        &base,
        SuffixStyle::Appended,
        limits,
        Constraint::ProjectKey,
        insert,
    )
    .await
}
