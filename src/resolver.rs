//! Source resolution: turn the user's identifier into concrete log targets.
//!
//! Three modes exist: the identifier is used verbatim (`--exact`), it names a configured log
//! set (`--set`), or it is a substring searched across the backend's log group catalog. The
//! substring search is the only place that may block on the operator, through a [`Chooser`].

pub mod prompt;

use crate::backend::LogBackend;
use crate::config::Config;
use crate::error::{CwtailError, Result};
use crate::event::{LogSet, LogTarget};
use std::sync::Arc;

pub use prompt::ConsoleChooser;

/// Picks one of several candidate targets.
///
/// Returns the operator's raw answer; the resolver validates it as an index into `candidates`.
pub trait Chooser: Send {
    fn choose(&mut self, candidates: &[LogTarget]) -> Result<String>;
}

impl<F> Chooser for F
where
    F: FnMut(&[LogTarget]) -> Result<String> + Send,
{
    fn choose(&mut self, candidates: &[LogTarget]) -> Result<String> {
        self(candidates)
    }
}

/// How the identifier should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Exact,
    Substring,
    LogSet,
}

/// Outcome of resolution; immutable for the rest of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Single(LogTarget),
    Set(LogSet),
}

impl Resolution {
    /// Targets in their configured order
    pub fn targets(&self) -> Vec<LogTarget> {
        match self {
            Resolution::Single(target) => vec![target.clone()],
            Resolution::Set(set) => set.targets.clone(),
        }
    }
}

/// Resolves identifiers against the backend catalog and the loaded configuration
pub struct SourceResolver {
    backend: Arc<dyn LogBackend>,
    config: Config,
}

impl SourceResolver {
    pub fn new(backend: Arc<dyn LogBackend>, config: Config) -> Self {
        Self { backend, config }
    }

    /// Use the identifier verbatim, without contacting the backend
    pub fn resolve_exact(&self, identifier: &str) -> LogTarget {
        LogTarget::new(identifier)
    }

    /// Look up a configured log set
    pub fn resolve_log_set(&self, name: &str) -> Result<LogSet> {
        self.config
            .log_set(name)
            .cloned()
            .ok_or_else(|| {
                let known: Vec<_> = self.config.log_set_names().collect();
                log::debug!("Configured log sets: {:?}", known);
                CwtailError::UnknownLogSet {
                    name: name.to_owned(),
                }
            })
    }

    /// Every log group name in the backend catalog, following pagination to the end
    pub async fn list_log_groups(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut token = None;
        loop {
            let page = self.backend.list_log_groups(token).await?;
            names.extend(page.items.into_iter().map(|group| group.name));
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        log::debug!("Log group catalog holds {} groups", names.len());
        Ok(names)
    }

    /// Find the log group whose name contains `identifier`, asking `chooser` when ambiguous
    pub async fn resolve_by_substring(
        &self,
        identifier: &str,
        chooser: &mut dyn Chooser,
    ) -> Result<LogTarget> {
        let mut candidates: Vec<LogTarget> = self
            .list_log_groups()
            .await?
            .into_iter()
            .filter(|name| name.contains(identifier))
            .map(LogTarget::new)
            .collect();

        match candidates.len() {
            0 => Err(CwtailError::NoMatch {
                identifier: identifier.to_owned(),
            }),
            1 => Ok(candidates.remove(0)),
            count => {
                let answer = chooser.choose(&candidates)?;
                let index = parse_selection(&answer, count)?;
                Ok(candidates.swap_remove(index))
            }
        }
    }

    /// Resolve according to `mode`
    pub async fn resolve(
        &self,
        identifier: &str,
        mode: ResolveMode,
        chooser: &mut dyn Chooser,
    ) -> Result<Resolution> {
        let resolution = match mode {
            ResolveMode::Exact => Resolution::Single(self.resolve_exact(identifier)),
            ResolveMode::Substring => {
                Resolution::Single(self.resolve_by_substring(identifier, chooser).await?)
            }
            ResolveMode::LogSet => Resolution::Set(self.resolve_log_set(identifier)?),
        };
        log::debug!("Resolved '{}' ({:?}) to {:?}", identifier, mode, resolution);
        Ok(resolution)
    }
}

fn parse_selection(answer: &str, count: usize) -> Result<usize> {
    let invalid = || CwtailError::InvalidSelection {
        input: answer.trim().to_owned(),
        max: count - 1,
    };
    let index: usize = answer.trim().parse().map_err(|_| invalid())?;
    if index >= count {
        return Err(invalid());
    }
    Ok(index)
}
