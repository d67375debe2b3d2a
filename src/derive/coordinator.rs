// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Derivation passes and the fixed-point driver.
//!
//! # Entity States
//!
//! ```text
//! Discovered ──┬── not resolvable ────────────────────────► Deferred
//!              └── resolvable ── classify ──┬── no editable ► Skipped
//!                                           └── resolve → emit → render → commit
//!                                                   ├── ok ─────────────► Emitted
//!                                                   └── error ──────────► Deferred (failed)
//! ```
//!
//! Entities are processed one after another in discovery order. A failure
//! is scoped to its entity: it is reported, the entity is deferred, and the
//! pass continues. Output is committed per entity, both types or none.
//!
//! # Rounds
//!
//! [`Deriver::run`] repeats passes until nothing is pending. Later rounds
//! only retry deferred entities. Iteration stops early when a round gives
//! the host nothing new to work with, since retrying would yield the same
//! result, and when discovery itself fails.
//!
//! Generated types are reported to the host once the pass is over, so every
//! entity of a pass sees the same host answers regardless of discovery
//! order.

use std::collections::BTreeSet;

use syn::Path;
use tracing::{debug, error, info, warn};

use super::{
    classify::{Classification, classify},
    emit::{EmittedTypes, ResolvedProperty, emit},
    reader::find_entities,
    render::render,
    resolve::TypeResolver
};
use crate::{
    config::DeriveConfig,
    error::{ConfigError, DeriveError},
    host::EntityHost,
    model::{DeferReason, DerivationOutcome, EntityDeclaration, QualifiedName, SkipReason},
    utils::pattern::PackageFilter,
    writer::{CodeWriter, GeneratedFile}
};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error
}

/// Message for the host's diagnostic channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level:   Level,
    /// Entity the message is about, if any.
    pub entity:  Option<QualifiedName>,
    pub message: String
}

/// Result of one pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Round number, starting at 1.
    pub round:           usize,
    /// Entities returned by discovery after filtering.
    pub discovered:      usize,
    /// Entities outside the package filters.
    pub filtered_out:    usize,
    /// Entities that reached a terminal state (emitted or skipped).
    pub processed:       usize,
    /// Outcome per handled entity, in processing order.
    pub outcomes:        Vec<(QualifiedName, DerivationOutcome)>,
    pub diagnostics:     Vec<Diagnostic>,
    /// Whether the host learned anything from this pass's output.
    pub learned:         bool,
    /// Set when the host could not list entities.
    pub discovery_error: Option<String>
}

impl PassReport {
    /// Entities to retry, in processing order.
    #[must_use]
    pub fn deferred(&self) -> Vec<QualifiedName> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_deferred())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Empty deferred set: the pass converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| !outcome.is_deferred())
    }

    #[must_use]
    pub fn outcome(&self, entity: &QualifiedName) -> Option<&DerivationOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == entity)
            .map(|(_, outcome)| outcome)
    }

    /// Number of entities whose types were written.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DerivationOutcome::Emitted { .. }))
            .count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.level == Level::Error)
    }

    fn record(&mut self, level: Level, entity: Option<&QualifiedName>, message: String) {
        self.diagnostics.push(Diagnostic {
            level,
            entity: entity.cloned(),
            message
        });
    }
}

/// How the fixed-point iteration ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Convergence {
    /// No entity is pending.
    Converged,
    /// A round gave the host nothing new; retrying cannot help.
    Stalled { pending: BTreeSet<QualifiedName> },
    /// `max_rounds` passes ran with entities still pending.
    Exhausted { pending: BTreeSet<QualifiedName> },
    /// The host could not list entities; `pending` is what was still
    /// pending before the failing round, empty if it was the first.
    DiscoveryFailed {
        error:   String,
        pending: BTreeSet<QualifiedName>
    }
}

/// Result of [`Deriver::run`].
#[derive(Debug, Clone)]
pub struct DerivationReport {
    pub rounds:      Vec<PassReport>,
    pub convergence: Convergence
}

impl DerivationReport {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.convergence == Convergence::Converged
    }

    /// Entities still pending when iteration stopped.
    #[must_use]
    pub fn pending(&self) -> BTreeSet<QualifiedName> {
        match &self.convergence {
            Convergence::Converged => BTreeSet::new(),
            Convergence::Stalled { pending }
            | Convergence::Exhausted { pending }
            | Convergence::DiscoveryFailed { pending, .. } => pending.clone()
        }
    }

    /// Latest outcome of `entity` across all rounds.
    #[must_use]
    pub fn outcome(&self, entity: &QualifiedName) -> Option<&DerivationOutcome> {
        self.rounds.iter().rev().find_map(|round| round.outcome(entity))
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.rounds.iter().flat_map(|round| &round.diagnostics)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.rounds.iter().any(PassReport::has_errors)
    }
}

/// Derivation engine bound to one configuration.
#[derive(Debug, Clone)]
pub struct Deriver {
    config:  DeriveConfig,
    derives: Vec<Path>,
    filter:  PackageFilter
}

impl Deriver {
    /// Validate `config` and prepare the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: DeriveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let derives = config
            .derives
            .iter()
            .map(|derive| {
                syn::parse_str::<Path>(derive)
                    .map_err(|_| ConfigError::Invalid(format!("derive `{derive}` is not a path")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let filter = config.package_filter();

        Ok(Self {
            config,
            derives,
            filter
        })
    }

    #[must_use]
    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    /// Run a single pass over every discovered entity.
    ///
    /// For hosts that schedule rounds themselves: feed the returned
    /// [`PassReport::deferred`] set back through [`Deriver::retry`].
    pub fn pass<H, W>(&self, host: &mut H, writer: &mut W) -> PassReport
    where
        H: EntityHost + ?Sized,
        W: CodeWriter + ?Sized
    {
        self.execute(host, writer, None, 1)
    }

    /// Run a pass restricted to `pending` entities.
    pub fn retry<H, W>(
        &self,
        host: &mut H,
        writer: &mut W,
        pending: &BTreeSet<QualifiedName>,
        round: usize
    ) -> PassReport
    where
        H: EntityHost + ?Sized,
        W: CodeWriter + ?Sized
    {
        self.execute(host, writer, Some(pending), round)
    }

    /// Iterate passes until no entity is pending or no progress is possible.
    pub fn run<H, W>(&self, host: &mut H, writer: &mut W) -> DerivationReport
    where
        H: EntityHost + ?Sized,
        W: CodeWriter + ?Sized
    {
        let mut rounds = Vec::new();
        let mut pending: Option<BTreeSet<QualifiedName>> = None;

        for round in 1..=self.config.max_rounds {
            let report = self.execute(host, writer, pending.as_ref(), round);
            let deferred: BTreeSet<QualifiedName> = report.deferred().into_iter().collect();
            let learned = report.learned;
            let discovery_error = report.discovery_error.clone();
            rounds.push(report);

            if let Some(error) = discovery_error {
                error!(rounds = round, %error, "derivation stopped, entity discovery failed");
                return DerivationReport {
                    rounds,
                    convergence: Convergence::DiscoveryFailed {
                        error,
                        pending: deferred
                    }
                };
            }

            if deferred.is_empty() {
                info!(rounds = round, "derivation converged");
                return DerivationReport {
                    rounds,
                    convergence: Convergence::Converged
                };
            }

            if !learned {
                warn!(rounds = round, pending = deferred.len(), "derivation stalled");
                return DerivationReport {
                    rounds,
                    convergence: Convergence::Stalled { pending: deferred }
                };
            }

            debug!(round, pending = deferred.len(), "retrying deferred entities");
            pending = Some(deferred);
        }

        let pending = pending.unwrap_or_default();
        warn!(
            rounds = self.config.max_rounds,
            pending = pending.len(),
            "derivation gave up with entities pending"
        );
        DerivationReport {
            rounds,
            convergence: Convergence::Exhausted { pending }
        }
    }

    fn execute<H, W>(
        &self,
        host: &mut H,
        writer: &mut W,
        pending: Option<&BTreeSet<QualifiedName>>,
        round: usize
    ) -> PassReport
    where
        H: EntityHost + ?Sized,
        W: CodeWriter + ?Sized
    {
        let mut report = PassReport {
            round,
            ..PassReport::default()
        };

        let discovery = find_entities(&*host, &self.filter);
        if let Some(err) = &discovery.error {
            report.record(Level::Error, None, format!("entity discovery failed: {err}"));
            report.discovery_error = Some(err.to_string());
            // keep pending entities pending; nothing was learned about them
            for name in pending.into_iter().flatten() {
                report.outcomes.push((
                    name.clone(),
                    DerivationOutcome::Deferred(DeferReason::Failed(err.to_string()))
                ));
            }
            return report;
        }

        report.filtered_out = discovery.filtered_out;
        let entities: Vec<EntityDeclaration> = discovery
            .entities
            .into_iter()
            .filter(|entity| pending.is_none_or(|pending| pending.contains(&entity.name)))
            .collect();
        report.discovered = entities.len();

        if entities.is_empty() {
            info!(round, "no entities found");
            report.record(Level::Info, None, "no entities found".to_string());
            return report;
        }

        let mut generated = Vec::new();
        for entity in &entities {
            let outcome = self.process(&*host, writer, entity, &mut report, &mut generated);
            if !outcome.is_deferred() {
                report.processed += 1;
            }
            report.outcomes.push((entity.name.clone(), outcome));
        }

        for spec in generated.iter().flat_map(EmittedTypes::specs) {
            report.learned |= host.observe_generated(spec);
        }

        let message = format!("processed {}/{} entities", report.processed, report.discovered);
        info!(round, processed = report.processed, discovered = report.discovered, "pass complete");
        report.record(Level::Info, None, message);
        report
    }

    fn process<H, W>(
        &self,
        host: &H,
        writer: &mut W,
        entity: &EntityDeclaration,
        report: &mut PassReport,
        generated: &mut Vec<EmittedTypes>
    ) -> DerivationOutcome
    where
        H: EntityHost + ?Sized,
        W: CodeWriter + ?Sized
    {
        if !host.is_fully_resolvable(entity) {
            debug!(entity = %entity.name, "entity not yet resolvable, deferring");
            return DerivationOutcome::Deferred(DeferReason::NotResolvable);
        }

        let classification = classify(entity);
        if classification.is_empty() {
            warn!(entity = %entity.name, "entity has no editable properties");
            report.record(
                Level::Warning,
                Some(&entity.name),
                format!("`{}` has no editable properties", entity.name)
            );
            return DerivationOutcome::Skipped(SkipReason::NoEditableProperties);
        }

        let result = self
            .derive_files(host, entity, &classification)
            .and_then(|(types, files)| {
                writer.commit(files)?;
                Ok(types)
            });

        match result {
            Ok(types) => {
                info!(entity = %entity.name, package = %types.input.package, "types generated");
                let outcome = DerivationOutcome::Emitted {
                    origin: entity.origin.clone(),
                    types:  [types.input.qualified_name(), types.update.qualified_name()]
                };
                generated.push(types);
                outcome
            }
            Err(err) => {
                error!(entity = %entity.name, error = %err, "failed to derive types");
                report.record(
                    Level::Error,
                    Some(&entity.name),
                    format!("failed to process `{}`: {err}", entity.name)
                );
                DerivationOutcome::Deferred(DeferReason::Failed(err.to_string()))
            }
        }
    }

    fn derive_files<H: EntityHost + ?Sized>(
        &self,
        host: &H,
        entity: &EntityDeclaration,
        classification: &Classification<'_>
    ) -> Result<(EmittedTypes, Vec<GeneratedFile>), DeriveError> {
        let resolver = TypeResolver::new(host, &self.config, &self.filter);
        let properties: Vec<ResolvedProperty> = classification
            .editable
            .iter()
            .map(|property| {
                let resolution = resolver.resolution(entity, property);
                ResolvedProperty {
                    name:        property.name.clone(),
                    ty:          resolution.ty,
                    doc:         property.doc.clone(),
                    entity_sets: resolution.entity_sets
                }
            })
            .collect();

        let types = emit(entity, &properties, &self.config);
        let files = types
            .specs()
            .into_iter()
            .map(|spec| render(spec, &self.derives, &entity.origin))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((types, files))
    }
}
