//! Pipeline execution.
//!
//! A [`Pipeline`] expands a [`Target`] into its step graph, checks every
//! precondition that can be checked up front, then runs the steps in order.
//! A failed step only takes down the steps that require it; the other
//! architecture's work carries on.

use super::{
    graph::{PipelineGraph, Step},
    manifest::write_manifest,
    target::Target,
    tool_detection::missing_tools,
};
use crate::bundler::{
    Arch, Error, NotaryCredentials, ReleaseConfig, Result, Settings,
    platform::{
        freezer,
        macos::{
            self, dmg,
            inspect::{InspectionReport, inspect},
            notarize,
            sign::{self, SignatureCheck},
        },
        python,
    },
    workspace,
};
use std::collections::HashSet;
use std::path::PathBuf;

/// What happened to one step.
#[derive(Debug)]
pub enum StepOutcome {
    Succeeded,
    Failed(Error),
    /// Not run because a required step did not succeed.
    Skipped { blocked_by: Vec<Step> },
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub target: Target,
    pub steps: Vec<(Step, StepOutcome)>,
    /// Latest inspection, when the target includes one.
    pub inspection: Option<InspectionReport>,
    pub signature_checks: Vec<SignatureCheck>,
    pub cleanup_warnings: Vec<String>,
    pub manifest: Option<PathBuf>,
    /// Accepted notary submission ids.
    pub notary_submissions: Vec<(Arch, String)>,
}

impl PipelineReport {
    fn new(target: Target) -> Self {
        Self {
            target,
            steps: Vec::new(),
            inspection: None,
            signature_checks: Vec::new(),
            cleanup_warnings: Vec::new(),
            manifest: None,
            notary_submissions: Vec::new(),
        }
    }

    /// `true` when no step failed.
    pub fn success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Step, &Error)> {
        self.steps.iter().filter_map(|(step, outcome)| match outcome {
            StepOutcome::Failed(e) => Some((step, e)),
            _ => None,
        })
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    /// `true` when every signature check that ran passed.
    pub fn signature_checks_passed(&self) -> bool {
        self.signature_checks.iter().all(SignatureCheck::passed)
    }

    fn succeeded(&self, step: Step) -> bool {
        self.outcome(step).is_some_and(StepOutcome::succeeded)
    }
}

/// Runs targets against one workspace.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    config: &'a ReleaseConfig,
    credentials: Option<NotaryCredentials>,
    completed: HashSet<Step>,
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("workspace", &self.settings.workspace())
            .field("has_credentials", &self.credentials.is_some())
            .field("completed", &self.completed)
            .finish()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings, config: &'a ReleaseConfig) -> Self {
        Self {
            settings,
            config,
            credentials: None,
            completed: HashSet::new(),
        }
    }

    /// Credentials for `notarize`; dropped (and zeroed) with the pipeline.
    pub fn with_credentials(mut self, credentials: NotaryCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Run `target`.
    ///
    /// Returns `Err` only when the run could not start (a failed
    /// precondition or a malformed step graph). Step failures are recorded in
    /// the report. Every run starts from scratch, so a reused pipeline
    /// repeats steps an earlier target already ran.
    pub async fn run(&mut self, target: Target) -> Result<PipelineReport> {
        let graph = PipelineGraph::for_target(target);
        let order = graph.execution_order()?;
        self.preflight(&order)?;
        self.completed.clear();

        let missing = missing_tools(self.settings, &order);
        if !missing.is_empty() {
            log::warn!("Missing tools: {}", missing.join(", "));
        }

        log::info!(
            "Running {target}: {}",
            order.iter().map(ToString::to_string).collect::<Vec<_>>().join(" → ")
        );

        let mut report = PipelineReport::new(target);
        for step in order {
            if self.completed.contains(&step) {
                log::debug!("{step} already completed");
                report.steps.push((step, StepOutcome::Succeeded));
                continue;
            }

            let blocked_by: Vec<Step> = graph
                .required_by(step)
                .into_iter()
                .filter(|s| !report.succeeded(*s))
                .collect();
            if !blocked_by.is_empty() {
                log::warn!(
                    "Skipping {step}: {} did not succeed",
                    blocked_by.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                );
                report.steps.push((step, StepOutcome::Skipped { blocked_by }));
                continue;
            }

            if let Step::Notarize(arch) = step {
                if !self.settings.dmg_path(arch).is_file() {
                    log::warn!("{arch}: no disk image, nothing to notarize");
                    report.steps.push((step, StepOutcome::Skipped { blocked_by: Vec::new() }));
                    continue;
                }
            }

            log::info!("▶ {step}");
            let outcome = match self.execute(step, &mut report).await {
                Ok(()) => {
                    self.completed.insert(step);
                    StepOutcome::Succeeded
                }
                Err(e) => {
                    log::error!("✗ {step}: {e}");
                    StepOutcome::Failed(e)
                }
            };
            report.steps.push((step, outcome));
        }

        Ok(report)
    }

    /// Checks that must pass before anything is touched.
    fn preflight(&self, order: &[Step]) -> Result<()> {
        if order.iter().any(|s| matches!(s, Step::Sign(_))) {
            self.config.require_signing_identity()?;
        }
        if order.iter().any(|s| matches!(s, Step::Notarize(_))) {
            if notarize::packaged_architectures(self.settings).is_empty() {
                return Err(Error::Precondition(
                    "no disk images to notarize; run package-for-distribution first".into(),
                ));
            }
            if self.credentials.is_none() {
                return Err(Error::Precondition(
                    "notarization requires an Apple ID, team ID and app-specific password".into(),
                ));
            }
        }
        Ok(())
    }

    async fn execute(&self, step: Step, report: &mut PipelineReport) -> Result<()> {
        let settings = self.settings;
        match step {
            Step::Clean => {
                report
                    .cleanup_warnings
                    .extend(workspace::clean(settings).await.warnings);
            }
            Step::CleanEnvironments => {
                report
                    .cleanup_warnings
                    .extend(workspace::clean_environments(settings).await.warnings);
            }
            Step::Provision(arch) => {
                python::provision(settings, arch).await?;
            }
            Step::Freeze(arch) => {
                freezer::freeze(settings, arch).await?;
            }
            Step::Inspect => {
                let inspection = inspect(settings).await;
                log::info!("\n{inspection}");
                report.inspection = Some(inspection);
            }
            Step::Sign(arch) => {
                let identity = self.config.require_signing_identity()?;
                sign::sign_bundle(settings, identity, arch).await?;
            }
            Step::CheckSignature(arch) => {
                report
                    .signature_checks
                    .push(sign::check_signature(settings, arch).await);
            }
            Step::Package(arch) => {
                dmg::create_dmg(settings, arch).await?;
            }
            Step::WriteManifest => {
                report.manifest = Some(write_manifest(settings).await?);
            }
            Step::Notarize(arch) => {
                let credentials = self.credentials.as_ref().ok_or_else(|| {
                    Error::Precondition("notary credentials were not provided".into())
                })?;
                let verdict = notarize::submit(settings, credentials, arch).await?;
                report
                    .notary_submissions
                    .push((arch, verdict.id.unwrap_or_default()));
            }
            Step::Staple(arch) => {
                notarize::staple(settings, arch).await?;
            }
            Step::Launch(arch) => {
                macos::launch(settings, arch).await?;
            }
        }
        Ok(())
    }
}
