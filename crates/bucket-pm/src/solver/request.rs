use std::fmt;

use bucket_semver::ConstraintInterface;

/// What a job asks the solver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobCommand {
    Install,
    /// Allow installed packages matching the name to move to another version
    Update,
    /// Allow every installed package to change
    UpdateAll,
    Uninstall,
    /// Install request restricted to alias packages
    MarkAliasInstalled,
    /// Uninstall request restricted to alias packages
    MarkAliasUninstalled,
}

impl JobCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCommand::Install => "install",
            JobCommand::Update => "update",
            JobCommand::UpdateAll => "update-all",
            JobCommand::Uninstall => "remove",
            JobCommand::MarkAliasInstalled => "mark-alias-installed",
            JobCommand::MarkAliasUninstalled => "mark-alias-uninstalled",
        }
    }
}

/// A single user request
#[derive(Debug, Clone)]
pub struct Job {
    pub command: JobCommand,
    /// Lowercase package name; `None` only for `UpdateAll`
    pub package_name: Option<String>,
    pub constraint: Option<Box<dyn ConstraintInterface>>,
    /// Pins the package to its installed version
    pub fixed: bool,
}

impl Job {
    pub fn package_name(&self) -> &str {
        self.package_name.as_deref().unwrap_or("")
    }

    pub fn constraint(&self) -> Option<&dyn ConstraintInterface> {
        self.constraint.as_deref()
    }

    /// Name and constraint as shown to users, e.g. `a/a ^1.0`
    pub fn pretty_target(&self) -> String {
        match &self.constraint {
            Some(constraint) => format!("{} {}", self.package_name(), constraint.pretty_string()),
            None => self.package_name().to_string(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.command.as_str(), self.pretty_target())
    }
}

/// Ordered list of jobs for one solve
#[derive(Debug, Clone, Default)]
pub struct Request {
    jobs: Vec<Job>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(
        &mut self,
        name: impl Into<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
    ) -> &mut Self {
        self.add_job(JobCommand::Install, Some(name.into()), constraint, false)
    }

    pub fn update(
        &mut self,
        name: impl Into<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
    ) -> &mut Self {
        self.add_job(JobCommand::Update, Some(name.into()), constraint, false)
    }

    pub fn update_all(&mut self) -> &mut Self {
        self.add_job(JobCommand::UpdateAll, None, None, false)
    }

    pub fn remove(
        &mut self,
        name: impl Into<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
    ) -> &mut Self {
        self.add_job(JobCommand::Uninstall, Some(name.into()), constraint, false)
    }

    /// Install request that must keep the currently installed version
    pub fn fix(
        &mut self,
        name: impl Into<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
    ) -> &mut Self {
        self.add_job(JobCommand::Install, Some(name.into()), constraint, true)
    }

    pub fn mark_alias_installed(
        &mut self,
        name: impl Into<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
    ) -> &mut Self {
        self.add_job(JobCommand::MarkAliasInstalled, Some(name.into()), constraint, false)
    }

    pub fn mark_alias_uninstalled(
        &mut self,
        name: impl Into<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
    ) -> &mut Self {
        self.add_job(JobCommand::MarkAliasUninstalled, Some(name.into()), constraint, false)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn add_job(
        &mut self,
        command: JobCommand,
        name: Option<String>,
        constraint: Option<Box<dyn ConstraintInterface>>,
        fixed: bool,
    ) -> &mut Self {
        self.jobs.push(Job {
            command,
            package_name: name.map(|n| n.to_lowercase()),
            constraint,
            fixed,
        });
        self
    }
}
