//! Replication Hostgroup Manager - converges `mysql_replication_hostgroups`
//! onto the declared catalog

use async_trait::async_trait;
use proxysql_cfgmgr_common::{
    AdminSession, CfgMgr, CfgMgrError, CfgMgrResult, FailurePolicy, Operation, RunMode,
};
use tracing::{debug, info, instrument, warn};

use crate::catalog::validate_catalog;
use crate::commands::*;
use crate::matcher::{self, Action};
use crate::repository::Repository;
use crate::tables::{columns, ADMIN_REPLICATION_HOSTGROUPS_TABLE};
use crate::types::*;

/// Result of reconciling one catalog resource
#[derive(Debug)]
pub struct ResourceOutcome {
    /// Catalog name of the resource
    pub name: String,
    /// Action planned for the resource (`None` if it was rejected while planning)
    pub action: Option<Action>,
    /// State after the pass, or why it could not be reached
    pub result: CfgMgrResult<ResourceState>,
}

impl ResourceOutcome {
    /// True if the resource did not reach its declared state
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }

    /// True if a mutating statement was issued and succeeded
    pub fn changed(&self, mode: RunMode) -> bool {
        mode == RunMode::Apply
            && self.result.is_ok()
            && self.action.as_ref().is_some_and(Action::is_mutation)
    }

    /// Name of the planned action, `rejected` when planning refused it
    pub fn action_name(&self) -> &'static str {
        self.action.as_ref().map_or("rejected", Action::as_str)
    }
}

/// Summary of one reconciliation pass
#[derive(Debug)]
pub struct PassReport {
    /// Whether statements were applied or only planned
    pub mode: RunMode,
    /// One outcome per catalog resource, in catalog order
    pub outcomes: Vec<ResourceOutcome>,
    /// Commit phases that completed
    pub commit: CommitOutcome,
    /// Why the commit stopped early, when the pass was allowed to continue
    pub commit_error: Option<CfgMgrError>,
}

impl PassReport {
    /// Outcomes of resources that failed
    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// True if any resource or the commit failed
    pub fn has_failures(&self) -> bool {
        self.commit_error.is_some() || self.failures().next().is_some()
    }

    /// Number of create/update/delete statements that succeeded
    pub fn mutation_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed(self.mode)).count()
    }

    /// Outcome of the resource called `name`
    pub fn outcome(&self, name: &str) -> Option<&ResourceOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Replication Hostgroup Manager
///
/// Runs discovery, matching, per-resource mutations and the commit for one
/// admin table. Every statement goes through the [`AdminSession`] in strict
/// sequence; nothing is retried.
pub struct ReplicationHostgroupMgr<S> {
    session: S,
    failure_policy: FailurePolicy,
    run_mode: RunMode,
}

impl<S: AdminSession> ReplicationHostgroupMgr<S> {
    /// Create a new manager on top of an admin session
    pub fn new(session: S) -> Self {
        Self {
            session,
            failure_policy: FailurePolicy::default(),
            run_mode: RunMode::default(),
        }
    }

    /// Set what happens after a resource fails
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Apply statements or only plan them
    pub fn with_run_mode(mut self, mode: RunMode) -> Self {
        self.run_mode = mode;
        self
    }

    /// The underlying admin session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Policy applied after a resource fails
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Whether mutating statements are issued
    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Read every pair currently in the admin table
    pub async fn discover(&self) -> CfgMgrResult<Repository> {
        Repository::discover(&self.session).await
    }

    /// Insert a pair; a missing comment is stored as the empty string
    #[instrument(skip(self, cache), fields(pair = %key))]
    pub async fn create(
        &self,
        cache: &mut Repository,
        key: HostgroupKey,
        comment: Option<&str>,
    ) -> CfgMgrResult<ResourceState> {
        cache.invalidate(key);
        self.session
            .run(&build_insert_stmt(key, comment))
            .await
            .map_err(|e| e.for_resource(key.name(), Operation::Create))?;

        info!("Created replication hostgroup pair {}", key);
        Ok(ResourceState::present(key, comment.unwrap_or_default()))
    }

    /// Delete a pair by natural key; deleting a missing pair is not an error
    #[instrument(skip(self, cache), fields(pair = %key))]
    pub async fn destroy(
        &self,
        cache: &mut Repository,
        key: HostgroupKey,
    ) -> CfgMgrResult<ResourceState> {
        cache.invalidate(key);
        self.session
            .run(&build_delete_stmt(key))
            .await
            .map_err(|e| e.for_resource(key.name(), Operation::Destroy))?;

        info!("Destroyed replication hostgroup pair {}", key);
        Ok(ResourceState::absent(key))
    }

    /// Rewrite the comment of an existing pair
    #[instrument(skip(self, cache), fields(pair = %key))]
    pub async fn update_comment(
        &self,
        cache: &mut Repository,
        key: HostgroupKey,
        value: &str,
    ) -> CfgMgrResult<ResourceState> {
        cache.invalidate(key);
        self.session
            .run(&build_update_comment_stmt(key, value))
            .await
            .map_err(|e| e.for_resource(key.name(), Operation::Update))?;

        info!(
            "Updated {} of replication hostgroup pair {}",
            columns::COMMENT,
            key
        );
        Ok(ResourceState::present(key, value))
    }

    /// Activate, then persist; each phase only when requested
    #[instrument(skip(self))]
    pub async fn commit(&self, request: CommitRequest) -> CfgMgrResult<CommitOutcome> {
        let mut outcome = CommitOutcome::default();
        self.commit_into(request, &mut outcome).await?;
        Ok(outcome)
    }

    /// Record each completed phase in `outcome` so a later failure keeps it
    async fn commit_into(
        &self,
        request: CommitRequest,
        outcome: &mut CommitOutcome,
    ) -> CfgMgrResult<()> {
        if request.activate {
            self.session
                .run(&build_load_to_runtime_stmt())
                .await
                .map_err(|e| {
                    e.for_resource(ADMIN_REPLICATION_HOSTGROUPS_TABLE, Operation::Activate)
                })?;
            outcome.activated = true;
            info!("Loaded MySQL servers to runtime");
        }

        if request.persist {
            self.session
                .run(&build_save_to_disk_stmt())
                .await
                .map_err(|e| {
                    e.for_resource(ADMIN_REPLICATION_HOSTGROUPS_TABLE, Operation::Persist)
                })?;
            outcome.persisted = true;
            info!("Saved MySQL servers to disk");
        }

        Ok(())
    }

    /// Run one full pass over `desired`
    #[instrument(skip(self, desired), fields(resources = desired.len(), mode = ?self.run_mode))]
    pub async fn reconcile_pass(&self, desired: &[ReplicationHostgroup]) -> CfgMgrResult<PassReport> {
        validate_catalog(desired)?;

        let mut cache = self.discover().await.map_err(|e| {
            e.for_resource(ADMIN_REPLICATION_HOSTGROUPS_TABLE, Operation::Discover)
        })?;
        let plan = matcher::plan(desired, &cache);
        debug!(
            "Planned {} mutations for {} resources",
            plan.mutation_count(),
            plan.entries.len()
        );

        let mut outcomes = Vec::with_capacity(plan.entries.len());
        let mut request = CommitRequest::default();

        for entry in plan.entries {
            let name = entry.name();
            let action = match entry.action {
                Ok(action) => action,
                Err(err) => {
                    let operation = planned_operation(&entry.resource, entry.current.is_some());
                    let err = err.for_resource(&name, operation);
                    if !self.should_continue(&err) {
                        return Err(err);
                    }
                    outcomes.push(ResourceOutcome {
                        name,
                        action: None,
                        result: Err(err),
                    });
                    continue;
                }
            };

            let result = self
                .apply(&mut cache, &action, entry.current.as_ref(), entry.resource.key())
                .await;

            match result {
                Ok(state) => {
                    if action.is_mutation() && self.run_mode == RunMode::Apply {
                        request.merge(&entry.resource);
                    }
                    outcomes.push(ResourceOutcome {
                        name,
                        action: Some(action),
                        result: Ok(state),
                    });
                }
                Err(err) => {
                    if !self.should_continue(&err) {
                        return Err(err);
                    }
                    outcomes.push(ResourceOutcome {
                        name,
                        action: Some(action),
                        result: Err(err),
                    });
                }
            }
        }

        let mut commit = CommitOutcome::default();
        let mut commit_error = None;
        match self.run_mode {
            RunMode::Apply => {
                if let Err(err) = self.commit_into(request, &mut commit).await {
                    if !self.should_continue(&err) {
                        return Err(err);
                    }
                    commit_error = Some(err);
                }
            }
            RunMode::Noop => {
                if !request.is_empty() {
                    debug!("Noop mode: skipping commit {:?}", request);
                }
            }
        }

        Ok(PassReport {
            mode: self.run_mode,
            outcomes,
            commit,
            commit_error,
        })
    }

    /// Carry out one planned action
    async fn apply(
        &self,
        cache: &mut Repository,
        action: &Action,
        current: Option<&HostgroupPair>,
        declared: HostgroupKey,
    ) -> CfgMgrResult<ResourceState> {
        let unchanged = || match current {
            Some(pair) => ResourceState::from(pair),
            None => ResourceState::absent(declared),
        };

        if self.run_mode == RunMode::Noop && action.is_mutation() {
            info!("Noop mode: would {} replication hostgroup pair {}", action.as_str(), declared);
            return Ok(unchanged());
        }

        match action {
            Action::Create { key, comment } => self.create(cache, *key, comment.as_deref()).await,
            Action::Destroy { key } => self.destroy(cache, *key).await,
            Action::UpdateComment { key, to, .. } => self.update_comment(cache, *key, to).await,
            Action::Unchanged | Action::AbsentNoop => Ok(unchanged()),
        }
    }

    /// Whether the pass may go on after `err`
    fn should_continue(&self, err: &CfgMgrError) -> bool {
        if self.failure_policy == FailurePolicy::Continue && !err.is_fatal_for_pass() {
            warn!(error = %err, "Failure tolerated, continuing the pass");
            return true;
        }
        false
    }
}

/// Operation a rejected resource would have needed
fn planned_operation(resource: &ReplicationHostgroup, matched: bool) -> Operation {
    match (resource.ensure, matched) {
        (Ensure::Absent, _) => Operation::Destroy,
        (Ensure::Present, true) => Operation::Update,
        (Ensure::Present, false) => Operation::Create,
    }
}

#[async_trait]
impl<S: AdminSession> CfgMgr for ReplicationHostgroupMgr<S> {
    type Resource = ReplicationHostgroup;
    type Report = PassReport;

    fn daemon_name(&self) -> &str {
        "replhgmgrd"
    }

    fn admin_table_names(&self) -> &[&str] {
        &[ADMIN_REPLICATION_HOSTGROUPS_TABLE]
    }

    async fn reconcile(&mut self, desired: &[Self::Resource]) -> CfgMgrResult<Self::Report> {
        self.reconcile_pass(desired).await
    }
}
