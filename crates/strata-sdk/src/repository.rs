use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_diff::{DiffTreeWalk, PathFilter};
use strata_index::{AddOp, StagingArea, WorkingTree};
use strata_refs::types::{
    branch_name, branch_ref, remote_prefix, HEAD, HEADS_PREFIX, STAGE_HEAD, WORK_HEAD,
};
use strata_refs::{
    validate_branch_name, validate_ref_name, validate_remote_name, FileRefDatabase,
    InMemoryRefDatabase, Ref, RefDatabase, RefError, RefValue, UpdateRef, UpdateSymRef,
};
use strata_store::{
    FileObjectStore, NodeRef, ObjectDatabase, RevCommit, RevFeature, RevFeatureType, RevTree,
    Revision, Value,
};
use strata_sync::{
    FetchContext, FetchOp, FetchResult, LocalTransport, RefSpec, RemoteConfig, TransportFactory,
};
use strata_types::ObjectId;
use tracing::info;

use crate::commit::CommitOp;
use crate::config::{RemoteSection, RepoConfig};
use crate::diff_op::{resolve_tree, DiffOp};
use crate::error::{DiffSide, SdkError, SdkResult};
use crate::log::LogIter;
use crate::revparse::rev_parse;

/// Directory holding repository state inside the working directory.
pub const REPO_DIR: &str = ".strata";
const OBJECTS_DIR: &str = "objects";
const REFS_DIR: &str = "refdb";
const CONFIG_FILE: &str = "config.toml";

/// Counts of pending changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// Staged changes not yet committed.
    pub staged: usize,
    /// Working-tree changes not yet staged.
    pub unstaged: usize,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0
    }
}

/// A strata repository: object store, refs, working tree and staging area
/// behind one handle.
pub struct Repository {
    root: Option<PathBuf>,
    db: ObjectDatabase,
    refs: Arc<dyn RefDatabase>,
    config: RepoConfig,
    working: WorkingTree,
    staging: StagingArea,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("remotes", &self.config.remote.len())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Create a repository in `path/.strata`.
    pub fn init(path: impl AsRef<Path>) -> SdkResult<Self> {
        let root = path.as_ref().to_path_buf();
        let dir = root.join(REPO_DIR);
        if dir.exists() {
            return Err(SdkError::AlreadyExists(root.display().to_string()));
        }
        fs::create_dir_all(&dir)?;
        let config = RepoConfig::default();
        config.save(&dir.join(CONFIG_FILE))?;

        let repo = Self::open_dir(root, &dir, config)?;
        repo.init_refs()?;
        info!(path = %dir.display(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository in `path/.strata`.
    pub fn open(path: impl AsRef<Path>) -> SdkResult<Self> {
        let root = path.as_ref().to_path_buf();
        let dir = root.join(REPO_DIR);
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.is_file() {
            return Err(SdkError::NotARepository(root.display().to_string()));
        }
        let config = RepoConfig::load(&config_path)?;
        Self::open_dir(root, &dir, config)
    }

    /// A repository that lives only in memory.
    pub fn in_memory() -> SdkResult<Self> {
        let refs: Arc<dyn RefDatabase> = Arc::new(InMemoryRefDatabase::new());
        let repo = Self::assemble(None, ObjectDatabase::in_memory(), refs, RepoConfig::default());
        repo.init_refs()?;
        Ok(repo)
    }

    fn open_dir(root: PathBuf, dir: &Path, config: RepoConfig) -> SdkResult<Self> {
        let store = FileObjectStore::open(dir.join(OBJECTS_DIR))?;
        let db = ObjectDatabase::new(Arc::new(store));
        let refs: Arc<dyn RefDatabase> = Arc::new(FileRefDatabase::open(dir.join(REFS_DIR))?);
        Ok(Self::assemble(Some(root), db, refs, config))
    }

    fn assemble(
        root: Option<PathBuf>,
        db: ObjectDatabase,
        refs: Arc<dyn RefDatabase>,
        config: RepoConfig,
    ) -> Self {
        Self {
            working: WorkingTree::new(db.clone(), Arc::clone(&refs)),
            staging: StagingArea::new(db.clone(), Arc::clone(&refs)),
            root,
            db,
            refs,
            config,
        }
    }

    fn init_refs(&self) -> SdkResult<()> {
        let master = branch_ref("master");
        UpdateSymRef::new(self.refs.as_ref(), HEAD)
            .new_value(master.as_str())
            .old_value(ObjectId::NULL)
            .reason("init")
            .call()?;
        for name in [master.as_str(), WORK_HEAD, STAGE_HEAD] {
            UpdateRef::new(self.refs.as_ref(), name)
                .new_value(ObjectId::NULL)
                .old_value(ObjectId::NULL)
                .reason("init")
                .call()?;
        }
        Ok(())
    }

    // ---- Accessors ----

    /// Working directory, `None` for an in-memory repository.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn db(&self) -> &ObjectDatabase {
        &self.db
    }

    pub fn refs(&self) -> &dyn RefDatabase {
        self.refs.as_ref()
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Mutable configuration; call [`Repository::save_config`] to persist.
    pub fn config_mut(&mut self) -> &mut RepoConfig {
        &mut self.config
    }

    pub fn save_config(&self) -> SdkResult<()> {
        match &self.root {
            Some(root) => self.config.save(&root.join(REPO_DIR).join(CONFIG_FILE)),
            None => Ok(()),
        }
    }

    pub fn working_tree(&self) -> &WorkingTree {
        &self.working
    }

    pub fn staging_area(&self) -> &StagingArea {
        &self.staging
    }

    // ---- Working tree and staging ----

    /// Write a feature of type `feature_type` at `parent_path/feature_id`.
    pub fn insert(
        &self,
        parent_path: &str,
        feature_id: &str,
        values: Vec<Value>,
        feature_type: &RevFeatureType,
    ) -> SdkResult<NodeRef> {
        let feature = RevFeature::new(feature_type.id()?, values);
        Ok(self.working.insert(parent_path, feature_id, &feature, feature_type)?)
    }

    /// Remove a feature or subtree from the working tree.
    pub fn delete(&self, path: &str) -> SdkResult<bool> {
        Ok(self.working.delete(path)?)
    }

    /// Stage every working-tree change.
    pub fn add(&self) -> SdkResult<ObjectId> {
        Ok(self.add_op().call()?)
    }

    /// An [`AddOp`] for filtered or update-only staging.
    pub fn add_op(&self) -> AddOp<'_> {
        AddOp::new(&self.working, &self.staging)
    }

    pub fn status(&self) -> SdkResult<Status> {
        Ok(Status {
            staged: self.staging.count_staged(None)?,
            unstaged: self.working.count_unstaged(None)?,
        })
    }

    fn has_uncommitted_changes(&self) -> SdkResult<bool> {
        if !self.staging.is_clean()? {
            return Ok(true);
        }
        match self.working.get_unstaged(None)?.next() {
            None => Ok(false),
            Some(entry) => entry.map(|_| true).map_err(Into::into),
        }
    }

    // ---- History ----

    /// Record the staged tree as a new commit on the current branch, or on
    /// `HEAD` itself when detached. The ref moves only if it still points at
    /// the parent read here.
    pub fn commit(&self, op: &CommitOp) -> SdkResult<ObjectId> {
        if op.all {
            self.add()?;
        }
        let parent = self
            .refs
            .resolve(HEAD)?
            .ok_or_else(|| RefError::NotFound(HEAD.to_string()))?
            .object_id;
        let target = self.refs.resolve_target(HEAD)?;

        let empty = self.db.put(&RevTree::empty())?;
        let staged = self.staging.tree_id()?;
        let tree_id = if staged.is_null() { empty } else { staged };
        let parent_tree = if parent.is_null() {
            empty
        } else {
            self.db.get_commit(&parent)?.tree_id
        };
        if tree_id == parent_tree && !op.allow_empty {
            return Err(SdkError::NothingToCommit);
        }

        let author = op.author.clone().unwrap_or_else(|| self.config.person());
        let committer = op.committer.clone().unwrap_or_else(|| author.clone());
        let parents = if parent.is_null() { Vec::new() } else { vec![parent] };
        let commit = RevCommit::new(tree_id, parents, author, committer, op.message.clone());
        let id = self.db.put(&commit)?;

        UpdateRef::new(self.refs.as_ref(), target.as_str())
            .new_value(id)
            .old_value(parent)
            .reason("commit")
            .call()?;
        info!(id = %id.short_hex(), branch = %target, tree = %tree_id.short_hex(), "committed");
        Ok(id)
    }

    /// First-parent history from `HEAD`, newest first.
    pub fn log(&self) -> SdkResult<LogIter> {
        self.log_from(HEAD)
    }

    pub fn log_from(&self, spec: &str) -> SdkResult<LogIter> {
        Ok(LogIter::new(&self.db, self.rev_parse(spec)?))
    }

    pub fn rev_parse(&self, spec: &str) -> SdkResult<ObjectId> {
        rev_parse(self.refs.as_ref(), &self.db, spec)
    }

    /// Changes between two revisions. See [`DiffOp`] for the defaults.
    pub fn diff(&self, op: &DiffOp) -> SdkResult<DiffTreeWalk> {
        let old = resolve_tree(self.refs.as_ref(), &self.db, op.old_spec(), DiffSide::Old)?;
        let new = resolve_tree(self.refs.as_ref(), &self.db, op.new_spec(), DiffSide::New)?;
        let filter = op.filter.as_ref().map(PathFilter::new);
        Ok(DiffTreeWalk::new(&self.db, old, new).with_filter(filter))
    }

    // ---- Branches ----

    /// Short name of the checked out branch, `None` when detached.
    pub fn current_branch(&self) -> SdkResult<Option<String>> {
        Ok(match self.refs.read(HEAD)? {
            Some(RefValue::Symbolic(target)) => branch_name(&target).map(str::to_string),
            _ => None,
        })
    }

    pub fn branches(&self) -> SdkResult<Vec<Ref>> {
        Ok(self.refs.list_refs(HEADS_PREFIX)?)
    }

    /// Create branch `name` at `start` (default `HEAD`), optionally checking
    /// it out.
    pub fn create_branch(&self, name: &str, start: Option<&str>, checkout: bool) -> SdkResult<Ref> {
        validate_branch_name(name)?;
        let ref_name = branch_ref(name);
        if self.refs.read(&ref_name)?.is_some() {
            return Err(SdkError::BranchExists(name.to_string()));
        }
        let start = start.unwrap_or(HEAD);
        let id = self.rev_parse(start)?;
        if id.is_null() {
            return Err(SdkError::BadRevision(start.to_string()));
        }
        self.db.get_commit(&id)?;

        let created = UpdateRef::new(self.refs.as_ref(), ref_name.as_str())
            .new_value(id)
            .old_value(ObjectId::NULL)
            .reason(format!("branch from {start}"))
            .call()?
            .ok_or_else(|| SdkError::BranchNotFound(name.to_string()))?;
        info!(branch = %name, id = %id.short_hex(), "created branch");
        if checkout {
            self.checkout(name, false)?;
        }
        Ok(created)
    }

    /// Delete branch `name`, returning the tip it had.
    pub fn delete_branch(&self, name: &str) -> SdkResult<ObjectId> {
        if self.current_branch()?.as_deref() == Some(name) {
            return Err(SdkError::CannotDeleteCurrentBranch(name.to_string()));
        }
        let ref_name = branch_ref(name);
        let value = self
            .refs
            .read(&ref_name)?
            .ok_or_else(|| SdkError::BranchNotFound(name.to_string()))?;
        let previous = UpdateRef::new(self.refs.as_ref(), ref_name.as_str())
            .delete()
            .old_value(value)
            .reason("branch delete")
            .call()?;
        info!(branch = %name, "deleted branch");
        Ok(previous.map_or(ObjectId::NULL, |r| r.object_id))
    }

    /// Check out a branch (symbolic `HEAD`) or any other commit (detached
    /// `HEAD`), resetting the working and staged trees to its tree.
    pub fn checkout(&self, target: &str, force: bool) -> SdkResult<()> {
        if !force && self.has_uncommitted_changes()? {
            return Err(SdkError::UncommittedChanges);
        }

        let branch = if target.starts_with(HEADS_PREFIX) {
            target.to_string()
        } else {
            branch_ref(target)
        };
        let is_branch = validate_ref_name(&branch).is_ok() && self.refs.read(&branch)?.is_some();
        let commit_id = if is_branch {
            self.refs.resolve_id(&branch)?
        } else {
            let id = self.rev_parse(target)?;
            if id.is_null() {
                return Err(SdkError::BadRevision(target.to_string()));
            }
            id
        };
        let tree = if commit_id.is_null() {
            ObjectId::NULL
        } else {
            self.db.get_commit(&commit_id)?.tree_id
        };

        let old_head = self.refs.read(HEAD)?.unwrap_or(RefValue::Direct(ObjectId::NULL));
        if is_branch {
            UpdateSymRef::new(self.refs.as_ref(), HEAD)
                .new_value(branch.as_str())
                .old_value(old_head)
                .reason(format!("checkout {target}"))
                .call()?;
        } else {
            UpdateRef::new(self.refs.as_ref(), HEAD)
                .new_value(commit_id)
                .old_value(old_head)
                .reason(format!("checkout {target}"))
                .call()?;
        }

        self.working.update_tree(tree, self.working.tree_id()?)?;
        self.staging.update_tree(tree, self.staging.tree_id()?)?;
        info!(target = %target, id = %commit_id.short_hex(), detached = !is_branch, "checked out");
        Ok(())
    }

    // ---- Remotes ----

    pub fn remotes(&self) -> Vec<RemoteConfig> {
        self.config.remotes()
    }

    /// Configure remote `name` with the default fetch refspec.
    pub fn add_remote(&mut self, name: &str, url: &str) -> SdkResult<RemoteConfig> {
        validate_remote_name(name)?;
        if self.config.remote.contains_key(name) {
            return Err(SdkError::RemoteExists(name.to_string()));
        }
        let section = RemoteSection {
            url: url.to_string(),
            fetch: RefSpec::default_for(name),
        };
        self.config.remote.insert(name.to_string(), section);
        self.save_config()?;
        info!(remote = %name, url = %url, "added remote");
        Ok(RemoteConfig::new(name, url))
    }

    /// Forget remote `name` and delete its tracking refs.
    pub fn remove_remote(&mut self, name: &str) -> SdkResult<()> {
        if self.config.remote.remove(name).is_none() {
            return Err(SdkError::UnknownRemote(name.to_string()));
        }
        for (ref_name, value) in self.refs.list(&remote_prefix(name))? {
            UpdateRef::new(self.refs.as_ref(), ref_name.as_str())
                .delete()
                .old_value(value)
                .reason("remote remove")
                .call()?;
        }
        if self.config.default_remote.as_deref() == Some(name) {
            self.config.default_remote = None;
        }
        self.save_config()?;
        info!(remote = %name, "removed remote");
        Ok(())
    }

    /// Fetch from the remotes `op` selects into tracking refs.
    pub async fn fetch(
        &self,
        op: &FetchOp,
        transports: &dyn TransportFactory,
    ) -> SdkResult<FetchResult> {
        let remotes = self.config.remotes();
        let ctx = FetchContext {
            db: &self.db,
            refs: self.refs.as_ref(),
            remotes: &remotes,
            default_remote: self.config.default_remote.as_deref(),
            transports,
        };
        Ok(op.call(&ctx).await?)
    }

    /// Serve this repository's objects and branches to a fetching peer.
    pub fn transport(&self) -> LocalTransport {
        LocalTransport::new(self.db.clone(), Arc::clone(&self.refs))
    }
}
