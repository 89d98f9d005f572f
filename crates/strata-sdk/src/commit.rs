use strata_types::Person;

/// Options for [`crate::Repository::commit`].
#[derive(Clone, Debug)]
pub struct CommitOp {
    pub message: String,
    /// Defaults to the configured user, stamped now.
    pub author: Option<Person>,
    /// Defaults to the author.
    pub committer: Option<Person>,
    /// Stage every working-tree change first.
    pub all: bool,
    /// Commit even when the staged tree equals the parent's.
    pub allow_empty: bool,
}

impl CommitOp {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author: None,
            committer: None,
            all: false,
            allow_empty: false,
        }
    }

    pub fn with_author(mut self, author: Person) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_committer(mut self, committer: Person) -> Self {
        self.committer = Some(committer);
        self
    }

    pub fn all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }
}
