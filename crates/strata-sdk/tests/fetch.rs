use strata_sdk::{
    AttributeDescriptor, AttributeKind, CommitOp, FetchOp, FileTransportFactory,
    LocalTransportRegistry, ObjectId, Person, Repository, RevFeatureType, SdkError, Value,
};
use strata_sync::SyncError;

fn wells() -> RevFeatureType {
    RevFeatureType::new(
        "wells",
        vec![
            AttributeDescriptor::new("depth", AttributeKind::Int, false),
            AttributeDescriptor::new("geom", AttributeKind::Geometry, false),
        ],
    )
}

fn well(depth: i64) -> Vec<Value> {
    vec![Value::Int(depth), Value::Geometry("POINT (3 4)".into())]
}

fn commit(repo: &Repository, message: &str) -> ObjectId {
    repo.commit(&CommitOp::new(message).all(true).with_author(Person::anonymous()))
        .unwrap()
}

/// A remote with `master` and `dev`, and a local clone configured to fetch
/// from it through an in-process registry.
fn setup() -> (Repository, Repository, LocalTransportRegistry) {
    let remote = Repository::in_memory().unwrap();
    remote.insert("wells", "w1", well(10), &wells()).unwrap();
    commit(&remote, "w1");
    remote.create_branch("dev", None, true).unwrap();
    remote.insert("wells", "w2", well(20), &wells()).unwrap();
    commit(&remote, "w2");
    remote.checkout("master", false).unwrap();

    let registry = LocalTransportRegistry::new();
    registry.register("mem://origin", remote.transport()).unwrap();
    let mut local = Repository::in_memory().unwrap();
    local.add_remote("origin", "mem://origin").unwrap();
    (remote, local, registry)
}

#[tokio::test]
async fn second_fetch_is_a_no_op() {
    let (remote, local, registry) = setup();

    let first = local.fetch(&FetchOp::new(), &registry).await.unwrap();
    assert_eq!(first.updates.len(), 2);
    assert!(first.objects_fetched > 0);
    let master = local.refs().get_ref("refs/remotes/origin/master").unwrap();
    let dev = local.refs().get_ref("refs/remotes/origin/dev").unwrap();
    assert_eq!(master, remote.rev_parse("master").unwrap());
    assert_eq!(dev, remote.rev_parse("dev").unwrap());

    let second = local.fetch(&FetchOp::new(), &registry).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(second.objects_fetched, 0);
    assert_eq!(local.refs().get_ref("refs/remotes/origin/master").unwrap(), master);
    assert_eq!(local.refs().get_ref("refs/remotes/origin/dev").unwrap(), dev);
}

#[tokio::test]
async fn prune_removes_refs_deleted_on_the_remote() {
    let (remote, local, registry) = setup();
    local.fetch(&FetchOp::new(), &registry).await.unwrap();
    let master = local.refs().get_ref("refs/remotes/origin/master").unwrap();

    remote.delete_branch("dev").unwrap();
    let result = local
        .fetch(&FetchOp::new().prune(true), &registry)
        .await
        .unwrap();
    assert_eq!(result.pruned, vec!["refs/remotes/origin/dev".to_string()]);
    assert!(local.refs().read("refs/remotes/origin/dev").unwrap().is_none());
    assert_eq!(local.refs().get_ref("refs/remotes/origin/master").unwrap(), master);
}

#[tokio::test]
async fn fetched_history_can_be_checked_out() {
    let (remote, local, registry) = setup();
    local.fetch(&FetchOp::new(), &registry).await.unwrap();

    local.checkout("origin/dev", false).unwrap();
    assert_eq!(local.rev_parse("HEAD").unwrap(), remote.rev_parse("dev").unwrap());
    assert!(local.working_tree().find("wells/w2").unwrap().is_some());
    assert_eq!(local.current_branch().unwrap(), None);
}

#[tokio::test]
async fn fetch_without_remotes_fails() {
    let local = Repository::in_memory().unwrap();
    let registry = LocalTransportRegistry::new();
    let err = local.fetch(&FetchOp::new(), &registry).await.unwrap_err();
    assert!(matches!(err, SdkError::Sync(SyncError::NoRemotesConfigured)));
}

#[tokio::test]
async fn fetch_between_repositories_on_disk() {
    let remote_dir = tempfile::tempdir().unwrap();
    let local_dir = tempfile::tempdir().unwrap();

    let remote = Repository::init(remote_dir.path()).unwrap();
    remote.insert("wells", "w1", well(10), &wells()).unwrap();
    let tip = commit(&remote, "w1");

    let mut local = Repository::init(local_dir.path()).unwrap();
    let url = format!("file://{}", remote_dir.path().display());
    local.add_remote("origin", &url).unwrap();

    let result = local.fetch(&FetchOp::new(), &FileTransportFactory).await.unwrap();
    assert_eq!(result.updates.len(), 1);
    assert_eq!(local.refs().get_ref("refs/remotes/origin/master").unwrap(), tip);
    assert!(local.db().exists(&tip).unwrap());

    let again = local.fetch(&FetchOp::new(), &FileTransportFactory).await.unwrap();
    assert_eq!(again.objects_fetched, 0);
}
