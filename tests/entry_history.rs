use common::repo::{Content, RepoBuilder};
use lineage::artifacts::log::last_commits::EntryCommitInfo;
use lineage::artifacts::objects::object_id::ObjectId;
use lineage::config::Config;
use lineage::errors::Error;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

mod common;

fn summary(infos: &[EntryCommitInfo]) -> Vec<(String, ObjectId)> {
    infos
        .iter()
        .map(|info| (info.entry().name().to_string(), *info.commit().oid()))
        .collect()
}

/// C0 creates subdir/ and file.txt, C1 and C2 edit file.txt only
fn history(repo: &RepoBuilder) -> [ObjectId; 3] {
    let c0 = repo.commit(
        repo.snapshot(&[("subdir/a.rs", "a"), ("file.txt", "1")]),
        &[],
        100,
        "init",
    );
    let c1 = repo.commit(repo.snapshot(&[("subdir/a.rs", "a"), ("file.txt", "2")]), &[c0], 200, "two");
    let c2 = repo.commit(repo.snapshot(&[("subdir/a.rs", "a"), ("file.txt", "3")]), &[c1], 300, "three");
    repo.set_branch("main", c2);
    [c0, c1, c2]
}

#[tokio::test]
async fn failing_entry_fails_the_call_and_a_retry_after_repair_succeeds() {
    let repo = RepoBuilder::new();
    let [c0, _, c2] = history(&repo);
    let repository = repo.open(Config::default().with_max_concurrency(2));
    let head = repository.load_commit(&c2).unwrap();
    let root_tree = repository.tree(head.tree_oid()).unwrap();
    let entries = root_tree.entries(root_tree.root()).to_vec();
    assert_eq!(
        entries.iter().map(|entry| entry.name()).collect::<Vec<_>>(),
        vec!["subdir", "file.txt"]
    );

    // only the walk for subdir/ needs the snapshot of C0
    let c0_tree = *repository.load_commit(&c0).unwrap().tree_oid();
    let object_path = repo.object_path(&c0_tree);
    let stash = object_path.with_extension("stash");
    std::fs::rename(&object_path, &stash).unwrap();

    let failed = repository.entries_last_commits(&head, "", &entries).await;
    assert!(matches!(failed, Err(Error::MissingObject(oid)) if oid == c0_tree));

    std::fs::rename(&stash, &object_path).unwrap();

    let infos = repository.entries_last_commits(&head, "", &entries).await.unwrap();
    assert_eq!(
        summary(&infos),
        vec![("subdir".to_string(), c0), ("file.txt".to_string(), c2)]
    );
}

#[tokio::test]
async fn results_follow_input_order_at_any_concurrency() {
    let repo = RepoBuilder::new();
    let mut files = (0..12).map(|i| (format!("f{i:02}.txt"), format!("v0-{i}"))).collect::<Vec<_>>();
    let snapshot = |files: &[(String, String)]| {
        let borrowed = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect::<Vec<_>>();
        repo.snapshot(&borrowed)
    };

    let mut tip = repo.commit(snapshot(&files), &[], 100, "init");
    let mut expected = vec![tip; files.len()];
    for i in (0..files.len()).step_by(3) {
        files[i].1 = format!("v1-{i}");
        tip = repo.commit(snapshot(&files), &[tip], 200 + i as i64, &format!("edit {i}"));
        expected[i] = tip;
    }

    for max_concurrency in [1, 3, 16] {
        let repository = repo.open(Config::default().with_max_concurrency(max_concurrency));
        let head = repository.load_commit(&tip).unwrap();
        let tree = repository.tree(head.tree_oid()).unwrap();

        let infos = repository
            .entries_last_commits(&head, "", tree.entries(tree.root()))
            .await
            .unwrap();

        let names = files.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>();
        assert_eq!(summary(&infos), names.into_iter().zip(expected.clone()).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn submodule_entries_report_url_and_pinned_commit() {
    let repo = RepoBuilder::new();
    let pinned = ObjectId::from([0x77; 20]);
    let gitmodules = "[submodule \"vendor/lib\"]\n\tpath = vendor/lib\n\turl = https://example.com/lib.git\n";
    let c0 = repo.commit(
        repo.snapshot_with(&[
            (".gitmodules", Content::File(gitmodules)),
            ("vendor/lib", Content::SubModule(pinned)),
            ("vendor/README", Content::File("vendored code")),
        ]),
        &[],
        100,
        "vendor lib",
    );
    repo.set_branch("main", c0);

    let repository = repo.repository();
    let head = repository.head_commit().unwrap();
    let (tree, idx) = repository.sub_tree(&head, "vendor").unwrap();

    let infos = repository
        .entries_last_commits(&head, "vendor", tree.entries(idx))
        .await
        .unwrap();

    assert_eq!(infos.len(), 2);
    match &infos[0] {
        EntryCommitInfo::SubModule { entry, file } => {
            assert_eq!(entry.name(), "lib");
            assert_eq!(file.url, "https://example.com/lib.git");
            assert_eq!(file.ref_id, pinned);
            assert_eq!(file.commit.oid(), &c0);
        }
        other => panic!("expected a submodule, got {other:?}"),
    }
    assert!(matches!(&infos[1], EntryCommitInfo::Entry { entry, .. } if entry.name() == "README"));
}

#[tokio::test]
async fn cancelling_the_outer_token_cancels_the_call() {
    let repo = RepoBuilder::new();
    let [_, _, c2] = history(&repo);
    let repository = repo.repository();
    let head = repository.load_commit(&c2).unwrap();
    let tree = repository.tree(head.tree_oid()).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let result = repository
        .entries_last_commits_with_cancellation(&head, "", tree.entries(tree.root()), token)
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn concurrent_calls_on_one_repository_agree() {
    let repo = RepoBuilder::new();
    let [c0, _, c2] = history(&repo);
    let repository = repo.open(Config::default().with_max_concurrency(1));
    let head = repository.load_commit(&c2).unwrap();
    let tree = repository.tree(head.tree_oid()).unwrap();
    let entries = tree.entries(tree.root());

    let calls = (0..4).map(|_| repository.entries_last_commits(&head, "", entries));
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(
            summary(&result.unwrap()),
            vec![("subdir".to_string(), c0), ("file.txt".to_string(), c2)]
        );
    }
}
