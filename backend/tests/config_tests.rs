//! Tests for repository selection: environment, `repository.toml` and
//! JSON snapshots.

mod support;

use std::fs;
use std::str::FromStr;

use timetable_engine::db::{
    LocalRepository, RepositoryConfig, RepositoryError, RepositoryFactory, RepositoryType,
};
use timetable_engine::services::check_conflicts;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(future)
}

fn write_snapshot(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("snapshot.json");
    let snapshot = support::campus().snapshot();
    fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

#[test]
fn test_repository_type_from_str() {
    assert_eq!(RepositoryType::from_str("POSTGRES").unwrap(), RepositoryType::Postgres);
    assert_eq!(RepositoryType::from_str("local").unwrap(), RepositoryType::Local);
    let err = RepositoryType::from_str("invalid").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env().unwrap(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/timetable")),
        ],
        || {
            assert_eq!(RepositoryType::from_env().unwrap(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_repository_type_from_env_rejects_unknown() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("mongo"))], || {
        let err = RepositoryType::from_env().unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    });
}

#[test]
fn test_snapshot_roundtrip_preserves_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path());

    let repo = LocalRepository::load_snapshot(&path).unwrap();
    assert_eq!(repo.snapshot(), support::campus().snapshot());
    assert_eq!(repo.entry_count(), 1);
}

#[test]
fn test_malformed_snapshot_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"classrooms\": [ { \"id\": ").unwrap();

    let err = LocalRepository::load_snapshot(&path).err().unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[test]
fn test_factory_from_env_loads_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path());
    let path_str = path.to_str().unwrap().to_string();

    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("LOCAL_SNAPSHOT_PATH", Some(path_str.as_str())),
        ],
        || {
            block_on(async {
                let repo = RepositoryFactory::from_env().await.unwrap();
                let verdict = check_conflicts(
                    repo.as_ref(),
                    &support::request(101, 7, 1, support::AY),
                )
                .await
                .unwrap();
                assert!(verdict.has_conflict);
            });
        },
    );
}

#[test]
fn test_config_file_resolves_relative_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshot(dir.path());
    let config_path = dir.path().join("repository.toml");
    fs::write(
        &config_path,
        "[repository]\ntype = \"local\"\n\n[local]\nsnapshot_path = \"snapshot.json\"\n",
    )
    .unwrap();

    let config = RepositoryConfig::from_file(&config_path).unwrap();
    assert_eq!(
        config.local.snapshot_path.as_deref(),
        Some(dir.path().join("snapshot.json").as_path())
    );

    block_on(async {
        let repo = RepositoryFactory::from_config_file(&config_path).await.unwrap();
        let verdict = check_conflicts(repo.as_ref(), &support::request(102, 5, 1, support::AY))
            .await
            .unwrap();
        assert!(verdict.has_conflict);
    });
}

#[test]
fn test_missing_config_file() {
    let err = RepositoryConfig::from_file("/nonexistent/repository.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[cfg(not(feature = "postgres-repo"))]
#[test]
fn test_postgres_config_without_feature() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("repository.toml");
    fs::write(
        &config_path,
        "[repository]\ntype = \"postgres\"\n\n[postgres]\ndatabase_url = \"postgres://localhost/x\"\n",
    )
    .unwrap();

    let result = block_on(RepositoryFactory::from_config_file(&config_path));
    assert!(matches!(
        result,
        Err(RepositoryError::ConfigurationError { .. })
    ));
}

#[test]
fn test_bundled_configuration_loads() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = RepositoryConfig::from_file(manifest_dir.join("repository.toml")).unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);

    let snapshot_path = config.local.snapshot_path.clone().unwrap();
    let repo = LocalRepository::load_snapshot(&snapshot_path).unwrap();
    assert_eq!(repo.entry_count(), 8);

    block_on(async {
        // Dr. Turing already teaches in M-101 on Monday 09:00
        let verdict = check_conflicts(&repo, &support::request(103, 9, 1, support::AY))
            .await
            .unwrap();
        assert!(verdict.has_conflict);
        assert!(verdict.message.contains("Dr. Alan Turing"));
    });
}
