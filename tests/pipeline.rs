//! End-to-end flows: loader adapter -> engine -> SQLite persistence

use clusterlens::{
    compute_cluster_metrics, compute_top_keywords,
    loader::{
        create_feature_source, load_division_rows, load_item_keywords, AssignmentSource,
        FeatureSource, FeatureSourceKind, JsonAssignmentSource,
    },
    report::render_metrics_table,
    Database,
};
use tempfile::TempDir;

const DIVISION: &str = r#"[
    {"user_id": 1, "user_latent_feature": [0.0, 0.0], "user_interest": "A", "user_interest_index": 0},
    {"user_id": 2, "user_latent_feature": [2.0, 0.0], "user_interest": "A", "user_interest_index": 0},
    {"user_id": 3, "user_latent_feature": [0.0, 4.0], "user_interest": "B", "user_interest_index": 1}
]"#;

const KEYWORDS: &str = r#"[
    {"user_id": 1, "top_words": ["x", "y"], "top_words_counts": [3, 1]},
    {"user_id": 2, "top_words": ["y"], "top_words_counts": [2]},
    {"user_id": 3, "top_words": ["z"], "top_words_counts": [5]},
    {"user_id": 99, "top_words": ["orphan"], "top_words_counts": [50]}
]"#;

fn fixture(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn json_and_database_sources_agree() {
    let dir = TempDir::new().unwrap();
    let division = fixture(&dir, "division.json", DIVISION);

    let json_source = create_feature_source(FeatureSourceKind::Json(division.clone()), None).unwrap();
    let from_json = compute_cluster_metrics(&json_source.load_features().await.unwrap(), &["A", "B"])
        .unwrap();

    let db = Database::new(&dir.path().join("data").join("clusterlens.db"))
        .await
        .unwrap();
    db.insert_user_division(&load_division_rows(&division).await.unwrap())
        .await
        .unwrap();
    let db_source = create_feature_source(FeatureSourceKind::Database, Some(db.clone())).unwrap();
    let from_db = compute_cluster_metrics(&db_source.load_features().await.unwrap(), &["A", "B"])
        .unwrap();

    assert_eq!(from_json, from_db);
    assert_eq!(from_json[0].size, 2);
    assert!((from_json[0].inter_distance - 17f64.sqrt()).abs() < 1e-12);
}

#[tokio::test]
async fn paired_source_feeds_metrics() {
    let dir = TempDir::new().unwrap();
    let features = fixture(
        &dir,
        "latent.json",
        r#"[
            {"user_id": "p", "user_latent_feature": [1.0, 1.0]},
            {"user_id": "q", "user_latent_feature": [3.0, 1.0]},
            {"user_id": "r", "user_latent_feature": [9.0, 9.0]}
        ]"#,
    );
    let predictions = fixture(
        &dir,
        "predict.json",
        r#"{"p": {"user_interest": "games"}, "q": {"user_interest": "games"}}"#,
    );

    let source = create_feature_source(
        FeatureSourceKind::Paired {
            features,
            predictions,
        },
        None,
    )
    .unwrap();
    let records = source.load_features().await.unwrap();
    let metrics = compute_cluster_metrics(&records, &["games"]).unwrap();

    assert_eq!(metrics[0].size, 2);
    assert_eq!(metrics[0].intra_dispersion, 1.0);
    assert_eq!(metrics[0].inter_distance, 0.0);
    assert!(render_metrics_table(&metrics).contains("games"));
}

#[tokio::test]
async fn metrics_persist_with_replace_semantics() {
    let dir = TempDir::new().unwrap();
    let division = fixture(&dir, "division.json", DIVISION);
    let db = Database::in_memory().await.unwrap();

    let records = clusterlens::loader::JsonFeatureSource::new(division)
        .load_features()
        .await
        .unwrap();
    let metrics = compute_cluster_metrics(&records, &["B", "A"]).unwrap();
    db.replace_cluster_metrics(&metrics).await.unwrap();
    db.replace_cluster_metrics(&metrics).await.unwrap();

    let rows = db.cluster_metrics().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].label, "B");
    assert_eq!(rows[1].label, "A");
    assert_eq!(rows[1].size, 2);
    assert!(!rows[0].computed_at.is_empty());
}

#[tokio::test]
async fn keyword_flow_from_json_and_database() {
    let dir = TempDir::new().unwrap();
    let division = fixture(&dir, "division.json", DIVISION);
    let keywords = fixture(&dir, "keywords.json", KEYWORDS);

    let items = load_item_keywords(&keywords).await.unwrap();

    let json_map = JsonAssignmentSource::new(&division)
        .load_assignments()
        .await
        .unwrap();
    let rankings = compute_top_keywords(&json_map, &items, 3, 2).unwrap();
    assert_eq!(rankings.len(), 3);
    assert_eq!(rankings[0].top_keywords, vec!["x", "y"]);
    assert_eq!(rankings[1].top_keywords, vec!["z"]);
    assert!(rankings[2].top_keywords.is_empty());

    let db = Database::in_memory().await.unwrap();
    db.insert_user_division(&load_division_rows(&division).await.unwrap())
        .await
        .unwrap();
    let db_map = db.load_assignments().await.unwrap();
    assert_eq!(db_map, json_map);

    db.replace_top_keywords(&rankings).await.unwrap();
    let stored = db.top_keywords().await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].keywords().unwrap(), vec!["x", "y"]);
    assert_eq!(stored[2].interest_index, 2);
}
