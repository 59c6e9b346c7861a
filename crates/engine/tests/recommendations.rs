//! Learning-path recommendations ranked against a user's skill gaps.

mod common;

use assert_matches::assert_matches;

use careeros_core::path_graph::EnrollmentStatus;
use careeros_core::proficiency::ProficiencyLevel;
use careeros_core::recommendation::PathRecommendationRequest;
use careeros_core::CoreError;
use careeros_engine::EngineError;

use common::*;

fn for_role(role: &str) -> PathRecommendationRequest {
    PathRecommendationRequest {
        user_id: LEARNER_ID,
        target_role: Some(role.to_string()),
        ..PathRecommendationRequest::default()
    }
}

fn ids(ranked: &careeros_core::recommendation::RankedPaths) -> Vec<i64> {
    ranked.recommendations.iter().map(|r| r.path.id).collect()
}

// ---- Test: paths closing the largest gaps rank first ----

#[tokio::test]
async fn ranks_paths_by_gap_coverage_and_progress() {
    let (engine, _) = seeded_engine().await;

    let ranked = engine.recommend_paths(for_role(BACKEND_ROLE)).await.unwrap();

    // Go Mastery closes Go and Docker and is a third done; the Kafka path
    // covers as many gap levels but has no progress. UX and the retired path
    // close nothing.
    assert_eq!(ids(&ranked), [GO_PATH_ID, KAFKA_PATH_ID, SQL_PATH_ID]);
    assert_eq!(ranked.considered_gaps, ["Go", "Docker", "SQL", "Kafka"]);

    let go = &ranked.recommendations[0];
    assert!((go.gap_coverage - 0.6).abs() < 1e-6);
    assert!((go.match_score - 0.52).abs() < 1e-3);
    assert_eq!(go.percent_complete, Some(33.33));

    let kafka = &ranked.recommendations[1];
    assert!((kafka.match_score - 0.42).abs() < 1e-6);
    assert_eq!(kafka.percent_complete, None);
}

// ---- Test: request filters narrow the catalog ----

#[tokio::test]
async fn filters_by_category_and_duration() {
    let (engine, _) = seeded_engine().await;

    let backend = engine
        .recommend_paths(PathRecommendationRequest {
            category: Some("Backend".to_string()),
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap();
    assert_eq!(ids(&backend), [GO_PATH_ID, KAFKA_PATH_ID]);

    let short = engine
        .recommend_paths(PathRecommendationRequest {
            max_duration_weeks: Some(6),
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap();
    assert_eq!(ids(&short), [KAFKA_PATH_ID, SQL_PATH_ID]);

    let advanced = engine
        .recommend_paths(PathRecommendationRequest {
            difficulty: Some(ProficiencyLevel::Advanced),
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap();
    assert_eq!(ids(&advanced), [KAFKA_PATH_ID]);
}

// ---- Test: completed enrollments are not recommended again ----

#[tokio::test]
async fn skips_completed_paths() {
    let (engine, store) = seeded_engine().await;
    store
        .insert_enrollment(enrollment(LEARNER_ID, KAFKA_PATH_ID, EnrollmentStatus::Completed))
        .await;

    let ranked = engine.recommend_paths(for_role(BACKEND_ROLE)).await.unwrap();

    assert_eq!(ids(&ranked), [GO_PATH_ID, SQL_PATH_ID]);
}

// ---- Test: enrollments outside the candidate set are never resolved ----

#[tokio::test]
async fn non_candidate_enrollment_is_ignored() {
    let (engine, store) = seeded_engine().await;
    // Path 20 is not in the catalog and its steps form a cycle; resolving it
    // would fail with a graph integrity error.
    store
        .insert_enrollment(enrollment(LEARNER_ID, CYCLIC_PATH_ID, EnrollmentStatus::InProgress))
        .await;

    let ranked = engine.recommend_paths(for_role(BACKEND_ROLE)).await.unwrap();

    assert_eq!(ids(&ranked), [GO_PATH_ID, KAFKA_PATH_ID, SQL_PATH_ID]);
    assert_eq!(ranked.recommendations[0].percent_complete, Some(33.33));
}

// ---- Test: the limit caps the result list ----

#[tokio::test]
async fn limit_caps_results() {
    let (engine, _) = seeded_engine().await;

    let ranked = engine
        .recommend_paths(PathRecommendationRequest {
            limit: Some(1),
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap();

    assert_eq!(ids(&ranked), [GO_PATH_ID]);
}

// ---- Test: free-form target skills work without a role ----

#[tokio::test]
async fn target_skills_without_role() {
    let (engine, _) = seeded_engine().await;

    let ranked = engine
        .recommend_paths(PathRecommendationRequest {
            user_id: LEARNER_ID,
            target_skills: vec!["docker".to_string(), "Rust".to_string()],
            ..PathRecommendationRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(ranked.considered_gaps.len(), 2);
    assert_eq!(ids(&ranked), [GO_PATH_ID]);
    assert_eq!(ranked.recommendations[0].closes_skills.len(), 1);
}

// ---- Test: difficulty and duration estimates follow the gaps ----

#[tokio::test]
async fn newcomer_gets_beginner_difficulty() {
    let (engine, _) = seeded_engine().await;

    let ranked = engine
        .recommend_paths(PathRecommendationRequest {
            user_id: NEWCOMER_ID,
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap();

    assert_eq!(ranked.suggested_difficulty, ProficiencyLevel::Beginner);
    assert!(ranked.estimated_weeks >= 2);
}

// ---- Test: a request without a target is rejected ----

#[tokio::test]
async fn missing_target_is_validation_error() {
    let (engine, _) = seeded_engine().await;

    let err = engine
        .recommend_paths(PathRecommendationRequest {
            user_id: LEARNER_ID,
            ..PathRecommendationRequest::default()
        })
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));

    let err = engine
        .recommend_paths(PathRecommendationRequest {
            limit: Some(500),
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));
}

// ---- Test: unknown role and user map to NotFound ----

#[tokio::test]
async fn unknown_role_or_user_is_not_found() {
    let (engine, _) = seeded_engine().await;

    let err = engine.recommend_paths(for_role("Astronaut")).await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::NotFound { entity: "Role", .. }));

    let err = engine
        .recommend_paths(PathRecommendationRequest {
            user_id: UNKNOWN_USER_ID,
            ..for_role(BACKEND_ROLE)
        })
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::NotFound { entity: "User", .. }));
}

// ---- Test: concurrent requests see the same ranking ----

#[tokio::test]
async fn concurrent_requests_agree() {
    let (engine, _) = seeded_engine().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.recommend_paths(for_role(BACKEND_ROLE)).await })
        })
        .collect();

    let mut rankings = Vec::new();
    for handle in handles {
        rankings.push(ids(&handle.await.unwrap().unwrap()));
    }
    assert!(rankings.iter().all(|r| r == &rankings[0]));
    assert_eq!(rankings[0], [GO_PATH_ID, KAFKA_PATH_ID, SQL_PATH_ID]);
}
