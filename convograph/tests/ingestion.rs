//! End-to-end tests for the ingestion driver against an in-memory store.

mod helpers;

use std::panic::AssertUnwindSafe;

use chrono::{TimeZone, Utc};
use futures::FutureExt;

use convograph::pipeline::RecordingProgress;
use convograph::{
    BackendBundle, Conversation, ConversationSummary, Episode, EpisodeBuilder, IngestError,
    IngestionDriver, Phase,
};

use helpers::{params, Call, Faults, MemoryConnector};

fn two_bucket_summary() -> ConversationSummary {
    let mut summary = ConversationSummary::new();
    summary.push(
        "2025_07",
        Conversation::new("Packing list")
            .with_message("user", "what should I pack?")
            .with_message("agent", "layers")
            .with_update_time("2025-07-30 18:00:00"),
    );
    summary.push(
        "2025_08",
        Conversation::new("My Trip Plan")
            .with_message("user", "hi")
            .with_message("agent", "hello")
            .with_update_time("2025-08-01 10:00:00"),
    );
    summary.push(
        "2025_08",
        Conversation::new("Budget").with_create_time("2025-08-02 12:00:00"),
    );
    summary
}

fn five_episodes() -> Vec<Episode> {
    let mut summary = ConversationSummary::new();
    for i in 1..=5 {
        summary.push(
            "2025_08",
            Conversation::new(format!("conversation {i}"))
                .with_message("user", format!("message {i}"))
                .with_update_time(format!("2025-08-0{i} 10:00:00")),
        );
    }
    EpisodeBuilder::new().build(&summary).unwrap().episodes
}

#[tokio::test]
async fn progress_follows_bucket_then_conversation_order() {
    let connector = MemoryConnector::new();
    let driver = IngestionDriver::new(connector.clone());
    let episodes = EpisodeBuilder::new()
        .build(&two_bucket_summary())
        .unwrap()
        .episodes;
    let mut progress = RecordingProgress::default();

    let report = driver
        .run(&params(), BackendBundle::Default, &episodes, &mut progress)
        .await
        .expect("run should succeed");

    assert_eq!(progress.total, Some(3));
    assert_eq!(progress.fractions(), ["1/3", "2/3", "3/3"]);
    let names: Vec<&str> = progress.steps.iter().map(|(_, _, n)| n.as_str()).collect();
    assert_eq!(names, ["Packing_list", "My_Trip_Plan", "Budget"]);
    assert!(progress.finished);

    assert_eq!(report.submitted, 3);
    assert_eq!(report.total, 3);
    assert_eq!(
        connector.calls(),
        vec![
            Call::Open,
            Call::BuildIndices,
            Call::AddEpisode("Packing_list".to_string()),
            Call::AddEpisode("My_Trip_Plan".to_string()),
            Call::AddEpisode("Budget".to_string()),
            Call::Close,
        ]
    );
}

#[tokio::test]
async fn stored_nodes_carry_episode_content() {
    let connector = MemoryConnector::new();
    let driver = IngestionDriver::new(connector.clone());
    let episodes = EpisodeBuilder::new()
        .build(&two_bucket_summary())
        .unwrap()
        .episodes;

    let report = driver
        .run(
            &params(),
            BackendBundle::Default,
            &episodes,
            &mut RecordingProgress::default(),
        )
        .await
        .unwrap();

    let trip = &report.nodes[1];
    assert_eq!(trip.name, "My_Trip_Plan");
    assert_eq!(trip.content, "user: hi\nagent: hello");
    assert_eq!(trip.group_id, "chat-export");
    assert_eq!(trip.source_description, "Conversation between user and agent");
    assert_eq!(
        trip.valid_at,
        Utc.with_ymd_and_hms(2025, 8, 1, 10, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn failure_on_third_of_five_still_closes_once() {
    let connector = MemoryConnector::with_faults(Faults {
        fail_on_episode: Some(3),
        ..Faults::default()
    });
    let driver = IngestionDriver::new(connector.clone());
    let episodes = five_episodes();
    let mut progress = RecordingProgress::default();

    let err = driver
        .run(&params(), BackendBundle::Default, &episodes, &mut progress)
        .await
        .expect_err("third submission fails");

    assert_eq!(err.phase(), Phase::Submission);
    assert_eq!(err.committed(), 2);
    match &err {
        IngestError::Submission {
            index, total, name, ..
        } => {
            assert_eq!(*index, 3);
            assert_eq!(*total, 5);
            assert_eq!(name, "conversation_3");
        }
        other => panic!("expected submission error, got {other:?}"),
    }

    assert_eq!(progress.fractions(), ["1/5", "2/5"]);
    assert!(progress.finished);
    assert_eq!(connector.close_count(), 1);
    assert_eq!(connector.stored_names(), ["conversation_1", "conversation_2"]);

    // Episodes 4 and 5 were never attempted.
    let attempted = connector
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::AddEpisode(_)))
        .count();
    assert_eq!(attempted, 3);
    assert_eq!(connector.calls().last(), Some(&Call::Close));
}

#[tokio::test]
async fn indexing_failure_aborts_before_submission_and_closes() {
    let connector = MemoryConnector::with_faults(Faults {
        fail_indexing: true,
        ..Faults::default()
    });
    let driver = IngestionDriver::new(connector.clone());
    let mut progress = RecordingProgress::default();

    let err = driver
        .run(&params(), BackendBundle::Default, &five_episodes(), &mut progress)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Indexing);
    assert_eq!(err.committed(), 0);
    assert_eq!(
        connector.calls(),
        vec![Call::Open, Call::BuildIndices, Call::Close]
    );
    assert!(progress.total.is_none());
}

#[tokio::test]
async fn connection_failure_attempts_nothing() {
    let connector = MemoryConnector::with_faults(Faults {
        fail_open: true,
        ..Faults::default()
    });
    let driver = IngestionDriver::new(connector.clone());

    let err = driver
        .run(
            &params(),
            BackendBundle::Default,
            &five_episodes(),
            &mut RecordingProgress::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Connection);
    let cause = std::error::Error::source(&err).expect("connection error keeps its cause");
    assert!(cause.to_string().contains("authentication failure"));
    assert_eq!(connector.calls(), vec![Call::Open]);
}

#[tokio::test]
async fn panic_during_submission_still_closes() {
    let connector = MemoryConnector::with_faults(Faults {
        panic_on_episode: Some(2),
        ..Faults::default()
    });
    let driver = IngestionDriver::new(connector.clone());
    let episodes = five_episodes();
    let mut progress = RecordingProgress::default();

    let outcome = AssertUnwindSafe(driver.run(
        &params(),
        BackendBundle::Default,
        &episodes,
        &mut progress,
    ))
    .catch_unwind()
    .await;

    assert!(outcome.is_err(), "panic should propagate to the caller");
    assert_eq!(connector.close_count(), 1);
    assert_eq!(connector.stored_names(), ["conversation_1"]);
}

#[tokio::test]
async fn close_failure_after_success_is_reported() {
    let connector = MemoryConnector::with_faults(Faults {
        fail_close: true,
        ..Faults::default()
    });
    let driver = IngestionDriver::new(connector.clone());

    let err = driver
        .run(
            &params(),
            BackendBundle::Default,
            &five_episodes(),
            &mut RecordingProgress::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Close);
    assert_eq!(connector.stored_names().len(), 5);
    assert_eq!(connector.close_count(), 1);
}

#[tokio::test]
async fn submission_error_wins_over_close_error() {
    let connector = MemoryConnector::with_faults(Faults {
        fail_on_episode: Some(1),
        fail_close: true,
        ..Faults::default()
    });
    let driver = IngestionDriver::new(connector.clone());

    let err = driver
        .run(
            &params(),
            BackendBundle::Default,
            &five_episodes(),
            &mut RecordingProgress::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Submission);
    assert_eq!(err.committed(), 0);
}

#[tokio::test]
async fn repeated_runs_leave_indices_unchanged() {
    let connector = MemoryConnector::new();
    let driver = IngestionDriver::new(connector.clone());

    for _ in 0..2 {
        driver
            .run(
                &params(),
                BackendBundle::Default,
                &[],
                &mut RecordingProgress::default(),
            )
            .await
            .expect("empty run should succeed");
    }

    let db = connector.db.lock().unwrap();
    assert_eq!(db.indices.len(), 3);
    let builds = db
        .calls
        .iter()
        .filter(|c| **c == Call::BuildIndices)
        .count();
    assert_eq!(builds, 2);
}

#[tokio::test]
async fn empty_episode_list_reports_zero() {
    let connector = MemoryConnector::new();
    let driver = IngestionDriver::new(connector.clone());
    let mut progress = RecordingProgress::default();

    let report = driver
        .run(&params(), BackendBundle::Default, &[], &mut progress)
        .await
        .unwrap();

    assert_eq!(report.submitted, 0);
    assert_eq!(progress.total, Some(0));
    assert!(progress.steps.is_empty());
    assert_eq!(connector.close_count(), 1);
}
