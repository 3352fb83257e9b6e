//! Repair pipeline against in-memory collaborators.

use std::sync::Arc;

use drift_core::{parse_schema_text, Event};
use drift_repair::{
    BoundaryError, EventOutcome, InMemorySchemaStore, RecordingProposer, RepairConfig,
    RepairError, RepairPipeline,
};
use drift_schema::validate;
use serde_json::{json, Value};

struct Harness {
    pipeline: RepairPipeline,
    store: Arc<InMemorySchemaStore>,
    proposer: Arc<RecordingProposer>,
}

fn harness(schema: &Value) -> Harness {
    let store = Arc::new(InMemorySchemaStore::new(
        serde_json::to_string_pretty(schema).unwrap() + "\n",
    ));
    let proposer = Arc::new(RecordingProposer::new());
    let pipeline = RepairPipeline::new(store.clone(), proposer.clone(), RepairConfig::default());
    Harness {
        pipeline,
        store,
        proposer,
    }
}

fn push_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ref": {"type": "string"},
            "head_commit": {"type": "object"}
        }
    })
}

#[tokio::test]
async fn invalid_payload_is_committed_and_proposed() {
    let h = harness(&push_schema());
    let payload = json!({"ref": "refs/heads/master", "head_commit": null});

    let outcome = h.pipeline.handle(&Event::new("push", payload.clone())).await.unwrap();
    let EventOutcome::Proposed {
        change_id,
        head_ref,
        edits,
        ..
    } = outcome
    else {
        panic!("expected a proposal, got {outcome:?}");
    };
    assert_eq!(edits.len(), 1);
    assert!(head_ref.starts_with("schemas-update-"));
    assert_eq!(head_ref.len(), "schemas-update-".len() + 12);

    let commits = h.store.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].target_ref, head_ref);
    assert!(commits[0].text.ends_with("}\n"));
    let patched = parse_schema_text(&commits[0].text).unwrap();
    assert!(validate(&payload, &patched).unwrap().is_valid());

    let proposals = h.proposer.proposals();
    assert_eq!(proposals.len(), 1);
    let proposal = &proposals[0];
    assert_eq!(proposal.change_id, change_id);
    assert_eq!(proposal.base_ref, "master");
    assert_eq!(proposal.head_ref, head_ref);
    assert_eq!(proposal.title, "Update schemas");
    assert_eq!(proposal.labels, vec!["maintenance".to_string()]);
    assert!(proposal.body.contains("Payload `push` did not match the schema."));
    assert!(proposal.body.contains("#/properties/head_commit"));
}

#[tokio::test]
async fn same_patch_reuses_head_ref() {
    let h = harness(&push_schema());
    let payload = json!({"head_commit": null});
    let first = h.pipeline.handle(&Event::new("push", payload.clone())).await.unwrap();
    let second = h.pipeline.handle(&Event::new("push", payload)).await.unwrap();
    match (first, second) {
        (
            EventOutcome::Proposed {
                head_ref: a,
                change_id: first_id,
                ..
            },
            EventOutcome::Proposed {
                head_ref: b,
                change_id: second_id,
                ..
            },
        ) => {
            assert_eq!(a, b);
            assert_eq!(first_id, second_id);
        }
        other => panic!("expected two proposals, got {other:?}"),
    }
    assert_eq!(h.proposer.proposals().len(), 1);
    assert_eq!(h.store.commits().len(), 2);
}

#[tokio::test]
async fn forbidden_property_needs_manual_review() {
    let h = harness(&json!({
        "type": "object",
        "properties": {"zen": {"type": "string"}},
        "additionalProperties": false
    }));
    let outcome = h
        .pipeline
        .handle(&Event::new("ping", json!({"zen": "x", "hook": {}})))
        .await
        .unwrap();
    let EventOutcome::ManualReview { report } = outcome else {
        panic!("expected manual review");
    };
    assert_eq!(report.manual_review.len(), 1);
    assert!(h.store.commits().is_empty());
    assert!(h.proposer.proposals().is_empty());
}

#[tokio::test]
async fn null_already_recorded_as_string_is_no_change() {
    let h = harness(&json!({
        "type": "object",
        "properties": {"state": {"enum": ["open", "null"]}}
    }));
    let outcome = h
        .pipeline
        .handle(&Event::new("issues", json!({"state": null})))
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::NoChange { .. }), "{outcome:?}");
    assert!(h.store.commits().is_empty());
}

#[tokio::test]
async fn engine_error_attempts_no_repair() {
    let store = Arc::new(InMemorySchemaStore::new(r#"{"type": 12}"#));
    let proposer = Arc::new(RecordingProposer::new());
    let pipeline = RepairPipeline::new(store.clone(), proposer.clone(), RepairConfig::default());

    let err = pipeline
        .handle(&Event::new("push", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, RepairError::Engine(_)), "{err}");
    assert!(store.commits().is_empty());
    assert!(proposer.proposals().is_empty());
}

#[tokio::test]
async fn failed_commit_opens_no_change_request() {
    let h = harness(&push_schema());
    h.store.fail_next_commit(BoundaryError::Conflict {
        operation: "commit_schema_text".into(),
        reason: "ref moved".into(),
    });
    let err = h
        .pipeline
        .handle(&Event::new("push", json!({"head_commit": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, RepairError::Boundary(BoundaryError::Conflict { .. })));
    assert!(h.store.commits().is_empty());
    assert!(h.proposer.proposals().is_empty());
}

#[tokio::test]
async fn failed_fetch_is_boundary_error() {
    let h = harness(&push_schema());
    h.store.fail_next_fetch(BoundaryError::Unavailable {
        operation: "fetch_schema_text".into(),
        reason: "timeout".into(),
    });
    let err = h
        .pipeline
        .handle(&Event::new("push", json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.as_str(), "boundary_error");
}

#[tokio::test]
async fn failed_proposal_surfaces_after_commit() {
    let h = harness(&push_schema());
    h.proposer.fail_next_proposal(BoundaryError::Rejected {
        operation: "propose_change".into(),
        reason: "422".into(),
    });
    let err = h
        .pipeline
        .handle(&Event::new("push", json!({"ref": 5})))
        .await
        .unwrap_err();
    assert!(matches!(err, RepairError::Boundary(BoundaryError::Rejected { .. })));
    assert_eq!(h.store.commits().len(), 1);
}

#[tokio::test]
async fn concurrent_events_are_independent() {
    let h = harness(&push_schema());
    let pipeline = Arc::new(h.pipeline);
    let mut tasks = Vec::new();
    for i in 0..8 {
        let pipeline = pipeline.clone();
        tasks.push(tokio::spawn(async move {
            let payload = if i % 2 == 0 {
                json!({"ref": "main"})
            } else {
                json!({"ref": i})
            };
            pipeline.handle(&Event::new("push", payload)).await
        }));
    }
    let mut change_ids = Vec::new();
    for task in tasks {
        if let EventOutcome::Proposed { change_id, .. } = task.await.unwrap().unwrap() {
            change_ids.push(change_id);
        }
    }
    assert_eq!(change_ids.len(), 4);
    assert!(change_ids.iter().all(|id| id == &change_ids[0]));
    assert_eq!(h.proposer.proposals().len(), 1);
    let commits = h.store.commits();
    assert_eq!(commits.len(), 4);
    assert!(commits.iter().all(|c| c.target_ref == commits[0].target_ref));
}
