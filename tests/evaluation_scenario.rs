mod support;

use serde_json::json;
use snapauto::{
    evaluation::{EvaluationController, JobState, PollSettings},
    report::{assemble, CategoryScore, LegalSeverity, ReportBlock},
    service::{EvaluationStatus, Job, StatusState},
    upload::UploadController,
};
use std::sync::Arc;
use support::{status, FakeService};

#[tokio::test(start_paused = true)]
async fn upload_evaluate_and_report() {
    let svc = Arc::new(
        FakeService::new()
            .with_upload(Ok(Job {
                id: "job-1".into(),
                frames: vec!["f1.png".into(), "f2.png".into()],
            }))
            .with_statuses(vec![
                Ok(status(StatusState::Processing, None)),
                Ok(EvaluationStatus {
                    files: vec!["f1.png".into()],
                    ..status(
                        StatusState::Completed,
                        Some(json!({
                            "overall_score": 82,
                            "legal_status": "aprovado",
                            "bodywork_score": 90
                        })),
                    )
                }),
            ]),
    );

    let video = std::env::temp_dir().join(format!("snapauto-scenario-{}.mp4", std::process::id()));
    std::fs::write(&video, b"video").unwrap();
    let mut uploader = UploadController::new(Arc::clone(&svc));
    let job = uploader.submit(Some(video.as_path()), 1).await.unwrap().clone();
    std::fs::remove_file(&video).ok();

    let controller = EvaluationController::new(Arc::clone(&svc), PollSettings::default());
    controller.evaluate(&job.id).await.unwrap();
    assert_eq!(svc.enqueues.lock().unwrap().clone(), vec![("job-1".to_string(), 12)]);

    let JobState::Completed(outcome) = controller.wait().await else {
        panic!("evaluation did not complete");
    };
    assert_eq!(outcome.result.overall_score, Some(82.0));

    let blocks = assemble(&outcome.result, &outcome.job_id, &outcome.files, "2026-10-16T12:00:00Z");
    assert_eq!(blocks.len(), 3);
    assert!(matches!(
        blocks[1],
        ReportBlock::LegalStatus {
            severity: LegalSeverity::Favorable,
            overall_score: Some(_),
            ..
        }
    ));
    assert_eq!(
        blocks[2],
        ReportBlock::CategoryScores {
            scores: vec![CategoryScore {
                label: "Carroceria".into(),
                score: 90.0,
            }]
        }
    );
}
