//! Export flow against a mocked grading service

use gradeexport::adapters::drivers::{DriverRegistry, HttpDriverFactory};
use gradeexport::adapters::host::{HostSnapshot, InMemoryHost};
use gradeexport::config::{secret_string_opt, HttpDriverConfig};
use gradeexport::core::export::{ExportCoordinator, ExportRequest, ExportResponse};
use gradeexport::core::report::{render, CellContent, ExportPage, OutputFormat};
use gradeexport::domain::strings::codes;
use gradeexport::domain::{
    CourseId, ExternalSystemError, GradeExportError, UserId, UserIdentField,
};
use mockito::Matcher;
use std::sync::Arc;

const SNAPSHOT: &str = r#"{
    "courses": [
        {"id": 2, "shortname": "MAT101", "fullname": "Calculus I", "idnumber": "MAT101-2025"},
        {"id": 3, "shortname": "CLUB", "fullname": "Chess club"}
    ],
    "users": [
        {"id": 10, "username": "u1", "idnumber": "2025001", "firstname": "Ana", "lastname": "Silva"},
        {"id": 11, "username": "u2", "idnumber": "2025002", "firstname": "Bruno", "lastname": "Costa"}
    ],
    "enrolments": [
        {"course": 2, "user": 10},
        {"course": 2, "user": 11},
        {"course": 3, "user": 10}
    ],
    "grade_items": [
        {"id": 100, "course_id": 2, "grade_max": 10.0, "grade_pass": 5.0},
        {"id": 101, "course_id": 3, "grade_max": 10.0}
    ],
    "grades": [
        {"item_id": 100, "user_id": 10, "final_grade": 8.0},
        {"item_id": 100, "user_id": 11, "final_grade": 4.5}
    ],
    "grants": [
        {"user": 7, "capabilities": [
            "gradeexport:view", "grade:export", "gradeexport:publish", "site:accessallgroups"
        ]}
    ]
}"#;

const REMOTE: &str = r#"{"students": [
    {"registration": "2025001", "name": "Ana Silva", "grade": 7.0, "insufficient_attendance": false},
    {"registration": "2025002", "name": "Bruno Costa", "grade": 4.5, "insufficient_attendance": true}
]}"#;

fn coordinator(base_url: &str) -> ExportCoordinator {
    let config = HttpDriverConfig {
        base_url: base_url.to_string(),
        auth_type: "bearer".to_string(),
        token: secret_string_opt(Some("test-token".to_string())),
        username: None,
        password: None,
        timeout_seconds: 5,
        course_code_pattern: "^[A-Z]{3}[0-9]{3}".to_string(),
        user_ident_field: UserIdentField::IdNumber,
        grade_min: 0.0,
        grade_max: 10.0,
    };

    let mut registry = DriverRegistry::new();
    registry.register(Arc::new(HttpDriverFactory::new(Some(config))));

    ExportCoordinator::new(
        Arc::new(registry),
        Arc::new(InMemoryHost::new(HostSnapshot::from_json(SNAPSHOT).unwrap())),
        vec!["http".to_string()],
    )
}

fn grader() -> UserId {
    UserId::new(7).unwrap()
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn page(coordinator: &ExportCoordinator, request: ExportRequest) -> ExportPage {
    match coordinator.handle(grader(), request).await.unwrap() {
        ExportResponse::Page(page) => page,
        ExportResponse::Action(_) => panic!("unexpected action output"),
    }
}

#[tokio::test]
async fn test_report_shows_editable_field() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/courses/MAT101-2025/grades")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REMOTE)
        .create_async()
        .await;

    let coordinator = coordinator(&server.url());
    let page = page(&coordinator, ExportRequest::new(CourseId::new(2).unwrap())).await;
    mock.assert_async().await;

    let report = page.report.as_ref().unwrap();
    assert!(report.driver.starts_with("Grading service at"));
    assert!(report.can_send);

    let [top, sub] = &report.header;
    let titles: Vec<_> = top.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(
        titles,
        vec!["", "Registration", "Name", "Final grade", "Insufficient attendance", "Remarks", "Send"]
    );
    assert_eq!(top[3].colspan, 2);
    assert_eq!(top[4].colspan, 2);
    let subtitles: Vec<_> = sub.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(subtitles, vec!["External", "Local", "External", "Local"]);

    // identifier, name, grade (2), attendance (2)
    let ana = report.row_for(UserId::new(10).unwrap()).unwrap();
    assert_eq!(ana.cells.len(), 6);
    assert_eq!(ana.messages[0].code, codes::GRADES_DIFFER);
    assert!(ana.send.as_ref().unwrap().checked);
    assert_eq!(
        ana.cells[5].content,
        CellContent::Checkbox {
            name: "insufficient_attendance[10]".to_string(),
            checked: false,
            disabled: false,
        }
    );

    let bruno = report.row_for(UserId::new(11).unwrap()).unwrap();
    assert!(bruno.messages.is_empty());
    assert!(!bruno.send.as_ref().unwrap().checked);
    assert!(matches!(
        bruno.cells[4].content,
        CellContent::Checkbox { checked: true, disabled: true, .. }
    ));

    let html = render(&page, OutputFormat::Html, "/courses/2/export").unwrap();
    assert!(html.contains("name=\"insufficient_attendance[11]\" value=\"1\" checked>"));
    assert!(html.contains("gradefail"));
}

#[tokio::test]
async fn test_form_submission_posts_fields() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/courses/MAT101-2025/grades")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REMOTE)
        .expect_at_least(1)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/courses/MAT101-2025/grades/2025001")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "grade": 8.0,
            "fields": {"insufficient_attendance": true}
        })))
        .with_status(201)
        .create_async()
        .await;

    let coordinator = coordinator(&server.url());
    let request = ExportRequest::from_params(
        CourseId::new(2).unwrap(),
        &params(&[
            ("groupid", "0"),
            ("send[10]", "2025001"),
            ("insufficient_attendance[10]", "1"),
            ("sendgrades", "Send selected grades"),
        ]),
    )
    .unwrap();

    let page = page(&coordinator, request).await;
    post.assert_async().await;

    assert!(page.has_notification(codes::SENTGRADES_SUCCESS));
    let ana = page
        .report
        .as_ref()
        .unwrap()
        .row_for(UserId::new(10).unwrap())
        .unwrap();
    assert_eq!(ana.messages[0].code, codes::GRADE_SENT);
}

#[tokio::test]
async fn test_rejected_grade_is_row_error() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/courses/MAT101-2025/grades")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REMOTE)
        .create_async()
        .await;
    let _post = server
        .mock("POST", "/courses/MAT101-2025/grades/2025002")
        .with_status(422)
        .with_body("grade below minimum")
        .create_async()
        .await;

    let coordinator = coordinator(&server.url());
    let request = ExportRequest::from_params(
        CourseId::new(2).unwrap(),
        &params(&[("send[11]", "2025002"), ("sendgrades", "1")]),
    )
    .unwrap();

    let page = page(&coordinator, request).await;
    assert!(page.has_notification(codes::SENTGRADES_ERROR));

    let bruno = page
        .report
        .as_ref()
        .unwrap()
        .row_for(UserId::new(11).unwrap())
        .unwrap();
    assert_eq!(bruno.messages[0].code, codes::SEND_FAILED);
    assert!(bruno.messages[0].text.contains("grade below minimum"));
}

#[tokio::test]
async fn test_course_without_code_has_no_driver() {
    let server = mockito::Server::new_async().await;
    let coordinator = coordinator(&server.url());

    let page = page(&coordinator, ExportRequest::new(CourseId::new(3).unwrap())).await;
    assert!(page.has_notification(codes::CANNOT_EXPORT));
    assert!(page.report.is_none());
}

#[tokio::test]
async fn test_service_unavailable_fails_request() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/courses/MAT101-2025/grades")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let coordinator = coordinator(&server.url());
    let err = coordinator
        .handle(grader(), ExportRequest::new(CourseId::new(2).unwrap()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GradeExportError::ExternalSystem(ExternalSystemError::ServerError { status: 503, .. })
    ));
}
