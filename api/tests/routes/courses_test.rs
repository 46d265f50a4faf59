#[cfg(test)]
mod tests {
    use crate::helpers::{make_test_app, send, token_for};
    use axum::http::StatusCode;
    use db::models::user::UserRole;
    use serde_json::{Value, json};
    use serial_test::serial;

    fn course_body(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Ownership and borrowing",
            "duration": 120,
            "level": "beginner",
            "tags": ["rust", "systems"]
        })
    }

    #[tokio::test]
    #[serial]
    async fn requests_without_a_token_are_unauthorized() {
        let (app, _) = make_test_app().await;

        let (status, json) = send(&app, "GET", "/api/courses", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn garbage_tokens_are_unauthorized() {
        let (app, _) = make_test_app().await;

        let (status, _) = send(&app, "GET", "/api/courses", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn students_cannot_create_courses() {
        let (app, _) = make_test_app().await;
        let student = token_for("student-1", UserRole::Student);

        let (status, json) = send(
            &app,
            "POST",
            "/api/courses",
            Some(&student),
            Some(course_body("Rust")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Instructor access required");
    }

    #[tokio::test]
    #[serial]
    async fn instructors_create_and_list_courses() {
        let (app, _) = make_test_app().await;
        let teacher = token_for("teacher-1", UserRole::Instructor);

        let (status, json) = send(
            &app,
            "POST",
            "/api/courses",
            Some(&teacher),
            Some(course_body("Rust")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["title"], "Rust");
        assert_eq!(json["data"]["teacher_id"], "teacher-1");
        assert_eq!(json["data"]["tags"], json!(["rust", "systems"]));

        let (status, json) = send(&app, "GET", "/api/courses", Some(&teacher), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn invalid_course_fields_are_bad_request() {
        let (app, _) = make_test_app().await;
        let teacher = token_for("teacher-1", UserRole::Instructor);

        let mut body = course_body("");
        body["duration"] = json!(-5);
        let (status, json) = send(&app, "POST", "/api/courses", Some(&teacher), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn only_the_owner_edits_a_course() {
        let (app, _) = make_test_app().await;
        let owner = token_for("teacher-1", UserRole::Instructor);
        let other = token_for("teacher-2", UserRole::Instructor);
        let admin = token_for("admin-1", UserRole::Admin);

        let (_, created) =
            send(&app, "POST", "/api/courses", Some(&owner), Some(course_body("Rust"))).await;
        let uri = format!("/api/courses/{}", created["data"]["id"].as_str().unwrap());

        let (status, _) = send(&app, "PUT", &uri, Some(&other), Some(course_body("Mine"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) =
            send(&app, "PUT", &uri, Some(&admin), Some(course_body("Rust 2"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["title"], "Rust 2");
        assert_eq!(json["data"]["teacher_id"], "teacher-1");
    }

    #[tokio::test]
    #[serial]
    async fn enrolling_twice_is_idempotent() {
        let (app, _) = make_test_app().await;
        let teacher = token_for("teacher-1", UserRole::Instructor);
        let student = token_for("student-1", UserRole::Student);

        let (_, created) =
            send(&app, "POST", "/api/courses", Some(&teacher), Some(course_body("Rust"))).await;
        let uri = format!(
            "/api/courses/{}/enroll",
            created["data"]["id"].as_str().unwrap()
        );

        let (status, first) = send(&app, "POST", &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["data"]["status"], "created");
        assert_eq!(first["data"]["progress"], 0.0);

        let (status, second) = send(&app, "POST", &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["data"]["status"], "already_enrolled");
        assert_eq!(second["data"]["id"], first["data"]["id"]);

        let (status, json) = send(&app, "GET", "/api/me/enrollments", Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn enrolling_in_a_missing_course_is_not_found() {
        let (app, _) = make_test_app().await;
        let student = token_for("student-1", UserRole::Student);

        let (status, _) =
            send(&app, "POST", "/api/courses/missing/enroll", Some(&student), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn course_detail_requires_enrollment_for_learners() {
        let (app, _) = make_test_app().await;
        let teacher = token_for("teacher-1", UserRole::Instructor);
        let student = token_for("student-1", UserRole::Student);

        let (_, created) =
            send(&app, "POST", "/api/courses", Some(&teacher), Some(course_body("Rust"))).await;
        let course_id = created["data"]["id"].as_str().unwrap().to_owned();
        let uri = format!("/api/courses/{course_id}");

        let (status, _) = send(&app, "GET", &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        send(&app, "POST", &format!("{uri}/enroll"), Some(&student), None).await;
        let (status, json) = send(&app, "GET", &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_enrolled"], true);
        assert_eq!(json["data"]["is_staff"], false);
    }
}
