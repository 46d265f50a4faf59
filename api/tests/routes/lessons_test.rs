#[cfg(test)]
mod tests {
    use crate::helpers::{make_test_app, send, token_for};
    use axum::{Router, http::StatusCode};
    use db::models::user::UserRole;
    use serde_json::{Value, json};
    use serial_test::serial;

    struct TestData {
        teacher: String,
        student: String,
        course_id: String,
        text_lesson: String,
        quiz_lesson: String,
    }

    fn quiz_content() -> Value {
        let questions: Vec<Value> = (1..=4)
            .map(|n| {
                json!({
                    "id": format!("q{n}"),
                    "text": format!("Question {n}"),
                    "explanation": format!("Because of rule {n}"),
                    "answers": [
                        { "id": format!("q{n}-right"), "text": format!("Right {n}"), "is_correct": true },
                        { "id": format!("q{n}-wrong"), "text": format!("Wrong {n}"), "is_correct": false }
                    ]
                })
            })
            .collect();
        json!({ "instructions": "Pick one answer each", "questions": questions })
    }

    /// One module holding a text lesson followed by a four-question quiz, with
    /// the student enrolled.
    async fn setup_course(app: &Router) -> TestData {
        let teacher = token_for("teacher-1", UserRole::Instructor);
        let student = token_for("student-1", UserRole::Student);

        let (_, course) = send(
            app,
            "POST",
            "/api/courses",
            Some(&teacher),
            Some(json!({ "title": "Intro", "duration": 30, "level": "beginner" })),
        )
        .await;
        let course_id = course["data"]["id"].as_str().unwrap().to_owned();

        let (_, module) = send(
            app,
            "POST",
            &format!("/api/courses/{course_id}/modules"),
            Some(&teacher),
            Some(json!({ "title": "Basics" })),
        )
        .await;
        let module_id = module["data"]["id"].as_str().unwrap().to_owned();
        let lessons_uri = format!("/api/modules/{module_id}/lessons");

        let (status, text) = send(
            app,
            "POST",
            &lessons_uri,
            Some(&teacher),
            Some(json!({
                "title": "Welcome",
                "lesson_type": "TEXT",
                "content": "Read me first",
                "is_published": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, quiz) = send(
            app,
            "POST",
            &lessons_uri,
            Some(&teacher),
            Some(json!({
                "title": "Check yourself",
                "lesson_type": "QUIZ",
                "content": quiz_content(),
                "is_published": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(quiz["data"]["order"], 2);

        send(
            app,
            "POST",
            &format!("/api/courses/{course_id}/enroll"),
            Some(&student),
            None,
        )
        .await;

        TestData {
            teacher,
            student,
            course_id,
            text_lesson: text["data"]["id"].as_str().unwrap().to_owned(),
            quiz_lesson: quiz["data"]["id"].as_str().unwrap().to_owned(),
        }
    }

    fn selections(right: usize) -> Value {
        let answers: serde_json::Map<String, Value> = (1..=4)
            .map(|n| {
                let pick = if n <= right { "right" } else { "wrong" };
                (format!("q{n}"), json!(format!("q{n}-{pick}")))
            })
            .collect();
        json!({ "answers": answers, "time_spent": 90 })
    }

    #[tokio::test]
    #[serial]
    async fn learner_walks_through_a_course() {
        let (app, _) = make_test_app().await;
        let data = setup_course(&app).await;
        let quiz_uri = format!("/api/lessons/{}/quiz", data.quiz_lesson);

        // The quiz stays locked until the text lesson is done.
        let (status, _) = send(&app, "GET", &quiz_uri, Some(&data.student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/lessons/{}/progress", data.text_lesson),
            Some(&data.student),
            Some(json!({ "completed": true, "time_spent": 60 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["newly_completed"], true);
        assert_eq!(json["data"]["course_progress"], 50.0);

        let (status, quiz) = send(&app, "GET", &quiz_uri, Some(&data.student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quiz["data"]["questions"].as_array().unwrap().len(), 4);

        let submit_uri = format!("{quiz_uri}/submit");
        let (status, json) = send(
            &app,
            "POST",
            &submit_uri,
            Some(&data.student),
            Some(selections(3)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["grade"]["score"], 75);
        assert_eq!(json["data"]["grade"]["passed"], false);
        assert_eq!(json["data"]["progress"]["completed"], false);
        assert_eq!(json["data"]["course_progress"], 50.0);

        let (_, json) = send(
            &app,
            "POST",
            &submit_uri,
            Some(&data.student),
            Some(selections(4)),
        )
        .await;
        assert_eq!(json["data"]["grade"]["score"], 100);
        assert_eq!(json["data"]["grade"]["passed"], true);
        assert_eq!(json["data"]["newly_completed"], true);
        assert_eq!(json["data"]["course_progress"], 100.0);

        // A later failed attempt does not take completion away.
        let (_, json) = send(
            &app,
            "POST",
            &submit_uri,
            Some(&data.student),
            Some(selections(0)),
        )
        .await;
        assert_eq!(json["data"]["grade"]["score"], 0);
        assert_eq!(json["data"]["progress"]["completed"], true);
        assert_eq!(json["data"]["newly_completed"], false);

        let (status, json) = send(
            &app,
            "GET",
            &format!("/api/courses/{}/progress", data.course_id),
            Some(&data.student),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["progress"], 100.0);
        assert_eq!(json["data"]["completed_lessons"], 2);
    }

    #[tokio::test]
    #[serial]
    async fn learner_quiz_hides_answer_keys() {
        let (app, _) = make_test_app().await;
        let data = setup_course(&app).await;
        send(
            &app,
            "POST",
            &format!("/api/lessons/{}/progress", data.text_lesson),
            Some(&data.student),
            Some(json!({ "completed": true })),
        )
        .await;

        let (_, quiz) = send(
            &app,
            "GET",
            &format!("/api/lessons/{}/quiz", data.quiz_lesson),
            Some(&data.student),
            None,
        )
        .await;
        for question in quiz["data"]["questions"].as_array().unwrap() {
            assert!(question.get("explanation").is_none());
            for answer in question["answers"].as_array().unwrap() {
                assert!(answer.get("is_correct").is_none());
            }
        }

        let key_uri = format!("/api/lessons/{}/quiz/key", data.quiz_lesson);
        let (status, _) = send(&app, "GET", &key_uri, Some(&data.student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, key) = send(&app, "GET", &key_uri, Some(&data.teacher), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(key["data"]["questions"][0]["answers"][0]["is_correct"], true);
    }

    #[tokio::test]
    #[serial]
    async fn progress_requires_enrollment() {
        let (app, _) = make_test_app().await;
        let data = setup_course(&app).await;
        let outsider = token_for("student-2", UserRole::Student);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/lessons/{}/progress", data.text_lesson),
            Some(&outsider),
            Some(json!({ "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn quiz_lessons_reject_malformed_content() {
        let (app, _) = make_test_app().await;
        let data = setup_course(&app).await;

        let (_, detail) = send(
            &app,
            "GET",
            &format!("/api/courses/{}", data.course_id),
            Some(&data.teacher),
            None,
        )
        .await;
        let module_id = detail["data"]["modules"][0]["id"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/modules/{module_id}/lessons"),
            Some(&data.teacher),
            Some(json!({
                "title": "Broken",
                "lesson_type": "QUIZ",
                "content": { "questions": [
                    { "text": "Two right answers?", "answers": [
                        { "text": "A", "is_correct": true },
                        { "text": "B", "is_correct": true }
                    ] }
                ] }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn question_order_can_be_rewritten_by_staff() {
        let (app, _) = make_test_app().await;
        let data = setup_course(&app).await;
        let uri = format!("/api/lessons/{}/quiz/questions/order", data.quiz_lesson);

        let (status, before) = send(&app, "GET", &uri, Some(&data.teacher), None).await;
        assert_eq!(status, StatusCode::OK);
        let version = before["data"]["version"].as_i64().unwrap();

        let (status, json) = send(
            &app,
            "PATCH",
            &uri,
            Some(&data.teacher),
            Some(json!({ "ids": ["q4", "q3", "q2", "q1"], "expected_version": version })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["items"][0]["id"], "q4");
        assert_eq!(json["data"]["items"][0]["order"], 1);

        let (_, key) = send(
            &app,
            "GET",
            &format!("/api/lessons/{}/quiz/key", data.quiz_lesson),
            Some(&data.teacher),
            None,
        )
        .await;
        assert_eq!(key["data"]["questions"][0]["id"], "q4");
    }
}
