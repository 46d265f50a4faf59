#[cfg(test)]
mod tests {
    use crate::helpers::{make_test_app, send, token_for};
    use axum::{Router, http::StatusCode};
    use db::models::user::UserRole;
    use serde_json::{Value, json};
    use serial_test::serial;

    struct TestData {
        teacher: String,
        course_id: String,
        module_ids: Vec<String>,
    }

    async fn setup_course_with_modules(app: &Router, count: usize) -> TestData {
        let teacher = token_for("teacher-1", UserRole::Instructor);
        let (_, created) = send(
            app,
            "POST",
            "/api/courses",
            Some(&teacher),
            Some(json!({ "title": "Rust", "duration": 60, "level": "beginner" })),
        )
        .await;
        let course_id = created["data"]["id"].as_str().unwrap().to_owned();

        let mut module_ids = Vec::new();
        for i in 1..=count {
            let (status, json) = send(
                app,
                "POST",
                &format!("/api/courses/{course_id}/modules"),
                Some(&teacher),
                Some(json!({ "title": format!("Module {i}") })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(json["data"]["order"], i as i64);
            module_ids.push(json["data"]["id"].as_str().unwrap().to_owned());
        }

        TestData {
            teacher,
            course_id,
            module_ids,
        }
    }

    fn ids_of(snapshot: &Value) -> Vec<String> {
        snapshot["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_owned())
            .collect()
    }

    fn orders_of(snapshot: &Value) -> Vec<i64> {
        snapshot["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["order"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    #[serial]
    async fn reorder_rewrites_dense_positions_and_bumps_version() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 3).await;
        let uri = format!("/api/courses/{}/modules/order", data.course_id);

        let (_, before) = send(&app, "GET", &uri, Some(&data.teacher), None).await;
        let version = before["data"]["version"].as_i64().unwrap();

        let desired: Vec<String> = data.module_ids.iter().rev().cloned().collect();
        let (status, json) = send(
            &app,
            "PATCH",
            &uri,
            Some(&data.teacher),
            Some(json!({ "ids": desired, "expected_version": version })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids_of(&json["data"]), desired);
        assert_eq!(orders_of(&json["data"]), vec![1, 2, 3]);
        assert!(json["data"]["version"].as_i64().unwrap() > version);
    }

    #[tokio::test]
    #[serial]
    async fn stale_version_conflicts_with_current_order() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 3).await;
        let uri = format!("/api/courses/{}/modules/order", data.course_id);

        let (_, before) = send(&app, "GET", &uri, Some(&data.teacher), None).await;
        let version = before["data"]["version"].as_i64().unwrap();

        let first: Vec<String> = data.module_ids.iter().rev().cloned().collect();
        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(&data.teacher),
            Some(json!({ "ids": first, "expected_version": version })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // A second editor still holding the old version.
        let second = vec![
            data.module_ids[1].clone(),
            data.module_ids[0].clone(),
            data.module_ids[2].clone(),
        ];
        let (status, json) = send(
            &app,
            "PATCH",
            &uri,
            Some(&data.teacher),
            Some(json!({ "ids": second, "expected_version": version })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);
        assert_eq!(ids_of(&json["data"]), first);
        assert_eq!(orders_of(&json["data"]), vec![1, 2, 3]);
    }

    #[tokio::test]
    #[serial]
    async fn incomplete_id_lists_conflict_and_duplicates_are_rejected() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 3).await;
        let uri = format!("/api/courses/{}/modules/order", data.course_id);

        let (status, json) = send(
            &app,
            "PATCH",
            &uri,
            Some(&data.teacher),
            Some(json!({ "ids": [data.module_ids[0], data.module_ids[1]] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(ids_of(&json["data"]), data.module_ids);

        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(&data.teacher),
            Some(json!({ "ids": [data.module_ids[0], data.module_ids[0], data.module_ids[1]] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, after) = send(&app, "GET", &uri, Some(&data.teacher), None).await;
        assert_eq!(ids_of(&after["data"]), data.module_ids);
    }

    #[tokio::test]
    #[serial]
    async fn students_cannot_reorder() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 2).await;
        let student = token_for("student-1", UserRole::Student);
        let uri = format!("/api/courses/{}/modules/order", data.course_id);

        let desired: Vec<String> = data.module_ids.iter().rev().cloned().collect();
        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(&student),
            Some(json!({ "ids": desired })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn move_swaps_neighbours_and_stops_at_the_edges() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 3).await;
        let base = format!("/api/courses/{}/modules", data.course_id);

        let (status, json) = send(
            &app,
            "POST",
            &format!("{base}/{}/move", data.module_ids[2]),
            Some(&data.teacher),
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ids_of(&json["data"]),
            vec![
                data.module_ids[0].clone(),
                data.module_ids[2].clone(),
                data.module_ids[1].clone()
            ]
        );

        let (status, edge) = send(
            &app,
            "POST",
            &format!("{base}/{}/move", data.module_ids[0]),
            Some(&data.teacher),
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids_of(&edge["data"]), ids_of(&json["data"]));
        assert_eq!(edge["data"]["version"], json["data"]["version"]);
    }

    #[tokio::test]
    #[serial]
    async fn deleting_a_module_keeps_positions_dense() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 3).await;

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/modules/{}", data.module_ids[0]),
            Some(&data.teacher),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, after) = send(
            &app,
            "GET",
            &format!("/api/courses/{}/modules/order", data.course_id),
            Some(&data.teacher),
            None,
        )
        .await;
        assert_eq!(ids_of(&after["data"]), data.module_ids[1..].to_vec());
        assert_eq!(orders_of(&after["data"]), vec![1, 2]);
    }

    #[tokio::test]
    #[serial]
    async fn order_reads_need_enrollment_and_hide_drafts_from_learners() {
        let (app, _) = make_test_app().await;
        let data = setup_course_with_modules(&app, 1).await;
        let student = token_for("student-1", UserRole::Student);
        let lessons_uri = format!("/api/modules/{}/lessons", data.module_ids[0]);

        let mut lesson_ids = Vec::new();
        for (title, published) in [("Draft", false), ("Live", true)] {
            let (status, json) = send(
                &app,
                "POST",
                &lessons_uri,
                Some(&data.teacher),
                Some(json!({
                    "title": title,
                    "lesson_type": "TEXT",
                    "content": format!("Body of {title}"),
                    "is_published": published
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            lesson_ids.push(json["data"]["id"].as_str().unwrap().to_owned());
        }

        let module_order = format!("/api/courses/{}/modules/order", data.course_id);
        let lesson_order = format!("{lessons_uri}/order");

        let (status, _) = send(&app, "GET", &module_order, Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "GET", &lesson_order, Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        send(
            &app,
            "POST",
            &format!("/api/courses/{}/enroll", data.course_id),
            Some(&student),
            None,
        )
        .await;

        let (status, json) = send(&app, "GET", &lesson_order, Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids_of(&json["data"]), vec![lesson_ids[1].clone()]);
        assert_eq!(orders_of(&json["data"]), vec![1]);

        let (_, json) = send(&app, "GET", &lesson_order, Some(&data.teacher), None).await;
        assert_eq!(ids_of(&json["data"]), lesson_ids);
        assert_eq!(orders_of(&json["data"]), vec![1, 2]);
    }
}
