//! Builders shared by the DB-backed tests.

use db::models::course::CourseLevel;
use db::models::lesson::LessonType;
use db::models::user::{self, UserRole};
use db::models::{course, lesson, module};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::access::Viewer;
use crate::content::{ContentService, CourseInput, LessonInput, ModuleInput};

pub async fn user(db: &DatabaseConnection, id: &str, role: UserRole) -> Viewer {
    user::Model::create(db, id, id, Some(&format!("{id}@example.com")), role)
        .await
        .expect("create user");
    Viewer::new(id, role)
}

pub fn course_input(title: &str) -> CourseInput {
    CourseInput {
        title: title.into(),
        description: String::new(),
        duration: 90,
        level: CourseLevel::Beginner,
        tags: vec![],
    }
}

pub async fn course(db: &DatabaseConnection, owner: &Viewer, title: &str) -> course::Model {
    ContentService::create_course(db, owner, course_input(title))
        .await
        .expect("create course")
}

pub async fn module(db: &DatabaseConnection, owner: &Viewer, course_id: &str, title: &str) -> module::Model {
    ContentService::create_module(
        db,
        owner,
        course_id,
        ModuleInput {
            title: title.into(),
            description: String::new(),
        },
    )
    .await
    .expect("create module")
}

pub fn lesson_input(title: &str, published: bool) -> LessonInput {
    LessonInput {
        title: title.into(),
        description: String::new(),
        lesson_type: LessonType::Text,
        duration: Some(10),
        content: Value::String(format!("Body of {title}")),
        is_published: published,
    }
}

pub async fn text_lesson(
    db: &DatabaseConnection,
    owner: &Viewer,
    module_id: &str,
    title: &str,
    published: bool,
) -> lesson::Model {
    ContentService::create_lesson(db, owner, module_id, lesson_input(title, published))
        .await
        .expect("create lesson")
}

/// A published quiz with `questions` two-answer questions; the first answer is correct.
pub async fn quiz_lesson(
    db: &DatabaseConnection,
    owner: &Viewer,
    module_id: &str,
    title: &str,
    questions: usize,
) -> lesson::Model {
    let questions: Vec<Value> = (1..=questions)
        .map(|i| {
            json!({
                "text": format!("Question {i}"),
                "explanation": format!("Because {i}"),
                "answers": [
                    { "text": format!("right {i}"), "is_correct": true },
                    { "text": format!("wrong {i}") }
                ]
            })
        })
        .collect();

    let mut input = lesson_input(title, true);
    input.lesson_type = LessonType::Quiz;
    input.content = json!({ "instructions": "Answer everything", "questions": questions });

    ContentService::create_lesson(db, owner, module_id, input)
        .await
        .expect("create quiz lesson")
}
