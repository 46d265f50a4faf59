pub mod m202510180001_create_users;
pub mod m202510180002_create_courses;
pub mod m202510180003_create_modules;
pub mod m202510180004_create_lessons;
pub mod m202510180005_create_enrollments;
pub mod m202510180006_create_lesson_progress;
