pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod lesson_progress;
pub mod module;
pub mod user;

pub use course::Entity as Course;
pub use enrollment::Entity as Enrollment;
pub use lesson::Entity as Lesson;
pub use lesson_progress::Entity as LessonProgress;
pub use module::Entity as Module;
pub use user::Entity as User;
