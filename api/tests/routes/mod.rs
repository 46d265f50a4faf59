mod courses_test;
mod health_test;
mod lessons_test;
mod reorder_test;
