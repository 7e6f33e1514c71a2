// Test modules for CourseChat
// Flow-level tests live here, driven by the shared mock backend;
// small pure helpers keep their tests inline next to the code.

mod support;

mod auth_tests;
mod typing_tests;
