mod helpers;
mod orchestration_tests;
