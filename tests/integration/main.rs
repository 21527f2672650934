#[path = "../common/mod.rs"]
mod common;

mod main_flow_tests;
mod pipeline_tests;
