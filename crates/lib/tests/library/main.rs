mod common;
mod mutate_tests;
mod plan_tests;
mod rule_tests;
