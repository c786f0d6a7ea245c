mod registry_tests;
mod transition_tests;
