mod integration_tests;
mod links_tests;
