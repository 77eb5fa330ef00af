pub mod classifier;
pub mod fetcher;
pub mod frontier;
pub mod web;
pub mod webdriver;
