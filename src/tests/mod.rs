mod merge_tests;
mod utils;
