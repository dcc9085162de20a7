pub mod index_tests;
pub mod local_tests;
