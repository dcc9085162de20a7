pub mod name_tests;
