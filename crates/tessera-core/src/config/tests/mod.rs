#![cfg(test)]

pub mod data_tests;
