#![allow(dead_code)]

pub mod corpus;
pub mod env;
pub mod simulation;
