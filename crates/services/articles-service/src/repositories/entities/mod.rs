//! SeaORM entities for the relational store.

pub mod article;
pub mod topic;
pub mod user;
