pub mod availability;
pub mod catalog;
pub mod clinic;
pub mod config;
pub mod directory;
pub mod environment;
pub mod errors;
pub mod geo;
pub mod normalization;
pub mod repository;
pub mod routes;
pub mod search;
