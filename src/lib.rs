extern crate diesel;

pub mod config;
pub mod db;
pub mod error;
pub mod llm_client;
pub mod logger;
pub mod models;
pub mod pricing;
pub mod properties;
pub mod services;
pub mod web;
