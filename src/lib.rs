// src/lib.rs

pub mod config;
pub mod controllers;
pub mod models;
pub mod services;
pub mod views;
