//! # Coffee shop ordering backend
//!
//! Customers browse the menu, place pickup or delivery orders, pay through a
//! mock gateway and follow their order live; staff manage the catalog and
//! move orders through their lifecycle.
//!
//! ## Layout
//!
//! - [`actor_framework`] - generic collection actor and its typed client
//! - [`user_actor`], [`menu_actor`], [`order_actor`] - entity rules per collection
//! - [`clients`] - domain clients; [`clients::OrderClient`] orchestrates the others
//! - [`notify`] - the notification hub actor and its event model
//! - [`auth`] - credentials, password hashing and the access gate
//! - [`http`] - axum routes under `/api`, including the `/api/ws` socket
//! - [`app_system`] - startup, wiring, shutdown and tracing setup
//!
//! Every piece of shared mutable state is owned by exactly one actor task and
//! reached only through its client.

pub mod actor_framework;
pub mod analytics;
pub mod app_system;
pub mod auth;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod images;
pub mod menu_actor;
pub mod notify;
pub mod order_actor;
pub mod payment;
pub mod user_actor;

#[cfg(test)]
mod mock_framework;
