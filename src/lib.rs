//! Continuous deployment: retag OpenShift image streams when new images land.

pub mod bus;
pub mod config;
pub mod error;
pub mod handler;
pub mod notify;
pub mod openshift;
pub mod service;
