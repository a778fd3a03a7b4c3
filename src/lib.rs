//! ogre-healthd: a label-driven container health-check daemon.
//!
//! Watches the Docker engine for container lifecycle events, parses
//! `ogre.health.*` labels into per-container check schedules, runs those
//! checks on their configured interval, and routes results to whichever
//! backend (statsd, Prometheus, HTTP, or a structured log line) the
//! check's labels select.

pub mod backend;
pub mod cli;
pub mod config;
pub mod control;
pub mod docker;
pub mod hub;
pub mod label;
pub mod logging;
pub mod message;
pub mod pid;
