//! CLI subcommand modules.
//!
//! This module contains the implementations for all icscore CLI subcommands.

pub(crate) mod backtest;
pub(crate) mod periods;
pub(crate) mod signals;
