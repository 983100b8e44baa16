// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tern-core: command tree model and shared conventions for the tern shell
//! engine.
//!
//! - [`ast`]: the tree handed over by the parser collaborator
//! - [`validate`]: structural checks before execution
//! - [`status`]: exit status encoding
//! - [`ShellConfig`]: interpreter configuration
//! - [`format_times`]: `TIMEFORMAT` rendering

pub mod ast;
pub mod config;
pub mod location;
pub mod status;
pub mod time_fmt;
pub mod validator;

pub use ast::Node;
pub use config::{ConfigError, ForkRetry, ShellConfig, ShellOptions, DEFAULT_MAX_DEPTH};
pub use location::Location;
pub use time_fmt::{cumulative_format, format_times, TimeFormatError, Times, DEFAULT_TIME_FORMAT};
pub use validator::{
    is_function_name, is_identifier, validate, validate_with_config, ValidationError,
    ValidatorConfig,
};
