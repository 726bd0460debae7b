// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log level configuration.
//!
//! Parsed case-insensitively from `logging.log_level`. An invalid value never stops the collector:
//! configuration loading keeps the default (`info`) and records a warning that the binary logs
//! once the subscriber is installed.

use std::str::FromStr;

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("invalid log level: '{s}'")),
        }
    }
}

impl LogLevel {
    /// Reads a level from a configuration value. Only strings are accepted.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => LogLevel::from_str(s),
            other => Err(format!("expected a string for log level, got: {other}")),
        }
    }
}
