/*!
# Logging Frameworks

Framework tags, severity tiers and the static signature registry used to
recognize logging call sites.
*/

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ast::types::{PRINT_STREAM, THROWABLE};
use crate::error::LogliftError;
use crate::message::TemplateStyle;

/// Severity tiers, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = LogliftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(LogliftError::UnknownSeverity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFramework {
    Slf4j,
    Log4j1,
    Log4j2,
    Jul,
    Commons,
}

impl LoggingFramework {
    pub const ALL: [LoggingFramework; 5] = [
        LoggingFramework::Slf4j,
        LoggingFramework::Log4j1,
        LoggingFramework::Log4j2,
        LoggingFramework::Jul,
        LoggingFramework::Commons,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LoggingFramework::Slf4j => "slf4j",
            LoggingFramework::Log4j1 => "log4j1",
            LoggingFramework::Log4j2 => "log4j2",
            LoggingFramework::Jul => "jul",
            LoggingFramework::Commons => "commons",
        }
    }

    pub fn logger_type(&self) -> &'static str {
        match self {
            LoggingFramework::Slf4j => "org.slf4j.Logger",
            LoggingFramework::Log4j1 => "org.apache.log4j.Logger",
            LoggingFramework::Log4j2 => "org.apache.logging.log4j.Logger",
            LoggingFramework::Jul => "java.util.logging.Logger",
            LoggingFramework::Commons => "org.apache.commons.logging.Log",
        }
    }

    /// Type declaring the idiomatic logger accessor.
    pub fn factory_type(&self) -> &'static str {
        match self {
            LoggingFramework::Slf4j => "org.slf4j.LoggerFactory",
            LoggingFramework::Log4j1 => "org.apache.log4j.LogManager",
            LoggingFramework::Log4j2 => "org.apache.logging.log4j.LogManager",
            LoggingFramework::Jul => "java.util.logging.Logger",
            LoggingFramework::Commons => "org.apache.commons.logging.LogFactory",
        }
    }

    pub fn factory_method(&self) -> &'static str {
        match self {
            LoggingFramework::Commons => "getLog",
            _ => "getLogger",
        }
    }

    /// JUL loggers are keyed by name, everything else accepts a class.
    pub fn keyed_by_name(&self) -> bool {
        matches!(self, LoggingFramework::Jul)
    }

    pub fn level_type(&self) -> Option<&'static str> {
        match self {
            LoggingFramework::Jul => Some("java.util.logging.Level"),
            LoggingFramework::Log4j1 => Some("org.apache.log4j.Level"),
            LoggingFramework::Log4j2 => Some("org.apache.logging.log4j.Level"),
            _ => None,
        }
    }

    pub fn marker_type(&self) -> Option<&'static str> {
        match self {
            LoggingFramework::Slf4j => Some("org.slf4j.Marker"),
            LoggingFramework::Log4j2 => Some("org.apache.logging.log4j.Marker"),
            _ => None,
        }
    }

    pub fn lombok_annotation(&self) -> &'static str {
        match self {
            LoggingFramework::Slf4j => "lombok.extern.slf4j.Slf4j",
            LoggingFramework::Log4j1 => "lombok.extern.log4j.Log4j",
            LoggingFramework::Log4j2 => "lombok.extern.log4j.Log4j2",
            LoggingFramework::Jul => "lombok.extern.java.Log",
            LoggingFramework::Commons => "lombok.extern.apachecommons.CommonsLog",
        }
    }

    pub fn template_style(&self) -> TemplateStyle {
        match self {
            LoggingFramework::Slf4j | LoggingFramework::Log4j2 => TemplateStyle::Anonymous,
            LoggingFramework::Jul => TemplateStyle::Indexed,
            LoggingFramework::Log4j1 | LoggingFramework::Commons => TemplateStyle::Concatenation,
        }
    }

    pub fn supports(&self, severity: Severity) -> bool {
        match self {
            LoggingFramework::Slf4j | LoggingFramework::Jul => severity != Severity::Fatal,
            LoggingFramework::Log4j1 | LoggingFramework::Log4j2 | LoggingFramework::Commons => true,
        }
    }

    /// Leveled method name for a severity this framework supports.
    pub fn method_for(&self, severity: Severity) -> &'static str {
        match self {
            LoggingFramework::Jul => match severity {
                Severity::Trace => "finer",
                Severity::Debug => "fine",
                Severity::Info => "info",
                Severity::Warn => "warning",
                Severity::Error | Severity::Fatal => "severe",
            },
            _ => severity.name(),
        }
    }

    /// Name of the level constant, for frameworks with a level type.
    pub fn level_constant(&self, severity: Severity) -> Option<&'static str> {
        match self {
            LoggingFramework::Jul => Some(match severity {
                Severity::Trace => "FINER",
                Severity::Debug => "FINE",
                Severity::Info => "INFO",
                Severity::Warn => "WARNING",
                Severity::Error | Severity::Fatal => "SEVERE",
            }),
            LoggingFramework::Log4j1 | LoggingFramework::Log4j2 => Some(match severity {
                Severity::Trace => "TRACE",
                Severity::Debug => "DEBUG",
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
                Severity::Error => "ERROR",
                Severity::Fatal => "FATAL",
            }),
            _ => None,
        }
    }

    /// Severity named by a level constant such as `Level.FINE`.
    pub fn severity_of_level(&self, constant: &str) -> Option<Severity> {
        match self {
            LoggingFramework::Jul => match constant {
                "ALL" | "FINEST" | "FINER" => Some(Severity::Trace),
                "FINE" => Some(Severity::Debug),
                "CONFIG" | "INFO" => Some(Severity::Info),
                "WARNING" => Some(Severity::Warn),
                "SEVERE" => Some(Severity::Error),
                _ => None,
            },
            LoggingFramework::Log4j1 | LoggingFramework::Log4j2 => match constant {
                "ALL" | "TRACE" => Some(Severity::Trace),
                "DEBUG" => Some(Severity::Debug),
                "INFO" => Some(Severity::Info),
                "WARN" => Some(Severity::Warn),
                "ERROR" => Some(Severity::Error),
                "FATAL" => Some(Severity::Fatal),
                _ => None,
            },
            _ => None,
        }
    }

    /// `isXEnabled()` check for a tier, where the framework has one.
    pub fn enabled_method(&self, severity: Severity) -> Option<&'static str> {
        let available = match self {
            LoggingFramework::Jul => false,
            LoggingFramework::Log4j1 => severity <= Severity::Info,
            _ => self.supports(severity),
        };
        available.then_some(match severity {
            Severity::Trace => "isTraceEnabled",
            Severity::Debug => "isDebugEnabled",
            Severity::Info => "isInfoEnabled",
            Severity::Warn => "isWarnEnabled",
            Severity::Error => "isErrorEnabled",
            Severity::Fatal => "isFatalEnabled",
        })
    }

    /// Enablement check taking a `Level` argument.
    pub fn level_check_method(&self) -> Option<&'static str> {
        match self {
            LoggingFramework::Jul => Some("isLoggable"),
            LoggingFramework::Log4j1 => Some("isEnabledFor"),
            LoggingFramework::Log4j2 => Some("isEnabled"),
            _ => None,
        }
    }

    pub fn from_logger_type(fqn: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|framework| framework.logger_type() == fqn)
    }
}

impl fmt::Display for LoggingFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoggingFramework {
    type Err = LogliftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slf4j" => Ok(LoggingFramework::Slf4j),
            "log4j" | "log4j1" => Ok(LoggingFramework::Log4j1),
            "log4j2" => Ok(LoggingFramework::Log4j2),
            "jul" | "java.util.logging" => Ok(LoggingFramework::Jul),
            "commons" | "commons-logging" | "jcl" => Ok(LoggingFramework::Commons),
            _ => Err(LogliftError::UnknownFramework(s.to_string())),
        }
    }
}

/// Maps a severity onto the tiers a target framework offers.
///
/// Overrides are applied first; a tier the target lacks falls to the
/// nearest higher tier it has, then the nearest lower one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    #[serde(default)]
    pub overrides: BTreeMap<Severity, Severity>,
}

impl SeverityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, from: Severity, to: Severity) -> Self {
        self.overrides.insert(from, to);
        self
    }

    pub fn resolve(&self, severity: Severity, target: LoggingFramework) -> Severity {
        let wanted = self.overrides.get(&severity).copied().unwrap_or(severity);
        if target.supports(wanted) {
            return wanted;
        }
        Severity::ALL
            .into_iter()
            .filter(|tier| *tier > wanted)
            .find(|tier| target.supports(*tier))
            .or_else(|| {
                Severity::ALL
                    .into_iter()
                    .rev()
                    .filter(|tier| *tier < wanted)
                    .find(|tier| target.supports(*tier))
            })
            .unwrap_or(wanted)
    }
}

/// Shape of a recognized call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// `logger.info(..)` style, severity fixed by the method name.
    Leveled(Severity),
    /// `logger.log(Level.X, ..)`, severity carried by the first argument.
    LevelArgument,
    /// `Throwable#printStackTrace()`
    StackTrace,
    /// `PrintStream#print` / `println`
    Console,
    /// Logger accessor such as `LoggerFactory.getLogger(..)`.
    Factory,
    /// `logger.isDebugEnabled()`
    EnabledCheck(Severity),
    /// `logger.isLoggable(Level.FINE)`, severity carried by the argument.
    LevelCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub framework: Option<LoggingFramework>,
    pub kind: SignatureKind,
}

type SignatureTable = HashMap<(&'static str, &'static str), Signature>;

static SIGNATURES: Lazy<SignatureTable> = Lazy::new(|| {
    let mut table = SignatureTable::new();

    let leveled: [(LoggingFramework, &[&'static str]); 5] = [
        (LoggingFramework::Slf4j, &["org.slf4j.Logger"]),
        (LoggingFramework::Log4j1, &["org.apache.log4j.Logger", "org.apache.log4j.Category"]),
        (LoggingFramework::Log4j2, &["org.apache.logging.log4j.Logger"]),
        (LoggingFramework::Commons, &["org.apache.commons.logging.Log"]),
        (LoggingFramework::Jul, &["java.util.logging.Logger"]),
    ];
    for (framework, declaring_types) in leveled {
        for &declaring_type in declaring_types {
            for severity in Severity::ALL.into_iter().filter(|s| framework.supports(*s)) {
                let kind = SignatureKind::Leveled(severity);
                table.insert(
                    (declaring_type, framework.method_for(severity)),
                    Signature { framework: Some(framework), kind },
                );
            }
            for severity in Severity::ALL {
                if let Some(method) = framework.enabled_method(severity) {
                    table.insert(
                        (declaring_type, method),
                        Signature {
                            framework: Some(framework),
                            kind: SignatureKind::EnabledCheck(severity),
                        },
                    );
                }
            }
            if let Some(method) = framework.level_check_method() {
                table.insert(
                    (declaring_type, method),
                    Signature {
                        framework: Some(framework),
                        kind: SignatureKind::LevelCheck,
                    },
                );
            }
        }
    }

    // JUL levels with no tier of their own.
    for (method, severity) in [("finest", Severity::Trace), ("config", Severity::Info)] {
        table.insert(
            ("java.util.logging.Logger", method),
            Signature {
                framework: Some(LoggingFramework::Jul),
                kind: SignatureKind::Leveled(severity),
            },
        );
    }

    for framework in [LoggingFramework::Jul, LoggingFramework::Log4j2] {
        table.insert(
            (framework.logger_type(), "log"),
            Signature {
                framework: Some(framework),
                kind: SignatureKind::LevelArgument,
            },
        );
    }

    let factories = [
        ("org.slf4j.LoggerFactory", "getLogger", LoggingFramework::Slf4j),
        ("org.apache.log4j.Logger", "getLogger", LoggingFramework::Log4j1),
        ("org.apache.log4j.LogManager", "getLogger", LoggingFramework::Log4j1),
        ("org.apache.logging.log4j.LogManager", "getLogger", LoggingFramework::Log4j2),
        ("java.util.logging.Logger", "getLogger", LoggingFramework::Jul),
        ("org.apache.commons.logging.LogFactory", "getLog", LoggingFramework::Commons),
    ];
    for (declaring_type, method, framework) in factories {
        table.insert(
            (declaring_type, method),
            Signature {
                framework: Some(framework),
                kind: SignatureKind::Factory,
            },
        );
    }

    table.insert(
        (THROWABLE, "printStackTrace"),
        Signature {
            framework: None,
            kind: SignatureKind::StackTrace,
        },
    );
    for method in ["print", "println"] {
        table.insert(
            (PRINT_STREAM, method),
            Signature {
                framework: None,
                kind: SignatureKind::Console,
            },
        );
    }

    table
});

pub fn lookup_signature(declaring_type: &str, method: &str) -> Option<Signature> {
    SIGNATURES.get(&(declaring_type, method)).copied()
}
