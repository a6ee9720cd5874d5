pub mod common;
pub mod echo;
pub mod fastapi;
pub mod flask;
pub mod gin;
pub mod jaxrs;
pub mod java;
pub mod python;
pub mod registry;
pub mod spring;

pub use common::{Endpoint, HttpMethod, SourceLocation};
pub use registry::ParserRegistry;

use serde::Serialize;
use std::path::Path;

/// Web framework an endpoint was extracted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Framework {
    Spring,
    #[serde(rename = "JAX-RS")]
    JaxRs,
    Gin,
    Echo,
    #[serde(rename = "FastAPI")]
    FastApi,
    Flask,
    #[serde(rename = "Flask-RESTful")]
    FlaskRestful,
}

impl Framework {
    /// Frameworks that have a parser, in registry priority order.
    pub const PARSED: [Framework; 6] = [
        Framework::Spring,
        Framework::JaxRs,
        Framework::Gin,
        Framework::Echo,
        Framework::FastApi,
        Framework::Flask,
    ];

    /// Display tag carried on endpoints.
    pub fn tag(&self) -> &'static str {
        match self {
            Framework::Spring => "Spring",
            Framework::JaxRs => "JAX-RS",
            Framework::Gin => "Gin",
            Framework::Echo => "Echo",
            Framework::FastApi => "FastAPI",
            Framework::Flask => "Flask",
            Framework::FlaskRestful => "Flask-RESTful",
        }
    }

    /// The framework whose parser produces this tag.
    pub fn parser_framework(&self) -> Framework {
        match self {
            Framework::FlaskRestful => Framework::Flask,
            other => *other,
        }
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spring" => Ok(Framework::Spring),
            "jax-rs" | "jaxrs" => Ok(Framework::JaxRs),
            "gin" => Ok(Framework::Gin),
            "echo" => Ok(Framework::Echo),
            "fastapi" => Ok(Framework::FastApi),
            "flask" => Ok(Framework::Flask),
            "flask-restful" | "flask_restful" => Ok(Framework::FlaskRestful),
            _ => Err(format!("unsupported framework: {s}")),
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Detection and extraction strategy for one web framework.
pub trait FrameworkParser: Send + Sync {
    /// Framework this parser recognizes.
    fn framework(&self) -> Framework;

    /// File extensions (without the dot) worth trying this parser on.
    fn supported_extensions(&self) -> &[&'static str];

    /// Cheap keyword check. Must not do a full parse.
    fn can_parse(&self, path: &Path, content: &str) -> bool;

    /// Extract every endpoint that can be confidently recognized.
    /// Never fails: unrecognizable declarations are skipped.
    fn parse_file(&self, path: &Path, content: &str) -> Vec<Endpoint>;
}
