use crate::parse::echo::EchoParser;
use crate::parse::fastapi::FastApiParser;
use crate::parse::flask::FlaskParser;
use crate::parse::gin::GinParser;
use crate::parse::jaxrs::JaxRsParser;
use crate::parse::spring::SpringParser;
use crate::parse::{Framework, FrameworkParser};
use std::collections::BTreeSet;
use std::path::Path;

/// Ordered set of framework parsers. The first parser that accepts a file wins.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FrameworkParser>>,
}

impl ParserRegistry {
    /// All built-in parsers in priority order.
    pub fn new() -> Self {
        Self::with_frameworks(&Framework::PARSED)
    }

    /// Built-in parsers restricted to `enabled`, still in priority order.
    pub fn with_frameworks(enabled: &[Framework]) -> Self {
        let enabled: BTreeSet<Framework> = enabled.iter().map(|f| f.parser_framework()).collect();
        let parsers = Framework::PARSED
            .iter()
            .filter(|fw| enabled.contains(fw))
            .filter_map(|fw| create_parser(*fw))
            .collect();
        Self { parsers }
    }

    /// Registry over an explicit parser list.
    pub fn with_parsers(parsers: Vec<Box<dyn FrameworkParser>>) -> Self {
        Self { parsers }
    }

    /// Union of every registered parser's extensions.
    pub fn supported_extensions(&self) -> BTreeSet<&'static str> {
        self.parsers
            .iter()
            .flat_map(|p| p.supported_extensions().iter().copied())
            .collect()
    }

    /// Pick the first parser that handles the file's extension and claims its content.
    pub fn select(&self, path: &Path, content: &str) -> Option<&dyn FrameworkParser> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.parsers
            .iter()
            .filter(|p| p.supported_extensions().contains(&ext))
            .find(|p| p.can_parse(path, content))
            .map(|p| p.as_ref())
    }

    pub fn frameworks(&self) -> Vec<Framework> {
        self.parsers.iter().map(|p| p.framework()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn create_parser(framework: Framework) -> Option<Box<dyn FrameworkParser>> {
    match framework {
        Framework::Spring => Some(Box::new(SpringParser)),
        Framework::JaxRs => Some(Box::new(JaxRsParser)),
        Framework::Gin => Some(Box::new(GinParser)),
        Framework::Echo => Some(Box::new(EchoParser)),
        Framework::FastApi => Some(Box::new(FastApiParser)),
        Framework::Flask => Some(Box::new(FlaskParser)),
        Framework::FlaskRestful => None,
    }
}
