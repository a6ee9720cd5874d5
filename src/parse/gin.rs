use crate::parse::common::Endpoint;
use crate::parse::{Framework, FrameworkParser};
use std::path::Path;

/// Gin is detected so its files are claimed and counted, but route
/// extraction is not implemented yet.
pub struct GinParser;

impl FrameworkParser for GinParser {
    fn framework(&self) -> Framework {
        Framework::Gin
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn can_parse(&self, _path: &Path, content: &str) -> bool {
        content.contains("gin.Engine") || content.contains("gin.Context")
    }

    fn parse_file(&self, path: &Path, _content: &str) -> Vec<Endpoint> {
        tracing::debug!("Gin route extraction not supported, skipping {}", path.display());
        Vec::new()
    }
}
