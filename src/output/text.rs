use crate::errors::Result;
use crate::output::display_path;
use crate::parse::Endpoint;
use std::io::Write;
use std::path::Path;

/// Tree label of an endpoint, e.g. `GET /api/users`.
pub fn label(endpoint: &Endpoint) -> String {
    format!("{} {}", endpoint.method, endpoint.path)
}

/// `Owner.handler`, or just the owner when the handler is unresolved.
pub fn description(endpoint: &Endpoint) -> String {
    if endpoint.handler.is_empty() {
        endpoint.owner.clone()
    } else {
        format!("{}.{}", endpoint.owner, endpoint.handler)
    }
}

/// Write one line per endpoint, columns aligned.
pub fn write_endpoints_text<W: Write>(
    writer: &mut W,
    root: &Path,
    endpoints: &[Endpoint],
) -> Result<()> {
    let labels: Vec<String> = endpoints.iter().map(label).collect();
    let descriptions: Vec<String> = endpoints.iter().map(description).collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);
    let desc_width = descriptions.iter().map(String::len).max().unwrap_or(0);

    for ((endpoint, label), desc) in endpoints.iter().zip(&labels).zip(&descriptions) {
        let framework = endpoint
            .framework
            .map(|f| format!("[{f}]"))
            .unwrap_or_default();
        writeln!(
            writer,
            "{:<lw$}  {:<dw$}  {:<15}  {}:{}",
            label,
            desc,
            framework,
            display_path(root, &endpoint.location.file),
            endpoint.location.line + 1,
            lw = label_width,
            dw = desc_width,
        )?;
    }
    Ok(())
}
