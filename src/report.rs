//! Static HTML table of a played set

use std::{io::Write, path::Path};

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::{config::ReportConfig, domain::track::Track};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders one table row per track. Tracks without a link get a `&nbsp;` cell.
pub fn render_table(tracks: &[Track], link_text: &str) -> String {
    let mut html = String::from("<table>");
    html.push_str("<tr><th>Artist</th><th>Track Title</th><th>Label</th><th>Link</th></tr>");

    for track in tracks {
        let link_cell = if track.has_link() {
            format!(
                "<a href=\"{}\">{}</a>",
                escape(&track.link),
                escape(link_text)
            )
        } else {
            "&nbsp;".to_string()
        };

        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&track.artist),
            escape(&track.title),
            escape(&track.label),
            link_cell
        ));
    }

    html.push_str("</table>");
    html
}

/// Writes the table to `config.output`, replacing any previous report in one step.
pub fn write_report(tracks: &[Track], config: &ReportConfig) -> anyhow::Result<()> {
    let output: &Path = &config.output;
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(render_table(tracks, &config.link_text).as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(output)
        .with_context(|| format!("failed to write report {}", output.display()))?;
    Ok(())
}
