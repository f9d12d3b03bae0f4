//! Project export pipeline.
//!
//! Merges each referenced page with the project's keywords and annotations,
//! sorts the rows by volume and numeric page number, flattens the nested
//! passage structures into single text cells, and encodes the result as CSV.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::defaults::{PASSAGE_SEPARATOR, TOPIC_SEPARATOR};
use crate::error::{Error, Result};
use crate::models::{Page, PageAnnotation, Project};
use crate::uuid_utils::short_id;

/// Column headers, in output order.
pub const CSV_HEADERS: [&str; 8] = [
    "Volume",
    "Page Number",
    "Date",
    "Topics",
    "Text",
    "Keywords",
    "Page Notes",
    "Passages",
];

/// One merged, flattened page of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub volume: String,
    pub page_number: String,
    pub date: String,
    pub topics: Vec<String>,
    pub text: String,
    pub keywords: String,
    pub page_notes: String,
    /// Flattened passages, see [`flatten_passages`].
    pub passages: String,
}

impl ExportRow {
    /// Cell values in [`CSV_HEADERS`] order.
    pub fn cells(&self) -> [String; 8] {
        [
            single_line(&self.volume),
            single_line(&self.page_number),
            single_line(&self.date),
            single_line(&self.topics.join(TOPIC_SEPARATOR)),
            single_line(&self.text),
            single_line(&self.keywords),
            single_line(&self.page_notes),
            self.passages.clone(),
        ]
    }
}

/// An assembled project export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExport {
    pub project_id: Uuid,
    pub project_title: String,
    pub rows: Vec<ExportRow>,
}

impl ProjectExport {
    /// Encode as RFC 4180 CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, CSV_HEADERS.iter().copied());
        for row in &self.rows {
            let cells = row.cells();
            write_record(&mut out, cells.iter().map(String::as_str));
        }
        out
    }

    /// Download filename derived from the project title.
    pub fn filename(&self) -> String {
        let title = self.project_title.trim();
        let stem = if title.is_empty() {
            format!("project_{}", short_id(&self.project_id))
        } else {
            title.replace(
                |c: char| {
                    c.is_control()
                        || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
                },
                "_",
            )
        };
        format!("{}.csv", stem)
    }
}

/// Assemble the export for a project from its fetched pages.
///
/// Pages the project references but the store did not return are omitted.
/// A page that cannot be merged is logged and skipped; the rest still export.
pub fn build_export(project: &Project, pages: &[Page]) -> ProjectExport {
    if pages.len() < project.pages.len() {
        warn!(
            subsystem = "core",
            component = "export",
            project_id = %project.id,
            requested = project.pages.len(),
            found = pages.len(),
            "Project references pages that no longer exist; omitting them"
        );
    }

    let mut rows: Vec<(i64, ExportRow)> = pages
        .iter()
        .filter_map(|page| match build_row(project, page) {
            Ok(row) => Some((page.page_number_value(), row)),
            Err(e) => {
                warn!(
                    subsystem = "core",
                    component = "export",
                    project_id = %project.id,
                    page_id = %page.id,
                    error = %e,
                    "Skipping page in export"
                );
                None
            }
        })
        .collect();

    rows.sort_by(|(a_num, a), (b_num, b)| a.volume.cmp(&b.volume).then(a_num.cmp(b_num)));

    ProjectExport {
        project_id: project.id,
        project_title: project.title.clone(),
        rows: rows.into_iter().map(|(_, row)| row).collect(),
    }
}

/// Merge one page with the project-scoped data for it.
pub fn build_row(project: &Project, page: &Page) -> Result<ExportRow> {
    if !project.contains_page(page.id) {
        return Err(Error::InvalidInput(format!(
            "page {} is not part of project {}",
            page.id, project.id
        )));
    }

    let default_annotation = PageAnnotation::default();
    let annotation = project.annotation(page.id).unwrap_or(&default_annotation);

    Ok(ExportRow {
        volume: page.volume_title.clone(),
        page_number: page.page_number.clone(),
        date: page.date.clone().unwrap_or_default(),
        topics: page.topics.clone(),
        text: page.text.clone(),
        keywords: project
            .page_keywords
            .get(&page.id)
            .cloned()
            .unwrap_or_default(),
        page_notes: annotation.page_notes.clone(),
        passages: flatten_passages(annotation),
    })
}

/// Flatten an annotation's passages into one text block.
///
/// Each passage becomes `PASSAGE: <text>`, followed by ` | NOTE: <note>` when
/// a non-blank note exists for its id. Passages are separated by a blank line.
pub fn flatten_passages(annotation: &PageAnnotation) -> String {
    annotation
        .passages
        .iter()
        .map(|passage| {
            let mut entry = format!("PASSAGE: {}", single_line(&passage.text));
            if let Some(note) = annotation.note_for(&passage.id) {
                entry.push_str(" | NOTE: ");
                entry.push_str(&single_line(note));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

/// Collapse every run of `\r`/`\n` into a single space.
pub fn single_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        if c == '\n' || c == '\r' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}
