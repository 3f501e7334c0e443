//! Turns structured document content into one linear text artifact.
//!
//! Output depends only on the input value: no locale, clock or hash-order
//! dependent behaviour, so equal content always flattens to identical bytes.
//!
//! # Example Output (Doc, markdown)
//! ```text
//! ## Intro
//!
//! - first point
//! - second point
//!
//! | Name | Role |
//! | --- | --- |
//! | Ann | Lead |
//! ```

use super::drive_errors::FlattenError;
use super::drive_models::{
    DocBlock, DocContent, ExportFormat, FlatText, SheetContent, SlideDeck, StructuredContent,
    TableRow, TextRun,
};

/// Markdown has six heading levels.
const MAX_HEADING_LEVEL: u8 = 6;

const EMPTY_DOCUMENT: &str = "Document is empty.";

pub fn flatten(content: &StructuredContent, format: ExportFormat) -> Result<FlatText, FlattenError> {
    let text = match content {
        StructuredContent::Doc(doc) => match format {
            ExportFormat::Markdown => flatten_doc(doc, true)?,
            ExportFormat::Text => flatten_doc(doc, false)?,
            ExportFormat::Csv => return Err(unsupported(format, content)),
        },
        StructuredContent::Sheet(sheet) => match format {
            ExportFormat::Csv => sheet_to_csv(sheet)?,
            ExportFormat::Markdown | ExportFormat::Text => sheet_to_table_text(sheet),
        },
        StructuredContent::Slides(deck) => match format {
            ExportFormat::Markdown | ExportFormat::Text => flatten_slides(deck),
            ExportFormat::Csv => return Err(unsupported(format, content)),
        },
    };

    Ok(FlatText { format, text })
}

fn unsupported(format: ExportFormat, content: &StructuredContent) -> FlattenError {
    FlattenError(format!(
        "{} cannot be flattened to {}",
        content.doc_type(),
        format
    ))
}

// =============================================================================
// DOCS
// =============================================================================

fn flatten_doc(doc: &DocContent, markdown: bool) -> Result<String, FlattenError> {
    let mut sections: Vec<String> = Vec::new();
    let mut list_group: Vec<String> = Vec::new();
    // One counter per nesting depth for ordered lists.
    let mut counters: Vec<usize> = Vec::new();

    for (index, block) in doc.blocks.iter().enumerate() {
        validate_block(block, index)?;

        if let Some(marker) = block.list {
            let text = render_runs(&block.runs, markdown);
            if text.trim().is_empty() {
                continue;
            }

            counters.truncate(marker.depth + 1);
            counters.resize(marker.depth + 1, 0);
            counters[marker.depth] += 1;

            let indent = "  ".repeat(marker.depth);
            let bullet = if marker.ordered {
                format!("{}.", counters[marker.depth])
            } else {
                "-".to_string()
            };
            list_group.push(format!("{}{} {}", indent, bullet, text.trim_start()));
            continue;
        }

        if !list_group.is_empty() {
            sections.push(list_group.join("\n"));
            list_group.clear();
        }
        counters.clear();

        if let Some(rows) = &block.table {
            let table = render_doc_table(rows, markdown);
            if !table.is_empty() {
                sections.push(table);
            }
            continue;
        }

        let text = render_runs(&block.runs, markdown);
        if text.trim().is_empty() {
            continue;
        }

        match block.heading_level {
            Some(level) => {
                let hashes = "#".repeat(level.min(MAX_HEADING_LEVEL) as usize);
                sections.push(format!("{} {}", hashes, text.trim_start()));
            }
            None => sections.push(text),
        }
    }

    if !list_group.is_empty() {
        sections.push(list_group.join("\n"));
    }

    if sections.is_empty() {
        return Ok(EMPTY_DOCUMENT.to_string());
    }

    let separator = if markdown { "\n\n" } else { "\n" };
    Ok(sections.join(separator))
}

fn validate_block(block: &DocBlock, index: usize) -> Result<(), FlattenError> {
    let malformed = |reason: &str| Err(FlattenError(format!("block {}: {}", index, reason)));

    if block.heading_level == Some(0) {
        return malformed("heading level 0");
    }
    if block.heading_level.is_some() && block.list.is_some() {
        return malformed("block is both a heading and a list item");
    }
    if let Some(rows) = &block.table {
        if block.heading_level.is_some() || block.list.is_some() {
            return malformed("table block carries heading or list metadata");
        }
        if !block.runs.is_empty() {
            return malformed("table block carries paragraph text");
        }
        if rows.is_empty() {
            return malformed("table without rows");
        }
    }
    Ok(())
}

/// Concatenated run text with trailing whitespace (paragraph newlines) removed.
fn render_runs(runs: &[TextRun], markdown: bool) -> String {
    let mut text = String::new();
    for run in runs {
        if markdown {
            text.push_str(&emphasize(run));
        } else {
            text.push_str(&run.content);
        }
    }
    text.trim_end().to_string()
}

/// Wraps the non-whitespace core of a run in markdown emphasis markers.
fn emphasize(run: &TextRun) -> String {
    let marker = match (run.bold, run.italic) {
        (true, true) => "***",
        (true, false) => "**",
        (false, true) => "*",
        (false, false) => return run.content.clone(),
    };

    let content = run.content.as_str();
    let start = content.len() - content.trim_start().len();
    let end = content.trim_end().len();
    if start >= end {
        return run.content.clone();
    }

    format!(
        "{}{}{}{}{}",
        &content[..start],
        marker,
        &content[start..end],
        marker,
        &content[end..]
    )
}

fn render_doc_table(rows: &[TableRow], markdown: bool) -> String {
    let grid: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| render_runs(&cell.runs, markdown))
                .collect()
        })
        .collect();
    pipe_table(&grid)
}

// =============================================================================
// SHEETS
// =============================================================================

fn sheet_to_table_text(sheet: &SheetContent) -> String {
    let tabs = sheet.tabs.iter().map(|tab| {
        let table = pipe_table(&tab.rows);
        let body = if table.is_empty() {
            "(empty sheet)".to_string()
        } else {
            table
        };
        format!("## Sheet: {}\n\n{}", tab.title, body)
    });

    titled("Spreadsheet", &sheet.title, tabs)
}

/// CSV of the first tab. Rows are padded so every line has the same field count.
fn sheet_to_csv(sheet: &SheetContent) -> Result<String, FlattenError> {
    let Some(tab) = sheet.tabs.first() else {
        return Ok(String::new());
    };

    let width = tab.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in &tab.rows {
        writer
            .write_record((0..width).map(|i| row.get(i).map(String::as_str).unwrap_or("")))
            .map_err(|e| FlattenError(format!("tab '{}': {}", tab.title, e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FlattenError(format!("tab '{}': {}", tab.title, e.error())))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| FlattenError(format!("tab '{}': {}", tab.title, e)))?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

// =============================================================================
// SLIDES
// =============================================================================

fn flatten_slides(deck: &SlideDeck) -> String {
    let slides = deck.slides.iter().enumerate().map(|(index, slide)| {
        let mut parts = vec![format!("--- Slide {} ---", index + 1)];
        for shape in &slide.shapes {
            let lines: Vec<&str> = shape
                .lines
                .iter()
                .map(|line| line.trim_end())
                .filter(|line| !line.trim().is_empty())
                .collect();
            if !lines.is_empty() {
                parts.push(lines.join("\n"));
            }
        }
        parts.join("\n")
    });

    titled("Presentation", &deck.title, slides)
}

// =============================================================================
// SHARED
// =============================================================================

/// `<kind>: <title>` followed by the sections, all separated by blank lines.
/// The header is left out when the title is blank.
fn titled(kind: &str, title: &str, sections: impl Iterator<Item = String>) -> String {
    let header = (!title.trim().is_empty()).then(|| format!("{}: {}", kind, title.trim()));
    header
        .into_iter()
        .chain(sections)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Pipe-delimited table with a divider after the first row. Short rows are
/// padded with empty cells. Returns an empty string when there is nothing to show.
fn pipe_table(rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<String> = (0..width)
            .map(|i| table_cell(row.get(i).map(String::as_str).unwrap_or("")))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));

        if index == 0 {
            lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
        }
    }
    lines.join("\n")
}

fn table_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::drive::{
        ListMarker, SheetTab, Slide, SlideShape, TableCell,
    };

    fn run(text: &str) -> TextRun {
        TextRun::plain(text)
    }

    fn doc(blocks: Vec<DocBlock>) -> StructuredContent {
        StructuredContent::Doc(DocContent {
            title: "Doc".to_string(),
            blocks,
        })
    }

    fn sheet(rows: &[&[&str]]) -> StructuredContent {
        StructuredContent::Sheet(SheetContent {
            title: "Sheet".to_string(),
            tabs: vec![SheetTab {
                title: "Sheet1".to_string(),
                rows: rows
                    .iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            }],
        })
    }

    fn cell(text: &str) -> TableCell {
        TableCell {
            runs: vec![run(text)],
        }
    }

    fn text_of(content: &StructuredContent, format: ExportFormat) -> String {
        flatten(content, format).unwrap().text
    }

    #[test]
    fn test_heading_then_bullets_in_markdown() {
        let content = doc(vec![
            DocBlock::heading(2, vec![run("Intro\n")]),
            DocBlock::list_item(0, false, vec![run("first\n")]),
            DocBlock::list_item(0, false, vec![run("second\n")]),
        ]);

        let text = text_of(&content, ExportFormat::Markdown);
        assert_eq!(text, "## Intro\n\n- first\n- second");
    }

    #[test]
    fn test_heading_levels_are_capped() {
        let content = doc(vec![DocBlock::heading(9, vec![run("Deep")])]);
        assert_eq!(text_of(&content, ExportFormat::Markdown), "###### Deep");
    }

    #[test]
    fn test_nested_and_ordered_lists() {
        let content = doc(vec![
            DocBlock::list_item(0, true, vec![run("one")]),
            DocBlock::list_item(1, false, vec![run("detail")]),
            DocBlock::list_item(0, true, vec![run("two")]),
            DocBlock::paragraph(vec![run("break")]),
            DocBlock::list_item(0, true, vec![run("restart")]),
        ]);

        let text = text_of(&content, ExportFormat::Markdown);
        assert_eq!(
            text,
            "1. one\n  - detail\n2. two\n\nbreak\n\n1. restart"
        );
    }

    #[test]
    fn test_deeper_counters_reset_when_returning_to_parent() {
        let content = doc(vec![
            DocBlock::list_item(0, true, vec![run("a")]),
            DocBlock::list_item(1, true, vec![run("a.1")]),
            DocBlock::list_item(1, true, vec![run("a.2")]),
            DocBlock::list_item(0, true, vec![run("b")]),
            DocBlock::list_item(1, true, vec![run("b.1")]),
        ]);

        let text = text_of(&content, ExportFormat::Text);
        assert_eq!(text, "1. a\n  1. a.1\n  2. a.2\n2. b\n  1. b.1");
    }

    #[test]
    fn test_emphasis_in_markdown_only() {
        let content = doc(vec![DocBlock::paragraph(vec![
            run("Plain "),
            TextRun {
                content: "bold ".to_string(),
                bold: true,
                italic: false,
            },
            TextRun {
                content: "italic".to_string(),
                bold: false,
                italic: true,
            },
            TextRun {
                content: " both\n".to_string(),
                bold: true,
                italic: true,
            },
        ])]);

        assert_eq!(
            text_of(&content, ExportFormat::Markdown),
            "Plain **bold** *italic* ***both***"
        );
        assert_eq!(
            text_of(&content, ExportFormat::Text),
            "Plain bold italic both"
        );
    }

    #[test]
    fn test_whitespace_only_styled_run_is_left_alone() {
        let styled = TextRun {
            content: "  ".to_string(),
            bold: true,
            italic: false,
        };
        assert_eq!(emphasize(&styled), "  ");
    }

    #[test]
    fn test_doc_table_with_header_divider_and_padding() {
        let content = doc(vec![DocBlock::table(vec![
            TableRow {
                cells: vec![cell("Name"), cell("Role")],
            },
            TableRow {
                cells: vec![cell("Ann | Bo")],
            },
        ])]);

        assert_eq!(
            text_of(&content, ExportFormat::Markdown),
            "| Name | Role |\n| --- | --- |\n| Ann \\| Bo |  |"
        );
    }

    #[test]
    fn test_blank_paragraphs_skipped_and_text_joined_by_newline() {
        let content = doc(vec![
            DocBlock::heading(1, vec![run("Title\n")]),
            DocBlock::paragraph(vec![run("\n")]),
            DocBlock::paragraph(vec![run("Body\n")]),
        ]);

        assert_eq!(text_of(&content, ExportFormat::Text), "# Title\nBody");
        assert_eq!(
            text_of(&content, ExportFormat::Markdown),
            "# Title\n\nBody"
        );
    }

    #[test]
    fn test_malformed_blocks_fail_without_output() {
        let cases = vec![
            DocBlock::heading(0, vec![run("zero")]),
            DocBlock {
                runs: vec![run("x")],
                heading_level: Some(1),
                list: Some(ListMarker {
                    depth: 0,
                    ordered: false,
                }),
                table: None,
            },
            DocBlock::table(vec![]),
            DocBlock {
                runs: vec![run("stray")],
                table: Some(vec![TableRow {
                    cells: vec![cell("a")],
                }]),
                ..Default::default()
            },
        ];

        for block in cases {
            let content = doc(vec![DocBlock::paragraph(vec![run("ok")]), block]);
            let err = flatten(&content, ExportFormat::Markdown).unwrap_err();
            assert!(err.0.starts_with("block 1:"), "got {}", err.0);
        }
    }

    #[test]
    fn test_csv_quotes_delimiters() {
        let content = sheet(&[&["Name", "Age"], &["Ann", "30"], &["Bo, Jr.", "25"]]);
        assert_eq!(
            text_of(&content, ExportFormat::Csv),
            "Name,Age\nAnn,30\n\"Bo, Jr.\",25"
        );
    }

    #[test]
    fn test_csv_keeps_trailing_empty_fields() {
        let content = sheet(&[&["a", "b", "c"], &["1"], &["2", ""]]);
        assert_eq!(text_of(&content, ExportFormat::Csv), "a,b,c\n1,,\n2,,");
    }

    #[test]
    fn test_csv_round_trips_through_a_csv_reader() {
        let rows: &[&[&str]] = &[
            &["id", "quote", "notes"],
            &["1", "He said \"hi\"", "line one\nline two"],
            &["2", "a,b,c", " padded "],
            &["3", "", "\"\""],
        ];
        let text = text_of(&sheet(rows), ExportFormat::Csv);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();

        let expected: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_csv_keeps_blank_rows_of_a_single_column() {
        let rows: &[&[&str]] = &[&["a"], &[""], &["b"]];
        let text = text_of(&sheet(rows), ExportFormat::Csv);
        assert_eq!(text, "a\n\"\"\nb");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(
            parsed,
            vec![vec!["a".to_string()], vec!["".to_string()], vec!["b".to_string()]]
        );
    }

    #[test]
    fn test_csv_uses_first_tab_only() {
        let content = StructuredContent::Sheet(SheetContent {
            title: "Book".to_string(),
            tabs: vec![
                SheetTab {
                    title: "One".to_string(),
                    rows: vec![vec!["x".to_string()]],
                },
                SheetTab {
                    title: "Two".to_string(),
                    rows: vec![vec!["y".to_string()]],
                },
            ],
        });
        assert_eq!(text_of(&content, ExportFormat::Csv), "x");
    }

    #[test]
    fn test_sheet_table_text() {
        let content = StructuredContent::Sheet(SheetContent {
            title: "Book".to_string(),
            tabs: vec![
                SheetTab {
                    title: "People".to_string(),
                    rows: vec![
                        vec!["Name".to_string(), "Age".to_string()],
                        vec!["Ann".to_string()],
                    ],
                },
                SheetTab {
                    title: "Empty".to_string(),
                    rows: vec![],
                },
            ],
        });

        assert_eq!(
            text_of(&content, ExportFormat::Text),
            "Spreadsheet: Book\n\n## Sheet: People\n\n| Name | Age |\n| --- | --- |\n| Ann |  |\n\n## Sheet: Empty\n\n(empty sheet)"
        );
    }

    #[test]
    fn test_slides_markers_and_blank_shapes() {
        let content = StructuredContent::Slides(SlideDeck {
            title: "Deck".to_string(),
            slides: vec![
                Slide {
                    shapes: vec![
                        SlideShape {
                            lines: vec!["Welcome".to_string(), "".to_string()],
                        },
                        SlideShape {
                            lines: vec!["   ".to_string()],
                        },
                        SlideShape {
                            lines: vec!["Agenda".to_string(), "Q&A".to_string()],
                        },
                    ],
                },
                Slide { shapes: vec![] },
            ],
        });

        assert_eq!(
            text_of(&content, ExportFormat::Text),
            "Presentation: Deck\n\n--- Slide 1 ---\nWelcome\nAgenda\nQ&A\n\n--- Slide 2 ---"
        );
    }

    #[test]
    fn test_untitled_deck_has_no_header() {
        let deck = StructuredContent::Slides(SlideDeck {
            title: "  ".to_string(),
            slides: vec![Slide { shapes: vec![] }],
        });
        assert_eq!(text_of(&deck, ExportFormat::Markdown), "--- Slide 1 ---");
    }

    #[test]
    fn test_empty_doc_says_so() {
        let content = doc(vec![DocBlock::paragraph(vec![run("\n")])]);
        assert_eq!(text_of(&content, ExportFormat::Markdown), "Document is empty.");
        assert_eq!(text_of(&content, ExportFormat::Text), "Document is empty.");
    }

    #[test]
    fn test_csv_rejected_for_docs_and_slides() {
        assert!(flatten(&doc(vec![]), ExportFormat::Csv).is_err());
        let deck = StructuredContent::Slides(SlideDeck::default());
        assert!(flatten(&deck, ExportFormat::Csv).is_err());
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let content = doc(vec![
            DocBlock::heading(1, vec![run("A")]),
            DocBlock::list_item(0, true, vec![run("x")]),
            DocBlock::table(vec![TableRow {
                cells: vec![cell("1"), cell("2")],
            }]),
        ]);

        let first = flatten(&content, ExportFormat::Markdown).unwrap();
        let second = flatten(&content, ExportFormat::Markdown).unwrap();
        assert_eq!(first, second);
    }
}
