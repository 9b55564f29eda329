//! CSV to Markdown table.
//!
//! Deliberately naive: rows are split on every comma, so quoted fields
//! containing commas come out split. Only the first [`MAX_LINES`] lines are read.

/// Lines of input considered; the rest of the file is ignored.
pub const MAX_LINES: usize = 100;

/// Render CSV text as a Markdown table, or `None` if there are no rows.
///
/// The first row is the header. Data rows are padded with empty cells, or
/// truncated, to the header's width.
pub fn csv_to_markdown(text: &str) -> Option<String> {
    let mut rows = text
        .lines()
        .take(MAX_LINES)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(split_row);

    let header = rows.next()?;
    let width = header.len();

    let mut table = String::new();
    push_row(&mut table, &header);
    push_row(&mut table, &vec!["---".to_string(); width]);

    for mut row in rows {
        row.resize(width, String::new());
        push_row(&mut table, &row);
    }

    table.pop();
    Some(table)
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').trim().replace('|', "\\|"))
        .collect()
}

fn push_row(table: &mut String, cells: &[String]) {
    table.push_str("| ");
    table.push_str(&cells.join(" | "));
    table.push_str(" |\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let table = csv_to_markdown("a,b\n1,2\n3").unwrap();
        assert_eq!(table, "| a | b |\n| --- | --- |\n| 1 | 2 |\n| 3 |  |");
    }

    #[test]
    fn long_rows_are_truncated() {
        let table = csv_to_markdown("name\nalice,extra,more").unwrap();
        assert_eq!(table, "| name |\n| --- |\n| alice |");
    }

    #[test]
    fn cells_are_unquoted_and_trimmed() {
        let table = csv_to_markdown("\"id\" , \" label \"\r\n 1 ,\"a|b\"\r\n").unwrap();
        assert_eq!(table, "| id | label |\n| --- | --- |\n| 1 | a\\|b |");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table = csv_to_markdown("\n\nx,y\n\n1,2\n\n").unwrap();
        assert_eq!(table, "| x | y |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn empty_input_has_no_table() {
        assert_eq!(csv_to_markdown(""), None);
        assert_eq!(csv_to_markdown("\n \n\t\n"), None);
    }

    #[test]
    fn only_the_first_lines_are_read() {
        let csv: String = std::iter::once("n".to_string())
            .chain((1..=500).map(|i| i.to_string()))
            .collect::<Vec<_>>()
            .join("\n");

        let table = csv_to_markdown(&csv).unwrap();
        // Header, separator, then MAX_LINES - 1 data rows
        assert_eq!(table.lines().count(), MAX_LINES + 1);
        assert!(table.ends_with("| 99 |"));
    }
}
