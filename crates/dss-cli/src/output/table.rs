#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

impl TableOptions {
    /// Width from `COLUMNS`, color when stdout is a terminal and `NO_COLOR`
    /// is unset.
    pub fn from_env() -> Self {
        use std::io::IsTerminal;

        let max_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|width| *width > 0);
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { max_width, color }
    }
}

/// Render an aligned table for string rows.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
                .max(MIN_WIDTH)
        })
        .collect();

    fit_widths(&mut widths, headers, options.max_width);

    let header_line = headers
        .iter()
        .zip(widths.iter())
        .map(|(header, width)| pad(&truncate(header, *width), *width, false))
        .collect::<Vec<_>>()
        .join("  ");
    let divider = "-".repeat(header_line.chars().count());

    let row_lines = rows.iter().map(|row| {
        widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let value = row.get(index).map_or("-", String::as_str);
                let text = truncate(value, *width);
                let cell = pad(&text, *width, looks_numeric(&text));
                if options.color {
                    colorize(&text, cell)
                } else {
                    cell
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    });

    let mut lines = Vec::with_capacity(2 + rows.len());
    lines.push(header_line);
    lines.push(divider);
    lines.extend(row_lines);
    lines.join("\n")
}

const MIN_WIDTH: usize = 4;

// Shrink the widest column one step at a time until the row fits.
fn fit_widths(widths: &mut [usize], headers: &[&str], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };
    let separators = widths.len().saturating_sub(1) * 2;

    while widths.iter().sum::<usize>() + separators > max_width {
        let candidate = widths
            .iter()
            .enumerate()
            .filter(|(idx, width)| **width > headers[*idx].len().max(MIN_WIDTH))
            .max_by_key(|(_, width)| **width)
            .map(|(idx, _)| idx);
        let Some(idx) = candidate else {
            break;
        };
        widths[idx] -= 1;
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 1 {
        return "…".to_string();
    }
    let mut out: String = value.chars().take(width - 1).collect();
    out.push('…');
    out
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.'))
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(value.chars().count()));
    if right_align {
        format!("{fill}{value}")
    } else {
        format!("{value}{fill}")
    }
}

// Color keyed on the cell text, applied around the padded cell.
fn colorize(text: &str, cell: String) -> String {
    let code = match text {
        "ok" | "configured" => "32",
        "not_configured" | "no_features" | "level_unresolved" | "missing_inputs" => "33",
        "query_failed" | "timed_out" | "no_centroid" => "31",
        _ => return cell,
    };
    format!("\u{1b}[{code}m{cell}\u{1b}[0m")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PLAIN: TableOptions = TableOptions {
        max_width: None,
        color: false,
    };

    #[test]
    fn columns_align_across_rows() {
        let rows = vec![
            vec!["gw_depth_mbgl".to_string(), "4.3".to_string()],
            vec!["aquifer_type".to_string(), "Alluvium".to_string()],
        ];
        let table = render_table(&["indicator", "value"], &rows, PLAIN);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2].find("     4.3"), lines[3].find("Alluvium"));
    }

    #[test]
    fn narrow_terminal_truncates_the_widest_column() {
        let rows = vec![vec![
            "rural_facilities".to_string(),
            "https://example.test/a/very/long/url".to_string(),
        ]];
        let options = TableOptions {
            max_width: Some(30),
            color: false,
        };
        let table = render_table(&["name", "url"], &rows, options);

        for line in table.lines() {
            assert!(line.chars().count() <= 30, "{line}");
        }
        assert!(table.contains('…'));
    }

    #[test]
    fn missing_cells_render_as_dash() {
        let rows = vec![vec!["only".to_string()]];
        let table = render_table(&["a", "b"], &rows, PLAIN);
        assert!(table.lines().nth(2).is_some_and(|line| line.ends_with('-')));
    }

    #[test]
    fn status_cells_are_colored() {
        let cell = colorize("timed_out", "timed_out ".to_string());
        assert_eq!(cell, "\u{1b}[31mtimed_out \u{1b}[0m");
        assert_eq!(colorize("Alluvium", "Alluvium".to_string()), "Alluvium");
    }
}
