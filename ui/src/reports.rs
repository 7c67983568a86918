use cost_centers_core::aggregate::CostCenterSummary;
use cost_centers_core::utils::format_usd;

pub struct RenderOptions {
    /// Adds a line-item count column.
    pub show_counts: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_summary_table(
    title: &str,
    summary: &CostCenterSummary,
    options: &RenderOptions,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("== {} ==\n", title));

    let mut headers = vec!["Cost Center", "Cost (USD)"];
    let mut align = vec![Align::Right, Align::Right];
    if options.show_counts {
        headers.push("Line Items");
        align.push(Align::Right);
    }

    let rows: Vec<Vec<String>> = summary
        .cost_centers
        .iter()
        .map(|group| {
            let mut row = vec![group.cost_center.clone(), format_usd(group.cost)];
            if options.show_counts {
                row.push(group.line_items.to_string());
            }
            row
        })
        .collect();

    if rows.is_empty() {
        out.push_str("no billed line items\n");
    } else {
        out.push_str(&render_table(&headers, &rows, &align));
        out.push('\n');
    }

    if summary.excluded_zero_cost > 0 {
        out.push_str(&format!(
            "({} zero-cost line items excluded)\n",
            summary.excluded_zero_cost
        ));
    }
    out.push_str(&format!("Total: {}", format_usd(summary.total)));
    out
}

fn render_table(headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        for (idx, value) in row.iter().enumerate() {
            let len = value.chars().count();
            if idx >= widths.len() {
                widths.push(len);
            } else {
                widths[idx] = widths[idx].max(len);
            }
        }
    }

    let mut output = String::new();
    output.push_str(&render_row(
        &headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
        &widths,
        align,
    ));
    output.push('\n');
    output.push_str(&render_separator(&widths));

    for row in rows {
        output.push('\n');
        output.push_str(&render_row(row, &widths, align));
    }

    output
}

fn render_row(row: &[String], widths: &[usize], align: &[Align]) -> String {
    row.iter()
        .enumerate()
        .map(|(idx, value)| match align.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => format!("{value:<width$}", width = widths[idx]),
            Align::Right => format!("{value:>width$}", width = widths[idx]),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn render_separator(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-")
}
