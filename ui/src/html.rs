use cost_centers_core::aggregate::CostCenterSummary;
use cost_centers_core::utils::format_usd;

pub const TABLE_CAPTION: &str = "Costs by Program";

/// Renders the summary as a standalone HTML document.
pub fn render_summary_html(title: &str, summary: &CostCenterSummary) -> String {
    let mut out = report_head(title);
    out.push_str(&render_table(summary));
    out.push_str(&report_foot(summary.total));
    out
}

fn report_head(title: &str) -> String {
    let title = escape(title);
    format!("<html>\n<head><title>{title}</title></head>\n<body><h2>{title}</h2>\n")
}

fn report_foot(total: f64) -> String {
    format!("<h4>Total: {}</h4></body></html>\n", format_usd(total))
}

fn render_table(summary: &CostCenterSummary) -> String {
    let mut out = String::new();
    out.push_str("<table>\n");
    out.push_str(&format!("<caption>{}</caption>\n", TABLE_CAPTION));
    out.push_str("<thead><tr><th></th><th>Cost</th></tr></thead>\n<tbody>\n");
    for group in &summary.cost_centers {
        out.push_str(&format!(
            "<tr><th><div align=\"right\" style=\"padding: 2px 16px\">{}</div></th><td>{}</td></tr>\n",
            escape(&group.cost_center),
            format_usd(group.cost)
        ));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
