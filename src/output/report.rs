use super::{render_row, EMPTY_HINT, EMPTY_MESSAGE, HEADERS, LOADING_MESSAGE, TITLE};
use crate::view::Frame;

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_html(frame: &Frame) -> Vec<u8> {
    let body = match frame {
        Frame::Loading => format!(
            r#"<div aria-live="polite" class="loading">{}</div>"#,
            LOADING_MESSAGE
        ),
        Frame::Error { message, reason } => format!(
            r#"<div aria-live="assertive" class="error">
  Error: {}
  <p>{}</p>
</div>"#,
            escape_html(reason),
            escape_html(message)
        ),
        Frame::Empty => format!(
            r#"<div class="no-projects">
  <p>{}</p>
  <p>{}</p>
</div>"#,
            EMPTY_MESSAGE, EMPTY_HINT
        ),
        Frame::Table {
            rows,
            page_numbers,
            current_page,
            ..
        } => {
            let mut out = String::new();
            out.push_str(
                r#"<div class="kickstarter-projects" aria-labelledby="projects-table-title">
"#,
            );
            out.push_str(&format!(
                "  <h2 id=\"projects-table-title\">{TITLE}</h2>\n"
            ));
            out.push_str("  <table>\n    <thead>\n      <tr>\n");
            for h in HEADERS {
                out.push_str(&format!("        <th>{h}</th>\n"));
            }
            out.push_str("      </tr>\n    </thead>\n    <tbody>\n");
            for row in rows.iter().map(render_row) {
                let class = if row.degraded { r#" class="degraded""# } else { "" };
                out.push_str(&format!(
                    "      <tr{class}>\n        <td>{}</td>\n        <td>{}</td>\n        <td>{}</td>\n      </tr>\n",
                    row.ordinal,
                    escape_html(&row.percentage_funded),
                    escape_html(&row.amount_pledged)
                ));
            }
            out.push_str("    </tbody>\n  </table>\n");
            if !page_numbers.is_empty() {
                out.push_str(
                    r#"  <div class="pagination" role="navigation" aria-label="Project pages">
"#,
                );
                for &n in page_numbers {
                    let (current, class) = if n == *current_page {
                        ("page", r#" class="active""#)
                    } else {
                        ("false", "")
                    };
                    out.push_str(&format!(
                        "    <button aria-current=\"{current}\"{class}>{n}</button>\n"
                    ));
                }
                out.push_str("  </div>\n");
            }
            out.push_str("</div>");
            out
        }
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{TITLE}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; }}
    th, td {{ padding: 0.4rem 1rem; border-bottom: 1px solid #ddd; text-align: right; }}
    tr.degraded td {{ color: #a15c00; }}
    .pagination button {{ margin: 0.2rem; }}
    .pagination button.active {{ font-weight: bold; }}
    .error {{ color: #b00020; }}
  </style>
</head>
<body>
{body}
</body>
</html>
"#
    );
    html.into_bytes()
}
