//! Landing page rendering.

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Links to the artifacts of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLinks {
    pub plot_url: String,
    pub csv_url: String,
    pub reference_url: Option<String>,
    pub rows: usize,
}

impl ResultLinks {
    /// URLs under the `/static` mount for a request directory name.
    pub fn for_request(request_dir: &str, rows: usize, with_reference: bool) -> Self {
        let base = format!("/static/{}", request_dir);
        Self {
            plot_url: format!("{}/{}", base, crate::output::PLOT_PNG),
            csv_url: format!("{}/{}", base, crate::output::PREDICTIONS_CSV),
            reference_url: with_reference
                .then(|| format!("{}/{}", base, crate::output::REFERENCE_CSV)),
            rows,
        }
    }
}

/// The upload form, followed by the plot and download links when present.
pub fn render_index(result: Option<&ResultLinks>) -> String {
    let section = match result {
        None => String::new(),
        Some(r) => {
            let mut html = format!(
                "  <section class=\"result\">\n    <h2>Predicted PM2.5 ({} grid cells)</h2>\n    <img src=\"{}\" alt=\"PM2.5 concentration map\">\n    <p><a href=\"{}\" download>Download predictions (CSV)</a></p>\n",
                r.rows, r.plot_url, r.csv_url
            );
            if let Some(url) = &r.reference_url {
                html.push_str(&format!(
                    "    <p><a href=\"{}\" download>Uploaded CPCB data (CSV)</a></p>\n",
                    url
                ));
            }
            html.push_str("  </section>");
            html
        }
    };
    INDEX_TEMPLATE.replace("{{result}}", &section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_form() {
        let html = render_index(None);
        assert!(html.contains(r#"name="aod_file""#));
        assert!(html.contains(r#"name="cpcb_file""#));
        assert!(!html.contains("{{result}}"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_result_links() {
        let links = ResultLinks::for_request("abc", 5, true);
        let html = render_index(Some(&links));
        assert!(html.contains(r#"<img src="/static/abc/PM_Map_1deg.png""#));
        assert!(html.contains("/static/abc/PM_Map_Final.csv"));
        assert!(html.contains("/static/abc/CPCB_Uploaded.csv"));
        assert!(html.contains("5 grid cells"));
    }
}
