use crate::detect::DetectedObject;
use crate::state::AppState;

/// `"cat - 92%"`.
pub fn detection_line(object: &DetectedObject) -> String {
    format!("{} - {}%", object.label, object.percent())
}

pub fn summary_line(label: &str) -> String {
    format!("The object detected is likely a {}.", label)
}

/// Text rendering of the current results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultView {
    /// One entry per detection, in list order; `true` marks the shown one.
    pub lines: Vec<(String, bool)>,
    pub summary: Option<String>,
}

impl ResultView {
    pub fn from_state(state: &AppState) -> Self {
        let selected = state.selection();
        let lines = state
            .detections()
            .iter()
            .map(|object| {
                // Matched by label, so repeated labels highlight together.
                let shown = selected.is_some_and(|s| s.label == object.label);
                (detection_line(object), shown)
            })
            .collect();
        Self {
            lines,
            summary: state.most_likely_label().map(summary_line),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.lines.is_empty() {
            out.push_str("Identified objects:\n");
            for (line, shown) in &self.lines {
                let marker = if *shown { '*' } else { ' ' };
                out.push_str(&format!(" {} {}\n", marker, line));
            }
        }
        if let Some(summary) = &self.summary {
            out.push_str(summary);
            out.push('\n');
        }
        out
    }
}
