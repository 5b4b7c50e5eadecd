use chrono::Utc;

use crate::devices::drive::{OperatingMode, RegisterSnapshot, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};

pub trait SnapshotFormatter: Send + Sync {
    fn format(&self, snapshot: &RegisterSnapshot) -> String;
}

pub struct ConsoleFormatter;

impl SnapshotFormatter for ConsoleFormatter {
    fn format(&self, snapshot: &RegisterSnapshot) -> String {
        format!(
            "🔹 Drive state @ {}\nMode: {} (0x{:04X})\nFrequency: {} Hz\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            snapshot.mode.name(),
            snapshot.mode.raw(),
            snapshot.frequency
        )
    }
}

pub struct JsonFormatter;

impl SnapshotFormatter for JsonFormatter {
    fn format(&self, snapshot: &RegisterSnapshot) -> String {
        serde_json::to_string_pretty(&snapshot.view()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Operator form with the reported mode preselected.
pub struct HtmlFormFormatter;

impl SnapshotFormatter for HtmlFormFormatter {
    fn format(&self, snapshot: &RegisterSnapshot) -> String {
        let options: String = OperatingMode::ALL
            .iter()
            .map(|mode| {
                let selected = if snapshot.mode.is(*mode) { " selected" } else { "" };
                format!(
                    "    <option value=\"{}\"{}>{}</option>\n",
                    mode.name(),
                    selected,
                    capitalize(mode.name())
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<title>Modbus Controller</title>
</head>
<body>
<h1>Modbus Controller</h1>
<form method="POST">
  Mode of Operation:
  <select name="mode_selection">
{options}  </select><br>
  Frequency ({min}-{max} Hz): <input type="number" name="frequency" min="{min}" max="{max}" value="{frequency}"><br>
  <input type="submit" value="Update">
</form>
</body>
</html>
"#,
            options = options,
            min = MIN_FREQUENCY_HZ,
            max = MAX_FREQUENCY_HZ,
            frequency = snapshot.frequency
        )
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn formatter_for(format: &str) -> Box<dyn SnapshotFormatter> {
    match format {
        "json" => Box::new(JsonFormatter),
        "html" => Box::new(HtmlFormFormatter),
        _ => Box::new(ConsoleFormatter),
    }
}
