pub mod grid;
pub mod json;

use crate::service::{Generated, HistoryEntry, Restored, Seating};

pub fn print_seating(seating: &Seating, json_output: bool) {
    if json_output {
        println!("{}", json::render(&seating.arrangement));
    } else {
        print!("{}", grid::render(seating));
    }
}

pub fn print_generated(generated: &Generated, json_output: bool) {
    if json_output {
        println!("{}", json::render(generated));
        return;
    }

    print!("{}", grid::render(&generated.seating));
    print_unpaired(generated);

    if let Some(archived) = &generated.archived_as {
        println!("\nprevious arrangement archived as {archived}");
    }
}

fn print_unpaired(generated: &Generated) {
    if generated.unpaired.is_empty() {
        return;
    }

    println!();
    for person in &generated.unpaired {
        let placement = if generated.seating.arrangement.names().any(|n| n == person.name) {
            "seated alone"
        } else {
            "not seated"
        };
        println!(
            "[warning] {} ({}) has no partner: {placement}",
            person.name,
            person.category.label()
        );
    }
}

pub fn print_restored(restored: &Restored, json_output: bool) {
    if json_output {
        println!("{}", json::render(restored));
        return;
    }

    println!("restored {}", restored.restored);
    if let Some(archived) = &restored.archived_as {
        println!("previous arrangement archived as {archived}");
    }
}

pub fn print_history(entries: &[HistoryEntry], json_output: bool) {
    if json_output {
        println!("{}", json::render(entries));
    } else {
        print!("{}", render_history(entries));
    }
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return String::from("No history yet. Run 'seatmate generate' twice to start one.\n");
    }

    let mut output = String::new();
    output.push_str(&format!("{:<26} {}\n", "Date", "File"));
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for entry in entries {
        let marker = if entry.recognized { "" } else { " (?)" };
        output.push_str(&format!("{:<26} {}{marker}\n", entry.display, entry.filename));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_flags_unrecognized_ids() {
        let entries = vec![
            HistoryEntry {
                filename: "config-19-01-2026_21-15-31.json".into(),
                timestamp: "19-01-2026_21-15-31".into(),
                display: "19 Januari 2026 21.15".into(),
                recognized: true,
            },
            HistoryEntry {
                filename: "config-backup.json".into(),
                timestamp: "backup".into(),
                display: "backup".into(),
                recognized: false,
            },
        ];
        let out = render_history(&entries);
        assert!(out.contains("19 Januari 2026 21.15"));
        assert!(out.contains("config-backup.json (?)"));
        assert!(!out.contains("config-19-01-2026_21-15-31.json (?)"));
    }

    #[test]
    fn empty_history_message() {
        assert!(render_history(&[]).starts_with("No history yet"));
    }
}
