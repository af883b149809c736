//! Roster input.
//!
//! A roster is an ordered list of people, each tagged with one of two
//! categories. Providers validate rows at the boundary so the pairing
//! engine only ever sees well-formed people.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RosterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "L")]
    Male,
    #[serde(rename = "P")]
    Female,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Male, Category::Female];

    /// Source code as it appears in roster files and snapshot json.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Male => "L",
            Category::Female => "P",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Male => "Laki-laki",
            Category::Female => "Perempuan",
        }
    }

    /// Parses a category code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "L" | "l" => Some(Category::Male),
            "P" | "p" => Some(Category::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub category: Category,
}

impl Person {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Person { name: name.into(), category }
    }
}

/// Supplies the people to seat. Implementations reject malformed input
/// instead of passing it through.
pub trait RosterProvider {
    fn people(&self) -> Result<Vec<Person>, RosterError>;
}

/// A roster already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    people: Vec<Person>,
}

impl StaticRoster {
    pub fn new(people: Vec<Person>) -> Self {
        StaticRoster { people }
    }
}

impl RosterProvider for StaticRoster {
    fn people(&self) -> Result<Vec<Person>, RosterError> {
        for (idx, person) in self.people.iter().enumerate() {
            if person.name.trim().is_empty() {
                return Err(RosterError::EmptyName { line: idx + 1 });
            }
        }
        if self.people.is_empty() {
            return Err(RosterError::EmptyRoster);
        }
        Ok(self.people.clone())
    }
}

enum Source {
    File(PathBuf),
    Text(String),
}

/// `name<delim>category` rows, one person per line.
///
/// Blank lines and `#` comments are skipped, as is a leading
/// `nama,gender` or `name,category` header.
pub struct DelimitedRoster {
    source: Source,
    delimiter: char,
}

impl DelimitedRoster {
    pub fn from_path(path: impl AsRef<Path>, delimiter: char) -> Self {
        DelimitedRoster {
            source: Source::File(path.as_ref().to_path_buf()),
            delimiter,
        }
    }

    pub fn from_text(text: impl Into<String>, delimiter: char) -> Self {
        DelimitedRoster {
            source: Source::Text(text.into()),
            delimiter,
        }
    }

    fn read(&self) -> Result<String, RosterError> {
        match &self.source {
            Source::Text(text) => Ok(text.clone()),
            Source::File(path) => std::fs::read_to_string(path).map_err(|source| RosterError::Io {
                path: path.clone(),
                source,
            }),
        }
    }
}

impl RosterProvider for DelimitedRoster {
    fn people(&self) -> Result<Vec<Person>, RosterError> {
        let text = self.read()?;
        parse_rows(&text, self.delimiter)
    }
}

fn is_header(name: &str, code: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let code = code.to_ascii_lowercase();
    matches!(
        (name.as_str(), code.as_str()),
        ("nama", "gender") | ("name", "category") | ("name", "gender")
    )
}

fn parse_rows(text: &str, delimiter: char) -> Result<Vec<Person>, RosterError> {
    let mut people = Vec::new();
    let mut seen_row = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let row = raw.trim();
        if row.is_empty() || row.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = row.split(delimiter).map(str::trim).collect();
        if fields.len() != 2 {
            return Err(RosterError::MalformedRow {
                line,
                reason: format!("expected 2 fields separated by '{delimiter}', found {}", fields.len()),
            });
        }

        let (name, code) = (fields[0], fields[1]);

        if !seen_row && is_header(name, code) {
            seen_row = true;
            continue;
        }
        seen_row = true;

        if name.is_empty() {
            return Err(RosterError::EmptyName { line });
        }

        let category = Category::from_code(code).ok_or_else(|| RosterError::UnknownCategory {
            line,
            code: code.to_string(),
        })?;

        people.push(Person::new(name, category));
    }

    if people.is_empty() {
        return Err(RosterError::EmptyRoster);
    }

    Ok(people)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_order() {
        let roster = DelimitedRoster::from_text("ADILAH,P\nARI,L\n", ',');
        let people = roster.people().unwrap();
        assert_eq!(people, vec![
            Person::new("ADILAH", Category::Female),
            Person::new("ARI", Category::Male),
        ]);
    }

    #[test]
    fn skips_header_blanks_and_comments() {
        let text = "nama,gender\n\n# class 7B\nNABIL UMAR, l\nNURUL JANNATA ,P\n";
        let people = DelimitedRoster::from_text(text, ',').people().unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].name, "NABIL UMAR");
        assert_eq!(people[0].category, Category::Male);
        assert_eq!(people[1].name, "NURUL JANNATA");
    }

    #[test]
    fn header_only_counts_as_first_row() {
        let err = DelimitedRoster::from_text("A,L\nnama,gender\n", ',').people().unwrap_err();
        assert!(matches!(err, RosterError::UnknownCategory { line: 2, .. }));
    }

    #[test]
    fn custom_delimiter() {
        let people = DelimitedRoster::from_text("HALIMATUN SA'DIAH;P", ';').people().unwrap();
        assert_eq!(people[0].name, "HALIMATUN SA'DIAH");
    }

    #[test]
    fn wrong_field_count_reports_line() {
        let err = DelimitedRoster::from_text("A,L\nB,P,extra\n", ',').people().unwrap_err();
        assert!(matches!(err, RosterError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn unknown_category_rejected() {
        let err = DelimitedRoster::from_text("A,X\n", ',').people().unwrap_err();
        match err {
            RosterError::UnknownCategory { line, code } => {
                assert_eq!(line, 1);
                assert_eq!(code, "X");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_name_rejected() {
        let err = DelimitedRoster::from_text(" ,L\n", ',').people().unwrap_err();
        assert!(matches!(err, RosterError::EmptyName { line: 1 }));
    }

    #[test]
    fn empty_input_rejected() {
        let err = DelimitedRoster::from_text("\n# nothing\n", ',').people().unwrap_err();
        assert!(matches!(err, RosterError::EmptyRoster));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DelimitedRoster::from_path("/nonexistent/roster.csv", ',').people().unwrap_err();
        assert!(matches!(err, RosterError::Io { .. }));
    }

    #[test]
    fn static_roster_rejects_blank_names() {
        let roster = StaticRoster::new(vec![Person::new("A", Category::Male), Person::new("  ", Category::Male)]);
        assert!(matches!(roster.people(), Err(RosterError::EmptyName { line: 2 })));
    }

    #[test]
    fn category_codes_round_trip_through_json() {
        let json = serde_json::to_string(&Category::Female).unwrap();
        assert_eq!(json, "\"P\"");
        assert_eq!(Category::from_code("l"), Some(Category::Male));
        assert_eq!(Category::from_code("Q"), None);
    }
}
