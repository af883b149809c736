//! Pairing engine.
//!
//! Splits a roster by category, shuffles each half, seats consecutive
//! people together and finally shuffles the table order so both
//! categories are interleaved. The random source is passed in, so a
//! seeded rng gives a reproducible arrangement.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::roster::{Category, Person};

/// One two-seat table. `second` is `None` only for someone seated alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TableRepr", into = "TableRepr")]
pub struct Table {
    pub first: String,
    pub second: Option<String>,
    pub category: Category,
}

impl Table {
    pub fn pair(first: impl Into<String>, second: impl Into<String>, category: Category) -> Self {
        Table {
            first: first.into(),
            second: Some(second.into()),
            category,
        }
    }

    pub fn single(name: impl Into<String>, category: Category) -> Self {
        Table {
            first: name.into(),
            second: None,
            category,
        }
    }

    pub fn occupants(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.first.as_str()).chain(self.second.as_deref())
    }

    pub fn is_single(&self) -> bool {
        self.second.is_none()
    }
}

// On disk a table is `[first, second, "L"]`; a lone occupant has `null`
// (older files may carry an empty string) in the second slot.
#[derive(Clone, Serialize, Deserialize)]
struct TableRepr(String, Option<String>, Category);

impl From<TableRepr> for Table {
    fn from(TableRepr(first, second, category): TableRepr) -> Self {
        Table {
            first,
            second: second.filter(|s| !s.is_empty()),
            category,
        }
    }
}

impl From<Table> for TableRepr {
    fn from(table: Table) -> Self {
        TableRepr(table.first, table.second, table.category)
    }
}

/// Ordered tables; the order is the display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arrangement {
    tables: Vec<Table>,
}

impl Arrangement {
    pub fn new(tables: Vec<Table>) -> Self {
        Arrangement { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().flat_map(Table::occupants)
    }
}

/// Someone left over because their category had an odd head count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpairedPerson {
    pub name: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnpairedPolicy {
    /// Leave the person out of the arrangement; they are only reported.
    #[default]
    Leave,
    /// Give the person a table of their own.
    SeatAlone,
}

#[derive(Debug, Clone)]
pub struct Pairing {
    pub arrangement: Arrangement,
    pub unpaired: Vec<UnpairedPerson>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairingEngine {
    policy: UnpairedPolicy,
}

impl PairingEngine {
    pub fn new(policy: UnpairedPolicy) -> Self {
        PairingEngine { policy }
    }

    pub fn policy(&self) -> UnpairedPolicy {
        self.policy
    }

    pub fn generate<R: Rng + ?Sized>(&self, people: &[Person], rng: &mut R) -> Pairing {
        let mut tables = Vec::with_capacity(people.len() / 2 + 2);
        let mut unpaired = Vec::new();

        for category in Category::ALL {
            let mut group: Vec<&str> = people
                .iter()
                .filter(|p| p.category == category)
                .map(|p| p.name.as_str())
                .collect();

            group.shuffle(rng);

            let mut chunks = group.chunks_exact(2);
            for pair in chunks.by_ref() {
                tables.push(Table::pair(pair[0], pair[1], category));
            }

            if let [leftover] = chunks.remainder() {
                tracing::warn!(name = %leftover, category = %category, "no partner available");
                unpaired.push(UnpairedPerson {
                    name: (*leftover).to_string(),
                    category,
                });
                if self.policy == UnpairedPolicy::SeatAlone {
                    tables.push(Table::single(*leftover, category));
                }
            }
        }

        tables.shuffle(rng);

        tracing::info!(tables = tables.len(), unpaired = unpaired.len(), "arrangement generated");

        Pairing {
            arrangement: Arrangement::new(tables),
            unpaired,
        }
    }
}
