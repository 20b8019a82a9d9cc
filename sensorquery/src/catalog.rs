/// The message a client sends to end its session. Client-side convention
/// only; the server never sees it.
pub const EXIT_SENTINEL: &str = "exit";

/// Returns true if `message` is the exit sentinel (case-insensitive).
pub fn is_exit(message: &str) -> bool {
    message.eq_ignore_ascii_case(EXIT_SENTINEL)
}

/// A recognized query. Identity is the literal text: matching is exact,
/// case-sensitive, and untrimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    FridgeOneHumidity,
    FridgeTwoHumidity,
    DishwasherWaterLevel,
}

impl Query {
    /// Catalog order, which is also the order guidance text lists them in.
    pub const ALL: [Query; 3] = [
        Query::FridgeOneHumidity,
        Query::FridgeTwoHumidity,
        Query::DishwasherWaterLevel,
    ];

    pub fn text(self) -> &'static str {
        match self {
            Query::FridgeOneHumidity => {
                "What is the average humidity inside my kitchen fridge 1 in the past three hours?"
            }
            Query::FridgeTwoHumidity => {
                "What is the average humidity inside my kitchen fridge 2 in the past three hours?"
            }
            Query::DishwasherWaterLevel => {
                "What is the average water level in my dishwasher in the past three hours?"
            }
        }
    }
}

/// The fixed set of recognized queries. Built once at startup and shared
/// verbatim by the client and server, so the two ends cannot drift.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Query>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: Query::ALL.to_vec(),
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Query] {
        &self.entries
    }

    /// Exact match against the catalog. No trimming, no case folding.
    pub fn match_text(&self, input: &str) -> Option<Query> {
        self.entries.iter().copied().find(|q| q.text() == input)
    }

    /// The fallback reply for anything the catalog does not recognize.
    /// Not an error path; an unmatched query is a normal request.
    pub fn guidance(&self) -> String {
        let list = self
            .entries
            .iter()
            .map(|q| q.text())
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Sorry, this query cannot be processed. Please try one of the following queries:\n\n{}",
            list
        )
    }
}
