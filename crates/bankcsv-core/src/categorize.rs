//! Keyword-table categorization
//!
//! Descriptions are lowercased and checked against an ordered table of
//! categories with English and Dutch keyword lists. The first category with
//! a keyword hit wins; anything unmatched is `Other`.
//!
//! A keyword must start at a word boundary, so "school" does not fire inside
//! "sportschool". Keywords of up to four characters must also end at one.

use std::sync::OnceLock;

use crate::models::Category;

/// Keywords this short only match whole words
const WHOLE_WORD_MAX_CHARS: usize = 4;

/// Built-in keyword table, in match order
const BUILTIN_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Groceries,
        &[
            "albert heijn",
            "jumbo",
            "lidl",
            "aldi",
            "plus supermarkt",
            "dirk van den broek",
            "coop",
            "spar",
            "ekoplaza",
            "picnic",
            "supermarkt",
            "supermarket",
            "grocery",
            "groceries",
            "whole foods",
            "trader joe",
            "walmart",
            "tesco",
            "carrefour",
            "bakkerij",
            "slager",
        ],
    ),
    (
        Category::Dining,
        &[
            "restaurant",
            "cafe",
            "café",
            "coffee",
            "starbucks",
            "mcdonald",
            "burger king",
            "kfc",
            "subway",
            "domino",
            "pizza",
            "thuisbezorgd",
            "uber eats",
            "deliveroo",
            "just eat",
            "eetcafe",
            "brasserie",
            "lunchroom",
            "snackbar",
        ],
    ),
    (
        Category::Transportation,
        &[
            "ns reizigers",
            "ns.nl",
            "ov-chipkaart",
            "ov chipkaart",
            "gvb",
            "connexxion",
            "arriva",
            "shell",
            "esso",
            "texaco",
            "tinq",
            "tango",
            "tankstation",
            "benzine",
            "fuel",
            "parkeer",
            "parking",
            "q-park",
            "uber",
            "bolt.eu",
            "taxi",
            "lyft",
        ],
    ),
    (
        Category::Shopping,
        &[
            "bol.com",
            "amazon",
            "coolblue",
            "mediamarkt",
            "zalando",
            "hema",
            "ikea",
            "primark",
            "h&m",
            "zara",
            "blokker",
            "gamma",
            "praxis",
            "wehkamp",
            "ebay",
            "aliexpress",
            "webshop",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "netflix",
            "spotify",
            "disney",
            "hbo",
            "videoland",
            "youtube",
            "apple music",
            "pathe",
            "pathé",
            "bioscoop",
            "cinema",
            "theater",
            "concert",
            "steam",
            "playstation",
            "xbox",
            "nintendo",
            "ticketmaster",
        ],
    ),
    (
        Category::Utilities,
        &[
            "vattenfall",
            "eneco",
            "essent",
            "greenchoice",
            "budget energie",
            "energie",
            "electricity",
            "waternet",
            "vitens",
            "water bill",
            "ziggo",
            "kpn",
            "t-mobile",
            "vodafone",
            "odido",
            "internet",
            "telefoon",
            "gemeente",
        ],
    ),
    (
        Category::Housing,
        &[
            "huur",
            "hypotheek",
            "mortgage",
            "rent payment",
            "landlord",
            "woningcorporatie",
            "vve",
            "servicekosten",
        ],
    ),
    (
        Category::Healthcare,
        &[
            "apotheek",
            "pharmacy",
            "huisarts",
            "tandarts",
            "dentist",
            "doctor",
            "ziekenhuis",
            "hospital",
            "fysio",
            "clinic",
        ],
    ),
    (
        Category::Insurance,
        &[
            "verzekering",
            "insurance",
            "zilveren kruis",
            "centraal beheer",
            "nationale nederlanden",
            "interpolis",
            "univé",
            "unive",
            "ohra",
            "menzis",
        ],
    ),
    (
        Category::Education,
        &[
            "duo",
            "school",
            "basisschool",
            "universiteit",
            "university",
            "tuition",
            "collegegeld",
            "udemy",
            "coursera",
            "boekhandel",
        ],
    ),
    (
        Category::Travel,
        &[
            "booking.com",
            "airbnb",
            "klm",
            "transavia",
            "ryanair",
            "easyjet",
            "schiphol",
            "expedia",
            "hotel",
            "hostel",
            "vakantie",
        ],
    ),
    (
        Category::PersonalCare,
        &[
            "kapper",
            "barber",
            "hairdresser",
            "salon",
            "etos",
            "kruidvat",
            "douglas",
            "beauty",
            "sportschool",
            "basic-fit",
            "gym",
        ],
    ),
    (
        Category::BankFees,
        &[
            "kosten betaalpakket",
            "betaalpakket",
            "bankkosten",
            "maandkosten",
            "rente debetstand",
            "overdraft",
            "bank fee",
            "service fee",
            "monthly fee",
            "foreign transaction fee",
            "transactiekosten",
            "provisie",
        ],
    ),
    (
        Category::Cash,
        &[
            "geldautomaat",
            "geldopname",
            "opname",
            "atm withdrawal",
            "cash withdrawal",
        ],
    ),
    (
        Category::Transfers,
        &[
            "overboeking",
            "spaarrekening",
            "transfer",
            "savings",
            "tikkie",
            "eigen rekening",
        ],
    ),
    (
        Category::Income,
        &[
            "salaris",
            "salary",
            "payroll",
            "wages",
            "loonbetaling",
            "uitkering",
            "toeslag",
            "dividend",
            "refund",
            "teruggave",
            "terugbetaling",
        ],
    ),
];

/// Ordered keyword categorizer
#[derive(Debug, Clone)]
pub struct Categorizer {
    table: Vec<(Category, Vec<String>)>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Categorizer {
    /// Categorizer with the built-in bilingual keyword table
    pub fn new() -> Self {
        let table = BUILTIN_KEYWORDS
            .iter()
            .map(|(category, keywords)| {
                (*category, keywords.iter().map(|k| k.to_string()).collect())
            })
            .collect();
        Self { table }
    }

    /// Append extra keywords per category
    ///
    /// Extra keywords are checked after that category's built-ins. Categories
    /// without a built-in entry are appended to the end of the table, so they
    /// never pre-empt a built-in match.
    pub fn with_extra_keywords<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (Category, Vec<String>)>,
    {
        for (category, keywords) in extra {
            let keywords = keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty());

            match self.table.iter_mut().find(|(c, _)| *c == category) {
                Some((_, existing)) => existing.extend(keywords),
                None => self.table.push((category, keywords.collect())),
            }
        }
        self
    }

    /// Map a free-text description to a category
    pub fn categorize(&self, description: &str) -> Category {
        let description = description.to_lowercase();
        self.table
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| keyword_matches(&description, k)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }

    /// Number of keywords configured for a category
    pub fn keyword_count(&self, category: Category) -> usize {
        self.table
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, keywords)| keywords.len())
            .sum()
    }
}

fn keyword_matches(haystack: &str, keyword: &str) -> bool {
    let whole_word = keyword.chars().count() <= WHOLE_WORD_MAX_CHARS;
    haystack.match_indices(keyword).any(|(start, hit)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + hit.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric)
            && !(whole_word && after.is_some_and(char::is_alphanumeric))
    })
}

/// Categorize with the built-in table
pub fn categorize(description: &str) -> Category {
    static DEFAULT: OnceLock<Categorizer> = OnceLock::new();
    DEFAULT.get_or_init(Categorizer::new).categorize(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_merchants() {
        assert_eq!(categorize("ALBERT HEIJN 1234"), Category::Groceries);
        assert_eq!(categorize("NETFLIX.COM"), Category::Entertainment);
        assert_eq!(categorize("Thuisbezorgd.nl Amsterdam"), Category::Dining);
        assert_eq!(categorize("NS Reizigers BV"), Category::Transportation);
        assert_eq!(categorize("Vattenfall Klantenservice"), Category::Utilities);
        assert_eq!(categorize("SALARIS ACME BV"), Category::Income);
        assert_eq!(categorize("Kosten betaalpakket"), Category::BankFees);
        assert_eq!(categorize("Geldautomaat Utrecht"), Category::Cash);
    }

    #[test]
    fn test_unmatched_is_other() {
        assert_eq!(categorize("Zzyzx Holdings"), Category::Other);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn test_first_table_entry_wins() {
        // "uber eats" (Dining) is listed before "uber" (Transportation)
        assert_eq!(categorize("UBER EATS Rotterdam"), Category::Dining);
        assert_eq!(categorize("UBER *TRIP"), Category::Transportation);
    }

    #[test]
    fn test_keywords_start_at_word_boundary() {
        assert_eq!(categorize("Basic-Fit Sportschool Amsterdam"), Category::PersonalCare);
        assert_eq!(categorize("Sportschool Fit4Life"), Category::PersonalCare);
        assert_eq!(categorize("Basisschool De Regenboog"), Category::Education);
        assert_eq!(categorize("Schoolreis groep 8"), Category::Education);
    }

    #[test]
    fn test_short_keywords_match_whole_words() {
        assert_eq!(categorize("SPAR"), Category::Groceries);
        assert_eq!(categorize("Spar City Utrecht"), Category::Groceries);
        assert_eq!(categorize("Sparta Rotterdam"), Category::Other);
        assert_eq!(categorize("DUO"), Category::Education);
        assert_eq!(categorize("Betaling DUO Groningen"), Category::Education);
        assert_eq!(categorize("Duolingo"), Category::Other);
        assert_eq!(categorize("Cooperatie Rabobank"), Category::Other);
    }

    #[test]
    fn test_extra_keywords() {
        let categorizer = Categorizer::new().with_extra_keywords(vec![
            (Category::Groceries, vec!["Marqt".to_string()]),
            (Category::Other, vec!["misc".to_string()]),
        ]);

        assert_eq!(categorizer.categorize("MARQT OOST"), Category::Groceries);
        assert_eq!(categorizer.categorize("misc stuff"), Category::Other);
        assert_eq!(
            categorizer.keyword_count(Category::Groceries),
            Categorizer::new().keyword_count(Category::Groceries) + 1
        );
    }

    #[test]
    fn test_extra_keywords_do_not_preempt_builtins() {
        // A keyword added to a late category cannot steal a built-in match
        let categorizer = Categorizer::new()
            .with_extra_keywords(vec![(Category::Income, vec!["albert".to_string()])]);
        assert_eq!(categorizer.categorize("Albert Heijn"), Category::Groceries);
        assert_eq!(categorizer.categorize("Albert Dividend"), Category::Income);
    }
}
