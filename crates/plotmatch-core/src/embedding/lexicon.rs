//! Synonym groups shared across every series.
//!
//! A per-series corpus has tens of plots, far too few to learn that a
//! "sleuth" is a "detective". Words in the same group share one concept
//! key, and with it one index vector, so paraphrases embed close together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::text::Normalizer;

/// Prefix of concept keys. Never produced by the tokenizer.
pub const CONCEPT_PREFIX: char = '~';

const BUILTIN_GROUPS: &[&[&str]] = &[
    &[
        "detective", "sleuth", "investigator", "inspector", "sergeant", "constable", "cop",
        "policeman", "policewoman", "police", "officer", "lawman",
    ],
    &[
        "investigate", "investigation", "solve", "probe", "examine", "inquiry", "inquire",
        "case", "clue", "evidence", "mystery", "uncover",
    ],
    &[
        "murder", "killing", "kill", "killer", "murderer", "homicide", "slaying", "slay",
        "assassin", "assassination", "death", "dead", "corpse", "body",
    ],
    &[
        "mansion", "house", "manor", "estate", "home", "residence", "villa", "castle", "hall",
        "cottage",
    ],
    &[
        "chef", "cook", "cooking", "baker", "baking", "kitchen", "restaurant", "cuisine",
        "recipe", "meal", "dinner",
    ],
    &[
        "compete", "competition", "contest", "contestant", "tournament", "championship", "race",
        "rivalry", "rival", "challenge",
    ],
    &["doctor", "physician", "surgeon", "nurse", "hospital", "medic", "patient", "clinic"],
    &["illness", "ill", "sick", "sickness", "disease", "virus", "infection", "outbreak"],
    &["poison", "toxin", "overdose", "venom"],
    &[
        "steal", "theft", "thief", "robbery", "robber", "heist", "burglary", "burglar", "stolen",
        "loot",
    ],
    &["kidnap", "kidnapping", "abduction", "abduct", "hostage", "ransom"],
    &["love", "romance", "romantic", "affair", "lover", "crush", "dating", "relationship"],
    &["marry", "marriage", "wedding", "bride", "groom", "fiance", "fiancee", "engagement"],
    &["divorce", "separation", "breakup"],
    &["wife", "husband", "spouse"],
    &["mother", "mom", "mum", "father", "dad", "parent"],
    &["son", "daughter", "child", "children", "kid", "baby"],
    &["brother", "sister", "sibling"],
    &["friend", "friendship", "pal", "buddy"],
    &["school", "college", "university", "student", "teacher", "classroom", "exam"],
    &["job", "office", "boss", "colleague", "career", "employer", "employee", "promotion"],
    &["money", "cash", "fortune", "debt", "inheritance", "wealth", "rich"],
    &["travel", "trip", "journey", "holiday", "vacation", "voyage", "tour"],
    &["ship", "boat", "sea", "ocean", "yacht", "sailing"],
    &["crash", "accident", "collision", "wreck"],
    &["fire", "blaze", "arson", "flames", "explosion", "bomb"],
    &["war", "battle", "army", "soldier", "military", "combat"],
    &["spy", "espionage", "agent", "undercover"],
    &["alien", "spaceship", "planet", "space"],
    &["ghost", "haunted", "spirit", "supernatural", "demon"],
    &["prison", "jail", "inmate", "convict", "cell"],
    &["escape", "flee", "fugitive", "runaway"],
    &["court", "trial", "lawyer", "judge", "jury", "verdict", "attorney"],
    &["party", "celebration", "birthday", "festival"],
    &["secret", "lie", "deception", "betray", "betrayal"],
    &["fight", "argument", "quarrel", "feud", "conflict", "brawl"],
    &["large", "big", "huge", "giant", "enormous", "vast"],
    &["small", "little", "tiny"],
    &["old", "elderly", "ancient", "aged"],
    &["young", "youth", "teenage", "teenager"],
    &["town", "village", "city", "neighbourhood", "neighborhood", "community"],
    &["farm", "farmer", "countryside", "rural"],
    &["church", "vicar", "priest", "chapel", "parish"],
    &["music", "band", "singer", "concert", "song"],
    &["film", "movie", "actor", "actress", "theatre", "theater"],
    &["missing", "disappearance", "disappear", "vanish", "vanished", "lost"],
    &["search", "hunt", "pursuit", "chase", "manhunt"],
    &["discover", "discovery", "find", "reveal"],
    &["rescue", "save", "help", "aid"],
    &["danger", "threat", "peril", "risk"],
    &["fear", "afraid", "terror", "scared", "frightened"],
    &["scheme", "conspiracy", "plan"],
];

/// Synonym groups used by an embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Include the built-in groups.
    pub builtin: bool,
    /// Extra groups, appended after the built-in ones.
    pub extra: Vec<Vec<String>>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            builtin: true,
            extra: Vec::new(),
        }
    }
}

impl Lexicon {
    /// A lexicon with no groups: every token is its own key.
    #[must_use]
    pub fn none() -> Self {
        Self {
            builtin: false,
            extra: Vec::new(),
        }
    }

    /// Append a group of interchangeable words.
    pub fn with_group<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.push(words.into_iter().map(Into::into).collect());
        self
    }

    /// Maps each normalized group member to its concept key.
    ///
    /// Words are normalized with `normalizer` so they line up with stemmed,
    /// stop-word-filtered corpus tokens. A word that normalizes to anything
    /// other than exactly one token is ignored. When a token appears in
    /// several groups, the first group wins.
    #[must_use]
    pub fn compile(&self, normalizer: &Normalizer) -> BTreeMap<String, String> {
        let builtin = BUILTIN_GROUPS
            .iter()
            .filter(|_| self.builtin)
            .map(|group| group.iter().map(|w| (*w).to_string()).collect::<Vec<_>>());
        let groups = builtin.chain(self.extra.iter().cloned());

        let mut concepts = BTreeMap::new();
        for group in groups {
            let Some(head) = group.first() else {
                continue;
            };
            let concept = format!("{CONCEPT_PREFIX}{}", head.to_lowercase());

            for word in &group {
                let mut tokens = normalizer.normalize(word);
                if tokens.len() != 1 {
                    continue;
                }
                if let Some(token) = tokens.pop() {
                    concepts.entry(token).or_insert_with(|| concept.clone());
                }
            }
        }
        concepts
    }
}
