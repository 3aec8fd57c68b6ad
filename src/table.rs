// table.rs: Normalize compose rules and merge them into a composition table.
// Copyright (C) 2015  Kenny Chan
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use thiserror::Error;

use crate::keysym::KeysymResolver;
use crate::profile::{self, Canonicalization, Profile, MULTI_KEY, SYMBOL_PREFIX};
use crate::rule::RawRule;

lazy_static! {
    static ref UNICODE_KEY_REGEX: Regex = Regex::new("^U[0-9A-Fa-f]{4,6}$").unwrap();
}

//{{{ KeySequence

/// A compose sequence after dead-key folding and resolution. Each element is
/// either one character or one `XK_` symbol name, depending on the profile.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct KeySequence(Vec<String>);

impl KeySequence {
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The keys joined together. In character mode this is exactly what the
    /// user types.
    pub fn text(&self) -> String {
        self.0.concat()
    }
}

#[cfg(test)]
impl<'a> From<&'a [&'a str]> for KeySequence {
    fn from(keys: &'a [&'a str]) -> Self {
        KeySequence(keys.iter().map(|&k| k.to_owned()).collect())
    }
}

//}}}

//{{{ CompositionTable

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Group {
    pub result: String,
    pub description: String,
    pub sequences: Vec<KeySequence>,
}

/// Result text → sequences, with every sequence owned by at most one result.
#[derive(Clone, Debug, Default)]
pub struct CompositionTable {
    groups: Vec<Group>,
    by_result: HashMap<String, usize>,
    owners: HashMap<KeySequence, usize>,
}

/// What happened to a sequence offered to the table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Insertion {
    Added,
    /// Taken away from the result at this group index.
    Moved { from: usize },
    AlreadyPresent,
    /// Another result owns it and the incoming rule went through a dead key.
    Shadowed { by: usize },
}

impl CompositionTable {
    pub fn insert(&mut self, result: &str, description: &str,
                  sequence: KeySequence, from_dead_key: bool) -> Insertion {
        let existing = self.by_result.get(result).cloned();

        let mut moved_from = None;
        if let Some(&owner) = self.owners.get(&sequence) {
            if Some(owner) == existing {
                return Insertion::AlreadyPresent;
            }
            if from_dead_key {
                return Insertion::Shadowed { by: owner };
            }
            self.groups[owner].sequences.retain(|s| *s != sequence);
            moved_from = Some(owner);
        }

        let index = match existing {
            Some(index) => index,
            None => {
                let index = self.groups.len();
                self.groups.push(Group {
                    result: result.to_owned(),
                    description: description.to_owned(),
                    sequences: Vec::new(),
                });
                self.by_result.insert(result.to_owned(), index);
                index
            }
        };

        self.groups[index].sequences.push(sequence.clone());
        self.owners.insert(sequence, index);

        match moved_from {
            Some(from) => Insertion::Moved { from },
            None => Insertion::Added,
        }
    }

    /// All results in first-seen order, including the ones that lost every
    /// sequence.
    pub fn all_groups(&self) -> &[Group] {
        &self.groups
    }

    /// The results that can still be typed.
    pub fn groups<'a>(&'a self) -> impl Iterator<Item = &'a Group> + 'a {
        self.groups.iter().filter(|g| !g.sequences.is_empty())
    }

    #[cfg(test)]
    pub fn group(&self, result: &str) -> Option<&Group> {
        self.by_result.get(result).map(|&i| &self.groups[i])
    }

    #[cfg(test)]
    pub fn owner(&self, sequence: &KeySequence) -> Option<&str> {
        self.owners.get(sequence).map(|&i| &*self.groups[i].result)
    }

    pub fn sequence_count(&self) -> usize {
        self.owners.len()
    }

    pub fn max_sequence_len(&self) -> usize {
        self.owners.keys().map(|s| s.len()).max().unwrap_or(0)
    }
}

//}}}

//{{{ Normalizer

/// Why a rule never made it into the table. None of these stop the run.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Rejection {
    /// A `U20AC`-style key, which has no stable keysym.
    #[error("{0} is a raw code point")]
    UnicodeKey(String),
    #[error("{0} is not reliable across layouts")]
    Denied(String),
    #[error("{0} cannot be resolved")]
    Unresolved(String),
    /// Nothing left after dropping the `Multi_key` prefix.
    #[error("no keys besides Multi_key")]
    Empty,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    Inserted(Insertion),
    Rejected(Rejection),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Stats {
    pub rules: usize,
    pub inserted: usize,
    pub moved: usize,
    pub duplicated: usize,
    pub shadowed: usize,
    pub rejected: usize,
}

/// Owns the table for the whole run. Feed it rules in file order.
pub struct Normalizer<'r, R: KeysymResolver> {
    profile: Profile,
    resolver: &'r R,
    table: CompositionTable,
    stats: Stats,
}

impl<'r, R: KeysymResolver> Normalizer<'r, R> {
    /// Starts a table holding only the base entry. Base sequences the
    /// resolver cannot spell are left out.
    pub fn new(profile: Profile, resolver: &'r R) -> Self {
        let mut normalizer = Normalizer {
            profile,
            resolver,
            table: CompositionTable::default(),
            stats: Stats::default(),
        };

        for keys in profile::BASE_SEQUENCES {
            match normalizer.canonicalize(keys.iter().cloned()) {
                Ok(sequence) => {
                    normalizer.table.insert(profile::BASE_RESULT, profile::BASE_DESCRIPTION,
                                            sequence, false);
                }
                Err(rejection) => debug!("base sequence {:?} dropped: {}", keys, rejection),
            }
        }

        normalizer
    }

    pub fn feed(&mut self, rule: &RawRule) -> Outcome {
        self.stats.rules += 1;

        let outcome = match self.normalize(&rule.keys) {
            Ok((sequence, from_dead_key)) => {
                let description = rule.full_description();
                trace!("{:?} -> {:?} (dead key: {})", rule.keys, sequence, from_dead_key);
                Outcome::Inserted(self.table.insert(&rule.result, &description,
                                                    sequence, from_dead_key))
            }
            Err(rejection) => {
                debug!("skipping {:?} for {:?}: {}", rule.keys, rule.result, rejection);
                Outcome::Rejected(rejection)
            }
        };

        match outcome {
            Outcome::Inserted(Insertion::Added) => self.stats.inserted += 1,
            Outcome::Inserted(Insertion::Moved { from }) => {
                debug!("{:?} now makes {:?} instead of {:?}",
                       rule.keys, rule.result, self.table.groups[from].result);
                self.stats.inserted += 1;
                self.stats.moved += 1;
            }
            Outcome::Inserted(Insertion::AlreadyPresent) => self.stats.duplicated += 1,
            Outcome::Inserted(Insertion::Shadowed { by }) => {
                debug!("{:?} for {:?} already makes {:?}",
                       rule.keys, rule.result, self.table.groups[by].result);
                self.stats.shadowed += 1;
            }
            Outcome::Rejected(_) => self.stats.rejected += 1,
        }

        outcome
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    #[cfg(test)]
    pub fn table(&self) -> &CompositionTable {
        &self.table
    }

    pub fn finish(self) -> CompositionTable {
        self.table
    }

    /// Validates, strips and folds the raw key names, then resolves them.
    /// The flag tells whether any dead key was folded.
    fn normalize(&self, keys: &[String]) -> Result<(KeySequence, bool), Rejection> {
        if let Some(key) = keys.iter().find(|k| UNICODE_KEY_REGEX.is_match(k)) {
            return Err(Rejection::UnicodeKey(key.clone()));
        }
        if let Some(key) = keys.iter().find(|k| self.profile.is_denied(k)) {
            return Err(Rejection::Denied(key.clone()));
        }

        let keys = match keys.split_first() {
            Some((first, rest)) if first == MULTI_KEY => rest,
            _ => keys,
        };

        let folded: Vec<&str> = keys.iter().map(|k| self.profile.fold_dead_key(k)).collect();
        let from_dead_key = folded.iter().zip(keys).any(|(f, k)| *f != k);

        let sequence = self.canonicalize(folded.into_iter())?;
        if sequence.is_empty() {
            return Err(Rejection::Empty);
        }
        Ok((sequence, from_dead_key))
    }

    fn canonicalize<'a, I>(&self, keys: I) -> Result<KeySequence, Rejection>
        where I: Iterator<Item = &'a str>
    {
        let resolver = self.resolver;
        let keys = keys.map(|name| {
            let resolved = resolver.keysym_from_name(name).and_then(|keysym| {
                match self.profile.canonicalization {
                    Canonicalization::Characters => {
                        resolver.keysym_to_char(keysym)
                                .filter(|&c| c != '\0')
                                .map(|c| c.to_string())
                    }
                    Canonicalization::Symbols => {
                        resolver.keysym_name(keysym)
                                .map(|n| format!("{}{}", SYMBOL_PREFIX, n))
                    }
                }
            });
            resolved.ok_or_else(|| Rejection::Unresolved(name.to_owned()))
        });
        keys.collect::<Result<Vec<_>, _>>().map(KeySequence)
    }
}

//}}}

#[cfg(test)]
use crate::keysym::KeysymTable;
#[cfg(test)]
use crate::profile::Format;

#[cfg(test)]
fn rule(keys: &[&str], result: &str) -> RawRule {
    RawRule {
        keys: keys.iter().map(|&k| k.to_owned()).collect(),
        result: result.to_owned(),
        code: None,
        description: format!("MAKES {}", result),
    }
}

#[cfg(test)]
fn assert_disjoint(table: &CompositionTable) {
    let mut seen = HashMap::new();
    for group in table.all_groups() {
        for sequence in &group.sequences {
            if let Some(other) = seen.insert(sequence.clone(), &group.result) {
                panic!("{:?} is under both {:?} and {:?}", sequence, other, group.result);
            }
        }
    }
}

#[test]
fn test_base_entry() {
    let keysyms = KeysymTable::builtin();
    let normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
    let table = normalizer.finish();

    let base = table.group("").unwrap();
    assert_eq!(base.description, "UBUNTU CYRCLE");
    let texts: Vec<_> = base.sequences.iter().map(|s| s.text()).collect();
    assert_eq!(texts, vec!["ubuntu", "circle", "((u))", "((o))"]);

    let normalizer = Normalizer::new(Format::Fixed.profile(), &keysyms);
    let table = normalizer.finish();
    assert_eq!(table.group("").unwrap().sequences[2].keys(),
               &["XK_parenleft", "XK_parenleft", "XK_u", "XK_parenright", "XK_parenright"]);
}

#[test]
fn test_dead_key_characters() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);

    let outcome = normalizer.feed(&rule(&["dead_grave", "a"], "à"));
    assert_eq!(outcome, Outcome::Inserted(Insertion::Added));

    let table = normalizer.finish();
    let group = table.group("à").unwrap();
    assert_eq!(group.sequences.len(), 1);
    assert_eq!(group.sequences[0].text(), "`a");
}

#[test]
fn test_dead_key_symbols() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Fixed.profile(), &keysyms);
    normalizer.feed(&rule(&["dead_grave", "a"], "à"));
    normalizer.feed(&rule(&["Multi_key", "dead_tilde", "dead_perispomeni"], "~"));

    let table = normalizer.finish();
    assert_eq!(table.group("à").unwrap().sequences[0].keys(), &["XK_grave", "XK_a"]);
    // Aliases come out under their canonical name.
    assert_eq!(table.group("~").unwrap().sequences[0].keys(),
               &["XK_asciitilde", "XK_dead_tilde"]);
}

#[test]
fn test_multi_key_is_dropped() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
    normalizer.feed(&rule(&["Multi_key", "o", "c"], "©"));
    assert_eq!(normalizer.feed(&rule(&["Multi_key"], "?")),
               Outcome::Rejected(Rejection::Empty));

    let table = normalizer.finish();
    assert_eq!(table.group("©").unwrap().sequences[0].text(), "oc");
    assert!(table.group("?").is_none());
}

#[test]
fn test_unicode_keys_are_rejected() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
    assert_eq!(normalizer.feed(&rule(&["Multi_key", "C", "U20AC"], "₠")),
               Outcome::Rejected(Rejection::UnicodeKey("U20AC".to_owned())));
    assert_eq!(normalizer.feed(&rule(&["U1F600", "a"], "x")),
               Outcome::Rejected(Rejection::UnicodeKey("U1F600".to_owned())));
    assert!(normalizer.table().group("₠").is_none());
    assert_eq!(normalizer.stats().rejected, 2);
}

#[test]
fn test_unresolved_keys_reject_whole_rule() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
    // Vendor keysyms are not in the stock keysymdef.h.
    assert_eq!(normalizer.feed(&rule(&["Multi_key", "hpmute_acute", "e"], "é")),
               Outcome::Rejected(Rejection::Unresolved("hpmute_acute".to_owned())));
    // Dead keys we do not fold have no character.
    assert_eq!(normalizer.feed(&rule(&["dead_hook", "a"], "ả")),
               Outcome::Rejected(Rejection::Unresolved("dead_hook".to_owned())));
    assert!(normalizer.table().group("é").is_none());
    assert!(normalizer.table().group("ả").is_none());
}

#[test]
fn test_denied_keys() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Variable.profile(), &keysyms);
    assert_eq!(normalizer.feed(&rule(&["Multi_key", "leftarrow", "bar"], "⇤")),
               Outcome::Rejected(Rejection::Denied("leftarrow".to_owned())));

    // The character table has no deny-list.
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
    assert_eq!(normalizer.feed(&rule(&["Multi_key", "leftarrow", "bar"], "⇤")),
               Outcome::Inserted(Insertion::Added));
}

#[test]
fn test_direct_rule_displaces_dead_key_rule() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);

    normalizer.feed(&rule(&["dead_acute", "space"], "'"));
    normalizer.feed(&rule(&["Multi_key", "acute", "space"], "´"));

    let table = normalizer.finish();
    assert_disjoint(&table);
    let sequence = KeySequence::from(&["´", " "][..]);
    assert_eq!(table.owner(&sequence), Some("´"));
    // The loser stays known but cannot be typed any more.
    assert!(table.group("'").unwrap().sequences.is_empty());
    assert!(table.groups().all(|g| g.result != "'"));
}

#[test]
fn test_dead_key_rule_does_not_displace() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);

    normalizer.feed(&rule(&["Multi_key", "asciicircum", "a"], "â"));
    let outcome = normalizer.feed(&rule(&["dead_circumflex", "a"], "ǎ"));
    assert_eq!(outcome, Outcome::Inserted(Insertion::Shadowed { by: 1 }));

    let table = normalizer.finish();
    assert_disjoint(&table);
    assert_eq!(table.owner(&KeySequence::from(&["^", "a"][..])), Some("â"));
    assert!(table.group("ǎ").is_none());
}

#[test]
fn test_later_direct_rule_wins_over_earlier_direct_rule() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);

    normalizer.feed(&rule(&["Multi_key", "o", "o"], "°"));
    let outcome = normalizer.feed(&rule(&["Multi_key", "o", "o"], "∞"));
    assert_eq!(outcome, Outcome::Inserted(Insertion::Moved { from: 1 }));

    let table = normalizer.finish();
    assert_eq!(table.owner(&KeySequence::from(&["o", "o"][..])), Some("∞"));
    assert!(table.group("°").unwrap().sequences.is_empty());
}

#[cfg(test)]
fn normalizer_stats_after(rules: &[RawRule]) -> Stats {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
    for r in rules {
        normalizer.feed(r);
    }
    normalizer.stats()
}

#[test]
fn test_same_result_keeps_order_and_first_description() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);

    let mut first = rule(&["Multi_key", "apostrophe", "e"], "é");
    first.code = Some("eacute".to_owned());
    normalizer.feed(&first);
    normalizer.feed(&rule(&["Multi_key", "e", "apostrophe"], "é"));
    normalizer.feed(&rule(&["dead_acute", "e"], "é"));
    assert_eq!(normalizer.feed(&rule(&["Multi_key", "apostrophe", "e"], "é")),
               Outcome::Inserted(Insertion::AlreadyPresent));

    let table = normalizer.finish();
    let group = table.group("é").unwrap();
    assert_eq!(group.description, "eacute | MAKES é");
    let texts: Vec<_> = group.sequences.iter().map(|s| s.text()).collect();
    assert_eq!(texts, vec!["'e", "e'", "´e"]);
}

#[test]
fn test_stats() {
    let stats = normalizer_stats_after(&[
        rule(&["Multi_key", "o", "o"], "°"),
        rule(&["Multi_key", "o", "o"], "∞"),
        rule(&["dead_abovering", "o"], "°"),
        rule(&["Multi_key", "o", "o"], "∞"),
        rule(&["U2200"], "∀"),
    ]);
    assert_eq!(stats, Stats {
        rules: 5,
        inserted: 3,
        moved: 1,
        duplicated: 1,
        shadowed: 0,
        rejected: 1,
    });
}

#[test]
fn test_max_sequence_len() {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(Format::Fixed.profile(), &keysyms);
    assert_eq!(normalizer.table().max_sequence_len(), 6);
    normalizer.feed(&rule(&["Multi_key", "parenleft", "1", "2", "3", "4", "5", "parenright"], "?"));
    assert_eq!(normalizer.table().max_sequence_len(), 7);
    assert_eq!(normalizer.table().sequence_count(), 5);
}

#[cfg(test)]
const DEAD_KEY_TEXT: &'static [(&'static str, &'static str)] = &[
    ("dead_grave", "`"), ("dead_acute", "´"), ("dead_circumflex", "^"),
];

#[cfg(test)]
const PLAIN_KEY_TEXT: &'static [(&'static str, &'static str)] = &[
    ("a", "a"), ("e", "e"), ("grave", "`"), ("acute", "´"), ("asciicircum", "^"),
];

#[test]
fn test_merge_policy_on_random_rules() {
    use proptest::prelude::{prop, prop_assert_eq, proptest};

    proptest!(|(rules in prop::collection::vec(
        (0..DEAD_KEY_TEXT.len() + 1, prop::collection::vec(0..PLAIN_KEY_TEXT.len(), 1..3), 0..4usize),
        0..40,
    ))| {
        let keysyms = KeysymTable::builtin();
        let mut normalizer = Normalizer::new(Format::Compact.profile(), &keysyms);
        // The last direct rule owns a sequence. Failing that, the first
        // dead-key rule does.
        let mut expected: HashMap<Vec<&str>, String> = HashMap::new();

        for (lead, plain, result) in rules {
            let result = result.to_string();
            let (mut keys, mut text, from_dead_key) = match DEAD_KEY_TEXT.get(lead) {
                Some(&(dead, t)) => (vec![dead], vec![t], true),
                None => (vec![MULTI_KEY], vec![], false),
            };
            for i in plain {
                keys.push(PLAIN_KEY_TEXT[i].0);
                text.push(PLAIN_KEY_TEXT[i].1);
            }
            normalizer.feed(&rule(&keys, &result));

            let owner = expected.entry(text).or_insert_with(|| result.clone());
            if !from_dead_key {
                *owner = result;
            }
        }

        let table = normalizer.finish();
        assert_disjoint(&table);
        for (text, result) in &expected {
            prop_assert_eq!(table.owner(&KeySequence::from(&text[..])), Some(&**result));
        }
    });
}
