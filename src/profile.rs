// profile.rs: The output variants and the static tables each one uses.
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

use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Compact,
    Fixed,
    Variable,
}

/// What a key turns into inside a sequence.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Canonicalization {
    /// The character the key types.
    Characters,
    /// The keysym name, prefixed with `XK_`.
    Symbols,
}

#[derive(Clone, Copy, Debug)]
pub struct Profile {
    pub canonicalization: Canonicalization,
    pub deny_list: &'static [&'static str],
    pub dead_keys: &'static [(&'static str, &'static str)],
    pub template: &'static str,
}

pub const MULTI_KEY: &'static str = "Multi_key";

pub const SYMBOL_PREFIX: &'static str = "XK_";

/// Ends every row of the symbol tables.
pub const VOID_SYMBOL_NAME: &'static str = "XK_VoidSymbol";

pub const DEAD_KEYS: &'static [(&'static str, &'static str)] = &[
    ("dead_grave", "grave"),
    ("dead_acute", "acute"),
    ("dead_circumflex", "asciicircum"),
    ("dead_tilde", "asciitilde"),
    ("dead_macron", "macron"),
    ("dead_breve", "breve"),
    ("dead_abovedot", "abovedot"),
    ("dead_diaeresis", "diaeresis"),
    ("dead_abovering", "degree"),
    ("dead_doubleacute", "doubleacute"),
    ("dead_caron", "caron"),
    ("dead_cedilla", "cedilla"),
    ("dead_ogonek", "ogonek"),
    ("dead_stroke", "slash"),
    ("dead_iota", "Greek_iota"),
    ("dead_belowcomma", "comma"),
    ("dead_currency", "currency"),
];

// Keys that type different things depending on the layout or locale.
pub const SYMBOL_DENY_LIST: &'static [&'static str] = &[
    "dead_a", "dead_A", "dead_e", "dead_E", "dead_i", "dead_I",
    "dead_o", "dead_O", "dead_u", "dead_U",
    "dead_small_schwa", "dead_capital_schwa",
    "dead_doublegrave", "dead_invertedbreve",
    "dead_greek",
    "lessthanequal", "greaterthanequal", "notequal",
    "underbar",
    "leftarrow", "rightarrow", "uparrow", "downarrow",
];

/// The entry every table starts with, spelled as key names.
pub const BASE_RESULT: &'static str = "";
pub const BASE_DESCRIPTION: &'static str = "UBUNTU CYRCLE";
pub const BASE_SEQUENCES: &'static [&'static [&'static str]] = &[
    &["u", "b", "u", "n", "t", "u"],
    &["c", "i", "r", "c", "l", "e"],
    &["parenleft", "parenleft", "u", "parenright", "parenright"],
    &["parenleft", "parenleft", "o", "parenright", "parenright"],
];

const COMPACT_TEMPLATE: &'static str = include_str!("../templates/compact.c.hbs");
const FIXED_TEMPLATE: &'static str = include_str!("../templates/fixed.h.hbs");
const VARIABLE_TEMPLATE: &'static str = include_str!("../templates/variable.h.hbs");

impl Format {
    pub fn profile(self) -> Profile {
        match self {
            Format::Compact => Profile {
                canonicalization: Canonicalization::Characters,
                deny_list: &[],
                dead_keys: DEAD_KEYS,
                template: COMPACT_TEMPLATE,
            },
            Format::Fixed => Profile {
                canonicalization: Canonicalization::Symbols,
                deny_list: SYMBOL_DENY_LIST,
                dead_keys: DEAD_KEYS,
                template: FIXED_TEMPLATE,
            },
            Format::Variable => Profile {
                canonicalization: Canonicalization::Symbols,
                deny_list: SYMBOL_DENY_LIST,
                dead_keys: DEAD_KEYS,
                template: VARIABLE_TEMPLATE,
            },
        }
    }
}

impl Profile {
    pub fn is_denied(&self, key: &str) -> bool {
        self.deny_list.contains(&key)
    }

    /// The plain key a dead key stands for, if it is one we fold.
    pub fn fold_dead_key<'a>(&self, key: &'a str) -> &'a str {
        match self.dead_keys.iter().find(|&&(dead, _)| dead == key) {
            Some(&(_, base)) => base,
            None => key,
        }
    }
}

#[test]
fn test_fold_dead_key() {
    let profile = Format::Compact.profile();
    assert_eq!(profile.fold_dead_key("dead_grave"), "grave");
    assert_eq!(profile.fold_dead_key("dead_abovering"), "degree");
    assert_eq!(profile.fold_dead_key("dead_iota"), "Greek_iota");
    assert_eq!(profile.fold_dead_key("dead_hook"), "dead_hook");
    assert_eq!(profile.fold_dead_key("a"), "a");
}

#[test]
fn test_deny_lists() {
    assert!(!Format::Compact.profile().is_denied("dead_greek"));
    assert!(Format::Fixed.profile().is_denied("dead_greek"));
    assert!(Format::Variable.profile().is_denied("leftarrow"));
    assert!(!Format::Variable.profile().is_denied("dead_grave"));
}
