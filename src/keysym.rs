// keysym.rs: Resolve X11 key names into keysyms and characters.
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
use std::collections::hash_map::Entry;
use std::io::{self, BufRead};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

pub type Keysym = u32;

#[cfg(test)]
const VOID_SYMBOL: Keysym = 0xff_ffff;

const UNICODE_KEYSYM_BASE: Keysym = 0x0100_0000;

const KP_SPACE: Keysym = 0xff80;
const KP_EQUAL: Keysym = 0xffbd;

/// The two lookups the table builder needs from the outside world. All of
/// them answer `None` for anything unknown.
pub trait KeysymResolver {
    fn keysym_from_name(&self, name: &str) -> Option<Keysym>;
    fn keysym_to_char(&self, keysym: Keysym) -> Option<char>;

    /// The canonical (first registered) name of a keysym.
    fn keysym_name(&self, keysym: Keysym) -> Option<&str>;
}

//{{{ KeysymTable

/// The stock `X11/keysymdef.h`, shipped with the crate so that every name
/// Compose.pre uses resolves without a running X server.
const BUILTIN_KEYSYMDEF: &'static str = include_str!("../data/keysymdef.h");

lazy_static! {
    static ref UNICODE_NAME_REGEX: Regex = Regex::new("^U([0-9A-Fa-f]{4,6})$").unwrap();
    static ref KEYSYMDEF_REGEX: Regex = Regex::new(
        r"^#define XK_([a-zA-Z0-9_]+)\s+0x([0-9a-fA-F]+)\s*(?:/\*\s*\(?U\+([0-9A-Fa-f]{4,6}))?"
    ).unwrap();
}

#[derive(Clone, Debug, Default)]
pub struct KeysymTable {
    by_name: HashMap<String, Keysym>,
    names: HashMap<Keysym, String>,
    chars: HashMap<Keysym, char>,
}

impl KeysymTable {
    pub fn builtin() -> Self {
        let mut table = KeysymTable::default();
        let count = BUILTIN_KEYSYMDEF.lines().filter(|line| table.define(line)).count();
        debug!("{} built-in keysym definitions", count);
        table
    }

    /// Adds a name. The first name given to a keysym stays its canonical
    /// name, and an existing name is never rebound.
    pub fn register(&mut self, name: &str, keysym: Keysym, chr: Option<char>) {
        if let Entry::Vacant(vac) = self.by_name.entry(name.to_owned()) {
            vac.insert(keysym);
        }
        self.names.entry(keysym).or_insert_with(|| name.to_owned());
        if let Some(c) = chr {
            self.chars.entry(keysym).or_insert(c);
        }
    }

    /// Extends the table from an `X11/keysymdef.h`. Returns the number of
    /// definitions read.
    pub fn load_keysymdef<R: BufRead>(&mut self, reader: R) -> io::Result<usize> {
        let mut count = 0;
        for line in reader.lines() {
            if self.define(&line?) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Registers one `#define XK_name 0x... /* U+XXXX ... */` line. Anything
    /// else is ignored.
    fn define(&mut self, line: &str) -> bool {
        let captures = match KEYSYMDEF_REGEX.captures(line) {
            Some(c) => c,
            None => return false,
        };
        let keysym = match Keysym::from_str_radix(&captures[2], 16) {
            Ok(k) => k,
            Err(_) => {
                debug!("keysym value out of range: {}", line);
                return false;
            }
        };
        let chr = captures.get(3)
                          .and_then(|ucs| u32::from_str_radix(ucs.as_str(), 16).ok())
                          .and_then(char::from_u32);
        self.register(&captures[1], keysym, chr);
        true
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }
}

impl KeysymResolver for KeysymTable {
    fn keysym_from_name(&self, name: &str) -> Option<Keysym> {
        if let Some(&keysym) = self.by_name.get(name) {
            return Some(keysym);
        }
        // Xlib accepts `U20AC` for any code point without a named keysym.
        let ucs = UNICODE_NAME_REGEX.captures(name)
                                    .and_then(|c| u32::from_str_radix(&c[1], 16).ok())?;
        if ucs <= 0x10_ffff {
            Some(UNICODE_KEYSYM_BASE + ucs)
        } else {
            None
        }
    }

    fn keysym_to_char(&self, keysym: Keysym) -> Option<char> {
        match keysym {
            0x20..=0x7e | 0xa0..=0xff => char::from_u32(keysym),
            // The keypad types the same characters as the main block.
            KP_SPACE => Some(' '),
            KP_EQUAL => Some('='),
            0xffaa..=0xffb9 => char::from_u32(keysym - 0xff80),
            k if k > UNICODE_KEYSYM_BASE && k <= UNICODE_KEYSYM_BASE + 0x10_ffff => {
                char::from_u32(k - UNICODE_KEYSYM_BASE)
            }
            k => self.chars.get(&k).copied(),
        }
    }

    fn keysym_name(&self, keysym: Keysym) -> Option<&str> {
        self.names.get(&keysym).map(|s| &**s)
    }
}

#[test]
fn test_builtin_latin1() {
    let table = KeysymTable::builtin();
    assert_eq!(table.keysym_from_name("a"), Some(0x61));
    assert_eq!(table.keysym_from_name("grave"), Some(0x60));
    assert_eq!(table.keysym_from_name("asciicircum"), Some(0x5e));
    assert_eq!(table.keysym_to_char(0x60), Some('`'));
    assert_eq!(table.keysym_to_char(0xe0), Some('à'));
    assert_eq!(table.keysym_from_name("no_such_key"), None);
}

#[test]
fn test_builtin_covers_every_script() {
    let table = KeysymTable::builtin();
    let char_of = |name| table.keysym_from_name(name).and_then(|k| table.keysym_to_char(k));
    assert_eq!(char_of("kana_SE"), Some('セ'));
    assert_eq!(char_of("ohorn"), Some('ơ'));
    assert_eq!(char_of("Uhorn"), Some('Ư'));
    assert_eq!(char_of("hebrew_aleph"), Some('א'));
    assert_eq!(char_of("Greek_alphaaccent"), Some('ά'));
    assert_eq!(char_of("EuroSign"), Some('€'));
}

#[test]
fn test_keypad_types_plain_characters() {
    let table = KeysymTable::builtin();
    let char_of = |name| table.keysym_from_name(name).and_then(|k| table.keysym_to_char(k));
    assert_eq!(char_of("KP_1"), Some('1'));
    assert_eq!(char_of("KP_0"), Some('0'));
    assert_eq!(char_of("KP_Divide"), Some('/'));
    assert_eq!(char_of("KP_Multiply"), Some('*'));
    assert_eq!(char_of("KP_Space"), Some(' '));
    assert_eq!(char_of("KP_Equal"), Some('='));
    assert_eq!(char_of("KP_Enter"), None);
    assert_eq!(table.keysym_name(0xffb1), Some("KP_1"));
}

#[test]
fn test_builtin_mapped() {
    let table = KeysymTable::builtin();
    let caron = table.keysym_from_name("caron").unwrap();
    assert_eq!(table.keysym_to_char(caron), Some('ˇ'));
    let iota = table.keysym_from_name("Greek_iota").unwrap();
    assert_eq!(table.keysym_to_char(iota), Some('ι'));
    let zhe = table.keysym_from_name("Cyrillic_ZHE").unwrap();
    assert_eq!(table.keysym_to_char(zhe), Some('Ж'));
}

#[test]
fn test_dead_keys_have_no_char() {
    let table = KeysymTable::builtin();
    let dead_grave = table.keysym_from_name("dead_grave").unwrap();
    assert_eq!(dead_grave, 0xfe50);
    assert_eq!(table.keysym_to_char(dead_grave), None);
    assert_eq!(table.keysym_to_char(VOID_SYMBOL), None);
}

#[test]
fn test_canonical_name_is_first_alias() {
    let table = KeysymTable::builtin();
    let perispomeni = table.keysym_from_name("dead_perispomeni").unwrap();
    assert_eq!(table.keysym_name(perispomeni), Some("dead_tilde"));
    let lambda = table.keysym_from_name("Greek_LAMBDA").unwrap();
    assert_eq!(table.keysym_name(lambda), Some("Greek_LAMDA"));
}

#[test]
fn test_unicode_names() {
    let table = KeysymTable::builtin();
    assert_eq!(table.keysym_from_name("U20AC"), Some(0x10020ac));
    assert_eq!(table.keysym_to_char(0x10020ac), Some('€'));
    assert_eq!(table.keysym_from_name("U110000"), None);
    assert_eq!(table.keysym_from_name("U12"), None);
}

#[test]
fn test_load_keysymdef() {
    let keysymdef = "\
#define XK_BackSpace                     0xff08  /* Back space, back char */
#define XK_Abreve                        0x01c3  /* U+0102 LATIN CAPITAL LETTER A WITH BREVE */
#define XK_ohorn                      0x10001a1  /* U+01A1 LATIN SMALL LETTER O WITH HORN */
#define XK_Greek_IOTAdieresis            0x07a5  /* U+03AA GREEK CAPITAL LETTER IOTA WITH DIALYTIKA */
#define XK_Greek_IOTAdiaeresis           0x07a5  /* old typo */
/* comments are ignored */
";
    let mut table = KeysymTable::default();
    assert_eq!(table.load_keysymdef(keysymdef.as_bytes()).unwrap(), 5);

    assert_eq!(table.keysym_from_name("BackSpace"), Some(0xff08));
    assert_eq!(table.keysym_to_char(0xff08), None);
    assert_eq!(table.keysym_to_char(0x1c3), Some('Ă'));
    assert_eq!(table.keysym_to_char(0x10001a1), Some('ơ'));
    assert_eq!(table.keysym_from_name("Greek_IOTAdiaeresis"), Some(0x7a5));
    assert_eq!(table.keysym_name(0x7a5), Some("Greek_IOTAdieresis"));
    assert_eq!(table.keysym_to_char(0x7a5), Some('Ϊ'));
}

//}}}
