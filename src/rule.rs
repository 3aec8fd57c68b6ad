// rule.rs: Extract compose rules from the lines of Compose.pre.
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

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

lazy_static! {
    static ref LINE_REGEX: Regex = Regex::new(
        r#"^(?P<keybinding><[^:]+)\s*:\s*"(\\)?(?P<result>.*)"\s*(?P<code>\S+)?\s*#\s*(?P<desc>.+)"#
    ).unwrap();
    static ref KEY_REGEX: Regex = Regex::new("<([^>]+)>").unwrap();
}

/// One `<keys> : "result" code # description` line, as written.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RawRule {
    pub keys: Vec<String>,
    pub result: String,
    pub code: Option<String>,
    pub description: String,
}

impl RawRule {
    /// Returns `None` for anything that is not a compose rule: comments,
    /// blank lines, `include` directives and malformed entries.
    pub fn parse(line: &str) -> Option<RawRule> {
        let captures = LINE_REGEX.captures(line)?;

        let keybinding = &captures["keybinding"];
        let keys: Vec<String> = KEY_REGEX.captures_iter(keybinding)
                                         .map(|c| c[1].to_owned())
                                         .collect();
        if keys.is_empty() {
            warn!("Error while matching keybinding in line\n\t{}", line);
            return None;
        }

        Some(RawRule {
            keys,
            result: captures["result"].to_owned(),
            code: captures.name("code").map(|m| m.as_str().to_owned()),
            description: captures["desc"].trim_end().to_owned(),
        })
    }

    /// The description as it appears in the generated table.
    pub fn full_description(&self) -> String {
        match self.code {
            Some(ref code) => format!("{} | {}", code, self.description),
            None => self.description.clone(),
        }
    }
}

#[test]
fn test_parse_rule() {
    let rule = RawRule::parse(
        r#"<dead_grave> <a>                 : "à"   agrave # LATIN SMALL LETTER A WITH GRAVE"#
    ).unwrap();
    assert_eq!(rule, RawRule {
        keys: vec!["dead_grave".to_owned(), "a".to_owned()],
        result: "à".to_owned(),
        code: Some("agrave".to_owned()),
        description: "LATIN SMALL LETTER A WITH GRAVE".to_owned(),
    });
    assert_eq!(rule.full_description(), "agrave | LATIN SMALL LETTER A WITH GRAVE");
}

#[test]
fn test_parse_rule_without_code() {
    let rule = RawRule::parse(
        r#"<Multi_key> <c> <s> <A> : "А̏" # CYRILLIC CAPITAL LETTER A WITH COMBINING DOUBLE GRAVE ACCENT"#
    ).unwrap();
    assert_eq!(rule.keys, vec!["Multi_key", "c", "s", "A"]);
    assert_eq!(rule.code, None);
    assert_eq!(rule.full_description(),
               "CYRILLIC CAPITAL LETTER A WITH COMBINING DOUBLE GRAVE ACCENT");
}

#[test]
fn test_parse_escaped_result() {
    let rule = RawRule::parse(r#"<Multi_key> <slash> <slash> : "\\" backslash # REVERSE SOLIDUS"#).unwrap();
    assert_eq!(rule.result, "\\");

    let rule = RawRule::parse(r#"<Multi_key> <quotedbl> <quotedbl> : "\"" quotedbl # QUOTATION MARK"#).unwrap();
    assert_eq!(rule.result, "\"");
}

#[test]
fn test_parse_ignores_non_rules() {
    assert_eq!(RawRule::parse(""), None);
    assert_eq!(RawRule::parse("XCOMM <Multi_key> <a> : \"b\" # comment"), None);
    assert_eq!(RawRule::parse("include \"%L\""), None);
    // No description.
    assert_eq!(RawRule::parse(r#"<Multi_key> <a> <b> : "c""#), None);
    // Bracket without a key name.
    assert_eq!(RawRule::parse(r#"<<  : "c" # NOTHING"#), None);
}

#[test]
fn test_parse_is_repeatable() {
    let line = r#"<Multi_key> <o> <c> : "©" copyright # COPYRIGHT SIGN"#;
    assert_eq!(RawRule::parse(line), RawRule::parse(line));
}
