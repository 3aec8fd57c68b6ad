// render.rs: Render a composition table through a handlebars template.
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

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError};
use log::info;
use serde_json::{json, Value};

use crate::error::Result;
use crate::profile::VOID_SYMBOL_NAME;
use crate::table::{CompositionTable, Group};

//{{{ Escape

pub fn escape_c(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '"' {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Text safe to put after `//`. A trailing backslash would splice the next
/// line into the comment.
pub fn comment_c(s: &str) -> String {
    s.replace(|c: char| c == '\n' || c == '\r', " ")
     .trim_end_matches(|c: char| c == '\\' || c.is_whitespace())
     .to_owned()
}

#[cfg(test)]
fn unescape_c(s: &str) -> String {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref ESCAPE_REGEX: Regex = Regex::new(r#"\\([\\"])"#).unwrap();
    }
    ESCAPE_REGEX.replace_all(s, "$1").into_owned()
}

#[test]
fn test_escape_c() {
    assert_eq!(escape_c(r#"a"b\c"#), r#"a\"b\\c"#);
    assert_eq!(escape_c("àé"), "àé");
    assert_eq!(escape_c(""), "");
}

#[test]
fn test_comment_c() {
    assert_eq!(comment_c("REVERSE SOLIDUS"), "REVERSE SOLIDUS");
    assert_eq!(comment_c(r"backslash | ENDS WITH \"), "backslash | ENDS WITH");
    assert_eq!(comment_c(r"a\b \ "), r"a\b");
    assert_eq!(comment_c("two\nlines"), "two lines");
}

#[test]
fn test_escape_round_trip() {
    for s in &[r#"\"#, r#"""#, r#"\\""#, r#"a\"b"#, "plain", r#"\n"#, "“”"] {
        assert_eq!(unescape_c(&escape_c(s)), *s);
    }
}

//}}}

//{{{ Convert table to JSON for Handlebars.

fn group_to_json(group: &Group) -> Value {
    let sequences: Vec<Value> = group.sequences.iter().map(|s| {
        json!({ "keys": s.keys(), "text": s.text() })
    }).collect();
    json!({
        "result": group.result,
        "description": group.description,
        "sequences": sequences,
    })
}

/// Template data. `groups` holds one entry per typeable result, `rows` one
/// entry per (result, sequence) pair.
pub fn table_to_json(table: &CompositionTable, source: &str) -> Value {
    for group in table.all_groups().iter().filter(|g| g.sequences.is_empty()) {
        info!("No way to make {:?} ({})", group.result, group.description);
    }

    let groups: Vec<Value> = table.groups().map(group_to_json).collect();
    let rows: Vec<Value> = table.groups().flat_map(|group| {
        group.sequences.iter().map(move |s| json!({
            "keys": s.keys(),
            "text": s.text(),
            "result": group.result,
            "description": group.description,
        }))
    }).collect();
    let count = rows.len();

    json!({
        "source": source,
        "groups": groups,
        "rows": rows,
        "count": count,
        "max_symbols": table.max_sequence_len() + 1,
        "void_symbol": VOID_SYMBOL_NAME,
    })
}

//}}}

//{{{ Helpers

fn c_string_helper(helper: &Helper,
                   _: &Handlebars,
                   _: &Context,
                   _: &mut RenderContext,
                   out: &mut dyn Output) -> HelperResult {
    let input = helper.param(0)
                      .and_then(|p| p.value().as_str())
                      .ok_or_else(|| RenderError::new("c_string: string expected"))?;
    out.write("\"")?;
    out.write(&escape_c(input))?;
    out.write("\"")?;
    Ok(())
}

fn c_comment_helper(helper: &Helper,
                    _: &Handlebars,
                    _: &Context,
                    _: &mut RenderContext,
                    out: &mut dyn Output) -> HelperResult {
    let input = helper.param(0)
                      .and_then(|p| p.value().as_str())
                      .ok_or_else(|| RenderError::new("c_comment: string expected"))?;
    out.write(&comment_c(input))?;
    Ok(())
}

fn symbols_helper(helper: &Helper,
                  _: &Handlebars,
                  _: &Context,
                  _: &mut RenderContext,
                  out: &mut dyn Output) -> HelperResult {
    let keys = helper.param(0)
                     .and_then(|p| p.value().as_array())
                     .ok_or_else(|| RenderError::new("symbols: array expected"))?;
    out.write("{")?;
    for key in keys {
        let key = key.as_str().ok_or_else(|| RenderError::new("symbols: string expected"))?;
        out.write(key)?;
        out.write(", ")?;
    }
    out.write(VOID_SYMBOL_NAME)?;
    out.write("}")?;
    Ok(())
}

//}}}

pub fn render(template: &str, table: &CompositionTable, source: &str) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    handlebars.register_template_string("table", template)?;
    handlebars.register_helper("c_string", Box::new(c_string_helper));
    handlebars.register_helper("c_comment", Box::new(c_comment_helper));
    handlebars.register_helper("symbols", Box::new(symbols_helper));

    let data = table_to_json(table, source);
    Ok(handlebars.render("table", &data)?)
}

#[cfg(test)]
use crate::keysym::KeysymTable;
#[cfg(test)]
use crate::profile::Format;
#[cfg(test)]
use crate::rule::RawRule;
#[cfg(test)]
use crate::table::Normalizer;

#[cfg(test)]
fn build_table(format: Format, lines: &[&str]) -> CompositionTable {
    let keysyms = KeysymTable::builtin();
    let mut normalizer = Normalizer::new(format.profile(), &keysyms);
    for rule in lines.iter().filter_map(|l| RawRule::parse(l)) {
        normalizer.feed(&rule);
    }
    normalizer.finish()
}

#[test]
fn test_render_compact() {
    let table = build_table(Format::Compact, &[
        r#"<dead_grave> <a> : "à" agrave # LATIN SMALL LETTER A WITH GRAVE"#,
        r#"<Multi_key> <grave> <a> : "à" agrave # LATIN SMALL LETTER A WITH GRAVE"#,
        r#"<Multi_key> <slash> <slash> : "\\" backslash # REVERSE SOLIDUS"#,
        r#"<Multi_key> <quotedbl> <quotedbl> : "\"" quotedbl # QUOTATION MARK"#,
    ]);
    let output = render(Format::Compact.profile().template, &table, "Compose.pre").unwrap();

    assert!(output.contains("static const char* compose_map[] = {\n"));
    assert!(output.contains(
        "\"ubuntu\", \"circle\", \"((u))\", \"((o))\", \"::\", \"\", // UBUNTU CYRCLE\n"));
    assert!(output.contains("\"`a\", \"::\", \"à\", // agrave | LATIN SMALL LETTER A WITH GRAVE\n"));
    assert!(output.contains(r#""//", "::", "\\", // backslash | REVERSE SOLIDUS"#));
    assert!(output.contains(r#""\"\"", "::", "\"", // quotedbl | QUOTATION MARK"#));
    assert!(output.ends_with("\"\\0\" //NULL so we know when to end\n};\n"));
}

#[test]
fn test_render_fixed() {
    let table = build_table(Format::Fixed, &[
        r#"<dead_grave> <a> : "à" agrave # LATIN SMALL LETTER A WITH GRAVE"#,
        r#"<Multi_key> <o> <c> : "©" copyright # COPYRIGHT SIGN"#,
    ]);
    let output = render(Format::Fixed.profile().template, &table, "Compose.pre").unwrap();

    assert!(output.contains("const static unsigned int MAX_SYMBOLS = 7;"));
    assert!(output.contains("static const size_t COMPOSE_SEQUENCES_SIZE = 6;"));
    assert!(output.contains(
        "  { {XK_grave, XK_a, XK_VoidSymbol}, \"à\" }, // agrave | LATIN SMALL LETTER A WITH GRAVE\n"));
    assert!(output.contains("  { {XK_o, XK_c, XK_VoidSymbol}, \"©\" }, // copyright | COPYRIGHT SIGN\n"));
    assert!(!output.contains("NULL"));
}

#[test]
fn test_render_variable() {
    let table = build_table(Format::Variable, &[
        r#"<Multi_key> <o> <c> : "©" copyright # COPYRIGHT SIGN"#,
    ]);
    let output = render(Format::Variable.profile().template, &table, "Compose.pre").unwrap();

    assert!(!output.contains("MAX_SYMBOLS"));
    assert!(!output.contains("COMPOSE_SEQUENCES_SIZE"));
    assert!(output.contains("  { {XK_o, XK_c, XK_VoidSymbol}, \"©\" }, // copyright | COPYRIGHT SIGN\n"));
    assert!(output.contains("  { {XK_VoidSymbol}, NULL }\n};\n"));
}

#[test]
fn test_render_skips_results_without_sequences() {
    let table = build_table(Format::Compact, &[
        r#"<dead_acute> <space> : "'" apostrophe # APOSTROPHE"#,
        r#"<Multi_key> <acute> <space> : "´" acute # ACUTE ACCENT"#,
    ]);
    let output = render(Format::Compact.profile().template, &table, "Compose.pre").unwrap();

    assert!(!output.contains("APOSTROPHE"));
    assert!(output.contains("\"´ \", \"::\", \"´\", // acute | ACUTE ACCENT\n"));
}

#[test]
fn test_render_description_cannot_continue_comment() {
    for &format in &[Format::Compact, Format::Fixed, Format::Variable] {
        let table = build_table(format, &[
            r#"<Multi_key> <slash> <minus> : "⌿" U233F # APL FUNCTIONAL SYMBOL SLASH BAR \"#,
            r#"<Multi_key> <o> <c> : "©" copyright # COPYRIGHT SIGN"#,
        ]);
        let output = render(format.profile().template, &table, "Compose.pre").unwrap();
        assert!(output.contains("// U233F | APL FUNCTIONAL SYMBOL SLASH BAR\n"), "{}", output);
        assert!(output.lines().all(|l| !l.contains("//") || !l.ends_with('\\')));
    }
}

#[test]
fn test_render_custom_template() {
    let table = build_table(Format::Compact, &[]);
    let output = render("{{count}} from {{source}}{{#each rows}} {{c_string text}}{{/each}}",
                        &table, "x.pre").unwrap();
    assert_eq!(output, r#"4 from x.pre "ubuntu" "circle" "((u))" "((o))""#);
}

#[test]
fn test_render_bad_template() {
    let table = build_table(Format::Compact, &[]);
    assert!(render("{{#each rows}}", &table, "x.pre").is_err());
    assert!(render("{{no_such_field}}", &table, "x.pre").is_err());
}
