use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const TEST_COMPOSE_FILE: &'static str = r#"

XCOMM These comments should be ignored.
XCOMM
include "%L"

XCOMM keypad keys type the same characters as the main block:
<Multi_key> <asciicircum> <1>           : "¹"   onesuperior # SUPERSCRIPT ONE
<Multi_key> <asciicircum> <KP_2>        : "²"   twosuperior # SUPERSCRIPT TWO
<dead_circumflex> <3>                   : "³"   threesuperior # SUPERSCRIPT THREE

XCOMM the same sequence twice for the same result:
<dead_grave> <a>                        : "à"   agrave # LATIN SMALL LETTER A WITH GRAVE
<Multi_key> <grave> <a>                 : "à"   agrave # LATIN SMALL LETTER A WITH GRAVE

<Multi_key> <c> <s>                     : "š"   U0161 # LATIN SMALL LETTER S WITH CARON
<Multi_key> <C> <equal>                 : "€"   EuroSign # EURO SIGN

XCOMM raw code points are not supported:
<Multi_key> <C> <U20AC>                 : "₠"   U20A0 # EURO-CURRENCY SIGN

XCOMM the direct rule takes the sequence away from the dead key rule:
<dead_acute> <space>                    : "'"   apostrophe # APOSTROPHE
<Multi_key> <acute> <space>             : "´"   acute # ACUTE ACCENT

XCOMM vendor keysyms are only known through --keysymdef:
<Multi_key> <hpmute_acute> <e>          : "é"   eacute # LATIN SMALL LETTER E WITH ACUTE

XCOMM leave backslash intact:
<Multi_key> <slash> <slash>             : "\\"  backslash # REVERSE SOLIDUS

XCOMM denied in the symbol tables only:
<Multi_key> <leftarrow> <bar>           : "⇤"   U21E4 # LEFTWARDS ARROW TO BAR

XCOMM no description, not a rule:
<Multi_key> <A> <B> <C> <D> : "ABCDEFGHIJKLMNOPQRSTUVWXYZ"
"#;

fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("Compose.pre");
    fs::write(&path, content).unwrap();
    path
}

fn invoke(args: &[&Path], flags: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_compose_seqs"))
        .args(flags)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn generate(content: &str, flags: &[&str]) -> String {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, content);
    let output = dir.path().join("out.c");

    let result = invoke(&[input.as_path(), output.as_path()], flags);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    fs::read_to_string(&output).unwrap()
}

#[test]
fn test_compact() {
    let output = generate(TEST_COMPOSE_FILE, &[]);

    let expected_lines = [
        r#""ubuntu", "circle", "((u))", "((o))", "::", "", // UBUNTU CYRCLE"#,
        r#""^1", "::", "¹", // onesuperior | SUPERSCRIPT ONE"#,
        r#""^2", "::", "²", // twosuperior | SUPERSCRIPT TWO"#,
        r#""^3", "::", "³", // threesuperior | SUPERSCRIPT THREE"#,
        r#""`a", "::", "à", // agrave | LATIN SMALL LETTER A WITH GRAVE"#,
        r#""cs", "::", "š", // U0161 | LATIN SMALL LETTER S WITH CARON"#,
        r#""C=", "::", "€", // EuroSign | EURO SIGN"#,
        r#""´ ", "::", "´", // acute | ACUTE ACCENT"#,
        r#""//", "::", "\\", // backslash | REVERSE SOLIDUS"#,
        r#""←|", "::", "⇤", // U21E4 | LEFTWARDS ARROW TO BAR"#,
        r#""\0" //NULL so we know when to end"#,
    ];
    let lines: Vec<&str> = output.lines().filter(|l| l.starts_with('"')).collect();
    assert_eq!(lines, expected_lines);

    assert!(!output.contains("é"));
    assert!(!output.contains("₠"));
    assert!(!output.contains("APOSTROPHE"));
    assert!(!output.contains("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
}

#[test]
fn test_fixed() {
    let output = generate(TEST_COMPOSE_FILE, &["--format", "fixed"]);

    assert!(output.contains("const static unsigned int MAX_SYMBOLS = 7;\n"));
    assert!(output.contains("static const size_t COMPOSE_SEQUENCES_SIZE = 12;\n"));
    assert!(output.contains(
        "  { {XK_asciicircum, XK_1, XK_VoidSymbol}, \"¹\" }, // onesuperior | SUPERSCRIPT ONE\n"));
    assert!(output.contains(
        "  { {XK_asciicircum, XK_KP_2, XK_VoidSymbol}, \"²\" }, // twosuperior | SUPERSCRIPT TWO\n"));
    assert!(output.contains(
        "  { {XK_grave, XK_a, XK_VoidSymbol}, \"à\" }, // agrave | LATIN SMALL LETTER A WITH GRAVE\n"));
    assert!(output.contains(
        "  { {XK_acute, XK_space, XK_VoidSymbol}, \"´\" }, // acute | ACUTE ACCENT\n"));
    assert!(output.contains(
        "  { {XK_slash, XK_slash, XK_VoidSymbol}, \"\\\\\" }, // backslash | REVERSE SOLIDUS\n"));
    assert!(!output.contains("⇤"));
    assert!(!output.contains("U20AC"));
}

#[test]
fn test_variable() {
    let output = generate(TEST_COMPOSE_FILE, &["--format", "variable"]);

    assert!(!output.contains("MAX_SYMBOLS"));
    assert!(output.contains(
        "  { {XK_C, XK_equal, XK_VoidSymbol}, \"€\" }, // EuroSign | EURO SIGN\n"));
    assert!(output.ends_with("  { {XK_VoidSymbol}, NULL }\n};\n"));
}

#[test]
fn test_empty_input() {
    let output = generate("", &[]);
    let lines: Vec<&str> = output.lines().filter(|l| l.starts_with('"')).collect();
    assert_eq!(lines, [
        r#""ubuntu", "circle", "((u))", "((o))", "::", "", // UBUNTU CYRCLE"#,
        r#""\0" //NULL so we know when to end"#,
    ]);
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("no-such-Compose.pre");
    let output = dir.path().join("out.c");

    let result = invoke(&[input.as_path(), output.as_path()], &[]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("no-such-Compose.pre"));
    assert!(!output.exists());
}

#[test]
fn test_custom_template() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("table.hbs");
    fs::write(&template, "{{#each rows}}{{text}}={{result}};{{/each}}").unwrap();

    let output = generate(r#"<Multi_key> <o> <c> : "©" copyright # COPYRIGHT SIGN"#,
                          &["--template", template.to_str().unwrap()]);
    assert_eq!(output, "ubuntu=;circle=;((u))=;((o))=;oc=©;");
}

#[test]
fn test_keysymdef() {
    let dir = TempDir::new().unwrap();
    let keysymdef = dir.path().join("keysymdef.h");
    fs::write(&keysymdef,
              "#define XK_hpmute_acute                0x100000a8  /* (U+00B4 ACUTE ACCENT) */\n")
        .unwrap();

    let output = generate(TEST_COMPOSE_FILE, &["--keysymdef", keysymdef.to_str().unwrap()]);
    assert!(output.contains(r#""´e", "::", "é", // eacute | LATIN SMALL LETTER E WITH ACUTE"#));
    // The stock definitions are still there.
    assert!(output.contains(r#""^2", "::", "²", // twosuperior | SUPERSCRIPT TWO"#));
}
