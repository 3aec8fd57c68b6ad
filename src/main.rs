// compose_seqs.rs: Generate a static compose-sequence table from Compose.pre.
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

mod error;
mod keysym;
mod profile;
mod render;
mod rule;
mod table;

use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use docopt::Docopt;
use log::{error, info};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::keysym::KeysymTable;
use crate::profile::Format;
use crate::rule::RawRule;
use crate::table::{CompositionTable, Normalizer};

const USAGE: &'static str = "
Usage: compose_seqs [options] <input> [<output>]
       compose_seqs --help

Convert an X11 Compose.pre file into a static table of compose sequences. The
output defaults to parsed_keys.c in the system temporary directory.

    compose_seqs /path/Compose.pre [/path/output_file.c]

Set RUST_LOG=debug to see why each rule was skipped.

Options:
    -f FORMAT, --format FORMAT      Output format, one of compact, fixed or
                                    variable [default: compact].
    -t TEMPLATE, --template TEMPLATE
                                    Handlebars template to use instead of the
                                    built-in one for the format.
    -k FILE, --keysymdef FILE       Read extra key names from an X11
                                    keysymdef.h.
    -h, --help                      Show this message.
";

const DEFAULT_OUTPUT: &'static str = "parsed_keys.c";

#[derive(Debug, Deserialize)]
struct Args {
    arg_input: PathBuf,
    arg_output: Option<PathBuf>,
    flag_format: Format,
    flag_template: Option<PathBuf>,
    flag_keysymdef: Option<PathBuf>,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| Error::Read {
        path: path.to_owned(),
        source: e,
    })
}

fn load_keysyms(keysymdef: Option<&Path>) -> Result<KeysymTable> {
    let mut keysyms = KeysymTable::builtin();
    if let Some(path) = keysymdef {
        let count = keysyms.load_keysymdef(open(path)?).map_err(|e| Error::Read {
            path: path.to_owned(),
            source: e,
        })?;
        info!("Read {} keysyms from {}, {} names known", count, path.display(), keysyms.len());
    }
    Ok(keysyms)
}

/// Runs every line of the input through the normalizer. The file is closed
/// before this returns.
fn build_table(input: &Path, format: Format, keysyms: &KeysymTable) -> Result<CompositionTable> {
    let reader = open(input)?;
    let mut normalizer = Normalizer::new(format.profile(), keysyms);

    for line in reader.lines() {
        let line = line.map_err(|e| Error::Read {
            path: input.to_owned(),
            source: e,
        })?;
        if let Some(rule) = RawRule::parse(&line) {
            normalizer.feed(&rule);
        }
    }

    let stats = normalizer.stats();
    info!("{} rules: {} sequences added ({} taken over), {} duplicated, \
           {} shadowed by a non-dead-key rule, {} unsupported",
          stats.rules, stats.inserted, stats.moved, stats.duplicated,
          stats.shadowed, stats.rejected);

    Ok(normalizer.finish())
}

fn run(args: Args) -> Result<()> {
    let input = args.arg_input;
    if !input.exists() {
        return Err(Error::MissingInput(input));
    }
    let output = args.arg_output.unwrap_or_else(|| env::temp_dir().join(DEFAULT_OUTPUT));

    info!("Parsing {}, saving it to {}...", input.display(), output.display());

    let keysyms = load_keysyms(args.flag_keysymdef.as_deref())?;
    let table = build_table(&input, args.flag_format, &keysyms)?;

    let template = match args.flag_template {
        Some(ref path) => fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.clone(),
            source: e,
        })?,
        None => args.flag_format.profile().template.to_owned(),
    };
    let rendered = render::render(&template, &table, &input.display().to_string())?;

    let write_error = |e: io::Error| Error::Write {
        path: output.clone(),
        source: e,
    };
    let mut out = File::create(&output).map_err(write_error)?;
    out.write_all(rendered.as_bytes()).map_err(write_error)?;

    info!("Wrote {} sequences for {} results", table.sequence_count(), table.groups().count());
    Ok(())
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}
