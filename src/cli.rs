//! Minimal CLI: parse | check | registers
use std::path::{Path, PathBuf};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, Args};
use colored::Colorize;
use serde_json::Value;
use tracing::info;

use crate::registers::{Annotator, Register};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode DSDL type strings into editor descriptors and validate register values against them
#[derive(Parser, Debug)]
#[command(name = "dsdl-types")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode one or more type strings and print their descriptors
    Parse(ParseOut),
    /// coerce a value against a type string and print the normalized value
    Check(CheckOut),
    /// annotate register metadata payloads with editor descriptors
    Registers(RegistersOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/registers)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ParseOut {
    /// type strings, e.g. "saturated uint8[<=4]"
    #[arg(required = true)]
    types: Vec<String>,

    /// print the canonical type string instead of the JSON descriptor
    #[arg(long)]
    canonical: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    /// type string the value must fit
    type_name: String,

    /// value as JSON (`[1,2]`, `true`, `3`) or raw editor text
    value: String,
}

#[derive(clap::Parser, Debug)]
struct RegistersOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(Value) -> anyhow::Result<()>) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            for json_value in self.documents(&source, &source_path_str)? {
                let json_value = match self.json_pointer.as_deref() {
                    None => json_value,
                    Some(ptr) => json_value.pointer(ptr).cloned().with_context(|| {
                        format!("JSON pointer {ptr} matched nothing in {source_path_str}")
                    })?,
                };
                match self.jq_expr.as_deref() {
                    None => apply(json_value)?,
                    Some(jq_expr) => {
                        let selected = crate::select::run(jq_expr, &json_value).with_context(|| {
                            format!("failed to apply jq expression to source file ({source_path_str})")
                        })?;
                        for json_value in selected {
                            apply(json_value)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn documents(&self, source: &str, source_path_str: &str) -> anyhow::Result<Vec<Value>> {
        if !self.ndjson {
            let doc = serde_json::from_str::<Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            return Ok(vec![doc]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(ix, line)| {
                serde_json::from_str::<Value>(line).with_context(|| {
                    format!("failed to parse NDJSON line {} ({source_path_str})", ix + 1)
                })
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` when some input failed to decode but the run completed.
    pub fn run(&self) -> anyhow::Result<bool> {
        match &self.cmd {
            Command::Parse(target) => {
                let mut all_ok = true;
                let mut decoded = Vec::new();
                for raw in &target.types {
                    match crate::parser::parse(raw) {
                        Ok(desc) => decoded.push(desc),
                        Err(error) => {
                            all_ok = false;
                            eprintln!("{} {raw:?}: {error}", "error".red().bold());
                        }
                    }
                }
                if target.canonical {
                    for desc in &decoded {
                        println!("{desc}");
                    }
                } else {
                    println!("{}", serde_json::to_string_pretty(&decoded)?);
                }
                Ok(all_ok)
            }
            Command::Check(target) => {
                let desc = crate::parser::parse(&target.type_name)
                    .with_context(|| format!("invalid type string {:?}", target.type_name))?;
                // JSON first, raw editor text otherwise
                let result = match serde_json::from_str::<Value>(&target.value) {
                    Ok(json) => crate::value::coerce(&desc, &json),
                    Err(_) => crate::value::coerce_text(&desc, &target.value),
                };
                match result {
                    Ok(value) => {
                        eprintln!("{} {}", "ok".green().bold(), desc);
                        println!("{}", serde_json::to_string(&value)?);
                        Ok(true)
                    }
                    Err(error) => {
                        eprintln!("{} {error}", "rejected".red().bold());
                        Ok(false)
                    }
                }
            }
            Command::Registers(target) => {
                let mut registers: Vec<Register> = Vec::new();
                target.input_settings.load_process(|doc| {
                    registers.extend(crate::registers::decode_document(doc)?);
                    Ok(())
                })?;
                info!(count = registers.len(), "loaded registers");

                let mut annotator = Annotator::new();
                let editors = annotator.annotate(&registers);
                let failed = editors.values().filter(|e| e.decode_error.is_some()).count();
                if failed > 0 {
                    eprintln!(
                        "{} {failed} of {} registers have undecodable types",
                        "warning".yellow().bold(),
                        editors.len()
                    );
                }

                let out_src = serde_json::to_string_pretty(&editors)?;
                match target.out.as_ref() {
                    Some(out) => write_output(out, &out_src)?,
                    None => println!("{out_src}"),
                }
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
