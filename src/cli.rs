//! CLI: schema → (rust | raw node lookup) and one-shot source patches.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::codegen::Naming;
use crate::pipeline::{GenerateOptions, SchemaDocuments};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate Rust sources from an API schema (objects.json, methods.json, responses.json)
#[derive(Parser, Debug)]
#[command(name = "apigen", version, args_conflicts_with_subcommands = true)]
pub struct CommandLineInterface {
    /// print debug information
    #[arg(long, global = true)]
    debug: bool,

    /// defaults to `generate`
    #[command(subcommand)]
    cmd: Option<Command>,

    #[command(flatten)]
    generate: GenerateOut,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse the schema and emit Rust sources
    Generate(GenerateOut),
    /// print the raw schema node of one method
    #[command(alias = "m")]
    Method(Lookup),
    /// print the raw schema node of one object
    #[command(aliases = ["o", "obj"])]
    Object(Lookup),
    /// print the raw schema node of one response
    #[command(aliases = ["r", "resp"])]
    Response(Lookup),
    /// change the declared type of one struct field in a Rust source file
    Patch(PatchOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// directory holding objects.json, methods.json and responses.json
    #[arg(long, short = 's', default_value = ".")]
    schema_dir: PathBuf,
}

#[derive(Args, Debug)]
struct GenerateOut {
    #[command(flatten)]
    schema: SchemaSettings,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// keep schema identifiers as they are instead of converting case
    #[arg(long)]
    no_rename: bool,

    /// JSON patch manifest applied to the emitted source
    #[arg(long)]
    patches: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct Lookup {
    #[command(flatten)]
    schema: SchemaSettings,

    /// name of the entry to print
    name: String,
}

#[derive(Args, Debug)]
struct PatchOut {
    /// Rust source file to patch
    input: PathBuf,

    /// struct to patch
    #[arg(long)]
    declaration: String,

    /// field whose type is replaced
    #[arg(long)]
    field: String,

    /// new type expression, e.g. `Option<u64>`
    #[arg(long = "type")]
    ty: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn run(&self) -> Result<()> {
        if self.debug {
            tracing::debug!("{self:#?}");
        }
        match &self.cmd {
            None => generate(&self.generate),
            Some(Command::Generate(target)) => generate(target),
            Some(Command::Method(target)) => {
                let docs = SchemaDocuments::from_dir(&target.schema.schema_dir)?;
                let node = find_method(&docs.methods, &target.name).context("invalid method name")?;
                print_node(node)
            }
            Some(Command::Object(target)) => {
                let docs = SchemaDocuments::from_dir(&target.schema.schema_dir)?;
                let node = find_definition(&docs.objects, &target.name).context("invalid object name")?;
                print_node(node)
            }
            Some(Command::Response(target)) => {
                let docs = SchemaDocuments::from_dir(&target.schema.schema_dir)?;
                let node = find_definition(&docs.responses, &target.name).context("invalid response name")?;
                print_node(node)
            }
            Some(Command::Patch(target)) => {
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let patched = crate::patcher::set_field_type(&source, &target.declaration, &target.field, &target.ty)?;
                write_output(target.out.as_deref(), &patched)
            }
        }
    }
}

fn generate(target: &GenerateOut) -> Result<()> {
    let docs = SchemaDocuments::from_dir(&target.schema.schema_dir)?;
    let patches = match &target.patches {
        Some(path) => crate::manifest::load_patches(path)?,
        None => Vec::new(),
    };
    let options = GenerateOptions {
        naming: Naming { rename: !target.no_rename },
        patches,
    };
    let source = crate::pipeline::generate(&docs, &options)?;
    write_output(target.out.as_deref(), &source)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn find_method<'a>(methods: &'a Value, name: &str) -> Option<&'a Value> {
    methods
        .get("methods")?
        .as_array()?
        .iter()
        .find(|m| m.get("name").and_then(Value::as_str) == Some(name))
}

fn find_definition<'a>(document: &'a Value, name: &str) -> Option<&'a Value> {
    document.get("definitions")?.get(name)
}

fn print_node(node: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(node)?);
    Ok(())
}

fn write_output(out: Option<&Path>, source: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{source}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, source).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_subcommand_means_generate() {
        let cli = CommandLineInterface::try_parse_from(["apigen", "--debug", "-s", "vk", "--no-rename"]).unwrap();
        assert!(cli.debug());
        assert!(cli.cmd.is_none());
        assert_eq!(cli.generate.schema.schema_dir, PathBuf::from("vk"));
        assert!(cli.generate.no_rename);
    }

    #[test]
    fn parses_patch_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "apigen", "patch", "gen.rs", "--declaration", "UsersUser", "--field", "id", "--type", "u64",
        ])
        .unwrap();
        let Some(Command::Patch(p)) = cli.cmd else { panic!() };
        assert_eq!(p.declaration, "UsersUser");
        assert_eq!(p.ty, "u64");
    }

    #[test]
    fn lookup_aliases() {
        let cli = CommandLineInterface::try_parse_from(["apigen", "obj", "users_user", "-s", "schema"]).unwrap();
        let Some(Command::Object(l)) = cli.cmd else { panic!() };
        assert_eq!(l.name, "users_user");
        assert_eq!(l.schema.schema_dir, PathBuf::from("schema"));
    }

    #[test]
    fn finds_nodes() {
        let methods = json!({"methods": [{"name": "a.b"}, {"name": "c.d", "x": 1}]});
        assert_eq!(find_method(&methods, "c.d"), Some(&json!({"name": "c.d", "x": 1})));
        assert_eq!(find_method(&methods, "nope"), None);
        let objects = json!({"definitions": {"k": {"type": "string"}}});
        assert_eq!(find_definition(&objects, "k"), Some(&json!({"type": "string"})));
    }
}
