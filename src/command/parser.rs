//! Command parser
//!
//! ```text
//! create type   <table> <field_count> <pk_position> (<name> <type>)*
//! create record <table> <value>*
//! search record <table> <key>
//! delete record <table> <key>
//! ```
//!
//! Tokens are whitespace separated and keywords are case-insensitive.
//! Table names, field names and values are taken verbatim.

use crate::error::{HeapError, Result};
use crate::schema::TableDefinition;

use super::Command;

/// Parse one line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Command>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    if tokens.len() < 3 {
        return Err(malformed(line, "expected '<verb> <noun> <table> ...'"));
    }

    let verb = tokens[0].to_ascii_lowercase();
    let noun = tokens[1].to_ascii_lowercase();
    let table = tokens[2].to_string();
    let args = &tokens[3..];

    let command = match (verb.as_str(), noun.as_str()) {
        ("create", "type") => parse_create_type(line, table, args)?,
        ("create", "record") => Command::CreateRecord {
            table,
            values: args.iter().map(|s| s.to_string()).collect(),
        },
        ("search", "record") => Command::SearchRecord {
            table,
            key: single_key(line, args)?,
        },
        ("delete", "record") => Command::DeleteRecord {
            table,
            key: single_key(line, args)?,
        },
        _ => {
            return Err(malformed(
                line,
                &format!("unknown command '{} {}'", tokens[0], tokens[1]),
            ))
        }
    };

    Ok(Some(command))
}

fn parse_create_type(line: &str, name: String, args: &[&str]) -> Result<Command> {
    if args.len() < 2 {
        return Err(malformed(line, "expected field count and primary key position"));
    }

    let field_count = args[0]
        .parse::<usize>()
        .map_err(|_| malformed(line, &format!("invalid field count '{}'", args[0])))?;
    let primary_key_position = args[1]
        .parse::<usize>()
        .map_err(|_| malformed(line, &format!("invalid primary key position '{}'", args[1])))?;

    let pairs = &args[2..];
    if pairs.len() % 2 != 0 {
        return Err(malformed(line, "field names and types must come in pairs"));
    }

    let fields = pairs
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect();

    Ok(Command::CreateType(TableDefinition {
        name,
        field_count,
        primary_key_position,
        fields,
    }))
}

fn single_key(line: &str, args: &[&str]) -> Result<String> {
    match args {
        [key] => Ok(key.to_string()),
        _ => Err(malformed(line, "expected exactly one key")),
    }
}

fn malformed(line: &str, reason: &str) -> HeapError {
    HeapError::Command(format!("{}: {}", reason, line.trim()))
}
