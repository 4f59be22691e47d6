//! Parser for one-line `deb` declarations.
//!
//! ```text
//! deb [key=value ...] <url> <suite> <component> ...
//! deb [key=value ...] <url> /
//! ```

use std::collections::BTreeMap;

use winnow::ascii::multispace0;
use winnow::combinator::{delimited, opt, preceded};
use winnow::prelude::*;
use winnow::token::{rest, take_till};

use crate::error::{Error, Result};
use crate::repository::{Repository, FLAT_MARKER};

/// Line prefix of a binary package repository declaration.
pub(crate) const DEB_PREFIX: &str = "deb ";

/// Backend tag given to every record parsed from a `deb` line.
pub const DEB_KIND: &str = "apt-deb";

/// The three raw parts of a declaration body, after the `deb ` prefix.
#[derive(Debug, PartialEq, Eq)]
struct Declaration<'s> {
    options: Option<&'s str>,
    url: &'s str,
    tail: &'s str,
}

/// Parse a trimmed line into a [`Repository`].
pub(crate) fn parse_line(line: &str) -> Result<Repository> {
    let mut repo = Repository::default();
    let Some(body) = line.strip_prefix(DEB_PREFIX) else {
        return Ok(repo);
    };
    repo.kind = DEB_KIND.to_string();

    let decl = parse_declaration
        .parse(body.trim())
        .map_err(|e| Error::InvalidDeclaration(format!("{e}")))?;

    if let Some(options) = decl.options {
        repo.attrs = parse_options(options)?;
    }
    repo.url = decl.url.to_string();

    if decl.tail == FLAT_MARKER {
        repo.is_flat = true;
        repo.name = flat_name(&repo.url);
        return Ok(repo);
    }

    let mut tokens = decl.tail.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(name), Some(first)) => {
            repo.name = name.to_string();
            repo.components = std::iter::once(first)
                .chain(tokens)
                .map(|s| s.to_string())
                .collect();
            Ok(repo)
        }
        _ => Err(Error::InvalidDeclaration(format!(
            "expected a suite and at least one component after {}",
            decl.url
        ))),
    }
}

/// Derive a repository name from the URL of a flat repository.
///
/// The scheme is dropped, `/` and `.` become `_`, the result is lowercased,
/// trimmed of `_` and stripped of `:`.
///
/// # Examples
///
/// ```
/// use apt_repofind::flat_name;
///
/// assert_eq!(flat_name("http://archive.example.com/debian"), "archive_example_com_debian");
/// assert_eq!(flat_name("http://LocalHost:8000/Repo/"), "localhost8000_repo");
/// ```
pub fn flat_name(url: &str) -> String {
    let path = url.rsplit("://").next().unwrap_or(url);
    path.replace(['/', '.'], "_")
        .to_lowercase()
        .trim_matches('_')
        .replace(':', "")
}

/// Split the contents of a `[...]` block into `key=value` options.
fn parse_options(block: &str) -> Result<BTreeMap<String, String>> {
    block
        .split_whitespace()
        .map(|token| {
            token
                .split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    Error::InvalidDeclaration(format!("option without a value: {token}"))
                })
        })
        .collect()
}

// Winnow parsers

/// `[ ... ]`, only when the closing bracket exists.
fn parse_options_block<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    delimited('[', take_till(0.., ']'), ']').parse_next(input)
}

fn parse_url<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_till(0.., |c: char| c.is_whitespace()).parse_next(input)
}

fn parse_declaration<'s>(input: &mut &'s str) -> ModalResult<Declaration<'s>> {
    (
        opt(parse_options_block),
        preceded(multispace0, parse_url),
        rest,
    )
        .map(|(options, url, tail): (Option<&'s str>, &'s str, &'s str)| Declaration {
            options,
            url,
            tail: tail.trim(),
        })
        .parse_next(input)
}
