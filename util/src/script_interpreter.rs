//! # Script interpreter module
//!
//! This module provides an interpreter for autonomous routine scripts. A
//! script is a list of lines, each naming a command and optionally giving it
//! a comma separated list of arguments:
//!
//! ```text
//! wait:0.5
//! navigate:0,5,90,0.6,1,false
//! setelevator:2.0,parallel
//! ```
//!
//! All whitespace is ignored and blank lines are skipped. Each argument is
//! parsed as a number if possible, otherwise it is matched against the
//! boolean literals `true`, `false` and the alias `parallel` (meaning true),
//! and anything else is read as `false`.
//!
//! The interpreter only splits and types the lines. Resolving a line into a
//! runnable command is done by the command registry of the executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use conquer_once::Lazy;
use log::debug;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Matches a whitespace-free line, capturing the name and the argument list.
static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?::(.*))?$").unwrap()
});

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One parsed line of a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    /// Line number in the original script text, starting at 1.
    pub line_num: usize,

    /// The command name as written in the script.
    pub name: String,

    /// Typed arguments, in order.
    pub args: Vec<ScriptArg>
}

/// A script interpreter.
///
/// The interpreter is a forward-only cursor over the lines of the script, it
/// cannot be rewound. Create a new interpreter to run a script again.
#[derive(Debug, Clone)]
pub struct ScriptInterpreter {
    /// Non-blank lines with their line numbers, whitespace already removed.
    lines: Vec<(usize, String)>,

    /// Index of the next line to hand out
    cursor: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A single typed script argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptArg {
    Number(f64),
    Bool(bool)
}

/// The type of a script argument, used to build command signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Number,
    Bool
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty")]
    ScriptEmpty
}

/// A line which does not follow the `Name` or `Name:arg,...` grammar.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Line {line_num} is malformed: \"{line}\"")]
pub struct LineParseError {
    pub line_num: usize,
    pub line: String
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path.to_path_buf()));
        }

        let script = fs::read_to_string(path)
            .map_err(ScriptError::ScriptLoadError)?;

        let si = Self::from_script(&script);

        if si.get_num_lines() == 0 {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(si)
    }

    /// Create a new interpreter from the script text itself.
    pub fn from_script(script: &str) -> Self {
        let lines = script
            .lines()
            .enumerate()
            .map(|(i, l)| {
                (i + 1, l.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            })
            .filter(|(_, l)| !l.is_empty())
            .collect();

        Self {
            lines,
            cursor: 0
        }
    }

    /// True if there are lines left to be read.
    pub fn has_next(&self) -> bool {
        self.cursor < self.lines.len()
    }

    /// Read the next line, advancing the cursor.
    ///
    /// Returns `None` once the script is exhausted. A malformed line still
    /// consumes its place in the script.
    pub fn next_line(&mut self) -> Option<Result<ScriptLine, LineParseError>> {
        let (line_num, line) = self.lines.get(self.cursor)?.clone();
        self.cursor += 1;

        Some(parse_line(line_num, &line))
    }

    /// Get the number of (non-blank) lines in the script
    pub fn get_num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Get the number of lines which haven't been read yet
    pub fn get_num_remaining(&self) -> usize {
        self.lines.len() - self.cursor
    }
}

impl ScriptArg {
    /// Parse a single argument token.
    ///
    /// Numbers take priority, then the boolean literals. Unrecognised tokens
    /// fall back to `false`.
    pub fn parse(token: &str) -> Self {
        if let Ok(n) = token.parse::<f64>() {
            return ScriptArg::Number(n);
        }

        match token.to_lowercase().as_str() {
            "true" | "parallel" => ScriptArg::Bool(true),
            "false" => ScriptArg::Bool(false),
            _ => {
                debug!("Unrecognised script argument \"{}\", reading as false", token);
                ScriptArg::Bool(false)
            }
        }
    }

    pub fn arg_type(&self) -> ArgType {
        match self {
            ScriptArg::Number(_) => ArgType::Number,
            ScriptArg::Bool(_) => ArgType::Bool
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptArg::Number(n) => Some(*n),
            _ => None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptArg::Bool(b) => Some(*b),
            _ => None
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Number => write!(f, "number"),
            ArgType::Bool => write!(f, "bool")
        }
    }
}

impl ScriptLine {
    /// The types of this line's arguments, in order.
    pub fn signature(&self) -> Vec<ArgType> {
        self.args.iter().map(ScriptArg::arg_type).collect()
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a single whitespace-free line.
fn parse_line(line_num: usize, line: &str) -> Result<ScriptLine, LineParseError> {
    let caps = LINE_REGEX.captures(line).ok_or_else(|| LineParseError {
        line_num,
        line: line.to_string()
    })?;

    // Name group always participates in a match
    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();

    let args = match caps.get(2).map(|m| m.as_str()) {
        Some(a) if !a.is_empty() => a.split(',').map(ScriptArg::parse).collect(),
        _ => vec![]
    };

    Ok(ScriptLine {
        line_num,
        name,
        args
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let mut si = ScriptInterpreter::from_script(
            "Navigate:1.0,2.0,90.0\n\
             \n\
             \tsetelevator : 2.5, parallel \n\
             wait"
        );

        assert_eq!(si.get_num_lines(), 3);
        assert!(si.has_next());

        let l = si.next_line().unwrap().unwrap();
        assert_eq!(l.line_num, 1);
        assert_eq!(l.name, "Navigate");
        assert_eq!(l.args, vec![
            ScriptArg::Number(1.0), ScriptArg::Number(2.0), ScriptArg::Number(90.0)
        ]);

        let l = si.next_line().unwrap().unwrap();
        assert_eq!(l.line_num, 3);
        assert_eq!(l.name, "setelevator");
        assert_eq!(l.signature(), vec![ArgType::Number, ArgType::Bool]);
        assert_eq!(l.args[1], ScriptArg::Bool(true));

        let l = si.next_line().unwrap().unwrap();
        assert_eq!(l.name, "wait");
        assert!(l.args.is_empty());

        // Forward only, nothing left
        assert!(!si.has_next());
        assert!(si.next_line().is_none());
        assert_eq!(si.get_num_remaining(), 0);
    }

    #[test]
    fn test_arg_fallback_chain() {
        assert_eq!(ScriptArg::parse("-3.5"), ScriptArg::Number(-3.5));
        assert_eq!(ScriptArg::parse("1"), ScriptArg::Number(1.0));
        assert_eq!(ScriptArg::parse("TRUE"), ScriptArg::Bool(true));
        assert_eq!(ScriptArg::parse("Parallel"), ScriptArg::Bool(true));
        assert_eq!(ScriptArg::parse("false"), ScriptArg::Bool(false));
        assert_eq!(ScriptArg::parse("banana"), ScriptArg::Bool(false));
        assert_eq!(ScriptArg::parse(""), ScriptArg::Bool(false));
    }

    #[test]
    fn test_empty_arg_list() {
        let mut si = ScriptInterpreter::from_script("wait:");
        let l = si.next_line().unwrap().unwrap();
        assert!(l.args.is_empty());
    }

    #[test]
    fn test_malformed_line() {
        let mut si = ScriptInterpreter::from_script("3wait:1\nwait:1");

        assert_eq!(
            si.next_line(),
            Some(Err(LineParseError { line_num: 1, line: "3wait:1".into() }))
        );

        // Malformed lines still advance the cursor
        assert_eq!(si.next_line().unwrap().unwrap().name, "wait");
    }

    #[test]
    fn test_script_not_found() {
        assert!(matches!(
            ScriptInterpreter::new("this/script/does/not/exist.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
