//! Optimization levels under evaluation
//!
//! The order of [`OptFlag::ALL`] is the evaluation order and the tie-break order
//! for best-flag selection. It is also the column order of the result table.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One compiler optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptFlag {
    O0,
    O1,
    O2,
    O3,
    Ofast,
}

impl OptFlag {
    /// All flags in fixed evaluation order.
    pub const ALL: [OptFlag; 5] = [
        OptFlag::O0,
        OptFlag::O1,
        OptFlag::O2,
        OptFlag::O3,
        OptFlag::Ofast,
    ];

    /// Command-line switch passed to the compiler.
    pub fn as_arg(&self) -> &'static str {
        match self {
            OptFlag::O0 => "-O0",
            OptFlag::O1 => "-O1",
            OptFlag::O2 => "-O2",
            OptFlag::O3 => "-O3",
            OptFlag::Ofast => "-Ofast",
        }
    }

    /// Result table column holding this flag's execution time.
    pub fn column_name(&self) -> &'static str {
        match self {
            OptFlag::O0 => "O0ExecTime",
            OptFlag::O1 => "O1ExecTime",
            OptFlag::O2 => "O2ExecTime",
            OptFlag::O3 => "O3ExecTime",
            OptFlag::Ofast => "OfastExecTime",
        }
    }

    /// Position in [`OptFlag::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for OptFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown optimization flag '{0}'. Valid flags: -O0, -O1, -O2, -O3, -Ofast")]
pub struct ParseFlagError(pub String);

impl FromStr for OptFlag {
    type Err = ParseFlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix('-').unwrap_or(s);
        OptFlag::ALL
            .into_iter()
            .find(|flag| &flag.as_arg()[1..] == bare)
            .ok_or_else(|| ParseFlagError(s.to_string()))
    }
}
