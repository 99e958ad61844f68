//! Wire protocol: line-oriented, whitespace-tokenized text commands.
//!
//! A logical message is one newline-delimited line. The first token,
//! case-folded, is the command name; the rest are arguments. Commands that
//! take free text (`BCST`, `MESG`) receive the remainder of the raw line
//! rather than re-joined tokens, so interior spacing survives.

/// System notice tag, prefixed to server-originated broadcasts.
pub const SERVER_TAG: &str = "[Server] ";

/// A parsed command line, borrowing from the transport buffer.
#[derive(Debug)]
pub struct Request<'a> {
    /// Command name, lower-cased.
    pub command: String,
    /// Whitespace-split arguments.
    pub args: Vec<&'a str>,
    raw: &'a str,
}

impl<'a> Request<'a> {
    /// Parse a raw line. Returns `None` for blank lines.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next()?.to_ascii_lowercase();
        let args = tokens.collect();
        Some(Self {
            command,
            args,
            raw: line,
        })
    }

    /// The remainder of the raw line after the command and the first `n`
    /// arguments: the free-text body for commands like `BCST` and `MESG`.
    pub fn trailing(&self, n: usize) -> &'a str {
        let mut rest = self.raw.trim_start();
        for _ in 0..=n {
            rest = match rest.find(char::is_whitespace) {
                Some(i) => rest[i..].trim_start(),
                None => return "",
            };
        }
        rest.trim_end()
    }
}
