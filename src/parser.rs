//! Parser for expectty scripts.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`].

use crate::command::ScriptCommand;
use crate::commands::{Expect, Launch, Stop, WriteInput};
use anyhow::{Context as _, Result, anyhow};
use std::path::Path;
use std::time::Duration;

/// Parse a script from a string slice and return the resulting commands.
///
/// Lines that are empty or start with `#` are ignored. Inline comments (` # …`)
/// are stripped while preserving `#` characters inside quoted strings.
///
/// # Errors
///
/// Returns an error naming the line if it holds an unknown command, a
/// malformed argument, or an unclosed quoted string.
///
/// # Example
///
/// ```
/// use expectty::parse_str;
///
/// let commands = parse_str("launch sh\nexpect \"$ \"\nwrite \"exit\"\n").unwrap();
/// assert_eq!(commands.len(), 3);
/// ```
pub fn parse_str(content: &str) -> Result<Vec<Box<dyn ScriptCommand>>> {
    let mut commands = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = strip_inline_comment(line);
        let cmd = parse_line(line)
            .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
        commands.push(cmd);
    }
    Ok(commands)
}

/// Read a script file and parse it with [`parse_str`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or if the script is malformed.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Box<dyn ScriptCommand>>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read the script file: {}", path.display()))?;
    parse_str(&content)
}

type ParseFn = fn(&str) -> Result<Box<dyn ScriptCommand>>;

static REGISTRY: &[(&str, ParseFn)] = &[
    (Launch::NAME, Launch::parse_boxed),
    (WriteInput::NAME, WriteInput::parse_boxed),
    (Expect::NAME, Expect::parse_boxed),
    (Stop::NAME, Stop::parse_boxed),
];

/// Dispatch a single non-empty, non-comment line to the matching command's parser.
fn parse_line(line: &str) -> Result<Box<dyn ScriptCommand>> {
    let (name, args) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    REGISTRY
        .iter()
        .find(|(cmd_name, _)| *cmd_name == name)
        .map(|(_, parse)| parse(args))
        .unwrap_or_else(|| Err(anyhow!("Unknown command: {}", name)))
}

/// Strip inline comments from a line, preserving `#` inside quoted strings.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if ch == '#' && !in_quotes {
            return line[..i].trim();
        }
    }
    line
}

/// Split an argument string into bare words and double-quoted strings.
///
/// Inside quotes `\n`, `\t`, `\r`, `\"` and `\\` are unescaped; any other
/// backslash is kept as written so Windows paths survive.
pub(crate) fn split_arguments(s: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if ch == '"' {
            chars.next();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                match ch {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => token.push('\n'),
                        Some('t') => token.push('\t'),
                        Some('r') => token.push('\r'),
                        Some(c @ ('"' | '\\')) => token.push(c),
                        Some(c) => {
                            token.push('\\');
                            token.push(c);
                        }
                        None => break,
                    },
                    c => token.push(c),
                }
            }
            if !closed {
                return Err(anyhow!("Unclosed quote in: {}", s.trim()));
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

/// Parse a duration string: `1s`, `500ms`, `1.5s`.
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms_str) = s.strip_suffix("ms") {
        let ms: u64 = ms_str
            .trim()
            .parse()
            .context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(s_str) = s.strip_suffix('s') {
        let secs: f64 = s_str.trim().parse().context("Invalid seconds value")?;
        Duration::try_from_secs_f64(secs).context("Invalid seconds value")
    } else {
        Err(anyhow!("Duration must end with 's' or 'ms', got: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::from_secs_f64(1.5)
        );
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("5minutes").is_err());
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            split_arguments(r#"./tool.sh arg1 "two words""#).unwrap(),
            vec!["./tool.sh", "arg1", "two words"]
        );
        assert_eq!(
            split_arguments(r#""line1\nline2" "say \"hi\"""#).unwrap(),
            vec!["line1\nline2", r#"say "hi""#]
        );
        assert_eq!(
            split_arguments(r#""C:\tools\app""#).unwrap(),
            vec!["C:\tools\\app"]
        );
        assert_eq!(split_arguments(r#""""#).unwrap(), vec![""]);
        assert!(split_arguments("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_arguments_unclosed() {
        assert!(split_arguments(r#""unclosed"#).is_err());
        assert!(split_arguments(r#""trailing\"#).is_err());
    }

    #[test]
    fn test_parse_all_commands() {
        let cmds = parse_str(
            "launch ./examples/tool.sh arg1\nexpect \"Name: \"\nwrite \"AAA\"\nexpect \"Hello, AAA\" 1 2000\nstop\n",
        )
        .unwrap();
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[0].name(), "launch");
        assert_eq!(cmds[1].name(), "expect");
        assert_eq!(cmds[2].name(), "write");
        assert_eq!(cmds[3].name(), "expect");
        assert_eq!(cmds[4].name(), "stop");
    }

    #[test]
    fn test_parse_comments_only() {
        assert_eq!(parse_str("# c1\n# c2\n").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_empty_lines() {
        let cmds = parse_str("\n\nlaunch sh\n\nstop\n\n").unwrap();
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn test_parse_invalid_command() {
        let err = format!("{:#}", parse_str("launch sh\nsleep 1").err().unwrap());
        assert!(err.contains("line 2"), "got: {err}");
        assert!(err.contains("Unknown command: sleep"), "got: {err}");
    }

    #[test]
    fn test_parse_tab_separated() {
        let cmds = parse_str("write\t\"AAA\"\n").unwrap();
        assert_eq!(cmds[0].name(), "write");
    }

    #[test]
    fn test_parse_unclosed_quote() {
        assert!(parse_str("write \"unclosed").is_err());
    }

    #[test]
    fn test_strip_inline_comments() {
        assert_eq!(strip_inline_comment("stop # done"), "stop");
        assert_eq!(
            strip_inline_comment("write \"test\" # inline"),
            "write \"test\""
        );
        assert_eq!(
            strip_inline_comment("expect \"#hashtag\""),
            "expect \"#hashtag\""
        );
        assert_eq!(
            strip_inline_comment("write \"test#1\" # comment"),
            "write \"test#1\""
        );
    }

    #[test]
    fn test_parse_with_inline_comments() {
        let cmds =
            parse_str("launch sh # shell\nwrite \"hi\" # greet\nexpect \"ok\" 2s\n").unwrap();
        assert_eq!(cmds.len(), 3);
    }
}
