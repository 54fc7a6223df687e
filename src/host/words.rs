// Script splitting for the reference host: commands and words only, no substitution.
use crate::core::error::{Error, ErrorKind};

/// Splits `script` into commands (newline or `;` separated) of words
/// (whitespace separated, `{...}` and `"..."` grouping). Lines starting
/// with `#` are comments.
pub fn split_script(script: &str) -> Result<Vec<Vec<String>>, Error> {
    let chars: Vec<char> = script.chars().collect();
    let mut commands = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        match ch {
            '\n' | ';' => {
                flush(&mut commands, &mut words);
                idx += 1;
            }
            ' ' | '\t' | '\r' => idx += 1,
            '#' if words.is_empty() => {
                while idx < chars.len() && chars[idx] != '\n' {
                    idx += 1;
                }
            }
            '{' => {
                let (word, next) = braced(&chars, idx)?;
                words.push(word);
                idx = expect_word_end(&chars, next, "close-brace")?;
            }
            '"' => {
                let (word, next) = quoted(&chars, idx)?;
                words.push(word);
                idx = expect_word_end(&chars, next, "close-quote")?;
            }
            _ => {
                let start = idx;
                while idx < chars.len() && !is_separator(chars[idx]) {
                    idx += 1;
                }
                words.push(chars[start..idx].iter().collect());
            }
        }
    }
    flush(&mut commands, &mut words);
    Ok(commands)
}

fn flush(commands: &mut Vec<Vec<String>>, words: &mut Vec<String>) {
    if !words.is_empty() {
        commands.push(std::mem::take(words));
    }
}

fn is_separator(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | ';')
}

fn braced(chars: &[char], open: usize) -> Result<(String, usize), Error> {
    let mut depth = 0usize;
    for (idx, ch) in chars.iter().enumerate().skip(open) {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((chars[open + 1..idx].iter().collect(), idx + 1));
                }
            }
            _ => {}
        }
    }
    Err(syntax_error("missing close-brace"))
}

fn quoted(chars: &[char], open: usize) -> Result<(String, usize), Error> {
    let mut word = String::new();
    let mut idx = open + 1;
    while idx < chars.len() {
        match chars[idx] {
            '"' => return Ok((word, idx + 1)),
            '\\' if idx + 1 < chars.len() => {
                word.push(chars[idx + 1]);
                idx += 2;
            }
            ch => {
                word.push(ch);
                idx += 1;
            }
        }
    }
    Err(syntax_error("missing \""))
}

fn expect_word_end(chars: &[char], idx: usize, what: &str) -> Result<usize, Error> {
    match chars.get(idx) {
        None => Ok(idx),
        Some(ch) if is_separator(*ch) => Ok(idx),
        Some(_) => Err(syntax_error(&format!("extra characters after {what}"))),
    }
}

fn syntax_error(message: &str) -> Error {
    Error::new(ErrorKind::Usage).with_message(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::split_script;

    fn split(script: &str) -> Vec<Vec<String>> {
        split_script(script).expect("split")
    }

    #[test]
    fn splits_commands_and_words() {
        assert_eq!(
            split("list unsafe command invoked"),
            vec![vec!["list", "unsafe", "command", "invoked"]]
        );
        assert_eq!(
            split("a 1; b 2\n  c"),
            vec![vec!["a", "1"], vec!["b", "2"], vec!["c"]]
        );
    }

    #[test]
    fn groups_braces_and_quotes_without_substitution() {
        assert_eq!(
            split("set x {a {b c} d} \"e \\\" f\""),
            vec![vec!["set", "x", "a {b c} d", "e \" f"]]
        );
        assert_eq!(split("x {}"), vec![vec!["x", ""]]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert_eq!(
            split("# note\n\nrun 1 # not a comment"),
            vec![vec!["run", "1", "#", "not", "a", "comment"]]
        );
        assert!(split("   \n ; ").is_empty());
    }

    #[test]
    fn reports_unbalanced_groups() {
        for (script, message) in [
            ("x {a", "missing close-brace"),
            ("x \"a", "missing \""),
            ("x {a}b", "extra characters after close-brace"),
            ("x \"a\"b", "extra characters after close-quote"),
        ] {
            let err = split_script(script).expect_err(script);
            assert_eq!(err.message(), Some(message));
        }
    }
}
